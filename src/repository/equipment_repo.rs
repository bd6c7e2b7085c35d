// ==========================================
// 设备轮换调度系统 - 设备数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 红线: 同一分组的资历/分块写回必须在单个事务内完成
// ==========================================

use crate::domain::equipment::{EquipmentRecord, OwnerRef, SeniorityAssignment, ServiceHistory};
use crate::domain::types::GroupKey;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const EQUIPMENT_SELECT: &str = r#"
    SELECT
        e.equipment_id, e.local_area_id, e.district_equipment_type_id,
        e.owner_id, o.is_maintenance_contractor,
        e.status_code, e.equipment_code, e.received_date,
        e.years_of_service, e.service_hours_current_year, e.service_hours_last_year,
        e.service_hours_two_years_ago, e.service_hours_three_years_ago,
        e.seniority, e.block_number, e.number_in_block, e.seniority_effective_date
    FROM equipment e
    LEFT JOIN owner o ON o.owner_id = e.owner_id
"#;

// ==========================================
// EquipmentRepository - 设备仓储
// ==========================================
pub struct EquipmentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl EquipmentRepository {
    /// 从已有连接创建仓储实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 新增设备（导入/测试数据）
    pub fn insert(&self, record: &EquipmentRecord) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO equipment (
                equipment_id, local_area_id, district_equipment_type_id, owner_id,
                status_code, equipment_code, received_date,
                years_of_service, service_hours_current_year, service_hours_last_year,
                service_hours_two_years_ago, service_hours_three_years_ago,
                seniority, block_number, number_in_block, seniority_effective_date
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
            "#,
            params![
                record.equipment_id,
                record.local_area_id,
                record.equipment_type_id,
                record.owner_id(),
                record.status_code,
                record.equipment_code,
                record.received_date,
                record.service.years_of_service,
                record.service.hours_current_year,
                record.service.hours_last_year,
                record.service.hours_two_years_ago,
                record.service.hours_three_years_ago,
                record.seniority,
                record.block_number,
                record.number_in_block,
                record.seniority_effective_date,
            ],
        )?;
        Ok(())
    }

    /// 按主键查询
    pub fn find_by_id(&self, equipment_id: i64) -> RepositoryResult<Option<EquipmentRecord>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE e.equipment_id = ?1", EQUIPMENT_SELECT);
        let record = conn
            .query_row(&sql, params![equipment_id], map_equipment_row)
            .optional()?;
        Ok(record)
    }

    /// 查询分组内全部设备（不区分状态）
    pub fn find_by_group(&self, group: GroupKey) -> RepositoryResult<Vec<EquipmentRecord>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "{} WHERE e.local_area_id = ?1 AND e.district_equipment_type_id = ?2 ORDER BY e.equipment_id",
            EQUIPMENT_SELECT
        );
        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map(
                params![group.local_area_id, group.equipment_type_id],
                map_equipment_row,
            )?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(records)
    }

    /// 查询分组内已分块的 Approved 设备
    ///
    /// 排序: block_number 升序, number_in_block 升序（即规范轮换顺序）
    pub fn find_ranked_by_group(
        &self,
        group: GroupKey,
        approved_status: &str,
    ) -> RepositoryResult<Vec<EquipmentRecord>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"{}
            WHERE e.local_area_id = ?1
              AND e.district_equipment_type_id = ?2
              AND e.status_code = ?3
              AND e.block_number IS NOT NULL
            ORDER BY e.block_number ASC, e.number_in_block ASC, e.equipment_id ASC
            "#,
            EQUIPMENT_SELECT
        );
        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map(
                params![group.local_area_id, group.equipment_type_id, approved_status],
                map_equipment_row,
            )?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(records)
    }

    /// 批量写回资历/分块结果
    ///
    /// # 红线
    /// - 单事务完成，任一条失败则整体回滚
    ///
    /// # 返回
    /// - `Ok(count)`: 更新的记录数
    pub fn save_assignments(&self, assignments: &[SeniorityAssignment]) -> RepositoryResult<usize> {
        if assignments.is_empty() {
            return Ok(0);
        }

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let mut updated = 0;

        {
            let mut stmt = tx.prepare(
                r#"
                UPDATE equipment
                SET seniority = ?1,
                    block_number = ?2,
                    number_in_block = ?3,
                    seniority_effective_date = ?4
                WHERE equipment_id = ?5
                "#,
            )?;

            for a in assignments {
                let affected = stmt.execute(params![
                    a.seniority,
                    a.block_number,
                    a.number_in_block,
                    a.seniority_effective_date,
                    a.equipment_id,
                ])?;
                if affected == 0 {
                    return Err(RepositoryError::NotFound {
                        entity: "equipment".to_string(),
                        id: a.equipment_id.to_string(),
                    });
                }
                updated += affected;
            }
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(updated)
    }

    /// 查询存在“资历+受理日期”重复的分组
    ///
    /// 用途: 重算任务只处理可能受次级排序键影响的分组
    pub fn find_groups_with_duplicate_seniority(
        &self,
        approved_status: &str,
    ) -> RepositoryResult<Vec<GroupKey>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT DISTINCT local_area_id, district_equipment_type_id
            FROM (
                SELECT local_area_id, district_equipment_type_id
                FROM equipment
                WHERE status_code = ?1
                GROUP BY local_area_id, district_equipment_type_id, seniority, received_date
                HAVING COUNT(*) > 1
            )
            ORDER BY local_area_id, district_equipment_type_id
            "#,
        )?;
        let groups = stmt
            .query_map(params![approved_status], |row| {
                Ok(GroupKey::new(row.get(0)?, row.get(1)?))
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(groups)
    }

    /// 查询所有有设备的分组
    pub fn find_all_groups(&self) -> RepositoryResult<Vec<GroupKey>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT DISTINCT local_area_id, district_equipment_type_id
            FROM equipment
            ORDER BY local_area_id, district_equipment_type_id
            "#,
        )?;
        let groups = stmt
            .query_map([], |row| Ok(GroupKey::new(row.get(0)?, row.get(1)?)))?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(groups)
    }
}

fn map_equipment_row(row: &Row<'_>) -> SqliteResult<EquipmentRecord> {
    let owner_id: Option<i64> = row.get(3)?;
    let is_maintenance_contractor: Option<bool> = row.get(4)?;

    Ok(EquipmentRecord {
        equipment_id: row.get(0)?,
        local_area_id: row.get(1)?,
        equipment_type_id: row.get(2)?,
        owner: owner_id.map(|owner_id| OwnerRef {
            owner_id,
            is_maintenance_contractor: is_maintenance_contractor.unwrap_or(false),
        }),
        status_code: row.get(5)?,
        equipment_code: row.get(6)?,
        received_date: row.get(7)?,
        service: ServiceHistory {
            years_of_service: row.get(8)?,
            hours_current_year: row.get(9)?,
            hours_last_year: row.get(10)?,
            hours_two_years_ago: row.get(11)?,
            hours_three_years_ago: row.get(12)?,
        },
        seniority: row.get(13)?,
        block_number: row.get(14)?,
        number_in_block: row.get(15)?,
        seniority_effective_date: row.get(16)?,
    })
}
