// ==========================================
// 设备轮换调度系统 - 地区/区域/设备类型仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::district::{DistrictEquipmentType, DistrictStatus, LocalArea};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

// ==========================================
// DistrictRepository - 地区仓储
// ==========================================
/// 职责: 区域、地区设备类型、地区财年状态的只读访问
pub struct DistrictRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DistrictRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 查询区域
    pub fn find_local_area(&self, local_area_id: i64) -> RepositoryResult<Option<LocalArea>> {
        let conn = self.get_conn()?;
        let area = conn
            .query_row(
                "SELECT local_area_id, name, district_id FROM local_area WHERE local_area_id = ?1",
                params![local_area_id],
                |row| {
                    Ok(LocalArea {
                        local_area_id: row.get(0)?,
                        name: row.get(1)?,
                        district_id: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(area)
    }

    /// 查询地区设备类型
    pub fn find_equipment_type(
        &self,
        equipment_type_id: i64,
    ) -> RepositoryResult<Option<DistrictEquipmentType>> {
        let conn = self.get_conn()?;
        let kind = conn
            .query_row(
                r#"
                SELECT district_equipment_type_id, name, is_dump_truck
                FROM district_equipment_type
                WHERE district_equipment_type_id = ?1
                "#,
                params![equipment_type_id],
                |row| {
                    Ok(DistrictEquipmentType {
                        equipment_type_id: row.get(0)?,
                        name: row.get(1)?,
                        is_dump_truck: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(kind)
    }

    /// 查询地区财年状态
    pub fn find_district_status(&self, district_id: i64) -> RepositoryResult<Option<DistrictStatus>> {
        let conn = self.get_conn()?;
        let status = conn
            .query_row(
                r#"
                SELECT district_id, current_fiscal_year, next_fiscal_year, rollover_end_date
                FROM district_status
                WHERE district_id = ?1
                "#,
                params![district_id],
                |row| {
                    Ok(DistrictStatus {
                        district_id: row.get(0)?,
                        current_fiscal_year: row.get(1)?,
                        next_fiscal_year: row.get(2)?,
                        rollover_end_date: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(status)
    }

    /// 写入地区财年状态（年度滚动完成时调用）
    pub fn upsert_district_status(&self, status: &DistrictStatus) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO district_status (district_id, current_fiscal_year, next_fiscal_year, rollover_end_date)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(district_id) DO UPDATE SET
                current_fiscal_year = excluded.current_fiscal_year,
                next_fiscal_year = excluded.next_fiscal_year,
                rollover_end_date = excluded.rollover_end_date
            "#,
            params![
                status.district_id,
                status.current_fiscal_year,
                status.next_fiscal_year,
                status.rollover_end_date,
            ],
        )?;
        Ok(())
    }
}
