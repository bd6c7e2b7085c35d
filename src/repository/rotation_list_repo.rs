// ==========================================
// 设备轮换调度系统 - 轮换名单仓储
// ==========================================
// 职责:
// - 写入每次请求新生成的轮换名单
// - 读取历史“已询问”轨迹（用于确定续排起点）
// - 记录询问应答与强制雇用
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::rotation::{RotationHistoryEntry, RotationList, RotationListEntry};
use crate::domain::types::{GroupKey, OfferResponse};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const ENTRY_SELECT: &str = r#"
    SELECT rotation_list_id, rental_request_id, equipment_id, block_number, seniority,
           sort_order, was_asked, offer_response, offer_refusal_reason, offer_response_note,
           offer_response_at, is_force_hire, note
    FROM rental_request_rotation_list
"#;

pub struct RotationListRepository {
    conn: Arc<Mutex<Connection>>,
}

impl RotationListRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 保存新生成的轮换名单
    ///
    /// # 红线
    /// - 单事务: 清除该请求旧名单 → 写入新名单 → 更新首位询问设备
    ///
    /// # 返回
    /// - `Ok(count)`: 写入的条目数
    pub fn replace_for_request(
        &self,
        list: &RotationList,
        created_at: DateTime<Utc>,
    ) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let written = write_rotation_list(&tx, list, created_at)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(written)
    }

    /// 查询请求的轮换名单（按 sort_order 升序）
    pub fn find_by_request(&self, rental_request_id: i64) -> RepositoryResult<Vec<RotationListEntry>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "{} WHERE rental_request_id = ?1 ORDER BY sort_order ASC",
            ENTRY_SELECT
        );
        let mut stmt = conn.prepare(&sql)?;
        let entries = stmt
            .query_map(params![rental_request_id], map_entry_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(entries)
    }

    /// 按主键查询名单条目
    pub fn find_entry(&self, rotation_list_id: i64) -> RepositoryResult<Option<RotationListEntry>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE rotation_list_id = ?1", ENTRY_SELECT);
        let entry = conn
            .query_row(&sql, params![rotation_list_id], map_entry_row)
            .optional()?;
        Ok(entry)
    }

    /// 查询同组本财年的历史询问轨迹
    ///
    /// 条件: was_asked = 1 且非强制雇用, 请求创建时间 >= 财年起点, 排除当前请求
    /// 排序: 请求ID 降序, sort_order 降序（最近一次询问在前）
    pub fn find_asked_history(
        &self,
        group: GroupKey,
        window_start: DateTime<Utc>,
        exclude_request_id: i64,
    ) -> RepositoryResult<Vec<RotationHistoryEntry>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT l.rental_request_id, l.equipment_id, l.sort_order
            FROM rental_request_rotation_list l
            JOIN rental_request r ON r.rental_request_id = l.rental_request_id
            WHERE r.local_area_id = ?1
              AND r.district_equipment_type_id = ?2
              AND r.created_at >= ?3
              AND r.rental_request_id <> ?4
              AND l.was_asked = 1
              AND l.is_force_hire = 0
            ORDER BY l.rental_request_id DESC, l.sort_order DESC
            "#,
        )?;
        let history = stmt
            .query_map(
                params![
                    group.local_area_id,
                    group.equipment_type_id,
                    window_start,
                    exclude_request_id
                ],
                |row| {
                    Ok(RotationHistoryEntry {
                        rental_request_id: row.get(0)?,
                        equipment_id: row.get(1)?,
                        sort_order: row.get(2)?,
                    })
                },
            )?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(history)
    }

    /// 记录询问应答
    pub fn update_offer_response(
        &self,
        rotation_list_id: i64,
        response: OfferResponse,
        refusal_reason: Option<&str>,
        response_note: Option<&str>,
        responded_at: DateTime<Utc>,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE rental_request_rotation_list
            SET was_asked = 1,
                offer_response = ?1,
                offer_refusal_reason = ?2,
                offer_response_note = ?3,
                offer_response_at = ?4
            WHERE rotation_list_id = ?5
            "#,
            params![
                response.to_db_str(),
                refusal_reason,
                response_note,
                responded_at,
                rotation_list_id
            ],
        )?;
        ensure_updated(affected, rotation_list_id)
    }

    /// 记录强制雇用
    pub fn mark_force_hire(
        &self,
        rotation_list_id: i64,
        note: Option<&str>,
        hired_at: DateTime<Utc>,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE rental_request_rotation_list
            SET was_asked = 1,
                is_force_hire = 1,
                note = ?1,
                offer_response_at = ?2
            WHERE rotation_list_id = ?3
            "#,
            params![note, hired_at, rotation_list_id],
        )?;
        ensure_updated(affected, rotation_list_id)
    }
}

fn ensure_updated(affected: usize, rotation_list_id: i64) -> RepositoryResult<()> {
    if affected == 0 {
        return Err(RepositoryError::NotFound {
            entity: "rental_request_rotation_list".to_string(),
            id: rotation_list_id.to_string(),
        });
    }
    Ok(())
}

fn map_entry_row(row: &Row<'_>) -> SqliteResult<RotationListEntry> {
    let response: Option<String> = row.get(7)?;

    Ok(RotationListEntry {
        rotation_list_id: row.get(0)?,
        rental_request_id: row.get(1)?,
        equipment_id: row.get(2)?,
        block_number: row.get(3)?,
        seniority: row.get(4)?,
        sort_order: row.get(5)?,
        was_asked: row.get(6)?,
        offer_response: response.as_deref().and_then(OfferResponse::parse),
        offer_refusal_reason: row.get(8)?,
        offer_response_note: row.get(9)?,
        offer_response_at: row.get(10)?,
        is_force_hire: row.get(11)?,
        note: row.get(12)?,
    })
}

/// 在调用方事务内写入名单（清除旧名单、写入条目、更新首位询问设备）
///
/// # 错误
/// - `NotFound`: 请求不存在
pub(crate) fn write_rotation_list(
    conn: &Connection,
    list: &RotationList,
    created_at: DateTime<Utc>,
) -> RepositoryResult<usize> {
    conn.execute(
        "DELETE FROM rental_request_rotation_list WHERE rental_request_id = ?1",
        params![list.rental_request_id],
    )?;

    {
        let mut stmt = conn.prepare(
            r#"
            INSERT INTO rental_request_rotation_list (
                rental_request_id, equipment_id, block_number, seniority, sort_order, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )?;

        for candidate in &list.candidates {
            stmt.execute(params![
                list.rental_request_id,
                candidate.equipment_id,
                candidate.block_number,
                candidate.seniority,
                candidate.sort_order,
                created_at,
            ])?;
        }
    }

    let affected = conn.execute(
        "UPDATE rental_request SET first_on_rotation_list_id = ?1 WHERE rental_request_id = ?2",
        params![list.first_to_ask, list.rental_request_id],
    )?;
    if affected == 0 {
        return Err(RepositoryError::NotFound {
            entity: "rental_request".to_string(),
            id: list.rental_request_id.to_string(),
        });
    }

    Ok(list.candidates.len())
}
