// ==========================================
// 设备轮换调度系统 - 租用请求仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::rotation::{RentalRequest, RotationList};
use crate::domain::types::{GroupKey, RentalRequestStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::rotation_list_repo::write_rotation_list;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

pub struct RentalRequestRepository {
    conn: Arc<Mutex<Connection>>,
}

impl RentalRequestRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 新增租用请求
    pub fn insert(&self, request: &RentalRequest) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        insert_request_row(&conn, request)
    }

    /// 新增租用请求并写入其轮换名单
    ///
    /// # 红线
    /// - 单事务: 任一步失败时请求与名单均不落库
    ///
    /// # 返回
    /// - `Ok(count)`: 写入的名单条目数
    pub fn insert_with_rotation_list(
        &self,
        request: &RentalRequest,
        list: &RotationList,
        created_at: DateTime<Utc>,
    ) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        insert_request_row(&tx, request)?;
        let written = write_rotation_list(&tx, list, created_at)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(written)
    }

    /// 按主键查询
    pub fn find_by_id(&self, rental_request_id: i64) -> RepositoryResult<Option<RentalRequest>> {
        let conn = self.get_conn()?;
        let request = conn
            .query_row(
                r#"
                SELECT rental_request_id, local_area_id, district_equipment_type_id,
                       status, equipment_count, first_on_rotation_list_id, created_at
                FROM rental_request
                WHERE rental_request_id = ?1
                "#,
                params![rental_request_id],
                map_request_row,
            )
            .optional()?;
        Ok(request)
    }

    /// 同组本财年内是否存在其他请求
    ///
    /// # 参数
    /// - `window_start`: 财年起点（含）
    /// - `exclude_request_id`: 排除当前请求自身
    pub fn exists_other_since(
        &self,
        group: GroupKey,
        window_start: DateTime<Utc>,
        exclude_request_id: i64,
    ) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let exists: bool = conn.query_row(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM rental_request
                WHERE local_area_id = ?1
                  AND district_equipment_type_id = ?2
                  AND created_at >= ?3
                  AND rental_request_id <> ?4
            )
            "#,
            params![
                group.local_area_id,
                group.equipment_type_id,
                window_start,
                exclude_request_id
            ],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// 同组处于指定状态的其他请求数
    pub fn count_other_with_status(
        &self,
        group: GroupKey,
        status: RentalRequestStatus,
        exclude_request_id: Option<i64>,
    ) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            r#"
            SELECT COUNT(*) FROM rental_request
            WHERE local_area_id = ?1
              AND district_equipment_type_id = ?2
              AND status = ?3
              AND (?4 IS NULL OR rental_request_id <> ?4)
            "#,
            params![
                group.local_area_id,
                group.equipment_type_id,
                status.to_db_str(),
                exclude_request_id
            ],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// 更新请求状态
    pub fn update_status(
        &self,
        rental_request_id: i64,
        status: RentalRequestStatus,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE rental_request SET status = ?1 WHERE rental_request_id = ?2",
            params![status.to_db_str(), rental_request_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "rental_request".to_string(),
                id: rental_request_id.to_string(),
            });
        }
        Ok(())
    }
}

fn map_request_row(row: &Row<'_>) -> rusqlite::Result<RentalRequest> {
    let status_raw: String = row.get(3)?;
    let status = RentalRequestStatus::parse(&status_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            format!("未知的请求状态: {}", status_raw).into(),
        )
    })?;

    Ok(RentalRequest {
        rental_request_id: row.get(0)?,
        local_area_id: row.get(1)?,
        equipment_type_id: row.get(2)?,
        status,
        equipment_count: row.get(4)?,
        first_on_rotation_list_id: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn insert_request_row(conn: &Connection, request: &RentalRequest) -> RepositoryResult<()> {
    conn.execute(
        r#"
        INSERT INTO rental_request (
            rental_request_id, local_area_id, district_equipment_type_id,
            status, equipment_count, first_on_rotation_list_id, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
        params![
            request.rental_request_id,
            request.local_area_id,
            request.equipment_type_id,
            request.status.to_db_str(),
            request.equipment_count,
            request.first_on_rotation_list_id,
            request.created_at,
        ],
    )?;
    Ok(())
}
