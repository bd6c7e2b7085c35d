// ==========================================
// 设备轮换调度系统 - 租赁合同仓储
// ==========================================
// 用途: 在租排除（设备已挂在租用请求下的有效合同）
// 注: rental_request_id 为空的“空白合同”不计入在租
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

pub struct RentalAgreementRepository {
    conn: Arc<Mutex<Connection>>,
}

impl RentalAgreementRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 新增合同
    pub fn insert(
        &self,
        rental_agreement_id: i64,
        equipment_id: i64,
        rental_request_id: Option<i64>,
        status: &str,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO rental_agreement (rental_agreement_id, equipment_id, rental_request_id, status)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![rental_agreement_id, equipment_id, rental_request_id, status],
        )?;
        Ok(())
    }

    /// 设备是否在租
    pub fn is_hired(&self, equipment_id: i64, active_status: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let exists: bool = conn.query_row(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM rental_agreement
                WHERE equipment_id = ?1
                  AND rental_request_id IS NOT NULL
                  AND status = ?2
            )
            "#,
            params![equipment_id, active_status],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// 批量查询在租设备
    ///
    /// # 返回
    /// 入参中处于在租状态的设备ID集合
    pub fn find_hired(
        &self,
        equipment_ids: &[i64],
        active_status: &str,
    ) -> RepositoryResult<HashSet<i64>> {
        let mut hired = HashSet::new();
        for &id in equipment_ids {
            if self.is_hired(id, active_status)? {
                hired.insert(id);
            }
        }
        Ok(hired)
    }
}
