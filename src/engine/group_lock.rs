// ==========================================
// 设备轮换调度系统 - 分组互斥
// ==========================================
// 规则:
// - 同一 (区域, 设备类型) 的排名计算互斥（写锁）
// - 轮换名单构建持读锁，保证读到一致的分块快照
// - 不同分组互不阻塞
// ==========================================

use crate::domain::types::GroupKey;
use crate::engine::error::{SchedulerError, SchedulerResult};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

#[derive(Debug, Default)]
pub struct GroupLocks {
    locks: Mutex<HashMap<GroupKey, Arc<RwLock<()>>>>,
}

impl GroupLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// 取得分组对应的读写锁（按需创建）
    pub fn lock_for(&self, group: GroupKey) -> SchedulerResult<Arc<RwLock<()>>> {
        let mut locks = self
            .locks
            .lock()
            .map_err(|e| SchedulerError::LockPoisoned(e.to_string()))?;
        Ok(locks
            .entry(group)
            .or_insert_with(|| Arc::new(RwLock::new(())))
            .clone())
    }
}
