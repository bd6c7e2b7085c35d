// ==========================================
// 设备轮换调度系统 - 引擎层错误类型
// ==========================================
// 分类:
// - Configuration: 评分规则/状态码缺失，中止本次操作
// - DataIntegrity: 期望存在的区域/设备类型/设备缺失，中止本次操作
// 红线: 引擎不做自动重试
// ==========================================

use crate::config::ConfigError;
use crate::repository::RepositoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("配置错误: {0}")]
    Configuration(#[from] ConfigError),

    #[error("数据完整性错误: {0}")]
    DataIntegrity(String),

    #[error("分组锁获取失败: {0}")]
    LockPoisoned(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Result 类型别名
pub type SchedulerResult<T> = Result<T, SchedulerError>;
