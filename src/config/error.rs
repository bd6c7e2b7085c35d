// ==========================================
// 设备轮换调度系统 - 配置层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 红线: 缺失的规则/键一律报错,不做 0 值兜底
// ==========================================

use thiserror::Error;

/// 配置层错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置项缺失: {0}")]
    MissingKey(String),

    #[error("评分规则缺失: section={section}, class={class}")]
    MissingRule { section: String, class: String },

    #[error("评分规则非法: section={section}, class={class}, value={value}")]
    InvalidRule {
        section: String,
        class: String,
        value: i32,
    },

    #[error("评分规则解析失败: {0}")]
    InvalidPayload(#[from] serde_json::Error),

    #[error("配置读取失败: {0}")]
    Storage(String),
}

impl From<rusqlite::Error> for ConfigError {
    fn from(err: rusqlite::Error) -> Self {
        ConfigError::Storage(err.to_string())
    }
}

/// Result 类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
