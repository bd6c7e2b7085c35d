// ==========================================
// 设备轮换调度系统 - 配置层
// ==========================================
// 职责: 评分规则与状态码配置
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod error;
pub mod scoring_rules;

// 重导出核心配置类型
pub use config_manager::{config_keys, ConfigManager};
pub use error::{ConfigError, ConfigResult};
pub use scoring_rules::{ClassRules, ScoringRuleSet};
