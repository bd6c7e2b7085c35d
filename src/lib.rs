// ==========================================
// 设备轮换调度系统 - 核心库
// ==========================================
// 职责: 租赁设备资历排名、分块与轮换派工名单
// 技术栈: Rust + SQLite
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 排名与轮换规则
pub mod engine;

// 配置层 - 评分规则与状态码
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{EquipmentClass, GroupKey, OfferResponse, RentalRequestStatus};

// 领域实体
pub use domain::{
    DistrictStatus, EquipmentRecord, FiscalWindow, RentalRequest, RotationCandidate,
    RotationList, RotationListEntry, SeniorityAssignment,
};

// 配置
pub use config::{ConfigManager, ScoringRuleSet};

// 引擎
pub use engine::{
    RotationListBuilder, SchedulerError, SeniorityRankingEngine, SeniorityRecalcJob,
    SeniorityScoring,
};

// API
pub use api::{ApiError, RotationApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "设备轮换调度系统";
