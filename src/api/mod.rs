// ==========================================
// 设备轮换调度系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口，供批处理程序与宿主系统调用
// ==========================================

pub mod error;
pub mod rotation_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use rotation_api::{RotationApi, RotationListView};
