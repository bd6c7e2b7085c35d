// ==========================================
// 设备轮换调度系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、财年窗口
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod district;
pub mod equipment;
pub mod rotation;
pub mod types;

// 重导出核心类型
pub use district::{DistrictEquipmentType, DistrictStatus, FiscalWindow, LocalArea};
pub use equipment::{EquipmentRecord, OwnerRef, SeniorityAssignment, ServiceHistory};
pub use rotation::{
    yes_count, RentalRequest, RotationCandidate, RotationHistoryEntry, RotationList,
    RotationListEntry,
};
pub use types::{EquipmentClass, GroupKey, OfferResponse, RentalRequestStatus};
