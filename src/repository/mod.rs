// ==========================================
// 设备轮换调度系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod district_repo;
pub mod equipment_repo;
pub mod error;
pub mod rental_agreement_repo;
pub mod rental_request_repo;
pub mod rotation_list_repo;

// 重导出核心仓储
pub use district_repo::DistrictRepository;
pub use equipment_repo::EquipmentRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use rental_agreement_repo::RentalAgreementRepository;
pub use rental_request_repo::RentalRequestRepository;
pub use rotation_list_repo::RotationListRepository;
