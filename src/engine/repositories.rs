// ==========================================
// 设备轮换调度系统 - 引擎层仓储聚合
// ==========================================
// 职责: 聚合排名引擎与轮换名单构建所需的所有 Repository
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::config::ConfigManager;
use crate::repository::{
    DistrictRepository, EquipmentRepository, RentalAgreementRepository, RentalRequestRepository,
    RotationListRepository,
};

/// 调度仓储集合
///
/// # 包含的仓储
/// - `equipment_repo`: 设备及资历/分块
/// - `district_repo`: 区域、设备类型、财年状态
/// - `agreement_repo`: 租赁合同（在租排除）
/// - `request_repo`: 租用请求
/// - `rotation_repo`: 轮换名单与询问轨迹
/// - `config`: 状态码配置
#[derive(Clone)]
pub struct RotationRepositories {
    pub equipment_repo: Arc<EquipmentRepository>,
    pub district_repo: Arc<DistrictRepository>,
    pub agreement_repo: Arc<RentalAgreementRepository>,
    pub request_repo: Arc<RentalRequestRepository>,
    pub rotation_repo: Arc<RotationListRepository>,
    pub config: Arc<ConfigManager>,
}

impl RotationRepositories {
    /// 基于同一连接创建全部仓储
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            equipment_repo: Arc::new(EquipmentRepository::new(conn.clone())),
            district_repo: Arc::new(DistrictRepository::new(conn.clone())),
            agreement_repo: Arc::new(RentalAgreementRepository::new(conn.clone())),
            request_repo: Arc::new(RentalRequestRepository::new(conn.clone())),
            rotation_repo: Arc::new(RotationListRepository::new(conn.clone())),
            config: Arc::new(ConfigManager::from_connection(conn)),
        }
    }
}
