// ==========================================
// 设备轮换调度系统 - 领域类型定义
// ==========================================
// 职责: 设备分类、报价应答、请求状态、分组键
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 设备分类 (Equipment Class)
// ==========================================
// 评分规则按分类取值: Default / DumpTruck
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EquipmentClass {
    Default,   // 普通设备
    DumpTruck, // 自卸车
}

impl EquipmentClass {
    /// 评分规则中的键名
    pub fn rule_key(&self) -> &'static str {
        match self {
            EquipmentClass::Default => "Default",
            EquipmentClass::DumpTruck => "DumpTruck",
        }
    }

    /// 由设备类型的自卸车标志推导分类
    pub fn from_dump_truck_flag(is_dump_truck: bool) -> Self {
        if is_dump_truck {
            EquipmentClass::DumpTruck
        } else {
            EquipmentClass::Default
        }
    }
}

impl fmt::Display for EquipmentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.rule_key())
    }
}

// ==========================================
// 报价应答 (Offer Response)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OfferResponse {
    Yes,
    No,
}

impl OfferResponse {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            OfferResponse::Yes => "Yes",
            OfferResponse::No => "No",
        }
    }

    /// 解析数据库中的应答值（大小写不敏感）
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yes" => Some(OfferResponse::Yes),
            "no" => Some(OfferResponse::No),
            _ => None,
        }
    }
}

impl fmt::Display for OfferResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 租用请求状态 (Rental Request Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RentalRequestStatus {
    New,        // 新建（同组已有进行中的请求）
    InProgress, // 进行中
    Complete,   // 已完成
}

impl RentalRequestStatus {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            RentalRequestStatus::New => "New",
            RentalRequestStatus::InProgress => "In Progress",
            RentalRequestStatus::Complete => "Complete",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "New" => Some(RentalRequestStatus::New),
            "In Progress" => Some(RentalRequestStatus::InProgress),
            "Complete" => Some(RentalRequestStatus::Complete),
            _ => None,
        }
    }
}

impl fmt::Display for RentalRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 分组键 (Group Key)
// ==========================================
// 排名与轮换都以 (区域, 设备类型) 为单位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupKey {
    pub local_area_id: i64,
    pub equipment_type_id: i64,
}

impl GroupKey {
    pub fn new(local_area_id: i64, equipment_type_id: i64) -> Self {
        Self {
            local_area_id,
            equipment_type_id,
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "area={}/type={}", self.local_area_id, self.equipment_type_id)
    }
}
