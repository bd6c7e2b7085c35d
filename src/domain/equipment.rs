// ==========================================
// 设备轮换调度系统 - 设备领域模型
// ==========================================
// 对齐: equipment / owner 表
// 红线: 资历/分块字段只由排名引擎改写
// ==========================================

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::types::GroupKey;

// ==========================================
// ServiceHistory - 服务工时历史
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceHistory {
    pub years_of_service: f64,                   // 注册年限
    pub hours_current_year: Option<f64>,         // 本年度工时
    pub hours_last_year: Option<f64>,            // 上一年度工时
    pub hours_two_years_ago: Option<f64>,        // 两年前工时
    pub hours_three_years_ago: Option<f64>,      // 三年前工时
}

impl ServiceHistory {
    /// 前三个完整年度的工时（缺失按 0 计）
    pub fn prior_three_years(&self) -> [f64; 3] {
        [
            self.hours_last_year.unwrap_or(0.0),
            self.hours_two_years_ago.unwrap_or(0.0),
            self.hours_three_years_ago.unwrap_or(0.0),
        ]
    }
}

// ==========================================
// OwnerRef - 设备所属车主
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerRef {
    pub owner_id: i64,
    pub is_maintenance_contractor: bool, // 养护承包商只能进入开放块
}

// ==========================================
// EquipmentRecord - 设备记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentRecord {
    // ===== 标识与分组 =====
    pub equipment_id: i64,
    pub local_area_id: i64,
    pub equipment_type_id: i64,
    pub owner: Option<OwnerRef>,

    // ===== 基础属性 =====
    pub status_code: String,       // 设备状态码 (Approved / ...)
    pub equipment_code: String,    // 设备编码（次级排序键）
    pub received_date: NaiveDate,  // 受理日期（资历同分时的排序键）
    pub service: ServiceHistory,

    // ===== 排名结果 =====
    pub seniority: Option<f64>,
    pub block_number: Option<i32>,
    pub number_in_block: Option<i32>,
    pub seniority_effective_date: Option<DateTime<Utc>>,
}

impl EquipmentRecord {
    pub fn group_key(&self) -> GroupKey {
        GroupKey::new(self.local_area_id, self.equipment_type_id)
    }

    pub fn owner_id(&self) -> Option<i64> {
        self.owner.map(|o| o.owner_id)
    }

    /// 应用一次排名结果（整体覆写）
    pub fn apply(&mut self, assignment: &SeniorityAssignment) {
        self.seniority = assignment.seniority;
        self.block_number = assignment.block_number;
        self.number_in_block = assignment.number_in_block;
        self.seniority_effective_date = Some(assignment.seniority_effective_date);
    }
}

// ==========================================
// SeniorityAssignment - 单台设备的排名结果
// ==========================================
// 排名引擎的输出；由仓储在一个事务内整体写回
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeniorityAssignment {
    pub equipment_id: i64,
    pub seniority: Option<f64>,
    pub block_number: Option<i32>,
    pub number_in_block: Option<i32>,
    pub seniority_effective_date: DateTime<Utc>,
}

impl SeniorityAssignment {
    /// 非 Approved 设备：清空资历与分块
    pub fn cleared(equipment_id: i64, now: DateTime<Utc>) -> Self {
        Self {
            equipment_id,
            seniority: None,
            block_number: None,
            number_in_block: None,
            seniority_effective_date: now,
        }
    }

    pub fn is_placed(&self) -> bool {
        self.block_number.is_some()
    }
}
