// ==========================================
// 设备轮换调度系统 - 轮换名单领域模型
// ==========================================
// 对齐: rental_request / rental_request_rotation_list 表
// 红线: 轮换名单按请求新建，不跨请求复用
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::types::{GroupKey, OfferResponse, RentalRequestStatus};

// ==========================================
// RentalRequest - 租用请求
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentalRequest {
    pub rental_request_id: i64,
    pub local_area_id: Option<i64>,     // 未保存/草稿请求可能为空
    pub equipment_type_id: Option<i64>, // 同上
    pub status: RentalRequestStatus,
    pub equipment_count: i32,
    pub first_on_rotation_list_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl RentalRequest {
    /// 区域与设备类型齐全时返回分组键
    pub fn group_key(&self) -> Option<GroupKey> {
        match (self.local_area_id, self.equipment_type_id) {
            (Some(area), Some(kind)) => Some(GroupKey::new(area, kind)),
            _ => None,
        }
    }
}

// ==========================================
// RotationCandidate - 轮换候选
// ==========================================
// 每次请求新生成；block_number 为设备当前所在块
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RotationCandidate {
    pub equipment_id: i64,
    pub block_number: i32,
    pub seniority: Option<f64>,
    pub sort_order: i32,
}

// ==========================================
// RotationList - 单次请求的轮换名单
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RotationList {
    pub rental_request_id: i64,
    pub candidates: Vec<RotationCandidate>,
    pub first_to_ask: Option<i64>,
}

impl RotationList {
    /// 空名单（无候选或请求不完整）
    pub fn empty(rental_request_id: i64) -> Self {
        Self {
            rental_request_id,
            candidates: Vec::new(),
            first_to_ask: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn equipment_ids(&self) -> Vec<i64> {
        self.candidates.iter().map(|c| c.equipment_id).collect()
    }
}

// ==========================================
// RotationHistoryEntry - 历史询问记录
// ==========================================
// 只收录 was_asked 且非强制雇用的条目
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationHistoryEntry {
    pub rental_request_id: i64,
    pub equipment_id: i64,
    pub sort_order: i32,
}

// ==========================================
// RotationListEntry - 已落库的轮换名单条目
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RotationListEntry {
    pub rotation_list_id: i64,
    pub rental_request_id: i64,
    pub equipment_id: i64,
    pub block_number: i32,
    pub seniority: Option<f64>,
    pub sort_order: i32,

    // ===== 询问与应答 =====
    pub was_asked: bool,
    pub offer_response: Option<OfferResponse>,
    pub offer_refusal_reason: Option<String>,
    pub offer_response_note: Option<String>,
    pub offer_response_at: Option<DateTime<Utc>>,

    // ===== 强制雇用 =====
    pub is_force_hire: bool,
    pub note: Option<String>,
}

impl RotationListEntry {
    /// 是否计入已接受数（Yes 或强制雇用各计一次）
    pub fn yes_weight(&self) -> usize {
        let mut n = 0;
        if self.offer_response == Some(OfferResponse::Yes) {
            n += 1;
        }
        if self.is_force_hire {
            n += 1;
        }
        n
    }
}

/// 统计已接受数（Yes + 强制雇用）
pub fn yes_count(entries: &[RotationListEntry]) -> usize {
    entries.iter().map(RotationListEntry::yes_weight).sum()
}
