// ==========================================
// 设备轮换调度系统 - 资历名单视图
// ==========================================
// 职责: 将分组排名结果整理为展示行
// 展示规则:
// - 开放块（total_blocks+1）显示为 "3"，与实际块数无关
// - 未分块显示为 "0"
// - 资历/工时保留至多三位小数，去掉末尾 0
// - 排序键 = block_number * 1000 + number_in_block，未分块排最后
// ==========================================
// TODO: 开放块固定显示 "3" 在 total_blocks != 2 的分类下会与块 3 重名，需与业务确认展示口径
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::domain::equipment::EquipmentRecord;

/// 开放块的展示值
pub const OPEN_BLOCK_DISPLAY: i32 = 3;

/// 未分块设备的排序键
pub const UNASSIGNED_SORT_ORDER: i32 = i32::MAX;

// ==========================================
// SeniorityListEntry - 资历名单展示行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeniorityListEntry {
    pub equipment_id: i64,
    pub equipment_code: String,
    pub owner_id: Option<i64>,
    pub block: String,
    pub seniority: String,
    pub is_hired: bool,
    pub last_called: bool,
    pub hours_last_year: String,
    pub hours_two_years_ago: String,
    pub hours_three_years_ago: String,
    pub seniority_sort_order: i32,
}

/// 块号展示值
pub fn block_label(block_number: Option<i32>, open_block_number: i32) -> String {
    match block_number {
        None => "0".to_string(),
        Some(b) if b == open_block_number => OPEN_BLOCK_DISPLAY.to_string(),
        Some(b) => b.to_string(),
    }
}

/// 块号映射为展示块号（名单接口使用）
pub fn display_block_number(block_number: i32, open_block_number: i32) -> i32 {
    if block_number == open_block_number {
        OPEN_BLOCK_DISPLAY
    } else {
        block_number
    }
}

/// 按 "0.###" 格式化
pub fn format_decimal(value: f64) -> String {
    let text = format!("{:.3}", value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" || text.is_empty() {
        "0".to_string()
    } else {
        text.to_string()
    }
}

/// 资历排序键
pub fn seniority_sort_order(block_number: Option<i32>, number_in_block: Option<i32>) -> i32 {
    match (block_number, number_in_block) {
        (Some(b), Some(n)) => b * 1000 + n,
        _ => UNASSIGNED_SORT_ORDER,
    }
}

/// 生成资历名单
///
/// # 参数
/// - `records`: 分组内 Approved 设备
/// - `hired`: 在租设备
/// - `last_called`: 各块最近一次被询问的设备
/// - `open_block_number`: 当前规则下的开放块编号
///
/// # 返回
/// 按排序键升序，同键按资历降序
pub fn build_seniority_list(
    records: &[EquipmentRecord],
    hired: &HashSet<i64>,
    last_called: &HashSet<i64>,
    open_block_number: i32,
) -> Vec<SeniorityListEntry> {
    let mut rows: Vec<(Option<f64>, SeniorityListEntry)> = records
        .iter()
        .map(|r| {
            let [last, two, three] = r.service.prior_three_years();
            let entry = SeniorityListEntry {
                equipment_id: r.equipment_id,
                equipment_code: r.equipment_code.clone(),
                owner_id: r.owner_id(),
                block: block_label(r.block_number, open_block_number),
                seniority: r.seniority.map(format_decimal).unwrap_or_default(),
                is_hired: hired.contains(&r.equipment_id),
                last_called: last_called.contains(&r.equipment_id),
                hours_last_year: format_decimal(last),
                hours_two_years_ago: format_decimal(two),
                hours_three_years_ago: format_decimal(three),
                seniority_sort_order: seniority_sort_order(r.block_number, r.number_in_block),
            };
            (r.seniority, entry)
        })
        .collect();

    rows.sort_by(|(sa, a), (sb, b)| {
        a.seniority_sort_order
            .cmp(&b.seniority_sort_order)
            .then_with(|| sb.unwrap_or(f64::MIN).total_cmp(&sa.unwrap_or(f64::MIN)))
            .then_with(|| a.equipment_id.cmp(&b.equipment_id))
    });

    rows.into_iter().map(|(_, entry)| entry).collect()
}
