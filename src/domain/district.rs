// ==========================================
// 设备轮换调度系统 - 地区与财年模型
// ==========================================
// 对齐: district_status / local_area / district_equipment_type 表
// ==========================================

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::types::EquipmentClass;

/// 财年起始月份（4 月 1 日）
pub const FISCAL_START_MONTH: u32 = 4;

// ==========================================
// LocalArea - 区域
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalArea {
    pub local_area_id: i64,
    pub name: String,
    pub district_id: i64,
}

// ==========================================
// DistrictEquipmentType - 地区设备类型
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistrictEquipmentType {
    pub equipment_type_id: i64,
    pub name: String,
    pub is_dump_truck: bool,
}

impl DistrictEquipmentType {
    pub fn equipment_class(&self) -> EquipmentClass {
        EquipmentClass::from_dump_truck_flag(self.is_dump_truck)
    }
}

// ==========================================
// DistrictStatus - 地区财年状态
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistrictStatus {
    pub district_id: i64,
    pub current_fiscal_year: i32,
    pub next_fiscal_year: i32,                    // 状态表记录的是财年结束所在年
    pub rollover_end_date: Option<DateTime<Utc>>, // 年度滚动完成时间
}

// ==========================================
// FiscalWindow - 财年窗口
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiscalWindow {
    pub start: DateTime<Utc>,
}

impl FiscalWindow {
    /// 解析有效财年起点
    ///
    /// 规则:
    /// 1) 已记录滚动完成时间 → 以滚动完成时间为起点
    ///    (4 月 1 日之后、滚动完成之前创建的请求不算本财年)
    /// 2) 否则 → (next_fiscal_year - 1) 年 4 月 1 日
    ///
    /// # 返回
    /// - None: 财年数据非法（无法构造日期）
    pub fn resolve(status: &DistrictStatus) -> Option<Self> {
        if let Some(rollover) = status.rollover_end_date {
            return Some(Self { start: rollover });
        }

        let start = NaiveDate::from_ymd_opt(status.next_fiscal_year - 1, FISCAL_START_MONTH, 1)?
            .and_hms_opt(0, 0, 0)?;
        Some(Self {
            start: Utc.from_utc_datetime(&start),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_window_defaults_to_april_first() {
        let status = DistrictStatus {
            district_id: 1,
            current_fiscal_year: 2025,
            next_fiscal_year: 2026,
            rollover_end_date: None,
        };

        let window = FiscalWindow::resolve(&status).unwrap();
        assert_eq!(window.start, utc(2025, 4, 1));
    }

    #[test]
    fn test_rollover_date_takes_precedence() {
        let status = DistrictStatus {
            district_id: 1,
            current_fiscal_year: 2025,
            next_fiscal_year: 2026,
            rollover_end_date: Some(utc(2025, 4, 20)),
        };

        let window = FiscalWindow::resolve(&status).unwrap();
        // 4 月 1 日之后、滚动完成之前的请求不属于本财年
        assert_eq!(window.start, utc(2025, 4, 20));
        assert!(utc(2025, 4, 10) < window.start);
    }

    #[test]
    fn test_rollover_before_april_counts_earlier_requests() {
        let status = DistrictStatus {
            district_id: 1,
            current_fiscal_year: 2025,
            next_fiscal_year: 2026,
            rollover_end_date: Some(utc(2025, 3, 15)),
        };

        let window = FiscalWindow::resolve(&status).unwrap();
        assert_eq!(window.start, utc(2025, 3, 15));
        assert!(utc(2025, 3, 20) >= window.start);
    }
}
