// ==========================================
// 设备轮换调度系统 - 资历评分策略
// ==========================================
// 职责: 由服务工时历史计算资历分
// 约束: 公式可替换，评分常数来自评分规则
// ==========================================

use crate::domain::equipment::ServiceHistory;

/// 资历评分策略
pub trait SeniorityScoring: Send + Sync {
    /// 计算资历分（越高越资深）
    ///
    /// # 参数
    /// - `history`: 服务工时历史
    /// - `equipment_score`: 规则中该分类的每单位服务分值
    fn score(&self, history: &ServiceHistory, equipment_score: i32) -> f64;
}

/// 默认策略: 注册年限 × 单位分值 + 前三年平均工时
#[derive(Debug, Clone, Copy, Default)]
pub struct YearsAndAverageHours;

impl SeniorityScoring for YearsAndAverageHours {
    fn score(&self, history: &ServiceHistory, equipment_score: i32) -> f64 {
        let hours = history.prior_three_years();
        let average = hours.iter().sum::<f64>() / hours.len() as f64;
        history.years_of_service * f64::from(equipment_score) + average
    }
}
