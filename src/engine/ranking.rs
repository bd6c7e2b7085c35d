// ==========================================
// 设备轮换调度系统 - 资历排名引擎
// ==========================================
// 职责: 对 (区域, 设备类型) 分组重算资历并分块
// 输入: 分组键 + 评分规则
// 输出: 写回每台设备的资历/块号/块内序号
// ==========================================
// 红线:
// - 同一分组写锁内完成 读取 → 计算 → 写回
// - 写回为单事务，不会出现跨块的半写状态
// - Approved 状态码缺失即中止，不写任何数据
// ==========================================

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::config::ScoringRuleSet;
use crate::domain::types::GroupKey;
use crate::engine::block_assignment::rank_group;
use crate::engine::error::{SchedulerError, SchedulerResult};
use crate::engine::group_context::GroupContext;
use crate::engine::group_lock::GroupLocks;
use crate::engine::repositories::RotationRepositories;
use crate::engine::scoring::{SeniorityScoring, YearsAndAverageHours};

// ==========================================
// RankingOutcome - 排名结果摘要
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingOutcome {
    pub group: GroupKey,
    pub approved_count: usize,   // 参与排名的 Approved 设备数
    pub cleared_count: usize,    // 被清空资历的非 Approved 设备数
    pub unplaced_count: usize,   // 无车主未分块数
    pub block_sizes: Vec<usize>, // 各块设备数（最后一项为开放块）
    pub updated_rows: usize,
}

// ==========================================
// SeniorityRankingEngine - 资历排名引擎
// ==========================================
pub struct SeniorityRankingEngine {
    repos: RotationRepositories,
    scoring: Box<dyn SeniorityScoring>,
    locks: Arc<GroupLocks>,
}

impl SeniorityRankingEngine {
    /// 使用默认评分策略创建引擎
    pub fn new(repos: RotationRepositories, locks: Arc<GroupLocks>) -> Self {
        Self::with_scoring(repos, locks, Box::new(YearsAndAverageHours))
    }

    /// 使用指定评分策略创建引擎
    pub fn with_scoring(
        repos: RotationRepositories,
        locks: Arc<GroupLocks>,
        scoring: Box<dyn SeniorityScoring>,
    ) -> Self {
        Self {
            repos,
            scoring,
            locks,
        }
    }

    /// 重算分组资历与分块
    ///
    /// # 参数
    /// - `group`: (区域, 设备类型)
    /// - `rules`: 本次计算使用的评分规则（只读）
    ///
    /// # 返回
    /// - `Ok(RankingOutcome)`: 写回完成
    /// - `Err(Configuration)`: 规则或 Approved 状态码缺失
    /// - `Err(DataIntegrity)`: 区域/设备类型不存在
    #[instrument(skip(self, rules), fields(local_area_id = group.local_area_id, equipment_type_id = group.equipment_type_id))]
    pub fn recompute_seniority_and_blocks(
        &self,
        group: GroupKey,
        rules: &ScoringRuleSet,
    ) -> SchedulerResult<RankingOutcome> {
        let context = GroupContext::load(&self.repos, group)?;
        let class = context.equipment_class();
        let class_rules = rules.class_rules(class)?;
        let approved = self.repos.config.approved_status_code()?;

        debug!(
            class = class.rule_key(),
            block_size = class_rules.block_size,
            total_blocks = class_rules.total_blocks,
            "加载分组规则"
        );

        let lock = self.locks.lock_for(group)?;
        let _guard = lock
            .write()
            .map_err(|e| SchedulerError::LockPoisoned(e.to_string()))?;

        let records = self.repos.equipment_repo.find_by_group(group)?;
        let ranking = rank_group(
            &records,
            &approved,
            &class_rules,
            self.scoring.as_ref(),
            Utc::now(),
        );
        let updated_rows = self.repos.equipment_repo.save_assignments(&ranking.assignments)?;

        info!(
            approved = ranking.approved_count,
            cleared = ranking.cleared_count,
            unplaced = ranking.unplaced_count,
            blocks = ?ranking.block_sizes,
            "资历排名完成"
        );

        Ok(RankingOutcome {
            group,
            approved_count: ranking.approved_count,
            cleared_count: ranking.cleared_count,
            unplaced_count: ranking.unplaced_count,
            block_sizes: ranking.block_sizes,
            updated_rows,
        })
    }
}
