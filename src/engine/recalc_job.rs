// ==========================================
// 设备轮换调度系统 - 资历重算批处理任务
// ==========================================
// 职责:
// - run: 重算存在 (资历, 受理日期) 重复的分组
// - run_all: 重算所有有设备的分组
// 红线: 配置错误中止整个任务; 单个分组的数据错误记录后继续
// ==========================================

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::config::ScoringRuleSet;
use crate::domain::types::GroupKey;
use crate::engine::error::{SchedulerError, SchedulerResult};
use crate::engine::ranking::SeniorityRankingEngine;
use crate::engine::repositories::RotationRepositories;

// ==========================================
// RecalcSummary - 任务摘要
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecalcSummary {
    pub job_id: String,
    pub groups_total: usize,
    pub groups_recomputed: usize,
    pub failures: Vec<GroupFailure>,
}

impl RecalcSummary {
    /// 所有分组均重算成功
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.groups_recomputed == self.groups_total
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupFailure {
    pub group: GroupKey,
    pub message: String,
}

// ==========================================
// SeniorityRecalcJob - 资历重算任务
// ==========================================
pub struct SeniorityRecalcJob {
    repos: RotationRepositories,
    engine: Arc<SeniorityRankingEngine>,
}

impl SeniorityRecalcJob {
    pub fn new(repos: RotationRepositories, engine: Arc<SeniorityRankingEngine>) -> Self {
        Self { repos, engine }
    }

    /// 重算存在重复资历的分组
    pub fn run(&self, rules: &ScoringRuleSet) -> SchedulerResult<RecalcSummary> {
        let approved = self.repos.config.approved_status_code()?;
        let groups = self
            .repos
            .equipment_repo
            .find_groups_with_duplicate_seniority(&approved)?;
        self.recompute_groups("duplicates", &groups, rules)
    }

    /// 重算全部分组
    pub fn run_all(&self, rules: &ScoringRuleSet) -> SchedulerResult<RecalcSummary> {
        let groups = self.repos.equipment_repo.find_all_groups()?;
        self.recompute_groups("all", &groups, rules)
    }

    #[instrument(skip(self, groups, rules), fields(job_id = tracing::field::Empty))]
    fn recompute_groups(
        &self,
        scope: &str,
        groups: &[GroupKey],
        rules: &ScoringRuleSet,
    ) -> SchedulerResult<RecalcSummary> {
        let job_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("job_id", job_id.as_str());

        let total = groups.len();
        info!(scope, total, "资历重算任务开始");

        let mut summary = RecalcSummary {
            job_id,
            groups_total: total,
            groups_recomputed: 0,
            failures: Vec::new(),
        };

        for (i, &group) in groups.iter().enumerate() {
            match self.engine.recompute_seniority_and_blocks(group, rules) {
                Ok(_) => summary.groups_recomputed += 1,
                Err(e @ SchedulerError::Configuration(_)) => {
                    error!(%group, error = %e, "配置错误，任务中止");
                    return Err(e);
                }
                Err(e) => {
                    warn!(%group, error = %e, "分组重算失败，继续下一分组");
                    summary.failures.push(GroupFailure {
                        group,
                        message: e.to_string(),
                    });
                }
            }
            info!("processed {} / {}", i + 1, total);
        }

        info!(
            recomputed = summary.groups_recomputed,
            failed = summary.failures.len(),
            "资历重算任务完成"
        );
        Ok(summary)
    }
}
