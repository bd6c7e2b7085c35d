// ==========================================
// 设备轮换调度系统 - 轮换名单构建器
// ==========================================
// 职责: 为租用请求生成公平的询问顺序
// 输入: 请求ID + 区域 + 设备类型 + 评分规则
// 输出: 有序候选 + 首位询问设备
// ==========================================
// 红线:
// - 持分组读锁读取分块，保证快照一致
// - 在租设备（合同有效且关联请求）不再询问
// - 接续只依据历史询问轨迹，不复用旧名单
// ==========================================

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::config::ScoringRuleSet;
use crate::domain::district::FiscalWindow;
use crate::domain::rotation::RotationList;
use crate::domain::types::GroupKey;
use crate::engine::error::{SchedulerError, SchedulerResult};
use crate::engine::group_context::GroupContext;
use crate::engine::group_lock::GroupLocks;
use crate::engine::repositories::RotationRepositories;
use crate::engine::rotation::core::{canonical_candidates, order_rotation};

// ==========================================
// RotationBuildOutcome - 构建结果
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub enum RotationBuildOutcome {
    /// 请求缺少区域/设备类型，无事可做
    NothingToDo(String),
    /// 已生成名单（可能为空）
    Built(RotationList),
}

impl RotationBuildOutcome {
    pub fn list(&self) -> Option<&RotationList> {
        match self {
            Self::Built(list) => Some(list),
            Self::NothingToDo(_) => None,
        }
    }
}

// ==========================================
// RotationListBuilder - 轮换名单构建器
// ==========================================
pub struct RotationListBuilder {
    repos: RotationRepositories,
    locks: Arc<GroupLocks>,
}

impl RotationListBuilder {
    pub fn new(repos: RotationRepositories, locks: Arc<GroupLocks>) -> Self {
        Self { repos, locks }
    }

    /// 生成轮换名单（不落库）
    ///
    /// # 参数
    /// - `rental_request_id`: 当前请求（历史查询中排除）
    /// - `local_area_id` / `equipment_type_id`: 任一缺失 → NothingToDo
    /// - `rules`: 评分规则（校验分类规则存在）
    ///
    /// # 返回
    /// - `Err(DataIntegrity)`: 区域/设备类型/地区财年状态缺失
    /// - `Err(Configuration)`: 规则或状态码缺失
    #[instrument(skip(self, rules))]
    pub fn build(
        &self,
        rental_request_id: i64,
        local_area_id: Option<i64>,
        equipment_type_id: Option<i64>,
        rules: &ScoringRuleSet,
    ) -> SchedulerResult<RotationBuildOutcome> {
        let group = match (local_area_id, equipment_type_id) {
            (Some(area), Some(kind)) => GroupKey::new(area, kind),
            _ => {
                debug!("请求缺少区域或设备类型，跳过");
                return Ok(RotationBuildOutcome::NothingToDo(
                    "请求缺少区域或设备类型".to_string(),
                ));
            }
        };

        let context = GroupContext::load(&self.repos, group)?;
        let class_rules = rules.class_rules(context.equipment_class())?;
        let approved = self.repos.config.approved_status_code()?;
        let active = self.repos.config.active_agreement_status_code()?;

        let lock = self.locks.lock_for(group)?;
        let _guard = lock
            .read()
            .map_err(|e| SchedulerError::LockPoisoned(e.to_string()))?;

        // ===== 规范顺序 + 在租排除 =====
        let ranked = self.repos.equipment_repo.find_ranked_by_group(group, &approved)?;
        let ids: Vec<i64> = ranked.iter().map(|r| r.equipment_id).collect();
        let hired = self.repos.agreement_repo.find_hired(&ids, &active)?;
        let candidates = canonical_candidates(&ranked, &hired);

        let open_block = class_rules.open_block_number();
        if candidates.iter().any(|c| c.block_number > open_block) {
            warn!(open_block, "存在超出当前规则块数的分块，分组可能需要重算");
        }

        if candidates.is_empty() {
            info!(%group, hired = hired.len(), "分组无可询问设备");
            return Ok(RotationBuildOutcome::Built(RotationList::empty(rental_request_id)));
        }

        // ===== 财年窗口与历史 =====
        let status = self
            .repos
            .district_repo
            .find_district_status(context.district_id())?
            .ok_or_else(|| {
                SchedulerError::DataIntegrity(format!(
                    "地区财年状态不存在: {}",
                    context.district_id()
                ))
            })?;
        let window = FiscalWindow::resolve(&status).ok_or_else(|| {
            SchedulerError::DataIntegrity(format!(
                "地区财年数据非法: next_fiscal_year={}",
                status.next_fiscal_year
            ))
        })?;

        let has_prior = self
            .repos
            .request_repo
            .exists_other_since(group, window.start, rental_request_id)?;
        let history = if has_prior {
            self.repos
                .rotation_repo
                .find_asked_history(group, window.start, rental_request_id)?
        } else {
            Vec::new()
        };

        let list = order_rotation(rental_request_id, &candidates, &history);

        info!(
            %group,
            fiscal_start = %window.start,
            candidates = list.len(),
            hired = hired.len(),
            history = history.len(),
            first_to_ask = ?list.first_to_ask,
            "轮换名单生成完成"
        );

        Ok(RotationBuildOutcome::Built(list))
    }

    /// 生成并保存轮换名单（单事务替换该请求旧名单）
    pub fn build_and_save(
        &self,
        rental_request_id: i64,
        local_area_id: Option<i64>,
        equipment_type_id: Option<i64>,
        rules: &ScoringRuleSet,
    ) -> SchedulerResult<RotationBuildOutcome> {
        let outcome = self.build(rental_request_id, local_area_id, equipment_type_id, rules)?;

        if let RotationBuildOutcome::Built(list) = &outcome {
            let saved = self.repos.rotation_repo.replace_for_request(list, Utc::now())?;
            debug!(rental_request_id, saved, "轮换名单已保存");
        }

        Ok(outcome)
    }
}
