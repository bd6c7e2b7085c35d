// ==========================================
// 设备轮换调度系统 - 轮换调度 API
// ==========================================
// 职责: 资历重算、轮换名单构建与查询、询问应答、资历名单
// 红线: API 层只做编排与校验，规则全部在 Engine 内
// ==========================================

use chrono::Utc;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tracing::{info, instrument};

use crate::api::error::{ApiError, ApiResult};
use crate::config::{config_keys, ScoringRuleSet};
use crate::domain::district::FiscalWindow;
use crate::domain::rotation::{yes_count, RentalRequest, RotationListEntry};
use crate::domain::types::{GroupKey, OfferResponse, RentalRequestStatus};
use crate::engine::rotation::{canonical_candidates, last_asked_in_block};
use crate::engine::seniority_list::display_block_number;
use crate::engine::{
    build_seniority_list, GroupContext, GroupLocks, RankingOutcome, RecalcSummary,
    RotationBuildOutcome, RotationListBuilder, RotationRepositories, SeniorityListEntry,
    SeniorityRankingEngine, SeniorityRecalcJob, SeniorityScoring,
};

// ==========================================
// RotationListView - 名单查询结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RotationListView {
    pub rental_request_id: i64,
    pub first_on_rotation_list_id: Option<i64>,
    pub entries: Vec<RotationListEntry>, // block_number 已映射为展示值
    pub yes_count: usize,
}

// ==========================================
// RotationApi - 轮换调度 API
// ==========================================
pub struct RotationApi {
    repos: RotationRepositories,
    ranking_engine: Arc<SeniorityRankingEngine>,
    builder: RotationListBuilder,
    recalc_job: SeniorityRecalcJob,
}

impl RotationApi {
    /// 基于共享连接创建（默认评分策略）
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        let repos = RotationRepositories::from_connection(conn);
        let locks = Arc::new(GroupLocks::new());
        let engine = SeniorityRankingEngine::new(repos.clone(), locks.clone());
        Self::assemble(repos, locks, engine)
    }

    /// 使用指定评分策略创建
    pub fn with_scoring(conn: Arc<Mutex<Connection>>, scoring: Box<dyn SeniorityScoring>) -> Self {
        let repos = RotationRepositories::from_connection(conn);
        let locks = Arc::new(GroupLocks::new());
        let engine = SeniorityRankingEngine::with_scoring(repos.clone(), locks.clone(), scoring);
        Self::assemble(repos, locks, engine)
    }

    fn assemble(
        repos: RotationRepositories,
        locks: Arc<GroupLocks>,
        engine: SeniorityRankingEngine,
    ) -> Self {
        let ranking_engine = Arc::new(engine);
        Self {
            builder: RotationListBuilder::new(repos.clone(), locks),
            recalc_job: SeniorityRecalcJob::new(repos.clone(), ranking_engine.clone()),
            ranking_engine,
            repos,
        }
    }

    // ==========================================
    // 规则
    // ==========================================

    /// 读取当前评分规则
    pub fn load_scoring_rules(&self) -> ApiResult<ScoringRuleSet> {
        Ok(self.repos.config.load_scoring_rules()?)
    }

    /// 评分规则是否已配置
    pub fn has_scoring_rules(&self) -> ApiResult<bool> {
        Ok(self
            .repos
            .config
            .get_config_value(config_keys::SENIORITY_SCORING_RULES)?
            .is_some())
    }

    pub fn save_scoring_rules(&self, rules: &ScoringRuleSet) -> ApiResult<()> {
        Ok(self.repos.config.save_scoring_rules(rules)?)
    }

    /// 写入默认状态码（仅补齐缺失的键）
    pub fn seed_default_status_codes(&self) -> ApiResult<usize> {
        Ok(self.repos.config.seed_default_status_codes()?)
    }

    // ==========================================
    // 资历排名
    // ==========================================

    /// 重算分组资历与分块
    pub fn recompute_seniority_and_blocks(
        &self,
        local_area_id: i64,
        equipment_type_id: i64,
        rules: &ScoringRuleSet,
    ) -> ApiResult<RankingOutcome> {
        let group = GroupKey::new(local_area_id, equipment_type_id);
        Ok(self.ranking_engine.recompute_seniority_and_blocks(group, rules)?)
    }

    /// 重算存在重复资历的分组
    pub fn recalc_duplicate_seniority(&self, rules: &ScoringRuleSet) -> ApiResult<RecalcSummary> {
        Ok(self.recalc_job.run(rules)?)
    }

    /// 重算全部分组
    pub fn recalc_all_seniority(&self, rules: &ScoringRuleSet) -> ApiResult<RecalcSummary> {
        Ok(self.recalc_job.run_all(rules)?)
    }

    // ==========================================
    // 租用请求与轮换名单
    // ==========================================

    /// 新请求的初始状态
    ///
    /// 同组无其他进行中请求 → In Progress，否则 → New
    pub fn initial_request_status(
        &self,
        local_area_id: i64,
        equipment_type_id: i64,
    ) -> ApiResult<RentalRequestStatus> {
        let group = GroupKey::new(local_area_id, equipment_type_id);
        let in_progress =
            self.repos
                .request_repo
                .count_other_with_status(group, RentalRequestStatus::InProgress, None)?;

        Ok(if in_progress == 0 {
            RentalRequestStatus::InProgress
        } else {
            RentalRequestStatus::New
        })
    }

    /// 创建租用请求并生成轮换名单
    ///
    /// # 返回
    /// - 已保存的请求（含首位询问设备）
    #[instrument(skip(self, rules))]
    pub fn create_rental_request(
        &self,
        rental_request_id: i64,
        local_area_id: i64,
        equipment_type_id: i64,
        equipment_count: i32,
        rules: &ScoringRuleSet,
    ) -> ApiResult<RentalRequest> {
        if equipment_count <= 0 {
            return Err(ApiError::InvalidInput(format!(
                "设备数量必须大于0: {}",
                equipment_count
            )));
        }

        let status = self.initial_request_status(local_area_id, equipment_type_id)?;
        let request = RentalRequest {
            rental_request_id,
            local_area_id: Some(local_area_id),
            equipment_type_id: Some(equipment_type_id),
            status,
            equipment_count,
            first_on_rotation_list_id: None,
            created_at: Utc::now(),
        };

        // 先生成名单（不落库），失败时请求不写入
        let outcome = self.builder.build(
            rental_request_id,
            request.local_area_id,
            request.equipment_type_id,
            rules,
        )?;
        let listed = match &outcome {
            RotationBuildOutcome::Built(list) => self
                .repos
                .request_repo
                .insert_with_rotation_list(&request, list, request.created_at)?,
            RotationBuildOutcome::NothingToDo(_) => {
                self.repos.request_repo.insert(&request)?;
                0
            }
        };

        info!(status = status.to_db_str(), listed, "租用请求已创建");
        self.find_request(rental_request_id)
    }

    /// 生成并保存请求的轮换名单
    pub fn build_rotation_list(
        &self,
        rental_request_id: i64,
        local_area_id: Option<i64>,
        equipment_type_id: Option<i64>,
        rules: &ScoringRuleSet,
    ) -> ApiResult<RotationBuildOutcome> {
        Ok(self
            .builder
            .build_and_save(rental_request_id, local_area_id, equipment_type_id, rules)?)
    }

    /// 查询请求的轮换名单
    ///
    /// 开放块映射为展示值 3
    pub fn get_rotation_list(&self, rental_request_id: i64) -> ApiResult<RotationListView> {
        let request = self.find_request(rental_request_id)?;
        let mut entries = self.repos.rotation_repo.find_by_request(rental_request_id)?;

        if let Some(group) = request.group_key() {
            let rules = self.repos.config.load_scoring_rules()?;
            let context = GroupContext::load(&self.repos, group)?;
            let open_block = rules.class_rules(context.equipment_class())?.open_block_number();
            for entry in &mut entries {
                entry.block_number = display_block_number(entry.block_number, open_block);
            }
        }

        Ok(RotationListView {
            rental_request_id,
            first_on_rotation_list_id: request.first_on_rotation_list_id,
            yes_count: yes_count(&entries),
            entries,
        })
    }

    /// 已接受数（Yes + 强制雇用）
    pub fn yes_count(&self, rental_request_id: i64) -> ApiResult<usize> {
        let entries = self.repos.rotation_repo.find_by_request(rental_request_id)?;
        Ok(yes_count(&entries))
    }

    /// 记录询问应答
    pub fn record_offer_response(
        &self,
        rotation_list_id: i64,
        response: OfferResponse,
        refusal_reason: Option<&str>,
        note: Option<&str>,
    ) -> ApiResult<RotationListEntry> {
        let entry = self.find_entry(rotation_list_id)?;
        if entry.is_force_hire {
            return Err(ApiError::BusinessRuleViolation(format!(
                "名单条目{}已强制雇用",
                rotation_list_id
            )));
        }

        let reason = match response {
            OfferResponse::Yes => None,
            OfferResponse::No => refusal_reason,
        };
        self.repos.rotation_repo.update_offer_response(
            rotation_list_id,
            response,
            reason,
            note,
            Utc::now(),
        )?;

        info!(
            rotation_list_id,
            equipment_id = entry.equipment_id,
            response = response.to_db_str(),
            "询问应答已记录"
        );
        self.find_entry(rotation_list_id)
    }

    /// 强制雇用（不推进轮换位置）
    pub fn force_hire(&self, rotation_list_id: i64, note: Option<&str>) -> ApiResult<RotationListEntry> {
        let entry = self.find_entry(rotation_list_id)?;
        self.repos
            .rotation_repo
            .mark_force_hire(rotation_list_id, note, Utc::now())?;

        info!(rotation_list_id, equipment_id = entry.equipment_id, "强制雇用已记录");
        self.find_entry(rotation_list_id)
    }

    /// 更新请求状态
    pub fn update_request_status(
        &self,
        rental_request_id: i64,
        status: RentalRequestStatus,
    ) -> ApiResult<()> {
        Ok(self.repos.request_repo.update_status(rental_request_id, status)?)
    }

    // ==========================================
    // 资历名单
    // ==========================================

    /// 分组资历名单
    pub fn seniority_list(
        &self,
        local_area_id: i64,
        equipment_type_id: i64,
    ) -> ApiResult<Vec<SeniorityListEntry>> {
        let group = GroupKey::new(local_area_id, equipment_type_id);
        let context = GroupContext::load(&self.repos, group)?;
        let rules = self.repos.config.load_scoring_rules()?;
        let open_block = rules.class_rules(context.equipment_class())?.open_block_number();
        let approved = self.repos.config.approved_status_code()?;
        let active = self.repos.config.active_agreement_status_code()?;

        let records: Vec<_> = self
            .repos
            .equipment_repo
            .find_by_group(group)?
            .into_iter()
            .filter(|r| r.status_code == approved)
            .collect();
        let ids: Vec<i64> = records.iter().map(|r| r.equipment_id).collect();
        let hired = self.repos.agreement_repo.find_hired(&ids, &active)?;
        let last_called = self.last_called(&context, &approved)?;

        Ok(build_seniority_list(&records, &hired, &last_called, open_block))
    }

    /// 各块本财年最近一次被询问的设备
    fn last_called(&self, context: &GroupContext, approved: &str) -> ApiResult<HashSet<i64>> {
        let Some(status) = self
            .repos
            .district_repo
            .find_district_status(context.district_id())?
        else {
            return Ok(HashSet::new());
        };
        let window = FiscalWindow::resolve(&status).ok_or_else(|| {
            ApiError::DataIntegrityError(format!(
                "地区财年数据非法: next_fiscal_year={}",
                status.next_fiscal_year
            ))
        })?;

        let ranked = self
            .repos
            .equipment_repo
            .find_ranked_by_group(context.group, approved)?;
        let candidates = canonical_candidates(&ranked, &HashSet::new());
        // 请求ID从 1 开始，0 表示不排除任何请求
        let history = self
            .repos
            .rotation_repo
            .find_asked_history(context.group, window.start, 0)?;

        let blocks: HashSet<i32> = candidates.iter().map(|c| c.block_number).collect();
        Ok(blocks
            .into_iter()
            .filter_map(|b| last_asked_in_block(&candidates, &history, b))
            .map(|i| candidates[i].equipment_id)
            .collect())
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    fn find_request(&self, rental_request_id: i64) -> ApiResult<RentalRequest> {
        self.repos
            .request_repo
            .find_by_id(rental_request_id)?
            .ok_or_else(|| ApiError::NotFound(format!("rental_request(id={})不存在", rental_request_id)))
    }

    fn find_entry(&self, rotation_list_id: i64) -> ApiResult<RotationListEntry> {
        self.repos
            .rotation_repo
            .find_entry(rotation_list_id)?
            .ok_or_else(|| {
                ApiError::NotFound(format!(
                    "rental_request_rotation_list(id={})不存在",
                    rotation_list_id
                ))
            })
    }
}
