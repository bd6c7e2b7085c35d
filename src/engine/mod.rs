// ==========================================
// 设备轮换调度系统 - 引擎层
// ==========================================
// 职责: 资历排名、分块、轮换名单构建
// 红线: Engine 不拼 SQL，数据访问全部经由 Repository
// ==========================================

pub mod block_assignment;
pub mod error;
pub mod group_context;
pub mod group_lock;
pub mod ranking;
pub mod recalc_job;
pub mod repositories;
pub mod rotation;
pub mod scoring;
pub mod seniority_list;

// 重导出核心引擎
pub use block_assignment::{
    assign_blocks, compare_units, rank_group, BlockArena, BlockPlacement, GroupRanking,
    RankedUnit,
};
pub use error::{SchedulerError, SchedulerResult};
pub use group_context::GroupContext;
pub use group_lock::GroupLocks;
pub use ranking::{RankingOutcome, SeniorityRankingEngine};
pub use recalc_job::{GroupFailure, RecalcSummary, SeniorityRecalcJob};
pub use repositories::RotationRepositories;
pub use rotation::{RotationBuildOutcome, RotationListBuilder};
pub use scoring::{SeniorityScoring, YearsAndAverageHours};
pub use seniority_list::{build_seniority_list, SeniorityListEntry};
