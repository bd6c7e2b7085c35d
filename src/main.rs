// ==========================================
// 设备轮换调度系统 - 批处理入口
// ==========================================
// 用法: equipment-rotation [db_path] [recalc-duplicates|recalc-all]
// 默认任务: recalc-all
// ==========================================

use anyhow::{bail, Context, Result};
use std::sync::{Arc, Mutex};

use equipment_rotation::db::{default_db_path, init_schema, open_sqlite_connection};
use equipment_rotation::{logging, RotationApi, ScoringRuleSet, APP_NAME, VERSION};

const JOB_RECALC_DUPLICATES: &str = "recalc-duplicates";
const JOB_RECALC_ALL: &str = "recalc-all";

fn is_job_name(arg: &str) -> bool {
    arg == JOB_RECALC_DUPLICATES || arg == JOB_RECALC_ALL
}

fn main() -> Result<()> {
    logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (db_path, job) = match args.as_slice() {
        [] => (default_db_path(), JOB_RECALC_ALL.to_string()),
        [only] if is_job_name(only) => (default_db_path(), only.clone()),
        [path] => (path.clone(), JOB_RECALC_ALL.to_string()),
        [path, job, ..] => (path.clone(), job.clone()),
    };
    if !is_job_name(&job) {
        bail!("未知任务: {} (可选: {} | {})", job, JOB_RECALC_DUPLICATES, JOB_RECALC_ALL);
    }

    tracing::info!("{} v{}", APP_NAME, VERSION);
    tracing::info!(db_path = %db_path, job = %job, "使用数据库");

    let conn = open_sqlite_connection(&db_path)
        .with_context(|| format!("无法打开数据库: {}", db_path))?;
    init_schema(&conn).context("初始化数据库结构失败")?;

    let api = RotationApi::new(Arc::new(Mutex::new(conn)));
    let rules = if api.has_scoring_rules()? {
        api.load_scoring_rules()?
    } else {
        tracing::warn!("未找到评分规则，写入默认规则与状态码");
        let rules = ScoringRuleSet::default_rules();
        api.save_scoring_rules(&rules)?;
        let seeded = api.seed_default_status_codes()?;
        tracing::info!(seeded, "默认状态码已补齐");
        rules
    };

    let summary = if job == JOB_RECALC_DUPLICATES {
        api.recalc_duplicate_seniority(&rules)?
    } else {
        api.recalc_all_seniority(&rules)?
    };

    println!(
        "job={} groups={} recomputed={} failed={}",
        summary.job_id,
        summary.groups_total,
        summary.groups_recomputed,
        summary.failures.len()
    );

    if !summary.is_complete() {
        for failure in &summary.failures {
            tracing::error!(group = %failure.group, error = %failure.message, "分组重算失败");
        }
        bail!(
            "资历重算未全部完成: {} / {} 个分组失败",
            summary.failures.len(),
            summary.groups_total
        );
    }
    Ok(())
}
