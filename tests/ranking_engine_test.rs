// ==========================================
// 资历排名引擎集成测试
// ==========================================
// 职责: 验证 读取 → 排名分块 → 事务写回 的完整链路
// ==========================================

mod test_helpers;

use equipment_rotation::config::{config_keys, ConfigManager};
use equipment_rotation::domain::equipment::ServiceHistory;
use equipment_rotation::engine::{
    GroupLocks, RotationRepositories, SchedulerError, SeniorityRankingEngine, SeniorityScoring,
};
use equipment_rotation::GroupKey;
use std::sync::Arc;
use test_helpers::*;

fn engine(conn: &SharedConn) -> SeniorityRankingEngine {
    SeniorityRankingEngine::new(
        RotationRepositories::from_connection(conn.clone()),
        Arc::new(GroupLocks::new()),
    )
}

#[test]
fn test_recompute_places_five_unit_fixture() {
    let (_temp, conn) = setup();
    seed_group(&conn, 2026, None);
    for owner in [100, 200, 300] {
        seed_owner(&conn, owner, false);
    }
    seed_equipment(&conn, 1, Some(100), 9.0);
    seed_equipment(&conn, 2, Some(200), 8.0);
    seed_equipment(&conn, 3, Some(100), 7.0);
    seed_equipment(&conn, 4, Some(300), 6.0);
    seed_equipment(&conn, 5, Some(200), 5.0);

    let outcome = engine(&conn)
        .recompute_seniority_and_blocks(GroupKey::new(AREA, KIND), &rules_with(2, 2))
        .unwrap();

    assert_eq!(outcome.approved_count, 5);
    assert_eq!(outcome.block_sizes, vec![2, 2, 1]);
    assert_eq!(outcome.updated_rows, 5);

    assert_eq!(block_of(&conn, 1), (Some(1), Some(1)));
    assert_eq!(block_of(&conn, 2), (Some(1), Some(2)));
    assert_eq!(block_of(&conn, 3), (Some(2), Some(1)));
    assert_eq!(block_of(&conn, 4), (Some(2), Some(2)));
    assert_eq!(block_of(&conn, 5), (Some(3), Some(1)));
}

#[test]
fn test_non_approved_equipment_is_cleared() {
    let (_temp, conn) = setup();
    seed_group(&conn, 2026, None);
    seed_owner(&conn, 100, false);
    seed_equipment(&conn, 1, Some(100), 9.0);
    seed_equipment_with_status(&conn, 2, Some(100), 8.0, "Archived");
    conn.lock()
        .unwrap()
        .execute(
            "UPDATE equipment SET seniority = 80, block_number = 1, number_in_block = 2 WHERE equipment_id = 2",
            [],
        )
        .unwrap();

    let outcome = engine(&conn)
        .recompute_seniority_and_blocks(GroupKey::new(AREA, KIND), &rules_with(10, 2))
        .unwrap();

    assert_eq!(outcome.cleared_count, 1);
    assert_eq!(block_of(&conn, 2), (None, None));

    let (seniority, effective): (Option<f64>, Option<String>) = conn
        .lock()
        .unwrap()
        .query_row(
            "SELECT seniority, seniority_effective_date FROM equipment WHERE equipment_id = 2",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(seniority, None);
    assert!(effective.is_some());
}

#[test]
fn test_recompute_is_idempotent() {
    let (_temp, conn) = setup();
    seed_group(&conn, 2026, None);
    for owner in 1..=4 {
        seed_owner(&conn, owner, owner == 4);
    }
    for id in 1..=12 {
        seed_equipment(&conn, id, Some(id % 4 + 1), (id * 3 % 7) as f64);
    }
    let group = GroupKey::new(AREA, KIND);
    let rules = rules_with(3, 2);
    let engine = engine(&conn);

    engine.recompute_seniority_and_blocks(group, &rules).unwrap();
    let first: Vec<_> = (1..=12).map(|id| block_of(&conn, id)).collect();
    engine.recompute_seniority_and_blocks(group, &rules).unwrap();
    let second: Vec<_> = (1..=12).map(|id| block_of(&conn, id)).collect();

    assert_eq!(first, second);
}

#[test]
fn test_blank_approved_status_aborts_without_writes() {
    let (_temp, conn) = setup();
    seed_group(&conn, 2026, None);
    seed_owner(&conn, 100, false);
    seed_equipment(&conn, 1, Some(100), 9.0);
    ConfigManager::from_connection(conn.clone())
        .set_config_value(config_keys::EQUIPMENT_STATUS_APPROVED, "")
        .unwrap();

    let err = engine(&conn)
        .recompute_seniority_and_blocks(GroupKey::new(AREA, KIND), &rules_with(10, 2))
        .unwrap_err();

    assert!(matches!(err, SchedulerError::Configuration(_)));
    assert_eq!(block_of(&conn, 1), (None, None));
}

#[test]
fn test_absent_approved_status_key_aborts_without_writes() {
    let (_temp, conn) = setup();
    seed_group(&conn, 2026, None);
    seed_owner(&conn, 100, false);
    seed_equipment(&conn, 1, Some(100), 9.0);
    conn.lock()
        .unwrap()
        .execute(
            "DELETE FROM config_kv WHERE key = ?1",
            [config_keys::EQUIPMENT_STATUS_APPROVED],
        )
        .unwrap();

    let err = engine(&conn)
        .recompute_seniority_and_blocks(GroupKey::new(AREA, KIND), &rules_with(10, 2))
        .unwrap_err();

    assert!(matches!(err, SchedulerError::Configuration(_)));
    assert_eq!(block_of(&conn, 1), (None, None));
}

#[test]
fn test_missing_rule_class_is_configuration_error() {
    let (_temp, conn) = setup();
    seed_group(&conn, 2026, None);
    let rules = equipment_rotation::ScoringRuleSet::from_json(
        r#"{"EquipmentScore": {"DumpTruck": 60}, "BlockSize": {"DumpTruck": 10}, "TotalBlocks": {"DumpTruck": 3}}"#,
    )
    .unwrap();

    let err = engine(&conn)
        .recompute_seniority_and_blocks(GroupKey::new(AREA, KIND), &rules)
        .unwrap_err();

    assert!(matches!(err, SchedulerError::Configuration(_)));
}

#[test]
fn test_unknown_area_is_data_integrity_error() {
    let (_temp, conn) = setup();
    seed_group(&conn, 2026, None);

    let err = engine(&conn)
        .recompute_seniority_and_blocks(GroupKey::new(999, KIND), &rules_with(10, 2))
        .unwrap_err();

    assert!(matches!(err, SchedulerError::DataIntegrity(_)));
}

/// 只看本年度工时的评分策略
struct CurrentYearOnly;

impl SeniorityScoring for CurrentYearOnly {
    fn score(&self, history: &ServiceHistory, _equipment_score: i32) -> f64 {
        history.hours_current_year.unwrap_or(0.0)
    }
}

#[test]
fn test_scoring_strategy_is_pluggable() {
    let (_temp, conn) = setup();
    seed_group(&conn, 2026, None);
    seed_owner(&conn, 1, false);
    seed_owner(&conn, 2, false);
    seed_equipment(&conn, 1, Some(1), 9.0);
    seed_equipment(&conn, 2, Some(2), 1.0);
    conn.lock()
        .unwrap()
        .execute(
            "UPDATE equipment SET service_hours_current_year = 500 WHERE equipment_id = 2",
            [],
        )
        .unwrap();

    let engine = SeniorityRankingEngine::with_scoring(
        RotationRepositories::from_connection(conn.clone()),
        Arc::new(GroupLocks::new()),
        Box::new(CurrentYearOnly),
    );
    engine
        .recompute_seniority_and_blocks(GroupKey::new(AREA, KIND), &rules_with(10, 2))
        .unwrap();

    assert_eq!(block_of(&conn, 2), (Some(1), Some(1)));
    assert_eq!(block_of(&conn, 1), (Some(1), Some(2)));
}

#[test]
fn test_concurrent_recompute_of_same_group_is_consistent() {
    let (_temp, conn) = setup();
    seed_group(&conn, 2026, None);
    for id in 1..=8 {
        seed_owner(&conn, id, false);
        seed_equipment(&conn, id, Some(id % 3 + 1), id as f64);
    }
    let engine = Arc::new(engine(&conn));
    let rules = Arc::new(rules_with(2, 2));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let engine = engine.clone();
            let rules = rules.clone();
            std::thread::spawn(move || {
                engine
                    .recompute_seniority_and_blocks(GroupKey::new(AREA, KIND), &rules)
                    .unwrap()
            })
        })
        .collect();
    let outcomes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert!(outcomes.windows(2).all(|w| w[0].block_sizes == w[1].block_sizes));
    let placed = (1..=8).filter(|&id| block_of(&conn, id).0.is_some()).count();
    assert_eq!(placed, 8);
}
