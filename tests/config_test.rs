// ==========================================
// ConfigManager 集成测试
// ==========================================
// 测试目标: 验证基于文件数据库的配置读写
// ==========================================

mod test_helpers;

use equipment_rotation::config::{config_keys, ConfigError, ConfigManager};
use equipment_rotation::{EquipmentClass, ScoringRuleSet};
use test_helpers::create_test_db;

#[test]
fn test_config_manager_creation() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");

    let config_manager = ConfigManager::new(&db_path);
    assert!(
        config_manager.is_ok(),
        "ConfigManager should be created successfully"
    );
}

#[test]
fn test_scoring_rules_persist_across_managers() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");

    let mut rules = ScoringRuleSet::default_rules();
    rules.set(EquipmentClass::DumpTruck, 75, 6, 4);
    ConfigManager::new(&db_path)
        .unwrap()
        .save_scoring_rules(&rules)
        .unwrap();

    let loaded = ConfigManager::new(&db_path)
        .unwrap()
        .load_scoring_rules()
        .unwrap();
    let dump_truck = loaded.class_rules(EquipmentClass::DumpTruck).unwrap();

    assert_eq!(dump_truck.equipment_score, 75);
    assert_eq!(dump_truck.block_size, 6);
    assert_eq!(dump_truck.number_of_blocks(), 5);
}

#[test]
fn test_missing_rules_is_configuration_error() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let config_manager = ConfigManager::new(&db_path).unwrap();

    let err = config_manager.load_scoring_rules().unwrap_err();
    assert!(matches!(err, ConfigError::MissingKey(key) if key == config_keys::SENIORITY_SCORING_RULES));
}

#[test]
fn test_malformed_rules_payload_is_rejected() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let config_manager = ConfigManager::new(&db_path).unwrap();
    config_manager
        .set_config_value(config_keys::SENIORITY_SCORING_RULES, "{not json")
        .unwrap();

    let err = config_manager.load_scoring_rules().unwrap_err();
    assert!(matches!(err, ConfigError::InvalidPayload(_)));
}

#[test]
fn test_status_codes_absent_on_fresh_database() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let config_manager = ConfigManager::new(&db_path).unwrap();

    let err = config_manager.approved_status_code().unwrap_err();
    assert!(matches!(err, ConfigError::MissingKey(key) if key == config_keys::EQUIPMENT_STATUS_APPROVED));
}

#[test]
fn test_status_codes_seeded_and_override() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let config_manager = ConfigManager::new(&db_path).unwrap();
    config_manager.seed_default_status_codes().unwrap();

    assert_eq!(config_manager.approved_status_code().unwrap(), "Approved");
    assert_eq!(config_manager.active_agreement_status_code().unwrap(), "Active");

    config_manager
        .set_config_value(config_keys::EQUIPMENT_STATUS_APPROVED, "A")
        .unwrap();
    assert_eq!(config_manager.approved_status_code().unwrap(), "A");

    config_manager
        .set_config_value(config_keys::RENTAL_AGREEMENT_STATUS_ACTIVE, "  ")
        .unwrap();
    assert!(config_manager.active_agreement_status_code().is_err());
}
