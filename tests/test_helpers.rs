// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 临时数据库初始化、分组/车主/设备/请求等测试数据写入
// ==========================================

#![allow(dead_code)]

use chrono::{DateTime, NaiveDate, Utc};
use equipment_rotation::config::ConfigManager;
use equipment_rotation::db::{init_schema, open_sqlite_connection};
use equipment_rotation::{logging, ScoringRuleSet};
use rusqlite::{params, Connection};
use std::error::Error;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

pub type SharedConn = Arc<Mutex<Connection>>;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().unwrap().to_string();

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 打开测试数据库连接
pub fn open_test_connection(db_path: &str) -> Result<SharedConn, Box<dyn Error>> {
    Ok(Arc::new(Mutex::new(open_sqlite_connection(db_path)?)))
}

/// 创建数据库并返回共享连接（已写入默认状态码）
pub fn setup() -> (NamedTempFile, SharedConn) {
    logging::init_test();
    let (temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = open_test_connection(&db_path).expect("Failed to open db");
    ConfigManager::from_connection(conn.clone())
        .seed_default_status_codes()
        .expect("Failed to seed status codes");
    (temp_file, conn)
}

/// 写入评分规则
pub fn save_rules(conn: &SharedConn, rules: &ScoringRuleSet) {
    ConfigManager::from_connection(conn.clone())
        .save_scoring_rules(rules)
        .expect("Failed to save rules");
}

/// 规则: 单分类 块容量 / 主块数
pub fn rules_with(block_size: i32, total_blocks: i32) -> ScoringRuleSet {
    let mut rules = ScoringRuleSet::default_rules();
    rules.set(
        equipment_rotation::EquipmentClass::Default,
        60,
        block_size,
        total_blocks,
    );
    rules.set(
        equipment_rotation::EquipmentClass::DumpTruck,
        60,
        block_size,
        total_blocks,
    );
    rules
}

// ==========================================
// 分组数据
// ==========================================

/// 写入地区、财年状态、区域、设备类型
///
/// 地区 1 / 区域 10 / 设备类型 20（非自卸车）
pub fn seed_group(conn: &SharedConn, next_fiscal_year: i32, rollover_end: Option<DateTime<Utc>>) {
    let c = conn.lock().unwrap();
    c.execute("INSERT INTO district (district_id, name) VALUES (1, 'North')", [])
        .unwrap();
    c.execute(
        r#"
        INSERT INTO district_status (district_id, current_fiscal_year, next_fiscal_year, rollover_end_date)
        VALUES (1, ?1, ?2, ?3)
        "#,
        params![next_fiscal_year - 1, next_fiscal_year, rollover_end],
    )
    .unwrap();
    c.execute(
        "INSERT INTO local_area (local_area_id, name, district_id) VALUES (10, 'Area 10', 1)",
        [],
    )
    .unwrap();
    c.execute(
        "INSERT INTO district_equipment_type (district_equipment_type_id, name, is_dump_truck) VALUES (20, 'Excavator', 0)",
        [],
    )
    .unwrap();
}

pub const AREA: i64 = 10;
pub const KIND: i64 = 20;

/// 写入车主
pub fn seed_owner(conn: &SharedConn, owner_id: i64, maintenance_contractor: bool) {
    conn.lock()
        .unwrap()
        .execute(
            "INSERT INTO owner (owner_id, organization_name, is_maintenance_contractor) VALUES (?1, ?2, ?3)",
            params![owner_id, format!("Owner {}", owner_id), maintenance_contractor],
        )
        .unwrap();
}

/// 写入 Approved 设备（years_of_service=0，资历分 = seniority）
pub fn seed_equipment(conn: &SharedConn, equipment_id: i64, owner_id: Option<i64>, seniority: f64) {
    seed_equipment_with_status(conn, equipment_id, owner_id, seniority, "Approved");
}

pub fn seed_equipment_with_status(
    conn: &SharedConn,
    equipment_id: i64,
    owner_id: Option<i64>,
    seniority: f64,
    status: &str,
) {
    conn.lock()
        .unwrap()
        .execute(
            r#"
            INSERT INTO equipment (
                equipment_id, local_area_id, district_equipment_type_id, owner_id,
                status_code, equipment_code, received_date,
                years_of_service, service_hours_last_year
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8)
            "#,
            params![
                equipment_id,
                AREA,
                KIND,
                owner_id,
                status,
                format!("EQ-{:04}", equipment_id),
                NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
                seniority * 3.0,
            ],
        )
        .unwrap();
}

// ==========================================
// 请求与名单
// ==========================================

/// 写入租用请求（不生成名单）
pub fn seed_request(conn: &SharedConn, rental_request_id: i64, status: &str, created_at: DateTime<Utc>) {
    conn.lock()
        .unwrap()
        .execute(
            r#"
            INSERT INTO rental_request (
                rental_request_id, local_area_id, district_equipment_type_id, status, equipment_count, created_at
            ) VALUES (?1, ?2, ?3, ?4, 1, ?5)
            "#,
            params![rental_request_id, AREA, KIND, status, created_at],
        )
        .unwrap();
}

/// 写入请求创建时间
pub fn set_request_created_at(conn: &SharedConn, rental_request_id: i64, created_at: DateTime<Utc>) {
    conn.lock()
        .unwrap()
        .execute(
            "UPDATE rental_request SET created_at = ?1 WHERE rental_request_id = ?2",
            params![created_at, rental_request_id],
        )
        .unwrap();
}

/// 写入在租合同
pub fn seed_agreement(
    conn: &SharedConn,
    rental_agreement_id: i64,
    equipment_id: i64,
    rental_request_id: Option<i64>,
    status: &str,
) {
    conn.lock()
        .unwrap()
        .execute(
            "INSERT INTO rental_agreement (rental_agreement_id, equipment_id, rental_request_id, status) VALUES (?1, ?2, ?3, ?4)",
            params![rental_agreement_id, equipment_id, rental_request_id, status],
        )
        .unwrap();
}

/// 查询名单条目ID
pub fn rotation_entry_id(conn: &SharedConn, rental_request_id: i64, equipment_id: i64) -> i64 {
    conn.lock()
        .unwrap()
        .query_row(
            "SELECT rotation_list_id FROM rental_request_rotation_list WHERE rental_request_id = ?1 AND equipment_id = ?2",
            params![rental_request_id, equipment_id],
            |row| row.get(0),
        )
        .unwrap()
}

/// 查询设备分块 (block_number, number_in_block)
pub fn block_of(conn: &SharedConn, equipment_id: i64) -> (Option<i32>, Option<i32>) {
    conn.lock()
        .unwrap()
        .query_row(
            "SELECT block_number, number_in_block FROM equipment WHERE equipment_id = ?1",
            params![equipment_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap()
}
