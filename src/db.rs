// ==========================================
// 设备轮换调度系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 集中维护建表语句（幂等）
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::path::PathBuf;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "EQUIPMENT_ROTATION_DB_PATH";

/// 默认数据库路径
///
/// 优先级: 环境变量 → 用户数据目录 → 当前目录
pub fn default_db_path() -> String {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./equipment_rotation.db");
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("equipment-rotation");
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("equipment_rotation.db");
        }
    }

    path.to_string_lossy().to_string()
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 初始化数据库 schema（幂等）
///
/// 表清单:
/// - config_kv: 配置键值（评分规则、状态码）
/// - district / district_status: 地区与财年滚动状态
/// - local_area / district_equipment_type / owner: 分组与车主
/// - equipment: 设备及其资历/分块结果
/// - rental_request / rental_request_rotation_list: 租用请求与轮换名单
/// - rental_agreement: 租赁合同（用于在租排除）
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS district (
            district_id INTEGER PRIMARY KEY,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS district_status (
            district_id INTEGER PRIMARY KEY REFERENCES district(district_id),
            current_fiscal_year INTEGER NOT NULL,
            next_fiscal_year INTEGER NOT NULL,
            rollover_end_date TEXT
        );

        CREATE TABLE IF NOT EXISTS local_area (
            local_area_id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            district_id INTEGER NOT NULL REFERENCES district(district_id)
        );

        CREATE TABLE IF NOT EXISTS district_equipment_type (
            district_equipment_type_id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            is_dump_truck INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS owner (
            owner_id INTEGER PRIMARY KEY,
            organization_name TEXT NOT NULL,
            is_maintenance_contractor INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS equipment (
            equipment_id INTEGER PRIMARY KEY,
            local_area_id INTEGER NOT NULL REFERENCES local_area(local_area_id),
            district_equipment_type_id INTEGER NOT NULL
                REFERENCES district_equipment_type(district_equipment_type_id),
            owner_id INTEGER REFERENCES owner(owner_id),
            status_code TEXT NOT NULL,
            equipment_code TEXT NOT NULL,
            received_date TEXT NOT NULL,
            years_of_service REAL NOT NULL DEFAULT 0,
            service_hours_current_year REAL,
            service_hours_last_year REAL,
            service_hours_two_years_ago REAL,
            service_hours_three_years_ago REAL,
            seniority REAL,
            block_number INTEGER,
            number_in_block INTEGER,
            seniority_effective_date TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_equipment_group
            ON equipment(local_area_id, district_equipment_type_id);

        CREATE TABLE IF NOT EXISTS rental_request (
            rental_request_id INTEGER PRIMARY KEY,
            local_area_id INTEGER REFERENCES local_area(local_area_id),
            district_equipment_type_id INTEGER
                REFERENCES district_equipment_type(district_equipment_type_id),
            status TEXT NOT NULL,
            equipment_count INTEGER NOT NULL DEFAULT 1,
            first_on_rotation_list_id INTEGER,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS rental_request_rotation_list (
            rotation_list_id INTEGER PRIMARY KEY AUTOINCREMENT,
            rental_request_id INTEGER NOT NULL
                REFERENCES rental_request(rental_request_id) ON DELETE CASCADE,
            equipment_id INTEGER NOT NULL REFERENCES equipment(equipment_id),
            block_number INTEGER NOT NULL,
            seniority REAL,
            sort_order INTEGER NOT NULL,
            was_asked INTEGER NOT NULL DEFAULT 0,
            offer_response TEXT,
            offer_refusal_reason TEXT,
            offer_response_note TEXT,
            offer_response_at TEXT,
            is_force_hire INTEGER NOT NULL DEFAULT 0,
            note TEXT,
            created_at TEXT NOT NULL,
            UNIQUE(rental_request_id, equipment_id),
            UNIQUE(rental_request_id, sort_order)
        );

        CREATE TABLE IF NOT EXISTS rental_agreement (
            rental_agreement_id INTEGER PRIMARY KEY,
            equipment_id INTEGER NOT NULL REFERENCES equipment(equipment_id),
            rental_request_id INTEGER REFERENCES rental_request(rental_request_id),
            status TEXT NOT NULL
        );
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;

    Ok(())
}
