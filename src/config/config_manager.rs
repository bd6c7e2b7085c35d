// ==========================================
// 设备轮换调度系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、写入
// 存储: config_kv 表 (key-value)
// ==========================================

use crate::config::error::{ConfigError, ConfigResult};
use crate::config::scoring_rules::ScoringRuleSet;
use crate::db::open_sqlite_connection;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

// ==========================================
// 配置键
// ==========================================
pub mod config_keys {
    /// 资历评分规则 (JSON)
    pub const SENIORITY_SCORING_RULES: &str = "seniority_scoring_rules";
    /// 视为 Approved 的设备状态码
    pub const EQUIPMENT_STATUS_APPROVED: &str = "equipment_status_approved";
    /// 视为在租的合同状态码
    pub const RENTAL_AGREEMENT_STATUS_ACTIVE: &str = "rental_agreement_status_active";
}

/// 首次初始化写入的 Approved 状态码
pub const DEFAULT_APPROVED_STATUS: &str = "Approved";
/// 首次初始化写入的在租合同状态码
pub const DEFAULT_ACTIVE_AGREEMENT_STATUS: &str = "Active";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> ConfigResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| ConfigError::Storage(format!("锁获取失败: {}", e)))
    }

    /// 从 config_kv 表读取配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.get_conn()?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        Ok(value)
    }

    /// 写入配置值（UPSERT）
    pub fn set_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.get_conn()?;

        conn.execute(
            "INSERT INTO config_kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;

        Ok(())
    }

    /// 读取必填配置值
    ///
    /// # 返回
    /// - Err(MissingKey): 未配置或为空值
    fn get_required_value(&self, key: &str) -> ConfigResult<String> {
        let value = self
            .get_config_value(key)?
            .ok_or_else(|| ConfigError::MissingKey(key.to_string()))?;
        non_empty(value, key)
    }

    // ===== 评分规则 =====

    /// 读取资历评分规则
    ///
    /// # 返回
    /// - Err(MissingKey): 未配置评分规则（不做默认兜底）
    pub fn load_scoring_rules(&self) -> ConfigResult<ScoringRuleSet> {
        let raw = self
            .get_config_value(config_keys::SENIORITY_SCORING_RULES)?
            .ok_or_else(|| {
                ConfigError::MissingKey(config_keys::SENIORITY_SCORING_RULES.to_string())
            })?;

        ScoringRuleSet::from_json(&raw)
    }

    /// 保存资历评分规则
    pub fn save_scoring_rules(&self, rules: &ScoringRuleSet) -> ConfigResult<()> {
        self.set_config_value(config_keys::SENIORITY_SCORING_RULES, &rules.to_json()?)
    }

    // ===== 状态码 =====

    /// Approved 设备状态码
    ///
    /// 未配置或为空值均为配置错误，不做默认兜底
    pub fn approved_status_code(&self) -> ConfigResult<String> {
        self.get_required_value(config_keys::EQUIPMENT_STATUS_APPROVED)
    }

    /// 在租合同状态码
    pub fn active_agreement_status_code(&self) -> ConfigResult<String> {
        self.get_required_value(config_keys::RENTAL_AGREEMENT_STATUS_ACTIVE)
    }

    /// 写入默认状态码（已配置的键保持不变）
    ///
    /// # 返回
    /// - 新写入的键数量
    pub fn seed_default_status_codes(&self) -> ConfigResult<usize> {
        let conn = self.get_conn()?;

        let mut seeded = 0;
        for (key, value) in [
            (config_keys::EQUIPMENT_STATUS_APPROVED, DEFAULT_APPROVED_STATUS),
            (config_keys::RENTAL_AGREEMENT_STATUS_ACTIVE, DEFAULT_ACTIVE_AGREEMENT_STATUS),
        ] {
            seeded += conn.execute(
                "INSERT OR IGNORE INTO config_kv (key, value) VALUES (?1, ?2)",
                params![key, value],
            )?;
        }

        Ok(seeded)
    }
}

fn non_empty(value: String, key: &str) -> ConfigResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::MissingKey(key.to_string()));
    }
    Ok(trimmed.to_string())
}
