// ==========================================
// 种禽产蛋预测系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// 约定: 缺失或无法解析的配置回落到默认值（告警）
// ==========================================

use crate::db::{open_shared_connection, SharedConnection};
use crate::domain::hatch::{DEFAULT_HATCH_RATE_PCT, DEFAULT_PURCHASE_HATCH_RATE_PCT};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::production_cache_repo::invalidate_all_rows;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::warn;

/// 全局作用域
const GLOBAL_SCOPE: &str = "global";

// ==========================================
// ForecastConfig - 预测参数快照
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// 产蛋周期起始周龄（含）
    pub lifecycle_min_age: i32,
    /// 产蛋周期结束周龄（含）
    pub lifecycle_max_age: i32,
    /// 产蛋周 → 出雏周 的孵化周数
    pub incubation_lag_weeks: i32,
    /// 出雏计划滚动周数
    pub hatch_horizon_weeks: i32,
    /// 孵化率表缺失时的默认值(%)
    pub default_hatch_rate_pct: f64,
    /// 外购蛋孵化率缺失时的默认值(%)
    pub default_purchase_hatch_rate_pct: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            lifecycle_min_age: 25,
            lifecycle_max_age: 64,
            incubation_lag_weeks: 3,
            hatch_horizon_weeks: 52,
            default_hatch_rate_pct: DEFAULT_HATCH_RATE_PCT,
            default_purchase_hatch_rate_pct: DEFAULT_PURCHASE_HATCH_RATE_PCT,
        }
    }
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: SharedConnection,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_shared_connection(db_path)?;
        Ok(Self { conn })
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: SharedConnection) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取 global scope 的配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        Ok(query_global_value(&conn, key)?)
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        upsert_global_value(&conn, key, value)?;
        Ok(())
    }

    /// 写入配置，并在同一事务内将全部产量缓存置为失效
    ///
    /// 用于改变投影口径的键（产蛋周期窗口）
    ///
    /// # 返回
    /// - Ok(usize): 被置为失效的缓存条目数
    pub fn set_global_value_invalidating_cache(
        &self,
        key: &str,
        value: &str,
    ) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        upsert_global_value(&tx, key, value)?;
        let invalidated = invalidate_all_rows(&tx)?;
        tx.commit()?;
        Ok(invalidated)
    }

    /// 获取所有 global 配置的快照
    pub fn get_config_snapshot(&self) -> RepositoryResult<BTreeMap<String, String>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = ?1 ORDER BY key")?;
        let rows = stmt.query_map(params![GLOBAL_SCOPE], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut snapshot = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            snapshot.insert(key, value);
        }
        Ok(snapshot)
    }

    /// 加载预测参数快照（同一次加锁内读取全部键）
    pub fn load_forecast_config(&self) -> RepositoryResult<ForecastConfig> {
        let conn = self.get_conn()?;
        let d = ForecastConfig::default();
        let (lifecycle_min_age, lifecycle_max_age) = read_lifecycle_window(&conn)?;
        Ok(ForecastConfig {
            lifecycle_min_age,
            lifecycle_max_age,
            incubation_lag_weeks: read_parsed_or_default(
                &conn,
                config_keys::INCUBATION_LAG_WEEKS,
                d.incubation_lag_weeks,
            )?,
            hatch_horizon_weeks: read_parsed_or_default(
                &conn,
                config_keys::HATCH_HORIZON_WEEKS,
                d.hatch_horizon_weeks,
            )?,
            default_hatch_rate_pct: read_parsed_or_default(
                &conn,
                config_keys::DEFAULT_HATCH_RATE_PCT,
                d.default_hatch_rate_pct,
            )?,
            default_purchase_hatch_rate_pct: read_parsed_or_default(
                &conn,
                config_keys::DEFAULT_PURCHASE_HATCH_RATE_PCT,
                d.default_purchase_hatch_rate_pct,
            )?,
        })
    }
}

fn query_global_value(conn: &Connection, key: &str) -> rusqlite::Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
        params![GLOBAL_SCOPE, key],
        |row| row.get::<_, String>(0),
    )
    .optional()
}

fn upsert_global_value(conn: &Connection, key: &str, value: &str) -> rusqlite::Result<usize> {
    conn.execute(
        r#"INSERT INTO config_kv (scope_id, key, value, updated_at)
           VALUES (?1, ?2, ?3, datetime('now'))
           ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3, updated_at = datetime('now')"#,
        params![GLOBAL_SCOPE, key, value],
    )
}

/// 读取并解析配置，失败回落默认值
fn read_parsed_or_default<T>(conn: &Connection, key: &str, default: T) -> rusqlite::Result<T>
where
    T: FromStr + std::fmt::Display + Copy,
{
    match query_global_value(conn, key)? {
        None => Ok(default),
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(v) => Ok(v),
            Err(_) => {
                warn!(key, value = %raw, default = %default, "配置值无法解析，使用默认值");
                Ok(default)
            }
        },
    }
}

/// 当前配置的产蛋周期窗口 (min, max)
///
/// 缓存写入事务内用它比对投影依据，回落规则与 load_forecast_config 一致
pub(crate) fn read_lifecycle_window(conn: &Connection) -> rusqlite::Result<(i32, i32)> {
    let d = ForecastConfig::default();
    Ok((
        read_parsed_or_default(conn, config_keys::LIFECYCLE_MIN_AGE_WEEK, d.lifecycle_min_age)?,
        read_parsed_or_default(conn, config_keys::LIFECYCLE_MAX_AGE_WEEK, d.lifecycle_max_age)?,
    ))
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 产蛋周期
    pub const LIFECYCLE_MIN_AGE_WEEK: &str = "lifecycle_min_age_week";
    pub const LIFECYCLE_MAX_AGE_WEEK: &str = "lifecycle_max_age_week";

    // 出雏计划
    pub const INCUBATION_LAG_WEEKS: &str = "incubation_lag_weeks";
    pub const HATCH_HORIZON_WEEKS: &str = "hatch_horizon_weeks";

    // 孵化率默认值
    pub const DEFAULT_HATCH_RATE_PCT: &str = "default_hatch_rate_pct";
    pub const DEFAULT_PURCHASE_HATCH_RATE_PCT: &str = "default_purchase_hatch_rate_pct";
}
