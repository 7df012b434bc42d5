// ==========================================
// 种禽产蛋预测系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发填充缓存时的偶发 busy 错误
// - 提供幂等的建表入口（测试与报表工具共用）
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 2;

/// 共享连接句柄（所有仓储共用同一个连接）
pub type SharedConnection = Arc<Mutex<Connection>>;

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

/// 打开连接、建表，并包装为共享句柄
pub fn open_shared_connection(db_path: &str) -> rusqlite::Result<SharedConnection> {
    let conn = open_sqlite_connection(db_path)?;
    init_schema(&conn)?;
    Ok(Arc::new(Mutex::new(conn)))
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
/// 缓存表的唯一键为 (year, week, batch_id)，upsert 依赖该约束。
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS batch (
            batch_id INTEGER PRIMARY KEY AUTOINCREMENT,
            farm TEXT NOT NULL,
            shed TEXT NOT NULL,
            breed TEXT,
            curve_name TEXT,
            product TEXT NOT NULL,
            headcount INTEGER NOT NULL CHECK (headcount >= 0),
            start_year INTEGER NOT NULL,
            start_week INTEGER NOT NULL CHECK (start_week BETWEEN 1 AND 52),
            end_year INTEGER,
            end_week INTEGER,
            active INTEGER NOT NULL DEFAULT 1,
            version INTEGER NOT NULL DEFAULT 1,
            updated_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_batch_curve ON batch(curve_name);

        CREATE TABLE IF NOT EXISTS lay_curve_cell (
            curve_name TEXT NOT NULL,
            age_label TEXT NOT NULL,
            rate_label TEXT NOT NULL,
            PRIMARY KEY (curve_name, age_label)
        );

        CREATE TABLE IF NOT EXISTS lay_curve_revision (
            curve_name TEXT PRIMARY KEY,
            revision INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS production_cache (
            year INTEGER NOT NULL,
            week INTEGER NOT NULL,
            batch_id INTEGER NOT NULL,
            product TEXT NOT NULL,
            age_week INTEGER NOT NULL,
            eggs INTEGER NOT NULL,
            valid INTEGER NOT NULL DEFAULT 1,
            computed_at TEXT NOT NULL,
            PRIMARY KEY (year, week, batch_id)
        );
        CREATE INDEX IF NOT EXISTS idx_production_cache_batch ON production_cache(batch_id);
        CREATE INDEX IF NOT EXISTS idx_production_cache_product ON production_cache(product, valid);

        CREATE TABLE IF NOT EXISTS ledger_entry (
            kind TEXT NOT NULL CHECK (kind IN ('PURCHASE', 'SALE')),
            year INTEGER NOT NULL,
            week INTEGER NOT NULL,
            counterparty TEXT NOT NULL,
            product TEXT NOT NULL,
            quantity INTEGER NOT NULL CHECK (quantity >= 0),
            PRIMARY KEY (kind, year, week, counterparty, product)
        );

        CREATE TABLE IF NOT EXISTS hatch_rate (
            age_week INTEGER NOT NULL CHECK (age_week BETWEEN 24 AND 64),
            product TEXT NOT NULL,
            rate_pct REAL NOT NULL,
            PRIMARY KEY (age_week, product)
        );

        CREATE TABLE IF NOT EXISTS purchase_hatch_rate (
            product TEXT PRIMARY KEY,
            rate_pct REAL NOT NULL
        );

        CREATE TABLE IF NOT EXISTS demand_client (
            client_id INTEGER PRIMARY KEY AUTOINCREMENT,
            product TEXT NOT NULL,
            name TEXT NOT NULL,
            sex_category TEXT NOT NULL CHECK (sex_category IN ('MALE', 'FEMALE', 'BOTH')),
            active INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS demand_request (
            year INTEGER NOT NULL,
            week INTEGER NOT NULL,
            client_id INTEGER NOT NULL REFERENCES demand_client(client_id) ON DELETE CASCADE,
            quantity INTEGER NOT NULL CHECK (quantity >= 0),
            PRIMARY KEY (year, week, client_id)
        );
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();

        assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));
    }

    #[test]
    fn test_schema_version_absent_on_empty_db() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), None);
    }
}
