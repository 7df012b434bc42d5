// ==========================================
// 种禽产蛋预测系统 - 产量缓存仓储
// ==========================================
// 唯一键: (year, week, batch_id)
// 写入: upsert，重复填充安全（无丢失更新）
// 写入校验: 投影依据（批次版本/曲线修订号/周期窗口）与库中当前值一致才置有效
// 失效: valid = 0 保留旧值；删除仅在批次删除时发生
// ==========================================

use crate::config::config_manager::read_lifecycle_window;
use crate::db::SharedConnection;
use crate::domain::production::{
    CacheKey, CacheState, CacheWriteOutcome, ProductionCacheEntry, ProductionFact,
    ProjectionBasis,
};
use crate::domain::types::{Product, YearWeek};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_utils::{
    collect_skipping_bad_rows, format_datetime, parse_datetime, parse_product,
};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;

const CACHE_COLUMNS: &str = "year, week, batch_id, product, age_week, eggs, valid, computed_at";

pub struct ProductionCacheRepository {
    conn: SharedConnection,
}

impl ProductionCacheRepository {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取缓存（含失效条目），可按产品过滤
    pub fn find_all(&self, product: Option<Product>) -> RepositoryResult<Vec<ProductionCacheEntry>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"SELECT {} FROM production_cache
               WHERE (?1 IS NULL OR product = ?1)
               ORDER BY year, week, batch_id"#,
            CACHE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![product.map(|p| p.to_db_str())], Self::map_row)?;
        Ok(collect_skipping_bad_rows("production_cache", rows)?)
    }

    /// 读取单批次的缓存
    pub fn find_by_batch(&self, batch_id: i64) -> RepositoryResult<Vec<ProductionCacheEntry>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM production_cache WHERE batch_id = ?1 ORDER BY year, week",
            CACHE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![batch_id], Self::map_row)?;
        Ok(collect_skipping_bad_rows("production_cache", rows)?)
    }

    /// 批量 upsert 产量事实，置为有效
    ///
    /// 同一事务内逐批次比对投影依据: 批次已删除、版本或曲线修订号变化、
    /// 周期窗口配置变化时整批跳过，其条目保持失效，等待下次填充
    ///
    /// # 返回
    /// - Ok(CacheWriteOutcome): 写入条数 + 被跳过的批次
    pub fn upsert_facts(
        &self,
        facts: &[ProductionFact],
        computed_at: NaiveDateTime,
    ) -> RepositoryResult<CacheWriteOutcome> {
        let mut outcome = CacheWriteOutcome::default();
        if facts.is_empty() {
            return Ok(outcome);
        }

        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        let ts = format_datetime(&computed_at);
        let window = read_lifecycle_window(&tx)?;

        let mut checked: HashMap<(i64, ProjectionBasis), bool> = HashMap::new();
        {
            let mut stmt = tx.prepare(
                r#"INSERT INTO production_cache (
                       year, week, batch_id, product, age_week, eggs, valid, computed_at
                   ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7)
                   ON CONFLICT(year, week, batch_id) DO UPDATE SET
                       product = excluded.product,
                       age_week = excluded.age_week,
                       eggs = excluded.eggs,
                       valid = 1,
                       computed_at = excluded.computed_at"#,
            )?;
            for fact in facts {
                let current = match checked.get(&(fact.batch_id, fact.basis)) {
                    Some(current) => *current,
                    None => {
                        let current = basis_is_current(&tx, fact.batch_id, &fact.basis, window)?;
                        if !current && !outcome.superseded.contains(&fact.batch_id) {
                            outcome.superseded.push(fact.batch_id);
                        }
                        checked.insert((fact.batch_id, fact.basis), current);
                        current
                    }
                };
                if !current {
                    continue;
                }

                outcome.written += stmt.execute(params![
                    fact.calendar.year,
                    fact.calendar.week,
                    fact.batch_id,
                    fact.product.to_db_str(),
                    fact.age_week,
                    fact.eggs,
                    ts,
                ])?;
            }
        }

        tx.commit()?;
        Ok(outcome)
    }

    /// 将批次缓存置为失效
    pub fn invalidate_by_batch(&self, batch_id: i64) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        Ok(invalidate_batch_rows(&conn, batch_id)?)
    }

    /// 将引用某曲线的所有批次缓存置为失效（批次集合在同一语句内确定）
    pub fn invalidate_by_curve(&self, curve_name: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        Ok(invalidate_curve_rows(&conn, curve_name)?)
    }

    /// 全部失效
    pub fn invalidate_all(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        Ok(invalidate_all_rows(&conn)?)
    }

    /// 删除批次缓存
    pub fn delete_by_batch(&self, batch_id: i64) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        Ok(delete_batch_rows(&conn, batch_id)?)
    }

    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<ProductionCacheEntry> {
        let eggs: i64 = row.get(5)?;
        let valid: bool = row.get(6)?;
        let state = if valid {
            CacheState::Valid { eggs }
        } else {
            CacheState::Stale {
                last_known_eggs: eggs,
            }
        };

        Ok(ProductionCacheEntry {
            key: CacheKey {
                calendar: YearWeek {
                    year: row.get(0)?,
                    week: row.get(1)?,
                },
                batch_id: row.get(2)?,
            },
            product: parse_product(3, &row.get::<_, String>(3)?)?,
            age_week: row.get(4)?,
            state,
            computed_at: parse_datetime(7, &row.get::<_, String>(7)?)?,
        })
    }
}

// ==========================================
// 缓存行维护语句
// ==========================================
// 供其他仓储在自身事务内调用（传入 &Transaction 即可）

pub(crate) fn invalidate_batch_rows(conn: &Connection, batch_id: i64) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE production_cache SET valid = 0 WHERE batch_id = ?1",
        params![batch_id],
    )
}

pub(crate) fn invalidate_curve_rows(conn: &Connection, curve_name: &str) -> rusqlite::Result<usize> {
    conn.execute(
        r#"UPDATE production_cache SET valid = 0
           WHERE batch_id IN (SELECT batch_id FROM batch WHERE curve_name = ?1)"#,
        params![curve_name],
    )
}

pub(crate) fn invalidate_all_rows(conn: &Connection) -> rusqlite::Result<usize> {
    conn.execute("UPDATE production_cache SET valid = 0", [])
}

pub(crate) fn delete_batch_rows(conn: &Connection, batch_id: i64) -> rusqlite::Result<usize> {
    conn.execute(
        "DELETE FROM production_cache WHERE batch_id = ?1",
        params![batch_id],
    )
}

/// 投影依据是否仍与库中一致（批次存在、版本与曲线修订号未变、窗口未变）
fn basis_is_current(
    conn: &Connection,
    batch_id: i64,
    basis: &ProjectionBasis,
    window: (i32, i32),
) -> rusqlite::Result<bool> {
    if (basis.min_age, basis.max_age) != window {
        return Ok(false);
    }

    let current: Option<(i64, i64)> = conn
        .query_row(
            r#"SELECT b.version, COALESCE(r.revision, 0)
               FROM batch b
               LEFT JOIN lay_curve_revision r ON r.curve_name = b.curve_name
               WHERE b.batch_id = ?1"#,
            params![batch_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    Ok(current == Some((basis.batch_version, basis.curve_revision)))
}
