// ==========================================
// 种禽产蛋预测系统 - 批次数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 并发控制: version 乐观锁，版本不符返回 OptimisticLockFailure，不覆盖
// 缓存一致性: 更新/删除与缓存失效在同一事务内完成
// ==========================================

use crate::db::SharedConnection;
use crate::domain::batch::{Batch, BatchChanges, NewBatch};
use crate::domain::types::{Product, YearWeek};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::production_cache_repo::{delete_batch_rows, invalidate_batch_rows};
use crate::repository::row_utils::{
    collect_skipping_bad_rows, format_datetime, parse_datetime, parse_product,
};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

const BATCH_COLUMNS: &str = r#"
    batch_id, farm, shed, breed, curve_name, product, headcount,
    start_year, start_week, end_year, end_week, active, version, updated_at
"#;

// ==========================================
// BatchRepository - 批次仓储
// ==========================================
pub struct BatchRepository {
    conn: SharedConnection,
}

impl BatchRepository {
    /// 从已有连接创建仓储实例
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 新建批次（version 从 1 开始）
    pub fn insert(&self, batch: &NewBatch) -> RepositoryResult<Batch> {
        let conn = self.get_conn()?;
        let now = format_datetime(&Utc::now().naive_utc());

        conn.execute(
            r#"INSERT INTO batch (
                farm, shed, breed, curve_name, product, headcount,
                start_year, start_week, end_year, end_week, active, version, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 1, ?12)"#,
            params![
                batch.farm,
                batch.shed,
                batch.breed,
                batch.curve_name,
                batch.product.to_db_str(),
                batch.headcount,
                batch.start_year,
                batch.start_week,
                batch.end_cutoff.map(|c| c.year),
                batch.end_cutoff.map(|c| c.week),
                batch.active,
                now,
            ],
        )?;

        let batch_id = conn.last_insert_rowid();
        Self::find_in(&conn, batch_id)?.ok_or_else(|| RepositoryError::NotFound {
            entity: "Batch".to_string(),
            id: batch_id.to_string(),
        })
    }

    /// 按 ID 查询
    pub fn find_by_id(&self, batch_id: i64) -> RepositoryResult<Option<Batch>> {
        let conn = self.get_conn()?;
        Self::find_in(&conn, batch_id)
    }

    fn find_in(conn: &Connection, batch_id: i64) -> RepositoryResult<Option<Batch>> {
        let sql = format!("SELECT {} FROM batch WHERE batch_id = ?1", BATCH_COLUMNS);
        let batch = conn
            .query_row(&sql, params![batch_id], Self::map_row)
            .optional()?;
        Ok(batch)
    }

    /// 查询全部批次（按 ID 升序）
    pub fn list_all(&self) -> RepositoryResult<Vec<Batch>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM batch ORDER BY batch_id", BATCH_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], Self::map_row)?;
        Ok(collect_skipping_bad_rows("batch", rows)?)
    }

    /// 查询在产批次，可按产品过滤
    pub fn list_active(&self, product: Option<Product>) -> RepositoryResult<Vec<Batch>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM batch WHERE active = 1 AND (?1 IS NULL OR product = ?1) ORDER BY batch_id",
            BATCH_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![product.map(|p| p.to_db_str())], Self::map_row)?;
        Ok(collect_skipping_bad_rows("batch", rows)?)
    }

    /// 更新批次 (带乐观锁检查)
    ///
    /// # 并发控制
    /// - expected_version 与库中不一致: `OptimisticLockFailure`，记录不变
    /// - 成功: version + 1，并在同一事务内将该批次缓存置为失效
    ///
    /// # 错误
    /// - `RepositoryError::NotFound`: batch_id 不存在
    pub fn update(
        &self,
        batch_id: i64,
        changes: &BatchChanges,
        expected_version: i64,
    ) -> RepositoryResult<Batch> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let current = Self::find_in(&tx, batch_id)?.ok_or_else(|| RepositoryError::NotFound {
            entity: "Batch".to_string(),
            id: batch_id.to_string(),
        })?;

        if current.version != expected_version {
            return Err(RepositoryError::OptimisticLockFailure {
                batch_id,
                expected: expected_version,
                actual: current.version,
            });
        }

        // 空变更: 版本校验通过即返回，不递增
        if changes.is_empty() {
            return Ok(current);
        }

        let next = changes.apply_to(&current);
        let now = format_datetime(&Utc::now().naive_utc());

        let rows_affected = tx.execute(
            r#"UPDATE batch
               SET farm = ?1, shed = ?2, breed = ?3, curve_name = ?4, product = ?5,
                   headcount = ?6, start_year = ?7, start_week = ?8,
                   end_year = ?9, end_week = ?10, active = ?11,
                   version = version + 1, updated_at = ?12
               WHERE batch_id = ?13 AND version = ?14"#,
            params![
                next.farm,
                next.shed,
                next.breed,
                next.curve_name,
                next.product.to_db_str(),
                next.headcount,
                next.start_year,
                next.start_week,
                next.end_cutoff.map(|c| c.year),
                next.end_cutoff.map(|c| c.week),
                next.active,
                now,
                batch_id,
                expected_version,
            ],
        )?;

        if rows_affected == 0 {
            // 事务内已校验过版本，走到这里说明行在校验后消失
            return Err(RepositoryError::DatabaseTransactionError(format!(
                "批次更新未生效: batch_id={}",
                batch_id
            )));
        }

        invalidate_batch_rows(&tx, batch_id)?;

        let updated = Self::find_in(&tx, batch_id)?.ok_or_else(|| RepositoryError::NotFound {
            entity: "Batch".to_string(),
            id: batch_id.to_string(),
        })?;
        tx.commit()?;

        Ok(updated)
    }

    /// 删除批次（同事务删除其全部缓存）
    ///
    /// # 返回
    /// - Ok(true): 已删除
    /// - Ok(false): 批次不存在
    pub fn delete(&self, batch_id: i64) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        delete_batch_rows(&tx, batch_id)?;
        let affected = tx.execute("DELETE FROM batch WHERE batch_id = ?1", params![batch_id])?;

        tx.commit()?;
        Ok(affected > 0)
    }

    /// 映射数据库行到 Batch 对象
    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<Batch> {
        let end_year: Option<i32> = row.get(9)?;
        let end_week: Option<i32> = row.get(10)?;
        let end_cutoff = match (end_year, end_week) {
            (Some(year), Some(week)) => Some(YearWeek { year, week }),
            _ => None,
        };

        Ok(Batch {
            batch_id: row.get(0)?,
            farm: row.get(1)?,
            shed: row.get(2)?,
            breed: row.get(3)?,
            curve_name: row.get(4)?,
            product: parse_product(5, &row.get::<_, String>(5)?)?,
            headcount: row.get(6)?,
            start_year: row.get(7)?,
            start_week: row.get(8)?,
            end_cutoff,
            active: row.get(11)?,
            version: row.get(12)?,
            updated_at: parse_datetime(13, &row.get::<_, String>(13)?)?,
        })
    }
}
