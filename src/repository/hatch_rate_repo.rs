// ==========================================
// 种禽产蛋预测系统 - 孵化率仓储
// ==========================================
// hatch_rate: (周龄 24..=64, 产品) → 孵化率(%)，默认 82.0
// purchase_hatch_rate: 产品 → 外购蛋孵化率(%)，默认 84.0
// ==========================================

use crate::db::SharedConnection;
use crate::domain::hatch::{
    HatchRate, PurchaseHatchRate, DEFAULT_HATCH_RATE_PCT, DEFAULT_PURCHASE_HATCH_RATE_PCT,
    HATCH_RATE_MAX_AGE, HATCH_RATE_MIN_AGE,
};
use crate::domain::types::Product;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_utils::{collect_skipping_bad_rows, parse_product};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

pub struct HatchRateRepository {
    conn: SharedConnection,
}

impl HatchRateRepository {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ===== 自产蛋孵化率 =====

    pub fn find_rate(&self, age_week: i32, product: Product) -> RepositoryResult<Option<f64>> {
        let conn = self.get_conn()?;
        let rate = conn
            .query_row(
                "SELECT rate_pct FROM hatch_rate WHERE age_week = ?1 AND product = ?2",
                params![age_week, product.to_db_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(rate)
    }

    pub fn upsert_rate(&self, rate: &HatchRate) -> RepositoryResult<()> {
        if !(HATCH_RATE_MIN_AGE..=HATCH_RATE_MAX_AGE).contains(&rate.age_week) {
            return Err(RepositoryError::FieldValueError {
                field: "age_week".to_string(),
                message: format!(
                    "周龄 {} 超出 [{}, {}]",
                    rate.age_week, HATCH_RATE_MIN_AGE, HATCH_RATE_MAX_AGE
                ),
            });
        }
        validate_pct(rate.rate_pct)?;

        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO hatch_rate (age_week, product, rate_pct) VALUES (?1, ?2, ?3)
               ON CONFLICT(age_week, product) DO UPDATE SET rate_pct = ?3"#,
            params![rate.age_week, rate.product.to_db_str(), rate.rate_pct],
        )?;
        Ok(())
    }

    pub fn list_rates(&self) -> RepositoryResult<Vec<HatchRate>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT age_week, product, rate_pct FROM hatch_rate ORDER BY age_week, product",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(HatchRate {
                age_week: row.get(0)?,
                product: parse_product(1, &row.get::<_, String>(1)?)?,
                rate_pct: row.get(2)?,
            })
        })?;
        Ok(collect_skipping_bad_rows("hatch_rate", rows)?)
    }

    // ===== 外购蛋孵化率 =====

    pub fn find_purchase_rate(&self, product: Product) -> RepositoryResult<Option<f64>> {
        let conn = self.get_conn()?;
        let rate = conn
            .query_row(
                "SELECT rate_pct FROM purchase_hatch_rate WHERE product = ?1",
                params![product.to_db_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(rate)
    }

    pub fn upsert_purchase_rate(&self, rate: &PurchaseHatchRate) -> RepositoryResult<()> {
        validate_pct(rate.rate_pct)?;

        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO purchase_hatch_rate (product, rate_pct) VALUES (?1, ?2)
               ON CONFLICT(product) DO UPDATE SET rate_pct = ?2"#,
            params![rate.product.to_db_str(), rate.rate_pct],
        )?;
        Ok(())
    }

    pub fn list_purchase_rates(&self) -> RepositoryResult<Vec<PurchaseHatchRate>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT product, rate_pct FROM purchase_hatch_rate ORDER BY product")?;
        let rows = stmt.query_map([], |row| {
            Ok(PurchaseHatchRate {
                product: parse_product(0, &row.get::<_, String>(0)?)?,
                rate_pct: row.get(1)?,
            })
        })?;
        Ok(collect_skipping_bad_rows("purchase_hatch_rate", rows)?)
    }

    // ===== 初始化默认值 =====

    /// 表为空时写入默认孵化率（每产品 × 周龄 24..=64 为 82.0，外购为 84.0）
    ///
    /// # 返回
    /// - Ok(usize): 写入条数（已有数据时为 0）
    pub fn seed_defaults(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        let mut seeded = 0;

        let has_rates: bool = tx
            .query_row("SELECT 1 FROM hatch_rate LIMIT 1", [], |_| Ok(true))
            .optional()?
            .unwrap_or(false);
        if !has_rates {
            for age in HATCH_RATE_MIN_AGE..=HATCH_RATE_MAX_AGE {
                for product in Product::ALL {
                    seeded += tx.execute(
                        "INSERT INTO hatch_rate (age_week, product, rate_pct) VALUES (?1, ?2, ?3)",
                        params![age, product.to_db_str(), DEFAULT_HATCH_RATE_PCT],
                    )?;
                }
            }
        }

        let has_purchase_rates: bool = tx
            .query_row("SELECT 1 FROM purchase_hatch_rate LIMIT 1", [], |_| Ok(true))
            .optional()?
            .unwrap_or(false);
        if !has_purchase_rates {
            for product in Product::ALL {
                seeded += tx.execute(
                    "INSERT INTO purchase_hatch_rate (product, rate_pct) VALUES (?1, ?2)",
                    params![product.to_db_str(), DEFAULT_PURCHASE_HATCH_RATE_PCT],
                )?;
            }
        }

        tx.commit()?;
        if seeded > 0 {
            info!(seeded, "已写入默认孵化率");
        }
        Ok(seeded)
    }
}

fn validate_pct(rate_pct: f64) -> RepositoryResult<()> {
    if rate_pct.is_finite() && (0.0..=100.0).contains(&rate_pct) {
        Ok(())
    } else {
        Err(RepositoryError::FieldValueError {
            field: "rate_pct".to_string(),
            message: format!("孵化率 {} 超出 [0, 100]", rate_pct),
        })
    }
}
