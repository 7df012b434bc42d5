// ==========================================
// 种禽产蛋预测系统 - 种蛋购销台账仓储
// ==========================================
// 唯一键: (kind, year, week, counterparty, product)
// ==========================================

use crate::db::SharedConnection;
use crate::domain::ledger::LedgerEntry;
use crate::domain::types::{LedgerKind, Product, YearWeek};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_utils::{collect_skipping_bad_rows, parse_product};
use rusqlite::{params, Connection};

const UPSERT_SQL: &str = r#"
    INSERT INTO ledger_entry (kind, year, week, counterparty, product, quantity)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
    ON CONFLICT(kind, year, week, counterparty, product) DO UPDATE SET quantity = ?6
"#;

pub struct LedgerRepository {
    conn: SharedConnection,
}

impl LedgerRepository {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 写入/覆盖单条台账
    pub fn upsert(&self, entry: &LedgerEntry) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            UPSERT_SQL,
            params![
                entry.kind.to_db_str(),
                entry.calendar.year,
                entry.calendar.week,
                entry.counterparty,
                entry.product.to_db_str(),
                entry.quantity,
            ],
        )?;
        Ok(())
    }

    /// 批量写入（单事务）
    pub fn upsert_many(&self, entries: &[LedgerEntry]) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let mut count = 0;
        for entry in entries {
            count += tx.execute(
                UPSERT_SQL,
                params![
                    entry.kind.to_db_str(),
                    entry.calendar.year,
                    entry.calendar.week,
                    entry.counterparty,
                    entry.product.to_db_str(),
                    entry.quantity,
                ],
            )?;
        }

        tx.commit()?;
        Ok(count)
    }

    /// 按类型读取台账，可按产品过滤
    pub fn find_by_kind(
        &self,
        kind: LedgerKind,
        product: Option<Product>,
    ) -> RepositoryResult<Vec<LedgerEntry>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT year, week, counterparty, product, quantity
               FROM ledger_entry
               WHERE kind = ?1 AND (?2 IS NULL OR product = ?2)
               ORDER BY year, week, counterparty"#,
        )?;
        let rows = stmt.query_map(
            params![kind.to_db_str(), product.map(|p| p.to_db_str())],
            |row| {
                Ok(LedgerEntry {
                    calendar: YearWeek {
                        year: row.get(0)?,
                        week: row.get(1)?,
                    },
                    kind,
                    counterparty: row.get(2)?,
                    product: parse_product(3, &row.get::<_, String>(3)?)?,
                    quantity: row.get(4)?,
                })
            },
        )?;
        Ok(collect_skipping_bad_rows("ledger_entry", rows)?)
    }
}
