// ==========================================
// 种禽产蛋预测系统 - 雏鸡客户需求仓储
// ==========================================
// demand_client: 客户（按产品，带性别类别，软删除）
// demand_request: (年, 周, 客户) → 需求量
// ==========================================

use crate::db::SharedConnection;
use crate::domain::hatch::{ChickDemand, ClientRequest, DemandClient};
use crate::domain::types::{Product, SexCategory, YearWeek};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_utils::{collect_skipping_bad_rows, parse_product};
use rusqlite::types::Type;
use rusqlite::{params, Connection};

pub struct DemandRepository {
    conn: SharedConnection,
}

impl DemandRepository {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ===== 客户 =====

    pub fn insert_client(
        &self,
        product: Product,
        name: &str,
        sex_category: SexCategory,
    ) -> RepositoryResult<DemandClient> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO demand_client (product, name, sex_category, active) VALUES (?1, ?2, ?3, 1)",
            params![product.to_db_str(), name, sex_category.to_db_str()],
        )?;

        Ok(DemandClient {
            client_id: conn.last_insert_rowid(),
            product,
            name: name.to_string(),
            sex_category,
            active: true,
        })
    }

    pub fn list_active_clients(&self, product: Product) -> RepositoryResult<Vec<DemandClient>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT client_id, product, name, sex_category, active
               FROM demand_client
               WHERE product = ?1 AND active = 1
               ORDER BY client_id"#,
        )?;
        let rows = stmt.query_map(params![product.to_db_str()], |row| {
            Ok(DemandClient {
                client_id: row.get(0)?,
                product: parse_product(1, &row.get::<_, String>(1)?)?,
                name: row.get(2)?,
                sex_category: parse_sex(3, &row.get::<_, String>(3)?)?,
                active: row.get(4)?,
            })
        })?;
        Ok(collect_skipping_bad_rows("demand_client", rows)?)
    }

    /// 软删除客户（历史需求保留，但不再计入）
    pub fn deactivate_client(&self, client_id: i64) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE demand_client SET active = 0 WHERE client_id = ?1 AND active = 1",
            params![client_id],
        )?;
        Ok(affected > 0)
    }

    // ===== 需求量 =====

    pub fn upsert_request(
        &self,
        calendar: YearWeek,
        client_id: i64,
        quantity: i64,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO demand_request (year, week, client_id, quantity)
               VALUES (?1, ?2, ?3, ?4)
               ON CONFLICT(year, week, client_id) DO UPDATE SET quantity = ?4"#,
            params![calendar.year, calendar.week, client_id, quantity],
        )?;
        Ok(())
    }

    /// 某产品某周的需求（仅在用客户，忽略 0 需求）
    pub fn find_demand(&self, calendar: YearWeek, product: Product) -> RepositoryResult<ChickDemand> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT c.client_id, c.name, c.sex_category, r.quantity
               FROM demand_request r
               JOIN demand_client c ON c.client_id = r.client_id
               WHERE r.year = ?1 AND r.week = ?2 AND c.product = ?3
                 AND c.active = 1 AND r.quantity > 0
               ORDER BY c.client_id"#,
        )?;
        let rows = stmt.query_map(
            params![calendar.year, calendar.week, product.to_db_str()],
            |row| {
                Ok(ClientRequest {
                    client_id: row.get(0)?,
                    client_name: row.get(1)?,
                    sex_category: parse_sex(2, &row.get::<_, String>(2)?)?,
                    quantity: row.get(3)?,
                })
            },
        )?;

        Ok(ChickDemand {
            calendar,
            product,
            requests: collect_skipping_bad_rows("demand_request", rows)?,
        })
    }
}

fn parse_sex(col: usize, raw: &str) -> rusqlite::Result<SexCategory> {
    SexCategory::from_str(raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(col, Type::Text, format!("未知性别类别: {}", raw).into())
    })
}
