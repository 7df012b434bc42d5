// ==========================================
// 种禽产蛋预测系统 - 产蛋率曲线仓储
// ==========================================
// 存储: lay_curve_cell 原始文本单元格 + lay_curve_revision 修订号
// 缓存一致性: 改写单元格、递增修订号、失效引用该曲线的批次缓存同事务
// ==========================================

use crate::db::SharedConnection;
use crate::domain::curve::RawCurveCell;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::production_cache_repo::invalidate_curve_rows;
use rusqlite::{params, Connection, OptionalExtension};

pub struct CurveRepository {
    conn: SharedConnection,
}

impl CurveRepository {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取某条曲线的全部单元格（未解析）
    pub fn find_cells(&self, curve_name: &str) -> RepositoryResult<Vec<RawCurveCell>> {
        let conn = self.get_conn()?;
        Ok(query_cells(&conn, curve_name)?)
    }

    /// 读取单元格及当前修订号（同一次加锁内读取，二者一致）
    ///
    /// 从未写入过的曲线修订号为 0
    pub fn find_snapshot(&self, curve_name: &str) -> RepositoryResult<(Vec<RawCurveCell>, i64)> {
        let conn = self.get_conn()?;
        let cells = query_cells(&conn, curve_name)?;
        let revision = conn
            .query_row(
                "SELECT revision FROM lay_curve_revision WHERE curve_name = ?1",
                params![curve_name],
                |row| row.get(0),
            )
            .optional()?
            .unwrap_or(0);
        Ok((cells, revision))
    }

    /// 曲线名列表
    pub fn list_curve_names(&self) -> RepositoryResult<Vec<String>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT DISTINCT curve_name FROM lay_curve_cell ORDER BY curve_name")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(names)
    }

    /// 写入/覆盖单元格，递增修订号，并失效引用该曲线的批次缓存
    ///
    /// # 返回
    /// - Ok(usize): 被置为失效的缓存条目数
    pub fn upsert_cell(&self, cell: &RawCurveCell) -> RepositoryResult<usize> {
        self.upsert_cells(std::slice::from_ref(cell))
    }

    /// 批量写入单元格（导入整条曲线），每条涉及的曲线修订号递增一次
    pub fn upsert_cells(&self, cells: &[RawCurveCell]) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let mut touched: Vec<&str> = Vec::new();
        for cell in cells {
            tx.execute(
                r#"INSERT INTO lay_curve_cell (curve_name, age_label, rate_label)
                   VALUES (?1, ?2, ?3)
                   ON CONFLICT(curve_name, age_label) DO UPDATE SET rate_label = ?3"#,
                params![cell.curve_name, cell.age_label, cell.rate_label],
            )?;
            if !touched.contains(&cell.curve_name.as_str()) {
                touched.push(cell.curve_name.as_str());
            }
        }

        let mut invalidated = 0;
        for curve_name in touched {
            tx.execute(
                r#"INSERT INTO lay_curve_revision (curve_name, revision) VALUES (?1, 1)
                   ON CONFLICT(curve_name) DO UPDATE SET revision = revision + 1"#,
                params![curve_name],
            )?;
            invalidated += invalidate_curve_rows(&tx, curve_name)?;
        }

        tx.commit()?;
        Ok(invalidated)
    }
}

fn query_cells(conn: &Connection, curve_name: &str) -> rusqlite::Result<Vec<RawCurveCell>> {
    let mut stmt = conn.prepare(
        r#"SELECT curve_name, age_label, rate_label
           FROM lay_curve_cell
           WHERE curve_name = ?1
           ORDER BY rowid"#,
    )?;
    let cells = stmt
        .query_map(params![curve_name], |row| {
            Ok(RawCurveCell {
                curve_name: row.get(0)?,
                age_label: row.get(1)?,
                rate_label: row.get(2)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(cells)
}
