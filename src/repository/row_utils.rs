// ==========================================
// 种禽产蛋预测系统 - 行映射工具
// ==========================================
// 职责: 文本列 → 领域类型的转换，统一时间格式
// 约定: 单行转换失败 = 数据质量问题，列表查询中跳过该行
// ==========================================

use crate::domain::types::Product;
use chrono::NaiveDateTime;
use rusqlite::types::Type;
use tracing::warn;

/// 时间列统一格式
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn format_datetime(ts: &NaiveDateTime) -> String {
    ts.format(DATETIME_FORMAT).to_string()
}

pub fn parse_datetime(col: usize, raw: &str) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, DATETIME_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(col, Type::Text, Box::new(e)))
}

pub fn parse_product(col: usize, raw: &str) -> rusqlite::Result<Product> {
    Product::from_str(raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            col,
            Type::Text,
            format!("未知产品: {}", raw).into(),
        )
    })
}

/// 收集查询结果: 列转换失败的行告警后跳过，其余错误向上传递
pub fn collect_skipping_bad_rows<T, I>(table: &str, rows: I) -> rusqlite::Result<Vec<T>>
where
    I: Iterator<Item = rusqlite::Result<T>>,
{
    let mut out = Vec::new();
    for row in rows {
        match row {
            Ok(v) => out.push(v),
            Err(rusqlite::Error::FromSqlConversionFailure(col, _, e)) => {
                warn!(table, col, error = %e, "行数据格式错误，跳过");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(out)
}
