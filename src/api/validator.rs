// ==========================================
// 种禽产蛋预测系统 - 调用参数校验
// ==========================================
// 职责: API 入口的参数校验，失败统一返回 ApiError::InvalidInput
// 引擎层假定输入已校验
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::batch::{BatchChanges, NewBatch};
use crate::domain::ledger::LedgerEntry;
use crate::domain::types::{Product, YearWeek, WEEKS_PER_YEAR};

/// 孵化周数上限
pub const MAX_LAG_WEEKS: i32 = 12;

/// 计划周数上限
pub const MAX_HORIZON_WEEKS: usize = 156;

/// 解析产品名（未知产品为参数错误）
pub fn parse_product(raw: &str) -> ApiResult<Product> {
    Product::from_str(raw).ok_or_else(|| ApiError::InvalidInput(format!("未知产品: {}", raw)))
}

/// 可选产品过滤；空串视为不过滤
pub fn parse_product_filter(raw: Option<&str>) -> ApiResult<Option<Product>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => parse_product(s).map(Some),
    }
}

pub fn validate_week(field: &str, week: i32) -> ApiResult<()> {
    if (1..=WEEKS_PER_YEAR).contains(&week) {
        Ok(())
    } else {
        Err(ApiError::InvalidInput(format!(
            "{}必须在1-{}之间: {}",
            field, WEEKS_PER_YEAR, week
        )))
    }
}

pub fn validate_calendar(field: &str, calendar: YearWeek) -> ApiResult<()> {
    validate_week(field, calendar.week)
}

pub fn validate_headcount(headcount: i64) -> ApiResult<()> {
    if headcount < 0 {
        return Err(ApiError::InvalidInput(format!("存栏数不能为负: {}", headcount)));
    }
    Ok(())
}

fn validate_not_blank(field: &str, value: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::InvalidInput(format!("{}不能为空", field)));
    }
    Ok(())
}

pub fn validate_lifecycle_window(min_age: i32, max_age: i32) -> ApiResult<()> {
    if min_age < 0 || min_age > max_age {
        return Err(ApiError::InvalidInput(format!(
            "产蛋周期窗口无效: [{}, {}]",
            min_age, max_age
        )));
    }
    Ok(())
}

pub fn validate_lag(lag_weeks: i32) -> ApiResult<()> {
    if !(0..=MAX_LAG_WEEKS).contains(&lag_weeks) {
        return Err(ApiError::InvalidInput(format!(
            "孵化周数必须在0-{}之间: {}",
            MAX_LAG_WEEKS, lag_weeks
        )));
    }
    Ok(())
}

pub fn validate_horizon(horizon_weeks: usize) -> ApiResult<()> {
    if horizon_weeks == 0 || horizon_weeks > MAX_HORIZON_WEEKS {
        return Err(ApiError::InvalidInput(format!(
            "计划周数必须在1-{}之间: {}",
            MAX_HORIZON_WEEKS, horizon_weeks
        )));
    }
    Ok(())
}

pub fn validate_new_batch(batch: &NewBatch) -> ApiResult<()> {
    validate_not_blank("养殖场", &batch.farm)?;
    validate_not_blank("鸡舍", &batch.shed)?;
    validate_headcount(batch.headcount)?;
    validate_week("起始周", batch.start_week)?;
    if let Some(cutoff) = batch.end_cutoff {
        validate_calendar("预计淘汰周", cutoff)?;
    }
    Ok(())
}

pub fn validate_batch_changes(changes: &BatchChanges) -> ApiResult<()> {
    if let Some(farm) = &changes.farm {
        validate_not_blank("养殖场", farm)?;
    }
    if let Some(shed) = &changes.shed {
        validate_not_blank("鸡舍", shed)?;
    }
    if let Some(headcount) = changes.headcount {
        validate_headcount(headcount)?;
    }
    if let Some(week) = changes.start_week {
        validate_week("起始周", week)?;
    }
    if let Some(Some(cutoff)) = changes.end_cutoff {
        validate_calendar("预计淘汰周", cutoff)?;
    }
    Ok(())
}

pub fn validate_ledger_entry(entry: &LedgerEntry) -> ApiResult<()> {
    validate_calendar("周", entry.calendar)?;
    validate_not_blank("往来单位", &entry.counterparty)?;
    if entry.quantity < 0 {
        return Err(ApiError::InvalidInput(format!(
            "数量不能为负: {}",
            entry.quantity
        )));
    }
    Ok(())
}
