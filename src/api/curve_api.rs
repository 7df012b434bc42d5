// ==========================================
// 种禽产蛋预测系统 - 产蛋率曲线 API
// ==========================================
// 职责: 曲线单元格编辑与查询
// 一致性: 单元格改写与缓存失效在仓储同一事务内完成
// ==========================================

use std::sync::Arc;

use tracing::{info, instrument};

use crate::api::error::{ApiError, ApiResult};
use crate::domain::curve::{parse_age_label, parse_percentage, LayCurve, RawCurveCell};
use crate::repository::curve_repo::CurveRepository;

/// 产蛋率曲线API
pub struct CurveApi {
    curve_repo: Arc<CurveRepository>,
}

impl CurveApi {
    pub fn new(curve_repo: Arc<CurveRepository>) -> Self {
        Self { curve_repo }
    }

    pub fn list_curve_names(&self) -> ApiResult<Vec<String>> {
        Ok(self.curve_repo.list_curve_names()?)
    }

    /// 读取解析后的曲线（坏行跳过）
    pub fn get_curve(&self, curve_name: &str) -> ApiResult<LayCurve> {
        let cells = self.curve_repo.find_cells(curve_name)?;
        if cells.is_empty() {
            return Err(ApiError::NotFound(format!("曲线{}不存在", curve_name)));
        }
        Ok(LayCurve::from_raw_cells(curve_name, &cells))
    }

    /// 改写单个单元格
    ///
    /// 空产蛋率表示清空该周龄；返回被失效的缓存条目数
    #[instrument(skip(self))]
    pub fn update_cell(&self, curve_name: &str, age_label: &str, rate_label: &str) -> ApiResult<usize> {
        let cell = Self::checked_cell(curve_name, age_label, rate_label)?;
        let invalidated = self.curve_repo.upsert_cell(&cell)?;
        info!(curve = curve_name, age = age_label, invalidated, "曲线单元格已更新");
        Ok(invalidated)
    }

    /// 导入整条曲线（单事务）
    #[instrument(skip(self, rows), fields(rows = rows.len()))]
    pub fn import_curve(&self, curve_name: &str, rows: &[(String, String)]) -> ApiResult<usize> {
        let cells = rows
            .iter()
            .map(|(age, rate)| Self::checked_cell(curve_name, age, rate))
            .collect::<ApiResult<Vec<_>>>()?;
        let invalidated = self.curve_repo.upsert_cells(&cells)?;
        info!(curve = curve_name, cells = cells.len(), invalidated, "曲线已导入");
        Ok(invalidated)
    }

    fn checked_cell(curve_name: &str, age_label: &str, rate_label: &str) -> ApiResult<RawCurveCell> {
        if curve_name.trim().is_empty() {
            return Err(ApiError::InvalidInput("曲线名不能为空".to_string()));
        }
        if parse_age_label(age_label).is_none() {
            return Err(ApiError::InvalidInput(format!("无效的周龄: {}", age_label)));
        }
        if !rate_label.trim().is_empty() && parse_percentage(rate_label).is_none() {
            return Err(ApiError::InvalidInput(format!("无效的产蛋率: {}", rate_label)));
        }
        Ok(RawCurveCell {
            curve_name: curve_name.trim().to_string(),
            age_label: age_label.trim().to_string(),
            rate_label: rate_label.trim().to_string(),
        })
    }
}
