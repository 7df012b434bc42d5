// ==========================================
// 种禽产蛋预测系统 - 周汇总输出
// ==========================================
// 净供给 = 自产 + 外购 - 外售（不截断为 0）
// 明细行保留，供界面提示框复现
// ==========================================

use crate::domain::ledger::LedgerLine;
use crate::domain::types::{Product, YearWeek};
use serde::{Deserialize, Serialize};

/// 自产明细行（按批次）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionLine {
    pub batch_id: i64,
    pub source_label: String,
    pub product: Product,
    pub age_week: i32,
    pub eggs: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklySummary {
    pub calendar: YearWeek,
    pub production_total: i64,
    pub purchase_total: i64,
    pub sale_total: i64,
    pub net_total: i64, // 可为负（超卖周）
    pub production_breakdown: Vec<ProductionLine>,
    pub purchase_breakdown: Vec<LedgerLine>,
    pub sale_breakdown: Vec<LedgerLine>,
}
