// ==========================================
// 种禽产蛋预测系统 - 孵化率/客户需求/出雏计划
// ==========================================

use crate::domain::ledger::LedgerLine;
use crate::domain::summary::ProductionLine;
use crate::domain::types::{Product, SexCategory, YearWeek};
use serde::{Deserialize, Serialize};

/// 孵化率表的周龄范围
pub const HATCH_RATE_MIN_AGE: i32 = 24;
pub const HATCH_RATE_MAX_AGE: i32 = 64;

/// 自产蛋默认孵化率(%)
pub const DEFAULT_HATCH_RATE_PCT: f64 = 82.0;

/// 外购蛋默认孵化率(%)
pub const DEFAULT_PURCHASE_HATCH_RATE_PCT: f64 = 84.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HatchRate {
    pub age_week: i32,
    pub product: Product,
    pub rate_pct: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PurchaseHatchRate {
    pub product: Product,
    pub rate_pct: f64,
}

// ==========================================
// 客户需求
// ==========================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemandClient {
    pub client_id: i64,
    pub product: Product,
    pub name: String,
    pub sex_category: SexCategory,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientRequest {
    pub client_id: i64,
    pub client_name: String,
    pub sex_category: SexCategory,
    pub quantity: i64,
}

/// 某产品某周的客户需求汇总
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChickDemand {
    pub calendar: YearWeek,
    pub product: Product,
    pub requests: Vec<ClientRequest>,
}

impl ChickDemand {
    pub fn empty(calendar: YearWeek, product: Product) -> Self {
        Self {
            calendar,
            product,
            requests: Vec::new(),
        }
    }

    pub fn total_quantity(&self) -> i64 {
        self.requests.iter().map(|r| r.quantity).sum()
    }
}

// ==========================================
// 出雏计划输出
// ==========================================

/// 雏鸡数换算明细（提示框用）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionDetail {
    pub source: String,
    pub eggs: i64,
    pub age_week: Option<i32>, // 外购蛋无周龄
    pub rate_pct: f64,
    pub animals: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekPlan {
    pub birth_week: YearWeek,
    pub source_week: YearWeek,

    // ===== 种蛋 =====
    pub eggs_produced: i64,
    pub eggs_purchased: i64,
    pub eggs_sold: i64,
    pub net_eggs: i64,
    pub unallocated_sale: i64, // 超出自产部分的外售量

    // ===== 雏鸡 =====
    pub animals_possible: i64,
    pub male_available: i64,
    pub female_available: i64,
    pub male_requested: i64,
    pub female_requested: i64,
    pub male_surplus: i64,   // 可为负（缺口）
    pub female_surplus: i64, // 可为负（缺口）
    pub total_surplus: i64,

    // ===== 明细 =====
    pub conversion_details: Vec<ConversionDetail>,
    pub production_details: Vec<ProductionLine>,
    pub purchase_details: Vec<LedgerLine>,
    pub demand: ChickDemand,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HatchPlan {
    pub product: Product,
    pub lag_weeks: i32,
    pub has_sales: bool,
    pub has_purchases: bool,
    pub weeks: Vec<WeekPlan>,
}
