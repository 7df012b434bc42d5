// ==========================================
// 种禽产蛋预测系统 - 出雏计划引擎
// ==========================================
// 出雏周 B 的种蛋来源周 = B - 孵化周数
// 外售冲抵: 来源周自产按周龄升序先进先出扣减
// 雏鸡数: 剩余自产蛋 × 周龄孵化率 + 外购蛋 × 外购孵化率
//         逐项四舍五入，合计再取整到 100
// 需求冲抵: 公母各半；BOTH 客户需求两边各扣一半
// ==========================================

use crate::domain::hatch::{
    ChickDemand, ConversionDetail, HatchPlan, WeekPlan, DEFAULT_HATCH_RATE_PCT,
    DEFAULT_PURCHASE_HATCH_RATE_PCT,
};
use crate::domain::summary::ProductionLine;
use crate::domain::types::{Product, SexCategory, YearWeek};
use crate::engine::aggregator::{LedgerAggregator, SupplyLedger};
use crate::engine::calendar::{consecutive_weeks, shift};
use crate::engine::rounding::{round_half_away, round_to_nearest_100};
use crate::repository::error::RepositoryResult;
use crate::repository::store::ForecastStore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

/// 外购蛋换算明细的来源标签
const PURCHASE_SOURCE_LABEL: &str = "外购种蛋";

/// 孵化率表缺项时的默认值(%)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HatchRateDefaults {
    pub hatch_rate_pct: f64,
    pub purchase_hatch_rate_pct: f64,
}

impl Default for HatchRateDefaults {
    fn default() -> Self {
        Self {
            hatch_rate_pct: DEFAULT_HATCH_RATE_PCT,
            purchase_hatch_rate_pct: DEFAULT_PURCHASE_HATCH_RATE_PCT,
        }
    }
}

/// 外售冲抵后的单批次剩余蛋量
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocatedLine {
    pub line: ProductionLine,
    pub remaining_eggs: i64,
}

/// 外售按周龄升序冲抵自产
///
/// 返回 (冲抵后的明细, 超出自产的外售量)
pub fn allocate_sales(lines: &[ProductionLine], sale_total: i64) -> (Vec<AllocatedLine>, i64) {
    let mut ordered: Vec<ProductionLine> = lines.to_vec();
    ordered.sort_by(|a, b| {
        a.age_week
            .cmp(&b.age_week)
            .then(a.batch_id.cmp(&b.batch_id))
    });

    let mut unsatisfied = sale_total.max(0);
    let allocated = ordered
        .into_iter()
        .map(|line| {
            let taken = unsatisfied.min(line.eggs.max(0));
            unsatisfied -= taken;
            AllocatedLine {
                remaining_eggs: line.eggs - taken,
                line,
            }
        })
        .collect();

    (allocated, unsatisfied)
}

/// 客户需求按性别归集，返回 (公雏需求, 母雏需求)
///
/// BOTH 客户: 公雏 q/2，母雏 q - q/2，合计不丢数
pub fn split_demand(demand: &ChickDemand) -> (i64, i64) {
    demand
        .requests
        .iter()
        .fold((0, 0), |(male, female), r| match r.sex_category {
            SexCategory::Male => (male + r.quantity, female),
            SexCategory::Female => (male, female + r.quantity),
            SexCategory::Both => {
                let half = r.quantity / 2;
                (male + half, female + (r.quantity - half))
            }
        })
}

// ==========================================
// HatchPlanner
// ==========================================
pub struct HatchPlanner {
    store: Arc<dyn ForecastStore>,
    aggregator: Arc<LedgerAggregator>,
    defaults: HatchRateDefaults,
}

impl HatchPlanner {
    pub fn new(
        store: Arc<dyn ForecastStore>,
        aggregator: Arc<LedgerAggregator>,
        defaults: HatchRateDefaults,
    ) -> Self {
        Self {
            store,
            aggregator,
            defaults,
        }
    }

    /// 生成滚动出雏计划
    ///
    /// # 参数
    /// - `lag_weeks`: 孵化周数（来源周 = 出雏周 - lag）
    /// - `horizon_weeks`: 计划周数
    /// - `first_birth_week`: 第一个出雏周
    #[instrument(skip(self))]
    pub fn plan(
        &self,
        product: Product,
        lag_weeks: i32,
        horizon_weeks: usize,
        first_birth_week: YearWeek,
    ) -> RepositoryResult<HatchPlan> {
        let supply = self.aggregator.collect(Some(product))?;
        let mut rates = RateLookup::new(self.store.as_ref(), product, self.defaults);

        let mut weeks = Vec::with_capacity(horizon_weeks);
        for birth_week in consecutive_weeks(first_birth_week, horizon_weeks) {
            let source_week = shift(birth_week, -(lag_weeks as i64));
            let demand = self.store.read_demand(birth_week, product)?;
            weeks.push(self.plan_week(&supply, birth_week, source_week, demand, &mut rates)?);
        }

        let has_sales = weeks.iter().any(|w| w.eggs_sold > 0);
        let has_purchases = weeks.iter().any(|w| w.eggs_purchased > 0);

        debug!(
            product = product.to_db_str(),
            weeks = weeks.len(),
            has_sales,
            has_purchases,
            "出雏计划生成完成"
        );

        Ok(HatchPlan {
            product,
            lag_weeks,
            has_sales,
            has_purchases,
            weeks,
        })
    }

    fn plan_week(
        &self,
        supply: &SupplyLedger,
        birth_week: YearWeek,
        source_week: YearWeek,
        demand: ChickDemand,
        rates: &mut RateLookup<'_>,
    ) -> RepositoryResult<WeekPlan> {
        let production = supply.production_at(source_week);
        let purchases = supply.purchases_at(source_week);

        let eggs_produced: i64 = production.iter().map(|l| l.eggs).sum();
        let eggs_purchased: i64 = purchases.iter().map(|l| l.quantity).sum();
        let eggs_sold: i64 = supply.sales_at(source_week).iter().map(|l| l.quantity).sum();

        // ===== 外售冲抵 + 孵化率换算 =====
        let (allocated, unallocated_sale) = allocate_sales(production, eggs_sold);

        let mut conversion_details = Vec::new();
        for item in allocated.iter().filter(|a| a.remaining_eggs > 0) {
            let rate_pct = rates.hatch_rate(item.line.age_week)?;
            conversion_details.push(ConversionDetail {
                source: item.line.source_label.clone(),
                eggs: item.remaining_eggs,
                age_week: Some(item.line.age_week),
                rate_pct,
                animals: round_half_away(item.remaining_eggs as f64 * rate_pct / 100.0),
            });
        }

        if eggs_purchased > 0 {
            let rate_pct = rates.purchase_rate()?;
            conversion_details.push(ConversionDetail {
                source: PURCHASE_SOURCE_LABEL.to_string(),
                eggs: eggs_purchased,
                age_week: None,
                rate_pct,
                animals: round_half_away(eggs_purchased as f64 * rate_pct / 100.0),
            });
        }

        let converted: i64 = conversion_details.iter().map(|d| d.animals).sum();
        let animals_possible = round_to_nearest_100(converted as f64);

        // ===== 需求冲抵 =====
        let male_available = animals_possible / 2;
        let female_available = animals_possible - male_available;
        let (male_requested, female_requested) = split_demand(&demand);

        Ok(WeekPlan {
            birth_week,
            source_week,
            eggs_produced,
            eggs_purchased,
            eggs_sold,
            net_eggs: eggs_produced + eggs_purchased - eggs_sold,
            unallocated_sale,
            animals_possible,
            male_available,
            female_available,
            male_requested,
            female_requested,
            male_surplus: male_available - male_requested,
            female_surplus: female_available - female_requested,
            total_surplus: animals_possible - demand.total_quantity(),
            conversion_details,
            production_details: production.to_vec(),
            purchase_details: purchases.to_vec(),
            demand,
        })
    }
}

/// 单次计划内的孵化率查询缓存
struct RateLookup<'a> {
    store: &'a dyn ForecastStore,
    product: Product,
    defaults: HatchRateDefaults,
    by_age: HashMap<i32, f64>,
    purchase: Option<f64>,
}

impl<'a> RateLookup<'a> {
    fn new(store: &'a dyn ForecastStore, product: Product, defaults: HatchRateDefaults) -> Self {
        Self {
            store,
            product,
            defaults,
            by_age: HashMap::new(),
            purchase: None,
        }
    }

    fn hatch_rate(&mut self, age_week: i32) -> RepositoryResult<f64> {
        if let Some(rate) = self.by_age.get(&age_week) {
            return Ok(*rate);
        }
        let rate = self
            .store
            .read_hatch_rate(age_week, self.product)?
            .unwrap_or(self.defaults.hatch_rate_pct);
        self.by_age.insert(age_week, rate);
        Ok(rate)
    }

    fn purchase_rate(&mut self) -> RepositoryResult<f64> {
        if let Some(rate) = self.purchase {
            return Ok(rate);
        }
        let rate = self
            .store
            .read_purchase_hatch_rate(self.product)?
            .unwrap_or(self.defaults.purchase_hatch_rate_pct);
        self.purchase = Some(rate);
        Ok(rate)
    }
}
