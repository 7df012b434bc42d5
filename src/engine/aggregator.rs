// ==========================================
// 种禽产蛋预测系统 - 购销汇总引擎
// ==========================================
// 输入: 产量缓存 + 外购台账 + 外售台账
// 输出: 按 (年, 周) 的净供给汇总
// 净供给 = 自产 + 外购 - 外售，不截断为 0
// ==========================================

use crate::domain::ledger::LedgerLine;
use crate::domain::summary::{ProductionLine, WeeklySummary};
use crate::domain::types::{LedgerKind, Product, YearWeek};
use crate::engine::production_cache::ProductionCache;
use crate::repository::error::RepositoryResult;
use crate::repository::store::ForecastStore;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, instrument};

// ==========================================
// SupplyLedger - 按周归集的供给明细
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct SupplyLedger {
    pub production: BTreeMap<YearWeek, Vec<ProductionLine>>,
    pub purchases: BTreeMap<YearWeek, Vec<LedgerLine>>,
    pub sales: BTreeMap<YearWeek, Vec<LedgerLine>>,
}

impl SupplyLedger {
    /// 三个来源的周并集（升序）
    pub fn weeks(&self) -> BTreeSet<YearWeek> {
        self.production
            .keys()
            .chain(self.purchases.keys())
            .chain(self.sales.keys())
            .copied()
            .collect()
    }

    pub fn production_at(&self, week: YearWeek) -> &[ProductionLine] {
        self.production.get(&week).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn purchases_at(&self, week: YearWeek) -> &[LedgerLine] {
        self.purchases.get(&week).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn sales_at(&self, week: YearWeek) -> &[LedgerLine] {
        self.sales.get(&week).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn summary_at(&self, week: YearWeek) -> WeeklySummary {
        let production_breakdown = self.production_at(week).to_vec();
        let purchase_breakdown = self.purchases_at(week).to_vec();
        let sale_breakdown = self.sales_at(week).to_vec();

        let production_total: i64 = production_breakdown.iter().map(|l| l.eggs).sum();
        let purchase_total: i64 = purchase_breakdown.iter().map(|l| l.quantity).sum();
        let sale_total: i64 = sale_breakdown.iter().map(|l| l.quantity).sum();

        WeeklySummary {
            calendar: week,
            production_total,
            purchase_total,
            sale_total,
            net_total: production_total + purchase_total - sale_total,
            production_breakdown,
            purchase_breakdown,
            sale_breakdown,
        }
    }
}

// ==========================================
// LedgerAggregator
// ==========================================
pub struct LedgerAggregator {
    store: Arc<dyn ForecastStore>,
    cache: Arc<ProductionCache>,
}

impl LedgerAggregator {
    pub fn new(store: Arc<dyn ForecastStore>, cache: Arc<ProductionCache>) -> Self {
        Self { store, cache }
    }

    /// 填充缓存后归集三类来源
    ///
    /// 只统计在产批次的有效条目；数量为 0 的台账行忽略
    #[instrument(skip(self))]
    pub fn collect(&self, product: Option<Product>) -> RepositoryResult<SupplyLedger> {
        self.cache.fill(product)?;

        let batches = self.store.list_active_batches(product)?;
        let labels: HashMap<i64, String> = batches
            .iter()
            .map(|b| (b.batch_id, b.source_label()))
            .collect();

        let mut ledger = SupplyLedger::default();

        for entry in self.cache.get_valid(product)? {
            let Some(label) = labels.get(&entry.key.batch_id) else {
                continue;
            };
            let Some(eggs) = entry.state.valid_eggs() else {
                continue;
            };
            ledger
                .production
                .entry(entry.key.calendar)
                .or_default()
                .push(ProductionLine {
                    batch_id: entry.key.batch_id,
                    source_label: label.clone(),
                    product: entry.product,
                    age_week: entry.age_week,
                    eggs,
                });
        }
        for lines in ledger.production.values_mut() {
            lines.sort_by(|a, b| {
                a.source_label
                    .cmp(&b.source_label)
                    .then(a.batch_id.cmp(&b.batch_id))
            });
        }

        ledger.purchases = self.collect_ledger(LedgerKind::Purchase, product)?;
        ledger.sales = self.collect_ledger(LedgerKind::Sale, product)?;

        debug!(
            production_weeks = ledger.production.len(),
            purchase_weeks = ledger.purchases.len(),
            sale_weeks = ledger.sales.len(),
            "供给明细归集完成"
        );
        Ok(ledger)
    }

    /// 周汇总列表（按年、周升序）
    #[instrument(skip(self))]
    pub fn weekly_summary(&self, product: Option<Product>) -> RepositoryResult<Vec<WeeklySummary>> {
        let ledger = self.collect(product)?;
        Ok(ledger
            .weeks()
            .into_iter()
            .map(|week| ledger.summary_at(week))
            .collect())
    }

    fn collect_ledger(
        &self,
        kind: LedgerKind,
        product: Option<Product>,
    ) -> RepositoryResult<BTreeMap<YearWeek, Vec<LedgerLine>>> {
        let mut by_week: BTreeMap<YearWeek, Vec<LedgerLine>> = BTreeMap::new();
        for entry in self.store.read_ledger(kind, product)? {
            if entry.quantity == 0 {
                continue;
            }
            by_week
                .entry(entry.calendar)
                .or_default()
                .push(LedgerLine::from(&entry));
        }
        Ok(by_week)
    }
}
