// ==========================================
// 种禽产蛋预测系统 - 产量缓存策略
// ==========================================
// 职责: 避免对未变更批次重复投影；持久化由 ForecastStore 负责
// 填充协议: 批次缓存状态为 Stale/Absent（无任何有效条目）→ 重新投影并 upsert
// 幂等: 无中间变更时重复填充，存储内容完全一致
// 并发: 写入时比对投影依据，投影期间被改动的批次放弃写入，保持失效
// ==========================================

use crate::domain::batch::Batch;
use crate::domain::production::{
    CacheState, CacheWriteOutcome, ProductionCacheEntry, ProductionFact,
};
use crate::domain::types::Product;
use crate::engine::curve_store::LayCurveStore;
use crate::engine::projector::{LifecycleWindow, ProductionProjector};
use crate::repository::error::RepositoryResult;
use crate::repository::store::{ForecastStore, InvalidationTarget};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// 单次填充统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillReport {
    pub active_batches: usize,     // 参与检查的在产批次数
    pub recomputed_batches: usize, // 重新投影的批次数
    pub written_facts: usize,      // 写入的条目数
    pub superseded_batches: usize, // 投影期间被改动、放弃写入的批次数
}

// ==========================================
// ProductionCache
// ==========================================
pub struct ProductionCache {
    store: Arc<dyn ForecastStore>,
    projector: ProductionProjector,
    window: LifecycleWindow,
}

impl ProductionCache {
    pub fn new(store: Arc<dyn ForecastStore>, window: LifecycleWindow) -> Self {
        Self {
            store,
            projector: ProductionProjector::new(),
            window,
        }
    }

    pub fn window(&self) -> LifecycleWindow {
        self.window
    }

    /// 有效条目（可按产品过滤）
    pub fn get_valid(&self, product: Option<Product>) -> RepositoryResult<Vec<ProductionCacheEntry>> {
        let entries = self.store.read_cache(product)?;
        Ok(entries.into_iter().filter(|e| e.is_valid()).collect())
    }

    /// upsert 产量事实，统一打上本次计算时间
    pub fn upsert_many(&self, facts: &[ProductionFact]) -> RepositoryResult<CacheWriteOutcome> {
        if facts.is_empty() {
            return Ok(CacheWriteOutcome::default());
        }
        self.store.write_cache(facts, Utc::now().naive_utc())
    }

    pub fn invalidate_by_batch(&self, batch_id: i64) -> RepositoryResult<usize> {
        self.store.invalidate_cache(&InvalidationTarget::Batch(batch_id))
    }

    /// 失效当前引用该曲线的全部批次
    pub fn invalidate_by_curve(&self, curve_name: &str) -> RepositoryResult<usize> {
        self.store
            .invalidate_cache(&InvalidationTarget::Curve(curve_name.to_string()))
    }

    pub fn invalidate_all(&self) -> RepositoryResult<usize> {
        self.store.invalidate_cache(&InvalidationTarget::All)
    }

    /// 硬删除（批次删除时使用）
    pub fn delete_by_batch(&self, batch_id: i64) -> RepositoryResult<usize> {
        self.store.delete_cache(batch_id)
    }

    /// 填充缓存
    ///
    /// 对每个匹配过滤条件、缓存状态需要重算的在产批次重新投影
    #[instrument(skip(self))]
    pub fn fill(&self, product: Option<Product>) -> RepositoryResult<FillReport> {
        let entries = self.store.read_cache(product)?;
        let mut by_batch: HashMap<i64, Vec<&ProductionCacheEntry>> = HashMap::new();
        for entry in &entries {
            by_batch.entry(entry.key.batch_id).or_default().push(entry);
        }

        let active = self.store.list_active_batches(product)?;
        let pending: Vec<Batch> = active
            .iter()
            .filter(|b| {
                let batch_entries = by_batch.get(&b.batch_id).into_iter().flatten().copied();
                CacheState::for_batch(batch_entries).needs_recompute()
            })
            .cloned()
            .collect();

        let mut report = FillReport {
            active_batches: active.len(),
            ..FillReport::default()
        };

        if pending.is_empty() {
            debug!(active = active.len(), "缓存全部有效，无需填充");
            return Ok(report);
        }

        let outcome = self.recompute(&pending)?;
        report.recomputed_batches = pending.len();
        report.written_facts = outcome.written;
        report.superseded_batches = outcome.superseded.len();

        info!(
            active = report.active_batches,
            recomputed = report.recomputed_batches,
            written = report.written_facts,
            superseded = report.superseded_batches,
            "产量缓存填充完成"
        );
        Ok(report)
    }

    /// 单批次的有效条目，按 (年, 周) 排序；缺失时先补算
    #[instrument(skip(self))]
    pub fn batch_production(&self, batch: &Batch) -> RepositoryResult<Vec<ProductionCacheEntry>> {
        let mut entries = self.store.read_batch_cache(batch.batch_id)?;

        if batch.active && CacheState::for_batch(&entries).needs_recompute() {
            self.recompute(std::slice::from_ref(batch))?;
            entries = self.store.read_batch_cache(batch.batch_id)?;
        }

        entries.retain(|e| e.is_valid());
        entries.sort_by_key(|e| e.key);
        Ok(entries)
    }

    /// 投影并写入
    fn recompute(&self, batches: &[Batch]) -> RepositoryResult<CacheWriteOutcome> {
        let curves = LayCurveStore::snapshot_for(self.store.as_ref(), batches)?;

        let mut facts = Vec::new();
        for batch in batches {
            let batch_facts = self.projector.project(batch, &curves, self.window);
            debug!(
                batch_id = batch.batch_id,
                facts = batch_facts.len(),
                "批次重新投影"
            );
            facts.extend(batch_facts);
        }

        let outcome = self.upsert_many(&facts)?;
        if !outcome.superseded.is_empty() {
            warn!(
                batches = ?outcome.superseded,
                "投影期间批次/曲线/周期窗口已变更，放弃写入，等待下次填充"
            );
        }
        Ok(outcome)
    }
}
