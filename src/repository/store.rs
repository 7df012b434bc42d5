// ==========================================
// 种禽产蛋预测系统 - 预测引擎存储协作接口
// ==========================================
// 职责: 定义引擎所需的最小存储契约（ForecastStore）
// 实现: SqliteForecastStore 聚合各表仓储，共用同一连接
// 约定: 引擎只依赖 &dyn ForecastStore，不拼 SQL
// ==========================================

use std::sync::Arc;

use crate::db::{open_shared_connection, SharedConnection};
use crate::domain::batch::Batch;
use crate::domain::curve::LayCurve;
use crate::domain::hatch::ChickDemand;
use crate::domain::ledger::LedgerEntry;
use crate::domain::production::{CacheWriteOutcome, ProductionCacheEntry, ProductionFact};
use crate::domain::types::{LedgerKind, Product, YearWeek};
use crate::repository::batch_repo::BatchRepository;
use crate::repository::curve_repo::CurveRepository;
use crate::repository::demand_repo::DemandRepository;
use crate::repository::error::RepositoryResult;
use crate::repository::hatch_rate_repo::HatchRateRepository;
use crate::repository::ledger_repo::LedgerRepository;
use crate::repository::production_cache_repo::ProductionCacheRepository;
use chrono::NaiveDateTime;

/// 缓存失效目标
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidationTarget {
    Batch(i64),
    /// 当前引用该曲线的全部批次
    Curve(String),
    All,
}

// ==========================================
// ForecastStore - 存储协作契约
// ==========================================
pub trait ForecastStore: Send + Sync {
    /// 在产批次，可按产品过滤
    fn list_active_batches(&self, product: Option<Product>) -> RepositoryResult<Vec<Batch>>;

    /// 曲线快照（无任何单元格时为 None）
    fn get_curve(&self, curve_name: &str) -> RepositoryResult<Option<LayCurve>>;

    /// 缓存条目（含失效条目），可按产品过滤
    fn read_cache(&self, product: Option<Product>) -> RepositoryResult<Vec<ProductionCacheEntry>>;

    /// 单批次缓存条目
    fn read_batch_cache(&self, batch_id: i64) -> RepositoryResult<Vec<ProductionCacheEntry>>;

    /// upsert 产量事实并置为有效
    ///
    /// 投影依据已过期的批次不写入，在结果中列出
    fn write_cache(
        &self,
        facts: &[ProductionFact],
        computed_at: NaiveDateTime,
    ) -> RepositoryResult<CacheWriteOutcome>;

    /// 置为失效（不删除）
    fn invalidate_cache(&self, target: &InvalidationTarget) -> RepositoryResult<usize>;

    /// 删除批次缓存
    fn delete_cache(&self, batch_id: i64) -> RepositoryResult<usize>;

    fn read_ledger(
        &self,
        kind: LedgerKind,
        product: Option<Product>,
    ) -> RepositoryResult<Vec<LedgerEntry>>;

    fn read_hatch_rate(&self, age_week: i32, product: Product) -> RepositoryResult<Option<f64>>;

    fn read_purchase_hatch_rate(&self, product: Product) -> RepositoryResult<Option<f64>>;

    fn read_demand(&self, calendar: YearWeek, product: Product) -> RepositoryResult<ChickDemand>;
}

// ==========================================
// SqliteForecastStore - SQLite 实现
// ==========================================
#[derive(Clone)]
pub struct SqliteForecastStore {
    conn: SharedConnection,
    /// 批次仓储
    pub batch_repo: Arc<BatchRepository>,
    /// 曲线仓储
    pub curve_repo: Arc<CurveRepository>,
    /// 产量缓存仓储
    pub cache_repo: Arc<ProductionCacheRepository>,
    /// 购销台账仓储
    pub ledger_repo: Arc<LedgerRepository>,
    /// 孵化率仓储
    pub hatch_rate_repo: Arc<HatchRateRepository>,
    /// 客户需求仓储
    pub demand_repo: Arc<DemandRepository>,
}

impl SqliteForecastStore {
    /// 打开数据库文件（自动建表）
    pub fn open(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_shared_connection(db_path)?;
        Ok(Self::from_connection(conn))
    }

    /// 从已有连接创建（调用方负责建表）
    pub fn from_connection(conn: SharedConnection) -> Self {
        Self {
            batch_repo: Arc::new(BatchRepository::new(conn.clone())),
            curve_repo: Arc::new(CurveRepository::new(conn.clone())),
            cache_repo: Arc::new(ProductionCacheRepository::new(conn.clone())),
            ledger_repo: Arc::new(LedgerRepository::new(conn.clone())),
            hatch_rate_repo: Arc::new(HatchRateRepository::new(conn.clone())),
            demand_repo: Arc::new(DemandRepository::new(conn.clone())),
            conn,
        }
    }

    /// 共享连接（配置管理器等复用）
    pub fn connection(&self) -> SharedConnection {
        self.conn.clone()
    }
}

impl ForecastStore for SqliteForecastStore {
    fn list_active_batches(&self, product: Option<Product>) -> RepositoryResult<Vec<Batch>> {
        self.batch_repo.list_active(product)
    }

    fn get_curve(&self, curve_name: &str) -> RepositoryResult<Option<LayCurve>> {
        let (cells, revision) = self.curve_repo.find_snapshot(curve_name)?;
        if cells.is_empty() {
            return Ok(None);
        }
        let mut curve = LayCurve::from_raw_cells(curve_name, &cells);
        curve.revision = revision;
        Ok(Some(curve))
    }

    fn read_cache(&self, product: Option<Product>) -> RepositoryResult<Vec<ProductionCacheEntry>> {
        self.cache_repo.find_all(product)
    }

    fn read_batch_cache(&self, batch_id: i64) -> RepositoryResult<Vec<ProductionCacheEntry>> {
        self.cache_repo.find_by_batch(batch_id)
    }

    fn write_cache(
        &self,
        facts: &[ProductionFact],
        computed_at: NaiveDateTime,
    ) -> RepositoryResult<CacheWriteOutcome> {
        self.cache_repo.upsert_facts(facts, computed_at)
    }

    fn invalidate_cache(&self, target: &InvalidationTarget) -> RepositoryResult<usize> {
        match target {
            InvalidationTarget::Batch(batch_id) => self.cache_repo.invalidate_by_batch(*batch_id),
            InvalidationTarget::Curve(curve_name) => {
                self.cache_repo.invalidate_by_curve(curve_name)
            }
            InvalidationTarget::All => self.cache_repo.invalidate_all(),
        }
    }

    fn delete_cache(&self, batch_id: i64) -> RepositoryResult<usize> {
        self.cache_repo.delete_by_batch(batch_id)
    }

    fn read_ledger(
        &self,
        kind: LedgerKind,
        product: Option<Product>,
    ) -> RepositoryResult<Vec<LedgerEntry>> {
        self.ledger_repo.find_by_kind(kind, product)
    }

    fn read_hatch_rate(&self, age_week: i32, product: Product) -> RepositoryResult<Option<f64>> {
        self.hatch_rate_repo.find_rate(age_week, product)
    }

    fn read_purchase_hatch_rate(&self, product: Product) -> RepositoryResult<Option<f64>> {
        self.hatch_rate_repo.find_purchase_rate(product)
    }

    fn read_demand(&self, calendar: YearWeek, product: Product) -> RepositoryResult<ChickDemand> {
        self.demand_repo.find_demand(calendar, product)
    }
}
