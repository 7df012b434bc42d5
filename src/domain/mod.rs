// ==========================================
// 种禽产蛋预测系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、值对象
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod batch;
pub mod curve;
pub mod hatch;
pub mod ledger;
pub mod production;
pub mod summary;
pub mod types;

// 重导出核心类型
pub use batch::{Batch, BatchChanges, NewBatch};
pub use curve::{LayCurve, LayCurvePoint, RawCurveCell};
pub use hatch::{
    ChickDemand, ClientRequest, ConversionDetail, DemandClient, HatchPlan, HatchRate,
    PurchaseHatchRate, WeekPlan,
};
pub use ledger::{LedgerEntry, LedgerLine};
pub use production::{
    CacheKey, CacheState, CacheWriteOutcome, ProductionCacheEntry, ProductionFact, ProjectionBasis,
};
pub use summary::{ProductionLine, WeeklySummary};
pub use types::{LedgerKind, Product, SexCategory, YearWeek, WEEKS_PER_YEAR};
