// ==========================================
// 种禽产蛋预测系统 - 引擎层
// ==========================================
// 职责: 实现预测业务规则，不拼 SQL
// 依赖: 只通过 ForecastStore 访问存储
// 链路: 批次变更 → 缓存失效 → 汇总时补算 → 出雏计划
// ==========================================

pub mod aggregator;
pub mod calendar;
pub mod curve_store;
pub mod hatch_planner;
pub mod production_cache;
pub mod projector;
pub mod rounding;

// 重导出核心引擎
pub use aggregator::{LedgerAggregator, SupplyLedger};
pub use curve_store::LayCurveStore;
pub use hatch_planner::{allocate_sales, split_demand, HatchPlanner, HatchRateDefaults};
pub use production_cache::{FillReport, ProductionCache};
pub use projector::{LifecycleWindow, ProductionProjector};
pub use rounding::{round_half_away, round_to_nearest_100};
