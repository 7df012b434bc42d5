// ==========================================
// 种禽产蛋预测系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod batch_repo;
pub mod curve_repo;
pub mod demand_repo;
pub mod error;
pub mod hatch_rate_repo;
pub mod ledger_repo;
pub mod production_cache_repo;
pub mod row_utils;
pub mod store;

// 重导出核心仓储
pub use batch_repo::BatchRepository;
pub use curve_repo::CurveRepository;
pub use demand_repo::DemandRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use hatch_rate_repo::HatchRateRepository;
pub use ledger_repo::LedgerRepository;
pub use production_cache_repo::ProductionCacheRepository;
pub use store::{ForecastStore, InvalidationTarget, SqliteForecastStore};
