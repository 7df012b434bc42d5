// ==========================================
// 种禽产蛋预测系统 - 核心库
// ==========================================
// 职责: 批次产量投影、产量缓存、购销周汇总、出雏计划
// 技术栈: Rust + SQLite
// 分层: domain → repository → engine → api → app
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 预测参数
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{LedgerKind, Product, SexCategory, YearWeek};

// 领域实体
pub use domain::{
    Batch, BatchChanges, CacheState, HatchPlan, LayCurve, LedgerEntry, NewBatch,
    ProductionCacheEntry, ProductionFact, WeekPlan, WeeklySummary,
};

// 引擎
pub use engine::{
    HatchPlanner, LayCurveStore, LedgerAggregator, LifecycleWindow, ProductionCache,
    ProductionProjector,
};

// 存储
pub use repository::{ForecastStore, SqliteForecastStore};

// API
pub use api::{ApiError, ApiResult, BatchApi, CurveApi, ForecastApi, HatcheryApi, LedgerApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "种禽产蛋预测系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
