// ==========================================
// 种禽产蛋预测系统 - 预测 API
// ==========================================
// 职责: 对上层暴露产量投影、周汇总、出雏计划、缓存失效
// 参数: 省略的参数取 config_kv 中的当前配置
// 约定: 数据缺失返回空结果；只有调用参数错误才失败
// ==========================================

use std::sync::Arc;

use chrono::Local;
use tracing::{info, instrument, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::{
    parse_product, parse_product_filter, validate_horizon, validate_lag,
    validate_lifecycle_window, MAX_HORIZON_WEEKS, MAX_LAG_WEEKS,
};
use crate::config::{ConfigManager, ForecastConfig};
use crate::domain::hatch::HatchPlan;
use crate::domain::production::{ProductionCacheEntry, ProductionFact};
use crate::domain::summary::WeeklySummary;
use crate::domain::types::YearWeek;
use crate::engine::calendar::{shift, week_of};
use crate::engine::{
    FillReport, HatchPlanner, HatchRateDefaults, LayCurveStore, LedgerAggregator,
    LifecycleWindow, ProductionCache, ProductionProjector,
};
use crate::repository::batch_repo::BatchRepository;
use crate::repository::store::{ForecastStore, SqliteForecastStore};

/// 预测API
pub struct ForecastApi {
    store: Arc<dyn ForecastStore>,
    batch_repo: Arc<BatchRepository>,
    config_manager: Arc<ConfigManager>,
}

impl ForecastApi {
    pub fn new(
        store: Arc<dyn ForecastStore>,
        batch_repo: Arc<BatchRepository>,
        config_manager: Arc<ConfigManager>,
    ) -> Self {
        Self {
            store,
            batch_repo,
            config_manager,
        }
    }

    /// 由 SQLite 存储装配（配置管理器共用同一连接）
    pub fn from_store(store: &SqliteForecastStore) -> Self {
        Self::new(
            Arc::new(store.clone()),
            store.batch_repo.clone(),
            Arc::new(ConfigManager::from_connection(store.connection())),
        )
    }

    // ==========================================
    // 产量
    // ==========================================

    /// 单批次产量投影（不读写缓存）
    ///
    /// 窗口参数省略时取配置；显式给出的窗口必须 min <= max
    #[instrument(skip(self))]
    pub fn project_batch(
        &self,
        batch_id: i64,
        min_age: Option<i32>,
        max_age: Option<i32>,
    ) -> ApiResult<Vec<ProductionFact>> {
        let config = self.load_config()?;
        let window = LifecycleWindow::new(
            min_age.unwrap_or(config.lifecycle_min_age),
            max_age.unwrap_or(config.lifecycle_max_age),
        );
        if min_age.is_some() || max_age.is_some() {
            validate_lifecycle_window(window.min_age, window.max_age)?;
        }

        let batch = self
            .batch_repo
            .find_by_id(batch_id)?
            .ok_or_else(|| ApiError::NotFound(format!("批次(id={})不存在", batch_id)))?;

        let curves = LayCurveStore::snapshot_for(self.store.as_ref(), std::slice::from_ref(&batch))?;
        Ok(ProductionProjector::new().project(&batch, &curves, window))
    }

    /// 周汇总（自产 + 外购 - 外售），可按产品过滤
    #[instrument(skip(self))]
    pub fn weekly_summary(&self, product: Option<&str>) -> ApiResult<Vec<WeeklySummary>> {
        let product = parse_product_filter(product)?;
        let config = self.load_config()?;
        Ok(self.aggregator(&config).weekly_summary(product)?)
    }

    /// 预热缓存
    pub fn fill_cache(&self, product: Option<&str>) -> ApiResult<FillReport> {
        let product = parse_product_filter(product)?;
        let config = self.load_config()?;
        Ok(self.cache(&config).fill(product)?)
    }

    /// 单批次有效产量（按年、周排序），缺失时补算
    pub fn batch_production(&self, batch_id: i64) -> ApiResult<Vec<ProductionCacheEntry>> {
        let batch = self
            .batch_repo
            .find_by_id(batch_id)?
            .ok_or_else(|| ApiError::NotFound(format!("批次(id={})不存在", batch_id)))?;
        let config = self.load_config()?;
        Ok(self.cache(&config).batch_production(&batch)?)
    }

    // ==========================================
    // 出雏计划
    // ==========================================

    /// 滚动出雏计划：第一个出雏周 = 本周 + 孵化周数
    pub fn plan_hatch(
        &self,
        product: &str,
        lag_weeks: Option<i32>,
        horizon_weeks: Option<usize>,
    ) -> ApiResult<HatchPlan> {
        let current = week_of(Local::now().date_naive());
        self.plan_hatch_from(product, lag_weeks, horizon_weeks, current)
    }

    /// 以指定周为"本周"生成出雏计划
    #[instrument(skip(self))]
    pub fn plan_hatch_from(
        &self,
        product: &str,
        lag_weeks: Option<i32>,
        horizon_weeks: Option<usize>,
        current_week: YearWeek,
    ) -> ApiResult<HatchPlan> {
        let product = parse_product(product)?;
        let config = self.load_config()?;

        let lag = match lag_weeks {
            Some(lag) => {
                validate_lag(lag)?;
                lag
            }
            None => configured_lag(&config),
        };
        let horizon = match horizon_weeks {
            Some(horizon) => {
                validate_horizon(horizon)?;
                horizon
            }
            None => configured_horizon(&config),
        };

        let first_birth_week = shift(current_week, lag as i64);
        let planner = HatchPlanner::new(
            self.store.clone(),
            Arc::new(self.aggregator(&config)),
            HatchRateDefaults {
                hatch_rate_pct: config.default_hatch_rate_pct,
                purchase_hatch_rate_pct: config.default_purchase_hatch_rate_pct,
            },
        );
        Ok(planner.plan(product, lag, horizon, first_birth_week)?)
    }

    // ==========================================
    // 缓存失效
    // ==========================================

    pub fn invalidate(&self, batch_id: i64) -> ApiResult<usize> {
        let config = self.load_config()?;
        let count = self.cache(&config).invalidate_by_batch(batch_id)?;
        info!(batch_id, count, "批次缓存已失效");
        Ok(count)
    }

    pub fn invalidate_curve(&self, curve_name: &str) -> ApiResult<usize> {
        if curve_name.trim().is_empty() {
            return Err(ApiError::InvalidInput("曲线名不能为空".to_string()));
        }
        let config = self.load_config()?;
        let count = self.cache(&config).invalidate_by_curve(curve_name)?;
        info!(curve = curve_name, count, "曲线相关缓存已失效");
        Ok(count)
    }

    pub fn invalidate_all(&self) -> ApiResult<usize> {
        let config = self.load_config()?;
        let count = self.cache(&config).invalidate_all()?;
        info!(count, "全部缓存已失效");
        Ok(count)
    }

    // ==========================================
    // 装配
    // ==========================================

    fn load_config(&self) -> ApiResult<ForecastConfig> {
        Ok(self.config_manager.load_forecast_config()?)
    }

    fn cache(&self, config: &ForecastConfig) -> Arc<ProductionCache> {
        Arc::new(ProductionCache::new(
            self.store.clone(),
            LifecycleWindow::new(config.lifecycle_min_age, config.lifecycle_max_age),
        ))
    }

    fn aggregator(&self, config: &ForecastConfig) -> LedgerAggregator {
        LedgerAggregator::new(self.store.clone(), self.cache(config))
    }
}

/// 配置中的孵化周数，越界回落默认值
fn configured_lag(config: &ForecastConfig) -> i32 {
    let lag = config.incubation_lag_weeks;
    if (0..=MAX_LAG_WEEKS).contains(&lag) {
        return lag;
    }
    let fallback = ForecastConfig::default().incubation_lag_weeks;
    warn!(lag, fallback, "配置的孵化周数越界，使用默认值");
    fallback
}

/// 配置中的计划周数，越界回落默认值
fn configured_horizon(config: &ForecastConfig) -> usize {
    let horizon = config.hatch_horizon_weeks;
    if horizon > 0 && horizon as usize <= MAX_HORIZON_WEEKS {
        return horizon as usize;
    }
    let fallback = ForecastConfig::default().hatch_horizon_weeks as usize;
    warn!(horizon, fallback, "配置的计划周数越界，使用默认值");
    fallback
}
