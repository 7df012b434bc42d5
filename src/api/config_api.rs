// ==========================================
// 种禽产蛋预测系统 - 配置管理 API
// ==========================================
// 职责: 预测参数查询与更新
// 一致性: 产蛋周期窗口变更会改变投影结果，写入与失效全部缓存同事务
// ==========================================

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{info, instrument};

use crate::api::error::{ApiError, ApiResult};
use crate::config::{config_keys, ConfigManager, ForecastConfig};

/// 可写配置键及其取值类型
const INTEGER_KEYS: [&str; 4] = [
    config_keys::LIFECYCLE_MIN_AGE_WEEK,
    config_keys::LIFECYCLE_MAX_AGE_WEEK,
    config_keys::INCUBATION_LAG_WEEKS,
    config_keys::HATCH_HORIZON_WEEKS,
];
const PERCENT_KEYS: [&str; 2] = [
    config_keys::DEFAULT_HATCH_RATE_PCT,
    config_keys::DEFAULT_PURCHASE_HATCH_RATE_PCT,
];

/// 配置管理API
pub struct ConfigApi {
    config_manager: Arc<ConfigManager>,
}

impl ConfigApi {
    pub fn new(config_manager: Arc<ConfigManager>) -> Self {
        Self { config_manager }
    }

    /// global 配置快照（只含已写入的键）
    pub fn list_configs(&self) -> ApiResult<BTreeMap<String, String>> {
        Ok(self.config_manager.get_config_snapshot()?)
    }

    /// 生效中的预测参数（缺省值已填充）
    pub fn get_forecast_config(&self) -> ApiResult<ForecastConfig> {
        Ok(self.config_manager.load_forecast_config()?)
    }

    /// 更新配置
    ///
    /// # 返回
    /// - Ok(usize): 因窗口变更被失效的缓存条目数
    #[instrument(skip(self))]
    pub fn update_config(&self, key: &str, value: &str) -> ApiResult<usize> {
        let value = value.trim();

        if INTEGER_KEYS.contains(&key) {
            value
                .parse::<i32>()
                .map_err(|_| ApiError::InvalidInput(format!("配置{}必须为整数: {}", key, value)))?;
        } else if PERCENT_KEYS.contains(&key) {
            let pct = value
                .parse::<f64>()
                .map_err(|_| ApiError::InvalidInput(format!("配置{}必须为数字: {}", key, value)))?;
            if !(0.0..=100.0).contains(&pct) {
                return Err(ApiError::InvalidInput(format!(
                    "配置{}必须在0-100之间: {}",
                    key, value
                )));
            }
        } else {
            return Err(ApiError::InvalidInput(format!("未知配置项: {}", key)));
        }

        let invalidated = if key == config_keys::LIFECYCLE_MIN_AGE_WEEK
            || key == config_keys::LIFECYCLE_MAX_AGE_WEEK
        {
            self.config_manager
                .set_global_value_invalidating_cache(key, value)?
        } else {
            self.config_manager.set_global_value(key, value)?;
            0
        };

        info!(key, value, invalidated, "配置已更新");
        Ok(invalidated)
    }
}
