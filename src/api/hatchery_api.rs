// ==========================================
// 种禽产蛋预测系统 - 孵化率与雏鸡需求 API
// ==========================================
// 职责: 孵化率维护、需求客户维护、周需求登记
// ==========================================

use std::sync::Arc;

use tracing::{info, instrument};

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::{parse_product, validate_calendar};
use crate::domain::hatch::{DemandClient, HatchRate, PurchaseHatchRate};
use crate::domain::types::{SexCategory, YearWeek};
use crate::repository::demand_repo::DemandRepository;
use crate::repository::hatch_rate_repo::HatchRateRepository;

/// 孵化与需求API
pub struct HatcheryApi {
    hatch_rate_repo: Arc<HatchRateRepository>,
    demand_repo: Arc<DemandRepository>,
}

impl HatcheryApi {
    pub fn new(hatch_rate_repo: Arc<HatchRateRepository>, demand_repo: Arc<DemandRepository>) -> Self {
        Self {
            hatch_rate_repo,
            demand_repo,
        }
    }

    // ===== 孵化率 =====

    pub fn list_hatch_rates(&self) -> ApiResult<Vec<HatchRate>> {
        Ok(self.hatch_rate_repo.list_rates()?)
    }

    pub fn list_purchase_hatch_rates(&self) -> ApiResult<Vec<PurchaseHatchRate>> {
        Ok(self.hatch_rate_repo.list_purchase_rates()?)
    }

    /// 设置自产蛋孵化率（周龄 24..=64，0..=100%）
    pub fn set_hatch_rate(&self, age_week: i32, product: &str, rate_pct: f64) -> ApiResult<()> {
        let product = parse_product(product)?;
        self.hatch_rate_repo.upsert_rate(&HatchRate {
            age_week,
            product,
            rate_pct,
        })?;
        Ok(())
    }

    pub fn set_purchase_hatch_rate(&self, product: &str, rate_pct: f64) -> ApiResult<()> {
        let product = parse_product(product)?;
        self.hatch_rate_repo
            .upsert_purchase_rate(&PurchaseHatchRate { product, rate_pct })?;
        Ok(())
    }

    /// 表为空时写入默认孵化率
    pub fn seed_default_rates(&self) -> ApiResult<usize> {
        Ok(self.hatch_rate_repo.seed_defaults()?)
    }

    // ===== 需求客户 =====

    #[instrument(skip(self))]
    pub fn add_client(&self, product: &str, name: &str, sex_category: &str) -> ApiResult<DemandClient> {
        let product = parse_product(product)?;
        if name.trim().is_empty() {
            return Err(ApiError::InvalidInput("客户名不能为空".to_string()));
        }
        let sex_category = SexCategory::from_str(sex_category)
            .ok_or_else(|| ApiError::InvalidInput(format!("未知性别类别: {}", sex_category)))?;

        let client = self
            .demand_repo
            .insert_client(product, name.trim(), sex_category)?;
        info!(client_id = client.client_id, "需求客户已添加");
        Ok(client)
    }

    pub fn list_clients(&self, product: &str) -> ApiResult<Vec<DemandClient>> {
        let product = parse_product(product)?;
        Ok(self.demand_repo.list_active_clients(product)?)
    }

    /// 停用客户（历史需求不再计入）
    pub fn deactivate_client(&self, client_id: i64) -> ApiResult<()> {
        if !self.demand_repo.deactivate_client(client_id)? {
            return Err(ApiError::NotFound(format!("客户(id={})不存在或已停用", client_id)));
        }
        Ok(())
    }

    /// 登记某客户某出雏周的需求量
    pub fn set_request(&self, calendar: YearWeek, client_id: i64, quantity: i64) -> ApiResult<()> {
        validate_calendar("出雏周", calendar)?;
        if quantity < 0 {
            return Err(ApiError::InvalidInput(format!("需求量不能为负: {}", quantity)));
        }
        self.demand_repo.upsert_request(calendar, client_id, quantity)?;
        Ok(())
    }
}
