// ==========================================
// 种禽产蛋预测系统 - 批次管理 API
// ==========================================
// 职责: 批次增删改查；变更时的缓存失效由仓储在同一事务内完成
// 并发: 更新必须携带调用方看到的 version
// ==========================================

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::{
    parse_product_filter, validate_batch_changes, validate_new_batch,
};
use crate::domain::batch::{Batch, BatchChanges, NewBatch};
use crate::repository::batch_repo::BatchRepository;

/// 批次管理API
pub struct BatchApi {
    batch_repo: Arc<BatchRepository>,
}

impl BatchApi {
    pub fn new(batch_repo: Arc<BatchRepository>) -> Self {
        Self { batch_repo }
    }

    /// 新建批次（version = 1）
    #[instrument(skip(self, batch), fields(farm = %batch.farm, shed = %batch.shed))]
    pub fn create_batch(&self, batch: NewBatch) -> ApiResult<Batch> {
        validate_new_batch(&batch)?;
        let created = self.batch_repo.insert(&batch)?;
        info!(batch_id = created.batch_id, "批次已创建");
        Ok(created)
    }

    pub fn get_batch(&self, batch_id: i64) -> ApiResult<Batch> {
        self.batch_repo
            .find_by_id(batch_id)?
            .ok_or_else(|| ApiError::NotFound(format!("批次(id={})不存在", batch_id)))
    }

    /// 按现场查询码查找（只看开头的数字 ID）
    pub fn find_by_code(&self, code: &str) -> ApiResult<Batch> {
        let batch_id = Batch::id_from_code(code)
            .ok_or_else(|| ApiError::InvalidInput(format!("无效的批次查询码: {}", code)))?;
        self.get_batch(batch_id)
    }

    /// 批次列表
    ///
    /// - `include_inactive = false` 时仅返回在产批次，可按产品过滤
    pub fn list_batches(&self, product: Option<&str>, include_inactive: bool) -> ApiResult<Vec<Batch>> {
        let product = parse_product_filter(product)?;
        if include_inactive {
            let all = self.batch_repo.list_all()?;
            return Ok(all
                .into_iter()
                .filter(|b| product.map_or(true, |p| b.product == p))
                .collect());
        }
        Ok(self.batch_repo.list_active(product)?)
    }

    /// 更新批次
    ///
    /// # 错误
    /// - `ApiError::OptimisticLockFailure`: expected_version 已过期，库中记录不变
    /// - `ApiError::NotFound`: 批次不存在
    #[instrument(skip(self, changes))]
    pub fn update_batch(
        &self,
        batch_id: i64,
        changes: BatchChanges,
        expected_version: i64,
    ) -> ApiResult<Batch> {
        validate_batch_changes(&changes)?;

        match self.batch_repo.update(batch_id, &changes, expected_version) {
            Ok(updated) => {
                info!(batch_id, version = updated.version, "批次已更新，缓存已失效");
                Ok(updated)
            }
            Err(err) => {
                let err = ApiError::from(err);
                if err.is_conflict() {
                    warn!(batch_id, expected_version, "批次更新版本冲突");
                }
                Err(err)
            }
        }
    }

    /// 删除批次（连同缓存）
    #[instrument(skip(self))]
    pub fn delete_batch(&self, batch_id: i64) -> ApiResult<()> {
        if !self.batch_repo.delete(batch_id)? {
            return Err(ApiError::NotFound(format!("批次(id={})不存在", batch_id)));
        }
        info!(batch_id, "批次已删除");
        Ok(())
    }
}
