// ==========================================
// 种禽产蛋预测系统 - 种蛋购销台账 API
// ==========================================
// 职责: 外购/外售台账登记与查询
// 台账不影响产量缓存，汇总时直接读取
// ==========================================

use std::sync::Arc;

use tracing::{info, instrument};

use crate::api::error::ApiResult;
use crate::api::validator::{parse_product_filter, validate_ledger_entry};
use crate::domain::ledger::LedgerEntry;
use crate::domain::types::LedgerKind;
use crate::repository::ledger_repo::LedgerRepository;

/// 购销台账API
pub struct LedgerApi {
    ledger_repo: Arc<LedgerRepository>,
}

impl LedgerApi {
    pub fn new(ledger_repo: Arc<LedgerRepository>) -> Self {
        Self { ledger_repo }
    }

    /// 登记/覆盖单条台账
    pub fn record_entry(&self, entry: LedgerEntry) -> ApiResult<()> {
        validate_ledger_entry(&entry)?;
        self.ledger_repo.upsert(&entry)?;
        Ok(())
    }

    /// 批量登记（任一条校验失败则整体不写入）
    #[instrument(skip(self, entries), fields(count = entries.len()))]
    pub fn record_entries(&self, entries: &[LedgerEntry]) -> ApiResult<usize> {
        for entry in entries {
            validate_ledger_entry(entry)?;
        }
        let written = self.ledger_repo.upsert_many(entries)?;
        info!(written, "台账批量登记完成");
        Ok(written)
    }

    pub fn list_entries(&self, kind: LedgerKind, product: Option<&str>) -> ApiResult<Vec<LedgerEntry>> {
        let product = parse_product_filter(product)?;
        Ok(self.ledger_repo.find_by_kind(kind, product)?)
    }
}
