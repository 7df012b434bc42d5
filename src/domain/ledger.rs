// ==========================================
// 种禽产蛋预测系统 - 种蛋购销台账
// ==========================================
// 唯一键: (类型, 年, 周, 往来单位, 产品)
// 台账无限累积，不做自动清理
// ==========================================

use crate::domain::types::{LedgerKind, Product, YearWeek};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub calendar: YearWeek,
    pub kind: LedgerKind,
    pub counterparty: String, // 往来单位
    pub product: Product,
    pub quantity: i64, // >= 0
}

/// 周汇总中的往来明细行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerLine {
    pub counterparty: String,
    pub product: Product,
    pub quantity: i64,
}

impl From<&LedgerEntry> for LedgerLine {
    fn from(entry: &LedgerEntry) -> Self {
        Self {
            counterparty: entry.counterparty.clone(),
            product: entry.product,
            quantity: entry.quantity,
        }
    }
}
