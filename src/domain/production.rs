// ==========================================
// 种禽产蛋预测系统 - 产量事实与缓存条目
// ==========================================
// ProductionFact: 投影器输出，携带投影依据
// ProductionCacheEntry: 缓存表中的 (年, 周, 批次) 产量
// 写入约束: 投影依据与库中当前值不符的事实不得写成有效
// ==========================================

use crate::domain::types::{Product, YearWeek};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// ProjectionBasis - 投影依据
// ==========================================
// 批次版本 + 曲线修订号 + 产蛋周期窗口
// 任一项在投影之后发生变化，该次投影结果即作废
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectionBasis {
    pub batch_version: i64,
    pub curve_revision: i64,
    pub min_age: i32,
    pub max_age: i32,
}

// ==========================================
// ProductionFact - 单批次单周产量
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionFact {
    pub calendar: YearWeek,
    pub batch_id: i64,
    pub product: Product,
    pub eggs: i64,
    pub source_label: String, // "养殖场 鸡舍"
    pub age_week: i32,        // 溯源用: 该周鸡龄
    pub basis: ProjectionBasis,
}

/// 缓存唯一键
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub calendar: YearWeek,
    pub batch_id: i64,
}

/// 一次缓存写入的结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheWriteOutcome {
    /// 写入条数
    pub written: usize,
    /// 投影依据已过期、整批放弃写入的批次
    pub superseded: Vec<i64>,
}

// ==========================================
// CacheState - 缓存状态
// ==========================================
// Valid: 可直接使用
// Stale: 批次/曲线/窗口变更后失效，保留最后一次的值用于诊断
// Absent: 无记录（批次删除或从未计算）
// 填充前置条件: Stale 或 Absent 时重算
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CacheState {
    Valid { eggs: i64 },
    Stale { last_known_eggs: i64 },
    Absent,
}

impl CacheState {
    /// 归并一个批次的全部条目
    ///
    /// - 有任一有效条目: Valid（有效产量合计）
    /// - 只有失效条目: Stale（最后已知产量合计）
    /// - 无条目: Absent
    pub fn for_batch<'a, I>(entries: I) -> CacheState
    where
        I: IntoIterator<Item = &'a ProductionCacheEntry>,
    {
        let mut valid: Option<i64> = None;
        let mut stale: Option<i64> = None;
        for entry in entries {
            match entry.state {
                CacheState::Valid { eggs } => *valid.get_or_insert(0) += eggs,
                CacheState::Stale { last_known_eggs } => {
                    *stale.get_or_insert(0) += last_known_eggs
                }
                CacheState::Absent => {}
            }
        }

        match (valid, stale) {
            (Some(eggs), _) => CacheState::Valid { eggs },
            (None, Some(last_known_eggs)) => CacheState::Stale { last_known_eggs },
            (None, None) => CacheState::Absent,
        }
    }

    pub fn needs_recompute(&self) -> bool {
        !matches!(self, CacheState::Valid { .. })
    }

    /// 仅 Valid 状态返回产量
    pub fn valid_eggs(&self) -> Option<i64> {
        match self {
            CacheState::Valid { eggs } => Some(*eggs),
            _ => None,
        }
    }
}

// ==========================================
// ProductionCacheEntry - 缓存条目
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionCacheEntry {
    pub key: CacheKey,
    pub product: Product,
    pub age_week: i32,
    pub state: CacheState,
    pub computed_at: NaiveDateTime,
}

impl ProductionCacheEntry {
    pub fn is_valid(&self) -> bool {
        matches!(self.state, CacheState::Valid { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_cache_state_recompute_precondition() {
        assert!(!CacheState::Valid { eggs: 100 }.needs_recompute());
        assert!(CacheState::Stale { last_known_eggs: 100 }.needs_recompute());
        assert!(CacheState::Absent.needs_recompute());
        assert_eq!(CacheState::Stale { last_known_eggs: 100 }.valid_eggs(), None);
    }

    fn entry(batch_id: i64, week: i32, state: CacheState) -> ProductionCacheEntry {
        ProductionCacheEntry {
            key: CacheKey {
                calendar: YearWeek { year: 2026, week },
                batch_id,
            },
            product: Product::Ross,
            age_week: 30,
            state,
            computed_at: NaiveDate::from_ymd_opt(2026, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn test_batch_state_fold() {
        assert_eq!(CacheState::for_batch(std::iter::empty()), CacheState::Absent);

        let stale = vec![
            entry(7, 3, CacheState::Stale { last_known_eggs: 500 }),
            entry(7, 4, CacheState::Stale { last_known_eggs: 300 }),
        ];
        assert_eq!(
            CacheState::for_batch(&stale),
            CacheState::Stale { last_known_eggs: 800 }
        );

        // 重算后残留的失效周不影响批次有效
        let mixed = vec![
            entry(7, 3, CacheState::Valid { eggs: 600 }),
            entry(7, 4, CacheState::Stale { last_known_eggs: 300 }),
        ];
        let state = CacheState::for_batch(&mixed);
        assert_eq!(state, CacheState::Valid { eggs: 600 });
        assert!(!state.needs_recompute());
    }
}
