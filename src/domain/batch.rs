// ==========================================
// 种禽产蛋预测系统 - 批次领域模型
// ==========================================
// 批次 = 同一品种/产品、同舍饲养的一群种鸡
// 并发控制: version 乐观锁，每次字段变更 +1
// ==========================================

use crate::domain::types::{Product, YearWeek};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// Batch - 生产批次
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    // ===== 主键 =====
    pub batch_id: i64,

    // ===== 位置 =====
    pub farm: String, // 养殖场
    pub shed: String, // 鸡舍

    // ===== 品种与曲线 =====
    pub breed: Option<String>,      // 母鸡品系（仅展示）
    pub curve_name: Option<String>, // 产蛋率曲线名，缺失则无产量
    pub product: Product,

    // ===== 规模与周期 =====
    pub headcount: i64,
    pub start_year: i32,
    pub start_week: i32,
    pub end_cutoff: Option<YearWeek>, // 预计淘汰周，之后不再产蛋
    pub active: bool,

    // ===== 并发控制 =====
    pub version: i64,
    pub updated_at: NaiveDateTime,
}

impl Batch {
    /// 产量明细中的来源标签: "养殖场 鸡舍"
    pub fn source_label(&self) -> String {
        format!("{} {}", self.farm, self.shed)
    }

    /// 现场查询码: {id}{场名前三位大写}{起始年}{品系首词}
    ///
    /// 例: 1TON2025JA87
    pub fn code(&self) -> String {
        let farm_prefix: String = self.farm.chars().take(3).collect::<String>().to_uppercase();
        let breed_word = self
            .breed
            .as_deref()
            .and_then(|b| b.split_whitespace().next())
            .unwrap_or("N/A");
        format!(
            "{}{}{}{}",
            self.batch_id, farm_prefix, self.start_year, breed_word
        )
    }

    /// 解析查询码开头的数字 ID
    pub fn id_from_code(code: &str) -> Option<i64> {
        let digits: String = code.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
        digits.parse().ok()
    }
}

// ==========================================
// NewBatch - 新建批次参数
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBatch {
    pub farm: String,
    pub shed: String,
    pub breed: Option<String>,
    pub curve_name: Option<String>,
    pub product: Product,
    pub headcount: i64,
    pub start_year: i32,
    pub start_week: i32,
    pub end_cutoff: Option<YearWeek>,
    pub active: bool,
}

// ==========================================
// BatchChanges - 部分更新
// ==========================================
// None = 不修改；Some(None) 用于清空可空字段
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchChanges {
    pub farm: Option<String>,
    pub shed: Option<String>,
    pub breed: Option<Option<String>>,
    pub curve_name: Option<Option<String>>,
    pub product: Option<Product>,
    pub headcount: Option<i64>,
    pub start_year: Option<i32>,
    pub start_week: Option<i32>,
    pub end_cutoff: Option<Option<YearWeek>>,
    pub active: Option<bool>,
}

impl BatchChanges {
    pub fn is_empty(&self) -> bool {
        self.farm.is_none()
            && self.shed.is_none()
            && self.breed.is_none()
            && self.curve_name.is_none()
            && self.product.is_none()
            && self.headcount.is_none()
            && self.start_year.is_none()
            && self.start_week.is_none()
            && self.end_cutoff.is_none()
            && self.active.is_none()
    }

    /// 将变更应用到批次副本（不修改 version）
    pub fn apply_to(&self, batch: &Batch) -> Batch {
        let mut next = batch.clone();
        if let Some(v) = &self.farm {
            next.farm = v.clone();
        }
        if let Some(v) = &self.shed {
            next.shed = v.clone();
        }
        if let Some(v) = &self.breed {
            next.breed = v.clone();
        }
        if let Some(v) = &self.curve_name {
            next.curve_name = v.clone();
        }
        if let Some(v) = self.product {
            next.product = v;
        }
        if let Some(v) = self.headcount {
            next.headcount = v;
        }
        if let Some(v) = self.start_year {
            next.start_year = v;
        }
        if let Some(v) = self.start_week {
            next.start_week = v;
        }
        if let Some(v) = self.end_cutoff {
            next.end_cutoff = v;
        }
        if let Some(v) = self.active {
            next.active = v;
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_batch() -> Batch {
        Batch {
            batch_id: 1,
            farm: "Tonengo".to_string(),
            shed: "2".to_string(),
            breed: Some("JA87 Hubbard".to_string()),
            curve_name: Some("JA87".to_string()),
            product: Product::Granpollo,
            headcount: 3328,
            start_year: 2025,
            start_week: 39,
            end_cutoff: None,
            active: true,
            version: 1,
            updated_at: NaiveDate::from_ymd_opt(2025, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn test_code_and_id_from_code() {
        let batch = sample_batch();
        assert_eq!(batch.code(), "1TON2025JA87");
        assert_eq!(Batch::id_from_code("1TON2025JA87"), Some(1));
        assert_eq!(Batch::id_from_code("12PAS2025JA57K"), Some(12));
        assert_eq!(Batch::id_from_code("TON"), None);
    }

    #[test]
    fn test_apply_changes_keeps_untouched_fields() {
        let batch = sample_batch();
        let changes = BatchChanges {
            headcount: Some(4000),
            curve_name: Some(None),
            ..Default::default()
        };
        let next = changes.apply_to(&batch);
        assert_eq!(next.headcount, 4000);
        assert_eq!(next.curve_name, None);
        assert_eq!(next.farm, batch.farm);
        assert_eq!(next.version, batch.version);
        assert!(!changes.is_empty());
        assert!(BatchChanges::default().is_empty());
    }
}
