// ==========================================
// 种禽产蛋预测系统 - 领域类型定义
// ==========================================
// 约定: 一年固定 52 周（不使用 ISO 第 53 周）
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// 一年的周数（简化模型，第 53 周不存在）
pub const WEEKS_PER_YEAR: i32 = 52;

// ==========================================
// 日历周 (Year, Week)
// ==========================================
// 排序: 先年后周（字典序），用于截止周比较
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearWeek {
    pub year: i32,
    pub week: i32,
}

impl YearWeek {
    /// 构造并校验周号（1..=52），越界返回 None
    pub fn checked(year: i32, week: i32) -> Option<Self> {
        if (1..=WEEKS_PER_YEAR).contains(&week) {
            Some(Self { year, week })
        } else {
            None
        }
    }

    /// 从 "YYYY/WW" 文本解析（导入表格中的预计结束周格式）
    pub fn parse_slash(raw: &str) -> Option<Self> {
        let (y, w) = raw.trim().split_once('/')?;
        let year = y.trim().parse::<i32>().ok()?;
        let week = w.trim().parse::<i32>().ok()?;
        Self::checked(year, week)
    }
}

impl fmt::Display for YearWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{:02}", self.year, self.week)
    }
}

// ==========================================
// 产品线 (Product)
// ==========================================
// 封闭集合: 未知产品属于调用参数错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Product {
    Granpollo,
    Pollo70,
    ColorYeald,
    Ross,
}

impl Product {
    pub const ALL: [Product; 4] = [
        Product::Granpollo,
        Product::Pollo70,
        Product::ColorYeald,
        Product::Ross,
    ];

    /// 宽松解析: 忽略大小写、空格与下划线
    ///
    /// "granpollo" / "Granpollo" / "Color Yeald" / "COLOR_YEALD" 均可识别
    pub fn from_str(s: &str) -> Option<Self> {
        let key: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_')
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "granpollo" => Some(Product::Granpollo),
            "pollo70" => Some(Product::Pollo70),
            "coloryeald" => Some(Product::ColorYeald),
            "ross" => Some(Product::Ross),
            _ => None,
        }
    }

    /// 转换为数据库字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            Product::Granpollo => "GRANPOLLO",
            Product::Pollo70 => "POLLO70",
            Product::ColorYeald => "COLOR_YEALD",
            Product::Ross => "ROSS",
        }
    }

    /// 界面展示名
    pub fn display_name(&self) -> &'static str {
        match self {
            Product::Granpollo => "Granpollo",
            Product::Pollo70 => "Pollo70",
            Product::ColorYeald => "Color Yeald",
            Product::Ross => "Ross",
        }
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

// ==========================================
// 台账类型 (Ledger Kind)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerKind {
    Purchase, // 外购种蛋
    Sale,     // 外售种蛋
}

impl LedgerKind {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "PURCHASE" => Some(LedgerKind::Purchase),
            "SALE" => Some(LedgerKind::Sale),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            LedgerKind::Purchase => "PURCHASE",
            LedgerKind::Sale => "SALE",
        }
    }
}

impl fmt::Display for LedgerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 客户需求性别类别 (Sex Category)
// ==========================================
// BOTH: 需求量公母各半
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SexCategory {
    Male,
    Female,
    Both,
}

impl SexCategory {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "MALE" => Some(SexCategory::Male),
            "FEMALE" => Some(SexCategory::Female),
            "BOTH" => Some(SexCategory::Both),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            SexCategory::Male => "MALE",
            SexCategory::Female => "FEMALE",
            SexCategory::Both => "BOTH",
        }
    }
}

impl fmt::Display for SexCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_lenient_parse() {
        assert_eq!(Product::from_str("granpollo"), Some(Product::Granpollo));
        assert_eq!(Product::from_str("Color Yeald"), Some(Product::ColorYeald));
        assert_eq!(Product::from_str("COLOR_YEALD"), Some(Product::ColorYeald));
        assert_eq!(Product::from_str("colorYeald"), Some(Product::ColorYeald));
        assert_eq!(Product::from_str(" Ross "), Some(Product::Ross));
        assert_eq!(Product::from_str("broiler"), None);
    }

    #[test]
    fn test_product_db_roundtrip_for_all_variants() {
        for p in Product::ALL {
            assert_eq!(Product::from_str(p.to_db_str()), Some(p));
        }
    }

    #[test]
    fn test_year_week_ordering_is_year_then_week() {
        let a = YearWeek { year: 2025, week: 52 };
        let b = YearWeek { year: 2026, week: 1 };
        assert!(a < b);
        assert!(YearWeek { year: 2026, week: 2 } > b);
    }

    #[test]
    fn test_year_week_parse_slash() {
        assert_eq!(
            YearWeek::parse_slash("2026/07"),
            Some(YearWeek { year: 2026, week: 7 })
        );
        assert_eq!(YearWeek::parse_slash("2026/53"), None);
        assert_eq!(YearWeek::parse_slash("2026-07"), None);
        assert_eq!(YearWeek { year: 2026, week: 7 }.to_string(), "2026/07");
    }
}
