// ==========================================
// 种禽产蛋预测系统 - 产蛋率曲线领域模型
// ==========================================
// 存储形态: 原始文本单元格 (导入表格常见 "78,5%" 形式)
// 解析规则: 坏行跳过并告警，绝不伪造非零值
// ==========================================

use serde::{Deserialize, Serialize};
use tracing::warn;

/// 曲线原始单元格（仓储层原样返回）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCurveCell {
    pub curve_name: String,
    pub age_label: String,
    pub rate_label: String,
}

/// 曲线上的一个点: 周龄 → 产蛋率(%)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayCurvePoint {
    pub age_week: i32,
    pub lay_rate: f64,
}

// ==========================================
// LayCurve - 品种产蛋率曲线
// ==========================================
// 不变量: 周龄唯一，按周龄升序
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LayCurve {
    pub name: String,
    pub points: Vec<LayCurvePoint>,
    /// 读取时的修订号（每次改写单元格 +1）
    #[serde(default)]
    pub revision: i64,
}

impl LayCurve {
    /// 从原始单元格构建曲线
    ///
    /// - 周龄非数字 / 非整数: 跳过
    /// - 产蛋率格式错误或超出 [0,100]: 跳过
    /// - 重复周龄: 保留首行
    pub fn from_raw_cells(name: &str, cells: &[RawCurveCell]) -> Self {
        let mut points: Vec<LayCurvePoint> = Vec::with_capacity(cells.len());

        for cell in cells {
            let age_week = match parse_age_label(&cell.age_label) {
                Some(a) => a,
                None => {
                    warn!(
                        curve = name,
                        age_label = %cell.age_label,
                        "曲线行周龄无法解析，跳过"
                    );
                    continue;
                }
            };

            // 空单元格视为无数据
            if cell.rate_label.trim().is_empty() {
                continue;
            }

            let lay_rate = match parse_percentage(&cell.rate_label) {
                Some(r) => r,
                None => {
                    warn!(
                        curve = name,
                        age_week,
                        rate_label = %cell.rate_label,
                        "曲线行产蛋率格式错误，跳过"
                    );
                    continue;
                }
            };

            if points.iter().any(|p| p.age_week == age_week) {
                warn!(curve = name, age_week, "曲线周龄重复，保留首行");
                continue;
            }

            points.push(LayCurvePoint { age_week, lay_rate });
        }

        points.sort_by_key(|p| p.age_week);

        Self {
            name: name.to_string(),
            points,
            revision: 0,
        }
    }

    /// 查询指定周龄的产蛋率
    pub fn rate_at(&self, age_week: i32) -> Option<f64> {
        self.points
            .binary_search_by_key(&age_week, |p| p.age_week)
            .ok()
            .map(|idx| self.points[idx].lay_rate)
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// 解析周龄标签: "25" / "25.0" / "25,0"
///
/// 小数部分非零视为格式错误
pub fn parse_age_label(raw: &str) -> Option<i32> {
    let normalized = raw.trim().replace(',', ".");
    if normalized.is_empty() {
        return None;
    }
    let value: f64 = normalized.parse().ok()?;
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value > i32::MAX as f64 {
        return None;
    }
    Some(value as i32)
}

/// 解析百分比文本: "78,5%" / "78.5" / " 80 % "
///
/// 返回值单位为百分点，范围 [0,100]
pub fn parse_percentage(raw: &str) -> Option<f64> {
    let normalized = raw.replace('%', "").replace(',', ".");
    let value: f64 = normalized.trim().parse().ok()?;
    if value.is_finite() && (0.0..=100.0).contains(&value) {
        Some(value)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(age: &str, rate: &str) -> RawCurveCell {
        RawCurveCell {
            curve_name: "JA87".to_string(),
            age_label: age.to_string(),
            rate_label: rate.to_string(),
        }
    }

    #[test]
    fn test_parse_percentage_formats() {
        assert_eq!(parse_percentage("78,5%"), Some(78.5));
        assert_eq!(parse_percentage(" 80 % "), Some(80.0));
        assert_eq!(parse_percentage("0"), Some(0.0));
        assert_eq!(parse_percentage("n/d"), None);
        assert_eq!(parse_percentage("120"), None);
        assert_eq!(parse_percentage("-1"), None);
    }

    #[test]
    fn test_parse_age_label_formats() {
        assert_eq!(parse_age_label("25"), Some(25));
        assert_eq!(parse_age_label("25,0"), Some(25));
        assert_eq!(parse_age_label("25.5"), None);
        assert_eq!(parse_age_label("W25"), None);
        assert_eq!(parse_age_label(""), None);
    }

    #[test]
    fn test_from_raw_cells_skips_bad_rows_and_sorts() {
        let cells = vec![
            cell("27", "81%"),
            cell("abc", "50"),
            cell("25", "12,5"),
            cell("26", "oops"),
            cell("25", "99"),
            cell("28", ""),
        ];
        let curve = LayCurve::from_raw_cells("JA87", &cells);

        assert_eq!(curve.points.len(), 2);
        assert_eq!(curve.points[0], LayCurvePoint { age_week: 25, lay_rate: 12.5 });
        assert_eq!(curve.rate_at(27), Some(81.0));
        assert_eq!(curve.rate_at(26), None);
    }
}
