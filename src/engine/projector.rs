// ==========================================
// 种禽产蛋预测系统 - 产量投影引擎
// ==========================================
// 输入: 批次 + 曲线快照 + 产蛋周期窗口
// 输出: (日历周, 产蛋量) 事实序列
// 公式: 产蛋量 = 存栏 × 产蛋率/100 × 7，四舍五入到 100
// 红线: 无状态引擎，不访问存储；数据问题跳过不报错
// ==========================================

use crate::domain::batch::Batch;
use crate::domain::production::{ProductionFact, ProjectionBasis};
use crate::engine::calendar::normalize;
use crate::engine::curve_store::LayCurveStore;
use crate::engine::rounding::round_to_nearest_100;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// 每周天数
const DAYS_PER_WEEK: f64 = 7.0;

// ==========================================
// LifecycleWindow - 产蛋周期窗口（周龄，闭区间）
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleWindow {
    pub min_age: i32,
    pub max_age: i32,
}

impl LifecycleWindow {
    pub fn new(min_age: i32, max_age: i32) -> Self {
        Self { min_age, max_age }
    }

    pub fn is_valid(&self) -> bool {
        self.min_age <= self.max_age
    }

    pub fn contains(&self, age_week: i32) -> bool {
        age_week >= self.min_age && age_week <= self.max_age
    }
}

impl Default for LifecycleWindow {
    fn default() -> Self {
        Self {
            min_age: 25,
            max_age: 64,
        }
    }
}

// ==========================================
// ProductionProjector - 产量投影
// ==========================================
pub struct ProductionProjector;

impl ProductionProjector {
    pub fn new() -> Self {
        Self
    }

    /// 沿曲线投影单批次产量
    ///
    /// # 跳过规则
    /// 1. 周龄不在窗口内
    /// 2. 产蛋率 <= 0
    /// 3. 日历周晚于预计淘汰周
    ///
    /// 曲线缺失/为空、窗口倒置时返回空序列
    pub fn project(
        &self,
        batch: &Batch,
        curves: &LayCurveStore,
        window: LifecycleWindow,
    ) -> Vec<ProductionFact> {
        if !window.is_valid() {
            warn!(
                batch_id = batch.batch_id,
                min_age = window.min_age,
                max_age = window.max_age,
                "产蛋周期窗口倒置，批次无产量"
            );
            return Vec::new();
        }

        let curve = match batch.curve_name.as_deref().and_then(|name| curves.curve(name)) {
            Some(c) => c,
            None => {
                debug!(batch_id = batch.batch_id, curve = ?batch.curve_name, "批次无可用曲线");
                return Vec::new();
            }
        };

        let source_label = batch.source_label();
        let basis = ProjectionBasis {
            batch_version: batch.version,
            curve_revision: curve.revision,
            min_age: window.min_age,
            max_age: window.max_age,
        };
        let mut facts = Vec::new();

        for point in &curve.points {
            if !window.contains(point.age_week) {
                continue;
            }
            if point.lay_rate <= 0.0 {
                continue;
            }

            let calendar = normalize(
                batch.start_year,
                batch.start_week as i64 + point.age_week as i64,
            );

            if let Some(cutoff) = batch.end_cutoff {
                if calendar > cutoff {
                    continue;
                }
            }

            let eggs = round_to_nearest_100(
                batch.headcount as f64 * point.lay_rate * DAYS_PER_WEEK / 100.0,
            );

            facts.push(ProductionFact {
                calendar,
                batch_id: batch.batch_id,
                product: batch.product,
                eggs,
                source_label: source_label.clone(),
                age_week: point.age_week,
                basis,
            });
        }

        facts
    }
}

impl Default for ProductionProjector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::curve::{LayCurve, LayCurvePoint};
    use crate::domain::types::{Product, YearWeek};
    use chrono::NaiveDate;

    fn batch(headcount: i64, start_year: i32, start_week: i32) -> Batch {
        Batch {
            batch_id: 1,
            farm: "Passirano".to_string(),
            shed: "1".to_string(),
            breed: None,
            curve_name: Some("JA87".to_string()),
            product: Product::Ross,
            headcount,
            start_year,
            start_week,
            end_cutoff: None,
            active: true,
            version: 1,
            updated_at: NaiveDate::from_ymd_opt(2025, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        }
    }

    fn curves(points: &[(i32, f64)]) -> LayCurveStore {
        LayCurveStore::from_curves(vec![LayCurve {
            name: "JA87".to_string(),
            points: points
                .iter()
                .map(|&(age_week, lay_rate)| LayCurvePoint { age_week, lay_rate })
                .collect(),
            revision: 3,
        }])
    }

    #[test]
    fn test_projection_arithmetic() {
        let facts = ProductionProjector::new().project(
            &batch(10_000, 2025, 10),
            &curves(&[(30, 50.0)]),
            LifecycleWindow::default(),
        );

        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].eggs, 35_000);
        assert_eq!(facts[0].age_week, 30);
        assert_eq!(facts[0].calendar, YearWeek { year: 2025, week: 40 });
        assert_eq!(facts[0].source_label, "Passirano 1");
        assert_eq!(
            facts[0].basis,
            ProjectionBasis {
                batch_version: 1,
                curve_revision: 3,
                min_age: 25,
                max_age: 64,
            }
        );
    }

    #[test]
    fn test_projection_rounds_half_away_from_zero() {
        // 2500 × 1% × 7 = 175 → 200
        let facts = ProductionProjector::new().project(
            &batch(2_500, 2025, 1),
            &curves(&[(30, 1.0)]),
            LifecycleWindow::default(),
        );
        assert_eq!(facts[0].eggs, 200);

        // 1500 × 10% × 7 = 1050 → 1100（银行家舍入为 1000）
        let facts = ProductionProjector::new().project(
            &batch(1_500, 2025, 1),
            &curves(&[(30, 10.0)]),
            LifecycleWindow::default(),
        );
        assert_eq!(facts[0].eggs, 1_100);
    }

    #[test]
    fn test_window_exclusion() {
        let facts = ProductionProjector::new().project(
            &batch(10_000, 2025, 1),
            &curves(&[(20, 90.0), (24, 90.0), (25, 90.0), (64, 90.0), (65, 90.0)]),
            LifecycleWindow::default(),
        );
        let ages: Vec<i32> = facts.iter().map(|f| f.age_week).collect();
        assert_eq!(ages, vec![25, 64]);
    }

    #[test]
    fn test_zero_rate_and_cutoff_skipped() {
        let mut b = batch(10_000, 2025, 40);
        b.end_cutoff = Some(YearWeek { year: 2026, week: 20 });

        // 40 + 30 = 70 → 2026/18；40 + 32 = 72 → 2026/20；40 + 33 → 2026/21 超出
        let facts = ProductionProjector::new().project(
            &b,
            &curves(&[(30, 80.0), (31, 0.0), (32, 80.0), (33, 80.0)]),
            LifecycleWindow::default(),
        );
        let weeks: Vec<YearWeek> = facts.iter().map(|f| f.calendar).collect();
        assert_eq!(
            weeks,
            vec![YearWeek { year: 2026, week: 18 }, YearWeek { year: 2026, week: 20 }]
        );
    }

    #[test]
    fn test_absent_curve_and_inverted_window_yield_nothing() {
        let mut b = batch(10_000, 2025, 1);
        b.curve_name = Some("MISSING".to_string());
        assert!(ProductionProjector::new()
            .project(&b, &curves(&[(30, 80.0)]), LifecycleWindow::default())
            .is_empty());

        let b = batch(10_000, 2025, 1);
        assert!(ProductionProjector::new()
            .project(&b, &curves(&[(30, 80.0)]), LifecycleWindow::new(64, 25))
            .is_empty());
    }
}
