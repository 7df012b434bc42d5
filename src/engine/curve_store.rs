// ==========================================
// 种禽产蛋预测系统 - 产蛋率曲线快照
// ==========================================
// 一次预测运行只读取一次曲线，保证同一运行内口径一致
// 曲线可能被外部并发编辑；编辑会同步失效缓存
// ==========================================

use crate::domain::batch::Batch;
use crate::domain::curve::LayCurve;
use crate::repository::error::RepositoryResult;
use crate::repository::store::ForecastStore;
use std::collections::HashMap;
use tracing::warn;

/// 只读曲线快照: 曲线名 → 曲线（None 表示库中不存在）
#[derive(Debug, Clone, Default)]
pub struct LayCurveStore {
    curves: HashMap<String, Option<LayCurve>>,
}

impl LayCurveStore {
    /// 为一组批次加载所引用的曲线
    pub fn snapshot_for(store: &dyn ForecastStore, batches: &[Batch]) -> RepositoryResult<Self> {
        let mut curves: HashMap<String, Option<LayCurve>> = HashMap::new();

        for name in batches.iter().filter_map(|b| b.curve_name.as_deref()) {
            if curves.contains_key(name) {
                continue;
            }
            let curve = store.get_curve(name)?;
            if curve.is_none() {
                warn!(curve = name, "曲线不存在，引用该曲线的批次无产量");
            }
            curves.insert(name.to_string(), curve);
        }

        Ok(Self { curves })
    }

    /// 直接由曲线构建（测试与离线计算用）
    pub fn from_curves(curves: impl IntoIterator<Item = LayCurve>) -> Self {
        Self {
            curves: curves
                .into_iter()
                .map(|c| (c.name.clone(), Some(c)))
                .collect(),
        }
    }

    pub fn curve(&self, curve_name: &str) -> Option<&LayCurve> {
        self.curves.get(curve_name).and_then(|c| c.as_ref())
    }

    /// 查询产蛋率(%)
    pub fn lookup(&self, curve_name: &str, age_week: i32) -> Option<f64> {
        self.curve(curve_name).and_then(|c| c.rate_at(age_week))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::curve::LayCurvePoint;

    #[test]
    fn test_lookup_absent_curve_and_age() {
        let store = LayCurveStore::from_curves(vec![LayCurve {
            name: "JA87".to_string(),
            points: vec![LayCurvePoint {
                age_week: 30,
                lay_rate: 80.0,
            }],
            revision: 0,
        }]);

        assert_eq!(store.lookup("JA87", 30), Some(80.0));
        assert_eq!(store.lookup("JA87", 31), None);
        assert_eq!(store.lookup("ROSS308", 30), None);
    }
}
