// ==========================================
// 种禽产蛋预测系统 - 日历周运算
// ==========================================
// 一年固定 52 周；周号越界时滚动到相邻年份
// 纯函数，不会失败
// ==========================================

use crate::domain::types::{YearWeek, WEEKS_PER_YEAR};
use chrono::{Datelike, NaiveDate};

/// 规范化 (年, 周): 结果周号在 [1, 52]
///
/// 等价于 week > 52 时反复减 52 并进位年份，week < 1 时对称处理
pub fn normalize(year: i32, week: i64) -> YearWeek {
    let per_year = WEEKS_PER_YEAR as i64;
    let zero_based = week - 1;
    let year_shift = zero_based.div_euclid(per_year);
    let week_in_year = zero_based.rem_euclid(per_year) + 1;

    YearWeek {
        year: year + year_shift as i32,
        week: week_in_year as i32,
    }
}

/// 偏移若干周（可为负）
pub fn shift(from: YearWeek, weeks: i64) -> YearWeek {
    normalize(from.year, from.week as i64 + weeks)
}

/// 从 start 开始的连续 count 周
pub fn consecutive_weeks(start: YearWeek, count: usize) -> Vec<YearWeek> {
    let start = normalize(start.year, start.week as i64);
    (0..count as i64).map(|i| shift(start, i)).collect()
}

/// 指定日期所在的日历周（ISO 第 53 周折算为次年第 1 周）
pub fn week_of(date: NaiveDate) -> YearWeek {
    let iso = date.iso_week();
    normalize(iso.year(), iso.week() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_rollover() {
        assert_eq!(normalize(2025, 53), YearWeek { year: 2026, week: 1 });
        assert_eq!(normalize(2025, 105), YearWeek { year: 2027, week: 1 });
        assert_eq!(normalize(2025, 1), YearWeek { year: 2025, week: 1 });
        assert_eq!(normalize(2025, 52), YearWeek { year: 2025, week: 52 });
        assert_eq!(normalize(2025, 104), YearWeek { year: 2026, week: 52 });
    }

    #[test]
    fn test_normalize_underflow() {
        assert_eq!(normalize(2026, 0), YearWeek { year: 2025, week: 52 });
        assert_eq!(normalize(2026, -2), YearWeek { year: 2025, week: 50 });
        assert_eq!(normalize(2026, -52), YearWeek { year: 2024, week: 52 });
    }

    #[test]
    fn test_shift_across_year_boundary() {
        let w = YearWeek { year: 2026, week: 2 };
        assert_eq!(shift(w, -3), YearWeek { year: 2025, week: 51 });
        assert_eq!(shift(w, 51), YearWeek { year: 2027, week: 1 });
    }

    #[test]
    fn test_consecutive_weeks_wraps() {
        let weeks = consecutive_weeks(YearWeek { year: 2025, week: 51 }, 4);
        assert_eq!(
            weeks,
            vec![
                YearWeek { year: 2025, week: 51 },
                YearWeek { year: 2025, week: 52 },
                YearWeek { year: 2026, week: 1 },
                YearWeek { year: 2026, week: 2 },
            ]
        );
    }

    #[test]
    fn test_week_of_iso_week_53() {
        // 2026-12-31 属于 ISO 2026-W53
        let date = NaiveDate::from_ymd_opt(2026, 12, 31).unwrap();
        assert_eq!(week_of(date), YearWeek { year: 2027, week: 1 });

        let date = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
        assert_eq!(week_of(date), YearWeek { year: 2026, week: 42 });
    }
}
