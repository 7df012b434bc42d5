// ==========================================
// 种禽产蛋预测系统 - 取整规则
// ==========================================
// 统一使用四舍五入（.5 远离零），不得使用银行家舍入
// f64::round 即为远离零舍入
// ==========================================

/// 四舍五入到整数（.5 远离零）
pub fn round_half_away(value: f64) -> i64 {
    value.round() as i64
}

/// 四舍五入到最近的 100 的倍数（.5 远离零）
pub fn round_to_nearest_100(value: f64) -> i64 {
    round_half_away(value / 100.0) * 100
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to_nearest_100_half_boundary() {
        // 银行家舍入会得到 200 / 200 / -200
        assert_eq!(round_to_nearest_100(150.0), 200);
        assert_eq!(round_to_nearest_100(250.0), 300);
        assert_eq!(round_to_nearest_100(-250.0), -300);
    }

    #[test]
    fn test_round_to_nearest_100_regular() {
        assert_eq!(round_to_nearest_100(35_000.0), 35_000);
        assert_eq!(round_to_nearest_100(149.99), 100);
        assert_eq!(round_to_nearest_100(0.0), 0);
        assert_eq!(round_to_nearest_100(49.0), 0);
    }

    #[test]
    fn test_round_half_away() {
        assert_eq!(round_half_away(0.5), 1);
        assert_eq!(round_half_away(2.5), 3);
        assert_eq!(round_half_away(-0.5), -1);
        assert_eq!(round_half_away(409.6), 410);
    }
}
