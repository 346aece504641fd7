/// Round to two decimal places, half away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Percentage of `numerator` over `denominator`, rounded to two decimal
/// places. A zero denominator yields 0.0 rather than a division fault.
pub fn percentage(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    round2((numerator as f64 / denominator as f64) * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round2_half_up() {
        assert_eq!(round2(16.666_666), 16.67);
        assert_eq!(round2(99.999), 100.0);
        assert_eq!(round2(50.0), 50.0);
        assert_eq!(round2(0.004), 0.0);
    }

    #[test]
    fn percentage_guards_zero_denominator() {
        assert_eq!(percentage(5, 0), 0.0);
        assert_eq!(percentage(0, 0), 0.0);
    }

    #[test]
    fn percentage_rounds() {
        assert_eq!(percentage(30, 180), 16.67);
        assert_eq!(percentage(90, 180), 50.0);
        assert_eq!(percentage(180, 200), 90.0);
    }
}
