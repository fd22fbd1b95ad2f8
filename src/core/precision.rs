//! Fixed decimal rounding shared by every reported score.
//!
//! Similarity scores, sub-scores and aspect ratios are reported with 3
//! decimal places, brightness with 1. Values are rounded half away from
//! zero so two implementations fed the same inputs agree digit for digit.

/// Round `value` to `places` decimal places
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Round to 3 decimal places (scores, aspect ratios)
pub fn round3(value: f64) -> f64 {
    round_to(value, 3)
}

/// Round to 1 decimal place (brightness)
pub fn round1(value: f64) -> f64 {
    round_to(value, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_nearest() {
        assert_eq!(round3(0.12351), 0.124);
        assert_eq!(round1(127.46), 127.5);
    }

    #[test]
    fn keeps_exact_values() {
        assert_eq!(round3(1.0), 1.0);
        assert_eq!(round3(0.5), 0.5);
        assert_eq!(round1(0.0), 0.0);
    }

    #[test]
    fn truncates_long_fractions() {
        assert_eq!(round3(4.0 / 3.0), 1.333);
        assert_eq!(round3(16.0 / 9.0), 1.778);
    }
}
