//! Small numeric helpers shared by the enrichment and aggregation steps.

/// Rounds to two decimal places.
///
/// Goes through the decimal formatter, which works on the exact binary value and
/// breaks ties to even. `(x * 100.0).round() / 100.0` would round 1.005 up because
/// of the multiplication error, so it is not used here.
pub fn round2(x: f64) -> f64 {
    if !x.is_finite() {
        return x;
    }
    format!("{:.2}", x).parse::<f64>().unwrap_or(x)
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Bessel-corrected variance (divisor `n - 1`). `None` below two samples.
pub fn sample_variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    // Two-pass form with the compensation term keeps equal inputs at exactly 0.
    let (sq, comp) = values.iter().fold((0.0, 0.0), |(sq, comp), &v| {
        let d = v - m;
        (sq + d * d, comp + d)
    });
    let n = values.len() as f64;
    Some(((sq - comp * comp / n) / (n - 1.0)).max(0.0))
}

pub fn sample_stdev(values: &[f64]) -> Option<f64> {
    sample_variance(values).map(f64::sqrt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round2_matches_decimal_rounding() {
        assert_eq!(round2(100.004), 100.0);
        assert_eq!(round2(100.006), 100.01);
        assert_eq!(round2(-0.010000000000005116), -0.01);
        // 1.005 is stored as 1.00499999999999989...
        assert_eq!(round2(1.005), 1.0);
    }

    #[test]
    fn round2_passes_through_non_finite() {
        assert!(round2(f64::NAN).is_nan());
        assert_eq!(round2(f64::INFINITY), f64::INFINITY);
    }

    #[test]
    fn mean_of_empty_is_none() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[2.0, 4.0]), Some(3.0));
    }

    #[test]
    fn sample_variance_uses_bessel_correction() {
        // population variance would be 4.0
        let v = sample_variance(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((v - 32.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn sample_variance_of_equal_pair_is_zero() {
        assert_eq!(sample_variance(&[101.25, 101.25]), Some(0.0));
    }

    #[test]
    fn sample_statistics_need_two_values() {
        assert_eq!(sample_variance(&[1.0]), None);
        assert_eq!(sample_stdev(&[]), None);
        assert_eq!(sample_stdev(&[1.0, 3.0]), Some(2.0_f64.sqrt()));
    }
}
