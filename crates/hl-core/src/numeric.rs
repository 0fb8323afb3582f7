/// Floating point type used throughout system
pub type Real = f64;

/// Absolute/relative tolerance pair.
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

impl Tolerances {
    /// Tolerance used when cross-checking breakdowns against their totals.
    pub const fn consistency() -> Self {
        Self { abs: 1e-6, rel: 0.0 }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

/// Round half away from zero at `ndigits` decimal places, operating on the
/// shortest decimal representation of `value` rather than its binary expansion.
///
/// `round_half_up(1.235, 2)` is `1.24` even though the nearest double to 1.235
/// lies slightly below it. This matches how the reference worksheets round.
pub fn round_half_up(value: Real, ndigits: i32) -> Real {
    if !value.is_finite() || value == 0.0 {
        return value;
    }

    // Shortest round-trip form, e.g. "1.2345e3".
    let repr = format!("{:e}", value.abs());
    let Some((mantissa, exponent)) = repr.split_once('e') else {
        return value;
    };
    let Ok(exponent) = exponent.parse::<i32>() else {
        return value;
    };
    let digits: Vec<u8> = mantissa
        .bytes()
        .filter(u8::is_ascii_digit)
        .map(|b| b - b'0')
        .collect();

    // digits[0] sits at 10^exponent; keep every digit at or above 10^-ndigits.
    let keep = exponent + 1 + ndigits;
    if keep < 0 {
        return 0.0;
    }
    let keep = keep as usize;
    if keep >= digits.len() {
        return value;
    }

    let mut kept = digits[..keep]
        .iter()
        .fold(0_u64, |acc, &d| acc * 10 + u64::from(d));
    if digits[keep] >= 5 {
        kept += 1;
    }
    if kept == 0 {
        return 0.0;
    }

    let magnitude = if ndigits >= 0 {
        kept as Real / 10_f64.powi(ndigits)
    } else {
        kept as Real * 10_f64.powi(-ndigits)
    };
    magnitude.copysign(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearly_equal_basic() {
        let tol = Tolerances {
            abs: 1e-12,
            rel: 1e-9,
        };
        assert!(nearly_equal(1.0, 1.0 + 1e-12, tol));
        assert!(nearly_equal(0.0, 1e-13, tol));
        assert!(!nearly_equal(1.0, 1.0 + 1e-6, tol));
    }

    #[test]
    fn consistency_tolerance_is_absolute() {
        let tol = Tolerances::consistency();
        assert!(nearly_equal(1_000_000.0, 1_000_000.0000005, tol));
        assert!(!nearly_equal(1_000_000.0, 1_000_000.00001, tol));
    }

    #[test]
    fn round_half_up_zero_digits() {
        assert_eq!(round_half_up(1.5, 0), 2.0);
        assert_eq!(round_half_up(2.5, 0), 3.0);
        assert_eq!(round_half_up(-1.5, 0), -2.0);
        assert_eq!(round_half_up(1234.49, 0), 1234.0);
        assert_eq!(round_half_up(0.5, 0), 1.0);
        assert_eq!(round_half_up(0.04, 0), 0.0);
        assert_eq!(round_half_up(-0.4, 0), 0.0);
    }

    #[test]
    fn round_half_up_decimal_digits() {
        assert_eq!(round_half_up(1.234, 2), 1.23);
        assert_eq!(round_half_up(1.235, 2), 1.24);
        assert_eq!(round_half_up(2.675, 2), 2.68);
        assert_eq!(round_half_up(7.0, 3), 7.0);
    }

    #[test]
    fn round_half_up_negative_digits() {
        assert_eq!(round_half_up(125.0, -1), 130.0);
        assert_eq!(round_half_up(124.9, -1), 120.0);
        assert_eq!(round_half_up(4.0, -1), 0.0);
    }

    #[test]
    fn round_half_up_passes_non_finite_through() {
        assert!(round_half_up(Real::NAN, 0).is_nan());
        assert_eq!(round_half_up(Real::INFINITY, 0), Real::INFINITY);
    }
}
