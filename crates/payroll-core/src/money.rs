//! Currency arithmetic.
//!
//! Pay amounts are computed in whole cents and only converted back to a
//! decimal figure at the edges, so a total is always the exact sum of its
//! parts at currency precision.
//!
//! Cent values are kept within `±2^53` so every amount converts back to an
//! `f64` without loss.  Anything larger is reported as out of range (`None`)
//! instead of saturating or wrapping.

/// Largest magnitude, in cents, that survives the round trip through `f64`.
pub const MAX_CENTS: i64 = 1 << 53;

/// Relative tolerance applied before rounding, in units of `f64::EPSILON`.
const ROUNDING_ULPS: f64 = 8.0;

/// Round a decimal amount to whole cents, half away from zero.
///
/// The scaled value is nudged away from zero by a few ULPs first, so a
/// decimal midpoint such as `10.005` (stored as `10.00499999...`) rounds up
/// to `1001` as it would on paper.  Returns `None` for non-finite input or
/// a magnitude beyond [`MAX_CENTS`].
pub fn to_cents(amount: f64) -> Option<i64> {
    let scaled = amount * 100.0;
    if !scaled.is_finite() {
        return None;
    }
    let nudged = scaled + scaled.signum() * scaled.abs() * f64::EPSILON * ROUNDING_ULPS;
    let rounded = nudged.round();
    if rounded.abs() > MAX_CENTS as f64 {
        return None;
    }
    Some(rounded as i64)
}

/// Convert whole cents back into a decimal amount.
pub fn from_cents(cents: i64) -> f64 {
    cents as f64 / 100.0
}

/// `a + b`, or `None` when the sum leaves the representable range.
pub fn add_cents(a: i64, b: i64) -> Option<i64> {
    a.checked_add(b).filter(|sum| sum.abs() <= MAX_CENTS)
}

/// `a - b`, or `None` when the difference leaves the representable range.
pub fn sub_cents(a: i64, b: i64) -> Option<i64> {
    a.checked_sub(b).filter(|diff| diff.abs() <= MAX_CENTS)
}

/// `rate * hours * factor`, rounded to cents.
///
/// The product is formed before rounding so fractional hours do not
/// accumulate rounding error.
pub fn pay_cents(rate: f64, hours: f64, factor: f64) -> Option<i64> {
    to_cents(rate * factor * hours)
}

/// Format an amount with a currency symbol and two decimals (`$1187.50`).
pub fn format_amount(symbol: &str, amount: f64) -> String {
    format!("{symbol}{amount:.2}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cents_round_half_away_from_zero() {
        assert_eq!(to_cents(0.125), Some(13));
        assert_eq!(to_cents(1187.5), Some(118_750));
        assert_eq!(to_cents(0.0), Some(0));
        assert_eq!(to_cents(-0.125), Some(-13));
    }

    #[test]
    fn decimal_midpoints_round_up() {
        // 10.005 is stored as 10.004999...; on paper it rounds to 10.01.
        assert_eq!(to_cents(10.005), Some(1001));
        assert_eq!(to_cents(-10.005), Some(-1001));
        assert_eq!(to_cents(1.005), Some(101));
        assert_eq!(to_cents(1.0049), Some(100));
    }

    #[test]
    fn out_of_range_amounts_are_none() {
        assert_eq!(to_cents(f64::NAN), None);
        assert_eq!(to_cents(f64::INFINITY), None);
        assert_eq!(to_cents(1e17), None);
        assert!(to_cents(1e12).is_some());
    }

    #[test]
    fn checked_sums_stay_in_range() {
        assert_eq!(add_cents(100, 250), Some(350));
        assert_eq!(add_cents(MAX_CENTS, 1), None);
        assert_eq!(add_cents(i64::MAX, 1), None);
        assert_eq!(sub_cents(100, 250), Some(-150));
        assert_eq!(sub_cents(-MAX_CENTS, 1), None);
    }

    #[test]
    fn pay_cents_uses_full_product() {
        assert_eq!(pay_cents(25.0, 40.0, 1.0), Some(100_000));
        assert_eq!(pay_cents(25.0, 5.0, 1.5), Some(18_750));
        // 15.50 * 7.25 = 112.375 -> 112.38
        assert_eq!(pay_cents(15.5, 7.25, 1.0), Some(11_238));
        assert_eq!(pay_cents(1e17, 1000.0, 1.0), None);
    }

    #[test]
    fn format_amount_two_decimals() {
        assert_eq!(format_amount("$", 1187.5), "$1187.50");
        assert_eq!(format_amount("€", 0.0), "€0.00");
    }
}
