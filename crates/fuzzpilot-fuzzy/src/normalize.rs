//! Input normalization for inference.
//!
//! Every crisp value handed to a TSK block must lie strictly inside `(0, 1)`: at exactly
//! `1.0` all boundary triangles collapse and the firing weights vanish, which is common
//! for wrapped relative headings. [`open_unit`] is the one place that guarantees this.

/// Distance kept from both ends of the unit interval.
pub const BOUNDARY_MARGIN: f64 = 1e-5;

/// Clamps `x` into `[BOUNDARY_MARGIN, 1 - BOUNDARY_MARGIN]`.
///
/// `NaN` maps to the lower margin.
///
/// ```
/// # use fuzzpilot_fuzzy::normalize::{open_unit, BOUNDARY_MARGIN};
/// assert_eq!(open_unit(0.0), BOUNDARY_MARGIN);
/// assert_eq!(open_unit(1.0), 1.0 - BOUNDARY_MARGIN);
/// assert_eq!(open_unit(0.25), 0.25);
/// ```
#[must_use]
pub fn open_unit(x: f64) -> f64 {
    if x.is_nan() {
        return BOUNDARY_MARGIN;
    }
    x.clamp(BOUNDARY_MARGIN, 1.0 - BOUNDARY_MARGIN)
}

/// Maps `value` from `[min, max]` onto `[0, 1]`, saturating outside the range.
///
/// ```
/// # use fuzzpilot_fuzzy::normalize::linear_unit;
/// assert_eq!(linear_unit(0.0, -200.0, 200.0), 0.5);
/// assert_eq!(linear_unit(500.0, -200.0, 200.0), 1.0);
/// ```
#[must_use]
pub fn linear_unit(value: f64, min: f64, max: f64) -> f64 {
    assert!(max > min, "empty normalization range");
    ((value - min) / (max - min)).clamp(0.0, 1.0)
}

/// Inverse-proximity normalization: `min(scale / value, 1)`.
///
/// Large values map towards `0`, values at or below `scale` saturate to `1`. The
/// denominator is floored so `value == 0` is well-defined.
///
/// ```
/// # use fuzzpilot_fuzzy::normalize::saturating_ratio;
/// assert_eq!(saturating_ratio(100.0, 50.0), 0.5);
/// assert_eq!(saturating_ratio(0.0, 50.0), 1.0);
/// ```
#[must_use]
pub fn saturating_ratio(value: f64, scale: f64) -> f64 {
    (scale / (value.max(0.0) + 1e-6)).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_unit_never_touches_bounds() {
        for x in [-10.0, -0.0, 0.0, 1e-9, 0.5, 1.0 - 1e-9, 1.0, 42.0, f64::INFINITY] {
            let y = open_unit(x);
            assert!(y > 0.0 && y < 1.0, "{x} -> {y}");
        }
        assert_eq!(open_unit(f64::NAN), BOUNDARY_MARGIN);
        assert_eq!(open_unit(f64::NEG_INFINITY), BOUNDARY_MARGIN);
    }

    #[test]
    fn test_linear_unit_saturates() {
        assert_eq!(linear_unit(-1000.0, -200.0, 200.0), 0.0);
        assert_eq!(linear_unit(200.0, -200.0, 200.0), 1.0);
        assert!((linear_unit(100.0, -200.0, 200.0) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_saturating_ratio_is_monotone() {
        let mut last = f64::INFINITY;
        for d in [10.0, 50.0, 100.0, 400.0, 1000.0] {
            let v = saturating_ratio(d, 50.0);
            assert!(v <= last);
            assert!((0.0..=1.0).contains(&v));
            last = v;
        }
    }
}
