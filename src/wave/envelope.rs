//! One-shot shapes — linear ramps and exponential curves over a normalized phase.
//!
//! Both map a phase clamped to `[0.0, 1.0]` onto a `start..end` range.

/// Smallest exponent accepted by [`curve`]; non-positive exponents clamp here.
pub const MIN_CURVE_EXPONENT: f64 = 0.001;

/// Linear interpolation between `start` and `end` at `phase`.
///
/// `phase` is clamped to `[0.0, 1.0]`.
pub fn ramp(phase: f64, start: f64, end: f64) -> f64 {
    let t = phase.clamp(0.0, 1.0);
    start + (end - start) * t
}

/// Exponential curve from `start` to `end`: `start + (end - start) * t^exponent`.
///
/// `phase` is clamped to `[0.0, 1.0]`; a non-positive `exponent` is replaced
/// by [`MIN_CURVE_EXPONENT`].
pub fn curve(phase: f64, start: f64, end: f64, exponent: f64) -> f64 {
    let t = phase.clamp(0.0, 1.0);
    let exponent = if exponent <= 0.0 {
        MIN_CURVE_EXPONENT
    } else {
        exponent
    };
    start + (end - start) * t.powf(exponent)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-10;

    #[test]
    fn ramp_endpoints() {
        assert!((ramp(0.0, 10.0, 20.0) - 10.0).abs() < EPSILON);
        assert!((ramp(1.0, 10.0, 20.0) - 20.0).abs() < EPSILON);
    }

    #[test]
    fn ramp_midpoint() {
        assert!((ramp(0.5, 0.0, 127.0) - 63.5).abs() < EPSILON);
    }

    #[test]
    fn ramp_clamps_beyond_one() {
        assert!((ramp(1.7, 10.0, 20.0) - 20.0).abs() < EPSILON);
        assert!((ramp(-0.3, 10.0, 20.0) - 10.0).abs() < EPSILON);
    }

    #[test]
    fn descending_ramp() {
        assert!((ramp(0.25, 100.0, 0.0) - 75.0).abs() < EPSILON);
    }

    #[test]
    fn curve_endpoints() {
        for exp in [0.5, 1.0, 2.0, 4.0] {
            assert!((curve(0.0, 5.0, 50.0, exp) - 5.0).abs() < EPSILON);
            assert!((curve(1.0, 5.0, 50.0, exp) - 50.0).abs() < EPSILON);
        }
    }

    #[test]
    fn curve_square_at_half() {
        assert!((curve(0.5, 0.0, 1.0, 2.0) - 0.25).abs() < EPSILON);
    }

    #[test]
    fn curve_clamps_beyond_one() {
        assert!((curve(3.0, 0.0, 10.0, 2.0) - 10.0).abs() < EPSILON);
    }

    #[test]
    fn curve_non_positive_exponent_clamps() {
        // 0.5^0.001 is just below 1
        let v = curve(0.5, 0.0, 1.0, -2.0);
        assert!((v - 0.5f64.powf(MIN_CURVE_EXPONENT)).abs() < EPSILON);
        assert!(v > 0.99);
    }

    #[test]
    fn curve_is_monotonic() {
        let mut prev = curve(0.0, 0.0, 1.0, 3.0);
        for i in 1..=100 {
            let v = curve(i as f64 / 100.0, 0.0, 1.0, 3.0);
            assert!(v >= prev - EPSILON);
            prev = v;
        }
    }
}
