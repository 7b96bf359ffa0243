use crate::CoreError;

/// Floating point type used throughout system
pub type Real = f64;

/// One tolerance for everything
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

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

/// Check that every sample of a series is finite.
///
/// Reports the first offending index so readers can point at the sample.
pub fn ensure_all_finite(values: &[Real], what: &'static str) -> Result<(), CoreError> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(CoreError::NonFinite {
            what,
            value: values[index],
            index,
        }),
        None => Ok(()),
    }
}

/// True when no sample is smaller than its predecessor.
pub fn is_non_decreasing(values: &[Real]) -> bool {
    values.windows(2).all(|w| w[1] >= w[0])
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
    fn ensure_all_finite_detects_nan() {
        let err = ensure_all_finite(&[1.0, 2.0, Real::NAN], "test").unwrap_err();
        assert!(matches!(err, CoreError::NonFinite { index: 2, .. }));
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }

    #[test]
    fn monotonic_check() {
        assert!(is_non_decreasing(&[0.0, 1.0, 1.0, 2.0]));
        assert!(is_non_decreasing(&[]));
        assert!(!is_non_decreasing(&[0.0, 2.0, 1.0]));
    }
}
