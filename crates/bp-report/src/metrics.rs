//! Scalar statistics over present series.
//!
//! Every function returns `None` for an empty slice; callers only pass
//! series that resolved as present.

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

pub fn min(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::min)
}

pub fn first(values: &[f64]) -> Option<f64> {
    values.first().copied()
}

pub fn last(values: &[f64]) -> Option<f64> {
    values.last().copied()
}

/// End-minus-start change.
pub fn rise(values: &[f64]) -> Option<f64> {
    Some(last(values)? - first(values)?)
}

/// Mean of `a` minus mean of `b`.
pub fn mean_difference(a: &[f64], b: &[f64]) -> Option<f64> {
    Some(mean(a)? - mean(b)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_has_no_statistics() {
        assert_eq!(mean(&[]), None);
        assert_eq!(max(&[]), None);
        assert_eq!(rise(&[]), None);
        assert_eq!(mean_difference(&[1.0], &[]), None);
    }

    #[test]
    fn basic_statistics() {
        let v = [290.0, 291.0, 295.0, 294.0];
        assert_eq!(mean(&v), Some(292.5));
        assert_eq!(max(&v), Some(295.0));
        assert_eq!(min(&v), Some(290.0));
        assert_eq!(first(&v), Some(290.0));
        assert_eq!(last(&v), Some(294.0));
        assert_eq!(rise(&v), Some(4.0));
        assert_eq!(mean_difference(&[3.0, 5.0], &[1.0, 1.0]), Some(3.0));
    }
}
