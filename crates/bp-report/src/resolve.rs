//! Time-base and signal resolution.
//!
//! This is the boundary between the result file and the rest of the report:
//! nothing past it sees a reader error. A signal that cannot be used becomes
//! [`Signal::Missing`] and produces one warning for the operator.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use bp_core::{constants::SECONDS_PER_HOUR, ensure_all_finite, is_non_decreasing, CoreError};
use bp_results::DataSource;

use crate::error::{ReportError, ReportResult};
use crate::signal::{LookupError, ResolveWarning, Series, Signal};

/// Main heat-output signal; its abscissa is the preferred time base.
pub const PRIMARY_SIGNAL: &str = "boiler.Q_actual";

/// Authoritative sample times for one report run.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeBase {
    seconds: Arc<[f64]>,
    origin: String,
}

impl TimeBase {
    /// Build a time base. Fails on empty, non-finite or decreasing input.
    pub fn new(seconds: Vec<f64>, origin: impl Into<String>) -> Result<Self, String> {
        if seconds.is_empty() {
            return Err("time vector is empty".to_string());
        }
        ensure_all_finite(&seconds, "time").map_err(|e| e.to_string())?;
        if !is_non_decreasing(&seconds) {
            return Err("time vector decreases".to_string());
        }
        Ok(Self {
            seconds: seconds.into(),
            origin: origin.into(),
        })
    }

    pub fn seconds(&self) -> &[f64] {
        &self.seconds
    }

    /// Shared handle to the samples, for panels that plot against them.
    pub fn shared_seconds(&self) -> Arc<[f64]> {
        Arc::clone(&self.seconds)
    }

    pub fn hours(&self) -> Vec<f64> {
        self.seconds.iter().map(|t| t / SECONDS_PER_HOUR).collect()
    }

    /// Variable whose abscissa supplied these samples.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn len(&self) -> usize {
        self.seconds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seconds.is_empty()
    }

    /// Final time stamp, in seconds.
    pub fn end(&self) -> f64 {
        self.seconds[self.seconds.len() - 1]
    }
}

/// Resolve the run's time base.
///
/// Tries the abscissa of `primary`, then the abscissa of the first variable
/// in the source. Anything else is fatal for the report.
pub fn resolve_time_base(source: &dyn DataSource, primary: &str) -> ReportResult<TimeBase> {
    let primary_err = match source
        .time_abscissa(primary)
        .map_err(|e| e.to_string())
        .and_then(|t| TimeBase::new(t, primary))
    {
        Ok(time) => return Ok(time),
        Err(reason) => reason,
    };
    tracing::debug!(signal = primary, reason = %primary_err, "primary time base unavailable");

    let Some(first) = source.variable_names().first() else {
        return Err(ReportError::NoTimeBase {
            reason: format!("{primary}: {primary_err}; source lists no variables"),
        });
    };

    source
        .time_abscissa(first)
        .map_err(|e| e.to_string())
        .and_then(|t| TimeBase::new(t, first.as_str()))
        .map_err(|fallback_err| ReportError::NoTimeBase {
            reason: format!("{primary}: {primary_err}; {first}: {fallback_err}"),
        })
}

/// Resolves named signals against one time base, once each.
pub struct SignalResolver<'a> {
    source: &'a dyn DataSource,
    time: TimeBase,
    signals: HashMap<String, Signal>,
    constants: HashMap<String, Option<f64>>,
    warned: HashSet<String>,
    warnings: Vec<ResolveWarning>,
}

impl<'a> SignalResolver<'a> {
    /// Resolve the time base (see [`resolve_time_base`]) and start a resolver.
    pub fn new(source: &'a dyn DataSource, primary: &str) -> ReportResult<Self> {
        let time = resolve_time_base(source, primary)?;
        tracing::debug!(origin = time.origin(), samples = time.len(), "time base resolved");
        Ok(Self::with_time_base(source, time))
    }

    pub fn with_time_base(source: &'a dyn DataSource, time: TimeBase) -> Self {
        Self {
            source,
            time,
            signals: HashMap::new(),
            constants: HashMap::new(),
            warned: HashSet::new(),
            warnings: Vec::new(),
        }
    }

    pub fn time_base(&self) -> &TimeBase {
        &self.time
    }

    /// Look up a series by exact name. Never fails: unusable data comes
    /// back as [`Signal::Missing`].
    pub fn resolve(&mut self, name: &str) -> Signal {
        if let Some(signal) = self.signals.get(name) {
            return signal.clone();
        }

        let signal = match self.read_series(name) {
            Ok(values) => Signal::Present(Series::new(name, values)),
            Err(reason) => {
                self.warn(name, reason.clone());
                Signal::Missing {
                    name: name.to_string(),
                    reason,
                }
            }
        };
        self.signals.insert(name.to_string(), signal.clone());
        signal
    }

    pub fn is_present(&mut self, name: &str) -> bool {
        self.resolve(name).is_present()
    }

    /// First sample of a reference signal (setpoint, limit, bound).
    ///
    /// Constants are often stored with their own short abscissa, so the
    /// length is not checked against the time base.
    pub fn resolve_constant(&mut self, name: &str) -> Option<f64> {
        if let Some(value) = self.constants.get(name) {
            return *value;
        }

        let value = match self.read_constant(name) {
            Ok((first, varies)) => {
                if varies {
                    tracing::debug!(signal = name, "reference varies over the run; using first sample");
                }
                Some(first)
            }
            Err(reason) => {
                self.warn(name, reason);
                None
            }
        };
        self.constants.insert(name.to_string(), value);
        value
    }

    /// Every warning issued so far, in order.
    pub fn warnings(&self) -> &[ResolveWarning] {
        &self.warnings
    }

    fn read_series(&self, name: &str) -> Result<Vec<f64>, LookupError> {
        let values = self.read(name)?;
        if values.len() != self.time.len() {
            return Err(LookupError::LengthMismatch {
                len: values.len(),
                expected: self.time.len(),
            });
        }
        Ok(values)
    }

    fn read_constant(&self, name: &str) -> Result<(f64, bool), LookupError> {
        let values = self.read(name)?;
        let first = values[0];
        let varies = values.iter().any(|v| *v != first);
        Ok((first, varies))
    }

    fn read(&self, name: &str) -> Result<Vec<f64>, LookupError> {
        let values = self.source.values(name).map_err(|e| match e {
            bp_results::ResultsError::UnknownVariable { .. } => LookupError::NotFound,
            other => LookupError::Read {
                message: other.to_string(),
            },
        })?;
        if values.is_empty() {
            return Err(LookupError::Empty);
        }
        ensure_all_finite(&values, "signal")
            .map_err(|CoreError::NonFinite { index, .. }| LookupError::NonFinite { index })?;
        Ok(values)
    }

    fn warn(&mut self, name: &str, reason: LookupError) {
        if !self.warned.insert(name.to_string()) {
            return;
        }
        let warning = ResolveWarning {
            name: name.to_string(),
            reason,
        };
        tracing::warn!(signal = name, "{warning}");
        self.warnings.push(warning);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bp_results::MemorySource;

    fn ramp(n: usize) -> Vec<f64> {
        (0..n).map(|i| i as f64).collect()
    }

    fn source() -> MemorySource {
        MemorySource::new()
            .with_series("time", ramp(4), ramp(4))
            .unwrap()
            .with_series(PRIMARY_SIGNAL, ramp(4), vec![1.0, 2.0, 3.0, 4.0])
            .unwrap()
            .with_series("roomAir.T", ramp(4), vec![290.0; 4])
            .unwrap()
            .with_series("setpoint", vec![0.0, 3.0], vec![355.0, 355.0])
            .unwrap()
            .with_series("bad", ramp(4), vec![1.0, f64::NAN, 1.0, 1.0])
            .unwrap()
    }

    #[test]
    fn primary_time_base_preferred() {
        let src = source();
        let time = resolve_time_base(&src, PRIMARY_SIGNAL).unwrap();
        assert_eq!(time.origin(), PRIMARY_SIGNAL);
        assert_eq!(time.len(), 4);
        assert_eq!(time.end(), 3.0);
    }

    #[test]
    fn falls_back_to_first_variable() {
        let src = MemorySource::new()
            .with_series("time", ramp(5), ramp(5))
            .unwrap();
        let time = resolve_time_base(&src, PRIMARY_SIGNAL).unwrap();
        assert_eq!(time.origin(), "time");
        assert_eq!(time.len(), 5);
    }

    #[test]
    fn no_time_data_is_fatal() {
        let empty = MemorySource::new();
        assert!(matches!(
            resolve_time_base(&empty, PRIMARY_SIGNAL),
            Err(ReportError::NoTimeBase { .. })
        ));

        let no_samples = MemorySource::new()
            .with_series("time", vec![], vec![])
            .unwrap();
        assert!(matches!(
            resolve_time_base(&no_samples, PRIMARY_SIGNAL),
            Err(ReportError::NoTimeBase { .. })
        ));
    }

    #[test]
    fn decreasing_time_is_rejected() {
        assert!(TimeBase::new(vec![0.0, 2.0, 1.0], "t").is_err());
        assert!(TimeBase::new(vec![0.0, 0.0, 1.0], "t").is_ok());
    }

    #[test]
    fn present_signal_matches_time_base() {
        let src = source();
        let mut resolver = SignalResolver::new(&src, PRIMARY_SIGNAL).unwrap();
        let signal = resolver.resolve("roomAir.T");
        let series = signal.present().unwrap();
        assert_eq!(series.len(), resolver.time_base().len());
        assert!(resolver.warnings().is_empty());
    }

    #[test]
    fn missing_warns_exactly_once() {
        let src = source();
        let mut resolver = SignalResolver::new(&src, PRIMARY_SIGNAL).unwrap();
        for _ in 0..3 {
            let signal = resolver.resolve("boiler.T_outlet");
            assert_eq!(
                signal,
                Signal::Missing {
                    name: "boiler.T_outlet".to_string(),
                    reason: LookupError::NotFound,
                }
            );
        }
        assert_eq!(resolver.warnings().len(), 1);
        assert_eq!(resolver.warnings()[0].name, "boiler.T_outlet");
    }

    #[test]
    fn malformed_series_are_missing() {
        let src = source();
        let mut resolver = SignalResolver::new(&src, PRIMARY_SIGNAL).unwrap();
        assert!(matches!(
            resolver.resolve("bad"),
            Signal::Missing {
                reason: LookupError::NonFinite { index: 1 },
                ..
            }
        ));
        assert!(matches!(
            resolver.resolve("setpoint"),
            Signal::Missing {
                reason: LookupError::LengthMismatch { len: 2, expected: 4 },
                ..
            }
        ));
        assert_eq!(resolver.warnings().len(), 2);
    }

    #[test]
    fn constants_use_first_sample() {
        let src = source();
        let mut resolver = SignalResolver::new(&src, PRIMARY_SIGNAL).unwrap();
        assert_eq!(resolver.resolve_constant("setpoint"), Some(355.0));
        assert_eq!(resolver.resolve_constant("nope"), None);
        assert_eq!(resolver.resolve_constant("nope"), None);
        assert_eq!(resolver.warnings().len(), 1);
    }
}
