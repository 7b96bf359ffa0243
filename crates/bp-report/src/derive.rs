//! Report-ready quantities: converted series, reference levels and axis
//! ranges, computed from resolved signals and an axis definition.

use bp_core::Quantity;

use crate::layout::{AxisDef, LineStyle, NamedColor, PanelDef, RangePolicy, Requirement};
use crate::resolve::SignalResolver;

/// Relative padding applied to data-fitted ranges.
const AUTO_PADDING: f64 = 0.05;

/// One plotted series in display units.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub signal: String,
    pub label: String,
    pub color: NamedColor,
    pub style: LineStyle,
    pub width: u32,
    pub opacity: f64,
    pub values: Vec<f64>,
}

/// Horizontal reference at a constant level, in display units.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceLine {
    pub signal: String,
    pub label: String,
    pub color: NamedColor,
    pub style: LineStyle,
    pub opacity: f64,
    pub value: f64,
}

/// One vertical scale of a panel and everything drawn against it.
#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    pub label: String,
    pub color: NamedColor,
    pub range: (f64, f64),
    pub lines: Vec<Line>,
    pub references: Vec<ReferenceLine>,
}

/// Result of checking a panel's variants against the resolved signals.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelOutcome {
    Drawn {
        /// Index of the variant that qualified.
        variant: usize,
        primary: Axis,
        overlay: Option<Axis>,
    },
    /// No variant qualified; lists the required signals that were missing.
    Unavailable { missing: Vec<String> },
}

/// Pick the first variant whose primary axis qualifies and derive it.
///
/// The overlay degrades on its own: if its signals are missing the panel
/// is still drawn, just without the second scale.
pub fn derive_panel(panel: &PanelDef, resolver: &mut SignalResolver<'_>) -> PanelOutcome {
    let mut missing: Vec<String> = Vec::new();

    for (index, variant) in panel.variants.iter().enumerate() {
        match derive_axis(&variant.primary, resolver) {
            Ok(primary) => {
                let overlay = match &variant.overlay {
                    Some(def) => match derive_axis(def, resolver) {
                        Ok(axis) => Some(axis),
                        Err(absent) => {
                            tracing::debug!(
                                panel = %panel.id,
                                missing = ?absent,
                                "overlay skipped"
                            );
                            None
                        }
                    },
                    None => None,
                };
                return PanelOutcome::Drawn {
                    variant: index,
                    primary,
                    overlay,
                };
            }
            Err(absent) => {
                for name in absent {
                    if !missing.contains(&name) {
                        missing.push(name);
                    }
                }
            }
        }
    }

    PanelOutcome::Unavailable { missing }
}

/// Resolve and convert the lines of one axis.
///
/// Fails with the names of the missing required signals when the axis
/// requirement is not met. Optional lines and references that are missing
/// are dropped silently (the resolver has already warned).
pub fn derive_axis(def: &AxisDef, resolver: &mut SignalResolver<'_>) -> Result<Axis, Vec<String>> {
    let mut lines = Vec::new();
    let mut missing_required = Vec::new();
    let mut present_required = 0usize;

    for line in &def.lines {
        let signal = resolver.resolve(&line.signal);
        let Some(series) = signal.present() else {
            if line.required {
                missing_required.push(line.signal.clone());
            }
            continue;
        };
        if line.required {
            present_required += 1;
        }
        let quantity = line.quantity.unwrap_or(def.quantity);
        lines.push(Line {
            signal: line.signal.clone(),
            label: line.label.clone(),
            color: line.color,
            style: line.style,
            width: line.width,
            opacity: line.opacity,
            values: quantity.to_display_all(series.values()),
        });
    }

    let satisfied = match def.require {
        Requirement::All => missing_required.is_empty(),
        Requirement::Any => present_required > 0,
    };
    if !satisfied {
        return Err(missing_required);
    }

    let references: Vec<ReferenceLine> = def
        .references
        .iter()
        .filter_map(|reference| {
            let value = def.quantity.to_display(resolver.resolve_constant(&reference.signal)?);
            Some(ReferenceLine {
                signal: reference.signal.clone(),
                label: reference_label(&reference.label, value, def.quantity),
                color: reference.color,
                style: reference.style,
                opacity: reference.opacity,
                value,
            })
        })
        .collect();

    let range = axis_range(
        def.range,
        lines
            .iter()
            .flat_map(|l| l.values.iter().copied())
            .chain(references.iter().map(|r| r.value)),
    );

    Ok(Axis {
        label: def.label.clone(),
        color: def.color.unwrap_or(NamedColor::Black),
        range,
        lines,
        references,
    })
}

/// Vertical range for an axis under `policy`.
pub fn axis_range(policy: RangePolicy, values: impl IntoIterator<Item = f64>) -> (f64, f64) {
    match policy {
        RangePolicy::Fixed { min, max } => (min, max),
        RangePolicy::Headroom { factor, fallback } => {
            let max = values.into_iter().fold(f64::NEG_INFINITY, f64::max);
            if max > 0.0 {
                (0.0, max * factor)
            } else {
                (0.0, fallback)
            }
        }
        RangePolicy::Auto => {
            let (lo, hi) = values
                .into_iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                    (lo.min(v), hi.max(v))
                });
            if lo > hi {
                return (0.0, 1.0);
            }
            let span = hi - lo;
            if span <= f64::EPSILON * hi.abs().max(1.0) {
                (lo - 1.0, hi + 1.0)
            } else {
                (lo - span * AUTO_PADDING, hi + span * AUTO_PADDING)
            }
        }
    }
}

/// Legend label for a reference level, e.g. `Setpoint (180°F)`.
pub fn reference_label(label: &str, value: f64, quantity: Quantity) -> String {
    format!("{label} ({})", format_quantity(value, quantity, 0))
}

/// Value with its display unit: `185.3°F`, `45.2 kBTU/h`, `5.3 GPM`.
pub fn format_quantity(value: f64, quantity: Quantity, precision: usize) -> String {
    let unit = quantity.unit_label();
    match unit {
        "" => format!("{value:.precision$}"),
        "°F" | "%" => format!("{value:.precision$}{unit}"),
        _ => format!("{value:.precision$} {unit}"),
    }
}
