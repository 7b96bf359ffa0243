//! Declarative report layout.
//!
//! A layout lists the grid slots and, per panel, the capability-keyed
//! variants that can fill it. The first variant whose required signals are
//! present wins; if none qualifies the panel becomes a placeholder. Summary
//! groups are declared the same way.

use std::collections::HashSet;
use std::path::Path;

use bp_core::Quantity;
use serde::{Deserialize, Serialize};

use crate::error::{ReportError, ReportResult};
use crate::resolve::PRIMARY_SIGNAL;

pub const LAYOUT_VERSION: u32 = 1;

const BUILTIN_BOILER_BASEBOARD: &str = include_str!("../layouts/boiler_baseboard.yaml");

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Layout {
    pub version: u32,
    pub title: String,
    /// Signal whose abscissa is tried first for the time base.
    #[serde(default = "default_time_signal")]
    pub time_signal: String,
    /// Setpoint shown in the subtitle when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setpoint_signal: Option<String>,
    pub grid: GridShape,
    pub slots: Vec<SlotDef>,
    #[serde(default)]
    pub summary: Vec<SummarySectionDef>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct GridShape {
    pub rows: usize,
    pub cols: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SlotDef {
    Panel(PanelDef),
    /// Grid position kept free.
    Reserved,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PanelDef {
    pub id: String,
    pub title: String,
    #[serde(default = "default_x_label")]
    pub x_label: String,
    /// Shown in place of the chart when no variant can be drawn.
    pub placeholder: String,
    pub variants: Vec<PanelVariantDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PanelVariantDef {
    pub primary: AxisDef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlay: Option<AxisDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AxisDef {
    pub label: String,
    pub quantity: Quantity,
    /// Tick and label color; default black.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<NamedColor>,
    #[serde(default)]
    pub require: Requirement,
    #[serde(default)]
    pub range: RangePolicy,
    pub lines: Vec<LineDef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<ReferenceDef>,
}

impl AxisDef {
    pub fn required_signals(&self) -> impl Iterator<Item = &str> {
        self.lines
            .iter()
            .filter(|l| l.required)
            .map(|l| l.signal.as_str())
    }
}

/// How the required lines of an axis gate it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Requirement {
    /// Every required line must be present.
    #[default]
    All,
    /// At least one required line must be present.
    Any,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RangePolicy {
    /// Fit the data.
    #[default]
    Auto,
    /// Zero to `factor` times the maximum, or `fallback` when the maximum
    /// is not positive.
    Headroom { factor: f64, fallback: f64 },
    Fixed { min: f64, max: f64 },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineDef {
    pub signal: String,
    pub label: String,
    pub color: NamedColor,
    #[serde(default)]
    pub style: LineStyle,
    #[serde(default = "default_line_width")]
    pub width: u32,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    #[serde(default = "default_true")]
    pub required: bool,
    /// Stored quantity when it differs from the axis (e.g. a series the
    /// model already emits in kBTU/h on a watts axis).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<Quantity>,
}

/// Horizontal line at the first sample of a signal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReferenceDef {
    pub signal: String,
    pub label: String,
    pub color: NamedColor,
    #[serde(default = "default_reference_style")]
    pub style: LineStyle,
    #[serde(default = "default_reference_opacity")]
    pub opacity: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NamedColor {
    Black,
    Blue,
    DarkBlue,
    Gray,
    Green,
    Orange,
    Purple,
    Red,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

/// One summary block; the first group whose gate is satisfied is printed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SummarySectionDef {
    pub groups: Vec<SummaryGroupDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SummaryGroupDef {
    pub title: String,
    /// Signals that must all be present for this group to be chosen.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub when_present: Vec<String>,
    pub lines: Vec<SummaryLineDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SummaryLineDef {
    pub label: String,
    pub metric: MetricDef,
    pub quantity: Quantity,
    #[serde(default = "default_precision")]
    pub precision: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "stat", rename_all = "snake_case")]
pub enum MetricDef {
    Mean { signal: String },
    Max { signal: String },
    Min { signal: String },
    First { signal: String },
    Last { signal: String },
    /// Last minus first sample.
    Rise { signal: String },
    /// Mean of `minuend` minus mean of `subtrahend`.
    MeanDifference { minuend: String, subtrahend: String },
}

impl MetricDef {
    pub fn signals(&self) -> Vec<&str> {
        match self {
            Self::Mean { signal }
            | Self::Max { signal }
            | Self::Min { signal }
            | Self::First { signal }
            | Self::Last { signal }
            | Self::Rise { signal } => vec![signal.as_str()],
            Self::MeanDifference {
                minuend,
                subtrahend,
            } => vec![minuend.as_str(), subtrahend.as_str()],
        }
    }
}

fn default_time_signal() -> String {
    PRIMARY_SIGNAL.to_string()
}

fn default_x_label() -> String {
    "Time (hours)".to_string()
}

fn default_line_width() -> u32 {
    2
}

fn default_opacity() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

fn default_reference_style() -> LineStyle {
    LineStyle::Dashed
}

fn default_reference_opacity() -> f64 {
    0.5
}

fn default_precision() -> usize {
    1
}

impl Layout {
    /// Boiler, primary/secondary pumps and baseboard loop.
    pub fn boiler_baseboard() -> ReportResult<Self> {
        let layout: Layout = serde_yaml::from_str(BUILTIN_BOILER_BASEBOARD)?;
        validate_layout(&layout)?;
        Ok(layout)
    }

    pub fn panels(&self) -> impl Iterator<Item = &PanelDef> {
        self.slots.iter().filter_map(|slot| match slot {
            SlotDef::Panel(panel) => Some(panel),
            SlotDef::Reserved => None,
        })
    }
}

pub fn load_yaml(path: &Path) -> ReportResult<Layout> {
    let content = std::fs::read_to_string(path).map_err(|source| ReportError::LayoutIo {
        path: path.to_path_buf(),
        source,
    })?;
    let layout: Layout = serde_yaml::from_str(&content)?;
    validate_layout(&layout)?;
    Ok(layout)
}

pub fn save_yaml(path: &Path, layout: &Layout) -> ReportResult<()> {
    validate_layout(layout)?;
    let content = serde_yaml::to_string(layout)?;
    std::fs::write(path, content).map_err(|source| ReportError::LayoutIo {
        path: path.to_path_buf(),
        source,
    })
}

pub fn validate_layout(layout: &Layout) -> ReportResult<()> {
    let invalid = |msg: String| Err(ReportError::LayoutInvalid(msg));

    if layout.version != LAYOUT_VERSION {
        return invalid(format!(
            "unsupported layout version {} (expected {})",
            layout.version, LAYOUT_VERSION
        ));
    }

    let cells = layout.grid.rows * layout.grid.cols;
    if cells == 0 {
        return invalid("grid must have at least one cell".to_string());
    }
    if cells != layout.slots.len() {
        return invalid(format!(
            "grid {}x{} has {} cells but {} slots are defined",
            layout.grid.rows,
            layout.grid.cols,
            cells,
            layout.slots.len()
        ));
    }

    let mut ids = HashSet::new();
    for panel in layout.panels() {
        if panel.id.trim().is_empty() {
            return invalid("panel id must not be empty".to_string());
        }
        if !ids.insert(panel.id.as_str()) {
            return invalid(format!("duplicate panel id '{}'", panel.id));
        }
        if panel.variants.is_empty() {
            return invalid(format!("panel '{}' has no variants", panel.id));
        }
        for variant in &panel.variants {
            validate_axis(&panel.id, &variant.primary)?;
            if let Some(overlay) = &variant.overlay {
                validate_axis(&panel.id, overlay)?;
            }
        }
    }

    for section in &layout.summary {
        if section.groups.is_empty() {
            return invalid("summary section has no groups".to_string());
        }
        for group in &section.groups {
            if group.lines.is_empty() {
                return invalid(format!("summary group '{}' has no lines", group.title));
            }
        }
    }

    Ok(())
}

fn validate_axis(panel_id: &str, axis: &AxisDef) -> ReportResult<()> {
    if axis.required_signals().next().is_none() {
        return Err(ReportError::LayoutInvalid(format!(
            "axis '{}' of panel '{}' has no required line",
            axis.label, panel_id
        )));
    }
    match axis.range {
        RangePolicy::Fixed { min, max } if !(min < max) => {
            Err(ReportError::LayoutInvalid(format!(
                "panel '{panel_id}': fixed range {min}..{max} is empty"
            )))
        }
        RangePolicy::Headroom { factor, fallback } if factor <= 0.0 || fallback <= 0.0 => {
            Err(ReportError::LayoutInvalid(format!(
                "panel '{panel_id}': headroom factor and fallback must be positive"
            )))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_layout_is_valid() {
        let layout = Layout::boiler_baseboard().unwrap();
        assert_eq!(layout.grid, GridShape { rows: 3, cols: 2 });
        assert_eq!(layout.slots.len(), 6);
        assert_eq!(layout.panels().count(), 5);
        assert_eq!(layout.slots[5], SlotDef::Reserved);
        assert_eq!(layout.time_signal, PRIMARY_SIGNAL);
    }

    #[test]
    fn rejects_grid_mismatch() {
        let mut layout = Layout::boiler_baseboard().unwrap();
        layout.slots.pop();
        assert!(matches!(
            validate_layout(&layout),
            Err(ReportError::LayoutInvalid(_))
        ));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let mut layout = Layout::boiler_baseboard().unwrap();
        let first = layout.slots[0].clone();
        layout.slots[1] = first;
        let err = validate_layout(&layout).unwrap_err();
        assert!(err.to_string().contains("duplicate panel id"));
    }

    #[test]
    fn rejects_unknown_version() {
        let mut layout = Layout::boiler_baseboard().unwrap();
        layout.version = 99;
        assert!(validate_layout(&layout).is_err());
    }

    #[test]
    fn rejects_empty_fixed_range() {
        let mut layout = Layout::boiler_baseboard().unwrap();
        if let SlotDef::Panel(panel) = &mut layout.slots[0] {
            panel.variants[0].primary.range = RangePolicy::Fixed { min: 5.0, max: 5.0 };
        }
        assert!(validate_layout(&layout).is_err());
    }

    #[test]
    fn metric_signals() {
        let m = MetricDef::MeanDifference {
            minuend: "a".to_string(),
            subtrahend: "b".to_string(),
        };
        assert_eq!(m.signals(), vec!["a", "b"]);
    }
}
