//! Panel grid composition.
//!
//! Walks the layout slots in order and settles each one as rendered,
//! placeholder or reserved. The resulting [`Report`] owns everything the
//! renderer needs; nothing is drawn here.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bp_core::{Quantity, kelvin_to_fahrenheit};

use crate::derive::{Axis, PanelOutcome, derive_panel, format_quantity};
use crate::layout::{GridShape, Layout, LineStyle, NamedColor, PanelDef, SlotDef};
use crate::resolve::SignalResolver;

/// Suffix that replaces the input extension on the image artifact.
pub const OUTPUT_SUFFIX: &str = "_plots.png";

/// 14x12 in at 150 dpi.
pub const DEFAULT_SIZE: (u32, u32) = (2100, 1800);

/// Per-run options that do not come from the data.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportOptions {
    /// Appended to the subtitle as `Generated: ...` when set.
    pub generated_at: Option<String>,
    /// Canvas size in pixels.
    pub size: (u32, u32),
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            generated_at: None,
            size: DEFAULT_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub title: String,
    pub subtitle: Option<String>,
    pub grid: GridShape,
    /// One entry per grid cell, row-major.
    pub slots: Vec<SlotOutcome>,
}

impl Report {
    pub fn rendered_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| matches!(s, SlotOutcome::Rendered(_)))
            .count()
    }

    pub fn placeholder_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| matches!(s, SlotOutcome::Placeholder(_)))
            .count()
    }

    pub fn panel(&self, id: &str) -> Option<&SlotOutcome> {
        self.slots.iter().find(|s| s.id() == Some(id))
    }
}

/// Terminal state of one grid cell.
#[derive(Debug, Clone, PartialEq)]
pub enum SlotOutcome {
    Rendered(PanelPlot),
    Placeholder(Placeholder),
    Reserved,
}

impl SlotOutcome {
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Rendered(plot) => Some(&plot.id),
            Self::Placeholder(placeholder) => Some(&placeholder.id),
            Self::Reserved => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PanelPlot {
    pub id: String,
    pub title: String,
    pub x_label: String,
    pub time_hours: Arc<[f64]>,
    pub primary: Axis,
    /// Second scale on the right, sharing the time axis.
    pub overlay: Option<Axis>,
    pub legend: Legend,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Placeholder {
    pub id: String,
    pub title: String,
    pub message: String,
    pub missing: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Legend {
    pub entries: Vec<LegendEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub label: String,
    pub color: NamedColor,
    pub style: LineStyle,
    pub opacity: f64,
}

impl Legend {
    /// Entries for everything drawn against one axis: lines, then references.
    pub fn for_axis(axis: &Axis) -> Self {
        let lines = axis.lines.iter().map(|l| LegendEntry {
            label: l.label.clone(),
            color: l.color,
            style: l.style,
            opacity: l.opacity,
        });
        let references = axis.references.iter().map(|r| LegendEntry {
            label: r.label.clone(),
            color: r.color,
            style: r.style,
            opacity: r.opacity,
        });
        Self {
            entries: lines.chain(references).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Single legend for a dual-axis panel: primary entries first.
pub fn merge_legends(primary: Legend, overlay: Legend) -> Legend {
    let mut entries = primary.entries;
    entries.extend(overlay.entries);
    Legend { entries }
}

/// Settle every slot of `layout` against the resolved signals.
pub fn compose_report(
    layout: &Layout,
    resolver: &mut SignalResolver<'_>,
    options: &ReportOptions,
) -> Report {
    let time_hours: Arc<[f64]> = resolver.time_base().hours().into();

    let slots = layout
        .slots
        .iter()
        .map(|slot| match slot {
            SlotDef::Panel(panel) => compose_panel(panel, resolver, &time_hours),
            SlotDef::Reserved => SlotOutcome::Reserved,
        })
        .collect();

    Report {
        title: layout.title.clone(),
        subtitle: subtitle(layout, resolver, options),
        grid: layout.grid,
        slots,
    }
}

fn compose_panel(
    panel: &PanelDef,
    resolver: &mut SignalResolver<'_>,
    time_hours: &Arc<[f64]>,
) -> SlotOutcome {
    match derive_panel(panel, resolver) {
        PanelOutcome::Drawn {
            variant,
            primary,
            overlay,
        } => {
            let mut legend = Legend::for_axis(&primary);
            if let Some(overlay) = &overlay {
                legend = merge_legends(legend, Legend::for_axis(overlay));
            }
            tracing::debug!(
                panel = %panel.id,
                variant,
                overlay = overlay.is_some(),
                "panel rendered"
            );
            SlotOutcome::Rendered(PanelPlot {
                id: panel.id.clone(),
                title: panel.title.clone(),
                x_label: panel.x_label.clone(),
                time_hours: Arc::clone(time_hours),
                primary,
                overlay,
                legend,
            })
        }
        PanelOutcome::Unavailable { missing } => {
            tracing::info!(panel = %panel.id, missing = ?missing, "panel shown as placeholder");
            SlotOutcome::Placeholder(Placeholder {
                id: panel.id.clone(),
                title: panel.title.clone(),
                message: panel.placeholder.clone(),
                missing,
            })
        }
    }
}

fn subtitle(
    layout: &Layout,
    resolver: &mut SignalResolver<'_>,
    options: &ReportOptions,
) -> Option<String> {
    let mut parts = Vec::new();
    let setpoint = layout
        .setpoint_signal
        .as_deref()
        .and_then(|signal| resolver.resolve_constant(signal));
    if let Some(kelvin) = setpoint {
        let setpoint = format_quantity(kelvin_to_fahrenheit(kelvin), Quantity::Temperature, 0);
        parts.push(format!("Setpoint: {setpoint}"));
    }
    if let Some(stamp) = &options.generated_at {
        parts.push(format!("Generated: {stamp}"));
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" | "))
    }
}

/// Image path for an input file: `run.mat` becomes `run_plots.png` next to it.
pub fn output_path(input: &Path) -> PathBuf {
    let mut name = input
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_else(|| "report".into());
    name.push(OUTPUT_SUFFIX);
    input.with_file_name(name)
}
