//! Report synthesis for hydronic heating simulation results.
//!
//! Resolves named signals against one time base, derives display-ready
//! series and statistics, composes the panel grid described by a
//! [`Layout`], renders it to PNG and formats the console summary.

pub mod compose;
pub mod derive;
pub mod error;
pub mod layout;
pub mod metrics;
pub mod render;
pub mod resolve;
pub mod signal;
pub mod summary;

// Re-export key types for convenience
pub use compose::{
    DEFAULT_SIZE, Legend, LegendEntry, PanelPlot, Placeholder, Report, ReportOptions,
    SlotOutcome, compose_report, merge_legends, output_path,
};
pub use derive::{Axis, Line, PanelOutcome, ReferenceLine, axis_range, derive_axis, derive_panel};
pub use error::{ReportError, ReportResult};
pub use layout::{Layout, load_yaml, save_yaml, validate_layout};
pub use render::{draw_report, render_png};
pub use resolve::{PRIMARY_SIGNAL, SignalResolver, TimeBase, resolve_time_base};
pub use signal::{LookupError, ResolveWarning, Series, Signal};
pub use summary::{Summary, SummaryGroup, SummaryLine, summarize};

use bp_results::DataSource;

/// Everything one report run produces, before anything is written.
#[derive(Debug, Clone)]
pub struct ReportRun {
    pub report: Report,
    pub summary: Summary,
    /// One entry per signal that resolved as missing.
    pub warnings: Vec<ResolveWarning>,
    /// Variable whose abscissa became the time base.
    pub time_origin: String,
}

/// Resolve, derive and compose a report for `source`.
///
/// Fails only when no time base can be found; missing signals degrade the
/// affected panels and summary lines.
pub fn build_report(
    source: &dyn DataSource,
    layout: &Layout,
    options: &ReportOptions,
) -> ReportResult<ReportRun> {
    let mut resolver = SignalResolver::new(source, &layout.time_signal)?;
    let report = compose_report(layout, &mut resolver, options);
    let summary = summarize(layout, &mut resolver);

    tracing::info!(
        rendered = report.rendered_count(),
        placeholders = report.placeholder_count(),
        warnings = resolver.warnings().len(),
        "report composed"
    );

    Ok(ReportRun {
        time_origin: resolver.time_base().origin().to_string(),
        warnings: resolver.warnings().to_vec(),
        report,
        summary,
    })
}
