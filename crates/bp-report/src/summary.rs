//! Console summary of a run.

use std::fmt;

use bp_core::constants::SECONDS_PER_HOUR;

use crate::derive::format_quantity;
use crate::layout::{Layout, MetricDef, SummaryGroupDef, SummaryLineDef};
use crate::metrics;
use crate::resolve::SignalResolver;

/// Width of the `=` rules framing the summary.
pub const RULE_WIDTH: usize = 60;

pub const SUMMARY_TITLE: &str = "SIMULATION SUMMARY";

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    /// Final simulated time stamp, in seconds.
    pub end_time_s: f64,
    pub groups: Vec<SummaryGroup>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryGroup {
    pub title: String,
    pub lines: Vec<SummaryLine>,
}

/// A label and its formatted value with unit.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryLine {
    pub label: String,
    pub value: String,
}

impl Summary {
    pub fn group(&self, title: &str) -> Option<&SummaryGroup> {
        self.groups.iter().find(|g| g.title == title)
    }
}

impl SummaryGroup {
    pub fn line(&self, label: &str) -> Option<&SummaryLine> {
        self.lines.iter().find(|l| l.label == label)
    }
}

/// Build the summary for `layout`.
///
/// Each section prints its first group whose `when_present` signals all
/// resolve. Inside a group, a line is printed only when every signal behind
/// its metric is present; a group left without lines is dropped.
pub fn summarize(layout: &Layout, resolver: &mut SignalResolver<'_>) -> Summary {
    let end_time_s = resolver.time_base().end();

    let groups = layout
        .summary
        .iter()
        .filter_map(|section| {
            let group = section
                .groups
                .iter()
                .find(|g| g.when_present.iter().all(|s| resolver.is_present(s)))?;
            summarize_group(group, resolver)
        })
        .collect();

    Summary { end_time_s, groups }
}

fn summarize_group(def: &SummaryGroupDef, resolver: &mut SignalResolver<'_>) -> Option<SummaryGroup> {
    let lines: Vec<SummaryLine> = def
        .lines
        .iter()
        .filter_map(|line| {
            let value = evaluate(line, resolver)?;
            Some(SummaryLine {
                label: line.label.clone(),
                value: format_quantity(value, line.quantity, line.precision),
            })
        })
        .collect();

    if lines.is_empty() {
        tracing::debug!(group = %def.title, "summary group omitted");
        return None;
    }
    Some(SummaryGroup {
        title: def.title.clone(),
        lines,
    })
}

/// Statistic in display units, or `None` if a backing signal is missing.
fn evaluate(line: &SummaryLineDef, resolver: &mut SignalResolver<'_>) -> Option<f64> {
    let mut display = |signal: &str| -> Option<Vec<f64>> {
        let resolved = resolver.resolve(signal);
        let series = resolved.present()?;
        Some(line.quantity.to_display_all(series.values()))
    };

    // differences are taken in display units so affine conversions cancel
    match &line.metric {
        MetricDef::Mean { signal } => metrics::mean(&display(signal)?),
        MetricDef::Max { signal } => metrics::max(&display(signal)?),
        MetricDef::Min { signal } => metrics::min(&display(signal)?),
        MetricDef::First { signal } => metrics::first(&display(signal)?),
        MetricDef::Last { signal } => metrics::last(&display(signal)?),
        MetricDef::Rise { signal } => metrics::rise(&display(signal)?),
        MetricDef::MeanDifference {
            minuend,
            subtrahend,
        } => {
            let a = display(minuend)?;
            let b = display(subtrahend)?;
            metrics::mean_difference(&a, &b)
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(RULE_WIDTH);
        writeln!(f, "{rule}")?;
        writeln!(f, "{SUMMARY_TITLE}")?;
        writeln!(f, "{rule}")?;
        writeln!(
            f,
            "Simulation time: {:.2} hours ({:.0} seconds)",
            self.end_time_s / SECONDS_PER_HOUR,
            self.end_time_s
        )?;

        for group in &self.groups {
            writeln!(f)?;
            writeln!(f, "{}:", group.title)?;
            let width = group
                .lines
                .iter()
                .map(|l| l.label.chars().count())
                .max()
                .unwrap_or(0);
            for line in &group.lines {
                writeln!(f, "  {:<width$} {}", line.label, line.value)?;
            }
        }

        writeln!(f, "{rule}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bp_results::MemorySource;

    fn ramp(n: usize) -> Vec<f64> {
        (0..n).map(|i| i as f64).collect()
    }

    #[test]
    fn labels_align_within_group() {
        let summary = Summary {
            end_time_s: 7200.0,
            groups: vec![SummaryGroup {
                title: "Boiler Temperatures".to_string(),
                lines: vec![
                    SummaryLine {
                        label: "Average Inlet:".to_string(),
                        value: "160.0°F".to_string(),
                    },
                    SummaryLine {
                        label: "Average Outlet:".to_string(),
                        value: "180.0°F".to_string(),
                    },
                    SummaryLine {
                        label: "Average ΔT:".to_string(),
                        value: "20.0°F".to_string(),
                    },
                ],
            }],
        };
        let text = summary.to_string();
        let rule = "=".repeat(RULE_WIDTH);
        let expected = format!(
            "{rule}\nSIMULATION SUMMARY\n{rule}\n\
             Simulation time: 2.00 hours (7200 seconds)\n\
             \n\
             Boiler Temperatures:\n\
             \x20 Average Inlet:  160.0°F\n\
             \x20 Average Outlet: 180.0°F\n\
             \x20 Average ΔT:     20.0°F\n\
             {rule}\n"
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn temperature_differences_ignore_offset() {
        let layout = Layout::boiler_baseboard().unwrap();
        let src = MemorySource::new()
            .with_series("boiler.Q_actual", ramp(3), vec![1000.0; 3])
            .unwrap()
            .with_series("boiler.T_inlet", ramp(3), vec![340.0; 3])
            .unwrap()
            .with_series("boiler.T_outlet", ramp(3), vec![350.0; 3])
            .unwrap()
            .with_series("roomAir.T", ramp(3), vec![290.0, 291.0, 292.0])
            .unwrap();
        let mut resolver = SignalResolver::new(&src, &layout.time_signal).unwrap();
        let summary = summarize(&layout, &mut resolver);

        let boiler = summary.group("Boiler Temperatures").unwrap();
        assert_eq!(boiler.line("Average ΔT:").unwrap().value, "18.0°F");

        let room = summary.group("Room Temperature").unwrap();
        assert_eq!(room.line("Rise:").unwrap().value, "3.6°F");

        assert!(summary.group("Baseboard Temperatures").is_none());
        assert!(summary.group("Baseboard Supply").is_none());
        assert!(summary.group("Flow Rates").is_none());
    }

    #[test]
    fn baseboard_alternative_group() {
        let layout = Layout::boiler_baseboard().unwrap();
        let src = MemorySource::new()
            .with_series("boiler.Q_actual", ramp(2), vec![1000.0; 2])
            .unwrap()
            .with_series("baseboardSupplyTempSensor.T", ramp(2), vec![330.0, 340.0])
            .unwrap();
        let mut resolver = SignalResolver::new(&src, &layout.time_signal).unwrap();
        let summary = summarize(&layout, &mut resolver);

        let supply = summary.group("Baseboard Supply").unwrap();
        assert_eq!(supply.lines.len(), 2);
        assert_eq!(supply.line("Final Temperature:").unwrap().value, "152.3°F");
        assert!(summary.group("Baseboard Temperatures").is_none());
    }

    #[test]
    fn simulation_time_is_final_stamp() {
        let layout = Layout::boiler_baseboard().unwrap();
        let time: Vec<f64> = (0..=4).map(|i| 1800.0 + 450.0 * i as f64).collect();
        let src = MemorySource::new()
            .with_series("boiler.Q_actual", time, vec![1000.0; 5])
            .unwrap();
        let mut resolver = SignalResolver::new(&src, &layout.time_signal).unwrap();
        let summary = summarize(&layout, &mut resolver);

        assert_eq!(summary.end_time_s, 3600.0);
        assert!(
            summary
                .to_string()
                .contains("Simulation time: 1.00 hours (3600 seconds)\n")
        );
    }
}
