//! PNG rendering of a composed [`Report`] with plotters.

use std::ops::Range;
use std::path::Path;

use plotters::chart::DualCoordChartContext;
use plotters::coord::Shift;
use plotters::coord::types::RangedCoordf64;
use plotters::element::DashedPathElement;
use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::compose::{Legend, PanelPlot, Placeholder, Report, SlotOutcome};
use crate::derive::{Axis, Line, ReferenceLine};
use crate::error::{ReportError, ReportResult};
use crate::layout::{LineStyle, NamedColor};

const FONT: &str = "sans-serif";
const TITLE_SIZE: f64 = 36.0;
const SUBTITLE_SIZE: f64 = 22.0;
const PANEL_TITLE_SIZE: f64 = 22.0;
const LABEL_SIZE: f64 = 15.0;
const LEGEND_SIZE: f64 = 13.0;

/// Dash length and gap, in pixels.
const DASH: (u32, u32) = (12, 6);
const DOT: (u32, u32) = (2, 4);

/// Write `report` as a PNG of `size` pixels, replacing any existing file.
pub fn render_png(report: &Report, path: &Path, size: (u32, u32)) -> ReportResult<()> {
    let root = BitMapBackend::new(path, size).into_drawing_area();
    draw_report(&root, report)?;
    root.present().map_err(render_err)?;
    tracing::debug!(path = %path.display(), width = size.0, height = size.1, "report image written");
    Ok(())
}

/// Draw the full grid onto any plotters backend.
pub fn draw_report<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    report: &Report,
) -> ReportResult<()> {
    root.fill(&WHITE).map_err(render_err)?;

    let title_font = (FONT, TITLE_SIZE).into_font().style(FontStyle::Bold);
    let mut body = root.titled(&report.title, title_font).map_err(render_err)?;
    if let Some(subtitle) = &report.subtitle {
        body = body
            .titled(subtitle, (FONT, SUBTITLE_SIZE))
            .map_err(render_err)?;
    }

    let cells = body.split_evenly((report.grid.rows, report.grid.cols));
    for (cell, slot) in cells.iter().zip(&report.slots) {
        match slot {
            SlotOutcome::Rendered(plot) => draw_panel(cell, plot)?,
            SlotOutcome::Placeholder(placeholder) => draw_placeholder(cell, placeholder)?,
            SlotOutcome::Reserved => {}
        }
    }
    Ok(())
}

type TimeChart<'a, DB> = ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>;
type DualTimeChart<'a, DB> = DualCoordChartContext<
    'a,
    DB,
    Cartesian2d<RangedCoordf64, RangedCoordf64>,
    Cartesian2d<RangedCoordf64, RangedCoordf64>,
>;

fn draw_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    plot: &PanelPlot,
) -> ReportResult<()> {
    let x_range = time_range(&plot.time_hours);

    let mut builder = ChartBuilder::on(area);
    builder
        .caption(
            &plot.title,
            (FONT, PANEL_TITLE_SIZE).into_font().style(FontStyle::Bold),
        )
        .margin(12)
        .x_label_area_size(45)
        .y_label_area_size(70);
    if plot.overlay.is_some() {
        builder.right_y_label_area_size(70);
    }
    let mut chart = builder
        .build_cartesian_2d(x_range.clone(), to_range(plot.primary.range))
        .map_err(render_err)?;

    // The secondary coordinate claims the right label area; it has to exist
    // before the primary mesh draws its labels.
    let plotting_area = match &plot.overlay {
        Some(overlay) => {
            let mut chart = chart.set_secondary_coord(x_range.clone(), to_range(overlay.range));
            let plotting_area = draw_primary(&mut *chart, plot, &x_range)?;
            draw_overlay(&mut chart, &plot.time_hours, overlay)?;
            plotting_area
        }
        None => draw_primary(&mut chart, plot, &x_range)?,
    };
    draw_legend(&plotting_area, &plot.legend)
}

/// Mesh, left axis, lines and references; returns the bare plotting area.
fn draw_primary<DB: DrawingBackend>(
    chart: &mut TimeChart<'_, DB>,
    plot: &PanelPlot,
    x_range: &Range<f64>,
) -> ReportResult<DrawingArea<DB, Shift>> {
    let primary_color = rgb(plot.primary.color);
    chart
        .configure_mesh()
        .x_desc(&plot.x_label)
        .y_desc(&plot.primary.label)
        .light_line_style(&BLACK.mix(0.05))
        .bold_line_style(&BLACK.mix(0.15))
        .label_style((FONT, LABEL_SIZE))
        .y_label_style((FONT, LABEL_SIZE).into_font().color(&primary_color))
        .axis_desc_style((FONT, LABEL_SIZE).into_font().color(&primary_color))
        .draw()
        .map_err(render_err)?;

    for line in &plot.primary.lines {
        let data = points(&plot.time_hours, line);
        let style = stroke(line.color, line.opacity, line.width);
        match line.style {
            LineStyle::Solid => chart.draw_series(LineSeries::new(data, style)),
            LineStyle::Dashed => {
                chart.draw_series(DashedLineSeries::new(data, DASH.0, DASH.1, style))
            }
            LineStyle::Dotted => chart.draw_series(DashedLineSeries::new(data, DOT.0, DOT.1, style)),
        }
        .map_err(render_err)?;
    }
    for reference in &plot.primary.references {
        let data = reference_points(x_range, reference);
        let style = stroke(reference.color, reference.opacity, 2);
        match reference.style {
            LineStyle::Solid => chart.draw_series(LineSeries::new(data, style)),
            LineStyle::Dashed => {
                chart.draw_series(DashedLineSeries::new(data, DASH.0, DASH.1, style))
            }
            LineStyle::Dotted => chart.draw_series(DashedLineSeries::new(data, DOT.0, DOT.1, style)),
        }
        .map_err(render_err)?;
    }

    Ok(chart.plotting_area().strip_coord_spec())
}

/// Right axis in the overlay color, then the overlay lines on its scale.
fn draw_overlay<DB: DrawingBackend>(
    chart: &mut DualTimeChart<'_, DB>,
    time_hours: &[f64],
    overlay: &Axis,
) -> ReportResult<()> {
    let color = rgb(overlay.color);
    chart
        .configure_secondary_axes()
        .y_desc(&overlay.label)
        .label_style((FONT, LABEL_SIZE).into_font().color(&color))
        .axis_desc_style((FONT, LABEL_SIZE).into_font().color(&color))
        .draw()
        .map_err(render_err)?;

    for line in &overlay.lines {
        let data = points(time_hours, line);
        let style = stroke(line.color, line.opacity, line.width);
        match line.style {
            LineStyle::Solid => chart.draw_secondary_series(LineSeries::new(data, style)),
            LineStyle::Dashed => chart.draw_secondary_series(DashedLineSeries::new(
                data, DASH.0, DASH.1, style,
            )),
            LineStyle::Dotted => {
                chart.draw_secondary_series(DashedLineSeries::new(data, DOT.0, DOT.1, style))
            }
        }
        .map_err(render_err)?;
    }
    Ok(())
}

fn draw_placeholder<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    placeholder: &Placeholder,
) -> ReportResult<()> {
    let body = area
        .titled(
            &placeholder.title,
            (FONT, PANEL_TITLE_SIZE).into_font().style(FontStyle::Bold),
        )
        .map_err(render_err)?;
    let (w, h) = body.dim_in_pixel();
    let style = (FONT, LABEL_SIZE + 3.0)
        .into_font()
        .color(&BLACK.mix(0.7))
        .pos(Pos::new(HPos::Center, VPos::Center));
    body.draw(&Text::new(
        placeholder.message.as_str(),
        (w as i32 / 2, h as i32 / 2),
        style,
    ))
    .map_err(render_err)
}

/// Merged legend in the upper right corner of the plotting area.
fn draw_legend<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, legend: &Legend) -> ReportResult<()> {
    if legend.is_empty() {
        return Ok(());
    }

    let (w, _) = area.dim_in_pixel();
    let row = LEGEND_SIZE as i32 + 7;
    let sample = 30;
    let longest = legend
        .entries
        .iter()
        .map(|e| e.label.chars().count())
        .max()
        .unwrap_or(0) as i32;
    let box_w = sample + 20 + longest * (LEGEND_SIZE as i32) * 6 / 10;
    let box_h = row * legend.entries.len() as i32 + 8;
    let x0 = (w as i32 - box_w - 8).max(0);
    let y0 = 8;
    let corners = [(x0, y0), (x0 + box_w, y0 + box_h)];

    area.draw(&Rectangle::new(corners, WHITE.mix(0.85).filled()))
        .map_err(render_err)?;
    area.draw(&Rectangle::new(corners, BLACK.mix(0.3).stroke_width(1)))
        .map_err(render_err)?;

    for (i, entry) in legend.entries.iter().enumerate() {
        let y = y0 + 4 + row * i as i32 + row / 2;
        let path = vec![(x0 + 6, y), (x0 + 6 + sample, y)];
        let style = stroke(entry.color, entry.opacity, 2);
        match entry.style {
            LineStyle::Solid => area.draw(&PathElement::new(path, style)),
            LineStyle::Dashed => area.draw(&DashedPathElement::new(path, 8, 4, style)),
            LineStyle::Dotted => area.draw(&DashedPathElement::new(path, DOT.0, DOT.1, style)),
        }
        .map_err(render_err)?;

        let text_style = (FONT, LEGEND_SIZE)
            .into_font()
            .color(&BLACK)
            .pos(Pos::new(HPos::Left, VPos::Center));
        area.draw(&Text::new(
            entry.label.as_str(),
            (x0 + sample + 12, y),
            text_style,
        ))
        .map_err(render_err)?;
    }
    Ok(())
}

fn points(time_hours: &[f64], line: &Line) -> Vec<(f64, f64)> {
    time_hours
        .iter()
        .copied()
        .zip(line.values.iter().copied())
        .collect()
}

fn reference_points(x_range: &Range<f64>, reference: &ReferenceLine) -> Vec<(f64, f64)> {
    vec![
        (x_range.start, reference.value),
        (x_range.end, reference.value),
    ]
}

fn time_range(hours: &[f64]) -> Range<f64> {
    match (hours.first(), hours.last()) {
        (Some(&start), Some(&end)) if end > start => start..end,
        (Some(&start), _) => start..start + 1.0,
        _ => 0.0..1.0,
    }
}

fn to_range((min, max): (f64, f64)) -> Range<f64> {
    min..max
}

fn stroke(color: NamedColor, opacity: f64, width: u32) -> ShapeStyle {
    rgb(color).mix(opacity).stroke_width(width)
}

pub(crate) fn rgb(color: NamedColor) -> RGBColor {
    match color {
        NamedColor::Black => RGBColor(0, 0, 0),
        NamedColor::Blue => RGBColor(0, 0, 255),
        NamedColor::DarkBlue => RGBColor(0, 0, 139),
        NamedColor::Gray => RGBColor(128, 128, 128),
        NamedColor::Green => RGBColor(0, 128, 0),
        NamedColor::Orange => RGBColor(255, 165, 0),
        NamedColor::Purple => RGBColor(128, 0, 128),
        NamedColor::Red => RGBColor(255, 0, 0),
    }
}

fn render_err(err: impl std::fmt::Display) -> ReportError {
    ReportError::Render {
        message: err.to_string(),
    }
}
