//! Spectra plot.
//!
//! One panel per window in a two-column grid (2x2 for the usual four
//! windows). Detected peaks are drawn as dashed grey verticals.

use crate::config::PlotConfig;
use crate::detection::round_to;
use crate::models::Dataset;
use anyhow::{bail, Context, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use std::path::PathBuf;
use tracing::{info, warn};

const MARKER_COLOR: RGBColor = RGBColor(128, 128, 128);

/// Which peak markers to overlay.
///
/// A cache hit has no per-window peaks, so its plot is drawn bare.
#[derive(Debug, Clone, PartialEq)]
pub enum PlotAnnotations {
    None,
    /// Peak frequencies per dataset, in dataset order.
    Peaks(Vec<Vec<f64>>),
}

impl PlotAnnotations {
    fn markers_for(&self, index: usize) -> &[f64] {
        match self {
            PlotAnnotations::None => &[],
            PlotAnnotations::Peaks(peaks) => peaks.get(index).map(Vec::as_slice).unwrap_or(&[]),
        }
    }
}

/// Rows and columns for `n` panels.
pub fn grid_shape(n: usize) -> (usize, usize) {
    if n == 0 {
        return (0, 0);
    }
    let cols = n.min(2);
    (n.div_ceil(cols), cols)
}

/// Tick positions from `first` to `last` (both rounded to 0.1), end excluded.
pub fn tick_positions(first: f64, last: f64, step: f64) -> Vec<f64> {
    let start = round_to(first, 1);
    let stop = round_to(last, 1);
    if !(step > 0.0) || stop <= start {
        return Vec::new();
    }

    // absorb float noise in (stop - start)
    let count = ((stop - start) / step - 1e-9).ceil() as usize;
    (0..count).map(|i| start + i as f64 * step).collect()
}

/// Render every dataset to `config.output`.
pub fn render_spectra(
    datasets: &[Dataset],
    annotations: &PlotAnnotations,
    config: &PlotConfig,
) -> Result<PathBuf> {
    if datasets.is_empty() {
        bail!("Nothing to plot: no spectra loaded");
    }
    if datasets.len() != 4 {
        warn!(
            "Plotting {} spectra; the grid is laid out for 4",
            datasets.len()
        );
    }

    let path = config.output.clone();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create plot directory: {}", parent.display()))?;
        }
    }

    let size = (config.width, config.height);
    let is_svg = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("svg"));

    let drawn = if is_svg {
        let root = SVGBackend::new(&path, size).into_drawing_area();
        draw_grid(&root, datasets, annotations, config.tick_step_ghz)
    } else {
        let root = BitMapBackend::new(&path, size).into_drawing_area();
        draw_grid(&root, datasets, annotations, config.tick_step_ghz)
    };
    drawn.with_context(|| format!("Failed to render plot: {}", path.display()))?;

    info!("Plot written to {}", path.display());
    Ok(path)
}

fn draw_grid<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    datasets: &[Dataset],
    annotations: &PlotAnnotations,
    tick_step: f64,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;

    let panels = root.split_evenly(grid_shape(datasets.len()));
    for (index, (dataset, panel)) in datasets.iter().zip(panels.iter()).enumerate() {
        draw_panel(panel, dataset, annotations.markers_for(index), tick_step)?;
    }

    root.present()?;
    Ok(())
}

fn draw_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    dataset: &Dataset,
    markers: &[f64],
    tick_step: f64,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let (Some((first, last)), Some((flux_lo, flux_hi))) =
        (dataset.frequency_span(), dataset.flux_range())
    else {
        warn!("{} is empty; leaving its panel blank", dataset.name);
        return Ok(());
    };

    let ticks = tick_positions(first, last, tick_step);

    // x spans the data plus the first tick, which may sit just below it;
    // a single sample gets a one-tick window
    let (x_min, x_max) = if last > first {
        (ticks.first().map_or(first, |&t| t.min(first)), last)
    } else {
        (first - tick_step / 2.0, last + tick_step / 2.0)
    };
    let pad = ((flux_hi - flux_lo) * 0.05).max(1e-6);
    let (y_min, y_max) = (flux_lo - pad, flux_hi + pad);

    let mut chart = ChartBuilder::on(area)
        .caption(&dataset.name, ("sans-serif", 14))
        .margin(8)
        .x_label_area_size(35)
        .y_label_area_size(50)
        .build_cartesian_2d((x_min..x_max).with_key_points(ticks), y_min..y_max)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_label_formatter(&|x| format!("{:.1}", x))
        .x_desc("Frequency (GHz)")
        .y_desc("Flux (Jy)")
        .draw()?;

    chart.draw_series(LineSeries::new(
        dataset.points.iter().map(|p| (p.frequency_ghz, p.flux_jy)),
        BLUE.stroke_width(1),
    ))?;

    for &frequency in markers {
        chart.draw_series(DashedLineSeries::new(
            vec![(frequency, y_min), (frequency, y_max)],
            18,
            6,
            MARKER_COLOR.mix(0.5).stroke_width(1),
        ))?;
    }

    Ok(())
}
