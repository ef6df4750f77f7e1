//! PNG output of intensity maps, slices and fit progress.

mod fit;

pub use fit::save_fit_progress;

use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;
use thiserror::Error;

use crate::data::{Histogram1D, IntensityData};
use crate::fit::FitError;
use crate::instrument::FixedBinAxis;
use crate::units::DEGREE;

#[derive(Debug, Error)]
pub enum PlotError {
    #[error("drawing failed: {0}")]
    Drawing(String),
    #[error("nothing to plot")]
    Empty,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Fit(#[from] FitError),
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for PlotError {
    fn from(e: DrawingAreaErrorKind<E>) -> Self {
        PlotError::Drawing(e.to_string())
    }
}

/// Blue → cyan → yellow → red for `x ∈ [0, 1]`.
fn heat_color(x: f64) -> RGBColor {
    let x = if x.is_finite() { x.clamp(0.0, 1.0) } else { 0.0 };
    let channel = |centre: f64| ((1.5 - (4.0 * x - centre).abs()).clamp(0.0, 1.0) * 255.0) as u8;
    RGBColor(channel(3.0), channel(2.0), channel(1.0))
}

/// Slice position marked over a heatmap.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SliceGuide {
    /// Constant `alpha_f`.
    Horizontal(f64),
    /// Constant `phi_f`.
    Vertical(f64),
}

/// Display scale and unit of an axis: exit angles in degrees, anything
/// else (plate positions, bin numbers) as stored.
pub(crate) fn axis_units(axis: &FixedBinAxis) -> (f64, &'static str) {
    match axis.name.as_str() {
        "phi_f" | "alpha_f" => (DEGREE, "deg"),
        _ => (1.0, ""),
    }
}

fn axis_label(axis: &FixedBinAxis) -> String {
    match axis_units(axis) {
        (_, "") => axis.name.clone(),
        (_, unit) => format!("{} ({unit})", axis.name),
    }
}

/// End points of each guide in display units; guides outside the map are
/// dropped.
fn guide_segments(data: &IntensityData, guides: &[SliceGuide]) -> Vec<[(f64, f64); 2]> {
    let (x, y) = (&data.x_axis, &data.y_axis);
    let (sx, sy) = (axis_units(x).0, axis_units(y).0);
    guides
        .iter()
        .filter_map(|guide| match *guide {
            SliceGuide::Horizontal(v) if v >= y.min && v <= y.max => {
                Some([(x.min / sx, v / sy), (x.max / sx, v / sy)])
            }
            SliceGuide::Vertical(v) if v >= x.min && v <= x.max => {
                Some([(v / sx, y.min / sy), (v / sx, y.max / sy)])
            }
            _ => None,
        })
        .collect()
}

fn ensure_parent(path: &Path) -> Result<(), PlotError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Log-scaled heatmap of `values + 1` with angular axes in degrees, with
/// gray lines at the `guides`.
pub(crate) fn draw_heatmap<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    data: &IntensityData,
    title: &str,
    guides: &[SliceGuide],
) -> Result<(), PlotError>
where
    DB::ErrorType: 'static,
{
    let (x, y) = (&data.x_axis, &data.y_axis);
    let (sx, sy) = (axis_units(x).0, axis_units(y).0);
    let log_max = (data.max().max(0.0) + 1.0).log10().max(f64::MIN_POSITIVE);

    let mut chart = ChartBuilder::on(area)
        .margin(10)
        .caption(title, ("sans-serif", 18))
        .x_label_area_size(35)
        .y_label_area_size(45)
        .build_cartesian_2d(x.min / sx..x.max / sx, y.min / sy..y.max / sy)?;
    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc(axis_label(x))
        .y_desc(axis_label(y))
        .draw()?;

    let values = data.array();
    chart.draw_series(values.indexed_iter().map(|((ix, iy), v)| {
        let (x0, x1) = x.bin_bounds(ix);
        let (y0, y1) = y.bin_bounds(iy);
        let level = (v.max(0.0) + 1.0).log10() / log_max;
        Rectangle::new(
            [(x0 / sx, y0 / sy), (x1 / sx, y1 / sy)],
            heat_color(level).filled(),
        )
    }))?;
    let gray = RGBColor(128, 128, 128);
    chart.draw_series(
        guide_segments(data, guides)
            .into_iter()
            .map(|segment| PathElement::new(segment.to_vec(), gray.stroke_width(2))),
    )?;
    Ok(())
}

/// Semilog plot of labelled slices sharing the first slice's axis units.
pub(crate) fn draw_slices<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    slices: &[(String, Histogram1D)],
    title: &str,
) -> Result<(), PlotError>
where
    DB::ErrorType: 'static,
{
    let Some((_, first)) = slices.first() else {
        return Err(PlotError::Empty);
    };
    let scale = axis_units(&first.axis).0;
    let x_min = slices.iter().map(|(_, h)| h.x_min()).fold(first.x_min(), f64::min) / scale;
    let x_max = slices.iter().map(|(_, h)| h.x_max()).fold(first.x_max(), f64::max) / scale;
    let y_max = slices.iter().map(|(_, h)| h.max()).fold(0.0, f64::max).max(1.0) * 2.0;
    let y_floor = slices
        .iter()
        .flat_map(|(_, h)| h.bin_values().iter().copied())
        .filter(|v| *v > 0.0)
        .fold(y_max, f64::min)
        .min(y_max / 10.0)
        / 2.0;

    let mut chart = ChartBuilder::on(area)
        .margin(10)
        .caption(title, ("sans-serif", 18))
        .x_label_area_size(35)
        .y_label_area_size(55)
        .build_cartesian_2d(x_min..x_max, (y_floor..y_max).log_scale())?;
    chart
        .configure_mesh()
        .x_desc(axis_label(&first.axis))
        .y_desc("intensity")
        .draw()?;

    for (i, (label, hist)) in slices.iter().enumerate() {
        let color = Palette99::pick(i).to_rgba();
        let points: Vec<(f64, f64)> = hist
            .bin_centers()
            .into_iter()
            .zip(hist.bin_values().iter())
            .map(|(x, v)| (x / scale, v.max(y_floor)))
            .collect();
        chart
            .draw_series(LineSeries::new(points, color.stroke_width(2)))?
            .label(label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }
    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    Ok(())
}

pub fn save_intensity_map(data: &IntensityData, path: impl AsRef<Path>, title: &str) -> Result<(), PlotError> {
    let path = path.as_ref();
    ensure_parent(path)?;
    let root = BitMapBackend::new(path, (800, 700)).into_drawing_area();
    root.fill(&WHITE)?;
    draw_heatmap(&root, data, title, &[])?;
    root.present()?;
    tracing::debug!(path = %path.display(), "intensity map written");
    Ok(())
}

pub fn save_slices(slices: &[(String, Histogram1D)], path: impl AsRef<Path>, title: &str) -> Result<(), PlotError> {
    let path = path.as_ref();
    ensure_parent(path)?;
    let root = BitMapBackend::new(path, (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;
    draw_slices(&root, slices, title)?;
    root.present()?;
    Ok(())
}
