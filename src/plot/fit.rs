use std::path::Path;

use plotters::prelude::*;

use crate::fit::FitProgress;
use crate::instrument::FixedBinAxis;

use super::{axis_units, draw_heatmap, draw_slices, ensure_parent, PlotError, SliceGuide};

fn slice_title(axis: &FixedBinAxis, position: f64) -> String {
    let (scale, unit) = axis_units(axis);
    format!("{} = {:.3} {unit}", axis.name, position / scale).trim_end().to_string()
}

/// Four panels: real data with the slice positions in gray, the horizontal
/// slice at `y = horizontal_y` and the vertical slice at `x = vertical_x`
/// (real vs simulated), and the current parameter values.
pub fn save_fit_progress(
    progress: &FitProgress<'_>,
    object_index: usize,
    path: impl AsRef<Path>,
    horizontal_y: f64,
    vertical_x: f64,
) -> Result<(), PlotError> {
    let path = path.as_ref();
    ensure_parent(path)?;
    let real = progress.real_data(object_index)?;
    let simulated = progress.simulated_data(object_index)?;

    let root = BitMapBackend::new(path, (1200, 1000)).into_drawing_area();
    root.fill(&WHITE)?;
    let panels = root.split_evenly((2, 2));

    draw_heatmap(
        &panels[0],
        real,
        "Real data",
        &[SliceGuide::Horizontal(horizontal_y), SliceGuide::Vertical(vertical_x)],
    )?;
    draw_slices(
        &panels[1],
        &[
            ("real".to_string(), real.projection_x(horizontal_y)),
            ("simulated".to_string(), simulated.projection_x(horizontal_y)),
        ],
        &slice_title(&real.y_axis, horizontal_y),
    )?;
    draw_slices(
        &panels[2],
        &[
            ("real".to_string(), real.projection_y(vertical_x)),
            ("simulated".to_string(), simulated.projection_y(vertical_x)),
        ],
        &slice_title(&real.x_axis, vertical_x),
    )?;

    let text = &panels[3];
    let style = ("sans-serif", 18).into_font();
    let mut lines = vec![
        format!("Iteration  {}", progress.iteration),
        format!("chi2       {:.6e}", progress.chi2),
        format!("minimizer  {}", progress.minimizer),
    ];
    lines.extend(
        progress
            .parameters
            .iter()
            .map(|p| format!("{}  {:.4}", p.name, p.value)),
    );
    for (i, line) in lines.iter().enumerate() {
        text.draw(&Text::new(line.as_str(), (20, 30 + 28 * i as i32), style.clone()))?;
    }

    root.present()?;
    Ok(())
}
