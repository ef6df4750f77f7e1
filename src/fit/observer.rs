//! Fit progress reporting.

use std::path::PathBuf;
use std::time::Duration;

use crate::data::IntensityData;
use crate::plot;

use super::{FitError, FitObjects, FitParameterSet};

/// Snapshot handed to observers after an objective evaluation.
pub struct FitProgress<'a> {
    /// 1-based count of objective evaluations.
    pub iteration: usize,
    pub chi2: f64,
    /// Set once, after the best parameters have been re-applied.
    pub is_last: bool,
    pub elapsed: Duration,
    pub minimizer: &'a str,
    pub strategy_index: Option<usize>,
    pub parameters: &'a FitParameterSet,
    pub objects: &'a FitObjects,
}

impl FitProgress<'_> {
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn real_data(&self, index: usize) -> Result<&IntensityData, FitError> {
        Ok(self.objects.get(index)?.real_data())
    }

    pub fn simulated_data(&self, index: usize) -> Result<IntensityData, FitError> {
        Ok(self.objects.get(index)?.simulation_data())
    }

    pub fn chi_squared_map(&self, index: usize) -> Result<IntensityData, FitError> {
        self.objects.chi_squared_map(index)
    }
}

pub trait FitObserver: Send {
    /// Notify every n-th iteration; first and last are always notified.
    fn update_every(&self) -> usize {
        1
    }

    fn update(&mut self, progress: &FitProgress<'_>);
}

pub(crate) fn wants_update(observer: &dyn FitObserver, progress: &FitProgress<'_>) -> bool {
    let every = observer.update_every().max(1);
    progress.is_last || progress.iteration == 1 || progress.iteration % every == 0
}

/// Logs iteration, chi² and parameter values.
#[derive(Clone, Debug)]
pub struct PrintObserver {
    every: usize,
}

impl PrintObserver {
    pub fn new(every: usize) -> Self {
        Self { every }
    }
}

impl FitObserver for PrintObserver {
    fn update_every(&self) -> usize {
        self.every
    }

    fn update(&mut self, progress: &FitProgress<'_>) {
        let values: Vec<String> = progress
            .parameters
            .iter()
            .map(|p| format!("{}={:.6}", p.name, p.value))
            .collect();
        tracing::info!(
            iteration = progress.iteration,
            chi2 = progress.chi2,
            elapsed_ms = progress.elapsed.as_millis() as u64,
            minimizer = progress.minimizer,
            strategy = ?progress.strategy_index,
            parameters = %values.join(", "),
            "fit progress"
        );
        if progress.is_last {
            tracing::info!("fit finished\n{}", progress.parameters.report());
        }
    }
}

/// Writes a four-panel PNG per update: real data, a horizontal slice, a
/// vertical slice and the parameter values.
#[derive(Clone, Debug)]
pub struct SliceObserver {
    every: usize,
    output_dir: PathBuf,
    /// `alpha_f` of the horizontal slice.
    horizontal_y: f64,
    /// `phi_f` of the vertical slice.
    vertical_x: f64,
    object_index: usize,
}

impl SliceObserver {
    pub fn new(output_dir: impl Into<PathBuf>, every: usize, horizontal_y: f64, vertical_x: f64) -> Self {
        Self {
            every,
            output_dir: output_dir.into(),
            horizontal_y,
            vertical_x,
            object_index: 0,
        }
    }

    pub fn with_object(mut self, index: usize) -> Self {
        self.object_index = index;
        self
    }

    pub fn frame_path(&self, progress: &FitProgress<'_>) -> PathBuf {
        if progress.is_last {
            self.output_dir.join("fit_final.png")
        } else {
            self.output_dir
                .join(format!("fit_{:05}.png", progress.iteration))
        }
    }
}

impl FitObserver for SliceObserver {
    fn update_every(&self) -> usize {
        self.every
    }

    fn update(&mut self, progress: &FitProgress<'_>) {
        let path = self.frame_path(progress);
        let result = std::fs::create_dir_all(&self.output_dir)
            .map_err(plot::PlotError::from)
            .and_then(|_| {
                plot::save_fit_progress(
                    progress,
                    self.object_index,
                    &path,
                    self.horizontal_y,
                    self.vertical_x,
                )
            });
        if let Err(e) = result {
            tracing::warn!(path = %path.display(), error = %e, "could not draw fit progress");
        }
    }
}
