use serde::{Deserialize, Serialize};

use super::SimulationError;

/// Threading and batching of one simulation run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationOptions {
    /// Worker threads; 0 uses every core.
    pub threads: usize,
    pub n_batches: usize,
    pub current_batch: usize,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            threads: 0,
            n_batches: 1,
            current_batch: 0,
        }
    }
}

impl SimulationOptions {
    pub fn with_threads(threads: usize) -> Self {
        Self {
            threads,
            ..Self::default()
        }
    }

    pub fn with_batch(n_batches: usize, current_batch: usize) -> Self {
        Self {
            n_batches,
            current_batch,
            ..Self::default()
        }
    }

    /// Element range `[start, end)` of the current batch out of `total`.
    pub fn batch_range(&self, total: usize) -> Result<(usize, usize), SimulationError> {
        if self.n_batches == 0 || self.current_batch >= self.n_batches {
            return Err(SimulationError::InvalidBatch {
                current: self.current_batch,
                total: self.n_batches,
            });
        }
        let size = total.div_ceil(self.n_batches);
        let start = (self.current_batch * size).min(total);
        let end = (start + size).min(total);
        Ok((start, end))
    }
}
