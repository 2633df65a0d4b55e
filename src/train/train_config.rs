use serde::{Serialize, Deserialize};
use std::sync::mpsc;
use std::sync::{Arc, atomic::AtomicBool};

use crate::error::{Error, Result};
use crate::train::epoch_stats::EpochStats;

/// Figure of merit watched by the early-stopping logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopCriterion {
    /// Test-set mean square error, the lower the better.
    Mse,
    /// Test-set SP index, the higher the better. Needs one output.
    Sp,
}

/// Configuration for a `train_loop` run.
///
/// # Fields
/// - `epoch_size`: patterns drawn (with replacement) for each epoch
/// - `hard_stop`: maximum number of epochs, `None` for no limit
/// - `sample_every`: evaluate the test set every this many epochs
/// - `stop_iterations`: consecutive small variations that end the run
/// - `stop_threshold`: relative variation below which a check counts as small
/// - `criterion`: which figure of merit drives best-network tracking
/// - `progress_tx`: optional channel sender; one `EpochStats` is sent per
///                       evaluation. If the receiver is dropped the loop
///                       terminates early.
/// - `stop_flag`: optional atomic flag; when set to `true` from another
///                       thread the loop terminates after the current epoch.
pub struct TrainConfig {
    pub epoch_size: usize,
    pub hard_stop: Option<usize>,
    pub sample_every: usize,
    pub stop_iterations: usize,
    pub stop_threshold: f64,
    pub criterion: StopCriterion,
    pub progress_tx: Option<mpsc::Sender<EpochStats>>,
    pub stop_flag: Option<Arc<AtomicBool>>,
}

impl TrainConfig {
    /// Evaluates every 5 epochs and stops after 100 consecutive checks
    /// varying less than 0.1%. No progress channel and no stop flag.
    pub fn new(epoch_size: usize, hard_stop: Option<usize>, criterion: StopCriterion) -> Self {
        TrainConfig {
            epoch_size,
            hard_stop,
            sample_every: 5,
            stop_iterations: 100,
            stop_threshold: 0.001,
            criterion,
            progress_tx: None,
            stop_flag: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.epoch_size == 0 || self.sample_every == 0 || self.stop_iterations == 0 {
            return Err(Error::InvalidParameter(
                "epoch size, sample period and stop iterations must be positive".to_string(),
            ));
        }
        if !(self.stop_threshold > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "stop threshold must be positive, got {}",
                self.stop_threshold
            )));
        }
        Ok(())
    }
}
