use serde::{Serialize, Deserialize};

use crate::loss::sp::SpIndex;

/// Statistics of one evaluation emitted by `train_loop`.
///
/// When a `progress_tx` channel is configured in `TrainConfig`, the training
/// loop sends one `EpochStats` value every `sample_every` epochs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochStats {
    /// 0-based epoch number.
    pub epoch: usize,
    /// MSE of the network on the test set.
    pub test_mse: f64,
    /// MSE on the (unbalanced) train set.
    pub train_mse: f64,
    /// SP on the test set, for single-output two-class problems.
    pub test_sp: Option<SpIndex>,
    pub train_sp: Option<SpIndex>,
    /// Relative change of the stop criterion since the previous evaluation.
    pub variation: f64,
    /// Whether this evaluation produced the best network so far.
    pub best: bool,
    /// Wall-clock time since the previous evaluation in milliseconds.
    pub elapsed_ms: u64,
}
