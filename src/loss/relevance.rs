use tracing::{debug, info};

use crate::data::pattern::{Ensemble, Feature};
use crate::data::pattern_set::PatternSet;
use crate::error::{Error, Result};
use crate::loss::mse::MseLoss;
use crate::network::network::Network;

/// Relevance of every input feature of `network` over `data`.
///
/// Feature `i` is replaced by zeros in a copy of `data` and the MSE between
/// the network's original and changed outputs is reported. A zero column
/// stands for the feature's mean, so `data` is expected to be mean-removed.
pub fn relevance(network: &mut Network, data: &PatternSet) -> Result<Vec<Feature>> {
    if data.pattern_size() != network.input_size() {
        return Err(Error::LengthMismatch { expected: network.input_size(), found: data.pattern_size() });
    }
    if data.is_empty() {
        return Err(Error::EmptySet("relevance of an empty set"));
    }
    let mut reference = PatternSet::zeros(0, 0);
    network.run_set(data, &mut reference)?;

    let mut changed = PatternSet::zeros(0, 0);
    let zeros = Ensemble::zeros(data.size());
    let mut result = Vec::with_capacity(data.pattern_size());
    for i in 0..data.pattern_size() {
        let mut copy = data.clone();
        copy.set_ensemble(i, &zeros)?;
        network.run_set(&copy, &mut changed)?;
        let value = MseLoss::loss(&reference, &changed)?;
        debug!("Feature {i} has relevance {value:.6}");
        result.push(value);
    }
    info!("Evaluated the relevance of {} feature(s) over {} pattern(s)", result.len(), data.size());
    Ok(result)
}
