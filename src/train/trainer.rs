use tracing::trace;

use crate::data::pattern_set::PatternSet;
use crate::error::{Error, Result};
use crate::loss::mse::MseLoss;
use crate::network::network::Network;

/// One online pass: the network is taught every pattern in order, one
/// weight update per pattern. Returns the MSE of the network on the whole
/// set after the pass.
pub fn train_network(network: &mut Network, inputs: &PatternSet, targets: &PatternSet) -> Result<f64> {
    if inputs.size() != targets.size() {
        return Err(Error::LengthMismatch { expected: inputs.size(), found: targets.size() });
    }
    if inputs.is_empty() {
        return Err(Error::EmptySet("online pass over an empty set"));
    }

    for i in 0..inputs.size() {
        network.train(&inputs.pattern(i)?, &targets.pattern(i)?)?;
    }

    let mut output = PatternSet::zeros(inputs.size(), network.output_size());
    network.run_set(inputs, &mut output)?;
    let mse = MseLoss::loss(&output, targets)?;
    trace!("Online pass over {} pattern(s), MSE = {mse}", inputs.size());
    Ok(mse)
}
