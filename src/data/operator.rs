use tracing::debug;

use crate::data::pattern::{Feature, Pattern};
use crate::data::pattern_set::PatternSet;
use crate::error::{Error, Result};

/// A transform applied to every row (or column) of a `PatternSet`.
///
/// When applied to a whole set the output length must be the same for
/// every invocation; see `PatternSet::apply_pattern_op`. An operator fails
/// on inputs it cannot handle instead of passing them through.
pub trait PatternOperator {
    fn apply(&self, input: &Pattern) -> Result<Pattern>;
}

impl<F> PatternOperator for F
where
    F: Fn(&Pattern) -> Pattern,
{
    fn apply(&self, input: &Pattern) -> Result<Pattern> {
        Ok(self(input))
    }
}

/// Removes a per-feature mean from every pattern.
#[derive(Debug, Clone)]
pub struct RemoveMeanOperator {
    mean: Pattern,
}

impl RemoveMeanOperator {
    /// Computes the per-ensemble mean of `set`.
    pub fn new(set: &PatternSet) -> RemoveMeanOperator {
        let mean = Pattern::from_vec(set.ensembles().map(|e| e.mean()).collect());
        debug!("Mean for {} ensemble(s) is {}", mean.len(), mean);
        RemoveMeanOperator { mean }
    }

    pub fn mean(&self) -> &Pattern {
        &self.mean
    }
}

impl PatternOperator for RemoveMeanOperator {
    fn apply(&self, input: &Pattern) -> Result<Pattern> {
        input.checked_sub(&self.mean)
    }
}

/// Standard deviations below this value are replaced by one.
const MIN_STD_DEV: Feature = 1e-5;

/// Z-score normalization: `(x - mean) / std_dev`, per feature.
///
/// The mean and standard deviation vectors double as the input
/// normalization metadata of an MLP (`subtract` and `divide`).
#[derive(Debug, Clone)]
pub struct NormalizationOperator {
    mean: Pattern,
    std_dev: Pattern,
}

impl NormalizationOperator {
    pub fn new(set: &PatternSet) -> NormalizationOperator {
        let mut mean = Vec::with_capacity(set.pattern_size());
        let mut std_dev = Vec::with_capacity(set.pattern_size());
        for (i, e) in set.ensembles().enumerate() {
            let m = e.mean();
            let mut sd = e.std_dev();
            if sd < MIN_STD_DEV {
                sd = 1.0;
            }
            debug!("Ensemble[{i}] mean = {m}, standard deviation = {sd}");
            mean.push(m);
            std_dev.push(sd);
        }
        NormalizationOperator {
            mean: Pattern::from_vec(mean),
            std_dev: Pattern::from_vec(std_dev),
        }
    }

    /// Builds the operator from explicit vectors.
    pub fn from_parts(mean: Pattern, std_dev: Pattern) -> Result<NormalizationOperator> {
        if mean.len() != std_dev.len() {
            return Err(Error::LengthMismatch { expected: mean.len(), found: std_dev.len() });
        }
        Ok(NormalizationOperator { mean, std_dev })
    }

    pub fn mean(&self) -> &Pattern {
        &self.mean
    }

    pub fn std_dev(&self) -> &Pattern {
        &self.std_dev
    }
}

impl PatternOperator for NormalizationOperator {
    fn apply(&self, input: &Pattern) -> Result<Pattern> {
        input.checked_sub(&self.mean)?.checked_div(&self.std_dev)
    }
}
