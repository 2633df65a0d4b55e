use crate::data::pattern::{Feature, Pattern};
use crate::data::pattern_set::PatternSet;
use crate::error::{Error, Result};

pub struct MseLoss;

impl MseLoss {
    /// Scalar MSE over every element: mean((output - target)²)
    pub fn loss(output: &PatternSet, target: &PatternSet) -> Result<Feature> {
        let diff = MseLoss::error(output, target)?;
        if diff.as_slice().is_empty() {
            return Err(Error::EmptySet("mean square error of an empty set"));
        }
        Ok(mean_square_of(diff.as_slice()))
    }

    /// Per-element error fed to back-propagation: target - output
    pub fn error(output: &PatternSet, target: &PatternSet) -> Result<PatternSet> {
        let mut diff = target.clone();
        diff.subtract(output)?;
        Ok(diff)
    }
}

/// Mean of the squared features, 0 for an empty pattern.
pub fn mean_square(pattern: &Pattern) -> Feature {
    mean_square_of(pattern.as_slice())
}

pub fn root_mean_square(pattern: &Pattern) -> Feature {
    mean_square(pattern).sqrt()
}

fn mean_square_of(values: &[Feature]) -> Feature {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|x| x * x).sum::<Feature>() / values.len() as Feature
}
