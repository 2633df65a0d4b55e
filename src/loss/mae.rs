use crate::data::pattern::{Feature, Pattern};
use crate::data::pattern_set::PatternSet;
use crate::error::{Error, Result};

pub struct MaeLoss;

impl MaeLoss {
    /// Scalar MAE over every element: mean(|output - target|)
    pub fn loss(output: &PatternSet, target: &PatternSet) -> Result<Feature> {
        let mut diff = target.clone();
        diff.subtract(output)?;
        if diff.as_slice().is_empty() {
            return Err(Error::EmptySet("mean absolute error of an empty set"));
        }
        Ok(abs_mean_of(diff.as_slice()))
    }
}

/// Mean of the absolute features, 0 for an empty pattern.
pub fn abs_mean(pattern: &Pattern) -> Feature {
    abs_mean_of(pattern.as_slice())
}

fn abs_mean_of(values: &[Feature]) -> Feature {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|x| x.abs()).sum::<Feature>() / values.len() as Feature
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn absolute_means() {
        assert_relative_eq!(abs_mean(&Pattern::from(vec![1.0, -3.0])), 2.0);
        let out = PatternSet::from_rows(vec![vec![0.5], vec![-0.5]]).unwrap();
        let target = PatternSet::from_rows(vec![vec![1.0], vec![-1.0]]).unwrap();
        assert_relative_eq!(MaeLoss::loss(&out, &target).unwrap(), 0.5);
    }
}
