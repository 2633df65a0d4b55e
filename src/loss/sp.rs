use serde::{Serialize, Deserialize};
use tracing::trace;

use crate::data::pattern::Feature;
use crate::data::pattern_set::PatternSet;
use crate::error::{Error, Result};

/// Sum-product index of a two-class discriminator at its best threshold.
///
/// Outputs below `threshold` are assigned to the first class (the one whose
/// target is the lower value), the others to the second class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpIndex {
    pub value: f64,
    /// Fraction of first-class patterns classified as first class.
    pub eff1: f64,
    /// Fraction of second-class patterns classified as second class.
    pub eff2: f64,
    pub threshold: Feature,
}

/// `sqrt(sqrt(eff1 * eff2) * (eff1 + eff2) / 2)`
pub fn sp_product(eff1: f64, eff2: f64) -> f64 {
    ((eff1 * eff2).sqrt() * (eff1 + eff2) / 2.0).sqrt()
}

impl SpIndex {
    /// Scans every output value as a threshold and keeps the one with the
    /// highest SP. `output` and `target` are single-column sets; a pattern
    /// belongs to the second class when its target is above the midpoint of
    /// the target range.
    pub fn compute(output: &PatternSet, target: &PatternSet) -> Result<SpIndex> {
        for set in [output, target] {
            if set.pattern_size() != 1 {
                return Err(Error::LengthMismatch { expected: 1, found: set.pattern_size() });
            }
        }
        if output.size() != target.size() {
            return Err(Error::LengthMismatch { expected: target.size(), found: output.size() });
        }
        let targets = target.as_slice();
        let (low, high) = targets
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &t| (lo.min(t), hi.max(t)));
        if !(low < high) {
            return Err(Error::EmptySet("SP needs patterns of two classes"));
        }
        let middle = (low + high) / 2.0;

        let mut points: Vec<(Feature, bool)> = output
            .as_slice()
            .iter()
            .zip(targets)
            .map(|(&o, &t)| (o, t > middle))
            .collect();
        points.sort_by(|a, b| a.0.total_cmp(&b.0));
        let n2 = points.iter().filter(|p| p.1).count() as f64;
        let n1 = points.len() as f64 - n2;

        let mut best = SpIndex { value: 0.0, eff1: 0.0, eff2: 1.0, threshold: points[0].0 };
        let (mut below1, mut below2) = (0.0, 0.0);
        let mut i = 0;
        while i < points.len() {
            let threshold = points[i].0;
            let eff1 = below1 / n1;
            let eff2 = (n2 - below2) / n2;
            let value = sp_product(eff1, eff2);
            if value > best.value {
                best = SpIndex { value, eff1, eff2, threshold };
            }
            while i < points.len() && points[i].0 == threshold {
                if points[i].1 {
                    below2 += 1.0;
                } else {
                    below1 += 1.0;
                }
                i += 1;
            }
        }
        trace!("Best SP {:.4} at threshold {:.4}", best.value, best.threshold);
        Ok(best)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn column(values: &[f64]) -> PatternSet {
        PatternSet::from_rows(values.iter().map(|&v| vec![v]).collect()).unwrap()
    }

    #[test]
    fn separable_outputs_reach_one() {
        let out = column(&[-0.9, -0.5, -0.2, 0.3, 0.8]);
        let target = column(&[-1.0, -1.0, -1.0, 1.0, 1.0]);
        let sp = SpIndex::compute(&out, &target).unwrap();
        assert_relative_eq!(sp.value, 1.0);
        assert_relative_eq!(sp.threshold, 0.3);
        assert_eq!((sp.eff1, sp.eff2), (1.0, 1.0));
    }

    #[test]
    fn overlapping_outputs() {
        let out = column(&[-0.5, 0.5, -0.4, 0.6]);
        let target = column(&[-1.0, -1.0, 1.0, 1.0]);
        let sp = SpIndex::compute(&out, &target).unwrap();
        // No threshold separates the classes.
        assert!(sp.value < 1.0);
        assert_relative_eq!(sp.value, sp_product(sp.eff1, sp.eff2));
        assert_relative_eq!(sp_product(0.5, 0.5), 0.5);
    }

    #[test]
    fn needs_two_classes() {
        let out = column(&[0.1, 0.2]);
        assert!(matches!(SpIndex::compute(&out, &column(&[1.0, 1.0])), Err(Error::EmptySet(_))));
        assert!(SpIndex::compute(&out, &column(&[1.0])).is_err());
    }
}
