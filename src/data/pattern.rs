use serde::{Serialize, Deserialize};
use std::fmt;
use std::ops::{Add, Sub, Mul, Div, Index, IndexMut};

use crate::error::{Error, Result};

/// A single floating point measurement.
pub type Feature = f64;

/// One sample's feature vector. The length is fixed at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pattern {
    data: Vec<Feature>,
}

/// The values of one feature across many samples. Same type as `Pattern`,
/// used where a column view is meant.
pub type Ensemble = Pattern;

impl Pattern {
    pub fn new(size: usize, init: Feature) -> Pattern {
        Pattern { data: vec![init; size] }
    }

    pub fn zeros(size: usize) -> Pattern {
        Pattern::new(size, 0.0)
    }

    pub fn from_vec(data: Vec<Feature>) -> Pattern {
        Pattern { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[Feature] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [Feature] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<Feature> {
        self.data
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Feature> {
        self.data.iter()
    }

    /// Applies `functor` to every element in place.
    pub fn apply<F>(&mut self, functor: F)
    where
        F: Fn(Feature) -> Feature,
    {
        for x in self.data.iter_mut() {
            *x = functor(*x);
        }
    }

    pub fn map<F>(&self, functor: F) -> Pattern
    where
        F: Fn(Feature) -> Feature,
    {
        Pattern::from_vec(self.data.iter().map(|&x| functor(x)).collect())
    }

    pub fn sum(&self) -> Feature {
        self.data.iter().sum()
    }

    /// Arithmetic mean; 0 for an empty pattern.
    pub fn mean(&self) -> Feature {
        if self.data.is_empty() {
            return 0.0;
        }
        self.sum() / self.data.len() as Feature
    }

    /// Sample variance (n - 1 in the denominator); 0 below two elements.
    pub fn variance(&self) -> Feature {
        let n = self.data.len();
        if n < 2 {
            return 0.0;
        }
        let mean = self.mean();
        self.data.iter().map(|x| (x - mean).powi(2)).sum::<Feature>() / (n - 1) as Feature
    }

    pub fn std_dev(&self) -> Feature {
        self.variance().sqrt()
    }

    pub fn max(&self) -> Option<Feature> {
        self.data.iter().copied().reduce(Feature::max)
    }

    pub fn min(&self) -> Option<Feature> {
        self.data.iter().copied().reduce(Feature::min)
    }

    fn zip_with<F>(&self, other: &Pattern, functor: F) -> Result<Pattern>
    where
        F: Fn(Feature, Feature) -> Feature,
    {
        if self.len() != other.len() {
            return Err(Error::LengthMismatch { expected: self.len(), found: other.len() });
        }
        Ok(Pattern::from_vec(
            self.data.iter().zip(other.data.iter()).map(|(&a, &b)| functor(a, b)).collect(),
        ))
    }

    pub fn checked_add(&self, other: &Pattern) -> Result<Pattern> {
        self.zip_with(other, |a, b| a + b)
    }

    pub fn checked_sub(&self, other: &Pattern) -> Result<Pattern> {
        self.zip_with(other, |a, b| a - b)
    }

    /// Element-wise (Hadamard) product.
    pub fn checked_mul(&self, other: &Pattern) -> Result<Pattern> {
        self.zip_with(other, |a, b| a * b)
    }

    pub fn checked_div(&self, other: &Pattern) -> Result<Pattern> {
        self.zip_with(other, |a, b| a / b)
    }
}

impl From<Vec<Feature>> for Pattern {
    fn from(data: Vec<Feature>) -> Self {
        Pattern::from_vec(data)
    }
}

impl From<&[Feature]> for Pattern {
    fn from(data: &[Feature]) -> Self {
        Pattern::from_vec(data.to_vec())
    }
}

impl Index<usize> for Pattern {
    type Output = Feature;

    fn index(&self, i: usize) -> &Feature {
        &self.data[i]
    }
}

impl IndexMut<usize> for Pattern {
    fn index_mut(&mut self, i: usize) -> &mut Feature {
        &mut self.data[i]
    }
}

impl Add<Feature> for Pattern {
    type Output = Pattern;

    fn add(mut self, rhs: Feature) -> Self::Output {
        self.apply(|x| x + rhs);
        self
    }
}

impl Sub<Feature> for Pattern {
    type Output = Pattern;

    fn sub(mut self, rhs: Feature) -> Self::Output {
        self.apply(|x| x - rhs);
        self
    }
}

impl Mul<Feature> for Pattern {
    type Output = Pattern;

    fn mul(mut self, rhs: Feature) -> Self::Output {
        self.apply(|x| x * rhs);
        self
    }
}

impl Div<Feature> for Pattern {
    type Output = Pattern;

    fn div(mut self, rhs: Feature) -> Self::Output {
        self.apply(|x| x / rhs);
        self
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, x) in self.data.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{x}")?;
        }
        write!(f, ")")
    }
}
