use serde::{Serialize, Deserialize};
use std::fmt;
use tracing::{debug, trace};

use crate::data::operator::PatternOperator;
use crate::data::pattern::{Ensemble, Feature, Pattern};
use crate::data::random::RandomInteger;
use crate::error::{Error, Result};

/// A dense table of patterns: rows are samples, columns are features.
///
/// Storage is a single row-major buffer. Row and column accessors return
/// owned copies (`pattern`, `ensemble`) or a borrowed row slice (`row`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternSet {
    rows: usize,
    cols: usize,
    data: Vec<Feature>,
}

impl PatternSet {
    /// A `size` x `pattern_size` set with every element set to `init`.
    pub fn new(size: usize, pattern_size: usize, init: Feature) -> PatternSet {
        trace!("Creating PatternSet with size={size} and pattern size={pattern_size}");
        PatternSet {
            rows: size,
            cols: pattern_size,
            data: vec![init; size * pattern_size],
        }
    }

    pub fn zeros(size: usize, pattern_size: usize) -> PatternSet {
        PatternSet::new(size, pattern_size, 0.0)
    }

    /// Stacks `patterns` as rows. All patterns must share one length.
    pub fn from_patterns(patterns: &[Pattern]) -> Result<PatternSet> {
        let cols = patterns.first().map_or(0, Pattern::len);
        let mut data = Vec::with_capacity(patterns.len() * cols);
        for (i, p) in patterns.iter().enumerate() {
            if p.len() != cols {
                debug!("Pattern[{i}] has length {} while the rest has {cols}", p.len());
                return Err(Error::LengthMismatch { expected: cols, found: p.len() });
            }
            data.extend_from_slice(p.as_slice());
        }
        Ok(PatternSet { rows: patterns.len(), cols, data })
    }

    /// Same as `from_patterns`, from plain rows.
    pub fn from_rows(rows: Vec<Vec<Feature>>) -> Result<PatternSet> {
        let patterns: Vec<Pattern> = rows.into_iter().map(Pattern::from_vec).collect();
        PatternSet::from_patterns(&patterns)
    }

    /// Deep copy restricted to the rows listed in `indices`, in that order.
    /// Indices may repeat.
    pub fn select(&self, indices: &[usize]) -> Result<PatternSet> {
        let mut data = Vec::with_capacity(indices.len() * self.cols);
        for &i in indices {
            data.extend_from_slice(self.row(i)?);
        }
        trace!("Selected {} pattern(s) from a set of {}", indices.len(), self.rows);
        Ok(PatternSet { rows: indices.len(), cols: self.cols, data })
    }

    /// Number of patterns (rows).
    pub fn size(&self) -> usize {
        self.rows
    }

    /// Number of features in each pattern (columns).
    pub fn pattern_size(&self) -> usize {
        self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn as_slice(&self) -> &[Feature] {
        &self.data
    }

    /// Borrowed view of row `i`.
    pub fn row(&self, i: usize) -> Result<&[Feature]> {
        if i >= self.rows {
            return Err(Error::PatternOutOfRange { index: i, size: self.rows });
        }
        Ok(&self.data[i * self.cols..(i + 1) * self.cols])
    }

    pub fn pattern(&self, i: usize) -> Result<Pattern> {
        self.row(i).map(Pattern::from)
    }

    pub fn ensemble(&self, j: usize) -> Result<Ensemble> {
        if j >= self.cols {
            return Err(Error::EnsembleOutOfRange { index: j, size: self.cols });
        }
        Ok(self.column(j))
    }

    fn column(&self, j: usize) -> Ensemble {
        Pattern::from_vec((0..self.rows).map(|i| self.data[i * self.cols + j]).collect())
    }

    pub fn get(&self, i: usize, j: usize) -> Result<Feature> {
        if j >= self.cols {
            return Err(Error::EnsembleOutOfRange { index: j, size: self.cols });
        }
        Ok(self.row(i)?[j])
    }

    pub fn patterns(&self) -> impl Iterator<Item = Pattern> + '_ {
        (0..self.rows).map(move |i| Pattern::from(&self.data[i * self.cols..(i + 1) * self.cols]))
    }

    pub fn ensembles(&self) -> impl Iterator<Item = Ensemble> + '_ {
        (0..self.cols).map(move |j| self.column(j))
    }

    pub fn set_pattern(&mut self, i: usize, pattern: &Pattern) -> Result<()> {
        if i >= self.rows {
            return Err(Error::PatternOutOfRange { index: i, size: self.rows });
        }
        if pattern.len() != self.cols {
            return Err(Error::LengthMismatch { expected: self.cols, found: pattern.len() });
        }
        self.data[i * self.cols..(i + 1) * self.cols].copy_from_slice(pattern.as_slice());
        Ok(())
    }

    pub fn set_ensemble(&mut self, j: usize, ensemble: &Ensemble) -> Result<()> {
        if j >= self.cols {
            return Err(Error::EnsembleOutOfRange { index: j, size: self.cols });
        }
        if ensemble.len() != self.rows {
            return Err(Error::LengthMismatch { expected: self.rows, found: ensemble.len() });
        }
        for (i, &v) in ensemble.iter().enumerate() {
            self.data[i * self.cols + j] = v;
        }
        Ok(())
    }

    /// Removes row `i`, shrinking the set by one pattern.
    pub fn erase_pattern(&mut self, i: usize) -> Result<()> {
        if i >= self.rows {
            return Err(Error::PatternOutOfRange { index: i, size: self.rows });
        }
        let mut data = Vec::with_capacity((self.rows - 1) * self.cols);
        data.extend_from_slice(&self.data[..i * self.cols]);
        data.extend_from_slice(&self.data[(i + 1) * self.cols..]);
        self.data = data;
        self.rows -= 1;
        trace!("Pattern {i} removed, {} pattern(s) left", self.rows);
        Ok(())
    }

    /// Removes column `j`, shrinking every pattern by one feature.
    pub fn erase_ensemble(&mut self, j: usize) -> Result<()> {
        if j >= self.cols {
            return Err(Error::EnsembleOutOfRange { index: j, size: self.cols });
        }
        let mut data = Vec::with_capacity(self.rows * (self.cols - 1));
        for row in self.data.chunks_exact(self.cols) {
            data.extend_from_slice(&row[..j]);
            data.extend_from_slice(&row[j + 1..]);
        }
        self.data = data;
        self.cols -= 1;
        trace!("Ensemble {j} removed, {} ensemble(s) left", self.cols);
        Ok(())
    }

    /// Appends the rows of `other`. A mismatching pattern size fails and
    /// leaves `self` untouched; an empty `other` is a no-op.
    pub fn merge(&mut self, other: &PatternSet) -> Result<()> {
        if other.rows == 0 {
            return Ok(());
        }
        if self.cols != other.cols {
            debug!(
                "Cannot merge sets with {} and {} ensembles",
                self.cols, other.cols
            );
            return Err(Error::PatternSizeMismatch { left: self.cols, right: other.cols });
        }
        self.data.extend_from_slice(&other.data);
        self.rows += other.rows;
        trace!("Merged set now contains {} pattern(s)", self.rows);
        Ok(())
    }

    /// Randomly permutes the rows.
    pub fn shuffle(&mut self, rng: &mut RandomInteger) {
        let order = rng.permutation(self.rows);
        let mut data = Vec::with_capacity(self.data.len());
        for i in order {
            data.extend_from_slice(&self.data[i * self.cols..(i + 1) * self.cols]);
        }
        self.data = data;
    }

    /// Element-wise `self -= other`; both sets must have the same shape.
    pub fn subtract(&mut self, other: &PatternSet) -> Result<()> {
        if self.rows != other.rows {
            return Err(Error::LengthMismatch { expected: self.rows, found: other.rows });
        }
        if self.cols != other.cols {
            return Err(Error::PatternSizeMismatch { left: self.cols, right: other.cols });
        }
        for (a, b) in self.data.iter_mut().zip(other.data.iter()) {
            *a -= b;
        }
        Ok(())
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

    /// Replaces every pattern by `op(pattern)`. The operator output length
    /// must not vary and the operator must accept every pattern; otherwise
    /// nothing is changed and the error is returned.
    pub fn apply_pattern_op<O>(&mut self, op: &O) -> Result<()>
    where
        O: PatternOperator + ?Sized,
    {
        if self.rows == 0 {
            return Ok(());
        }
        let mut width = None;
        let mut data = Vec::new();
        for p in self.patterns() {
            let out = op.apply(&p)?;
            let expected = *width.get_or_insert(out.len());
            if out.len() != expected {
                debug!("PatternOperator generated patterns of different sizes");
                return Err(Error::NonStationaryOperator { expected, found: out.len() });
            }
            data.extend_from_slice(out.as_slice());
        }
        self.cols = width.unwrap_or(0);
        self.data = data;
        Ok(())
    }

    /// Replaces every ensemble by `op(ensemble)`. The operator output length
    /// (the new number of patterns) must not vary.
    pub fn apply_ensemble_op<O>(&mut self, op: &O) -> Result<()>
    where
        O: PatternOperator + ?Sized,
    {
        if self.cols == 0 {
            return Ok(());
        }
        let mut columns: Vec<Pattern> = Vec::with_capacity(self.cols);
        for e in self.ensembles() {
            let out = op.apply(&e)?;
            if let Some(first) = columns.first().map(Pattern::len) {
                if out.len() != first {
                    debug!("PatternOperator generated ensembles of different sizes");
                    return Err(Error::NonStationaryOperator { expected: first, found: out.len() });
                }
            }
            columns.push(out);
        }
        let rows = columns[0].len();
        let mut data = vec![0.0; rows * self.cols];
        for (j, column) in columns.iter().enumerate() {
            for (i, &v) in column.iter().enumerate() {
                data[i * self.cols + j] = v;
            }
        }
        self.rows = rows;
        self.data = data;
        Ok(())
    }

    /// Splits the set in two disjoint copies.
    ///
    /// `first = round(size * |prop|)` rows, ties to even, are taken from the
    /// top. With a positive `prop` those rows form the first returned set
    /// (train) and the remainder the second (test); a negative or zero `prop`
    /// swaps the roles.
    pub fn split(&self, prop: f64) -> Result<(PatternSet, PatternSet)> {
        if !(prop > -1.0 && prop < 1.0) {
            return Err(Error::InvalidProportion(prop));
        }
        let first = (self.rows as f64 * prop.abs()).round_ties_even() as usize;
        let head: Vec<usize> = (0..first).collect();
        let tail: Vec<usize> = (first..self.rows).collect();
        debug!(
            "Splitting {} pattern(s) by {}%: {} and {}",
            self.rows,
            prop.abs() * 100.0,
            first,
            self.rows - first
        );
        if prop > 0.0 {
            Ok((self.select(&head)?, self.select(&tail)?))
        } else {
            Ok((self.select(&tail)?, self.select(&head)?))
        }
    }
}

impl fmt::Display for PatternSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, p) in self.patterns().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "[{i}] {p}")?;
        }
        Ok(())
    }
}
