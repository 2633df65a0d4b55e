use serde::{Serialize, Deserialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::config::header::Header;
use crate::data::operator::PatternOperator;
use crate::data::pattern::Feature;
use crate::data::pattern_set::PatternSet;
use crate::data::random::RandomInteger;
use crate::data::target::TargetEncoding;
use crate::error::{Error, Result};

/// Labelled data: one `PatternSet` per class name, all with the same
/// pattern size. Classes are kept in name order, which also fixes the class
/// index used for target encoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Database {
    header: Header,
    classes: BTreeMap<String, PatternSet>,
}

impl Database {
    pub fn new(header: Header, classes: BTreeMap<String, PatternSet>) -> Result<Database> {
        let db = Database { header, classes };
        db.check_pattern_sizes()?;
        debug!("Database \"{}\" created with {} class(es)", db.header.name, db.size());
        Ok(db)
    }

    fn check_pattern_sizes(&self) -> Result<()> {
        check_pattern_sizes(&self.classes)
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Number of classes.
    pub fn size(&self) -> usize {
        self.classes.len()
    }

    /// Total number of patterns over all classes.
    pub fn total_patterns(&self) -> usize {
        self.classes.values().map(PatternSet::size).sum()
    }

    pub fn pattern_size(&self) -> usize {
        self.classes
            .values()
            .find(|s| !s.is_empty())
            .map_or(0, PatternSet::pattern_size)
    }

    pub fn class_names(&self) -> Vec<String> {
        self.classes.keys().cloned().collect()
    }

    pub fn data(&self, class: &str) -> Option<&PatternSet> {
        self.classes.get(class)
    }

    pub fn classes(&self) -> &BTreeMap<String, PatternSet> {
        &self.classes
    }

    /// All classes stacked in class order.
    pub fn merge(&self) -> Result<PatternSet> {
        let mut merged = PatternSet::zeros(0, self.pattern_size());
        for set in self.classes.values() {
            merged.merge(set)?;
        }
        Ok(merged)
    }

    /// Targets parallel to `merge()`: one row per pattern, encoding the
    /// class index with `encoding`, `min` meaning off and `max` meaning on.
    pub fn merge_target(&self, encoding: TargetEncoding, min: Feature, max: Feature) -> Result<PatternSet> {
        let classes = self.size();
        let mut target = PatternSet::new(self.total_patterns(), encoding.width(classes), min);
        let mut row = 0;
        for (class, set) in self.classes.values().enumerate() {
            let code = encoding.encode(class, classes, min, max)?;
            for _ in 0..set.size() {
                target.set_pattern(row, &code)?;
                row += 1;
            }
        }
        Ok(target)
    }

    /// Balances the classes: every class more than 10% smaller than the
    /// largest one is grown by replicating its own patterns.
    pub fn normalise(&mut self) -> Result<()> {
        let greater = self.classes.values().map(PatternSet::size).max().unwrap_or(0);
        let limit = 0.9 * greater as f64;
        for (name, set) in self.classes.iter_mut() {
            if set.is_empty() {
                warn!("Class \"{name}\" is empty and cannot be normalised");
                continue;
            }
            if (set.size() as f64) >= limit {
                continue;
            }
            if (set.size() as f64) <= 0.5 * greater as f64 {
                let n_times = ((greater / set.size()) as f64).log2().floor() as usize;
                debug!(
                    "Class \"{name}\" ({}) is less than half of {greater}, doubling it {n_times} time(s)",
                    set.size()
                );
                for _ in 0..n_times {
                    let copy = set.clone();
                    set.merge(&copy)?;
                }
            }
            if (set.size() as f64) < limit {
                let to_copy = greater - set.size();
                debug!("Class \"{name}\" ({}) grows by {to_copy} pattern(s)", set.size());
                let head: Vec<usize> = (0..to_copy.min(set.size())).collect();
                let extra = set.select(&head)?;
                set.merge(&extra)?;
            }
        }
        Ok(())
    }

    /// Splits every class with `PatternSet::split(prop)` and returns the
    /// (train, test) databases.
    pub fn split(&self, prop: f64) -> Result<(Database, Database)> {
        if !(prop > -1.0 && prop < 1.0) {
            return Err(Error::InvalidProportion(prop));
        }
        let mut train = BTreeMap::new();
        let mut test = BTreeMap::new();
        for (name, set) in &self.classes {
            let (a, b) = set.split(prop)?;
            debug!("Class \"{name}\" gives {} train and {} test pattern(s)", a.size(), b.size());
            train.insert(name.clone(), a);
            test.insert(name.clone(), b);
        }
        Ok((
            Database { header: self.header.derived(" (TRAIN)"), classes: train },
            Database { header: self.header.derived(" (TEST)"), classes: test },
        ))
    }

    pub fn shuffle(&mut self, rng: &mut RandomInteger) {
        for set in self.classes.values_mut() {
            set.shuffle(rng);
        }
    }

    /// Applies `op` to every pattern of every class. The classes are
    /// transformed on copies and replaced only when all of them succeed.
    pub fn apply_pattern_op<O>(&mut self, op: &O) -> Result<()>
    where
        O: PatternOperator + ?Sized,
    {
        let mut classes = self.classes.clone();
        for set in classes.values_mut() {
            set.apply_pattern_op(op)?;
        }
        check_pattern_sizes(&classes)?;
        self.classes = classes;
        Ok(())
    }

    /// Same as `apply_pattern_op`, over the ensembles of every class.
    pub fn apply_ensemble_op<O>(&mut self, op: &O) -> Result<()>
    where
        O: PatternOperator + ?Sized,
    {
        let mut classes = self.classes.clone();
        for set in classes.values_mut() {
            set.apply_ensemble_op(op)?;
        }
        self.classes = classes;
        Ok(())
    }

    /// Serializes the database to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        info!("Database saved to \"{path}\"");
        Ok(())
    }

    /// Deserializes a database previously written by `save_json`.
    pub fn load_json(path: &str) -> Result<Database> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let db: Database = serde_json::from_reader(reader)?;
        db.check_pattern_sizes()?;
        for (name, set) in &db.classes {
            info!("Database class \"{name}\" has {} entries", set.size());
        }
        Ok(db)
    }
}

/// Non-empty classes must share one pattern size.
fn check_pattern_sizes(classes: &BTreeMap<String, PatternSet>) -> Result<()> {
    let mut sizes = classes.iter().filter(|(_, s)| !s.is_empty());
    if let Some((_, first)) = sizes.next() {
        for (name, set) in sizes {
            if set.pattern_size() != first.pattern_size() {
                debug!(
                    "Class \"{name}\" has pattern size {} instead of {}",
                    set.pattern_size(),
                    first.pattern_size()
                );
                return Err(Error::PatternSizeMismatch {
                    left: first.pattern_size(),
                    right: set.pattern_size(),
                });
            }
        }
    }
    Ok(())
}
