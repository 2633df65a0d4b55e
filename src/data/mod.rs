pub mod pattern;
pub mod pattern_set;
pub mod operator;
pub mod random;
pub mod target;
pub mod database;

pub use pattern::{Ensemble, Feature, Pattern};
pub use pattern_set::PatternSet;
pub use operator::{NormalizationOperator, PatternOperator, RemoveMeanOperator};
pub use random::RandomInteger;
pub use target::{make_target, TargetEncoding};
pub use database::Database;
