use thiserror::Error;

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Every failure the engine can signal.
///
/// Variants are grouped by kind: configuration, topology discipline, shape
/// and domain errors, plus wrapped I/O and JSON failures coming from
/// persistence.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration
    #[error("duplicated neuron id {0}")]
    DuplicateNeuron(u32),

    #[error("duplicated synapse id {0}")]
    DuplicateSynapse(u32),

    #[error("synapse {synapse} references unknown neuron {neuron}")]
    UnresolvedNeuron { synapse: u32, neuron: u32 },

    #[error("{kind} neuron {id} has no activation strategy")]
    MissingStrategy { id: u32, kind: &'static str },

    #[error("unknown {what} type \"{name}\"")]
    UnknownType { what: &'static str, name: String },

    #[error("network is not feed-forward: neuron {0} is part of a cycle")]
    NotFeedForward(u32),

    // Topology discipline
    #[error("neuron {id} is still connected to {synapses} synapse(s)")]
    ConnectedNeuron { id: u32, synapses: usize },

    #[error("synapse {0} is not connected at both ends")]
    UnconnectedSynapse(u32),

    // Shape
    #[error("pattern index {index} out of range (set has {size} patterns)")]
    PatternOutOfRange { index: usize, size: usize },

    #[error("ensemble index {index} out of range (set has {size} ensembles)")]
    EnsembleOutOfRange { index: usize, size: usize },

    #[error("length mismatch: expected {expected}, found {found}")]
    LengthMismatch { expected: usize, found: usize },

    #[error("pattern size mismatch: left has {left}, right has {right}")]
    PatternSizeMismatch { left: usize, right: usize },

    #[error("non-stationary operator: first output had {expected} values, later {found}")]
    NonStationaryOperator { expected: usize, found: usize },

    #[error("empty set: {0}")]
    EmptySet(&'static str),

    // Domain
    #[error("split proportion {0} is outside (-1, 1)")]
    InvalidProportion(f64),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("class {class} cannot be binary encoded in {width} position(s)")]
    TargetEncoding { class: usize, width: usize },

    // Persistence
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
