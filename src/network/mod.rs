pub mod dot;
pub mod mlp;
pub mod network;
pub mod neuron;
pub mod synapse;

pub use mlp::{lms, MlpBuilder, WeightInit};
pub use network::Network;
pub use neuron::{Neuron, NeuronKind};
pub use synapse::Synapse;
