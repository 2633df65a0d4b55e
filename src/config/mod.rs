pub mod header;
pub mod neuron;
pub mod synapse;
pub mod network;

pub use header::Header;
pub use neuron::{NeuronConfig, NeuronStrategy, NeuronType, Normalization};
pub use synapse::{SynapseConfig, SynapseStrategy};
pub use network::NetworkConfig;
