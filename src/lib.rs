pub mod error;
pub mod data;
pub mod activation;
pub mod optim;
pub mod config;
pub mod network;
pub mod loss;
pub mod train;

// Convenience re-exports
pub use error::{Error, Result};
pub use activation::activation::ActivationFunction;
pub use data::{Database, Ensemble, Feature, Pattern, PatternSet, RandomInteger};
pub use config::{Header, NetworkConfig};
pub use network::{lms, MlpBuilder, Network, Neuron, Synapse, WeightInit};
pub use loss::{relevance, MseLoss, SpIndex};
pub use optim::{NeuronBackProp, SynapseBackProp};
pub use train::{train_loop, train_network, TrainConfig};
