pub mod backprop;

pub use backprop::{NeuronBackProp, SynapseBackProp};
