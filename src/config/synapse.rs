use serde::{Serialize, Deserialize};

use crate::optim::backprop::SynapseBackProp;

/// Weight update strategy of a synapse.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SynapseStrategy {
    BackPropagation(SynapseBackProp),
}

/// One synapse record: a weighted edge between two configured neurons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynapseConfig {
    pub id: u32,
    pub from: u32,
    pub to: u32,
    pub weight: f64,
    pub strategy: SynapseStrategy,
}
