use serde::{Serialize, Deserialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::optim::backprop::NeuronBackProp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeuronType {
    /// Takes external data.
    Input,
    /// Inputless, provides a constant.
    Bias,
    Hidden,
    Output,
}

impl NeuronType {
    pub fn name(&self) -> &'static str {
        match self {
            NeuronType::Input => "input",
            NeuronType::Bias => "bias",
            NeuronType::Hidden => "hidden",
            NeuronType::Output => "output",
        }
    }
}

impl fmt::Display for NeuronType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NeuronType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "input" => Ok(NeuronType::Input),
            "bias" => Ok(NeuronType::Bias),
            "hidden" => Ok(NeuronType::Hidden),
            "output" => Ok(NeuronType::Output),
            other => Err(Error::UnknownType { what: "neuron", name: other.to_string() }),
        }
    }
}

/// Activation strategy of a hidden or output neuron.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NeuronStrategy {
    BackPropagation(NeuronBackProp),
}

/// Input normalization: the neuron state is `(x - subtract) / divide`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Normalization {
    pub subtract: f64,
    pub divide: f64,
}

impl Default for Normalization {
    fn default() -> Self {
        Normalization { subtract: 0.0, divide: 1.0 }
    }
}

/// One neuron record of a network configuration.
///
/// Which optional fields are meaningful depends on `kind`: `bias` for bias
/// neurons, `normalization` for inputs and `strategy` for hidden and output
/// neurons. Consistency is checked when a `Network` is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeuronConfig {
    pub id: u32,
    #[serde(rename = "type")]
    pub kind: NeuronType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bias: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalization: Option<Normalization>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<NeuronStrategy>,
}

impl NeuronConfig {
    pub fn input(id: u32, normalization: Normalization) -> NeuronConfig {
        NeuronConfig {
            id,
            kind: NeuronType::Input,
            bias: None,
            normalization: Some(normalization),
            strategy: None,
        }
    }

    pub fn bias(id: u32, value: f64) -> NeuronConfig {
        NeuronConfig { id, kind: NeuronType::Bias, bias: Some(value), normalization: None, strategy: None }
    }

    pub fn hidden(id: u32, strategy: NeuronStrategy) -> NeuronConfig {
        NeuronConfig { id, kind: NeuronType::Hidden, bias: None, normalization: None, strategy: Some(strategy) }
    }

    pub fn output(id: u32, strategy: NeuronStrategy) -> NeuronConfig {
        NeuronConfig { id, kind: NeuronType::Output, bias: None, normalization: None, strategy: Some(strategy) }
    }
}
