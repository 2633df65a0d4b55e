use serde::{Serialize, Deserialize};
use std::f64::consts::E;
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationFunction {
    Tanh,
    Sigmoid,
    /// Identity; persisted as "linear".
    #[serde(rename = "linear")]
    Identity,
}

impl ActivationFunction {
    pub fn function(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Tanh => x.tanh(),
            ActivationFunction::Sigmoid => 1.0 / (1.0 + E.powf(-x)),
            ActivationFunction::Identity => x,
        }
    }

    /// Derivative of the activation expressed in terms of its output
    /// `y = function(x)`. Neurons only keep their activated state, so this
    /// is the form back-propagation needs.
    pub fn derivative(&self, y: f64) -> f64 {
        match self {
            ActivationFunction::Tanh => 1.0 - y * y,
            ActivationFunction::Sigmoid => y * (1.0 - y),
            ActivationFunction::Identity => 1.0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ActivationFunction::Tanh => "tanh",
            ActivationFunction::Sigmoid => "sigmoid",
            ActivationFunction::Identity => "linear",
        }
    }
}

impl fmt::Display for ActivationFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ActivationFunction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tanh" => Ok(ActivationFunction::Tanh),
            "sigmoid" => Ok(ActivationFunction::Sigmoid),
            "linear" | "identity" => Ok(ActivationFunction::Identity),
            other => Err(Error::UnknownType { what: "activation function", name: other.to_string() }),
        }
    }
}
