use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::error::{Error, Result};

/// Back-propagation parameters of a hidden or output neuron.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeuronBackProp {
    pub activation_function: ActivationFunction,
}

impl NeuronBackProp {
    pub fn new(activation_function: ActivationFunction) -> NeuronBackProp {
        NeuronBackProp { activation_function }
    }
}

/// Back-propagation weight update rule of a synapse.
///
/// `learning_rate` is the live value: it is multiplied by
/// `learning_rate_decay` after every update, so a saved network carries the
/// decayed rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SynapseBackProp {
    pub learning_rate: f64,
    #[serde(default)]
    pub momentum: f64,
    #[serde(default = "no_decay")]
    pub learning_rate_decay: f64,
}

fn no_decay() -> f64 {
    1.0
}

impl SynapseBackProp {
    pub fn new(learning_rate: f64, momentum: f64, learning_rate_decay: f64) -> Result<SynapseBackProp> {
        let rule = SynapseBackProp { learning_rate, momentum, learning_rate_decay };
        rule.validate()?;
        Ok(rule)
    }

    /// Plain gradient descent: no momentum, no decay.
    pub fn plain(learning_rate: f64) -> SynapseBackProp {
        SynapseBackProp { learning_rate, momentum: 0.0, learning_rate_decay: 1.0 }
    }

    /// Learning rate must be positive, momentum in `[0, 1)` and decay in
    /// `(0, 1]`.
    pub fn validate(&self) -> Result<()> {
        if !(self.learning_rate > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "learning rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if !(0.0..1.0).contains(&self.momentum) {
            return Err(Error::InvalidParameter(format!(
                "momentum must be in [0, 1), got {}",
                self.momentum
            )));
        }
        if !(self.learning_rate_decay > 0.0 && self.learning_rate_decay <= 1.0) {
            return Err(Error::InvalidParameter(format!(
                "learning rate decay must be in (0, 1], got {}",
                self.learning_rate_decay
            )));
        }
        Ok(())
    }

    /// Weight change for one update.
    ///
    /// `gradient` is the batch mean of `delta * source_state`. Returns
    /// `learning_rate * gradient + momentum * previous` and decays the
    /// learning rate.
    pub fn step(&mut self, gradient: f64, previous: f64) -> f64 {
        let change = self.learning_rate * gradient + self.momentum * previous;
        self.learning_rate *= self.learning_rate_decay;
        change
    }
}
