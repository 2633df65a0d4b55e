use tracing::debug;

use crate::activation::activation::ActivationFunction;
use crate::config::header::Header;
use crate::data::pattern::Pattern;
use crate::data::random::RandomInteger;
use crate::error::{Error, Result};
use crate::network::network::{pair_mut, Network};
use crate::network::neuron::{Neuron, NeuronKind};
use crate::network::synapse::Synapse;
use crate::optim::backprop::{NeuronBackProp, SynapseBackProp};

/// Initial synapse weights.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WeightInit {
    /// Uniform in `[-range, range)`.
    Uniform(f64),
    Constant(f64),
}

impl Default for WeightInit {
    fn default() -> Self {
        WeightInit::Uniform(0.1)
    }
}

/// Builds fully-connected layered networks.
///
/// Every neuron of layer `k` feeds every neuron of layer `k + 1`. A biased
/// layer gets one extra bias neuron (value 1) feeding each of its neurons.
/// By default every non-input layer is biased, hidden and output neurons
/// use `tanh` and synapses learn with rate 0.1, no momentum and no decay.
#[derive(Debug, Clone)]
pub struct MlpBuilder {
    input: usize,
    hidden: Vec<usize>,
    output: usize,
    bias: Option<Vec<bool>>,
    hidden_strategy: NeuronBackProp,
    output_strategy: NeuronBackProp,
    synapse_strategy: SynapseBackProp,
    subtract: Option<Pattern>,
    divide: Option<Pattern>,
    weights: WeightInit,
    seed: Option<u64>,
    header: Option<Header>,
}

impl MlpBuilder {
    pub fn new(input: usize, hidden: Vec<usize>, output: usize) -> MlpBuilder {
        MlpBuilder {
            input,
            hidden,
            output,
            bias: None,
            hidden_strategy: NeuronBackProp::new(ActivationFunction::Tanh),
            output_strategy: NeuronBackProp::new(ActivationFunction::Tanh),
            synapse_strategy: SynapseBackProp::plain(0.1),
            subtract: None,
            divide: None,
            weights: WeightInit::default(),
            seed: None,
            header: None,
        }
    }

    /// One flag per non-input layer, hidden layers first.
    pub fn bias(mut self, flags: Vec<bool>) -> Self {
        self.bias = Some(flags);
        self
    }

    pub fn hidden_activation(mut self, activation: ActivationFunction) -> Self {
        self.hidden_strategy = NeuronBackProp::new(activation);
        self
    }

    pub fn output_activation(mut self, activation: ActivationFunction) -> Self {
        self.output_strategy = NeuronBackProp::new(activation);
        self
    }

    pub fn synapse_strategy(mut self, rule: SynapseBackProp) -> Self {
        self.synapse_strategy = rule;
        self
    }

    /// Input neuron `i` computes `(x - subtract[i]) / divide[i]`.
    pub fn normalization(mut self, subtract: Pattern, divide: Pattern) -> Self {
        self.subtract = Some(subtract);
        self.divide = Some(divide);
        self
    }

    pub fn weights(mut self, init: WeightInit) -> Self {
        self.weights = init;
        self
    }

    /// Seeds both weight initialization and the network's epoch sampler.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn header(mut self, header: Header) -> Self {
        self.header = Some(header);
        self
    }

    fn validate(&self) -> Result<Vec<bool>> {
        if self.input == 0 || self.output == 0 || self.hidden.contains(&0) {
            return Err(Error::InvalidParameter(format!(
                "every layer needs at least one neuron, got {} {:?} {}",
                self.input, self.hidden, self.output
            )));
        }
        let layers = self.hidden.len() + 1;
        let bias = self.bias.clone().unwrap_or_else(|| vec![true; layers]);
        if bias.len() != layers {
            return Err(Error::LengthMismatch { expected: layers, found: bias.len() });
        }
        for v in [&self.subtract, &self.divide].into_iter().flatten() {
            if v.len() != self.input {
                return Err(Error::LengthMismatch { expected: self.input, found: v.len() });
            }
        }
        if let Some(divide) = &self.divide {
            if divide.iter().any(|&d| d == 0.0) {
                return Err(Error::InvalidParameter("zero input normalization divisor".to_string()));
            }
        }
        if let WeightInit::Uniform(range) = self.weights {
            if !(range > 0.0) {
                return Err(Error::InvalidParameter(format!("uniform weight range must be positive, got {range}")));
            }
        }
        self.synapse_strategy.validate()?;
        Ok(bias)
    }

    pub fn build(self) -> Result<Network> {
        let bias = self.validate()?;
        let mut rng = match self.seed {
            Some(seed) => RandomInteger::with_seed(seed),
            None => RandomInteger::new(),
        };

        let mut neurons = Vec::new();
        let mut synapses = Vec::new();
        let mut previous = Vec::with_capacity(self.input);
        for i in 0..self.input {
            let subtract = self.subtract.as_ref().map_or(0.0, |p| p[i]);
            let divide = self.divide.as_ref().map_or(1.0, |p| p[i]);
            previous.push(neurons.len());
            neurons.push(Neuron::input(subtract, divide));
        }

        let layers = self.hidden.iter().map(|&n| (n, false)).chain([(self.output, true)]);
        for ((size, is_output), biased) in layers.zip(bias) {
            let bias_neuron = if biased {
                neurons.push(Neuron::bias(1.0));
                Some(neurons.len() - 1)
            } else {
                None
            };
            let mut current = Vec::with_capacity(size);
            for _ in 0..size {
                current.push(neurons.len());
                neurons.push(Neuron::new(if is_output {
                    NeuronKind::Output(self.output_strategy)
                } else {
                    NeuronKind::Hidden(self.hidden_strategy)
                }));
            }
            for &dst in &current {
                for &src in previous.iter().chain(bias_neuron.iter()) {
                    let weight = match self.weights {
                        WeightInit::Uniform(range) => rng.uniform(-range, range),
                        WeightInit::Constant(w) => w,
                    };
                    let mut synapse = Synapse::new(weight, self.synapse_strategy);
                    let (from, to) = pair_mut(&mut neurons, src, dst);
                    synapse.connect(from, to)?;
                    synapses.push(synapse);
                }
            }
            previous = current;
        }

        debug!(
            "MLP {}-{:?}-{} built with {} neuron(s) and {} synapse(s)",
            self.input,
            self.hidden,
            self.output,
            neurons.len(),
            synapses.len()
        );
        let mut network = Network::from_parts(neurons, synapses)?.with_rng(rng);
        if let Some(header) = self.header {
            network.set_header(header);
        }
        Ok(network)
    }
}

/// Least-mean-square discriminator: a single linear output fed directly by
/// the normalized inputs, no hidden layer and no bias.
pub fn lms(input: usize, learning_rate: f64, subtract: Pattern, divide: Pattern) -> Result<Network> {
    MlpBuilder::new(input, Vec::new(), 1)
        .bias(vec![false])
        .output_activation(ActivationFunction::Identity)
        .synapse_strategy(SynapseBackProp::new(learning_rate, 0.0, 1.0)?)
        .normalization(subtract, divide)
        .build()
}
