use std::sync::atomic::{AtomicU32, Ordering};
use tracing::{debug, trace};

use crate::activation::activation::ActivationFunction;
use crate::config::neuron::{NeuronConfig, NeuronStrategy, NeuronType, Normalization};
use crate::data::pattern::{Ensemble, Feature};
use crate::error::{Error, Result};
use crate::optim::backprop::NeuronBackProp;

static NEXT_ID: AtomicU32 = AtomicU32::new(1);

/// Hands out a fresh neuron id.
fn next_id() -> u32 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Makes sure fresh ids never collide with an explicitly chosen one.
fn reserve_id(id: u32) {
    NEXT_ID.fetch_max(id.saturating_add(1), Ordering::Relaxed);
}

/// The closed set of neuron variants and their per-variant parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NeuronKind {
    Input(Normalization),
    Bias(Feature),
    Hidden(NeuronBackProp),
    Output(NeuronBackProp),
}

impl NeuronKind {
    pub fn neuron_type(&self) -> NeuronType {
        match self {
            NeuronKind::Input(_) => NeuronType::Input,
            NeuronKind::Bias(_) => NeuronType::Bias,
            NeuronKind::Hidden(_) => NeuronType::Hidden,
            NeuronKind::Output(_) => NeuronType::Output,
        }
    }

    pub fn activation(&self) -> Option<ActivationFunction> {
        match self {
            NeuronKind::Hidden(s) | NeuronKind::Output(s) => Some(s.activation_function),
            _ => None,
        }
    }
}

/// A computation node of the network graph.
///
/// The neuron keeps its last state (one value per pattern of the batch) and
/// the ids of the synapses attached to it. It does not own those synapses,
/// and it refuses to be destroyed while any is still attached.
#[derive(Debug)]
pub struct Neuron {
    id: u32,
    kind: NeuronKind,
    state: Ensemble,
    incoming: Vec<u32>,
    outgoing: Vec<u32>,
}

impl Neuron {
    /// A neuron with a fresh process-unique id.
    pub fn new(kind: NeuronKind) -> Neuron {
        Neuron::with_id(next_id(), kind)
    }

    pub fn with_id(id: u32, kind: NeuronKind) -> Neuron {
        reserve_id(id);
        Neuron {
            id,
            kind,
            state: Ensemble::zeros(1),
            incoming: Vec::new(),
            outgoing: Vec::new(),
        }
    }

    pub fn input(subtract: Feature, divide: Feature) -> Neuron {
        Neuron::new(NeuronKind::Input(Normalization { subtract, divide }))
    }

    pub fn bias(value: Feature) -> Neuron {
        Neuron::new(NeuronKind::Bias(value))
    }

    pub fn hidden(activation: ActivationFunction) -> Neuron {
        Neuron::new(NeuronKind::Hidden(NeuronBackProp::new(activation)))
    }

    pub fn output(activation: ActivationFunction) -> Neuron {
        Neuron::new(NeuronKind::Output(NeuronBackProp::new(activation)))
    }

    /// Instantiates the variant declared in `config`.
    ///
    /// Hidden and output neurons need a strategy; input and bias neurons
    /// must not carry one.
    pub fn from_config(config: &NeuronConfig) -> Result<Neuron> {
        let kind = match (config.kind, config.strategy) {
            (NeuronType::Input, None) => NeuronKind::Input(config.normalization.unwrap_or_default()),
            (NeuronType::Bias, None) => match config.bias {
                Some(value) => NeuronKind::Bias(value),
                None => {
                    return Err(Error::InvalidParameter(format!("bias neuron {} has no value", config.id)));
                }
            },
            (NeuronType::Hidden, Some(NeuronStrategy::BackPropagation(s))) => NeuronKind::Hidden(s),
            (NeuronType::Output, Some(NeuronStrategy::BackPropagation(s))) => NeuronKind::Output(s),
            (NeuronType::Hidden, None) | (NeuronType::Output, None) => {
                debug!("{} neuron {} declared without a strategy", config.kind, config.id);
                return Err(Error::MissingStrategy { id: config.id, kind: config.kind.name() });
            }
            (kind, Some(_)) => {
                return Err(Error::InvalidParameter(format!(
                    "{kind} neuron {} cannot take an activation strategy",
                    config.id
                )));
            }
        };
        if let NeuronKind::Input(n) = kind {
            if n.divide == 0.0 {
                return Err(Error::InvalidParameter(format!(
                    "input neuron {} has a zero normalization divisor",
                    config.id
                )));
            }
        }
        trace!("Created {} neuron {}", config.kind, config.id);
        Ok(Neuron::with_id(config.id, kind))
    }

    /// The configuration record describing this neuron.
    pub fn dump(&self) -> NeuronConfig {
        match self.kind {
            NeuronKind::Input(n) => NeuronConfig::input(self.id, n),
            NeuronKind::Bias(v) => NeuronConfig::bias(self.id, v),
            NeuronKind::Hidden(s) => NeuronConfig::hidden(self.id, NeuronStrategy::BackPropagation(s)),
            NeuronKind::Output(s) => NeuronConfig::output(self.id, NeuronStrategy::BackPropagation(s)),
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn kind(&self) -> &NeuronKind {
        &self.kind
    }

    pub fn neuron_type(&self) -> NeuronType {
        self.kind.neuron_type()
    }

    /// Hidden and output neurons learn; inputs and biases are sources only.
    pub fn is_trainable(&self) -> bool {
        matches!(self.kind, NeuronKind::Hidden(_) | NeuronKind::Output(_))
    }

    pub fn state(&self) -> &Ensemble {
        &self.state
    }

    pub fn incoming(&self) -> &[u32] {
        &self.incoming
    }

    pub fn outgoing(&self) -> &[u32] {
        &self.outgoing
    }

    pub fn is_connected(&self) -> bool {
        !self.incoming.is_empty() || !self.outgoing.is_empty()
    }

    /// Computes and stores the new state from `signal`.
    ///
    /// For an input neuron `signal` is the external data, normalized on the
    /// way in. A bias neuron only uses its length (the batch width). Hidden
    /// and output neurons receive the weighted sum of their inputs and apply
    /// their activation function.
    pub fn run(&mut self, signal: &[Feature]) -> &Ensemble {
        let state: Vec<Feature> = match self.kind {
            NeuronKind::Input(n) => signal.iter().map(|x| (x - n.subtract) / n.divide).collect(),
            NeuronKind::Bias(v) => vec![v; signal.len()],
            NeuronKind::Hidden(s) | NeuronKind::Output(s) => signal
                .iter()
                .map(|&x| s.activation_function.function(x))
                .collect(),
        };
        if state.len() != self.state.len() {
            trace!("Neuron {} capacity changes from {} to {}", self.id, self.state.len(), state.len());
        }
        self.state = Ensemble::from_vec(state);
        &self.state
    }

    /// The local error gradient `error * f'(state)` for trainable neurons.
    /// Input and bias neurons have nothing upstream and return `None`.
    pub fn train(&self, error: &[Feature]) -> Option<Ensemble> {
        match self.kind {
            NeuronKind::Hidden(s) | NeuronKind::Output(s) => Some(Ensemble::from_vec(
                error
                    .iter()
                    .zip(self.state.iter())
                    .map(|(e, &y)| e * s.activation_function.derivative(y))
                    .collect(),
            )),
            _ => {
                trace!("Teaching {} neuron {} is an empty action", self.neuron_type(), self.id);
                None
            }
        }
    }

    /// Attaches an incoming synapse. Inputs and biases have no incoming
    /// side: the call is ignored. Returns whether the synapse was added.
    pub fn in_connect(&mut self, synapse: u32) -> bool {
        if !self.is_trainable() {
            debug!("In-connecting {} neuron {} is forbidden, nothing done", self.neuron_type(), self.id);
            return false;
        }
        attach(&mut self.incoming, self.id, synapse)
    }

    pub fn in_disconnect(&mut self, synapse: u32) -> bool {
        if !self.is_trainable() {
            debug!("In-disconnecting {} neuron {} is forbidden, nothing done", self.neuron_type(), self.id);
            return false;
        }
        detach(&mut self.incoming, self.id, synapse)
    }

    pub fn out_connect(&mut self, synapse: u32) -> bool {
        attach(&mut self.outgoing, self.id, synapse)
    }

    pub fn out_disconnect(&mut self, synapse: u32) -> bool {
        detach(&mut self.outgoing, self.id, synapse)
    }

    /// Consumes the neuron. Fails while synapses are still attached; tear
    /// those down first.
    pub fn destroy(self) -> Result<()> {
        if self.is_connected() {
            debug!("Trying to destroy neuron {} that is still connected", self.id);
            return Err(Error::ConnectedNeuron {
                id: self.id,
                synapses: self.incoming.len() + self.outgoing.len(),
            });
        }
        Ok(())
    }
}

fn attach(list: &mut Vec<u32>, neuron: u32, synapse: u32) -> bool {
    if list.contains(&synapse) {
        debug!("Synapse {synapse} already attached to neuron {neuron}, no action taken");
        return false;
    }
    list.push(synapse);
    true
}

fn detach(list: &mut Vec<u32>, neuron: u32, synapse: u32) -> bool {
    match list.iter().position(|&s| s == synapse) {
        Some(pos) => {
            list.remove(pos);
            true
        }
        None => {
            debug!("Synapse {synapse} is not attached to neuron {neuron}, no action taken");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn ids_are_unique() {
        let a = Neuron::bias(1.0);
        let b = Neuron::bias(1.0);
        assert_ne!(a.id(), b.id());
        let fixed = Neuron::with_id(b.id() + 1000, NeuronKind::Bias(1.0));
        assert!(Neuron::bias(1.0).id() > fixed.id());
    }

    #[test]
    fn input_normalizes_its_data() {
        let mut n = Neuron::input(1.0, 2.0);
        assert_eq!(n.run(&[3.0, -1.0]).as_slice(), &[1.0, -1.0]);
        assert!(n.train(&[1.0, 1.0]).is_none());
    }

    #[test]
    fn bias_state_is_constant() {
        let mut n = Neuron::bias(0.5);
        assert_eq!(n.run(&[9.0, 9.0, 9.0]).as_slice(), &[0.5, 0.5, 0.5]);
    }

    #[test]
    fn hidden_activates_and_computes_delta() {
        let mut n = Neuron::hidden(ActivationFunction::Tanh);
        let y = n.run(&[0.5])[0];
        assert_relative_eq!(y, 0.5_f64.tanh());
        let delta = n.train(&[2.0]).unwrap();
        assert_relative_eq!(delta[0], 2.0 * (1.0 - y * y));
    }

    #[test]
    fn connections_are_idempotent() {
        let mut n = Neuron::output(ActivationFunction::Identity);
        assert!(n.in_connect(7));
        assert!(!n.in_connect(7));
        assert_eq!(n.incoming(), &[7]);
        assert!(n.in_disconnect(7));
        assert!(!n.in_disconnect(7));
        assert!(!n.out_disconnect(3));
    }

    #[test]
    fn inputs_ignore_incoming_synapses() {
        let mut n = Neuron::input(0.0, 1.0);
        assert!(!n.in_connect(1));
        assert!(n.incoming().is_empty());
        assert!(!n.is_connected());
    }

    #[test]
    fn connected_neuron_cannot_be_destroyed() {
        let mut n = Neuron::input(0.0, 1.0);
        n.out_connect(42);
        let id = n.id();
        assert!(matches!(n.destroy(), Err(Error::ConnectedNeuron { id: i, synapses: 1 }) if i == id));

        let mut n = Neuron::input(0.0, 1.0);
        n.out_connect(42);
        n.out_disconnect(42);
        assert!(n.destroy().is_ok());
    }

    #[test]
    fn config_validation() {
        let missing = NeuronConfig {
            id: 9,
            kind: NeuronType::Hidden,
            bias: None,
            normalization: None,
            strategy: None,
        };
        assert!(matches!(
            Neuron::from_config(&missing),
            Err(Error::MissingStrategy { id: 9, kind: "hidden" })
        ));
        let mut misplaced = NeuronConfig::bias(10, 1.0);
        misplaced.strategy = Some(NeuronStrategy::BackPropagation(NeuronBackProp::new(
            ActivationFunction::Sigmoid,
        )));
        assert!(matches!(Neuron::from_config(&misplaced), Err(Error::InvalidParameter(_))));

        let mut valueless = NeuronConfig::bias(12, 1.0);
        valueless.bias = None;
        assert!(matches!(Neuron::from_config(&valueless), Err(Error::InvalidParameter(_))));

        let ok = NeuronConfig::bias(11, -1.0);
        let n = Neuron::from_config(&ok).unwrap();
        assert_eq!(n.dump(), ok);
    }
}
