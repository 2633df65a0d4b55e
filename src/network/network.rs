use std::collections::{HashMap, VecDeque};
use tracing::{debug, info, trace, warn};

use crate::config::header::Header;
use crate::config::network::NetworkConfig;
use crate::config::neuron::NeuronType;
use crate::data::pattern::{Feature, Pattern};
use crate::data::pattern_set::PatternSet;
use crate::data::random::RandomInteger;
use crate::error::{Error, Result};
use crate::network::neuron::Neuron;
use crate::network::synapse::Synapse;

/// Validated wiring of a neuron/synapse set.
struct Topology {
    neuron_index: HashMap<u32, usize>,
    synapse_index: HashMap<u32, usize>,
    inputs: Vec<usize>,
    biases: Vec<usize>,
    outputs: Vec<usize>,
    /// Neuron indices, sources before destinations.
    order: Vec<usize>,
    /// Per neuron: (synapse index, source neuron index) of every synapse
    /// feeding it.
    feeds: Vec<Vec<(usize, usize)>>,
}

impl Topology {
    fn build(neurons: &[Neuron], synapses: &[Synapse]) -> Result<Topology> {
        let mut neuron_index = HashMap::with_capacity(neurons.len());
        let (mut inputs, mut biases, mut outputs) = (Vec::new(), Vec::new(), Vec::new());
        for (i, n) in neurons.iter().enumerate() {
            if neuron_index.insert(n.id(), i).is_some() {
                return Err(Error::DuplicateNeuron(n.id()));
            }
            match n.neuron_type() {
                NeuronType::Input => inputs.push(i),
                NeuronType::Bias => biases.push(i),
                NeuronType::Output => outputs.push(i),
                NeuronType::Hidden => {}
            }
        }

        let mut synapse_index = HashMap::with_capacity(synapses.len());
        let mut feeds = vec![Vec::new(); neurons.len()];
        let mut successors: Vec<Vec<usize>> = vec![Vec::new(); neurons.len()];
        let mut pending = vec![0usize; neurons.len()];
        for (s, syn) in synapses.iter().enumerate() {
            if synapse_index.insert(syn.id(), s).is_some() {
                return Err(Error::DuplicateSynapse(syn.id()));
            }
            let (from, to) = syn.ends()?;
            let resolve = |neuron: u32| {
                neuron_index
                    .get(&neuron)
                    .copied()
                    .ok_or(Error::UnresolvedNeuron { synapse: syn.id(), neuron })
            };
            let (src, dst) = (resolve(from)?, resolve(to)?);
            if !neurons[dst].is_trainable() {
                warn!(
                    "Synapse {} ends at {} neuron {}, it will never carry a signal",
                    syn.id(),
                    neurons[dst].neuron_type(),
                    to
                );
                continue;
            }
            feeds[dst].push((s, src));
            successors[src].push(dst);
            pending[dst] += 1;
        }

        // Kahn's algorithm, seeded in construction order.
        let mut ready: VecDeque<usize> = (0..neurons.len()).filter(|&i| pending[i] == 0).collect();
        let mut order = Vec::with_capacity(neurons.len());
        while let Some(i) = ready.pop_front() {
            order.push(i);
            for &next in &successors[i] {
                pending[next] -= 1;
                if pending[next] == 0 {
                    ready.push_back(next);
                }
            }
        }
        if order.len() != neurons.len() {
            let stuck = pending.iter().position(|&p| p > 0).unwrap_or(0);
            return Err(Error::NotFeedForward(neurons[stuck].id()));
        }

        Ok(Topology { neuron_index, synapse_index, inputs, biases, outputs, order, feeds })
    }
}

/// A feed-forward network of neurons linked by synapses.
///
/// The network owns every neuron and synapse. Once built its topology only
/// changes through [`Network::adopt`]; running and training change neuron
/// states and synapse weights only.
pub struct Network {
    header: Option<Header>,
    neurons: Vec<Neuron>,
    synapses: Vec<Synapse>,
    topology: Topology,
    rng: RandomInteger,
}

impl Network {
    /// Builds the network described by `config`.
    pub fn from_config(config: &NetworkConfig) -> Result<Network> {
        let mut neurons = Vec::with_capacity(config.neurons.len());
        let mut index = HashMap::with_capacity(config.neurons.len());
        for record in &config.neurons {
            if index.insert(record.id, neurons.len()).is_some() {
                return Err(Error::DuplicateNeuron(record.id));
            }
            neurons.push(Neuron::from_config(record)?);
        }

        let mut synapses = Vec::with_capacity(config.synapses.len());
        for record in &config.synapses {
            let mut synapse = Synapse::from_config(record)?;
            let resolve = |neuron: u32| {
                index
                    .get(&neuron)
                    .copied()
                    .ok_or(Error::UnresolvedNeuron { synapse: record.id, neuron })
            };
            let (from, to) = (resolve(record.from)?, resolve(record.to)?);
            if from == to {
                return Err(Error::NotFeedForward(record.from));
            }
            let (src, dst) = pair_mut(&mut neurons, from, to);
            synapse.connect(src, dst)?;
            synapses.push(synapse);
        }

        let mut network = Network::from_parts(neurons, synapses)?;
        network.header = Some(config.header.clone());
        debug!(
            "Network \"{}\" built with {} neuron(s) and {} synapse(s)",
            config.header.name,
            network.neurons.len(),
            network.synapses.len()
        );
        Ok(network)
    }

    /// Loads a JSON configuration file and builds the network it describes.
    pub fn load(path: &str) -> Result<Network> {
        let config = NetworkConfig::load_json(path)?;
        Network::from_config(&config)
    }

    /// Takes ownership of an already connected neuron/synapse set.
    pub fn from_parts(neurons: Vec<Neuron>, synapses: Vec<Synapse>) -> Result<Network> {
        let topology = Topology::build(&neurons, &synapses)?;
        Ok(Network { header: None, neurons, synapses, topology, rng: RandomInteger::new() })
    }

    /// Replaces the whole topology with a new connected set.
    ///
    /// The new set is validated first: on error the current topology is
    /// kept. The old topology is torn down synapses first.
    pub fn adopt(&mut self, neurons: Vec<Neuron>, synapses: Vec<Synapse>) -> Result<()> {
        let topology = Topology::build(&neurons, &synapses)?;
        let old_neurons = std::mem::replace(&mut self.neurons, neurons);
        let old_synapses = std::mem::replace(&mut self.synapses, synapses);
        self.topology = topology;
        self.header = None;
        teardown(old_neurons, old_synapses);
        info!("Network adopted {} neuron(s) and {} synapse(s)", self.neurons.len(), self.synapses.len());
        Ok(())
    }

    /// Gives the neurons and synapses back, still connected.
    pub fn into_parts(self) -> (Vec<Neuron>, Vec<Synapse>) {
        (self.neurons, self.synapses)
    }

    /// Replaces the random source used by `train_epoch`.
    pub fn with_rng(mut self, rng: RandomInteger) -> Network {
        self.rng = rng;
        self
    }

    pub fn with_seed(self, seed: u64) -> Network {
        self.with_rng(RandomInteger::with_seed(seed))
    }

    pub fn header(&self) -> Option<&Header> {
        self.header.as_ref()
    }

    pub fn set_header(&mut self, header: Header) {
        self.header = Some(header);
    }

    pub fn input_size(&self) -> usize {
        self.topology.inputs.len()
    }

    pub fn output_size(&self) -> usize {
        self.topology.outputs.len()
    }

    pub fn neuron_count(&self) -> usize {
        self.neurons.len()
    }

    pub fn synapse_count(&self) -> usize {
        self.synapses.len()
    }

    pub fn neuron(&self, id: u32) -> Option<&Neuron> {
        self.topology.neuron_index.get(&id).map(|&i| &self.neurons[i])
    }

    pub fn synapse(&self, id: u32) -> Option<&Synapse> {
        self.topology.synapse_index.get(&id).map(|&i| &self.synapses[i])
    }

    /// Mutable synapse access, for weights. Topology cannot change through
    /// it since connecting needs the neurons.
    pub fn synapse_mut(&mut self, id: u32) -> Option<&mut Synapse> {
        let i = *self.topology.synapse_index.get(&id)?;
        Some(&mut self.synapses[i])
    }

    /// Neurons in construction order.
    pub fn neurons(&self) -> impl Iterator<Item = &Neuron> + '_ {
        self.neurons.iter()
    }

    pub fn synapses(&self) -> impl Iterator<Item = &Synapse> + '_ {
        self.synapses.iter()
    }

    pub fn inputs(&self) -> impl Iterator<Item = &Neuron> + '_ {
        self.topology.inputs.iter().map(|&i| &self.neurons[i])
    }

    pub fn biases(&self) -> impl Iterator<Item = &Neuron> + '_ {
        self.topology.biases.iter().map(|&i| &self.neurons[i])
    }

    pub fn outputs(&self) -> impl Iterator<Item = &Neuron> + '_ {
        self.topology.outputs.iter().map(|&i| &self.neurons[i])
    }

    /// Runs a single pattern. `output` is resized when its length does not
    /// match the number of output neurons.
    pub fn run(&mut self, input: &Pattern, output: &mut Pattern) -> Result<()> {
        let set = PatternSet::from_patterns(std::slice::from_ref(input))?;
        self.check_width(&set, self.input_size())?;
        self.forward(&set)?;
        if output.len() != self.output_size() {
            debug!("Resizing output pattern from {} to {}", output.len(), self.output_size());
            *output = Pattern::zeros(self.output_size());
        }
        for (k, &o) in self.topology.outputs.iter().enumerate() {
            output[k] = self.neurons[o].state()[0];
        }
        Ok(())
    }

    /// Runs every pattern of `input` in one batch. `output` is resized when
    /// its shape does not match.
    pub fn run_set(&mut self, input: &PatternSet, output: &mut PatternSet) -> Result<()> {
        self.check_width(input, self.input_size())?;
        self.forward(input)?;
        if output.size() != input.size() || output.pattern_size() != self.output_size() {
            debug!(
                "Resizing output set from {}x{} to {}x{}",
                output.size(),
                output.pattern_size(),
                input.size(),
                self.output_size()
            );
            *output = PatternSet::zeros(input.size(), self.output_size());
        }
        self.collect_outputs(output)
    }

    /// Online training on a single pattern.
    pub fn train(&mut self, data: &Pattern, target: &Pattern) -> Result<()> {
        let data = PatternSet::from_patterns(std::slice::from_ref(data))?;
        let target = PatternSet::from_patterns(std::slice::from_ref(target))?;
        self.train_set(&data, &target)
    }

    /// One batch update over the whole set: a single weight change per
    /// synapse, using the batch mean of the gradient.
    pub fn train_set(&mut self, data: &PatternSet, target: &PatternSet) -> Result<()> {
        self.check_training_shapes(data, target)?;
        if data.is_empty() {
            debug!("Training on an empty set, nothing done");
            return Ok(());
        }
        self.forward(data)?;
        let mut error = target.clone();
        let mut output = PatternSet::zeros(data.size(), self.output_size());
        self.collect_outputs(&mut output)?;
        error.subtract(&output)?;
        self.backward(&error)
    }

    /// Draws `epoch_size` patterns with replacement and trains on them as
    /// one batch.
    pub fn train_epoch(&mut self, data: &PatternSet, target: &PatternSet, epoch_size: usize) -> Result<()> {
        self.check_training_shapes(data, target)?;
        if epoch_size == 0 {
            debug!("Epoch of size 0, nothing done");
            return Ok(());
        }
        if data.is_empty() {
            return Err(Error::EmptySet("cannot sample an epoch from an empty set"));
        }
        let picks = self.rng.draw(data.size(), epoch_size);
        trace!("Epoch drew {} of {} pattern(s)", picks.len(), data.size());
        self.train_set(&data.select(&picks)?, &target.select(&picks)?)
    }

    /// The configuration describing this network, header included.
    pub fn dump(&self) -> Result<NetworkConfig> {
        let header = self.header.clone().unwrap_or_else(Header::placeholder);
        self.dump_with(header)
    }

    /// Saves the network as JSON. The header written is `header` when given,
    /// else the one the network was loaded with, else a placeholder.
    pub fn save(&self, path: &str, header: Option<&Header>) -> Result<()> {
        let header = match header {
            Some(h) => h.clone(),
            None => match &self.header {
                Some(h) => h.clone(),
                None => {
                    warn!("Saving network without a header, using a placeholder");
                    Header::placeholder()
                }
            },
        };
        let config = self.dump_with(header)?;
        config.save_json(path)?;
        info!("Network saved to \"{path}\"");
        Ok(())
    }

    fn dump_with(&self, header: Header) -> Result<NetworkConfig> {
        let neurons = self.neurons.iter().map(Neuron::dump).collect();
        let synapses = self.synapses.iter().map(Synapse::dump).collect::<Result<Vec<_>>>()?;
        Ok(NetworkConfig::new(header, neurons, synapses))
    }

    fn check_width(&self, set: &PatternSet, expected: usize) -> Result<()> {
        if set.pattern_size() != expected {
            return Err(Error::LengthMismatch { expected, found: set.pattern_size() });
        }
        Ok(())
    }

    fn check_training_shapes(&self, data: &PatternSet, target: &PatternSet) -> Result<()> {
        self.check_width(data, self.input_size())?;
        self.check_width(target, self.output_size())?;
        if data.size() != target.size() {
            return Err(Error::LengthMismatch { expected: data.size(), found: target.size() });
        }
        Ok(())
    }

    /// Propagates `input` through the graph. Widths are checked by callers.
    fn forward(&mut self, input: &PatternSet) -> Result<()> {
        let batch = input.size();
        for (k, &i) in self.topology.inputs.iter().enumerate() {
            let column = input.ensemble(k)?;
            self.neurons[i].run(column.as_slice());
        }
        let width = vec![0.0; batch];
        for &b in &self.topology.biases {
            self.neurons[b].run(&width);
        }
        for &n in &self.topology.order {
            if !self.neurons[n].is_trainable() {
                continue;
            }
            let mut sum = vec![0.0; batch];
            for &(s, src) in &self.topology.feeds[n] {
                self.synapses[s].forward(self.neurons[src].state().as_slice(), &mut sum)?;
            }
            self.neurons[n].run(&sum);
        }
        Ok(())
    }

    /// Back-propagates `error` (target minus output, one column per output
    /// neuron) in reverse topological order.
    fn backward(&mut self, error: &PatternSet) -> Result<()> {
        let batch = error.size();
        let mut errors: Vec<Vec<Feature>> = vec![vec![0.0; batch]; self.neurons.len()];
        for (k, &o) in self.topology.outputs.iter().enumerate() {
            for (acc, e) in errors[o].iter_mut().zip(error.ensemble(k)?.iter()) {
                *acc += e;
            }
        }
        for &n in self.topology.order.iter().rev() {
            let delta = match self.neurons[n].train(&errors[n]) {
                Some(delta) => delta,
                None => continue,
            };
            for &(s, src) in &self.topology.feeds[n] {
                let upstream = self.synapses[s].train(delta.as_slice(), self.neurons[src].state().as_slice())?;
                for (acc, u) in errors[src].iter_mut().zip(upstream) {
                    *acc += u;
                }
            }
        }
        Ok(())
    }

    fn collect_outputs(&self, output: &mut PatternSet) -> Result<()> {
        for (k, &o) in self.topology.outputs.iter().enumerate() {
            output.set_ensemble(k, self.neurons[o].state())?;
        }
        Ok(())
    }
}

/// Two distinct mutable elements of a slice.
pub(crate) fn pair_mut<T>(items: &mut [T], a: usize, b: usize) -> (&mut T, &mut T) {
    assert_ne!(a, b, "pair_mut needs two distinct indices");
    if a < b {
        let (head, tail) = items.split_at_mut(b);
        (&mut head[a], &mut tail[0])
    } else {
        let (head, tail) = items.split_at_mut(a);
        (&mut tail[0], &mut head[b])
    }
}

/// Disconnects every synapse, then destroys the neurons.
fn teardown(mut neurons: Vec<Neuron>, synapses: Vec<Synapse>) {
    let index: HashMap<u32, usize> = neurons.iter().enumerate().map(|(i, n)| (n.id(), i)).collect();
    for mut synapse in synapses {
        let Ok((from, to)) = synapse.ends() else { continue };
        if let (Some(&a), Some(&b)) = (index.get(&from), index.get(&to)) {
            if a != b {
                let (src, dst) = pair_mut(&mut neurons, a, b);
                if let Err(e) = synapse.disconnect(src, dst) {
                    warn!("Tearing down synapse {}: {e}", synapse.id());
                }
            }
        }
    }
    for neuron in neurons {
        if let Err(e) = neuron.destroy() {
            warn!("Tearing down network: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::ActivationFunction;
    use crate::config::neuron::{NeuronConfig, NeuronStrategy, Normalization};
    use crate::config::synapse::{SynapseConfig, SynapseStrategy};
    use crate::optim::backprop::{NeuronBackProp, SynapseBackProp};
    use approx::assert_relative_eq;

    fn linear() -> NeuronStrategy {
        NeuronStrategy::BackPropagation(NeuronBackProp::new(ActivationFunction::Identity))
    }

    fn link(id: u32, from: u32, to: u32, weight: f64) -> SynapseConfig {
        SynapseConfig {
            id,
            from,
            to,
            weight,
            strategy: SynapseStrategy::BackPropagation(SynapseBackProp::plain(0.1)),
        }
    }

    /// in(1) --0.5--> out(3) <--0.25-- bias(2)
    fn tiny() -> NetworkConfig {
        NetworkConfig::new(
            Header::new("tests", "tiny", "1", ""),
            vec![
                NeuronConfig::input(101, Normalization::default()),
                NeuronConfig::bias(102, 1.0),
                NeuronConfig::output(103, linear()),
            ],
            vec![link(201, 101, 103, 0.5), link(202, 102, 103, 0.25)],
        )
    }

    #[test]
    fn runs_a_linear_unit() {
        let mut net = Network::from_config(&tiny()).unwrap();
        assert_eq!((net.input_size(), net.output_size()), (1, 1));
        let mut out = Pattern::zeros(3);
        net.run(&Pattern::from(vec![2.0]), &mut out).unwrap();
        assert_eq!(out.len(), 1);
        assert_relative_eq!(out[0], 1.25);
    }

    #[test]
    fn train_moves_weights_towards_target() {
        let mut net = Network::from_config(&tiny()).unwrap();
        net.train(&Pattern::from(vec![2.0]), &Pattern::from(vec![2.25])).unwrap();
        // error 1, delta 1: w += 0.1 * 1 * source
        assert_relative_eq!(net.synapse(201).unwrap().weight(), 0.7);
        assert_relative_eq!(net.synapse(202).unwrap().weight(), 0.35);
    }

    #[test]
    fn input_width_is_checked_before_running() {
        let mut net = Network::from_config(&tiny()).unwrap();
        let before = net.neuron(103).unwrap().state().clone();
        let mut out = Pattern::zeros(1);
        let err = net.run(&Pattern::from(vec![1.0, 2.0]), &mut out);
        assert!(matches!(err, Err(Error::LengthMismatch { expected: 1, found: 2 })));
        assert_eq!(net.neuron(103).unwrap().state(), &before);
    }

    #[test]
    fn configuration_errors() {
        let mut dup = tiny();
        dup.neurons.push(NeuronConfig::bias(102, 1.0));
        assert!(matches!(Network::from_config(&dup), Err(Error::DuplicateNeuron(102))));

        let mut dup = tiny();
        dup.synapses.push(link(201, 102, 103, 1.0));
        assert!(matches!(Network::from_config(&dup), Err(Error::DuplicateSynapse(201))));

        let mut dangling = tiny();
        dangling.synapses.push(link(203, 101, 999, 1.0));
        assert!(matches!(
            Network::from_config(&dangling),
            Err(Error::UnresolvedNeuron { synapse: 203, neuron: 999 })
        ));
    }

    #[test]
    fn cycles_are_rejected() {
        let config = NetworkConfig::new(
            Header::placeholder(),
            vec![
                NeuronConfig::input(301, Normalization::default()),
                NeuronConfig::hidden(302, linear()),
                NeuronConfig::hidden(303, linear()),
                NeuronConfig::output(304, linear()),
            ],
            vec![
                link(401, 301, 302, 1.0),
                link(402, 302, 303, 1.0),
                link(403, 303, 302, 1.0),
                link(404, 303, 304, 1.0),
            ],
        );
        assert!(matches!(Network::from_config(&config), Err(Error::NotFeedForward(_))));
    }

    #[test]
    fn dump_restores_the_configuration() {
        let config = tiny();
        let net = Network::from_config(&config).unwrap();
        assert_eq!(net.dump().unwrap(), config);
    }

    #[test]
    fn adopt_keeps_old_topology_on_error() {
        let mut net = Network::from_config(&tiny()).unwrap();
        let a = Neuron::input(0.0, 1.0);
        let b = Neuron::with_id(a.id(), crate::network::neuron::NeuronKind::Bias(1.0));
        assert!(net.adopt(vec![a, b], vec![]).is_err());
        assert_eq!(net.neuron_count(), 3);

        let mut i = Neuron::input(0.0, 1.0);
        let mut o = Neuron::output(ActivationFunction::Tanh);
        let mut s = Synapse::new(1.0, SynapseBackProp::plain(0.1));
        s.connect(&mut i, &mut o).unwrap();
        net.adopt(vec![i, o], vec![s]).unwrap();
        assert_eq!((net.neuron_count(), net.synapse_count()), (2, 1));
        assert!(net.header().is_none());
        assert!(net.neuron(101).is_none());
    }

    #[test]
    fn epoch_sampling_needs_data() {
        let mut net = Network::from_config(&tiny()).unwrap().with_seed(3);
        let empty_in = PatternSet::zeros(0, 1);
        let empty_out = PatternSet::zeros(0, 1);
        assert!(net.train_epoch(&empty_in, &empty_out, 0).is_ok());
        assert!(matches!(net.train_epoch(&empty_in, &empty_out, 4), Err(Error::EmptySet(_))));
        assert!(net.train_set(&empty_in, &empty_out).is_ok());
    }

    #[test]
    fn batch_update_follows_the_loss_gradient() {
        let lr = 0.05;
        let net = crate::network::mlp::MlpBuilder::new(2, vec![3], 2)
            .weights(crate::network::mlp::WeightInit::Uniform(0.8))
            .synapse_strategy(SynapseBackProp::plain(lr))
            .seed(21)
            .build()
            .unwrap();
        let data = PatternSet::from_rows(vec![vec![0.3, -0.7], vec![-0.5, 0.2], vec![0.9, 0.4]]).unwrap();
        let target = PatternSet::from_rows(vec![vec![0.5, -0.2], vec![-0.6, 0.1], vec![0.2, 0.7]]).unwrap();
        let config = net.dump().unwrap();

        // 0.5 * mean over patterns of the squared error sum.
        let loss = |weight: f64, id: u32| {
            let mut net = Network::from_config(&config).unwrap();
            net.synapse_mut(id).unwrap().set_weight(weight);
            let mut out = PatternSet::zeros(0, 0);
            net.run_set(&data, &mut out).unwrap();
            let diff: f64 = out.as_slice().iter().zip(target.as_slice()).map(|(y, t)| (t - y).powi(2)).sum();
            0.5 * diff / data.size() as f64
        };

        let first_input = net.inputs().next().unwrap();
        let hidden_link = first_input.outgoing()[0];
        let output_link = net.outputs().next().unwrap().incoming()[0];
        for id in [hidden_link, output_link] {
            let w = net.synapse(id).unwrap().weight();
            let h = 1e-6;
            let numeric = (loss(w + h, id) - loss(w - h, id)) / (2.0 * h);

            let mut trained = Network::from_config(&config).unwrap();
            trained.train_set(&data, &target).unwrap();
            let analytic = -(trained.synapse(id).unwrap().weight() - w) / lr;
            assert_relative_eq!(analytic, numeric, max_relative = 1e-5, epsilon = 1e-9);
        }
    }
}
