use approx::assert_relative_eq;
use ringer_nn::config::{NeuronStrategy, NeuronType};
use ringer_nn::network::NeuronKind;
use ringer_nn::{
    ActivationFunction, Error, Header, MlpBuilder, MseLoss, Network, Neuron, Pattern, PatternSet, Synapse,
    SynapseBackProp, WeightInit, train_network,
};

fn xor_inputs() -> PatternSet {
    PatternSet::from_rows(vec![vec![0.0, 0.0], vec![0.0, 1.0], vec![1.0, 0.0], vec![1.0, 1.0]]).unwrap()
}

fn xor_targets() -> PatternSet {
    PatternSet::from_rows(vec![vec![0.0], vec![1.0], vec![1.0], vec![0.0]]).unwrap()
}

fn xor_network() -> Network {
    MlpBuilder::new(2, vec![2], 1)
        .hidden_activation(ActivationFunction::Tanh)
        .output_activation(ActivationFunction::Tanh)
        .synapse_strategy(SynapseBackProp::plain(0.1))
        .weights(WeightInit::Constant(0.5))
        .build()
        .unwrap()
}

fn mse(network: &mut Network, inputs: &PatternSet, targets: &PatternSet) -> f64 {
    let mut output = PatternSet::zeros(0, 0);
    network.run_set(inputs, &mut output).unwrap();
    MseLoss::loss(&output, targets).unwrap()
}

#[test]
fn xor_outputs_are_reproducible_without_training() {
    let mut net = xor_network();
    let inputs = xor_inputs();
    let mut first = Vec::new();
    let mut output = Pattern::zeros(1);
    for row in inputs.patterns() {
        net.run(&row, &mut output).unwrap();
        first.push(output[0]);
    }
    for (row, expected) in inputs.patterns().zip(&first) {
        net.run(&row, &mut output).unwrap();
        assert_eq!(output[0], *expected);
    }
    // (0, 0): hidden tanh(0.5), output tanh(0.5 * 2 * tanh(0.5) + 0.5)
    let h = 0.5_f64.tanh();
    assert_relative_eq!(first[0], (h + 0.5).tanh(), epsilon = 1e-12);
}

#[test]
fn batch_run_matches_single_runs() {
    let mut net = MlpBuilder::new(2, vec![3], 2).seed(4).build().unwrap();
    let inputs = xor_inputs();
    let mut batch = PatternSet::zeros(1, 1);
    net.run_set(&inputs, &mut batch).unwrap();
    assert_eq!((batch.size(), batch.pattern_size()), (4, 2));
    let mut single = Pattern::zeros(2);
    for i in 0..inputs.size() {
        net.run(&inputs.pattern(i).unwrap(), &mut single).unwrap();
        for (a, b) in single.iter().zip(batch.row(i).unwrap()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-12);
        }
    }
}

#[test]
fn online_xor_training_lowers_the_error() {
    let mut net = xor_network();
    let (inputs, targets) = (xor_inputs(), xor_targets());
    let before = mse(&mut net, &inputs, &targets);
    let mut after = before;
    for _ in 0..100 {
        after = train_network(&mut net, &inputs, &targets).unwrap();
    }
    assert!(after < before, "MSE went from {before} to {after}");
}

#[test]
fn sampled_epochs_are_reproducible() {
    let (inputs, targets) = (xor_inputs(), xor_targets());
    let weights = || {
        let mut net = xor_network().with_seed(99);
        for _ in 0..50 {
            net.train_epoch(&inputs, &targets, 3).unwrap();
        }
        net.synapses().map(Synapse::weight).collect::<Vec<_>>()
    };
    assert_eq!(weights(), weights());
}

#[test]
fn save_and_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("net.json");
    let path = path.to_str().unwrap();

    let mut net = MlpBuilder::new(3, vec![4], 2)
        .synapse_strategy(SynapseBackProp::new(0.2, 0.1, 0.99).unwrap())
        .seed(21)
        .build()
        .unwrap();
    let data = PatternSet::from_rows(vec![vec![0.1, 0.2, 0.3], vec![-0.3, 0.0, 1.0]]).unwrap();
    let target = PatternSet::from_rows(vec![vec![1.0, -1.0], vec![-1.0, 1.0]]).unwrap();
    net.train_set(&data, &target).unwrap();

    let header = Header::new("tests", "round trip", "1.0", "");
    net.save(path, Some(&header)).unwrap();
    let mut back = Network::load(path).unwrap();

    assert_eq!(back.header(), Some(&header));
    assert_eq!(back.neuron_count(), net.neuron_count());
    assert_eq!(back.synapse_count(), net.synapse_count());
    for synapse in net.synapses() {
        let twin = back.synapse(synapse.id()).unwrap();
        assert_relative_eq!(twin.weight(), synapse.weight(), epsilon = 1e-12);
        assert_relative_eq!(twin.rule().learning_rate, synapse.rule().learning_rate, epsilon = 1e-12);
        assert_relative_eq!(twin.rule().momentum, synapse.rule().momentum, epsilon = 1e-12);
        assert_eq!((twin.from(), twin.to()), (synapse.from(), synapse.to()));
    }
    for neuron in net.neurons() {
        assert_eq!(back.neuron(neuron.id()).unwrap().kind(), neuron.kind());
    }

    let (mut a, mut b) = (PatternSet::zeros(0, 0), PatternSet::zeros(0, 0));
    net.run_set(&data, &mut a).unwrap();
    back.run_set(&data, &mut b).unwrap();
    for (x, y) in a.as_slice().iter().zip(b.as_slice()) {
        assert_relative_eq!(*x, *y, epsilon = 1e-9);
    }

    // Without an argument the loaded header is kept.
    back.save(path, None).unwrap();
    assert_eq!(Network::load(path).unwrap().header(), Some(&header));
}

#[test]
fn dump_describes_every_neuron() {
    let net = xor_network();
    let config = net.dump().unwrap();
    assert_eq!(config.neurons.len(), 2 + 1 + 2 + 1 + 1);
    let hidden: Vec<_> = config.neurons.iter().filter(|n| n.kind == NeuronType::Hidden).collect();
    assert_eq!(hidden.len(), 2);
    assert!(hidden.iter().all(|n| matches!(
        n.strategy,
        Some(NeuronStrategy::BackPropagation(s)) if s.activation_function == ActivationFunction::Tanh
    )));
    assert!(config.synapses.iter().all(|s| s.weight == 0.5));
}

#[test]
fn connected_input_neuron_cannot_be_destroyed() {
    let net = xor_network();
    let (neurons, _synapses) = net.into_parts();
    let input = neurons
        .into_iter()
        .find(|n| matches!(n.kind(), NeuronKind::Input(_)))
        .unwrap();
    assert_eq!(input.outgoing().len(), 2);
    assert!(matches!(input.destroy(), Err(Error::ConnectedNeuron { synapses: 2, .. })));
}

#[test]
fn parts_can_be_adopted_by_another_network() {
    let mut target = MlpBuilder::new(5, vec![], 1).build().unwrap();
    let (neurons, synapses) = xor_network().into_parts();
    target.adopt(neurons, synapses).unwrap();
    assert_eq!((target.input_size(), target.output_size()), (2, 1));
    assert_eq!(target.biases().count(), 2);

    let mut orphan = Synapse::new(1.0, SynapseBackProp::plain(0.1));
    let mut a = Neuron::input(0.0, 1.0);
    let mut b = Neuron::output(ActivationFunction::Sigmoid);
    orphan.connect(&mut a, &mut b).unwrap();
    // `b` is left out: the synapse end cannot be resolved.
    let err = target.adopt(vec![a], vec![orphan]);
    assert!(matches!(err, Err(Error::UnresolvedNeuron { .. })));
    assert_eq!(target.input_size(), 2);
}
