use std::fmt::Write as _;
use tracing::debug;

use crate::error::Result;
use crate::network::neuron::{Neuron, NeuronKind};
use crate::network::network::Network;

fn node(neuron: &Neuron) -> String {
    let id = neuron.id();
    match neuron.kind() {
        NeuronKind::Input(n) => format!(
            "  {id} [shape=box, style=filled, fillcolor=lightblue, label=\"in {id}\\n(x - {}) / {}\"];",
            n.subtract, n.divide
        ),
        NeuronKind::Bias(v) => format!("  {id} [shape=diamond, label=\"bias {id}\\n{v}\"];"),
        NeuronKind::Hidden(s) => format!(
            "  {id} [shape=circle, label=\"{id}\\n{}\"];",
            s.activation_function
        ),
        NeuronKind::Output(s) => format!(
            "  {id} [shape=doublecircle, style=filled, fillcolor=lightgrey, label=\"out {id}\\n{}\"];",
            s.activation_function
        ),
    }
}

impl Network {
    /// Graphviz description of the network, laid out left to right.
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph network {\n  rankdir=LR;\n");
        for neuron in self.neurons() {
            out.push_str(&node(neuron));
            out.push('\n');
        }
        for synapse in self.synapses() {
            if let Ok((from, to)) = synapse.ends() {
                let _ = writeln!(
                    out,
                    "  {from} -> {to} [label=\"({}) {:.4}\"];",
                    synapse.id(),
                    synapse.weight()
                );
            }
        }
        out.push_str("}\n");
        out
    }

    /// Writes [`Network::to_dot`] to `path`.
    pub fn dot(&self, path: &str) -> Result<()> {
        std::fs::write(path, self.to_dot())?;
        debug!("Graph written to \"{path}\"");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::network::mlp::{MlpBuilder, WeightInit};

    #[test]
    fn dot_lists_every_node_and_edge() {
        let net = MlpBuilder::new(2, vec![2], 1)
            .weights(WeightInit::Constant(0.5))
            .build()
            .unwrap();
        let dot = net.to_dot();
        assert!(dot.starts_with("digraph network {"));
        assert!(dot.contains("rankdir=LR"));
        assert_eq!(dot.matches(" -> ").count(), net.synapse_count());
        assert_eq!(dot.matches("shape=").count(), net.neuron_count());
        assert!(dot.contains("0.5000"));
    }
}
