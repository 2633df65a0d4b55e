use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::config::header::Header;
use crate::config::neuron::NeuronConfig;
use crate::config::synapse::SynapseConfig;
use crate::error::Result;

pub const CONFIG_VERSION: &str = "0.2";

fn default_version() -> String {
    CONFIG_VERSION.to_string()
}

/// The persisted shape of a network: a header plus the neuron and synapse
/// records that make up its layout.
///
/// Records are plain data; nothing here checks that ids are unique or that
/// synapses point at existing neurons. `Network::from_config` does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_version")]
    pub version: String,
    pub header: Header,
    pub neurons: Vec<NeuronConfig>,
    pub synapses: Vec<SynapseConfig>,
}

impl NetworkConfig {
    pub fn new(header: Header, neurons: Vec<NeuronConfig>, synapses: Vec<SynapseConfig>) -> NetworkConfig {
        NetworkConfig { version: default_version(), header, neurons, synapses }
    }

    /// Serializes the configuration to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        debug!("Network configuration saved to \"{path}\"");
        Ok(())
    }

    /// Deserializes a configuration from a JSON file.
    pub fn load_json(path: &str) -> Result<NetworkConfig> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let config: NetworkConfig = serde_json::from_reader(reader)?;
        debug!(
            "Network file \"{path}\" has {} neuron(s) and {} synapse(s)",
            config.neurons.len(),
            config.synapses.len()
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::ActivationFunction;
    use crate::config::neuron::{NeuronStrategy, NeuronType, Normalization};
    use crate::config::synapse::SynapseStrategy;
    use crate::optim::backprop::{NeuronBackProp, SynapseBackProp};

    #[test]
    fn json_layout() {
        let config = NetworkConfig::new(
            Header::new("me", "tiny", "1.0", ""),
            vec![
                NeuronConfig::input(1, Normalization::default()),
                NeuronConfig::output(
                    2,
                    NeuronStrategy::BackPropagation(NeuronBackProp::new(ActivationFunction::Tanh)),
                ),
            ],
            vec![SynapseConfig {
                id: 3,
                from: 1,
                to: 2,
                weight: 0.5,
                strategy: SynapseStrategy::BackPropagation(SynapseBackProp::plain(0.1)),
            }],
        );
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["neurons"][1]["type"], "output");
        assert_eq!(json["neurons"][1]["strategy"]["type"], "back_propagation");
        assert_eq!(json["neurons"][1]["strategy"]["activation_function"], "tanh");
        assert!(json["neurons"][0].get("strategy").is_none());
        assert_eq!(json["synapses"][0]["strategy"]["learning_rate"], 0.1);

        let back: NetworkConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn unknown_types_fail_to_parse() {
        let text = r#"{"header": {"author": "a", "name": "n", "version": "1", "created": 0},
                       "neurons": [{"id": 1, "type": "recurrent"}], "synapses": []}"#;
        assert!(serde_json::from_str::<NetworkConfig>(text).is_err());
        assert_eq!("bias".parse::<NeuronType>().unwrap(), NeuronType::Bias);
        assert!("recurrent".parse::<NeuronType>().is_err());
    }
}
