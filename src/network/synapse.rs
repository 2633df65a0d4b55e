use std::sync::atomic::{AtomicU32, Ordering};
use tracing::{debug, trace};

use crate::config::synapse::{SynapseConfig, SynapseStrategy};
use crate::data::pattern::Feature;
use crate::error::{Error, Result};
use crate::network::neuron::Neuron;
use crate::optim::backprop::SynapseBackProp;

static NEXT_ID: AtomicU32 = AtomicU32::new(1);

/// A weighted, directed edge between two neurons.
///
/// The synapse records the ids of its ends and mirrors the link in the
/// neurons' own synapse lists. Running or teaching an unconnected synapse
/// is an error.
#[derive(Debug)]
pub struct Synapse {
    id: u32,
    from: Option<u32>,
    to: Option<u32>,
    weight: f64,
    rule: SynapseBackProp,
    previous_change: f64,
}

impl Synapse {
    pub fn new(weight: f64, rule: SynapseBackProp) -> Synapse {
        Synapse::with_id(NEXT_ID.fetch_add(1, Ordering::Relaxed), weight, rule)
    }

    pub fn with_id(id: u32, weight: f64, rule: SynapseBackProp) -> Synapse {
        NEXT_ID.fetch_max(id.saturating_add(1), Ordering::Relaxed);
        Synapse { id, from: None, to: None, weight, rule, previous_change: 0.0 }
    }

    /// Unconnected synapse built from its record. The ends named in the
    /// record are resolved by the network.
    pub fn from_config(config: &SynapseConfig) -> Result<Synapse> {
        let SynapseStrategy::BackPropagation(rule) = config.strategy;
        rule.validate()?;
        Ok(Synapse::with_id(config.id, config.weight, rule))
    }

    pub fn dump(&self) -> Result<SynapseConfig> {
        let (from, to) = self.ends()?;
        Ok(SynapseConfig {
            id: self.id,
            from,
            to,
            weight: self.weight,
            strategy: SynapseStrategy::BackPropagation(self.rule),
        })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn set_weight(&mut self, weight: f64) {
        self.weight = weight;
    }

    pub fn rule(&self) -> &SynapseBackProp {
        &self.rule
    }

    pub fn from(&self) -> Option<u32> {
        self.from
    }

    pub fn to(&self) -> Option<u32> {
        self.to
    }

    pub fn is_connected(&self) -> bool {
        self.from.is_some() && self.to.is_some()
    }

    /// Source and destination neuron ids.
    pub fn ends(&self) -> Result<(u32, u32)> {
        match (self.from, self.to) {
            (Some(from), Some(to)) => Ok((from, to)),
            _ => Err(Error::UnconnectedSynapse(self.id)),
        }
    }

    /// Links `from` to `to` through this synapse.
    ///
    /// Reconnecting to the same pair is a no-op. A synapse already linking
    /// other neurons must be disconnected first.
    pub fn connect(&mut self, from: &mut Neuron, to: &mut Neuron) -> Result<()> {
        if let (Some(f), Some(t)) = (self.from, self.to) {
            if f == from.id() && t == to.id() {
                debug!("Synapse {} already connects {f} to {t}, no action taken", self.id);
                return Ok(());
            }
            return Err(Error::InvalidParameter(format!(
                "synapse {} already connects {f} to {t}",
                self.id
            )));
        }
        from.out_connect(self.id);
        to.in_connect(self.id);
        self.from = Some(from.id());
        self.to = Some(to.id());
        trace!("Synapse {} connects {} to {}", self.id, from.id(), to.id());
        Ok(())
    }

    /// Detaches the synapse from both ends, which must be the neurons it
    /// currently links.
    pub fn disconnect(&mut self, from: &mut Neuron, to: &mut Neuron) -> Result<()> {
        let (f, t) = self.ends()?;
        if f != from.id() || t != to.id() {
            return Err(Error::InvalidParameter(format!(
                "synapse {} connects {f} to {t}, not {} to {}",
                self.id,
                from.id(),
                to.id()
            )));
        }
        from.out_disconnect(self.id);
        to.in_disconnect(self.id);
        self.from = None;
        self.to = None;
        Ok(())
    }

    /// Adds `weight * source` into `sum`, element by element.
    pub fn forward(&self, source: &[Feature], sum: &mut [Feature]) -> Result<()> {
        self.ends()?;
        for (acc, x) in sum.iter_mut().zip(source) {
            *acc += self.weight * x;
        }
        Ok(())
    }

    /// Updates the weight from the destination's `delta` and the source
    /// state, and returns the error to propagate to the source neuron,
    /// computed with the weight as it was before the update.
    pub fn train(&mut self, delta: &[Feature], source: &[Feature]) -> Result<Vec<Feature>> {
        self.ends()?;
        let upstream: Vec<Feature> = delta.iter().map(|d| d * self.weight).collect();
        if delta.is_empty() {
            return Ok(upstream);
        }
        let gradient = delta.iter().zip(source).map(|(d, x)| d * x).sum::<f64>() / delta.len() as f64;
        let change = self.rule.step(gradient, self.previous_change);
        self.weight += change;
        self.previous_change = change;
        Ok(upstream)
    }
}
