//! Electron / jet discrimination on synthetic ring energy profiles.
//!
//! Each event has 16 rings of energy around the hottest calorimeter cell.
//! Electrons deposit most of their energy in the first rings, jets spread it
//! out. The demo normalises the classes, trains an MLP with SP-based early
//! stopping and saves the best network in the system temp directory.
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example rings --release

use std::collections::BTreeMap;
use std::sync::mpsc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ringer_nn::data::{NormalizationOperator, TargetEncoding};
use ringer_nn::train::{StopCriterion, TrainData};
use ringer_nn::{Database, Header, MlpBuilder, Network, PatternSet, SynapseBackProp, TrainConfig, train_loop};
use tracing::info;
use tracing_subscriber::EnvFilter;

const RINGS: usize = 16;

/// Energy profile decaying with `spread` rings, plus noise.
fn events(rng: &mut StdRng, count: usize, spread: f64) -> ringer_nn::Result<PatternSet> {
    let rows = (0..count)
        .map(|_| {
            let energy = rng.gen_range(10.0..100.0);
            (0..RINGS)
                .map(|r| energy * (-(r as f64) / spread).exp() + rng.gen_range(0.0..1.0))
                .collect()
        })
        .collect();
    PatternSet::from_rows(rows)
}

fn main() -> ringer_nn::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut rng = StdRng::seed_from_u64(2006);
    let mut classes = BTreeMap::new();
    classes.insert("electron".to_string(), events(&mut rng, 400, 1.5)?);
    classes.insert("jet".to_string(), events(&mut rng, 1200, 5.0)?);
    let db = Database::new(Header::new("demo", "synthetic rings", "1.0", "generated"), classes)?;

    let (mut train_db, test_db) = db.split(0.5)?;
    let norm = NormalizationOperator::new(&train_db.merge()?);
    let monitor = train_db.merge()?;
    let monitor_target = train_db.merge_target(TargetEncoding::Minimal, -1.0, 1.0)?;
    train_db.normalise()?;
    let train = train_db.merge()?;
    let train_target = train_db.merge_target(TargetEncoding::Minimal, -1.0, 1.0)?;
    let test = test_db.merge()?;
    let test_target = test_db.merge_target(TargetEncoding::Minimal, -1.0, 1.0)?;
    info!("Balanced train set has {} pattern(s), test set {}", train.size(), test.size());

    let mut network = MlpBuilder::new(RINGS, vec![6], 1)
        .synapse_strategy(SynapseBackProp::new(0.05, 0.3, 1.0)?)
        .normalization(norm.mean().clone(), norm.std_dev().clone())
        .seed(1)
        .build()?;

    let (tx, rx) = mpsc::channel();
    let mut config = TrainConfig::new(32, Some(2000), StopCriterion::Sp);
    config.stop_iterations = 20;
    config.progress_tx = Some(tx);
    let data = TrainData {
        train: &train,
        train_target: &train_target,
        monitor: &monitor,
        monitor_target: &monitor_target,
        test: &test,
        test_target: &test_target,
    };
    let summary = train_loop(&mut network, &data, &config)?;
    let checks = rx.try_iter().count();
    info!(
        "Trained {} epoch(s), {checks} evaluation(s), best SP {:.4} at epoch {}",
        summary.epochs, summary.best_value, summary.best_epoch
    );

    let best = Network::from_config(&summary.best)?;
    let path = std::env::temp_dir().join("rings-best.json");
    let header = Header::new("demo", "rings MLP", "1.0", "best network of the demo run");
    best.save(&path.to_string_lossy(), Some(&header))?;
    Ok(())
}
