use std::sync::atomic::Ordering;
use std::time::Instant;
use tracing::{debug, info};

use crate::config::network::NetworkConfig;
use crate::data::pattern_set::PatternSet;
use crate::error::{Error, Result};
use crate::loss::mse::MseLoss;
use crate::loss::sp::SpIndex;
use crate::network::network::Network;
use crate::train::epoch_stats::EpochStats;
use crate::train::train_config::{StopCriterion, TrainConfig};

/// Outcome of a `train_loop` run.
#[derive(Debug, Clone)]
pub struct TrainSummary {
    /// Epochs actually trained.
    pub epochs: usize,
    pub best_epoch: usize,
    /// Value of the stop criterion for the best network.
    pub best_value: f64,
    /// Snapshot of the best network seen.
    pub best: NetworkConfig,
    /// Whether the run ended because the criterion stabilized.
    pub converged: bool,
}

/// Data sets of a training session.
///
/// `train` / `train_target` feed the epochs (usually class balanced),
/// `monitor` / `monitor_target` is the original train set used for
/// reporting and `test` / `test_target` drives early stopping.
pub struct TrainData<'a> {
    pub train: &'a PatternSet,
    pub train_target: &'a PatternSet,
    pub monitor: &'a PatternSet,
    pub monitor_target: &'a PatternSet,
    pub test: &'a PatternSet,
    pub test_target: &'a PatternSet,
}

/// Trains `network` with sampled epochs until the stop criterion stabilizes,
/// the hard stop is reached, the stop flag is raised or the progress
/// receiver is dropped.
///
/// Every `sample_every` epochs the test set is evaluated; the relative
/// variation of the criterion against the previous evaluation is compared to
/// `stop_threshold`, and `stop_iterations` small variations in a row end the
/// run. The best network seen (lowest MSE or highest SP) is returned as a
/// configuration snapshot.
pub fn train_loop(network: &mut Network, data: &TrainData<'_>, config: &TrainConfig) -> Result<TrainSummary> {
    config.validate()?;
    if config.criterion == StopCriterion::Sp && network.output_size() != 1 {
        return Err(Error::InvalidParameter(format!(
            "the SP criterion needs a single output, the network has {}",
            network.output_size()
        )));
    }
    if data.test.is_empty() {
        return Err(Error::EmptySet("early stopping needs a test set"));
    }

    let mut best: Option<(usize, f64, NetworkConfig)> = None;
    let mut previous: Option<f64> = None;
    let mut remaining = config.stop_iterations;
    let mut converged = false;
    let mut epoch = 0;
    let mut output = PatternSet::zeros(0, 0);
    let mut t_start = Instant::now();

    loop {
        if config.hard_stop.is_some_and(|limit| epoch >= limit) {
            info!("Hard-stop limit of {epoch} epoch(s) reached, stopping");
            break;
        }
        if let Some(ref flag) = config.stop_flag {
            if flag.load(Ordering::Relaxed) {
                info!("Stop requested after {epoch} epoch(s)");
                break;
            }
        }

        network.train_epoch(data.train, data.train_target, config.epoch_size)?;
        epoch += 1;
        if (epoch - 1) % config.sample_every != 0 {
            continue;
        }

        network.run_set(data.test, &mut output)?;
        let test_mse = MseLoss::loss(&output, data.test_target)?;
        let test_sp = sp_if_possible(&output, data.test_target);
        network.run_set(data.monitor, &mut output)?;
        let train_mse = MseLoss::loss(&output, data.monitor_target)?;
        let train_sp = sp_if_possible(&output, data.monitor_target);

        let value = match config.criterion {
            StopCriterion::Mse => test_mse,
            StopCriterion::Sp => test_sp.map_or(0.0, |sp| sp.value),
        };
        let variation = match previous {
            Some(p) if p != 0.0 => (value - p).abs() / p.abs(),
            Some(_) if value == 0.0 => 0.0,
            _ => f64::INFINITY,
        };
        previous = Some(value);

        let improved = match (&best, config.criterion) {
            (None, _) => true,
            (Some((_, b, _)), StopCriterion::Mse) => value < *b,
            (Some((_, b, _)), StopCriterion::Sp) => value > *b,
        };
        if improved {
            debug!("Epoch {} gives the best network so far ({value:.6})", epoch - 1);
            best = Some((epoch - 1, value, network.dump()?));
        }

        if variation < config.stop_threshold {
            remaining -= 1;
            debug!("Detected possible stop in {remaining} more evaluation(s)");
        } else {
            remaining = config.stop_iterations;
        }

        match (config.criterion, test_sp) {
            (StopCriterion::Sp, Some(sp)) => info!(
                "[epoch {}] SP = {:.6} (variation = {variation:.6}) threshold = {:.4} eff = {:.2}% / {:.2}%",
                epoch - 1,
                sp.value,
                sp.threshold,
                sp.eff1 * 100.0,
                sp.eff2 * 100.0
            ),
            _ => info!("[epoch {}] MSE = {test_mse:.6} (variation = {variation:.6})", epoch - 1),
        }

        let stats = EpochStats {
            epoch: epoch - 1,
            test_mse,
            train_mse,
            test_sp,
            train_sp,
            variation,
            best: improved,
            elapsed_ms: t_start.elapsed().as_millis() as u64,
        };
        t_start = Instant::now();
        if let Some(ref tx) = config.progress_tx {
            // If the receiver has been dropped, stop training.
            if tx.send(stats).is_err() {
                break;
            }
        }

        if remaining == 0 {
            converged = true;
            info!("Stop criterion stabilized after {epoch} epoch(s)");
            break;
        }
    }

    let (best_epoch, best_value, best) = match best {
        Some(b) => b,
        None => (0, previous.unwrap_or(f64::NAN), network.dump()?),
    };
    Ok(TrainSummary { epochs: epoch, best_epoch, best_value, best, converged })
}

/// SP when the sets describe a single-output, two-class problem.
fn sp_if_possible(output: &PatternSet, target: &PatternSet) -> Option<SpIndex> {
    if output.pattern_size() != 1 {
        return None;
    }
    SpIndex::compute(output, target).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::mlp::{MlpBuilder, WeightInit};
    use std::sync::atomic::AtomicBool;
    use std::sync::{mpsc, Arc};

    fn xor() -> (PatternSet, PatternSet) {
        let data = PatternSet::from_rows(vec![
            vec![-1.0, -1.0],
            vec![-1.0, 1.0],
            vec![1.0, -1.0],
            vec![1.0, 1.0],
        ])
        .unwrap();
        let target = PatternSet::from_rows(vec![vec![-1.0], vec![1.0], vec![1.0], vec![-1.0]]).unwrap();
        (data, target)
    }

    fn session<'a>(data: &'a PatternSet, target: &'a PatternSet) -> TrainData<'a> {
        TrainData {
            train: data,
            train_target: target,
            monitor: data,
            monitor_target: target,
            test: data,
            test_target: target,
        }
    }

    #[test]
    fn hard_stop_bounds_the_run() {
        let (data, target) = xor();
        let mut net = MlpBuilder::new(2, vec![3], 1).seed(11).build().unwrap();
        let (tx, rx) = mpsc::channel();
        let mut config = TrainConfig::new(4, Some(20), StopCriterion::Mse);
        config.progress_tx = Some(tx);
        let summary = train_loop(&mut net, &session(&data, &target), &config).unwrap();
        assert_eq!(summary.epochs, 20);
        assert!(!summary.converged);
        let stats: Vec<EpochStats> = rx.try_iter().collect();
        assert_eq!(stats.len(), 4);
        assert_eq!(stats[0].epoch, 0);
        assert!(stats[0].best);
        let best_mse = stats.iter().map(|s| s.test_mse).fold(f64::INFINITY, f64::min);
        assert_eq!(summary.best_value, best_mse);
    }

    #[test]
    fn stable_criterion_converges() {
        let (data, target) = xor();
        // Zero weights into a tanh output: nothing ever moves.
        let mut net = MlpBuilder::new(2, vec![2], 1)
            .weights(WeightInit::Constant(0.0))
            .bias(vec![false, false])
            .build()
            .unwrap();
        let mut config = TrainConfig::new(4, Some(1000), StopCriterion::Mse);
        config.sample_every = 1;
        config.stop_iterations = 3;
        let summary = train_loop(&mut net, &session(&data, &target), &config).unwrap();
        assert!(summary.converged);
        assert_eq!(summary.epochs, 4);
        assert_eq!(summary.best_epoch, 0);
    }

    #[test]
    fn stop_flag_ends_the_run() {
        let (data, target) = xor();
        let mut net = MlpBuilder::new(2, vec![2], 1).seed(1).build().unwrap();
        let mut config = TrainConfig::new(4, None, StopCriterion::Sp);
        config.stop_flag = Some(Arc::new(AtomicBool::new(true)));
        let summary = train_loop(&mut net, &session(&data, &target), &config).unwrap();
        assert_eq!(summary.epochs, 0);
    }

    #[test]
    fn sp_needs_a_single_output() {
        let (data, _) = xor();
        let target = PatternSet::zeros(4, 2);
        let mut net = MlpBuilder::new(2, vec![2], 2).build().unwrap();
        let config = TrainConfig::new(4, Some(5), StopCriterion::Sp);
        assert!(matches!(
            train_loop(&mut net, &session(&data, &target), &config),
            Err(Error::InvalidParameter(_))
        ));
    }
}
