use log::{debug, error, info};

use crate::data::{inject_missing, load_dataset, SequenceBatch};
use crate::error::ImputeError;
use crate::metrics::{masked_mae, AccuracyTracker};
use crate::model::Imputer;
use crate::optim::Sgd;
use crate::train::config::SessionConfig;
use crate::train::fit::fit_epoch;
use crate::train::persist::save_artifacts;
use crate::train::progress::{FinalMetrics, ProgressMessage, ProgressSink, TerminalMessage};

/// Runs one training session end to end and reports through `sink`.
///
/// The client always receives either progress messages ending in a single
/// done message, or a single error message; never a stream that just stops.
/// The one exception is disconnection: once a send fails, nothing further is
/// attempted and the session winds down quietly.
pub fn run_session<S: ProgressSink>(sink: &mut S, config: &SessionConfig) {
    match drive(sink, config) {
        Ok(()) => info!("session completed after {} epochs", config.epochs),
        Err(ImputeError::ChannelDisconnected) => {
            debug!("client disconnected; session abandoned");
        }
        Err(err) => {
            error!("session failed: {}", err);
            let terminal = ProgressMessage::Terminal(TerminalMessage::Error {
                message: err.to_string(),
            });
            // A failed send here means the client is also gone; there is
            // nobody left to tell.
            let _ = sink.send(&terminal);
        }
    }
}

/// The session state machine: Loading → Looping → Persisting → Done.
/// Every fault propagates out to `run_session`, which turns it into the
/// session's single terminal error message.
fn drive<S: ProgressSink>(sink: &mut S, config: &SessionConfig) -> Result<(), ImputeError> {
    // ── Loading ──────────────────────────────────────────────────────────
    let truth = load_dataset(&config.dataset_path)?;
    let (_, time_steps, features) = truth.shape();
    info!(
        "loaded dataset '{}': {} steps x {} features",
        config.dataset_path.display(),
        time_steps,
        features
    );

    let (masked, mask) = inject_missing(&truth, config.missing_rate, config.seed);
    info!(
        "hid {} of {} entries (rate {}, seed {})",
        mask.count(),
        time_steps * features,
        config.missing_rate,
        config.seed
    );

    let mut model = Imputer::new(config.model.clone(), features, config.seed);
    let optimizer = Sgd::new(config.model.learning_rate);
    let mut tracker = AccuracyTracker::new();
    let mut last_step: Option<(f64, f64, SequenceBatch)> = None;

    // ── Looping ──────────────────────────────────────────────────────────
    for epoch in 1..=config.epochs {
        fit_epoch(&mut model, &masked, &optimizer).map_err(ImputeError::TrainingFault)?;

        // A full imputation every step, purely to measure masked-position
        // error; the reported loss *is* that MAE.
        let imputed = model.impute(&masked).map_err(ImputeError::TrainingFault)?;
        let mae = masked_mae(&truth, &imputed, &mask);
        let accuracy = tracker.observe(mae);

        let update = ProgressMessage::Epoch { epoch, loss: mae, accuracy };
        sink.send(&update).map_err(|_| ImputeError::ChannelDisconnected)?;

        // Yield so the channel can flush before the next blocking fit call.
        if !config.step_delay.is_zero() {
            std::thread::sleep(config.step_delay);
        }

        last_step = Some((mae, accuracy, imputed));
    }

    let (mae, accuracy, imputed) = last_step
        .ok_or_else(|| ImputeError::TrainingFault("no training steps were run".to_owned()))?;

    // ── Persisting ───────────────────────────────────────────────────────
    let (weights_path, imputed_path) = save_artifacts(&model, &imputed, &config.output_dir)?;
    info!(
        "artifacts written: {} and {}",
        weights_path.display(),
        imputed_path.display()
    );

    // ── Done ─────────────────────────────────────────────────────────────
    let done = ProgressMessage::Terminal(TerminalMessage::Done {
        metrics: FinalMetrics { mae, accuracy },
        model_path: weights_path.display().to_string(),
        imputed_path: imputed_path.display().to_string(),
    });
    sink.send(&done).map_err(|_| ImputeError::ChannelDisconnected)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelConfig;
    use crate::train::progress::{SinkClosed, VecSink};
    use std::time::Duration;

    fn test_config(dir: &std::path::Path) -> SessionConfig {
        SessionConfig {
            dataset_path: dir.join("pems.npy"),
            output_dir: dir.join("public"),
            epochs: 3,
            missing_rate: 0.1,
            seed: 42,
            step_delay: Duration::ZERO,
            model: ModelConfig::tiny(),
        }
    }

    #[test]
    fn missing_dataset_sends_exactly_one_error_message() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());

        let mut sink = VecSink::default();
        run_session(&mut sink, &config);

        assert_eq!(sink.messages.len(), 1);
        match &sink.messages[0] {
            ProgressMessage::Terminal(TerminalMessage::Error { message }) => {
                assert!(message.ends_with("pems.npy' not found"), "{}", message);
            }
            other => panic!("expected an error terminal, got {:?}", other),
        }
    }

    /// Accepts `limit` messages, then reports the client as gone.
    struct DisconnectingSink {
        limit: usize,
        received: Vec<ProgressMessage>,
    }

    impl ProgressSink for DisconnectingSink {
        fn send(&mut self, message: &ProgressMessage) -> Result<(), SinkClosed> {
            if self.received.len() >= self.limit {
                return Err(SinkClosed);
            }
            self.received.push(message.clone());
            Ok(())
        }
    }

    #[test]
    fn disconnection_stops_the_stream_without_a_terminal_message() {
        let dir = tempfile::tempdir().unwrap();
        let values: Vec<f64> = (0..150).map(|i| (i as f64 * 0.1).sin()).collect();
        std::fs::write(
            dir.path().join("pems.npy"),
            crate::data::npy::write_npy(&[50, 3], &values),
        )
        .unwrap();
        let config = test_config(dir.path());

        let mut sink = DisconnectingSink { limit: 1, received: Vec::new() };
        run_session(&mut sink, &config);

        // Only the first progress message got through; no error terminal was
        // forced down a dead channel.
        assert_eq!(sink.received.len(), 1);
        assert!(matches!(sink.received[0], ProgressMessage::Epoch { epoch: 1, .. }));
        // And no artifacts, since the loop never finished.
        assert!(!config.output_dir.exists());
    }

    #[test]
    fn persist_failure_still_ends_with_a_single_error_terminal() {
        let dir = tempfile::tempdir().unwrap();
        let values: Vec<f64> = (0..60).map(|i| (i as f64 * 0.1).cos()).collect();
        std::fs::write(
            dir.path().join("pems.npy"),
            crate::data::npy::write_npy(&[20, 3], &values),
        )
        .unwrap();

        let mut config = test_config(dir.path());
        config.epochs = 2;
        // A plain file where the output directory should go.
        std::fs::write(&config.output_dir, b"in the way").unwrap();

        let mut sink = VecSink::default();
        run_session(&mut sink, &config);

        assert_eq!(sink.messages.len(), 3);
        assert!(matches!(sink.messages[0], ProgressMessage::Epoch { epoch: 1, .. }));
        assert!(matches!(sink.messages[1], ProgressMessage::Epoch { epoch: 2, .. }));
        assert!(matches!(
            sink.messages[2],
            ProgressMessage::Terminal(TerminalMessage::Error { .. })
        ));
    }
}
