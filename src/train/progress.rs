use serde::{Serialize, Deserialize};

/// One message on the progress channel.
///
/// A session emits progress messages with strictly increasing 1-indexed
/// epochs, one per completed step, followed by exactly one terminal message,
/// unless the channel drops first, in which case nothing further is sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProgressMessage {
    Epoch {
        epoch: usize,
        loss: f64,
        accuracy: f64,
    },
    Terminal(TerminalMessage),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TerminalMessage {
    Done {
        metrics: FinalMetrics,
        model_path: String,
        imputed_path: String,
    },
    Error {
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalMetrics {
    pub mae: f64,
    pub accuracy: f64,
}

/// The receiver went away; the session must stop emitting and exit quietly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkClosed;

/// Outbound half of the progress channel, as seen by the training driver.
///
/// The driver fires and forgets; a failed send is the only disconnection
/// signal it gets, and it is checked between steps.
pub trait ProgressSink {
    fn send(&mut self, message: &ProgressMessage) -> Result<(), SinkClosed>;
}

/// Test double collecting every message in order.
#[derive(Debug, Default)]
pub struct VecSink {
    pub messages: Vec<ProgressMessage>,
}

impl ProgressSink for VecSink {
    fn send(&mut self, message: &ProgressMessage) -> Result<(), SinkClosed> {
        self.messages.push(message.clone());
        Ok(())
    }
}
