use std::path::PathBuf;
use thiserror::Error;

/// Fault taxonomy for one training session.
///
/// Every fatal variant is caught at the session boundary and converted into
/// exactly one terminal error message on the progress channel.
/// `ChannelDisconnected` is the exception: the client went away, so the
/// session stops emitting and exits quietly.
#[derive(Debug, Error)]
pub enum ImputeError {
    /// The dataset path does not resolve to a readable array file.
    /// The Display string is part of the wire contract.
    #[error("Dataset '{}' not found", .path.display())]
    DatasetNotFound { path: PathBuf },

    /// The dataset file exists but is not a supported array file.
    #[error("Dataset '{}' is not a valid array file: {}", .path.display(), .reason)]
    DatasetFormat { path: PathBuf, reason: String },

    /// Any fault raised during fit or imputation.
    #[error("training fault: {0}")]
    TrainingFault(String),

    /// Writing either artifact failed. Training results still stand; only
    /// the save step is lost.
    #[error("failed to persist artifacts: {0}")]
    Persist(String),

    /// The progress channel dropped. Not reported anywhere.
    #[error("progress channel disconnected")]
    ChannelDisconnected,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dataset_not_found_display_matches_wire_contract() {
        let err = ImputeError::DatasetNotFound { path: PathBuf::from("static/pems.npy") };
        assert_eq!(err.to_string(), "Dataset 'static/pems.npy' not found");
    }
}
