use std::path::PathBuf;
use std::time::Duration;

use crate::model::ModelConfig;

/// Everything a training session needs, fixed at deployment.
///
/// The studio hands every session the same configuration; clients cannot
/// adjust it. Tests build cheap variants instead of reaching for globals.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Fixed dataset location, `(T, F)` array.
    pub dataset_path: PathBuf,
    /// Fixed artifact directory; each run overwrites the previous one.
    pub output_dir: PathBuf,
    /// Number of fit steps; one progress message per step.
    pub epochs: usize,
    /// Fraction of entries the injector hides, in `[0, 1]`.
    pub missing_rate: f64,
    /// Seed for both the missingness mask and the model initialization.
    pub seed: u64,
    /// Pause after each progress message so the channel can drain. A
    /// scheduling courtesy, not a correctness requirement.
    pub step_delay: Duration,
    pub model: ModelConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            dataset_path: PathBuf::from("static/pems.npy"),
            output_dir: PathBuf::from("public"),
            epochs: 50,
            missing_rate: 0.1,
            seed: 42,
            step_delay: Duration::from_millis(100),
            model: ModelConfig::default(),
        }
    }
}
