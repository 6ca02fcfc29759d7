use std::path::{Path, PathBuf};

use crate::data::{npy, SequenceBatch};
use crate::error::ImputeError;
use crate::model::Imputer;

pub const WEIGHTS_FILE: &str = "imputer.json";
pub const IMPUTED_FILE: &str = "imputed.npy";

/// Writes both session artifacts into `dir`, creating it if absent and
/// overwriting whatever a previous run left there. Returns the two paths in
/// `(weights, imputed)` order.
pub fn save_artifacts(
    model: &Imputer,
    imputed: &SequenceBatch,
    dir: &Path,
) -> Result<(PathBuf, PathBuf), ImputeError> {
    std::fs::create_dir_all(dir)
        .map_err(|e| ImputeError::Persist(format!("could not create '{}': {}", dir.display(), e)))?;

    let weights_path = dir.join(WEIGHTS_FILE);
    model
        .save_json(&weights_path)
        .map_err(|e| ImputeError::Persist(format!("could not write model weights: {}", e)))?;

    let imputed_path = dir.join(IMPUTED_FILE);
    let (b, t, f) = imputed.shape();
    std::fs::write(&imputed_path, npy::write_npy(&[b, t, f], &imputed.to_flat()))
        .map_err(|e| ImputeError::Persist(format!("could not write imputed array: {}", e)))?;

    Ok((weights_path, imputed_path))
}
