use std::path::Path;

use crate::data::batch::SequenceBatch;
use crate::data::npy;
use crate::error::ImputeError;
use crate::math::Matrix;

/// Reads a `.npy` array from `path` and returns it as a `(1, T, F)` batch.
///
/// A 2-D `(T, F)` array gets the batch dimension inserted; a 3-D array is
/// taken as already batched. Anything the file system or parser rejects maps
/// to `DatasetNotFound` / `DatasetFormat`. This function has no other side
/// effects.
pub fn load_dataset(path: &Path) -> Result<SequenceBatch, ImputeError> {
    let bytes = std::fs::read(path).map_err(|_| ImputeError::DatasetNotFound {
        path: path.to_path_buf(),
    })?;

    let (shape, values) = npy::parse_npy(&bytes).map_err(|reason| ImputeError::DatasetFormat {
        path: path.to_path_buf(),
        reason,
    })?;

    let (batch, time_steps, features) = match shape.as_slice() {
        [t, f] => (1, *t, *f),
        [b, t, f] => (*b, *t, *f),
        other => {
            return Err(ImputeError::DatasetFormat {
                path: path.to_path_buf(),
                reason: format!("expected a 2-D or 3-D array, got shape {:?}", other),
            })
        }
    };
    if batch == 0 || time_steps == 0 || features == 0 {
        return Err(ImputeError::DatasetFormat {
            path: path.to_path_buf(),
            reason: format!("array has an empty dimension: ({}, {}, {})", batch, time_steps, features),
        });
    }

    // parse_npy verified that `values` holds the full shape product, so
    // these index products stay within `values.len()`.
    let seq_len = time_steps * features;
    let sequences = (0..batch)
        .map(|b| {
            let chunk = &values[b * seq_len..(b + 1) * seq_len];
            Matrix::from_data(chunk.chunks_exact(features).map(|r| r.to_vec()).collect())
        })
        .collect();

    Ok(SequenceBatch::new(sequences))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_maps_to_dataset_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pems.npy");
        let err = load_dataset(&path).unwrap_err();
        assert!(matches!(err, ImputeError::DatasetNotFound { .. }));
        assert!(err.to_string().ends_with("pems.npy' not found"));
    }

    #[test]
    fn two_dimensional_array_gains_batch_dimension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.npy");
        let values: Vec<f64> = (0..12).map(|i| i as f64).collect();
        std::fs::write(&path, npy::write_npy(&[4, 3], &values)).unwrap();

        let batch = load_dataset(&path).unwrap();
        assert_eq!(batch.shape(), (1, 4, 3));
        assert_eq!(batch.sequences[0].data[1], vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn garbage_file_maps_to_dataset_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.npy");
        std::fs::write(&path, b"not an array at all").unwrap();
        let err = load_dataset(&path).unwrap_err();
        assert!(matches!(err, ImputeError::DatasetFormat { .. }));
    }
}
