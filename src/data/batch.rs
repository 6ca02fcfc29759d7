use crate::math::Matrix;

/// A batch of time-series sequences, each a `time_steps × features` matrix.
///
/// The studio always works with a single-sequence batch `(1, T, F)`, but the
/// type carries the batch dimension so the fit loop treats the general case
/// uniformly.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceBatch {
    pub sequences: Vec<Matrix>,
}

impl SequenceBatch {
    pub fn new(sequences: Vec<Matrix>) -> SequenceBatch {
        assert!(!sequences.is_empty(), "a batch needs at least one sequence");
        let (t, f) = (sequences[0].rows, sequences[0].cols);
        assert!(
            sequences.iter().all(|s| s.rows == t && s.cols == f),
            "all sequences in a batch must share one shape"
        );
        SequenceBatch { sequences }
    }

    /// `(batch, time_steps, features)`.
    pub fn shape(&self) -> (usize, usize, usize) {
        (
            self.sequences.len(),
            self.sequences[0].rows,
            self.sequences[0].cols,
        )
    }

    pub fn time_steps(&self) -> usize {
        self.sequences[0].rows
    }

    pub fn features(&self) -> usize {
        self.sequences[0].cols
    }

    /// Flattens to C order for `.npy` serialization.
    pub fn to_flat(&self) -> Vec<f64> {
        self.sequences
            .iter()
            .flat_map(|s| s.data.iter().flat_map(|row| row.iter().cloned()))
            .collect()
    }
}

/// Boolean masks mirroring a `SequenceBatch`; `true` marks a position the
/// injector hid from the model.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskBatch {
    pub masks: Vec<Vec<Vec<bool>>>,
}

impl MaskBatch {
    pub fn any(&self) -> bool {
        self.masks
            .iter()
            .any(|m| m.iter().any(|row| row.iter().any(|&b| b)))
    }

    pub fn count(&self) -> usize {
        self.masks
            .iter()
            .map(|m| {
                m.iter()
                    .map(|row| row.iter().filter(|&&b| b).count())
                    .sum::<usize>()
            })
            .sum()
    }
}
