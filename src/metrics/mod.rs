//! Masked-position error metrics for one training session.

use crate::data::batch::{MaskBatch, SequenceBatch};

/// Baseline clamp applied when the first MAE is exactly zero, so later
/// accuracies never divide by zero.
pub const BASELINE_EPS: f64 = 1e-6;

/// Mean absolute error restricted to positions where `mask` is `true`.
///
/// Returns `0.0` when the mask selects nothing, so a zero missing-rate run
/// stays well defined downstream.
pub fn masked_mae(truth: &SequenceBatch, imputed: &SequenceBatch, mask: &MaskBatch) -> f64 {
    assert_eq!(truth.shape(), imputed.shape(), "batch shapes must match");

    let mut total = 0.0;
    let mut count = 0usize;
    for ((t_seq, i_seq), m_seq) in truth
        .sequences
        .iter()
        .zip(imputed.sequences.iter())
        .zip(mask.masks.iter())
    {
        for ((t_row, i_row), m_row) in t_seq.data.iter().zip(i_seq.data.iter()).zip(m_seq.iter()) {
            for ((&t, &i), &hidden) in t_row.iter().zip(i_row.iter()).zip(m_row.iter()) {
                if hidden {
                    total += (t - i).abs();
                    count += 1;
                }
            }
        }
    }

    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}

/// Normalizes each step's MAE against the session baseline.
///
/// The first observed MAE becomes the baseline (clamped to `BASELINE_EPS`
/// when zero); accuracy for every step is `clamp(1 - mae / baseline, 0, 1)`.
/// Step 1 therefore scores `0.0` for any nonzero first MAE and `1.0` when
/// nothing was masked.
#[derive(Debug, Default)]
pub struct AccuracyTracker {
    baseline: Option<f64>,
}

impl AccuracyTracker {
    pub fn new() -> AccuracyTracker {
        AccuracyTracker { baseline: None }
    }

    pub fn observe(&mut self, mae: f64) -> f64 {
        let baseline = *self
            .baseline
            .get_or_insert(if mae > 0.0 { mae } else { BASELINE_EPS });
        (1.0 - mae / baseline).clamp(0.0, 1.0)
    }

    pub fn baseline(&self) -> Option<f64> {
        self.baseline
    }
}
