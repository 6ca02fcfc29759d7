use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::data::batch::{MaskBatch, SequenceBatch};

/// Hides a fraction of the batch behind a seeded Bernoulli mask.
///
/// Each entry is independently marked missing with probability `rate`; masked
/// positions are replaced by `f64::NAN`, the sentinel the model reads as
/// "absent". The same seed always reproduces the same mask for the same
/// shape, which is what makes a session replayable.
pub fn inject_missing(batch: &SequenceBatch, rate: f64, seed: u64) -> (SequenceBatch, MaskBatch) {
    assert!((0.0..=1.0).contains(&rate), "missing rate must be in [0, 1]");
    let mut rng = StdRng::seed_from_u64(seed);

    let mut masked_sequences = Vec::with_capacity(batch.sequences.len());
    let mut masks = Vec::with_capacity(batch.sequences.len());

    for seq in &batch.sequences {
        let mut masked = seq.clone();
        let mut mask = vec![vec![false; seq.cols]; seq.rows];
        for i in 0..seq.rows {
            for j in 0..seq.cols {
                if rng.gen::<f64>() < rate {
                    mask[i][j] = true;
                    masked.data[i][j] = f64::NAN;
                }
            }
        }
        masked_sequences.push(masked);
        masks.push(mask);
    }

    (SequenceBatch::new(masked_sequences), MaskBatch { masks })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Matrix;

    fn batch(rows: usize, cols: usize) -> SequenceBatch {
        let seq = Matrix::from_data(
            (0..rows)
                .map(|i| (0..cols).map(|j| (i * cols + j) as f64).collect())
                .collect(),
        );
        SequenceBatch::new(vec![seq])
    }

    #[test]
    fn same_seed_reproduces_the_same_mask() {
        let b = batch(50, 3);
        let (masked_a, mask_a) = inject_missing(&b, 0.1, 42);
        let (masked_b, mask_b) = inject_missing(&b, 0.1, 42);
        assert_eq!(mask_a, mask_b);
        // NaN != NaN, so compare via the bit pattern of the flattened data.
        let bits = |s: &SequenceBatch| -> Vec<u64> {
            s.to_flat().iter().map(|v| v.to_bits()).collect()
        };
        assert_eq!(bits(&masked_a), bits(&masked_b));
    }

    #[test]
    fn different_seeds_diverge() {
        let b = batch(50, 3);
        let (_, mask_a) = inject_missing(&b, 0.5, 1);
        let (_, mask_b) = inject_missing(&b, 0.5, 2);
        assert_ne!(mask_a, mask_b);
    }

    #[test]
    fn zero_rate_hides_nothing() {
        let b = batch(20, 4);
        let (masked, mask) = inject_missing(&b, 0.0, 7);
        assert!(!mask.any());
        assert_eq!(masked, b);
    }

    #[test]
    fn full_rate_hides_everything() {
        let b = batch(10, 2);
        let (masked, mask) = inject_missing(&b, 1.0, 7);
        assert_eq!(mask.count(), 20);
        assert!(masked.sequences[0]
            .data
            .iter()
            .all(|row| row.iter().all(|v| v.is_nan())));
    }

    #[test]
    fn nan_sentinels_sit_exactly_at_masked_positions() {
        let b = batch(30, 3);
        let (masked, mask) = inject_missing(&b, 0.3, 99);
        for i in 0..30 {
            for j in 0..3 {
                assert_eq!(masked.sequences[0].data[i][j].is_nan(), mask.masks[0][i][j]);
            }
        }
    }
}
