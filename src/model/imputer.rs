use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Serialize, Deserialize};

use crate::data::batch::SequenceBatch;
use crate::math::Matrix;
use crate::model::config::ModelConfig;
use crate::model::encoder::{BlockCache, EncoderBlock};
use crate::optim::Sgd;

/// Self-attention imputation model for one dataset shape.
///
/// Each time step feeds the model its feature values (NaN sentinel replaced
/// by zero) concatenated with an observed-indicator vector, projected to
/// `d_model` with sinusoidal position information added, run through the
/// encoder stack, and projected back to feature space. Fitting minimizes MSE
/// over *observed* positions only; the model never sees the values the
/// injector hid.
pub struct Imputer {
    pub weights: ImputerWeights,
    /// Drives dropout during fit passes; seeded so runs are reproducible.
    rng: StdRng,
}

/// The serializable trainable state, written out as the weights artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImputerWeights {
    pub config: ModelConfig,
    pub n_features: usize,
    /// Input projection, `2F × d_model`.
    pub w_in: Matrix,
    pub b_in: Vec<f64>,
    pub blocks: Vec<EncoderBlock>,
    /// Output projection, `d_model × F`.
    pub w_out: Matrix,
    pub b_out: Vec<f64>,
}

/// Forward activations for one sequence, kept for backprop.
pub struct ForwardCache {
    x0: Matrix,
    blocks: Vec<BlockCache>,
    h_final: Matrix,
    /// Observed-position flags, `T × F`.
    observed: Vec<Vec<bool>>,
}

impl Imputer {
    pub fn new(config: ModelConfig, n_features: usize, seed: u64) -> Imputer {
        let mut rng = StdRng::seed_from_u64(seed);
        let blocks = (0..config.n_layers)
            .map(|_| {
                EncoderBlock::new(
                    config.d_model,
                    config.n_heads,
                    config.d_k,
                    config.d_v,
                    config.d_ffn,
                    &mut rng,
                )
            })
            .collect();
        let weights = ImputerWeights {
            w_in: Matrix::xavier(2 * n_features, config.d_model, &mut rng),
            b_in: vec![0.0; config.d_model],
            w_out: Matrix::xavier(config.d_model, n_features, &mut rng),
            b_out: vec![0.0; n_features],
            blocks,
            config,
            n_features,
        };
        Imputer { weights, rng }
    }

    /// One cumulative gradient step on a single masked sequence. Returns the
    /// observed-position MSE before the update, or `0.0` for a fully missing
    /// sequence (nothing to learn from).
    pub fn fit_sequence(&mut self, seq: &Matrix, optimizer: &Sgd) -> Result<f64, String> {
        let (pred, cache) = self.forward(seq, true);

        let n_obs: usize = cache
            .observed
            .iter()
            .map(|row| row.iter().filter(|&&o| o).count())
            .sum();
        if n_obs == 0 {
            return Ok(0.0);
        }

        let mut loss = 0.0;
        let mut d_pred = Matrix::zeros(pred.rows, pred.cols);
        for i in 0..pred.rows {
            for j in 0..pred.cols {
                if cache.observed[i][j] {
                    let diff = pred.data[i][j] - seq.data[i][j];
                    loss += diff * diff;
                    d_pred.data[i][j] = 2.0 * diff / n_obs as f64;
                }
            }
        }
        loss /= n_obs as f64;
        if !loss.is_finite() {
            return Err("loss diverged (non-finite)".to_owned());
        }

        self.backward(&cache, &d_pred, optimizer);
        Ok(loss)
    }

    /// Produces a completed copy of the batch: observed values are kept
    /// verbatim, missing positions take the model's predictions.
    pub fn impute(&mut self, batch: &SequenceBatch) -> Result<SequenceBatch, String> {
        let mut completed = Vec::with_capacity(batch.sequences.len());
        for seq in &batch.sequences {
            let (pred, cache) = self.forward(seq, false);
            if !pred.is_finite() {
                return Err("imputation produced non-finite values".to_owned());
            }
            let mut out = pred;
            for i in 0..out.rows {
                for j in 0..out.cols {
                    if cache.observed[i][j] {
                        out.data[i][j] = seq.data[i][j];
                    }
                }
            }
            completed.push(out);
        }
        Ok(SequenceBatch::new(completed))
    }

    fn forward(&mut self, seq: &Matrix, train: bool) -> (Matrix, ForwardCache) {
        let weights = &self.weights;
        assert_eq!(
            seq.cols, weights.n_features,
            "sequence feature width must match the model"
        );

        let observed: Vec<Vec<bool>> = seq
            .data
            .iter()
            .map(|row| row.iter().map(|v| !v.is_nan()).collect())
            .collect();
        let filled = seq.map(|v| if v.is_nan() { 0.0 } else { v });
        let indicator = Matrix::from_data(
            observed
                .iter()
                .map(|row| row.iter().map(|&o| if o { 1.0 } else { 0.0 }).collect())
                .collect(),
        );
        let x0 = Matrix::hcat(&[filled, indicator]);

        let h_first = x0
            .matmul(&weights.w_in)
            .add_row(&weights.b_in)
            .add(&positional_encoding(seq.rows, weights.config.d_model));

        let dropout = weights.config.dropout;
        let use_dropout = train && dropout > 0.0;

        let mut h = h_first;
        let mut block_caches = Vec::with_capacity(weights.blocks.len());
        for block in &weights.blocks {
            let rng = if use_dropout { Some(&mut self.rng) } else { None };
            let (next, cache) = block.forward(&h, dropout, rng);
            block_caches.push(cache);
            h = next;
        }

        let pred = h.matmul(&weights.w_out).add_row(&weights.b_out);
        let cache = ForwardCache {
            x0,
            blocks: block_caches,
            h_final: h,
            observed,
        };
        (pred, cache)
    }

    fn backward(&mut self, cache: &ForwardCache, d_pred: &Matrix, optimizer: &Sgd) {
        let weights = &mut self.weights;

        let d_w_out = cache.h_final.transpose().matmul(d_pred);
        let d_b_out = d_pred.col_sums();
        let mut d_h = d_pred.matmul(&weights.w_out.transpose());
        optimizer.step(&mut weights.w_out, &d_w_out);
        optimizer.step_bias(&mut weights.b_out, &d_b_out);

        for (block, block_cache) in weights.blocks.iter_mut().zip(cache.blocks.iter()).rev() {
            d_h = block.backward(block_cache, &d_h, optimizer);
        }

        let d_w_in = cache.x0.transpose().matmul(&d_h);
        let d_b_in = d_h.col_sums();
        optimizer.step(&mut weights.w_in, &d_w_in);
        optimizer.step_bias(&mut weights.b_in, &d_b_in);
    }

    /// Serializes the trainable state to a pretty-printed JSON file.
    pub fn save_json(&self, path: &std::path::Path) -> std::io::Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, &self.weights)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }

    /// Restores a model from a weights file written by `save_json`. The
    /// dropout generator is freshly seeded; loading is meant for inference.
    pub fn load_json(path: &std::path::Path) -> std::io::Result<Imputer> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let weights: ImputerWeights = serde_json::from_reader(reader)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        Ok(Imputer {
            weights,
            rng: StdRng::seed_from_u64(0),
        })
    }
}

/// Standard sinusoidal positional encoding, `T × d_model`.
fn positional_encoding(time_steps: usize, d_model: usize) -> Matrix {
    let data = (0..time_steps)
        .map(|pos| {
            (0..d_model)
                .map(|i| {
                    let exponent = (2 * (i / 2)) as f64 / d_model as f64;
                    let angle = pos as f64 / 10_000f64.powf(exponent);
                    if i % 2 == 0 {
                        angle.sin()
                    } else {
                        angle.cos()
                    }
                })
                .collect()
        })
        .collect();
    Matrix::from_data(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{inject_missing, SequenceBatch};

    fn toy_batch() -> SequenceBatch {
        let seq = Matrix::from_data(
            (0..20)
                .map(|i| vec![(i as f64).sin(), (i as f64 * 0.5).cos(), i as f64 / 20.0])
                .collect(),
        );
        SequenceBatch::new(vec![seq])
    }

    #[test]
    fn impute_preserves_observed_entries_exactly() {
        let truth = toy_batch();
        let (masked, mask) = inject_missing(&truth, 0.3, 11);
        let mut model = Imputer::new(ModelConfig::tiny(), 3, 42);

        let completed = model.impute(&masked).unwrap();
        for i in 0..20 {
            for j in 0..3 {
                if !mask.masks[0][i][j] {
                    assert_eq!(
                        completed.sequences[0].data[i][j],
                        truth.sequences[0].data[i][j]
                    );
                }
                assert!(completed.sequences[0].data[i][j].is_finite());
            }
        }
    }

    #[test]
    fn same_seed_builds_identical_models() {
        let a = Imputer::new(ModelConfig::tiny(), 3, 42);
        let b = Imputer::new(ModelConfig::tiny(), 3, 42);
        assert_eq!(a.weights.w_in, b.weights.w_in);
        assert_eq!(a.weights.w_out, b.weights.w_out);
    }

    #[test]
    fn fit_returns_finite_loss_and_updates_weights() {
        let truth = toy_batch();
        let (masked, _) = inject_missing(&truth, 0.2, 5);
        let mut model = Imputer::new(ModelConfig::tiny(), 3, 42);
        let before = model.weights.w_out.clone();

        let loss = model
            .fit_sequence(&masked.sequences[0], &Sgd::new(1e-3))
            .unwrap();
        assert!(loss.is_finite() && loss >= 0.0);
        assert_ne!(model.weights.w_out, before);
    }

    #[test]
    fn fully_missing_sequence_is_a_no_op() {
        let truth = toy_batch();
        let (masked, _) = inject_missing(&truth, 1.0, 5);
        let mut model = Imputer::new(ModelConfig::tiny(), 3, 42);
        let before = model.weights.w_out.clone();

        let loss = model
            .fit_sequence(&masked.sequences[0], &Sgd::new(1e-3))
            .unwrap();
        assert_eq!(loss, 0.0);
        assert_eq!(model.weights.w_out, before);
    }

    #[test]
    fn weights_round_trip_through_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("imputer.json");
        let model = Imputer::new(ModelConfig::tiny(), 3, 42);
        model.save_json(&path).unwrap();

        let restored = Imputer::load_json(&path).unwrap();
        assert_eq!(restored.weights.w_in, model.weights.w_in);
        assert_eq!(restored.weights.n_features, 3);
    }
}
