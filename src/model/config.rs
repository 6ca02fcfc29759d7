use serde::{Serialize, Deserialize};

/// Architecture and training hyperparameters for the imputation model.
///
/// Held explicitly rather than as module constants so tests can run with a
/// deterministic, cheap configuration without touching process-wide state.
/// The compute backend is always the host CPU.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Number of stacked encoder blocks.
    pub n_layers: usize,
    /// Width of the shared hidden representation.
    pub d_model: usize,
    /// Attention heads per block.
    pub n_heads: usize,
    /// Per-head query/key width.
    pub d_k: usize,
    /// Per-head value width.
    pub d_v: usize,
    /// Hidden width of the position-wise feed-forward sublayer.
    pub d_ffn: usize,
    /// Residual dropout probability, applied during fit only.
    pub dropout: f64,
    /// Sequences per gradient chunk in a fit pass.
    pub batch_size: usize,
    /// SGD step size.
    pub learning_rate: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            n_layers: 3,
            d_model: 64,
            n_heads: 2,
            d_k: 32,
            d_v: 32,
            d_ffn: 128,
            dropout: 0.1,
            batch_size: 20,
            learning_rate: 1e-3,
        }
    }
}

impl ModelConfig {
    /// A small configuration for fast deterministic runs (tests, smoke
    /// checks). Dropout is off so single runs are bit-reproducible.
    pub fn tiny() -> Self {
        ModelConfig {
            n_layers: 1,
            d_model: 8,
            n_heads: 1,
            d_k: 4,
            d_v: 4,
            d_ffn: 16,
            dropout: 0.0,
            batch_size: 1,
            learning_rate: 1e-3,
        }
    }
}
