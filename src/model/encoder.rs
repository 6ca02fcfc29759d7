use rand::rngs::StdRng;
use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::math::Matrix;
use crate::model::attention::{AttnCache, MultiHeadAttention};
use crate::model::feed_forward::{FeedForward, FfnCache};
use crate::optim::Sgd;

/// One encoder block: self-attention and a position-wise feed-forward
/// sublayer, each wrapped in a residual connection with inverted dropout on
/// the sublayer output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncoderBlock {
    pub attn: MultiHeadAttention,
    pub ffn: FeedForward,
}

pub struct BlockCache {
    attn: AttnCache,
    /// Inverted-dropout mask over the attention output; `None` in eval mode.
    attn_drop: Option<Matrix>,
    ffn: FfnCache,
    ffn_drop: Option<Matrix>,
}

impl EncoderBlock {
    pub fn new<R: Rng>(
        d_model: usize,
        n_heads: usize,
        d_k: usize,
        d_v: usize,
        d_ffn: usize,
        rng: &mut R,
    ) -> Self {
        EncoderBlock {
            attn: MultiHeadAttention::new(d_model, n_heads, d_k, d_v, rng),
            ffn: FeedForward::new(d_model, d_ffn, rng),
        }
    }

    /// Forward pass. `dropout_rng` is `Some` only while fitting with a
    /// nonzero dropout rate; eval passes run the identity instead.
    pub fn forward(
        &self,
        input: &Matrix,
        dropout: f64,
        dropout_rng: Option<&mut StdRng>,
    ) -> (Matrix, BlockCache) {
        let mut rng = dropout_rng;

        let (attn_out, attn_cache) = self.attn.forward(input);
        let attn_drop = rng
            .as_deref_mut()
            .map(|r| dropout_mask(attn_out.rows, attn_out.cols, dropout, r));
        let attn_kept = match &attn_drop {
            Some(mask) => attn_out.hadamard(mask),
            None => attn_out,
        };
        let mid = input.add(&attn_kept);

        let (ffn_out, ffn_cache) = self.ffn.forward(&mid);
        let ffn_drop = rng
            .as_deref_mut()
            .map(|r| dropout_mask(ffn_out.rows, ffn_out.cols, dropout, r));
        let ffn_kept = match &ffn_drop {
            Some(mask) => ffn_out.hadamard(mask),
            None => ffn_out,
        };
        let output = mid.add(&ffn_kept);

        let cache = BlockCache {
            attn: attn_cache,
            attn_drop,
            ffn: ffn_cache,
            ffn_drop,
        };
        (output, cache)
    }

    /// Backpropagates through both sublayers (residual paths included),
    /// updating weights, and returns the gradient at the block input.
    pub fn backward(&mut self, cache: &BlockCache, d_out: &Matrix, optimizer: &Sgd) -> Matrix {
        let d_ffn_out = match &cache.ffn_drop {
            Some(mask) => d_out.hadamard(mask),
            None => d_out.clone(),
        };
        let d_mid = d_out.add(&self.ffn.backward(&cache.ffn, &d_ffn_out, optimizer));

        let d_attn_out = match &cache.attn_drop {
            Some(mask) => d_mid.hadamard(mask),
            None => d_mid.clone(),
        };
        d_mid.add(&self.attn.backward(&cache.attn, &d_attn_out, optimizer))
    }
}

/// Inverted dropout: entries are `0.0` with probability `p`, else
/// `1 / (1 - p)`, so eval needs no rescaling.
fn dropout_mask(rows: usize, cols: usize, p: f64, rng: &mut StdRng) -> Matrix {
    if p <= 0.0 {
        return Matrix::from_data(vec![vec![1.0; cols]; rows]);
    }
    let keep_scale = 1.0 / (1.0 - p);
    let data = (0..rows)
        .map(|_| {
            (0..cols)
                .map(|_| if rng.gen::<f64>() < p { 0.0 } else { keep_scale })
                .collect()
        })
        .collect();
    Matrix::from_data(data)
}
