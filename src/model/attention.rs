use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::math::Matrix;
use crate::optim::Sgd;

/// One attention head's projection weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttentionHead {
    pub w_q: Matrix,
    pub w_k: Matrix,
    pub w_v: Matrix,
}

/// Scaled dot-product multi-head self-attention over a `T × d_model` input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiHeadAttention {
    pub heads: Vec<AttentionHead>,
    /// Output projection, `(n_heads * d_v) × d_model`.
    pub w_o: Matrix,
    pub d_k: usize,
    pub d_v: usize,
}

/// Per-head forward activations kept for backprop.
pub struct HeadCache {
    q: Matrix,
    k: Matrix,
    v: Matrix,
    /// Row-softmaxed attention weights, `T × T`.
    attn: Matrix,
}

pub struct AttnCache {
    input: Matrix,
    heads: Vec<HeadCache>,
    concat: Matrix,
}

impl MultiHeadAttention {
    pub fn new<R: Rng>(d_model: usize, n_heads: usize, d_k: usize, d_v: usize, rng: &mut R) -> Self {
        let heads = (0..n_heads)
            .map(|_| AttentionHead {
                w_q: Matrix::xavier(d_model, d_k, rng),
                w_k: Matrix::xavier(d_model, d_k, rng),
                w_v: Matrix::xavier(d_model, d_v, rng),
            })
            .collect();
        MultiHeadAttention {
            heads,
            w_o: Matrix::xavier(n_heads * d_v, d_model, rng),
            d_k,
            d_v,
        }
    }

    pub fn forward(&self, input: &Matrix) -> (Matrix, AttnCache) {
        let scale = 1.0 / (self.d_k as f64).sqrt();

        let mut head_caches = Vec::with_capacity(self.heads.len());
        let mut head_outputs = Vec::with_capacity(self.heads.len());
        for head in &self.heads {
            let q = input.matmul(&head.w_q);
            let k = input.matmul(&head.w_k);
            let v = input.matmul(&head.w_v);
            let attn = q.matmul(&k.transpose()).scale(scale).softmax_rows();
            head_outputs.push(attn.matmul(&v));
            head_caches.push(HeadCache { q, k, v, attn });
        }

        let concat = Matrix::hcat(&head_outputs);
        let output = concat.matmul(&self.w_o);
        let cache = AttnCache {
            input: input.clone(),
            heads: head_caches,
            concat,
        };
        (output, cache)
    }

    /// Backpropagates `d_out`, updates this sublayer's weights, and returns
    /// the gradient flowing to the input (attention paths only; the caller
    /// owns the residual connection).
    pub fn backward(&mut self, cache: &AttnCache, d_out: &Matrix, optimizer: &Sgd) -> Matrix {
        let scale = 1.0 / (self.d_k as f64).sqrt();

        let d_concat = d_out.matmul(&self.w_o.transpose());
        let d_w_o = cache.concat.transpose().matmul(d_out);

        let mut d_input = Matrix::zeros(cache.input.rows, cache.input.cols);
        for (h, (head, hc)) in self.heads.iter_mut().zip(cache.heads.iter()).enumerate() {
            let d_head_out = d_concat.slice_cols(h * self.d_v, (h + 1) * self.d_v);

            let d_attn = d_head_out.matmul(&hc.v.transpose());
            let d_v = hc.attn.transpose().matmul(&d_head_out);

            let d_scores = softmax_backward_rows(&hc.attn, &d_attn).scale(scale);
            let d_q = d_scores.matmul(&hc.k);
            let d_k = d_scores.transpose().matmul(&hc.q);

            let d_w_q = cache.input.transpose().matmul(&d_q);
            let d_w_k = cache.input.transpose().matmul(&d_k);
            let d_w_v = cache.input.transpose().matmul(&d_v);

            // Input gradient must use the pre-update weights.
            d_input = d_input
                .add(&d_q.matmul(&head.w_q.transpose()))
                .add(&d_k.matmul(&head.w_k.transpose()))
                .add(&d_v.matmul(&head.w_v.transpose()));

            optimizer.step(&mut head.w_q, &d_w_q);
            optimizer.step(&mut head.w_k, &d_w_k);
            optimizer.step(&mut head.w_v, &d_w_v);
        }

        optimizer.step(&mut self.w_o, &d_w_o);
        d_input
    }
}

/// Row-wise softmax Jacobian application:
/// `dS_ij = A_ij * (dA_ij - Σ_k dA_ik * A_ik)`.
fn softmax_backward_rows(attn: &Matrix, d_attn: &Matrix) -> Matrix {
    let data = attn
        .data
        .iter()
        .zip(d_attn.data.iter())
        .map(|(a_row, d_row)| {
            let dot: f64 = a_row.iter().zip(d_row.iter()).map(|(&a, &d)| a * d).sum();
            a_row
                .iter()
                .zip(d_row.iter())
                .map(|(&a, &d)| a * (d - dot))
                .collect()
        })
        .collect();
    Matrix::from_data(data)
}
