use crate::data::SequenceBatch;
use crate::model::Imputer;
use crate::optim::Sgd;

/// One cumulative fit pass over the whole masked batch.
///
/// Sequences are processed in chunks of the model's `batch_size`, with the
/// step size divided by the chunk length so sequential updates approximate
/// mini-batch averaging. Returns the mean observed-position MSE across the
/// batch. The model's parameters persist across calls; continued training is
/// the point.
pub fn fit_epoch(
    model: &mut Imputer,
    masked: &SequenceBatch,
    optimizer: &Sgd,
) -> Result<f64, String> {
    let chunk_size = model.weights.config.batch_size.max(1);

    let mut total = 0.0;
    for chunk in masked.sequences.chunks(chunk_size) {
        let scaled = Sgd::new(optimizer.learning_rate / chunk.len() as f64);
        for seq in chunk {
            total += model.fit_sequence(seq, &scaled)?;
        }
    }
    Ok(total / masked.sequences.len() as f64)
}
