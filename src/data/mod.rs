pub mod batch;
pub mod loader;
pub mod missing;
pub mod npy;

pub use batch::{MaskBatch, SequenceBatch};
pub use loader::load_dataset;
pub use missing::inject_missing;
