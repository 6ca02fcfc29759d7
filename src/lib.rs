pub mod math;
pub mod error;
pub mod data;
pub mod metrics;
pub mod model;
pub mod optim;
pub mod train;

// Convenience re-exports
pub use math::matrix::Matrix;
pub use error::ImputeError;
pub use data::{MaskBatch, SequenceBatch};
pub use model::{Imputer, ModelConfig};
pub use optim::Sgd;
pub use train::{run_session, ProgressMessage, ProgressSink, SessionConfig};
