pub mod config;
pub mod fit;
pub mod persist;
pub mod progress;
pub mod session;

pub use config::SessionConfig;
pub use fit::fit_epoch;
pub use progress::{ProgressMessage, ProgressSink, SinkClosed, TerminalMessage};
pub use session::run_session;
