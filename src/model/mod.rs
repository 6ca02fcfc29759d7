pub mod attention;
pub mod config;
pub mod encoder;
pub mod feed_forward;
pub mod imputer;

pub use config::ModelConfig;
pub use imputer::Imputer;
