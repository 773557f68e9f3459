pub mod config;
pub mod error;
pub mod pipeline;
pub mod types;

pub use config::KeyerConfig;
pub use error::{KeyerError, KeyerResult};
