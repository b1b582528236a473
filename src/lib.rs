pub mod config;
pub mod constants;
pub mod error;
pub mod observability;
pub mod pipeline;
pub mod types;

pub use config::Config;
pub use error::{CleanerError, Result};
pub use pipeline::{Pipeline, RunPaths, RunSummary};
