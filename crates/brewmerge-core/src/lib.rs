pub mod config;
pub mod error;
pub mod models;
pub mod storage;

pub use config::{AppConfig, CleaningConfig, MatchingConfig, OutputConfig, ScoringMode};
pub use error::{CoreError, ExitCode, Result};
pub use models::*;
