use brewmerge_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("invalid {name}: {value} (expected a number in [0, 1])")]
    InvalidThreshold { name: &'static str, value: f64 },

    #[error("invalid {name}: minimum {min} is greater than maximum {max}")]
    InvalidRange {
        name: &'static str,
        min: usize,
        max: usize,
    },

    #[error("configuration error: {0} must not be empty")]
    EmptyConfiguration(&'static str),

    #[error("invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl MatchError {
    /// True for the errors raised while validating configuration, before any
    /// record is looked at.
    pub fn is_configuration(&self) -> bool {
        !matches!(self, MatchError::Core(_))
    }
}

pub type Result<T> = std::result::Result<T, MatchError>;
