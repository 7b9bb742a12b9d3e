use thiserror::Error;

/// All errors that can occur in brewmerge-core.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Source file not found: {0}")]
    SourceNotFound(String),

    #[error("Invalid source file {0}: expected a JSON array of records")]
    InvalidSource(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Exit codes used by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    NotFound = 2,
    InvalidArgs = 3,
    InvalidConfig = 4,
}

pub type Result<T> = std::result::Result<T, CoreError>;
