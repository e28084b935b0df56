use std::path::PathBuf;

use pivot::SessionError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error in {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config: {}", problems.join("; "))]
    InvalidConfig { problems: Vec<String> },

    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("logging setup failed: {message}")]
    Logging { message: String },

    #[error("{0}")]
    Session(#[from] SessionError),

    #[error("generation did not finish within {seconds}s")]
    Timeout { seconds: u64 },
}

impl CliError {
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidArgument { .. } | Self::InvalidConfig { .. } | Self::Config { .. } => 2,
            Self::Session(err) if err.is_user_error() => 2,
            Self::Session(SessionError::Connection(_)) => 3,
            Self::Session(_) => 4,
            Self::Timeout { .. } => 5,
            _ => 1,
        }
    }

    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}
