//! Error types for Social Engine

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SocialError>;

#[derive(Error, Debug)]
pub enum SocialError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Corrupt file {path}: {reason}")]
    Corrupt { path: String, reason: String },

    #[error("No account found for platform '{platform}'")]
    AccountNotFound { platform: String },

    #[error("Remote service error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SocialError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            SocialError::InvalidInput(_) => 3,
            SocialError::Config(_) | SocialError::Remote(RemoteError::MissingCredential) => 2,
            SocialError::NotFound(_)
            | SocialError::Corrupt { .. }
            | SocialError::AccountNotFound { .. }
            | SocialError::Remote(_)
            | SocialError::Io(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Missing credential: {0}")]
    MissingCredential(String),
}

/// Failures talking to the remote posting service
#[derive(Error, Debug, Clone)]
pub enum RemoteError {
    /// Transport-level failure (DNS, connect, timeout)
    #[error("Network error: {0}")]
    Network(String),

    /// The service answered with a non-2xx status
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The service answered 2xx but the body was not what we expected
    #[error("Unexpected response: {0}")]
    Decode(String),

    /// No API key was available for the request
    #[error("No API key configured")]
    MissingCredential,
}

impl From<reqwest::Error> for RemoteError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            RemoteError::Decode(error.to_string())
        } else if let Some(status) = error.status() {
            RemoteError::Http {
                status: status.as_u16(),
                body: error.to_string(),
            }
        } else {
            RemoteError::Network(error.to_string())
        }
    }
}
