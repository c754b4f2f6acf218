use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// A vector index, keyword index or generation service failed. The
    /// underlying error is carried as-is.
    #[error(transparent)]
    ExternalService(anyhow::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn external(err: anyhow::Error) -> Self {
        Self::ExternalService(err)
    }

    pub fn is_external(&self) -> bool {
        matches!(self, Self::ExternalService(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
