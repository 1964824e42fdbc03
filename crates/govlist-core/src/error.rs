use thiserror::Error;

/// Everything that can fail between a listing request and its response
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Upstream request failed: {0}")]
    ApiError(String),

    #[error("Upstream response is malformed: {0}")]
    MalformedResponse(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl Error {
    /// The caller sent something we won't act on, as opposed to us or the
    /// upstream falling over
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::InvalidQuery(_))
    }
}

impl From<govlist_api::ApiError> for Error {
    fn from(err: govlist_api::ApiError) -> Self {
        use govlist_api::ApiError;

        match err {
            ApiError::MissingApiKey => Error::ConfigError(err.to_string()),
            ApiError::MalformedResponse(msg) => Error::MalformedResponse(msg),
            other => Error::ApiError(other.to_string()),
        }
    }
}
