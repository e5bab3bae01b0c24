use thiserror::Error;

/// Errors from the catalog service clients (embedding provider and
/// vector index).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Invalid client configuration (bad URL, dimension mismatch).
    #[error("config: {0}")]
    Config(String),

    /// A network error occurred during an API call.
    #[error("network: {0}")]
    Network(String),

    /// The service returned an error response.
    #[error("service api: {0}")]
    Api(String),

    /// The service response could not be parsed.
    #[error("invalid service response: {0}")]
    InvalidResponse(String),
}

pub type Result<T> = std::result::Result<T, Error>;
