use thiserror::Error;

pub type Result<T> = std::result::Result<T, SeoulOpenApiError>;

#[derive(Debug, Error)]
pub enum SeoulOpenApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// The service answered with a `RESULT` block instead of data.
    #[error("Service error {code}: {message}")]
    Service { code: String, message: String },

    #[error("Invalid service key: {0}")]
    InvalidKey(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for SeoulOpenApiError {
    fn from(err: reqwest::Error) -> Self {
        SeoulOpenApiError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for SeoulOpenApiError {
    fn from(err: serde_json::Error) -> Self {
        SeoulOpenApiError::Parse(err.to_string())
    }
}
