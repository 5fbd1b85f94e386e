use thiserror::Error;

pub type Result<T> = std::result::Result<T, DaisoError>;

#[derive(Debug, Error)]
pub enum DaisoError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Store search reported failure")]
    Unsuccessful,

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for DaisoError {
    fn from(err: reqwest::Error) -> Self {
        DaisoError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for DaisoError {
    fn from(err: serde_json::Error) -> Self {
        DaisoError::Parse(err.to_string())
    }
}
