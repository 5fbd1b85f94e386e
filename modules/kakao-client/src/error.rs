use thiserror::Error;

pub type Result<T> = std::result::Result<T, KakaoError>;

#[derive(Debug, Error)]
pub enum KakaoError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Unauthorized (status {status}): {message}")]
    Unauthorized { status: u16, message: String },

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl KakaoError {
    /// An invalid or revoked key. Retrying with the same key can never
    /// succeed, so callers abort the run instead of recording a failed page.
    pub fn is_fatal(&self) -> bool {
        matches!(self, KakaoError::Unauthorized { .. })
    }
}

impl From<reqwest::Error> for KakaoError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            KakaoError::Timeout(err.to_string())
        } else if err.is_decode() {
            KakaoError::Parse(err.to_string())
        } else {
            KakaoError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for KakaoError {
    fn from(err: serde_json::Error) -> Self {
        KakaoError::Parse(err.to_string())
    }
}
