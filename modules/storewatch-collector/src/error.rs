use daiso_client::DaisoError;
use kakao_client::KakaoError;
use seoul_openapi_client::SeoulOpenApiError;
use thiserror::Error;

/// Failures that abort a collection run. Per-page network errors are not
/// here: they are recorded in the run stats and end only their own quadrant.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("Map API rejected the credentials: {0}")]
    Unauthorized(KakaoError),

    #[error("Rate limiter closed")]
    LimiterClosed,

    #[error("Retailer API error: {0}")]
    Retailer(#[from] DaisoError),

    #[error("Open data API error: {0}")]
    OpenData(#[from] SeoulOpenApiError),
}

impl CollectError {
    /// Wrap a map API error if it is fatal, otherwise hand it back.
    pub(crate) fn fatal(err: KakaoError) -> std::result::Result<KakaoError, CollectError> {
        if err.is_fatal() {
            Err(CollectError::Unauthorized(err))
        } else {
            Ok(err)
        }
    }
}

pub type Result<T> = std::result::Result<T, CollectError>;
