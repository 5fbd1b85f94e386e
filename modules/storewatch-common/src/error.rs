use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorewatchError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported district: {name} (supported: {supported})")]
    UnknownDistrict { name: String, supported: String },
}
