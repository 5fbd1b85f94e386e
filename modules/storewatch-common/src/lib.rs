pub mod types;
pub mod config;
pub mod error;
pub mod districts;

pub use types::*;
pub use config::Config;
pub use error::StorewatchError;
pub use districts::{district_info, search_keyword, supported_districts, District};
