pub mod errors;
pub mod config;
pub mod format;
pub mod security;

pub use errors::ApiError;
pub use config::AppConfig;
pub use security::*;
