//! Farm stock client
//!
//! Drives the conversion and adjustment engine from `shared` against the
//! farm backend's command API.

pub mod config;
pub mod error;
pub mod external;
pub mod services;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use external::CommandApiClient;
pub use services::StockSession;
