//! External API integrations

pub mod command_api;

pub use command_api::CommandApiClient;
