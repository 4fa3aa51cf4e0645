//! Shared types and the stock engine for the Farm Stock platform
//!
//! This crate contains the pure inventory conversion and adjustment engine
//! shared between the native client and the stock screen (via WASM).

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
