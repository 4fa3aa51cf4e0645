//! Business logic services for the stock screen

pub mod bom;
pub mod gateway;
pub mod stock;

pub use bom::{BomResolver, ResolvedBom};
pub use gateway::{AuditSource, BomSource, ItemCatalog, StockBackend, StockMutationGateway};
pub use stock::StockSession;
