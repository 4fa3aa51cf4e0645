//! Ports to the systems the stock engine reads from and writes to

use async_trait::async_trait;
use shared::{
    AdjustmentCommand, AuditLogEntry, AuditQuery, BomEntry, ConversionCommand, FreshnessRecord,
    Item, ItemId,
};

use crate::error::AppResult;

/// Source of stocked items
#[async_trait]
pub trait ItemCatalog: Send + Sync {
    async fn list_items(&self) -> AppResult<Vec<Item>>;
}

/// Source of the structured bill of materials
#[async_trait]
pub trait BomSource: Send + Sync {
    async fn get_bom(&self, target_item_id: ItemId) -> AppResult<Vec<BomEntry>>;
}

/// Applies stock changes; each call is one atomic write on the backend
#[async_trait]
pub trait StockMutationGateway: Send + Sync {
    async fn convert(&self, command: &ConversionCommand) -> AppResult<()>;

    async fn adjust(&self, command: &AdjustmentCommand) -> AppResult<()>;
}

/// Read side for the audit timeline and freshness lookup
#[async_trait]
pub trait AuditSource: Send + Sync {
    async fn list_audit_log(&self, query: &AuditQuery) -> AppResult<Vec<AuditLogEntry>>;

    async fn list_freshness(&self) -> AppResult<Vec<FreshnessRecord>>;
}

/// Everything a stock session needs from the backend
pub trait StockBackend: ItemCatalog + BomSource + StockMutationGateway + AuditSource {}

impl<T> StockBackend for T where T: ItemCatalog + BomSource + StockMutationGateway + AuditSource {}
