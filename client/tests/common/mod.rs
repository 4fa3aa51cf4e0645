//! In-memory backend shared by the integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use farm_stock_client::services::{AuditSource, BomSource, ItemCatalog, StockMutationGateway};
use farm_stock_client::{AppError, AppResult};
use rust_decimal::Decimal;
use shared::{
    AdjustmentCommand, AuditLogEntry, AuditQuery, BomEntry, ConversionCommand, FreshnessRecord,
    Item, ItemClass, ItemId, LegacyRecipe, MaterialClass, Quantity,
};

pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

pub fn item(id: ItemId, name: &str, class: ItemClass, stock: Quantity) -> Item {
    Item {
        id,
        name: name.to_string(),
        specification: None,
        class,
        stock_quantity: stock,
        safety_stock: 0,
        legacy_recipe: LegacyRecipe::default(),
    }
}

pub fn bom_entry(item: &Item, ratio: &str) -> BomEntry {
    BomEntry::new(
        item.id,
        item.name.clone(),
        dec(ratio),
        item.stock_quantity,
        MaterialClass::from(item.class),
    )
}

/// Items: 1 jam (finished), 2 strawberries (raw, 100), 3 jar (aux, 5), 4 blueberries (raw, 30)
pub fn farm_catalog() -> Vec<Item> {
    vec![
        item(1, "Strawberry jam 500g", ItemClass::Finished, 0),
        item(2, "Strawberries", ItemClass::Raw, 100),
        item(3, "Glass jar", ItemClass::Auxiliary, 5),
        item(4, "Blueberries", ItemClass::Raw, 30),
    ]
}

#[derive(Default)]
pub struct FakeBackend {
    pub items: Mutex<Vec<Item>>,
    pub boms: Mutex<HashMap<ItemId, Vec<BomEntry>>>,
    pub log: Mutex<Vec<AuditLogEntry>>,
    pub freshness: Mutex<Vec<FreshnessRecord>>,
    pub conversions: Mutex<Vec<ConversionCommand>>,
    pub adjustments: Mutex<Vec<AdjustmentCommand>>,
    pub audit_queries: Mutex<Vec<AuditQuery>>,
    pub fail_bom: AtomicBool,
    pub fail_writes: AtomicBool,
    /// Writes that still succeed before every later one fails
    pub writes_before_failure: Mutex<Option<usize>>,
    pub item_loads: AtomicUsize,
}

impl FakeBackend {
    pub fn with_catalog(items: Vec<Item>) -> Self {
        let backend = Self::default();
        *backend.items.lock().unwrap() = items;
        backend
    }

    pub fn set_bom(&self, target: ItemId, rows: Vec<BomEntry>) {
        self.boms.lock().unwrap().insert(target, rows);
    }

    pub fn stock_of(&self, item_id: ItemId) -> Quantity {
        self.items
            .lock()
            .unwrap()
            .iter()
            .find(|item| item.id == item_id)
            .map_or(0, |item| item.stock_quantity)
    }

    fn apply(&self, item_id: ItemId, delta: Quantity) {
        if let Some(item) = self
            .items
            .lock()
            .unwrap()
            .iter_mut()
            .find(|item| item.id == item_id)
        {
            item.stock_quantity += delta;
        }
    }

    fn check_writes(&self) -> AppResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Gateway("backend unavailable".to_string()));
        }
        if let Some(left) = self.writes_before_failure.lock().unwrap().as_mut() {
            if *left == 0 {
                return Err(AppError::Gateway("backend unavailable".to_string()));
            }
            *left -= 1;
        }
        Ok(())
    }
}

#[async_trait]
impl ItemCatalog for FakeBackend {
    async fn list_items(&self) -> AppResult<Vec<Item>> {
        self.item_loads.fetch_add(1, Ordering::SeqCst);
        Ok(self.items.lock().unwrap().clone())
    }
}

#[async_trait]
impl BomSource for FakeBackend {
    async fn get_bom(&self, target_item_id: ItemId) -> AppResult<Vec<BomEntry>> {
        if self.fail_bom.load(Ordering::SeqCst) {
            return Err(AppError::Gateway("bom lookup failed".to_string()));
        }
        Ok(self
            .boms
            .lock()
            .unwrap()
            .get(&target_item_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl StockMutationGateway for FakeBackend {
    async fn convert(&self, command: &ConversionCommand) -> AppResult<()> {
        self.check_writes()?;
        self.apply(command.target_item_id, command.produce_quantity);
        for deduction in &command.deductions {
            self.apply(deduction.material_id, -deduction.quantity);
        }
        self.conversions.lock().unwrap().push(command.clone());
        Ok(())
    }

    async fn adjust(&self, command: &AdjustmentCommand) -> AppResult<()> {
        self.check_writes()?;
        self.apply(command.item_id, command.delta_quantity);
        self.adjustments.lock().unwrap().push(command.clone());
        Ok(())
    }
}

#[async_trait]
impl AuditSource for FakeBackend {
    async fn list_audit_log(&self, query: &AuditQuery) -> AppResult<Vec<AuditLogEntry>> {
        self.audit_queries.lock().unwrap().push(query.clone());
        let log = self.log.lock().unwrap();
        Ok(log.iter().take(query.limit as usize).cloned().collect())
    }

    async fn list_freshness(&self) -> AppResult<Vec<FreshnessRecord>> {
        Ok(self.freshness.lock().unwrap().clone())
    }
}
