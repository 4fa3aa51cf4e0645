//! HTTP client for the farm backend's product command API
//!
//! Translates between the backend's row shapes and the engine's records.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use reqwest::{Client, Response};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::{
    AdjustmentCommand, AuditLogEntry, AuditQuery, BomEntry, ChangeType, ConversionCommand,
    FreshnessRecord, Item, ItemClass, ItemId, LegacyRecipe, MaterialClass, Quantity,
    ReasonCategory,
};

use crate::config::ApiConfig;
use crate::error::{AppError, AppResult};
use crate::services::{AuditSource, BomSource, ItemCatalog, StockMutationGateway};

/// Command API client
#[derive(Clone)]
pub struct CommandApiClient {
    client: Client,
    base_url: String,
}

/// Product row from `/api/product/list`
#[derive(Debug, Deserialize)]
struct ProductRow {
    product_id: Option<ItemId>,
    product_name: String,
    specification: Option<String>,
    stock_quantity: Option<Quantity>,
    safety_stock: Option<Quantity>,
    item_type: Option<String>,
    material_id: Option<ItemId>,
    material_ratio: Option<Decimal>,
    aux_material_id: Option<ItemId>,
    aux_material_ratio: Option<Decimal>,
}

/// Joined BOM row from `/api/product/bom`
#[derive(Debug, Deserialize)]
struct BomRow {
    material_id: ItemId,
    ratio: Decimal,
    product_name: String,
    stock_quantity: Quantity,
    item_type: Option<String>,
}

/// Log row from `/api/product/logs`
#[derive(Debug, Deserialize)]
struct LogRow {
    product_name: String,
    change_type: String,
    change_quantity: Quantity,
    current_stock: Quantity,
    reference_id: Option<String>,
    memo: Option<String>,
    created_at: Option<String>,
}

/// Row from `/api/product/freshness`
#[derive(Debug, Deserialize)]
struct FreshnessRow {
    product_id: ItemId,
    last_in_date: Option<NaiveDateTime>,
}

#[derive(Debug, Serialize)]
struct ConvertTarget {
    product_id: ItemId,
    quantity: Quantity,
}

#[derive(Debug, Serialize)]
struct ConvertDeduction {
    material_id: ItemId,
    quantity: Quantity,
}

#[derive(Debug, Serialize)]
struct ConvertRequest<'a> {
    targets: Vec<ConvertTarget>,
    deductions: Vec<ConvertDeduction>,
    memo: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AdjustRequest<'a> {
    product_id: ItemId,
    change_qty: Quantity,
    memo: &'a str,
    reason_category: Option<&'static str>,
}

impl CommandApiClient {
    /// Create a new client from configuration
    pub fn new(config: &ApiConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create a new client with custom base URL (for testing)
    pub fn with_base_url(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> AppResult<T> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%url, "GET");
        let response = self.client.get(&url).query(query).send().await?;
        read_envelope(response).await
    }

    async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> AppResult<()> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%url, "POST");
        let response = self.client.post(&url).json(body).send().await?;
        read_envelope::<Value>(response).await.map(|_| ())
    }
}

/// Read either `{ success, data?, error? }` or a bare payload
async fn read_envelope<T: DeserializeOwned>(response: Response) -> AppResult<T> {
    let status = response.status();
    let body = response.text().await?;
    let value: Value = if body.trim().is_empty() {
        Value::Null
    } else if status.is_success() {
        serde_json::from_str(&body)?
    } else {
        serde_json::from_str(&body).unwrap_or(Value::Null)
    };

    if !status.is_success() {
        let message = error_message(&value).unwrap_or_else(|| format!("HTTP error {}", status));
        return Err(AppError::Gateway(message));
    }
    Ok(serde_json::from_value(unwrap_envelope(value)?)?)
}

fn error_message(value: &Value) -> Option<String> {
    value.get("error").and_then(Value::as_str).map(str::to_string)
}

fn unwrap_envelope(value: Value) -> AppResult<Value> {
    let Some(success) = value.get("success").and_then(Value::as_bool) else {
        return Ok(value);
    };
    if !success {
        return Err(AppError::Gateway(
            error_message(&value).unwrap_or_else(|| "Unknown server error".to_string()),
        ));
    }
    Ok(match value {
        Value::Object(mut map) => map.remove("data").unwrap_or(Value::Null),
        other => other,
    })
}

impl ProductRow {
    /// Rows without an id are drafts and are skipped
    fn into_item(self) -> Option<Item> {
        Some(Item {
            id: self.product_id?,
            name: self.product_name,
            specification: self.specification,
            class: ItemClass::from_item_type(self.item_type.as_deref()),
            stock_quantity: self.stock_quantity.unwrap_or(0),
            safety_stock: self.safety_stock.unwrap_or(0),
            legacy_recipe: LegacyRecipe {
                material_id: self.material_id,
                material_ratio: self.material_ratio,
                aux_material_id: self.aux_material_id,
                aux_material_ratio: self.aux_material_ratio,
            },
        })
    }
}

impl From<BomRow> for BomEntry {
    fn from(row: BomRow) -> Self {
        BomEntry::new(
            row.material_id,
            row.product_name,
            row.ratio,
            row.stock_quantity,
            MaterialClass::from_item_type(row.item_type.as_deref()),
        )
    }
}

impl From<LogRow> for AuditLogEntry {
    fn from(row: LogRow) -> Self {
        AuditLogEntry {
            timestamp: row.created_at.unwrap_or_default(),
            change_type: change_type_from_wire(&row.change_type),
            delta_quantity: row.change_quantity,
            resulting_balance: row.current_stock,
            memo: row.memo,
            product_name: row.product_name,
            reference_id: row.reference_id,
        }
    }
}

/// Map the backend's change-type labels; English codes are accepted too
pub fn change_type_from_wire(label: &str) -> ChangeType {
    match label.trim() {
        "입고" => ChangeType::Inbound,
        "출고" => ChangeType::Outbound,
        "수확" => ChangeType::Harvest,
        "생산입고" => ChangeType::ProductionInbound,
        "취소반품" => ChangeType::CancelReturn,
        "상품생산" => ChangeType::Production,
        "조정" | "재고조정" => ChangeType::Adjustment,
        "폐기손실" => ChangeType::Disposal,
        "마케팅증정" => ChangeType::MarketingGift,
        "재고입고" => ChangeType::PurchaseInflow,
        "자가소비" => ChangeType::SelfConsumption,
        other => ChangeType::from_code(other),
    }
}

/// Backend category code for a reason; general adjustments carry none
pub fn reason_to_wire(reason: Option<ReasonCategory>) -> Option<&'static str> {
    match ReasonCategory::wire_category(reason)? {
        ReasonCategory::GeneralAdjustment => None,
        ReasonCategory::Production => Some("상품생산"),
        ReasonCategory::Disposal => Some("폐기손실"),
        ReasonCategory::MarketingGift => Some("마케팅증정"),
        ReasonCategory::PurchaseInflow => Some("재고입고"),
        ReasonCategory::SelfConsumption => Some("자가소비"),
        ReasonCategory::Harvest => Some("수확"),
    }
}

#[async_trait]
impl ItemCatalog for CommandApiClient {
    async fn list_items(&self) -> AppResult<Vec<Item>> {
        let rows: Vec<ProductRow> = self.get("/api/product/list", &[]).await?;
        Ok(rows.into_iter().filter_map(ProductRow::into_item).collect())
    }
}

#[async_trait]
impl BomSource for CommandApiClient {
    async fn get_bom(&self, target_item_id: ItemId) -> AppResult<Vec<BomEntry>> {
        let rows: Vec<BomRow> = self
            .get(
                "/api/product/bom",
                &[("productId", target_item_id.to_string())],
            )
            .await?;
        Ok(rows.into_iter().map(BomEntry::from).collect())
    }
}

#[async_trait]
impl StockMutationGateway for CommandApiClient {
    async fn convert(&self, command: &ConversionCommand) -> AppResult<()> {
        let request = ConvertRequest {
            targets: vec![ConvertTarget {
                product_id: command.target_item_id,
                quantity: command.produce_quantity,
            }],
            deductions: command
                .deductions
                .iter()
                .map(|d| ConvertDeduction {
                    material_id: d.material_id,
                    quantity: d.quantity,
                })
                .collect(),
            memo: &command.memo,
        };
        self.post("/api/product/stock/convert", &request).await
    }

    async fn adjust(&self, command: &AdjustmentCommand) -> AppResult<()> {
        let request = AdjustRequest {
            product_id: command.item_id,
            change_qty: command.delta_quantity,
            memo: &command.memo,
            reason_category: reason_to_wire(command.reason_category),
        };
        self.post("/api/product/stock/adjust", &request).await
    }
}

#[async_trait]
impl AuditSource for CommandApiClient {
    async fn list_audit_log(&self, query: &AuditQuery) -> AppResult<Vec<AuditLogEntry>> {
        let mut params = vec![("limit", query.limit.to_string())];
        if let Some(class) = query.item_class {
            params.push(("itemType", class.item_type().to_string()));
        }
        let rows: Vec<LogRow> = self.get("/api/product/logs", &params).await?;
        Ok(rows.into_iter().map(AuditLogEntry::from).collect())
    }

    async fn list_freshness(&self) -> AppResult<Vec<FreshnessRecord>> {
        let rows: Vec<FreshnessRow> = self.get("/api/product/freshness", &[]).await?;
        Ok(rows
            .into_iter()
            .map(|row| FreshnessRecord {
                item_id: row.product_id,
                last_inflow: row.last_in_date,
            })
            .collect())
    }
}
