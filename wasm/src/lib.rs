//! WebAssembly bindings for the Farm Stock screen
//!
//! Provides client-side computation for:
//! - Conversion planning (BOM resolution, anchor measurement, shortages)
//! - Manual adjustment previews and memos
//! - Audit timeline grouping
//! - Freshness tiers
//!
//! Structured values cross the boundary as JSON strings. Quantity inputs
//! are taken as the raw text typed by the operator.

use chrono::{FixedOffset, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Serialize;
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::types::*;
pub use shared::validation::*;

fn js_error(context: &str, e: impl std::fmt::Display) -> JsValue {
    let message = format!("{}: {}", context, e);
    #[cfg(target_arch = "wasm32")]
    web_sys::console::warn_1(&JsValue::from_str(&message));
    JsValue::from_str(&message)
}

fn from_json<T: DeserializeOwned>(json: &str, what: &str) -> Result<T, JsValue> {
    serde_json::from_str(json).map_err(|e| js_error(&format!("Invalid {} JSON", what), e))
}

fn to_json<T: Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(|e| js_error("Serialization failed", e))
}

// ============================================================================
// Conversion Planning
// ============================================================================

/// Resolve the material list and start a plan.
///
/// `bom_json` holds the structured BOM rows (may be `[]`), `catalog_json`
/// the item catalog used for legacy recipes and the forced anchor.
#[wasm_bindgen]
pub fn init_conversion_plan(
    target_id: i32,
    anchor_id: Option<i32>,
    bom_json: &str,
    catalog_json: &str,
    produce_input: &str,
) -> Result<String, JsValue> {
    let formal_bom: Vec<BomEntry> = from_json(bom_json, "BOM")?;
    let catalog: Vec<Item> = from_json(catalog_json, "catalog")?;
    let ctx = ResolutionContext {
        target_id,
        anchor_id,
        formal_bom: &formal_bom,
        catalog: &catalog,
    };
    let (rows, _) = BomStrategy::default().resolve(&ctx);
    let produce = if produce_input.trim().is_empty() {
        None
    } else {
        Some(parse_quantity(produce_input))
    };
    to_json(&ConversionPlan::new(target_id, anchor_id, &rows, produce))
}

#[wasm_bindgen]
pub fn plan_set_produce_quantity(plan_json: &str, input: &str) -> Result<String, JsValue> {
    let plan: ConversionPlan = from_json(plan_json, "plan")?;
    to_json(&plan.with_produce_quantity(parse_quantity(input)))
}

#[wasm_bindgen]
pub fn plan_set_anchor(plan_json: &str, material_id: i32) -> Result<String, JsValue> {
    let plan: ConversionPlan = from_json(plan_json, "plan")?;
    let next = plan
        .with_anchor(material_id)
        .map_err(|e| js_error("Anchor rejected", e))?;
    to_json(&next)
}

#[wasm_bindgen]
pub fn plan_set_anchor_actual(plan_json: &str, input: &str) -> Result<String, JsValue> {
    let plan: ConversionPlan = from_json(plan_json, "plan")?;
    let next = plan
        .with_anchor_actual(parse_quantity(input))
        .map_err(|e| js_error("Anchor measurement rejected", e))?;
    to_json(&next)
}

#[wasm_bindgen]
pub fn plan_set_row_actual(plan_json: &str, index: usize, input: &str) -> Result<String, JsValue> {
    let plan: ConversionPlan = from_json(plan_json, "plan")?;
    let next = plan
        .with_row_actual(index, parse_quantity(input))
        .map_err(|e| js_error("Row edit rejected", e))?;
    to_json(&next)
}

/// Shortages the operator must confirm before committing
#[wasm_bindgen]
pub fn plan_shortages(plan_json: &str) -> Result<String, JsValue> {
    let plan: ConversionPlan = from_json(plan_json, "plan")?;
    to_json(&plan.shortages())
}

#[wasm_bindgen]
pub fn plan_commit_payload(plan_json: &str, memo: &str) -> Result<String, JsValue> {
    let plan: ConversionPlan = from_json(plan_json, "plan")?;
    validate_memo(memo).map_err(|e| js_error("Invalid memo", e))?;
    to_json(&plan.commit_payload(memo))
}

/// Recipe consumption for a produce quantity
#[wasm_bindgen]
pub fn theoretical_consumption(produce_quantity: f64, ratio: f64) -> f64 {
    let ratio = Decimal::try_from(ratio).unwrap_or(Decimal::ZERO);
    let produce = non_negative(produce_quantity as Quantity);
    theoretical_quantity(produce, ratio) as f64
}

// ============================================================================
// Manual Adjustments
// ============================================================================

/// Stock after a typed delta is applied
#[wasm_bindgen]
pub fn project_adjustment(current_stock: f64, delta_input: &str) -> f64 {
    (current_stock as Quantity).saturating_add(parse_delta(delta_input)) as f64
}

/// Memo that will be written for an adjustment; `reason` is a snake_case category code
#[wasm_bindgen]
pub fn adjustment_memo(delta_input: &str, reason: Option<String>, note: &str) -> String {
    let reason = reason
        .and_then(|code| serde_json::from_value::<ReasonCategory>(serde_json::Value::String(code)).ok());
    compose_adjustment_memo(parse_delta(delta_input), reason, note)
}

// ============================================================================
// Audit Timeline
// ============================================================================

/// Group log entries by local date for a viewer at `utc_offset_minutes`
#[wasm_bindgen]
pub fn build_audit_timeline(
    entries_json: &str,
    filter_json: &str,
    utc_offset_minutes: i32,
) -> Result<String, JsValue> {
    let entries: Vec<AuditLogEntry> = from_json(entries_json, "audit log")?;
    let filter: TimelineFilter = from_json(filter_json, "filter")?;
    let offset = utc_offset_minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| js_error("Invalid UTC offset", utc_offset_minutes))?;
    to_json(&AuditTimeline::build(&entries, &filter, &offset))
}

// ============================================================================
// Freshness
// ============================================================================

fn parse_inflow(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Freshness tier code (`fresh`, `recommend_sale`, `stale`) as of `now`.
///
/// Returns `None` when the item gets no tier: no stock, auxiliary
/// material, or no parseable inflow date.
#[wasm_bindgen]
pub fn freshness_tier(
    item_type: Option<String>,
    stock_quantity: f64,
    last_inflow: &str,
    now: &str,
) -> Option<String> {
    let now = parse_inflow(now)?;
    let class = ItemClass::from_item_type(item_type.as_deref());
    let info = evaluate(class, stock_quantity as Quantity, parse_inflow(last_inflow), now)?;
    serde_json::to_value(info.tier)
        .ok()
        .and_then(|value| value.as_str().map(str::to_string))
}

/// [`freshness_tier`] against the browser's local clock
#[wasm_bindgen]
pub fn freshness_tier_today(
    item_type: Option<String>,
    stock_quantity: f64,
    last_inflow: &str,
) -> Option<String> {
    let clock = js_sys::Date::new_0();
    let now = NaiveDate::from_ymd_opt(
        clock.get_full_year() as i32,
        clock.get_month() + 1,
        clock.get_date(),
    )?
    .and_hms_opt(clock.get_hours(), clock.get_minutes(), clock.get_seconds())?;
    freshness_tier(
        item_type,
        stock_quantity,
        last_inflow,
        &now.format("%Y-%m-%dT%H:%M:%S").to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog_json() -> String {
        serde_json::json!([
            {"id": 1, "name": "Strawberry jam 500g", "specification": null, "class": "finished",
             "stock_quantity": 0, "safety_stock": 0,
             "legacy_recipe": {"material_id": 2, "material_ratio": "2", "aux_material_id": null, "aux_material_ratio": null}},
            {"id": 2, "name": "Strawberries", "specification": null, "class": "raw",
             "stock_quantity": 100, "safety_stock": 10},
            {"id": 4, "name": "Blueberries", "specification": null, "class": "raw",
             "stock_quantity": 30, "safety_stock": 0}
        ])
        .to_string()
    }

    #[test]
    fn test_plan_from_legacy_recipe() {
        let plan_json = init_conversion_plan(1, None, "[]", &catalog_json(), "10").unwrap();
        let plan: ConversionPlan = serde_json::from_str(&plan_json).unwrap();
        assert_eq!(plan.produce_quantity, 10);
        assert_eq!(plan.anchor_material_id, Some(2));
        assert_eq!(plan.rows[0].actual_qty, 20);
    }

    #[test]
    fn test_anchor_measurement_round_trip() {
        let plan_json = init_conversion_plan(1, None, "[]", &catalog_json(), "").unwrap();
        let plan_json = plan_set_anchor_actual(&plan_json, "25").unwrap();
        let plan: ConversionPlan = serde_json::from_str(&plan_json).unwrap();
        assert_eq!(plan.produce_quantity, 12);

        let plan_json = plan_set_produce_quantity(&plan_json, "abc").unwrap();
        let plan: ConversionPlan = serde_json::from_str(&plan_json).unwrap();
        assert_eq!(plan.produce_quantity, 0);
    }

    #[test]
    fn test_forced_anchor_row() {
        let plan_json = init_conversion_plan(1, Some(4), "[]", &catalog_json(), "3").unwrap();
        let plan: ConversionPlan = serde_json::from_str(&plan_json).unwrap();
        assert_eq!(plan.rows.len(), 2);
        assert_eq!(plan.anchor_material_id, Some(4));

        let payload = plan_commit_payload(&plan_json, "").unwrap();
        let command: ConversionCommand = serde_json::from_str(&payload).unwrap();
        assert_eq!(command.memo, DEFAULT_CONVERSION_MEMO);
        assert_eq!(command.deductions[1].quantity, 0);
    }

    #[test]
    fn test_theoretical_consumption() {
        assert_eq!(theoretical_consumption(10.0, 0.25), 3.0);
        assert_eq!(theoretical_consumption(4.0, 0.0), 0.0);
    }

    #[test]
    fn test_adjustment_preview() {
        assert_eq!(project_adjustment(10.0, "-3"), 7.0);
        assert_eq!(
            project_adjustment(9.0e18, "9223372036854775807"),
            Quantity::MAX as f64
        );
        assert_eq!(
            project_adjustment(-9.0e18, "-9223372036854775807"),
            Quantity::MIN as f64
        );
        assert_eq!(
            adjustment_memo("-2", Some("disposal".to_string()), ""),
            "Manual adjustment - Disposal (loss)"
        );
        assert_eq!(adjustment_memo("5", Some("bogus".to_string()), ""), "Manual inflow");
    }

    #[test]
    fn test_timeline_in_kst() {
        let entries = serde_json::json!([
            {"timestamp": "2024-01-01 20:30:00", "change_type": "adjustment", "delta_quantity": -1,
             "resulting_balance": 9, "memo": null, "product_name": "Strawberries", "reference_id": "MANUAL"}
        ])
        .to_string();
        let view_json = build_audit_timeline(&entries, r#"{"exclude_automatic": true}"#, 540).unwrap();
        let view: TimelineView = serde_json::from_str(&view_json).unwrap();
        assert_eq!(view.buckets[0].date, "2024-01-02");
        assert_eq!(view.outflow_total, -1);
    }

    #[test]
    fn test_freshness_tier() {
        let now = "2024-05-20T14:00:00";
        assert_eq!(
            freshness_tier(Some("product".into()), 5.0, "2024-05-12T09:00:00", now).as_deref(),
            Some("stale")
        );
        assert_eq!(
            freshness_tier(Some("harvest_item".into()), 5.0, "2024-05-18 09:00:00", now).as_deref(),
            Some("fresh")
        );
        assert_eq!(freshness_tier(Some("product".into()), 0.0, "2024-05-12", now), None);
        assert_eq!(freshness_tier(Some("aux_material".into()), 9.0, "2024-05-12", now), None);
    }
}
