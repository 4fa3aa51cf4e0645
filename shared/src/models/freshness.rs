//! Freshness of stocked produce since its last inflow

use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{Item, ItemClass};
use crate::types::{ItemId, Quantity};

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Last inflow date per item, as reported by the backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FreshnessRecord {
    pub item_id: ItemId,
    pub last_inflow: Option<NaiveDateTime>,
}

/// Freshness classification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum FreshnessTier {
    Fresh,
    /// Should be sold soon
    RecommendSale,
    /// Urgent
    Stale,
}

impl FreshnessTier {
    pub fn for_days(days: i64) -> Self {
        if days > 7 {
            FreshnessTier::Stale
        } else if days > 3 {
            FreshnessTier::RecommendSale
        } else {
            FreshnessTier::Fresh
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FreshnessTier::Fresh => "Fresh",
            FreshnessTier::RecommendSale => "Recommend sale",
            FreshnessTier::Stale => "Urgent",
        }
    }
}

/// Days since the inflow, not counting the inflow day itself.
///
/// `ceil(|now - last| / 1 day) - 1`, clamped at zero.
pub fn days_since_inflow(now: NaiveDateTime, last_inflow: NaiveDateTime) -> i64 {
    let millis = (now - last_inflow).num_milliseconds().abs();
    let days = (millis + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY;
    (days - 1).max(0)
}

/// Whether an item gets a tier at all
pub fn is_applicable(class: ItemClass, stock_quantity: Quantity) -> bool {
    stock_quantity > 0 && matches!(class, ItemClass::Finished | ItemClass::Raw)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct FreshnessInfo {
    pub days: i64,
    pub tier: FreshnessTier,
    pub last_inflow: NaiveDateTime,
}

/// Evaluate one item; `None` when inapplicable or no inflow is on record
pub fn evaluate(
    class: ItemClass,
    stock_quantity: Quantity,
    last_inflow: Option<NaiveDateTime>,
    now: NaiveDateTime,
) -> Option<FreshnessInfo> {
    if !is_applicable(class, stock_quantity) {
        return None;
    }
    let last_inflow = last_inflow?;
    let days = days_since_inflow(now, last_inflow);
    Some(FreshnessInfo {
        days,
        tier: FreshnessTier::for_days(days),
        last_inflow,
    })
}

/// Freshness lookup keyed by item id
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FreshnessIndex {
    entries: HashMap<ItemId, FreshnessInfo>,
}

impl FreshnessIndex {
    pub fn build(items: &[Item], records: &[FreshnessRecord], now: NaiveDateTime) -> Self {
        let last_inflow: HashMap<ItemId, NaiveDateTime> = records
            .iter()
            .filter_map(|record| record.last_inflow.map(|at| (record.item_id, at)))
            .collect();

        let entries = items
            .iter()
            .filter_map(|item| {
                evaluate(
                    item.class,
                    item.stock_quantity,
                    last_inflow.get(&item.id).copied(),
                    now,
                )
                .map(|info| (item.id, info))
            })
            .collect();
        Self { entries }
    }

    pub fn get(&self, item_id: ItemId) -> Option<&FreshnessInfo> {
        self.entries.get(&item_id)
    }

    pub fn tier(&self, item_id: ItemId) -> Option<FreshnessTier> {
        self.get(item_id).map(|info| info.tier)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ItemId, &FreshnessInfo)> {
        self.entries.iter()
    }
}
