//! Item catalog models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{ItemId, Quantity};

/// A stocked item as supplied by the catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub specification: Option<String>,
    pub class: ItemClass,
    pub stock_quantity: Quantity,
    pub safety_stock: Quantity,
    /// Single-material recipe fields predating the BOM table
    #[serde(default)]
    pub legacy_recipe: LegacyRecipe,
}

impl Item {
    pub fn is_below_safety_stock(&self) -> bool {
        self.stock_quantity <= self.safety_stock
    }
}

/// Item classes shown as separate stock tabs
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ItemClass {
    /// Sellable product
    Finished,
    /// Harvested produce
    Raw,
    /// Packaging, labels and other consumables
    Auxiliary,
}

impl ItemClass {
    /// Map the backend's `item_type` column onto a class
    pub fn from_item_type(item_type: Option<&str>) -> Self {
        match item_type {
            Some("harvest_item") => ItemClass::Raw,
            Some("aux_material") | Some("raw_material") | Some("material") => ItemClass::Auxiliary,
            _ => ItemClass::Finished,
        }
    }

    /// The `item_type` filter value used by the audit log query
    pub fn item_type(&self) -> &'static str {
        match self {
            ItemClass::Finished => "product",
            ItemClass::Raw => "harvest_item",
            ItemClass::Auxiliary => "aux_material",
        }
    }
}

impl std::fmt::Display for ItemClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemClass::Finished => write!(f, "Finished product"),
            ItemClass::Raw => write!(f, "Raw material"),
            ItemClass::Auxiliary => write!(f, "Auxiliary material"),
        }
    }
}

/// Legacy recipe: one main material and one auxiliary material per product
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LegacyRecipe {
    pub material_id: Option<ItemId>,
    pub material_ratio: Option<Decimal>,
    pub aux_material_id: Option<ItemId>,
    pub aux_material_ratio: Option<Decimal>,
}

impl LegacyRecipe {
    /// Referenced materials in resolution order (auxiliary first), ratio defaulting to 1
    pub fn materials(&self) -> Vec<(ItemId, Decimal)> {
        [
            (self.aux_material_id, self.aux_material_ratio),
            (self.material_id, self.material_ratio),
        ]
        .into_iter()
        .filter_map(|(id, ratio)| id.map(|id| (id, ratio.unwrap_or(Decimal::ONE))))
        .collect()
    }
}
