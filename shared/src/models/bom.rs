//! Bill-of-materials models and resolution strategy

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Item, ItemClass};
use crate::types::{ItemId, Quantity};

/// One material requirement of a finished good
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BomEntry {
    pub material_id: ItemId,
    pub name: String,
    /// Units of material per unit produced
    pub ratio: Decimal,
    pub stock: Quantity,
    pub class: MaterialClass,
}

impl BomEntry {
    pub fn new(
        material_id: ItemId,
        name: impl Into<String>,
        ratio: Decimal,
        stock: Quantity,
        class: MaterialClass,
    ) -> Self {
        Self {
            material_id,
            name: name.into(),
            ratio: ratio.max(Decimal::ZERO),
            stock,
            class,
        }
    }

    /// Build a row for a catalog item
    pub fn from_item(item: &Item, ratio: Decimal) -> Self {
        Self::new(
            item.id,
            item.name.clone(),
            ratio,
            item.stock_quantity,
            MaterialClass::from(item.class),
        )
    }
}

/// Material classes a recipe can consume
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MaterialClass {
    Raw,
    Auxiliary,
}

impl MaterialClass {
    /// Map the backend's `item_type` column; only harvested produce is raw
    pub fn from_item_type(item_type: Option<&str>) -> Self {
        match item_type {
            Some("harvest_item") => MaterialClass::Raw,
            _ => MaterialClass::Auxiliary,
        }
    }
}

impl From<ItemClass> for MaterialClass {
    fn from(class: ItemClass) -> Self {
        match class {
            ItemClass::Raw => MaterialClass::Raw,
            ItemClass::Finished | ItemClass::Auxiliary => MaterialClass::Auxiliary,
        }
    }
}

/// Everything the resolution steps look at, fetched up front
#[derive(Debug, Clone, Copy)]
pub struct ResolutionContext<'a> {
    pub target_id: ItemId,
    pub anchor_id: Option<ItemId>,
    /// Rows of the structured BOM for the target
    pub formal_bom: &'a [BomEntry],
    pub catalog: &'a [Item],
}

impl<'a> ResolutionContext<'a> {
    fn item(&self, id: ItemId) -> Option<&'a Item> {
        self.catalog.iter().find(|item| item.id == id)
    }
}

/// A single way of producing BOM rows; `None` passes to the next step
pub trait ResolutionStep {
    fn name(&self) -> &'static str;
    fn resolve(&self, ctx: &ResolutionContext<'_>) -> Option<Vec<BomEntry>>;
}

/// The structured BOM
pub struct FormalBom;

impl ResolutionStep for FormalBom {
    fn name(&self) -> &'static str {
        "formal_bom"
    }

    fn resolve(&self, ctx: &ResolutionContext<'_>) -> Option<Vec<BomEntry>> {
        if ctx.formal_bom.is_empty() {
            None
        } else {
            Some(ctx.formal_bom.to_vec())
        }
    }
}

/// Rows synthesized from the target item's legacy material fields
pub struct LegacyFields;

impl ResolutionStep for LegacyFields {
    fn name(&self) -> &'static str {
        "legacy_fields"
    }

    fn resolve(&self, ctx: &ResolutionContext<'_>) -> Option<Vec<BomEntry>> {
        let target = ctx.item(ctx.target_id)?;
        let rows: Vec<BomEntry> = target
            .legacy_recipe
            .materials()
            .into_iter()
            .filter_map(|(id, ratio)| ctx.item(id).map(|item| BomEntry::from_item(item, ratio)))
            .collect();
        if rows.is_empty() {
            None
        } else {
            Some(rows)
        }
    }
}

/// Ordered resolution steps followed by forced anchor inclusion
pub struct BomStrategy {
    steps: Vec<Box<dyn ResolutionStep + Send + Sync>>,
}

impl Default for BomStrategy {
    fn default() -> Self {
        Self {
            steps: vec![Box::new(FormalBom), Box::new(LegacyFields)],
        }
    }
}

impl BomStrategy {
    pub fn new(steps: Vec<Box<dyn ResolutionStep + Send + Sync>>) -> Self {
        Self { steps }
    }

    /// Resolve the material list; returns the rows and the name of the step that produced them
    pub fn resolve(&self, ctx: &ResolutionContext<'_>) -> (Vec<BomEntry>, Option<&'static str>) {
        let (mut rows, source) = self
            .steps
            .iter()
            .find_map(|step| step.resolve(ctx).map(|rows| (rows, Some(step.name()))))
            .unwrap_or_default();

        if let Some(anchor_id) = ctx.anchor_id {
            include_anchor(&mut rows, anchor_id, ctx.item(anchor_id));
        }
        (rows, source)
    }
}

/// Append the anchor with ratio 0 when no step produced it
fn include_anchor(rows: &mut Vec<BomEntry>, anchor_id: ItemId, item: Option<&Item>) {
    if rows.iter().any(|row| row.material_id == anchor_id) {
        return;
    }
    let (name, stock) = item
        .map(|item| (item.name.clone(), item.stock_quantity))
        .unwrap_or_default();
    rows.push(BomEntry::new(
        anchor_id,
        name,
        Decimal::ZERO,
        stock,
        MaterialClass::Raw,
    ));
}
