//! Conversion planning: raw and auxiliary materials into finished goods
//!
//! A [`ConversionPlan`] is an immutable value. Every edit returns a new plan
//! that is internally consistent again, so the stock screen can keep the
//! previous value for undo or diffing.
//!
//! The anchor row is the material the operator physically measures. Editing
//! its actual quantity drives the produce quantity; editing any other row
//! only records a variance against the recipe.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{BomEntry, MaterialClass};
use crate::types::{non_negative, producible_quantity, theoretical_quantity, ItemId, Quantity};

/// Memo used when the operator leaves the conversion memo blank
pub const DEFAULT_CONVERSION_MEMO: &str = "Batch production";

/// Errors raised by plan edits
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("No anchor material is designated")]
    NoAnchor,

    #[error("Material {0} is not part of the plan")]
    UnknownMaterial(ItemId),

    #[error("Row {index} does not exist (plan has {len} rows)")]
    RowOutOfRange { index: usize, len: usize },
}

/// Per-material consumption line of a plan
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeductionRow {
    pub material_id: ItemId,
    pub name: String,
    pub ratio: Decimal,
    pub stock: Quantity,
    /// Recipe-implied consumption, `ceil(produce_quantity * ratio)`
    pub theoretical_qty: Quantity,
    /// Operator-confirmed consumption
    pub actual_qty: Quantity,
    pub class: MaterialClass,
}

impl DeductionRow {
    fn from_entry(entry: &BomEntry, produce: Quantity) -> Self {
        let qty = theoretical_quantity(produce, entry.ratio);
        Self {
            material_id: entry.material_id,
            name: entry.name.clone(),
            ratio: entry.ratio,
            stock: entry.stock,
            theoretical_qty: qty,
            actual_qty: qty,
            class: entry.class,
        }
    }

    fn has_ratio(&self) -> bool {
        self.ratio > Decimal::ZERO
    }

    /// Difference between actual and recipe consumption
    pub fn variance(&self) -> Variance {
        let diff = self.actual_qty - self.theoretical_qty;
        match diff.signum() {
            1 => Variance::Loss(diff),
            -1 => Variance::Saving(-diff),
            _ => Variance::Exact,
        }
    }

    /// True when recorded consumption exceeds current stock
    pub fn is_short(&self) -> bool {
        self.stock < self.actual_qty
    }
}

/// Operational loss or saving of a row
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "quantity", rename_all = "snake_case")]
pub enum Variance {
    Exact,
    /// Consumed more than the recipe implies
    Loss(Quantity),
    /// Consumed less than the recipe implies
    Saving(Quantity),
}

impl std::fmt::Display for Variance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Variance::Exact => Ok(()),
            Variance::Loss(qty) => write!(f, "+{} loss", qty),
            Variance::Saving(qty) => write!(f, "-{} save", qty),
        }
    }
}

/// A row whose recorded consumption exceeds stock; needs operator confirmation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Shortage {
    pub material_id: ItemId,
    pub name: String,
    pub required: Quantity,
    pub available: Quantity,
}

/// Working plan for one conversion
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversionPlan {
    pub target_item_id: ItemId,
    pub anchor_material_id: Option<ItemId>,
    pub produce_quantity: Quantity,
    pub rows: Vec<DeductionRow>,
}

impl ConversionPlan {
    pub const DEFAULT_PRODUCE_QUANTITY: Quantity = 1;

    /// Initialise a plan from resolved BOM rows.
    ///
    /// Without an explicit anchor (or with one that is not among the rows)
    /// the first raw material is chosen, falling back to the first row.
    pub fn new(
        target_item_id: ItemId,
        anchor_material_id: Option<ItemId>,
        entries: &[BomEntry],
        produce_quantity: Option<Quantity>,
    ) -> Self {
        let produce = non_negative(produce_quantity.unwrap_or(Self::DEFAULT_PRODUCE_QUANTITY));
        let rows: Vec<DeductionRow> = entries
            .iter()
            .map(|entry| DeductionRow::from_entry(entry, produce))
            .collect();

        let anchor = anchor_material_id
            .filter(|id| rows.iter().any(|row| row.material_id == *id))
            .or_else(|| {
                rows.iter()
                    .find(|row| row.class == MaterialClass::Raw)
                    .or_else(|| rows.first())
                    .map(|row| row.material_id)
            });

        Self {
            target_item_id,
            anchor_material_id: anchor,
            produce_quantity: produce,
            rows,
        }
    }

    pub fn is_anchor(&self, row: &DeductionRow) -> bool {
        self.anchor_material_id == Some(row.material_id)
    }

    /// Index and row of the anchor material
    pub fn anchor_row(&self) -> Option<(usize, &DeductionRow)> {
        self.rows.iter().enumerate().find(|(_, row)| self.is_anchor(row))
    }

    /// Designate an existing row as the anchor; quantities are left as they are
    pub fn with_anchor(&self, material_id: ItemId) -> Result<Self, PlanError> {
        if !self.rows.iter().any(|row| row.material_id == material_id) {
            return Err(PlanError::UnknownMaterial(material_id));
        }
        Ok(Self {
            anchor_material_id: Some(material_id),
            ..self.clone()
        })
    }

    /// Set the produce quantity and re-suggest every row's consumption.
    ///
    /// A ratio-less anchor keeps its actual quantity: it cannot be derived
    /// from the produce quantity.
    pub fn with_produce_quantity(&self, produce_quantity: Quantity) -> Self {
        let produce = non_negative(produce_quantity);
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let theoretical = theoretical_quantity(produce, row.ratio);
                let actual = if self.is_anchor(row) && !row.has_ratio() {
                    row.actual_qty
                } else {
                    theoretical
                };
                DeductionRow {
                    theoretical_qty: theoretical,
                    actual_qty: actual,
                    ..row.clone()
                }
            })
            .collect();

        Self {
            produce_quantity: produce,
            rows,
            ..self.clone()
        }
    }

    /// Record the measured consumption of the anchor material.
    ///
    /// With a positive ratio the produce quantity becomes
    /// `floor(qty / ratio)` and every other row is re-suggested; the anchor
    /// keeps the literal quantity typed. A ratio-less anchor only records
    /// the quantity.
    pub fn with_anchor_actual(&self, qty: Quantity) -> Result<Self, PlanError> {
        let qty = non_negative(qty);
        let (anchor_index, anchor) = self.anchor_row().ok_or(PlanError::NoAnchor)?;

        let Some(produce) = producible_quantity(qty, anchor.ratio) else {
            let mut rows = self.rows.clone();
            rows[anchor_index].actual_qty = qty;
            return Ok(Self {
                rows,
                ..self.clone()
            });
        };

        let rows = self
            .rows
            .iter()
            .enumerate()
            .map(|(index, row)| {
                let theoretical = theoretical_quantity(produce, row.ratio);
                DeductionRow {
                    theoretical_qty: theoretical,
                    actual_qty: if index == anchor_index { qty } else { theoretical },
                    ..row.clone()
                }
            })
            .collect();

        Ok(Self {
            produce_quantity: produce,
            rows,
            ..self.clone()
        })
    }

    /// Override one row's actual consumption.
    ///
    /// Non-anchor rows change nothing else. The anchor row is routed through
    /// [`ConversionPlan::with_anchor_actual`].
    pub fn with_row_actual(&self, index: usize, qty: Quantity) -> Result<Self, PlanError> {
        let row = self.rows.get(index).ok_or(PlanError::RowOutOfRange {
            index,
            len: self.rows.len(),
        })?;
        if self.is_anchor(row) {
            return self.with_anchor_actual(qty);
        }

        let mut rows = self.rows.clone();
        rows[index].actual_qty = non_negative(qty);
        Ok(Self {
            rows,
            ..self.clone()
        })
    }

    /// Rows whose recorded consumption exceeds stock
    pub fn shortages(&self) -> Vec<Shortage> {
        self.rows
            .iter()
            .filter(|row| row.is_short())
            .map(|row| Shortage {
                material_id: row.material_id,
                name: row.name.clone(),
                required: row.actual_qty,
                available: row.stock,
            })
            .collect()
    }

    /// Payload for the stock mutation gateway; every row is sent, zero quantities included
    pub fn commit_payload(&self, memo: &str) -> ConversionCommand {
        let memo = memo.trim();
        ConversionCommand {
            target_item_id: self.target_item_id,
            produce_quantity: self.produce_quantity,
            deductions: self
                .rows
                .iter()
                .map(|row| Deduction {
                    material_id: row.material_id,
                    quantity: row.actual_qty,
                })
                .collect(),
            memo: if memo.is_empty() {
                DEFAULT_CONVERSION_MEMO.to_string()
            } else {
                memo.to_string()
            },
        }
    }
}

/// Material consumption sent with a conversion
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Deduction {
    pub material_id: ItemId,
    pub quantity: Quantity,
}

/// Conversion request for the stock mutation gateway
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversionCommand {
    pub target_item_id: ItemId,
    pub produce_quantity: Quantity,
    pub deductions: Vec<Deduction>,
    pub memo: String,
}
