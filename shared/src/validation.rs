//! Validation utilities for operator input
//!
//! Quantity fields are forgiving: anything that is not a non-negative
//! number is read as zero. The checks below reject what cannot be sent.

use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::models::HarvestLine;
use crate::types::{non_negative, Quantity};

// ============================================================================
// Quantity Input
// ============================================================================

/// Parse a typed quantity; blank, non-numeric and negative input become 0.
/// Fractions are truncated.
pub fn parse_quantity(input: &str) -> Quantity {
    let input = input.trim().replace(',', "");
    if let Ok(qty) = input.parse::<Quantity>() {
        return non_negative(qty);
    }
    Decimal::from_str(&input)
        .ok()
        .and_then(|qty| qty.trunc().to_i64())
        .map(non_negative)
        .unwrap_or(0)
}

/// Parse a signed adjustment delta; invalid input becomes 0
pub fn parse_delta(input: &str) -> Quantity {
    input.trim().replace(',', "").parse::<Quantity>().unwrap_or(0)
}

// ============================================================================
// Conversion Validations
// ============================================================================

/// Validate a conversion memo
pub fn validate_memo(memo: &str) -> Result<(), &'static str> {
    if memo.chars().count() > 500 {
        return Err("Memo must be at most 500 characters");
    }
    Ok(())
}

// ============================================================================
// Adjustment Validations
// ============================================================================

/// A zero delta is not an adjustment
pub fn validate_adjustment_delta(delta: Quantity) -> Result<(), &'static str> {
    if delta == 0 {
        return Err("Adjustment quantity must not be zero");
    }
    Ok(())
}

/// A harvest intake needs at least one line with a positive quantity
pub fn validate_harvest_lines(lines: &[HarvestLine]) -> Result<(), &'static str> {
    if lines.is_empty() {
        return Err("Harvest intake has no lines");
    }
    if !lines.iter().any(|line| line.quantity > 0) {
        return Err("Harvest intake needs at least one positive quantity");
    }
    Ok(())
}
