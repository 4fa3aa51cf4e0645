//! Common types used across the platform

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Catalog identifier of an item (finished good or material)
pub type ItemId = i32;

/// Whole stock units. Quantities entered by operators are clamped to `>= 0`.
pub type Quantity = i64;

/// Clamp an operator-entered quantity to zero when negative
pub fn non_negative(quantity: Quantity) -> Quantity {
    quantity.max(0)
}

/// Material consumption implied by a recipe ratio: `ceil(produce * ratio)`
pub fn theoretical_quantity(produce: Quantity, ratio: Decimal) -> Quantity {
    if ratio <= Decimal::ZERO || produce <= 0 {
        return 0;
    }
    Decimal::from(produce)
        .checked_mul(ratio)
        .and_then(|consumed| consumed.ceil().to_i64())
        .unwrap_or(Quantity::MAX)
}

/// Units producible from a measured consumption: `floor(consumed / ratio)`.
///
/// Returns `None` when the ratio is not positive; the remainder of a
/// fractional division is always dropped.
pub fn producible_quantity(consumed: Quantity, ratio: Decimal) -> Option<Quantity> {
    if ratio <= Decimal::ZERO {
        return None;
    }
    let consumed = non_negative(consumed);
    Some(
        Decimal::from(consumed)
            .checked_div(ratio)
            .and_then(|produce| produce.floor().to_i64())
            .unwrap_or(Quantity::MAX),
    )
}
