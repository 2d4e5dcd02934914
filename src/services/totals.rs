//! Quote totals

use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::NewQuoteItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Totals {
    pub subtotal: Decimal,
    /// Equal to `subtotal`; totals are tax-exclusive with no discounts
    pub total: Decimal,
}

/// Decimal places kept for item quantities
pub const QUANTITY_SCALE: u32 = 4;
/// Decimal places kept for item unit prices
pub const PRICE_SCALE: u32 = 2;

/// Round an item's amounts to the scale the store keeps.
/// Midpoints round away from zero, matching Postgres NUMERIC input.
pub fn normalize_item(item: &mut NewQuoteItem) {
    item.quantity = item
        .quantity
        .round_dp_with_strategy(QUANTITY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    item.unit_price = item
        .unit_price
        .round_dp_with_strategy(PRICE_SCALE, RoundingStrategy::MidpointAwayFromZero);
}

pub fn line_total(quantity: Decimal, unit_price: Decimal) -> Decimal {
    quantity * unit_price
}

/// Sum of quantity x unit price over all items
pub fn compute_totals(items: &[NewQuoteItem]) -> Totals {
    let subtotal = items
        .iter()
        .map(|item| line_total(item.quantity, item.unit_price))
        .sum();

    Totals {
        subtotal,
        total: subtotal,
    }
}
