//! Cart arithmetic.
//!
//! The cart page, the count badge and the order message all read their numbers
//! from here so that the totals a customer sees and the totals sent to the
//! shop always agree.

use rust_decimal::Decimal;

use crate::cart::CartLineItem;

/// Unit price times quantity for one line.
///
/// Saturates at the `Decimal` bounds instead of overflowing.
#[must_use]
pub fn line_total(item: &CartLineItem) -> Decimal {
    item.unit_price.saturating_mul(Decimal::from(item.quantity))
}

/// Sum of [`line_total`] over every line, saturating like [`line_total`].
#[must_use]
pub fn subtotal(items: &[CartLineItem]) -> Decimal {
    items
        .iter()
        .map(line_total)
        .fold(Decimal::ZERO, Decimal::saturating_add)
}

/// Sum of quantities over every line.
#[must_use]
pub fn item_count(items: &[CartLineItem]) -> u64 {
    items.iter().map(|item| u64::from(item.quantity)).sum()
}
