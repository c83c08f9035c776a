//! Currency helpers.
//!
//! Amounts are `Decimal` in the domain and integer minor units (cents) in
//! the store, so that SQL aggregation stays exact.

use rust_decimal::Decimal;

/// Number of decimal places kept for currency amounts.
pub const CURRENCY_SCALE: u32 = 2;

/// Whether an amount has no digits below the smallest currency unit.
pub fn fits_currency_scale(amount: Decimal) -> bool {
    amount.normalize().scale() <= CURRENCY_SCALE
}

/// Convert an amount to minor units exactly.
///
/// Returns `None` for sub-cent amounts and for amounts that do not fit in
/// an `i64`.
pub fn to_minor(amount: Decimal) -> Option<i64> {
    if !fits_currency_scale(amount) {
        return None;
    }
    let mut exact = amount.normalize();
    exact.rescale(CURRENCY_SCALE);
    i64::try_from(exact.mantissa()).ok()
}

/// Convert minor units back to an amount.
pub fn from_minor(minor: i64) -> Decimal {
    Decimal::new(minor, CURRENCY_SCALE)
}
