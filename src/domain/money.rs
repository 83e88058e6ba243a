//! Monetary types for price and volume representation.

use rust_decimal::Decimal;

/// Price represented as a Decimal for precision.
///
/// Outcome token prices live in `[0, 1]`; a winning token pays out `1`.
pub type Price = Decimal;

/// Volume represented as a Decimal for precision.
pub type Volume = Decimal;

/// Returns true when `price` is a valid outcome token price.
pub fn is_outcome_price(price: Price) -> bool {
    price >= Decimal::ZERO && price <= Decimal::ONE
}
