//! Value Objects for the storefront

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Largest amount a `NUMERIC(12, 2)` column holds, 9 999 999 999.99.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

/// Card number with everything but the last four digits replaced.
///
/// Checkout only ever receives test card data, but the stored snapshot
/// still never holds a full number.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct MaskedCardNumber(String);

impl MaskedCardNumber {
    pub fn mask(raw: &str) -> Self {
        let digits: Vec<char> = raw.chars().filter(char::is_ascii_digit).collect();
        let tail: String = digits[digits.len().saturating_sub(4)..].iter().collect();
        if tail.is_empty() { Self(String::new()) } else { Self(format!("**** **** **** {tail}")) }
    }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for MaskedCardNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// Whether `amount` fits a stored money column.
pub fn within_amount_range(amount: Decimal) -> bool { amount.abs() <= MAX_AMOUNT }

/// Line quantity; an order line always holds between one and `Quantity::MAX` units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quantity(i32);

impl Quantity {
    pub const MAX: i32 = 10_000;

    pub fn new(value: i32) -> Option<Self> { (1..=Self::MAX).contains(&value).then_some(Self(value)) }
    pub fn value(&self) -> i32 { self.0 }
}
