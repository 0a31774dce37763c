//! Cart Aggregate
//!
//! Client-side cart state: product snapshots with quantities. The checkout
//! page turns it into a [`CheckoutRequest`].

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::aggregates::order::{CheckoutItem, CheckoutRequest, CheckoutTotals, ContactDetails, ItemProductRef, PaymentDetails};
use crate::domain::aggregates::product::Product;

/// Subtotal above which shipping is free.
pub const FREE_SHIPPING_THRESHOLD: Decimal = Decimal::from_parts(100, 0, 0, false, 0);
/// Flat shipping fee, 9.99.
pub const SHIPPING_FEE: Decimal = Decimal::from_parts(999, 0, 0, false, 2);
/// Sales tax rate, 8 %.
pub const TAX_RATE: Decimal = Decimal::from_parts(8, 0, 0, false, 2);

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<CartItem>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: String,
    pub product: Product,
    pub quantity: u32,
}

impl CartItem {
    pub fn line_total(&self) -> Decimal { self.product.price.saturating_mul(Decimal::from(self.quantity)) }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CartTotals {
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

impl From<CartTotals> for CheckoutTotals {
    fn from(t: CartTotals) -> Self {
        Self { subtotal: Some(t.subtotal), shipping: Some(t.shipping), tax: Some(t.tax), total: Some(t.total) }
    }
}

impl Cart {
    pub fn new() -> Self { Self::default() }

    pub fn items(&self) -> &[CartItem] { &self.items }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    /// Adds `quantity` of `product`, merging into an existing line for the same product.
    pub fn add(&mut self, product: Product, quantity: u32) {
        if let Some(existing) = self.items.iter_mut().find(|i| i.product.id == product.id) {
            existing.quantity = existing.quantity.saturating_add(quantity);
        } else {
            let id = format!("cart_{}_{}", product.id, Utc::now().timestamp_millis());
            self.items.push(CartItem { id, product, quantity });
        }
    }

    /// Sets a line's quantity; zero removes the line. Returns whether the line existed.
    pub fn update_quantity(&mut self, id: &str, quantity: u32) -> bool {
        if quantity == 0 {
            return self.remove(id);
        }
        match self.items.iter_mut().find(|i| i.id == id) {
            Some(item) => { item.quantity = quantity; true }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.id != id);
        self.items.len() != before
    }

    pub fn clear(&mut self) { self.items.clear(); }

    pub fn total(&self) -> Decimal {
        self.items.iter().map(CartItem::line_total).fold(Decimal::ZERO, Decimal::saturating_add)
    }

    pub fn item_count(&self) -> u32 { self.items.iter().fold(0, |count, i| count.saturating_add(i.quantity)) }

    pub fn totals(&self) -> CartTotals {
        let subtotal = self.total();
        let shipping = if subtotal > FREE_SHIPPING_THRESHOLD { Decimal::ZERO } else { SHIPPING_FEE };
        let tax = subtotal.saturating_mul(TAX_RATE);
        CartTotals { subtotal, shipping, tax, total: subtotal.saturating_add(shipping).saturating_add(tax) }
    }

    /// Checkout body for this cart.
    pub fn to_checkout(&self, shipping: ContactDetails, payment: PaymentDetails) -> CheckoutRequest {
        let items = self.items.iter().map(|i| CheckoutItem {
            product: Some(ItemProductRef { id: i.product.id, price: Some(i.product.price) }),
            product_id: Some(i.product.id),
            quantity: i32::try_from(i.quantity).unwrap_or(i32::MAX),
            price: Some(i.product.price),
        }).collect();
        CheckoutRequest {
            items,
            shipping: Some(shipping),
            payment: Some(payment),
            totals: Some(self.totals().into()),
            ..Default::default()
        }
    }
}
