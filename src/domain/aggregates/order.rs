//! Order Aggregate

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::aggregates::user::UserProfile;
use crate::domain::value_objects::{within_amount_range, MaskedCardNumber, Quantity};
use crate::domain::FieldError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "order_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Source states the cancel operation accepts.
    pub const CANCELLABLE: [OrderStatus; 2] = [OrderStatus::Pending, OrderStatus::Processing];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Processing => "PROCESSING",
            Self::Shipped => "SHIPPED",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED",
        }
    }

    pub fn can_cancel(&self) -> bool { Self::CANCELLABLE.contains(self) }

    /// Target state of a cancellation from this state.
    pub fn cancel(self) -> Result<OrderStatus, OrderError> {
        if !self.can_cancel() {
            return Err(OrderError::NotCancellable(self));
        }
        Ok(Self::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for OrderStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "PROCESSING" => Ok(Self::Processing),
            "SHIPPED" => Ok(Self::Shipped),
            "DELIVERED" => Ok(Self::Delivered),
            "CANCELLED" => Ok(Self::Cancelled),
            _ => Err(OrderError::UnknownStatus(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    #[error("Cannot cancel order with status: {0}. Only pending and processing orders can be cancelled.")]
    NotCancellable(OrderStatus),
    #[error("Unknown order status: {0}")]
    UnknownStatus(String),
}

/// Contact snapshot captured at checkout.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomerInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub zip_code: String,
    pub country: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentStub {
    pub card_holder: String,
    pub card_number: MaskedCardNumber,
    pub expiry_date: String,
}

/// Shipping fields as submitted plus the masked payment stub.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ShippingSnapshot {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub zip_code: String,
    pub country: String,
    pub payment: PaymentStub,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct OrderUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductSummary {
    pub id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub image: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    /// Unit price at order time.
    pub price: Decimal,
    pub product: Option<ProductSummary>,
}

/// Order with its owner and line items, as returned by the API.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub customer_info: CustomerInfo,
    pub shipping: ShippingSnapshot,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user: Option<OrderUser>,
    pub items: Vec<OrderItem>,
}

/// Which orders a caller may see.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrderScope {
    All,
    OwnedBy(Uuid),
}

impl OrderScope {
    pub fn for_user(user: &UserProfile) -> Self {
        if user.is_admin() { Self::All } else { Self::OwnedBy(user.id) }
    }
    pub fn owner(&self) -> Option<Uuid> {
        match self { Self::All => None, Self::OwnedBy(id) => Some(*id) }
    }
    pub fn permits(&self, order: &Order) -> bool {
        self.owner().map_or(true, |owner| owner == order.user_id)
    }
}

// ---------------------------------------------------------------------------
// Checkout input
// ---------------------------------------------------------------------------

/// Body of `POST /api/orders` in the checkout page's shape. Every field is
/// optional on the wire; `NewOrder::from_checkout` decides what is required.
#[derive(Clone, Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckoutRequest {
    pub items: Vec<CheckoutItem>,
    pub shipping: Option<ContactDetails>,
    pub customer_info: Option<ContactDetails>,
    pub payment: Option<PaymentDetails>,
    pub totals: Option<CheckoutTotals>,
    pub total_amount: Option<Decimal>,
    pub status: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactDetails {
    pub full_name: Option<String>,
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    #[serde(alias = "postalCode")]
    pub zip_code: Option<String>,
    pub country: Option<String>,
}

impl ContactDetails {
    fn display_name(&self) -> Option<String> {
        let non_empty = |v: &Option<String>| v.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string);
        non_empty(&self.full_name).or_else(|| non_empty(&self.name)).or_else(|| {
            let joined = [non_empty(&self.first_name), non_empty(&self.last_name)].into_iter().flatten().collect::<Vec<_>>().join(" ");
            (!joined.is_empty()).then_some(joined)
        })
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentDetails {
    pub card_holder: Option<String>,
    pub card_number: Option<String>,
    pub expiry_date: Option<String>,
    /// Accepted for form compatibility, never stored.
    #[serde(skip_serializing)]
    pub cvv: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, ToSchema)]
#[serde(default)]
pub struct CheckoutTotals {
    pub subtotal: Option<Decimal>,
    pub shipping: Option<Decimal>,
    pub tax: Option<Decimal>,
    pub total: Option<Decimal>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckoutItem {
    /// Product snapshot as held by the cart.
    pub product: Option<ItemProductRef>,
    pub product_id: Option<Uuid>,
    pub quantity: i32,
    pub price: Option<Decimal>,
}

#[derive(Clone, Debug, Deserialize, Serialize, ToSchema)]
pub struct ItemProductRef {
    pub id: Uuid,
    pub price: Option<Decimal>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewOrderItem {
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: Decimal,
}

/// Checked order ready to persist together with its items.
#[derive(Clone, Debug, PartialEq)]
pub struct NewOrder {
    pub user_id: Uuid,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub customer_info: CustomerInfo,
    pub shipping: ShippingSnapshot,
    pub items: Vec<NewOrderItem>,
}

impl NewOrder {
    /// Builds the order for `user` from a checkout body.
    ///
    /// The total is taken from the client (`totals.total`, then
    /// `totalAmount`, else zero); it is not recomputed from the items.
    pub fn from_checkout(request: CheckoutRequest, user: &UserProfile) -> Result<Self, Vec<FieldError>> {
        let mut errors = Vec::new();

        let status = match request.status.as_deref() {
            None => OrderStatus::Pending,
            Some(raw) => raw.parse().unwrap_or_else(|e: OrderError| {
                errors.push(FieldError::new("status", e.to_string()));
                OrderStatus::Pending
            }),
        };

        let mut items = Vec::with_capacity(request.items.len());
        for (index, item) in request.items.iter().enumerate() {
            let product_id = item.product.as_ref().map(|p| p.id).or(item.product_id);
            let price = item.product.as_ref().and_then(|p| p.price).or(item.price);
            let quantity = Quantity::new(item.quantity);
            let price_problem = match price {
                None => Some("Price is required"),
                Some(p) if p.is_sign_negative() => Some("Price must be non-negative"),
                Some(p) if !within_amount_range(p) => Some("Price is too large"),
                Some(_) => None,
            };
            match (product_id, price, quantity, price_problem) {
                (Some(product_id), Some(price), Some(quantity), None) => {
                    items.push(NewOrderItem { product_id, quantity: quantity.value(), price });
                }
                _ => {
                    if product_id.is_none() { errors.push(FieldError::new(format!("items[{index}].productId"), "Product id is required")); }
                    if let Some(message) = price_problem { errors.push(FieldError::new(format!("items[{index}].price"), message)); }
                    if quantity.is_none() {
                        errors.push(FieldError::new(
                            format!("items[{index}].quantity"),
                            format!("Quantity must be between 1 and {}", Quantity::MAX),
                        ));
                    }
                }
            }
        }

        let total_amount = request.totals.as_ref().and_then(|t| t.total).or(request.total_amount).unwrap_or(Decimal::ZERO);
        if !within_amount_range(total_amount) {
            errors.push(FieldError::new("totalAmount", "Total is too large"));
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        let contact = request.shipping.clone().or(request.customer_info.clone()).unwrap_or_default();
        let field = |v: &Option<String>| v.clone().unwrap_or_default();

        let customer_info = CustomerInfo {
            name: contact.display_name().unwrap_or_else(|| user.name.clone()),
            email: contact.email.clone().filter(|e| !e.trim().is_empty()).unwrap_or_else(|| user.email.clone()),
            phone: field(&contact.phone),
            address: field(&contact.address),
            city: field(&contact.city),
            zip_code: field(&contact.zip_code),
            country: field(&contact.country),
        };

        let shipping_in = request.shipping.unwrap_or_default();
        let payment_in = request.payment.unwrap_or_default();
        let shipping = ShippingSnapshot {
            first_name: field(&shipping_in.first_name),
            last_name: field(&shipping_in.last_name),
            email: field(&shipping_in.email),
            phone: field(&shipping_in.phone),
            address: field(&shipping_in.address),
            city: field(&shipping_in.city),
            zip_code: field(&shipping_in.zip_code),
            country: field(&shipping_in.country),
            payment: PaymentStub {
                card_holder: field(&payment_in.card_holder),
                card_number: MaskedCardNumber::mask(payment_in.card_number.as_deref().unwrap_or_default()),
                expiry_date: field(&payment_in.expiry_date),
            },
        };

        Ok(Self { user_id: user.id, status, total_amount, customer_info, shipping, items })
    }

    /// Sum of the line items, `None` when it does not fit a `Decimal`.
    pub fn items_total(&self) -> Option<Decimal> {
        self.items
            .iter()
            .try_fold(Decimal::ZERO, |sum, i| i.price.checked_mul(Decimal::from(i.quantity)).and_then(|line| sum.checked_add(line)))
    }

    /// Materializes the order with fresh ids, as the in-memory store does.
    pub fn into_order(self, id: Uuid, now: DateTime<Utc>) -> Order {
        let items = self.items.into_iter().map(|i| OrderItem {
            id: Uuid::new_v4(), order_id: id, product_id: i.product_id, quantity: i.quantity, price: i.price, product: None,
        }).collect();
        Order {
            id, user_id: self.user_id, status: self.status, total_amount: self.total_amount,
            customer_info: self.customer_info, shipping: self.shipping, created_at: now, updated_at: now,
            user: None, items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::user::UserRole;

    fn customer() -> UserProfile {
        let now = Utc::now();
        UserProfile { id: Uuid::new_v4(), name: "Test User".into(), email: "user@qalab.hu".into(), role: UserRole::User, created_at: now, updated_at: now }
    }

    #[test]
    fn test_cancel_guard() {
        assert_eq!(OrderStatus::Pending.cancel(), Ok(OrderStatus::Cancelled));
        assert_eq!(OrderStatus::Processing.cancel(), Ok(OrderStatus::Cancelled));
        for status in [OrderStatus::Shipped, OrderStatus::Delivered, OrderStatus::Cancelled] {
            assert_eq!(status.cancel(), Err(OrderError::NotCancellable(status)));
        }
    }

    #[test]
    fn test_not_cancellable_message_names_status() {
        let message = OrderStatus::Shipped.cancel().unwrap_err().to_string();
        assert!(message.contains("SHIPPED"));
    }

    #[test]
    fn test_status_parse_and_wire_format() {
        assert_eq!("processing".parse::<OrderStatus>(), Ok(OrderStatus::Processing));
        assert!("confirmed".parse::<OrderStatus>().is_err());
        assert_eq!(serde_json::to_value(OrderStatus::Cancelled).unwrap(), "CANCELLED");
    }

    #[test]
    fn test_from_checkout_example() {
        let product_id = Uuid::new_v4();
        let request: CheckoutRequest = serde_json::from_value(serde_json::json!({
            "items": [{"productId": product_id, "quantity": 2, "price": 10}],
            "totals": {"total": 20}
        })).unwrap();
        let order = NewOrder::from_checkout(request, &customer()).unwrap();
        assert_eq!(order.total_amount, Decimal::from(20));
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.items, vec![NewOrderItem { product_id, quantity: 2, price: Decimal::from(10) }]);
        assert_eq!(order.customer_info.name, "Test User");
        assert_eq!(order.customer_info.email, "user@qalab.hu");
    }

    #[test]
    fn test_from_checkout_uses_cart_shape_and_masks_card() {
        let product_id = Uuid::new_v4();
        let request: CheckoutRequest = serde_json::from_value(serde_json::json!({
            "items": [{"id": "cart_x_1", "quantity": 1, "product": {"id": product_id, "name": "Duck", "price": 199.99}}],
            "shipping": {"firstName": "Ada", "lastName": "Lovelace", "email": "ada@example.com", "postalCode": "1234", "city": "Budapest"},
            "payment": {"cardHolder": "Ada", "cardNumber": "4111 1111 1111 1111", "cvv": "123"},
            "totalAmount": 209.98
        })).unwrap();
        let order = NewOrder::from_checkout(request, &customer()).unwrap();
        assert_eq!(order.items[0].price, Decimal::new(19999, 2));
        assert_eq!(order.customer_info.name, "Ada Lovelace");
        assert_eq!(order.customer_info.zip_code, "1234");
        assert_eq!(order.shipping.payment.card_number.as_str(), "**** **** **** 1111");
        assert!(!serde_json::to_string(&order.shipping).unwrap().contains("cvv"));
        assert_eq!(order.total_amount, Decimal::new(20998, 2));
    }

    #[test]
    fn test_from_checkout_reports_item_fields() {
        let request: CheckoutRequest = serde_json::from_value(serde_json::json!({
            "items": [{"quantity": 0}],
            "status": "confirmed"
        })).unwrap();
        let errors = NewOrder::from_checkout(request, &customer()).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["status", "items[0].productId", "items[0].price", "items[0].quantity"]);
    }

    #[test]
    fn test_total_is_not_recomputed() {
        let request: CheckoutRequest = serde_json::from_value(serde_json::json!({
            "items": [{"productId": Uuid::new_v4(), "quantity": 3, "price": 10}],
            "totals": {"total": 1}
        })).unwrap();
        let order = NewOrder::from_checkout(request, &customer()).unwrap();
        assert_eq!(order.total_amount, Decimal::ONE);
        assert_eq!(order.items_total(), Some(Decimal::from(30)));
    }

    #[test]
    fn test_from_checkout_bounds_amounts() {
        let request: CheckoutRequest = serde_json::from_value(serde_json::json!({
            "items": [{"productId": Uuid::new_v4(), "quantity": 1000, "price": 1e26}],
            "totals": {"total": 1e20}
        })).unwrap();
        let errors = NewOrder::from_checkout(request, &customer()).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["items[0].price", "totalAmount"]);

        let request: CheckoutRequest = serde_json::from_value(serde_json::json!({
            "items": [{"productId": Uuid::new_v4(), "quantity": i32::MAX, "price": 1}]
        })).unwrap();
        let errors = NewOrder::from_checkout(request, &customer()).unwrap_err();
        assert_eq!(errors[0].field, "items[0].quantity");
    }

    #[test]
    fn test_scope() {
        let user = customer();
        let order = NewOrder::from_checkout(CheckoutRequest::default(), &user).unwrap().into_order(Uuid::new_v4(), Utc::now());
        assert!(OrderScope::for_user(&user).permits(&order));
        assert!(!OrderScope::OwnedBy(Uuid::new_v4()).permits(&order));
        assert!(OrderScope::All.permits(&order));
    }
}
