//! Domain layer: storefront records, the order lifecycle and the cart.

pub mod aggregates;
pub mod value_objects;

pub use aggregates::*;

use serde::Serialize;
use utoipa::ToSchema;

/// One failed rule on one input field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field: field.into(), message: message.into() }
    }
}
