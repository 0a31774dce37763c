use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{Order, Product, UserProfile};
use crate::http::account::AccessToken;

/// Success envelope: `{success: true, message?, data}`.
#[derive(Debug, Serialize, ToSchema)]
#[aliases(
    ProductListResponse = ApiResponse<Vec<Product>>,
    ProductResponse = ApiResponse<Product>,
    OrderListResponse = ApiResponse<Vec<Order>>,
    OrderResponse = ApiResponse<Order>,
    AccessTokenResponse = ApiResponse<AccessToken>
)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self { success: true, message: None, data }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response { Json(self).into_response() }
}

/// `{success: true, message}` with no payload.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { success: true, message: message.into() }
    }
}

impl IntoResponse for MessageResponse {
    fn into_response(self) -> Response { Json(self).into_response() }
}

/// Account endpoints answer with the user at the top level.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub user: UserProfile,
}

impl UserResponse {
    pub fn new(user: UserProfile) -> Self {
        Self { success: true, message: None, user }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl IntoResponse for UserResponse {
    fn into_response(self) -> Response { Json(self).into_response() }
}
