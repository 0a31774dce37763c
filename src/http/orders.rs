//! Checkout and order history.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{parse_id, ApiJson, ApiResponse};
use crate::auth::{Authenticated, RequireUser};
use crate::domain::{CheckoutRequest, NewOrder, Order, OrderError, OrderScope, OrderStatus};
use crate::error::{AppError, Result};
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderPlaced {
    pub success: bool,
    pub order_id: Uuid,
    pub message: String,
    pub data: Order,
}

/// Orders visible to the caller, newest first.
#[utoipa::path(
    get,
    path = "/api/orders",
    tag = "Orders",
    security(("bearerAuth" = []), ("cookieAuth" = [])),
    responses(
        (status = 200, description = "Orders with items", body = crate::http::response::OrderListResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_orders(State(state): State<AppState>, RequireUser(user): RequireUser) -> Result<ApiResponse<Vec<Order>>> {
    let orders = state.store.list_orders(OrderScope::for_user(&user)).await?;
    Ok(ApiResponse::ok(orders))
}

/// Place an order from the checkout body.
#[utoipa::path(
    post,
    path = "/api/orders",
    tag = "Orders",
    request_body = CheckoutRequest,
    security(("bearerAuth" = []), ("cookieAuth" = [])),
    responses(
        (status = 200, description = "Order placed", body = OrderPlaced),
        (status = 400, description = "Invalid order", body = crate::error::ErrorResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_order(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiJson(request): ApiJson<CheckoutRequest>,
) -> Result<Json<OrderPlaced>> {
    let order = NewOrder::from_checkout(request, &user).map_err(AppError::Validation)?;

    if let Some(items_total) = order.items_total().filter(|t| *t != order.total_amount) {
        warn!(
            user_id = %user.id,
            submitted = %order.total_amount,
            items = %items_total,
            "order total differs from line items"
        );
    }

    let order = state.store.insert_order(order).await?;
    info!(order_id = %order.id, user_id = %user.id, total = %order.total_amount, "order placed");

    Ok(Json(OrderPlaced {
        success: true,
        order_id: order.id,
        message: "Order placed successfully".to_string(),
        data: order,
    }))
}

/// One order; other users' orders read as absent.
#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    tag = "Orders",
    params(("id" = String, Path, description = "Order id")),
    security(("bearerAuth" = []), ("cookieAuth" = [])),
    responses(
        (status = 200, description = "The order", body = crate::http::response::OrderResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 404, description = "No such order", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_order(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<String>,
) -> Result<ApiResponse<Order>> {
    let id = parse_id(&id, "Order not found")?;
    let order = state
        .store
        .find_order(id, OrderScope::for_user(&user))
        .await?
        .ok_or(AppError::NotFound("Order not found"))?;
    Ok(ApiResponse::ok(order))
}

/// Cancel a pending or processing order.
#[utoipa::path(
    post,
    path = "/api/orders/{id}/cancel",
    tag = "Orders",
    params(("id" = String, Path, description = "Order id")),
    security(("bearerAuth" = []), ("cookieAuth" = []), ("apiKeyAuth" = [])),
    responses(
        (status = 200, description = "Order cancelled", body = crate::http::response::OrderResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 404, description = "No such order", body = crate::error::ErrorResponse),
        (status = 409, description = "Order can no longer be cancelled", body = crate::error::ErrorResponse)
    )
)]
pub async fn cancel_order(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    Path(id): Path<String>,
) -> Result<ApiResponse<Order>> {
    let id = parse_id(&id, "Order not found")?;
    let scope = principal.order_scope();
    let order = state.store.find_order(id, scope).await?.ok_or(AppError::NotFound("Order not found"))?;

    let target = order.status.cancel()?;
    let cancelled = match state.store.transition_order(id, &OrderStatus::CANCELLABLE, target).await? {
        Some(order) => order,
        None => {
            // Lost a race with another transition; report the status that won.
            let current = state.store.find_order(id, scope).await?.map_or(order.status, |o| o.status);
            return Err(OrderError::NotCancellable(current).into());
        }
    };

    info!(order_id = %id, from = %order.status, "order cancelled");
    Ok(ApiResponse::ok(cancelled).with_message("Order cancelled successfully"))
}
