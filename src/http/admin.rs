//! Product management for administrators.

use axum::extract::{Path, State};
use tracing::info;

use super::{parse_id, ApiResponse, MessageResponse, ValidJson};
use crate::auth::AdminUser;
use crate::domain::{CreateProductRequest, Product, ProductFilter, ProductPatch};
use crate::error::{AppError, Result};
use crate::state::AppState;

const NOT_FOUND: &str = "Product not found";

#[utoipa::path(
    get,
    path = "/api/admin/products",
    tag = "Admin",
    security(("bearerAuth" = []), ("cookieAuth" = [])),
    responses(
        (status = 200, description = "Full catalog", body = crate::http::response::ProductListResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 403, description = "Not an administrator", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_products(State(state): State<AppState>, AdminUser(_admin): AdminUser) -> Result<ApiResponse<Vec<Product>>> {
    let products = state.store.list_products(&ProductFilter::default()).await?;
    Ok(ApiResponse::ok(products))
}

#[utoipa::path(
    post,
    path = "/api/admin/products",
    tag = "Admin",
    request_body = CreateProductRequest,
    security(("bearerAuth" = []), ("cookieAuth" = [])),
    responses(
        (status = 200, description = "Product created", body = crate::http::response::ProductResponse),
        (status = 400, description = "Validation failed", body = crate::error::ErrorResponse),
        (status = 403, description = "Not an administrator", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_product(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ValidJson(request): ValidJson<CreateProductRequest>,
) -> Result<ApiResponse<Product>> {
    let new = request
        .into_new_product()
        .ok_or_else(|| AppError::BadRequest("Incomplete product".to_string()))?;
    let product = state.store.insert_product(new).await?;
    info!(product_id = %product.id, admin = %admin.email, "product created");
    Ok(ApiResponse::ok(product).with_message("Product created successfully"))
}

#[utoipa::path(
    put,
    path = "/api/admin/products/{id}",
    tag = "Admin",
    params(("id" = String, Path, description = "Product id")),
    request_body = ProductPatch,
    security(("bearerAuth" = []), ("cookieAuth" = [])),
    responses(
        (status = 200, description = "Product updated", body = crate::http::response::ProductResponse),
        (status = 400, description = "Validation failed", body = crate::error::ErrorResponse),
        (status = 403, description = "Not an administrator", body = crate::error::ErrorResponse),
        (status = 404, description = "No such product", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_product(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    ValidJson(patch): ValidJson<ProductPatch>,
) -> Result<ApiResponse<Product>> {
    let id = parse_id(&id, NOT_FOUND)?;
    let product = state
        .store
        .update_product(id, patch.normalized())
        .await?
        .ok_or(AppError::NotFound(NOT_FOUND))?;
    info!(product_id = %id, admin = %admin.email, "product updated");
    Ok(ApiResponse::ok(product).with_message("Product updated successfully"))
}

#[utoipa::path(
    delete,
    path = "/api/admin/products/{id}",
    tag = "Admin",
    params(("id" = String, Path, description = "Product id")),
    security(("bearerAuth" = []), ("cookieAuth" = [])),
    responses(
        (status = 200, description = "Product deleted", body = MessageResponse),
        (status = 403, description = "Not an administrator", body = crate::error::ErrorResponse),
        (status = 404, description = "No such product", body = crate::error::ErrorResponse),
        (status = 409, description = "Product is referenced by orders", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_product(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> Result<MessageResponse> {
    let id = parse_id(&id, NOT_FOUND)?;
    if !state.store.delete_product(id).await? {
        return Err(AppError::NotFound(NOT_FOUND));
    }
    info!(product_id = %id, admin = %admin.email, "product deleted");
    Ok(MessageResponse::new("Product deleted successfully"))
}
