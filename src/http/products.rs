//! Catalog endpoints.

use axum::extract::{rejection::QueryRejection, Path, Query, State};

use super::{parse_id, ApiResponse};
use crate::auth::Authenticated;
use crate::domain::{Product, ProductFilter};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// List products matching the filters, newest first.
#[utoipa::path(
    get,
    path = "/api/products",
    tag = "Products",
    params(ProductFilter),
    responses(
        (status = 200, description = "Matching products", body = crate::http::response::ProductListResponse),
        (status = 400, description = "Malformed query", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_products(
    State(state): State<AppState>,
    filter: std::result::Result<Query<ProductFilter>, QueryRejection>,
) -> Result<ApiResponse<Vec<Product>>> {
    let Query(filter) = filter.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let products = state.store.list_products(&filter).await?;
    Ok(ApiResponse::ok(products))
}

/// Product detail.
#[utoipa::path(
    get,
    path = "/api/products/{id}",
    tag = "Products",
    params(("id" = String, Path, description = "Product id")),
    security(("bearerAuth" = []), ("cookieAuth" = []), ("apiKeyAuth" = [])),
    responses(
        (status = 200, description = "The product", body = crate::http::response::ProductResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 404, description = "No such product", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_product(
    State(state): State<AppState>,
    Authenticated(_caller): Authenticated,
    Path(id): Path<String>,
) -> Result<ApiResponse<Product>> {
    let id = parse_id(&id, "Product not found")?;
    let product = state.store.find_product(id).await?.ok_or(AppError::NotFound("Product not found"))?;
    Ok(ApiResponse::ok(product))
}
