//! OpenAPI document and the Swagger UI page that renders it.

use axum::extract::State;
use axum::response::Html;
use axum::Json;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::openapi::{OpenApi as OpenApiDoc, ServerBuilder};
use utoipa::{Modify, OpenApi};

use super::{account, admin, contact, orders, products, response, upload};
use crate::auth::AUTH_COOKIE;
use crate::domain::{
    CheckoutItem, CheckoutRequest, CheckoutTotals, ContactDetails, CreateProductRequest, CustomerInfo, FieldError,
    ItemProductRef, LoginRequest, Order, OrderItem, OrderStatus, OrderUser, PaymentDetails, PaymentStub, Product, ProductPatch,
    ProductSummary, RegisterRequest, ShippingSnapshot, UpdateProfileRequest, UserProfile, UserRole,
};
use crate::domain::value_objects::MaskedCardNumber;
use crate::error::{ErrorBody, ErrorResponse};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "QALab Shop API",
        description = "Demo storefront API for practicing browser and API test automation"
    ),
    paths(
        products::list_products,
        products::get_product,
        orders::list_orders,
        orders::create_order,
        orders::get_order,
        orders::cancel_order,
        account::register,
        account::login,
        account::logout,
        account::profile,
        account::update_profile,
        account::token,
        admin::list_products,
        admin::create_product,
        admin::update_product,
        admin::delete_product,
        upload::upload_image,
        contact::submit,
    ),
    components(schemas(
        Product, CreateProductRequest, ProductPatch,
        Order, OrderItem, OrderStatus, OrderUser, ProductSummary, CustomerInfo, ShippingSnapshot, PaymentStub,
        MaskedCardNumber, CheckoutRequest, CheckoutItem, ItemProductRef, CheckoutTotals, ContactDetails, PaymentDetails,
        UserProfile, UserRole, RegisterRequest, LoginRequest, UpdateProfileRequest,
        account::AccessToken, account::TokenUsage, orders::OrderPlaced, upload::UploadedImage, upload::ImageUpload,
        contact::ContactForm,
        response::ProductListResponse, response::ProductResponse, response::OrderListResponse,
        response::OrderResponse, response::AccessTokenResponse, response::MessageResponse, response::UserResponse,
        ErrorResponse, ErrorBody, FieldError,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "Products", description = "Catalog"),
        (name = "Orders", description = "Checkout and order history"),
        (name = "Auth", description = "Accounts and tokens"),
        (name = "Admin", description = "Product management"),
        (name = "Contact", description = "Contact form")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut OpenApiDoc) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearerAuth",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build()),
        );
        components.add_security_scheme("cookieAuth", SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(AUTH_COOKIE))));
        components.add_security_scheme("apiKeyAuth", SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-API-Key"))));
    }
}

/// The document with the configured server URL.
pub fn openapi(state: &AppState) -> OpenApiDoc {
    let mut doc = ApiDoc::openapi();
    let url = state
        .config
        .public_base_url
        .clone()
        .unwrap_or_else(|| format!("http://localhost:{}", state.config.port));
    doc.servers = Some(vec![ServerBuilder::new().url(url).description(Some("QALab Shop")).build()]);
    doc
}

pub async fn openapi_json(State(state): State<AppState>) -> Json<OpenApiDoc> {
    Json(openapi(&state))
}

const SWAGGER_UI: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <title>QALab Shop API</title>
  <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css" />
</head>
<body>
  <div id="swagger-ui"></div>
  <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js" crossorigin></script>
  <script>
    window.onload = () => {
      window.ui = SwaggerUIBundle({ url: "/api/swagger", dom_id: "#swagger-ui" });
    };
  </script>
</body>
</html>
"##;

pub async fn swagger_ui() -> Html<&'static str> {
    Html(SWAGGER_UI)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_routes_and_schemes() {
        let doc = ApiDoc::openapi();
        for path in ["/api/products", "/api/orders/{id}/cancel", "/api/admin/products/{id}", "/api/upload/image"] {
            assert!(doc.paths.paths.contains_key(path), "{path} missing");
        }
        let schemes = &doc.components.as_ref().unwrap().security_schemes;
        for name in ["bearerAuth", "cookieAuth", "apiKeyAuth"] {
            assert!(schemes.contains_key(name), "{name} missing");
        }
    }
}
