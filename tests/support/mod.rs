#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use qalab_shop::domain::{NewOrder, NewProduct, NewUser, Order, Product, UserProfile, UserRole};
use qalab_shop::store::{MemoryStore, Store};
use qalab_shop::{http, AppState, Config};
use rust_decimal::Decimal;
use serde_json::Value;
use tempfile::TempDir;

pub const API_KEY: &str = "student-demo-key";

pub enum Auth<'a> {
    None,
    Bearer(&'a str),
    Cookie(&'a str),
    ApiKey(&'a str),
}

pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl Reply {
    pub fn code(&self) -> &str { self.body["error"]["code"].as_str().unwrap_or_default() }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub admin: UserProfile,
    pub user: UserProfile,
    pub other: UserProfile,
    pub products: Vec<Product>,
    pub uploads: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let uploads = tempfile::tempdir().unwrap();
        let config = Config { upload_dir: uploads.path().to_path_buf(), ..Config::default() };
        let state = AppState::new(config, store.clone());

        let admin = add_user(&store, "Admin User", "admin@qalab.hu", UserRole::Admin).await;
        let user = add_user(&store, "Test User", "user@qalab.hu", UserRole::User).await;
        let other = add_user(&store, "Other User", "other@qalab.hu", UserRole::User).await;

        let mut products = Vec::new();
        for (name, category, price, stock, rating) in [
            ("Rubber Duck Debugger Enterprise", "Hardware", 19999, 0, 4.5),
            ("Lorem Ipsum Generator Deluxe", "Software", 5999, 25, 4.1),
            ("Ctrl+Z Time Machine", "Hardware", 179999, 25, 3.7),
        ] {
            let product = store
                .insert_product(NewProduct {
                    name: name.into(),
                    description: format!("{name} for testers"),
                    price: Decimal::new(price, 2),
                    category: category.into(),
                    stock,
                    in_stock: stock > 0,
                    image: None,
                    rating,
                    review_count: 10,
                })
                .await
                .unwrap();
            products.push(product);
        }

        Self { router: http::router(state.clone()), state, store, admin, user, other, products, uploads }
    }

    pub fn token(&self, user: &UserProfile) -> String { self.state.auth.tokens.sign(user).unwrap() }

    pub async fn send(&self, method: Method, uri: &str, auth: Auth<'_>, body: Option<Value>) -> Reply {
        let mut builder = Request::builder().method(method).uri(uri);
        builder = match auth {
            Auth::None => builder,
            Auth::Bearer(token) => builder.header(header::AUTHORIZATION, format!("Bearer {token}")),
            Auth::Cookie(token) => builder.header(header::COOKIE, format!("auth-token={token}")),
            Auth::ApiKey(key) => builder.header("x-api-key", key),
        };
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.raw(request).await
    }

    pub async fn raw(&self, request: Request<Body>) -> Reply {
        use tower::ServiceExt;
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        Reply { status, headers, body }
    }

    /// Places a two-unit order of an in-stock product for `user` directly in the store.
    pub async fn place_order(&self, user: &UserProfile) -> Order {
        let product = &self.products[1];
        let request = serde_json::from_value(serde_json::json!({
            "items": [{"productId": product.id, "quantity": 2, "price": product.price}],
            "totals": {"total": product.price * Decimal::from(2)}
        }))
        .unwrap();
        let order = NewOrder::from_checkout(request, user).unwrap();
        self.store.insert_order(order).await.unwrap()
    }
}

async fn add_user(store: &MemoryStore, name: &str, email: &str, role: UserRole) -> UserProfile {
    store
        .insert_user(NewUser { name: name.into(), email: email.into(), password_hash: "not-a-hash".into(), role })
        .await
        .unwrap()
        .profile()
}
