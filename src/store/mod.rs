//! Persistence seam.
//!
//! [`PgStore`] is the production backend. [`MemoryStore`] implements the same
//! trait in process for tests and for running without a database.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{NewOrder, NewProduct, NewUser, Order, OrderScope, OrderStatus, Product, ProductFilter, ProductPatch, User};

#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness or reference rule blocks the write.
    #[error("{0}")]
    Conflict(String),
    /// The write names a row that does not exist.
    #[error("{0}")]
    MissingReference(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait Store: Send + Sync {
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    /// Fails with `Conflict` when the email is taken.
    async fn insert_user(&self, user: NewUser) -> StoreResult<User>;
    async fn update_user_profile(&self, id: Uuid, name: &str, email: &str) -> StoreResult<Option<User>>;

    /// Matching products, newest first.
    async fn list_products(&self, filter: &ProductFilter) -> StoreResult<Vec<Product>>;
    async fn find_product(&self, id: Uuid) -> StoreResult<Option<Product>>;
    async fn insert_product(&self, product: NewProduct) -> StoreResult<Product>;
    async fn update_product(&self, id: Uuid, patch: ProductPatch) -> StoreResult<Option<Product>>;
    /// False when the product does not exist; `Conflict` when orders reference it.
    async fn delete_product(&self, id: Uuid) -> StoreResult<bool>;

    /// Writes the order and its items atomically.
    async fn insert_order(&self, order: NewOrder) -> StoreResult<Order>;
    /// Visible orders with owner and items, newest first.
    async fn list_orders(&self, scope: OrderScope) -> StoreResult<Vec<Order>>;
    async fn find_order(&self, id: Uuid, scope: OrderScope) -> StoreResult<Option<Order>>;
    /// Sets `to` only if the current status is in `from`. `None` when no row matched.
    async fn transition_order(&self, id: Uuid, from: &[OrderStatus], to: OrderStatus) -> StoreResult<Option<Order>>;
}
