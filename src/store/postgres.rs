use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
use crate::domain::{
    CustomerInfo, NewOrder, NewProduct, NewUser, Order, OrderItem, OrderScope, OrderStatus, OrderUser, Product,
    ProductFilter, ProductPatch, ProductSummary, ShippingSnapshot, User,
};

const USER_COLUMNS: &str = "id, name, email, password_hash, role, created_at, updated_at";
const ORDER_COLUMNS: &str = "id, user_id, status, total_amount, customer_info, shipping, created_at, updated_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self { Self { pool } }

    /// Attaches owners, items and product projections to order rows.
    async fn hydrate(&self, rows: Vec<OrderRow>) -> StoreResult<Vec<Order>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let order_ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let user_ids: Vec<Uuid> = rows.iter().map(|r| r.user_id).collect();

        let items = sqlx::query_as::<_, OrderItemRow>(
            "SELECT oi.id, oi.order_id, oi.product_id, oi.quantity, oi.price, \
                    p.name AS product_name, p.price AS product_price, p.image AS product_image \
             FROM order_items oi LEFT JOIN products p ON p.id = oi.product_id \
             WHERE oi.order_id = ANY($1) ORDER BY oi.order_id, oi.id",
        )
        .bind(&order_ids)
        .fetch_all(&self.pool)
        .await?;

        let users = sqlx::query_as::<_, OrderUser>("SELECT id, name, email FROM users WHERE id = ANY($1)")
            .bind(&user_ids)
            .fetch_all(&self.pool)
            .await?;
        let users: HashMap<Uuid, OrderUser> = users.into_iter().map(|u| (u.id, u)).collect();

        let mut by_order: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
        for row in items {
            by_order.entry(row.order_id).or_default().push(row.into_item());
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let items = by_order.remove(&row.id).unwrap_or_default();
                let user = users.get(&row.user_id).cloned();
                row.into_order(user, items)
            })
            .collect())
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    user_id: Uuid,
    status: OrderStatus,
    total_amount: Decimal,
    customer_info: Json<CustomerInfo>,
    shipping: Json<ShippingSnapshot>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, user: Option<OrderUser>, items: Vec<OrderItem>) -> Order {
        Order {
            id: self.id,
            user_id: self.user_id,
            status: self.status,
            total_amount: self.total_amount,
            customer_info: self.customer_info.0,
            shipping: self.shipping.0,
            created_at: self.created_at,
            updated_at: self.updated_at,
            user,
            items,
        }
    }
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    id: Uuid,
    order_id: Uuid,
    product_id: Uuid,
    quantity: i32,
    price: Decimal,
    product_name: Option<String>,
    product_price: Option<Decimal>,
    product_image: Option<String>,
}

impl OrderItemRow {
    fn into_item(self) -> OrderItem {
        let product = match (self.product_name, self.product_price) {
            (Some(name), Some(price)) => Some(ProductSummary { id: self.product_id, name, price, image: self.product_image }),
            _ => None,
        };
        OrderItem { id: self.id, order_id: self.order_id, product_id: self.product_id, quantity: self.quantity, price: self.price, product }
    }
}

fn unique_violation(err: sqlx::Error, message: &str) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Conflict(message.to_string()),
        _ => StoreError::Database(err),
    }
}

#[async_trait]
impl Store for PgStore {
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        Ok(sqlx::query_as::<_, User>(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        Ok(sqlx::query_as::<_, User>(&sql).bind(email).fetch_optional(&self.pool).await?)
    }

    #[instrument(skip(self, user), fields(email = %user.email))]
    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let sql = format!(
            "INSERT INTO users (id, name, email, password_hash, role, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, NOW(), NOW()) RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::now_v7())
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| unique_violation(e, "Email is already registered"))
    }

    async fn update_user_profile(&self, id: Uuid, name: &str, email: &str) -> StoreResult<Option<User>> {
        let sql = format!("UPDATE users SET name = $2, email = $3, updated_at = NOW() WHERE id = $1 RETURNING {USER_COLUMNS}");
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(name)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| unique_violation(e, "Email is already registered"))
    }

    async fn list_products(&self, filter: &ProductFilter) -> StoreResult<Vec<Product>> {
        Ok(sqlx::query_as::<_, Product>(
            "SELECT * FROM products \
             WHERE ($1::text IS NULL OR name ILIKE $1 OR description ILIKE $1) \
               AND ($2::text IS NULL OR category = $2) \
               AND (NOT $3 OR in_stock) \
               AND ($4::float8 IS NULL OR rating >= $4) \
               AND ($5::float8 IS NULL OR price::float8 >= $5) \
               AND ($6::float8 IS NULL OR price::float8 <= $6) \
             ORDER BY created_at DESC, id DESC",
        )
        .bind(filter.search_pattern())
        .bind(filter.category_term())
        .bind(filter.in_stock_only())
        .bind(filter.min_rating())
        .bind(filter.price_min())
        .bind(filter.price_max())
        .fetch_all(&self.pool)
        .await?)
    }

    async fn find_product(&self, id: Uuid) -> StoreResult<Option<Product>> {
        Ok(sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1").bind(id).fetch_optional(&self.pool).await?)
    }

    #[instrument(skip(self, product), fields(name = %product.name))]
    async fn insert_product(&self, product: NewProduct) -> StoreResult<Product> {
        Ok(sqlx::query_as::<_, Product>(
            "INSERT INTO products (id, name, description, price, category, stock, in_stock, rating, review_count, image, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, NOW(), NOW()) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(&product.category)
        .bind(product.stock)
        .bind(product.in_stock)
        .bind(product.rating)
        .bind(product.review_count)
        .bind(&product.image)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn update_product(&self, id: Uuid, patch: ProductPatch) -> StoreResult<Option<Product>> {
        let (image_set, image) = match patch.image {
            Some(image) => (true, image),
            None => (false, None),
        };
        Ok(sqlx::query_as::<_, Product>(
            "UPDATE products SET \
               name = COALESCE($2, name), description = COALESCE($3, description), price = COALESCE($4, price), \
               category = COALESCE($5, category), stock = COALESCE($6, stock), in_stock = COALESCE($7, in_stock), \
               rating = COALESCE($8, rating), review_count = COALESCE($9, review_count), \
               image = CASE WHEN $10 THEN $11 ELSE image END, updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(patch.name)
        .bind(patch.description)
        .bind(patch.price)
        .bind(patch.category)
        .bind(patch.stock)
        .bind(patch.in_stock)
        .bind(patch.rating)
        .bind(patch.review_count)
        .bind(image_set)
        .bind(image)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_product(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1").bind(id).execute(&self.pool).await;
        match result {
            Ok(done) => Ok(done.rows_affected() > 0),
            Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
                Err(StoreError::Conflict("Product is referenced by existing orders".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self, order), fields(user_id = %order.user_id, items = order.items.len()))]
    async fn insert_order(&self, order: NewOrder) -> StoreResult<Order> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "INSERT INTO orders (id, user_id, status, total_amount, customer_info, shipping, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW()) RETURNING {ORDER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(Uuid::now_v7())
            .bind(order.user_id)
            .bind(order.status)
            .bind(order.total_amount)
            .bind(Json(&order.customer_info))
            .bind(Json(&order.shipping))
            .fetch_one(&mut *tx)
            .await?;

        for item in &order.items {
            sqlx::query("INSERT INTO order_items (id, order_id, product_id, quantity, price) VALUES ($1, $2, $3, $4, $5)")
                .bind(Uuid::now_v7())
                .bind(row.id)
                .bind(item.product_id)
                .bind(item.quantity)
                .bind(item.price)
                .execute(&mut *tx)
                .await
                .map_err(|e| match &e {
                    sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                        StoreError::MissingReference(format!("Product not found: {}", item.product_id))
                    }
                    _ => StoreError::Database(e),
                })?;
        }

        tx.commit().await?;

        let mut orders = self.hydrate(vec![row]).await?;
        orders.pop().ok_or_else(|| StoreError::Database(sqlx::Error::RowNotFound))
    }

    async fn list_orders(&self, scope: OrderScope) -> StoreResult<Vec<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE ($1::uuid IS NULL OR user_id = $1) ORDER BY created_at DESC, id DESC");
        let rows = sqlx::query_as::<_, OrderRow>(&sql).bind(scope.owner()).fetch_all(&self.pool).await?;
        self.hydrate(rows).await
    }

    async fn find_order(&self, id: Uuid, scope: OrderScope) -> StoreResult<Option<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 AND ($2::uuid IS NULL OR user_id = $2)");
        let rows: Vec<OrderRow> = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(id)
            .bind(scope.owner())
            .fetch_optional(&self.pool)
            .await?
            .into_iter()
            .collect();
        Ok(self.hydrate(rows).await?.pop())
    }

    #[instrument(skip(self, from))]
    async fn transition_order(&self, id: Uuid, from: &[OrderStatus], to: OrderStatus) -> StoreResult<Option<Order>> {
        let allowed: Vec<String> = from.iter().map(|s| s.as_str().to_string()).collect();
        let sql = format!(
            "UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1 AND status::text = ANY($3) RETURNING {ORDER_COLUMNS}"
        );
        let rows: Vec<OrderRow> = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(id)
            .bind(to)
            .bind(&allowed)
            .fetch_optional(&self.pool)
            .await?
            .into_iter()
            .collect();
        Ok(self.hydrate(rows).await?.pop())
    }
}
