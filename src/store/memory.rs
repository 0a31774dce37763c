use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
use crate::domain::{
    NewOrder, NewProduct, NewUser, Order, OrderScope, OrderStatus, OrderUser, Product, ProductFilter, ProductPatch,
    ProductSummary, User,
};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    products: HashMap<Uuid, Product>,
    orders: HashMap<Uuid, Order>,
}

impl Tables {
    fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
        self.users.values().any(|u| u.email == email && Some(u.id) != except)
    }

    /// Copy of a stored order with owner and product projections filled in.
    fn hydrate(&self, order: &Order) -> Order {
        let mut order = order.clone();
        order.user = self.users.get(&order.user_id).map(|u| OrderUser { id: u.id, name: u.name.clone(), email: u.email.clone() });
        for item in &mut order.items {
            item.product = self.products.get(&item.product_id).map(|p| ProductSummary {
                id: p.id,
                name: p.name.clone(),
                price: p.price,
                image: p.image.clone(),
            });
        }
        order
    }
}

/// In-process store with the same semantics as the Postgres one.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    /// Overwrites an order's status without the transition guard.
    pub async fn force_status(&self, id: Uuid, status: OrderStatus) -> bool {
        let mut tables = self.tables.write().await;
        match tables.orders.get_mut(&id) {
            Some(order) => {
                order.status = status;
                true
            }
            None => false,
        }
    }
}

fn newest_first<T>(items: &mut [T], key: impl Fn(&T) -> (chrono::DateTime<Utc>, Uuid)) {
    items.sort_by(|a, b| key(b).cmp(&key(a)));
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.tables.read().await.users.values().find(|u| u.email == email).cloned())
    }

    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        if tables.email_taken(&user.email, None) {
            return Err(StoreError::Conflict("Email is already registered".to_string()));
        }
        let now = Utc::now();
        let stored = User {
            id: Uuid::now_v7(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update_user_profile(&self, id: Uuid, name: &str, email: &str) -> StoreResult<Option<User>> {
        let mut tables = self.tables.write().await;
        if tables.email_taken(email, Some(id)) {
            return Err(StoreError::Conflict("Email is already registered".to_string()));
        }
        Ok(tables.users.get_mut(&id).map(|user| {
            user.name = name.to_string();
            user.email = email.to_string();
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn list_products(&self, filter: &ProductFilter) -> StoreResult<Vec<Product>> {
        let tables = self.tables.read().await;
        let mut products: Vec<Product> = tables.products.values().filter(|p| filter.matches(p)).cloned().collect();
        newest_first(&mut products, |p| (p.created_at, p.id));
        Ok(products)
    }

    async fn find_product(&self, id: Uuid) -> StoreResult<Option<Product>> {
        Ok(self.tables.read().await.products.get(&id).cloned())
    }

    async fn insert_product(&self, product: NewProduct) -> StoreResult<Product> {
        let product = Product::create(product);
        self.tables.write().await.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn update_product(&self, id: Uuid, patch: ProductPatch) -> StoreResult<Option<Product>> {
        let mut tables = self.tables.write().await;
        Ok(tables.products.get_mut(&id).map(|product| {
            product.apply(patch);
            product.clone()
        }))
    }

    async fn delete_product(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.orders.values().any(|o| o.items.iter().any(|i| i.product_id == id)) {
            return Err(StoreError::Conflict("Product is referenced by existing orders".to_string()));
        }
        Ok(tables.products.remove(&id).is_some())
    }

    async fn insert_order(&self, order: NewOrder) -> StoreResult<Order> {
        let mut tables = self.tables.write().await;
        if let Some(missing) = order.items.iter().find(|i| !tables.products.contains_key(&i.product_id)) {
            return Err(StoreError::MissingReference(format!("Product not found: {}", missing.product_id)));
        }
        let order = order.into_order(Uuid::now_v7(), Utc::now());
        tables.orders.insert(order.id, order.clone());
        Ok(tables.hydrate(&order))
    }

    async fn list_orders(&self, scope: OrderScope) -> StoreResult<Vec<Order>> {
        let tables = self.tables.read().await;
        let mut orders: Vec<Order> = tables.orders.values().filter(|o| scope.permits(o)).map(|o| tables.hydrate(o)).collect();
        newest_first(&mut orders, |o| (o.created_at, o.id));
        Ok(orders)
    }

    async fn find_order(&self, id: Uuid, scope: OrderScope) -> StoreResult<Option<Order>> {
        let tables = self.tables.read().await;
        Ok(tables.orders.get(&id).filter(|o| scope.permits(o)).map(|o| tables.hydrate(o)))
    }

    async fn transition_order(&self, id: Uuid, from: &[OrderStatus], to: OrderStatus) -> StoreResult<Option<Order>> {
        let mut tables = self.tables.write().await;
        let Some(order) = tables.orders.get_mut(&id).filter(|o| from.contains(&o.status)) else {
            return Ok(None);
        };
        order.status = to;
        order.updated_at = Utc::now();
        let order = order.clone();
        Ok(Some(tables.hydrate(&order)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CustomerInfo, NewOrderItem, ShippingSnapshot, UserRole};
    use rust_decimal::Decimal;

    fn new_user(email: &str) -> NewUser {
        NewUser { name: "Test User".into(), email: email.into(), password_hash: "hash".into(), role: UserRole::User }
    }

    fn new_product(name: &str) -> NewProduct {
        NewProduct {
            name: name.into(), description: "demo".into(), price: Decimal::from(10), category: "Hardware".into(),
            stock: 3, in_stock: true, image: None, rating: 4.0, review_count: 1,
        }
    }

    fn new_order(user_id: Uuid, product_id: Uuid) -> NewOrder {
        NewOrder {
            user_id, status: OrderStatus::Pending, total_amount: Decimal::from(20),
            customer_info: CustomerInfo::default(), shipping: ShippingSnapshot::default(),
            items: vec![NewOrderItem { product_id, quantity: 2, price: Decimal::from(10) }],
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = MemoryStore::new();
        store.insert_user(new_user("a@qalab.hu")).await.unwrap();
        assert!(matches!(store.insert_user(new_user("a@qalab.hu")).await, Err(StoreError::Conflict(_))));
        let other = store.insert_user(new_user("b@qalab.hu")).await.unwrap();
        let renamed = store.update_user_profile(other.id, "Other", "a@qalab.hu").await;
        assert!(matches!(renamed, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_order_hydration_and_scope() {
        let store = MemoryStore::new();
        let user = store.insert_user(new_user("a@qalab.hu")).await.unwrap();
        let product = store.insert_product(new_product("Widget")).await.unwrap();
        let order = store.insert_order(new_order(user.id, product.id)).await.unwrap();

        assert_eq!(order.user.as_ref().map(|u| u.email.as_str()), Some("a@qalab.hu"));
        assert_eq!(order.items[0].product.as_ref().map(|p| p.name.as_str()), Some("Widget"));
        assert!(store.find_order(order.id, OrderScope::OwnedBy(Uuid::new_v4())).await.unwrap().is_none());
        assert_eq!(store.list_orders(OrderScope::OwnedBy(user.id)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_product_rejected() {
        let store = MemoryStore::new();
        let user = store.insert_user(new_user("a@qalab.hu")).await.unwrap();
        let result = store.insert_order(new_order(user.id, Uuid::new_v4())).await;
        assert!(matches!(result, Err(StoreError::MissingReference(_))));
        assert!(store.list_orders(OrderScope::All).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_transition_is_conditional() {
        let store = MemoryStore::new();
        let user = store.insert_user(new_user("a@qalab.hu")).await.unwrap();
        let product = store.insert_product(new_product("Widget")).await.unwrap();
        let order = store.insert_order(new_order(user.id, product.id)).await.unwrap();

        let cancelled = store.transition_order(order.id, &OrderStatus::CANCELLABLE, OrderStatus::Cancelled).await.unwrap();
        assert_eq!(cancelled.map(|o| o.status), Some(OrderStatus::Cancelled));
        assert!(store.transition_order(order.id, &OrderStatus::CANCELLABLE, OrderStatus::Cancelled).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_referenced_product_cannot_be_deleted() {
        let store = MemoryStore::new();
        let user = store.insert_user(new_user("a@qalab.hu")).await.unwrap();
        let product = store.insert_product(new_product("Widget")).await.unwrap();
        store.insert_order(new_order(user.id, product.id)).await.unwrap();
        assert!(matches!(store.delete_product(product.id).await, Err(StoreError::Conflict(_))));

        let spare = store.insert_product(new_product("Spare")).await.unwrap();
        assert!(store.delete_product(spare.id).await.unwrap());
        assert!(!store.delete_product(spare.id).await.unwrap());
    }
}
