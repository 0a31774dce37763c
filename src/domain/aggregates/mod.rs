//! Aggregates module
pub mod cart;
pub mod order;
pub mod product;
pub mod user;

pub use cart::{Cart, CartItem, CartTotals};
pub use order::{
    CheckoutItem, CheckoutRequest, CheckoutTotals, ContactDetails, CustomerInfo, ItemProductRef, NewOrder, NewOrderItem, Order,
    OrderError, OrderItem, OrderScope, OrderStatus, OrderUser, PaymentDetails, PaymentStub, ProductSummary,
    ShippingSnapshot,
};
pub use product::{CreateProductRequest, NewProduct, Product, ProductFilter, ProductPatch};
pub use user::{LoginRequest, NewUser, RegisterRequest, UpdateProfileRequest, User, UserProfile, UserRole};
