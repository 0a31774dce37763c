//! QALab Shop
//!
//! Demo storefront and admin API used as a target for browser and API
//! test automation practice.
//!
//! ## Features
//! - Product catalog with filtering
//! - Client-side cart state with derived totals
//! - Checkout and order history
//! - Cookie/bearer token authentication with a legacy API key fallback
//! - Admin product management and image upload
//! - Generated OpenAPI document

pub mod auth;
pub mod cart_storage;
pub mod config;
pub mod domain;
pub mod error;
pub mod http;
pub mod seed;
pub mod state;
pub mod store;

pub use config::Config;
pub use error::{AppError, Result};
pub use state::AppState;
