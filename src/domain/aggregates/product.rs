//! Product Aggregate

use std::borrow::Cow;
use std::fmt::Display;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::domain::value_objects::within_amount_range;

/// Upper bound the catalog UI sends when the price slider is untouched.
pub const PRICE_MAX_SENTINEL: f64 = 999_999.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub category: String,
    pub stock: i32,
    pub in_stock: bool,
    pub rating: f64,
    pub review_count: i32,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn create(new: NewProduct) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(), name: new.name, description: new.description, price: new.price,
            category: new.category, stock: new.stock, in_stock: new.in_stock, rating: new.rating,
            review_count: new.review_count, image: new.image, created_at: now, updated_at: now,
        }
    }

    pub fn apply(&mut self, patch: ProductPatch) {
        if let Some(name) = patch.name { self.name = name; }
        if let Some(description) = patch.description { self.description = description; }
        if let Some(price) = patch.price { self.price = price; }
        if let Some(category) = patch.category { self.category = category; }
        if let Some(stock) = patch.stock { self.stock = stock; }
        if let Some(in_stock) = patch.in_stock { self.in_stock = in_stock; }
        if let Some(image) = patch.image { self.image = image; }
        if let Some(rating) = patch.rating { self.rating = rating; }
        if let Some(review_count) = patch.review_count { self.review_count = review_count; }
        self.touch();
    }

    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

/// Validated product ready to insert.
#[derive(Clone, Debug, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub category: String,
    pub stock: i32,
    pub in_stock: bool,
    pub image: Option<String>,
    pub rating: f64,
    pub review_count: i32,
}

#[derive(Clone, Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    #[validate(required(message = "Name is required"), length(min = 1, message = "Name is required"))]
    pub name: Option<String>,
    #[validate(required(message = "Description is required"), length(min = 1, message = "Description is required"))]
    pub description: Option<String>,
    #[validate(required(message = "Price is required"), custom = "positive_price")]
    pub price: Option<Decimal>,
    #[validate(required(message = "Category is required"), length(min = 1, message = "Category is required"))]
    pub category: Option<String>,
    #[validate(required(message = "Stock is required"), range(min = 0, message = "Stock must be non-negative"))]
    pub stock: Option<i32>,
    pub in_stock: Option<bool>,
    pub image: Option<String>,
    #[validate(range(min = 0.0, max = 5.0, message = "Rating must be between 0 and 5"))]
    pub rating: Option<f64>,
    #[validate(range(min = 0, message = "Review count must be non-negative"))]
    pub review_count: Option<i32>,
}

impl CreateProductRequest {
    /// Converts a request that already passed `validate()`. `inStock`
    /// follows `stock > 0` unless the caller set it.
    pub fn into_new_product(self) -> Option<NewProduct> {
        let stock = self.stock?;
        Some(NewProduct {
            name: self.name?,
            description: self.description?,
            price: self.price?,
            category: self.category?,
            stock,
            in_stock: self.in_stock.unwrap_or(stock > 0),
            image: self.image,
            rating: self.rating.unwrap_or(0.0),
            review_count: self.review_count.unwrap_or(0),
        })
    }
}

/// Partial update; every field is optional. `image: Some(None)` clears the image.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: Option<String>,
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: Option<String>,
    #[validate(custom = "positive_price")]
    pub price: Option<Decimal>,
    #[validate(length(min = 1, message = "Category is required"))]
    pub category: Option<String>,
    #[validate(range(min = 0, message = "Stock must be non-negative"))]
    pub stock: Option<i32>,
    pub in_stock: Option<bool>,
    #[serde(default, deserialize_with = "present_or_null")]
    #[schema(value_type = Option<String>)]
    pub image: Option<Option<String>>,
    #[validate(range(min = 0.0, max = 5.0, message = "Rating must be between 0 and 5"))]
    pub rating: Option<f64>,
    #[validate(range(min = 0, message = "Review count must be non-negative"))]
    pub review_count: Option<i32>,
}

impl ProductPatch {
    /// Derives `inStock` from `stock` when only the stock changes.
    pub fn normalized(mut self) -> Self {
        if let (Some(stock), None) = (self.stock, self.in_stock) {
            self.in_stock = Some(stock > 0);
        }
        self
    }
}

fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn positive_price(price: &Decimal) -> Result<(), ValidationError> {
    let (code, message) = if !price.is_sign_positive() || price.is_zero() {
        ("positive", "Price must be positive")
    } else if !within_amount_range(*price) {
        ("range", "Price is too large")
    } else {
        return Ok(());
    };
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    Err(error)
}

/// Query values the catalog form sends blank (`inStock=`) mean "no filter".
fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    match Option::<String>::deserialize(deserializer)?.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// Catalog query. Unset or neutral values do not filter.
#[derive(Clone, Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ProductFilter {
    /// Case-insensitive substring of the name or description
    pub search: Option<String>,
    /// Exact category; `All` matches every category
    pub category: Option<String>,
    /// Only products flagged in stock when `true`
    #[serde(default, deserialize_with = "empty_as_none")]
    pub in_stock: Option<bool>,
    /// Minimum rating
    #[serde(default, deserialize_with = "empty_as_none")]
    pub min_rating: Option<f64>,
    /// Minimum price
    #[serde(default, deserialize_with = "empty_as_none")]
    pub price_min: Option<f64>,
    /// Maximum price
    #[serde(default, deserialize_with = "empty_as_none")]
    pub price_max: Option<f64>,
}

impl ProductFilter {
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
    pub fn category_term(&self) -> Option<&str> {
        self.category.as_deref().filter(|c| !c.is_empty() && *c != "All")
    }
    pub fn in_stock_only(&self) -> bool { self.in_stock.unwrap_or(false) }
    pub fn min_rating(&self) -> Option<f64> { self.min_rating.filter(|r| *r > 0.0) }
    pub fn price_min(&self) -> Option<f64> { self.price_min.filter(|p| *p > 0.0) }
    pub fn price_max(&self) -> Option<f64> { self.price_max.filter(|p| *p < PRICE_MAX_SENTINEL) }

    /// LIKE pattern for the search term with wildcards in the term escaped.
    pub fn search_pattern(&self) -> Option<String> {
        self.search_term().map(|term| {
            let escaped = term.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
            format!("%{escaped}%")
        })
    }

    pub fn matches(&self, product: &Product) -> bool {
        if let Some(term) = self.search_term() {
            let term = term.to_lowercase();
            if !product.name.to_lowercase().contains(&term) && !product.description.to_lowercase().contains(&term) {
                return false;
            }
        }
        if self.category_term().is_some_and(|c| c != product.category) { return false; }
        if self.in_stock_only() && !product.in_stock { return false; }
        if self.min_rating().is_some_and(|r| product.rating < r) { return false; }
        let price = product.price.to_f64().unwrap_or(f64::MAX);
        if self.price_min().is_some_and(|min| price < min) { return false; }
        if self.price_max().is_some_and(|max| price > max) { return false; }
        true
    }
}
