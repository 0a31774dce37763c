//! Cart persistence.
//!
//! The cart lives on the client; these stores keep its JSON array under the
//! `qalab-cart` key. Last write wins.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;
use tracing::warn;

use crate::domain::Cart;

pub const CART_STORAGE_KEY: &str = "qalab-cart";

#[derive(Debug, Error)]
pub enum CartStorageError {
    #[error("cart storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("cart could not be serialized: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("cart storage lock poisoned")]
    Poisoned,
}

pub trait CartStorage {
    /// Stored cart, or an empty cart when nothing (or nothing readable) is stored.
    fn load(&self) -> Result<Cart, CartStorageError>;
    fn save(&self, cart: &Cart) -> Result<(), CartStorageError>;
}

fn decode(raw: &str) -> Cart {
    serde_json::from_str(raw).unwrap_or_else(|e| {
        warn!(error = %e, key = CART_STORAGE_KEY, "discarding malformed stored cart");
        Cart::default()
    })
}

/// Stores the cart as `<dir>/qalab-cart.json`.
#[derive(Debug, Clone)]
pub struct FileCartStorage {
    path: PathBuf,
}

impl FileCartStorage {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self { path: dir.as_ref().join(format!("{CART_STORAGE_KEY}.json")) }
    }

    pub fn path(&self) -> &Path { &self.path }
}

impl CartStorage for FileCartStorage {
    fn load(&self) -> Result<Cart, CartStorageError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => Ok(decode(&raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Cart::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, cart: &Cart) -> Result<(), CartStorageError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_vec(cart)?)?;
        Ok(())
    }
}

/// Key-value storage in memory, shaped like browser local storage.
#[derive(Debug, Default)]
pub struct MemoryCartStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCartStorage {
    pub fn new() -> Self { Self::default() }

    /// Stores a raw value under the cart key.
    pub fn put_raw(&self, raw: impl Into<String>) -> Result<(), CartStorageError> {
        let mut entries = self.entries.lock().map_err(|_| CartStorageError::Poisoned)?;
        entries.insert(CART_STORAGE_KEY.to_string(), raw.into());
        Ok(())
    }
}

impl CartStorage for MemoryCartStorage {
    fn load(&self) -> Result<Cart, CartStorageError> {
        let entries = self.entries.lock().map_err(|_| CartStorageError::Poisoned)?;
        Ok(entries.get(CART_STORAGE_KEY).map(|raw| decode(raw)).unwrap_or_default())
    }

    fn save(&self, cart: &Cart) -> Result<(), CartStorageError> {
        self.put_raw(serde_json::to_string(cart)?)
    }
}
