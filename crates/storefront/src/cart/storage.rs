//! Durable cart persistence.
//!
//! The cart survives restarts through a single JSON document under a fixed
//! namespace, mirroring the `restaurantCart` key the web client kept in
//! local storage. Reads tolerate missing or corrupt data; writes are fire
//! and forget from the store's point of view.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use crave_dine_core::ItemId;

use super::CartLine;

/// Fixed namespace for the persisted cart.
pub const CART_NAMESPACE: &str = "restaurantCart";

/// Errors from the persistence layer.
///
/// Callers swallow these (logging at most); storage faults must never block
/// cart operations from completing in memory.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A cart line as persisted, possibly by an older schema.
///
/// Early versions wrote only `name`; later versions wrote both `name` and
/// `dishName`. Both fields are optional here so either vintage loads; the
/// store normalizes them back into a full [`CartLine`].
#[derive(Debug, Clone, Deserialize)]
pub struct StoredLine {
    pub id: ItemId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "dishName")]
    pub dish_name: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub quantity: u32,
}

/// Durable storage for cart lines.
pub trait CartStorage: Send + Sync {
    /// Read the persisted lines. A missing document is an empty cart, not
    /// an error.
    fn load(&self) -> Result<Vec<StoredLine>, StorageError>;

    /// Replace the persisted document with the given lines.
    fn save(&self, lines: &[CartLine]) -> Result<(), StorageError>;
}

/// File-backed cart storage: one JSON file named after the namespace.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Storage rooted at the given directory.
    #[must_use]
    pub fn new(dir: &Path) -> Self {
        Self {
            path: dir.join(format!("{CART_NAMESPACE}.json")),
        }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CartStorage for JsonFileStore {
    fn load(&self) -> Result<Vec<StoredLine>, StorageError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&raw)?)
    }

    fn save(&self, lines: &[CartLine]) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string(lines)?;
        // Write to a sibling and rename over the live document; a crash
        // mid-write must not corrupt the persisted cart.
        let staging = self.path.with_extension("json.tmp");
        std::fs::write(&staging, raw)?;
        std::fs::rename(&staging, &self.path)?;
        Ok(())
    }
}

/// In-memory cart storage for tests and ephemeral sessions.
///
/// Can be switched into a failing mode to exercise the swallow-and-continue
/// contract of the store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    lines: std::sync::Mutex<Vec<CartLine>>,
    failing: std::sync::atomic::AtomicBool,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent load/save return an I/O error.
    pub fn set_failing(&self, failing: bool) {
        self.failing
            .store(failing, std::sync::atomic::Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StorageError> {
        if self.failing.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(StorageError::Io(std::io::Error::other(
                "simulated storage failure",
            )));
        }
        Ok(())
    }

    /// Lines currently persisted, for assertions.
    #[must_use]
    pub fn persisted(&self) -> Vec<CartLine> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }
}

impl CartStorage for MemoryStore {
    fn load(&self) -> Result<Vec<StoredLine>, StorageError> {
        self.check()?;
        let lines = self.lines.lock().map(|l| l.clone()).unwrap_or_default();
        Ok(lines
            .into_iter()
            .map(|line| StoredLine {
                id: line.id,
                name: Some(line.name),
                dish_name: Some(line.dish_name),
                price: Some(line.price),
                quantity: line.quantity,
            })
            .collect())
    }

    fn save(&self, lines: &[CartLine]) -> Result<(), StorageError> {
        self.check()?;
        if let Ok(mut persisted) = self.lines.lock() {
            *persisted = lines.to_vec();
        }
        Ok(())
    }
}

impl<S: CartStorage + ?Sized> CartStorage for std::sync::Arc<S> {
    fn load(&self) -> Result<Vec<StoredLine>, StorageError> {
        (**self).load()
    }

    fn save(&self, lines: &[CartLine]) -> Result<(), StorageError> {
        (**self).save(lines)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("crave-cart-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn line(id: &str, price: i64, quantity: u32) -> CartLine {
        CartLine {
            id: ItemId::new(id),
            name: format!("dish-{id}"),
            dish_name: format!("dish-{id}"),
            price: Decimal::new(price, 0),
            quantity,
        }
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let store = JsonFileStore::new(&temp_dir());
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let store = JsonFileStore::new(&temp_dir());
        store.save(&[line("x1", 60, 2)]).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, ItemId::new("x1"));
        assert_eq!(loaded[0].quantity, 2);
        assert_eq!(loaded[0].dish_name.as_deref(), Some("dish-x1"));
    }

    #[test]
    fn test_corrupt_file_is_a_json_error() {
        let dir = temp_dir();
        let store = JsonFileStore::new(&dir);
        std::fs::write(store.path(), "{not json").unwrap();
        assert!(matches!(store.load(), Err(StorageError::Json(_))));
    }

    #[test]
    fn test_legacy_schema_loads_with_optionals() {
        let dir = temp_dir();
        let store = JsonFileStore::new(&dir);
        // Old clients wrote lines without dishName.
        std::fs::write(
            store.path(),
            r#"[{"id":"x1","name":"Naan","price":60.0,"quantity":2}]"#,
        )
        .unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded[0].name.as_deref(), Some("Naan"));
        assert_eq!(loaded[0].dish_name, None);
    }

    #[test]
    fn test_save_stages_then_renames_over_the_document() {
        let dir = temp_dir();
        let store = JsonFileStore::new(&dir);
        // Even a corrupt live document is replaced wholesale, and the
        // staging file never outlives the save.
        std::fs::write(store.path(), "{truncated").unwrap();
        store.save(&[line("x2", 70, 2)]).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, ItemId::new("x2"));
        assert!(!store.path().with_extension("json.tmp").exists());
    }

    #[test]
    fn test_memory_store_failure_mode() {
        let store = MemoryStore::new();
        store.save(&[line("x1", 60, 1)]).unwrap();
        store.set_failing(true);
        assert!(store.save(&[line("x2", 70, 1)]).is_err());
        store.set_failing(false);
        assert_eq!(store.persisted().len(), 1);
    }
}
