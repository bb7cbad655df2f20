//! Session-backed cart store.
//!
//! [`CartStore`] owns one visitor's [`Cart`] and the [`CartStorage`] slot it
//! came from. Every mutation writes the whole line list back to the slot
//! before returning, so a handler that mutates and returns never leaves the
//! stored cart behind the one it rendered.
//!
//! Two tabs mutating the same session race; the last write wins.

use std::future::Future;

use ra9ia_core::{Cart, CartLineItem, LineKey};
use rust_decimal::Decimal;
use thiserror::Error;
use tower_sessions::Session;

use crate::models::session_keys;

/// Errors writing the cart back to storage.
#[derive(Debug, Error)]
pub enum CartStorageError {
    /// The session store rejected the write.
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// The cart could not be serialized.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A slot holding one serialized cart.
pub trait CartStorage {
    /// Read the stored value, if any. Unreadable values count as absent.
    fn load(&self) -> impl Future<Output = Option<String>> + Send;

    /// Replace the stored value.
    fn save(&self, raw: String) -> impl Future<Output = Result<(), CartStorageError>> + Send;
}

impl CartStorage for Session {
    async fn load(&self) -> Option<String> {
        match self.get::<String>(session_keys::CART).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::debug!(error = %e, "Discarding unreadable cart session value");
                None
            }
        }
    }

    async fn save(&self, raw: String) -> Result<(), CartStorageError> {
        self.insert(session_keys::CART, raw).await?;
        Ok(())
    }
}

/// One visitor's cart bound to its storage slot.
pub struct CartStore<S> {
    storage: S,
    cart: Cart,
}

impl<S: CartStorage> CartStore<S> {
    /// Load the cart from `storage`, starting empty if nothing usable is stored.
    pub async fn load(storage: S) -> Self {
        let raw = storage.load().await;
        let cart = Cart::restore(raw.as_deref());
        Self { storage, cart }
    }

    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.cart.item_count()
    }

    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.cart.subtotal()
    }

    /// Add a line, merging with an existing line of the same key.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be written back.
    pub async fn add_item(&mut self, item: CartLineItem) -> Result<(), CartStorageError> {
        self.cart.add_item(item);
        self.persist().await
    }

    /// Set a line's quantity; zero or less removes it.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be written back.
    pub async fn update_quantity(
        &mut self,
        key: &LineKey,
        quantity: i64,
    ) -> Result<(), CartStorageError> {
        self.cart.update_quantity(key, quantity);
        self.persist().await
    }

    /// Remove a line if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be written back.
    pub async fn remove_item(&mut self, key: &LineKey) -> Result<(), CartStorageError> {
        self.cart.remove_item(key);
        self.persist().await
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be written back.
    pub async fn clear(&mut self) -> Result<(), CartStorageError> {
        self.cart.clear();
        self.persist().await
    }

    async fn persist(&self) -> Result<(), CartStorageError> {
        let raw = self.cart.to_stored()?;
        self.storage.save(raw).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use std::sync::{Arc, Mutex};

    use ra9ia_core::ProductId;

    use super::*;

    /// In-memory storage slot shared between store instances.
    #[derive(Clone, Default)]
    pub(crate) struct MemoryStorage(Arc<Mutex<Option<String>>>);

    impl MemoryStorage {
        pub(crate) fn with(raw: &str) -> Self {
            Self(Arc::new(Mutex::new(Some(raw.to_string()))))
        }

        pub(crate) fn raw(&self) -> Option<String> {
            self.0.lock().unwrap().clone()
        }
    }

    impl CartStorage for MemoryStorage {
        async fn load(&self) -> Option<String> {
            self.0.lock().unwrap().clone()
        }

        async fn save(&self, raw: String) -> Result<(), CartStorageError> {
            *self.0.lock().unwrap() = Some(raw);
            Ok(())
        }
    }

    fn abaya(color: &str, size: &str, quantity: u32) -> CartLineItem {
        CartLineItem::new(ProductId::new("p1"), "Abaya Noir", Decimal::from(100), quantity)
            .with_color(Some(color.to_string()))
            .with_size(Some(size.to_string()))
    }

    fn key(color: &str, size: &str) -> LineKey {
        LineKey::new(
            ProductId::new("p1"),
            Some(color.to_string()),
            Some(size.to_string()),
        )
    }

    #[tokio::test]
    async fn test_every_mutation_persists() {
        let storage = MemoryStorage::default();
        let mut store = CartStore::load(storage.clone()).await;
        assert!(storage.raw().is_none());

        store.add_item(abaya("black", "M", 1)).await.unwrap();
        let after_add = storage.raw().unwrap();
        assert!(after_add.contains("\"quantity\":1"));

        store.update_quantity(&key("black", "M"), 4).await.unwrap();
        assert!(storage.raw().unwrap().contains("\"quantity\":4"));

        store.remove_item(&key("black", "M")).await.unwrap();
        assert_eq!(storage.raw().unwrap(), "[]");
    }

    #[tokio::test]
    async fn test_reload_yields_identical_cart() {
        let storage = MemoryStorage::default();
        let mut store = CartStore::load(storage.clone()).await;
        store.add_item(abaya("black", "M", 2)).await.unwrap();
        store.add_item(abaya("beige", "S", 1)).await.unwrap();
        store
            .add_item(CartLineItem::new(ProductId::new("p2"), "Hijab", Decimal::from(40), 3))
            .await
            .unwrap();

        let reloaded = CartStore::load(storage).await;
        assert_eq!(reloaded.cart(), store.cart());
        assert_eq!(reloaded.item_count(), 6);
        assert_eq!(reloaded.subtotal(), Decimal::from(420));
    }

    #[tokio::test]
    async fn test_corrupt_storage_loads_empty() {
        let storage = MemoryStorage::with("[{\"oops\"");
        let mut store = CartStore::load(storage.clone()).await;
        assert!(store.cart().is_empty());

        store.add_item(abaya("black", "M", 1)).await.unwrap();
        assert_eq!(CartStore::load(storage).await.item_count(), 1);
    }

    #[tokio::test]
    async fn test_clear_persists_empty_list() {
        let storage = MemoryStorage::default();
        let mut store = CartStore::load(storage.clone()).await;
        store.add_item(abaya("black", "M", 2)).await.unwrap();
        store.clear().await.unwrap();

        assert_eq!(storage.raw().as_deref(), Some("[]"));
        assert!(CartStore::load(storage).await.cart().is_empty());
    }
}
