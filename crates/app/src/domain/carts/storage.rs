//! Cart storage.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use rustc_hash::FxHashMap;
use tokio::sync::RwLock;
use vitrine::carts::{Cart, CartLine, CartUuid};

use crate::domain::carts::errors::CartsServiceError;

#[automock]
#[async_trait]
pub trait CartStorage: Send + Sync {
    /// Lines of a cart, in cart order.
    async fn get_lines(&self, cart: CartUuid) -> Result<Vec<CartLine>, CartsServiceError>;
}

/// Cart storage kept in process memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCartStorage {
    carts: Arc<RwLock<FxHashMap<CartUuid, Vec<CartLine>>>>,
}

impl InMemoryCartStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a cart.
    pub async fn insert(&self, cart: Cart) {
        self.carts.write().await.insert(cart.uuid, cart.lines);
    }
}

#[async_trait]
impl CartStorage for InMemoryCartStorage {
    async fn get_lines(&self, cart: CartUuid) -> Result<Vec<CartLine>, CartsServiceError> {
        self.carts
            .read()
            .await
            .get(&cart)
            .cloned()
            .ok_or(CartsServiceError::NotFound)
    }
}
