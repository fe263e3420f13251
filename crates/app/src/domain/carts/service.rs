//! Carts service.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use rustc_hash::FxHashMap;
use tracing::warn;
use vitrine::{
    carts::{self, CartLine, CartUuid, RenderedCartLine},
    products::{Product, ProductUuid},
};

use crate::domain::{
    carts::{errors::CartsServiceError, storage::CartStorage},
    products::ProductsService,
};

#[derive(Clone)]
pub struct StoreCartsService {
    storage: Arc<dyn CartStorage>,
    products: Arc<dyn ProductsService>,
}

impl StoreCartsService {
    #[must_use]
    pub fn new(storage: Arc<dyn CartStorage>, products: Arc<dyn ProductsService>) -> Self {
        Self { storage, products }
    }

    /// Load every product the lines reference, once each.
    async fn load_products(&self, lines: &[CartLine]) -> FxHashMap<ProductUuid, Product> {
        let mut products = FxHashMap::default();

        for line in lines {
            if products.contains_key(&line.product_uuid) {
                continue;
            }

            match self.products.get_product(line.product_uuid).await {
                Ok(product) => {
                    products.insert(line.product_uuid, product);
                }
                Err(error) => {
                    warn!(
                        product_uuid = %line.product_uuid,
                        %error,
                        "product unavailable; rendering its lines without an image"
                    );
                }
            }
        }

        products
    }
}

#[async_trait]
impl CartsService for StoreCartsService {
    #[tracing::instrument(
        name = "carts.service.render_cart",
        skip(self),
        fields(cart_uuid = %cart),
        err
    )]
    async fn render_cart(&self, cart: CartUuid) -> Result<Vec<RenderedCartLine>, CartsServiceError> {
        let lines = self.storage.get_lines(cart).await?;

        Ok(self.render_lines(lines).await)
    }

    async fn render_lines(&self, lines: Vec<CartLine>) -> Vec<RenderedCartLine> {
        let products = self.load_products(&lines).await;

        carts::render_lines(&lines, &products)
    }
}

#[automock]
#[async_trait]
pub trait CartsService: Send + Sync {
    /// Load a cart's lines and decorate each with its display image.
    async fn render_cart(&self, cart: CartUuid) -> Result<Vec<RenderedCartLine>, CartsServiceError>;

    /// Decorate lines with their display images.
    async fn render_lines(&self, lines: Vec<CartLine>) -> Vec<RenderedCartLine>;
}
