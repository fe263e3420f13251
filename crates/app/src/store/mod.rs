//! Product persistence.
//!
//! The store is a document store with overwrite semantics: every write
//! returns the full product as stored afterwards.

use async_trait::async_trait;
use mockall::automock;
use vitrine::{
    media::{MediaRecord, MediaSelector, NewMediaRecord, PublicId},
    products::{Product, ProductUuid},
    variants::Variant,
};

pub mod errors;
mod in_memory;

pub use errors::StoreError;
pub use in_memory::InMemoryProductStore;

#[automock]
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Load a product.
    async fn get_product(&self, product: ProductUuid) -> Result<Product, StoreError>;

    /// Replace the full variant list, minting ids for variants without one.
    ///
    /// The returned variants are in submission order.
    async fn replace_variants(
        &self,
        product: ProductUuid,
        variants: Vec<Variant>,
    ) -> Result<Product, StoreError>;

    /// Append media records.
    async fn append_media(
        &self,
        product: ProductUuid,
        records: Vec<NewMediaRecord>,
    ) -> Result<Product, StoreError>;

    /// Remove one media record.
    async fn remove_media(
        &self,
        product: ProductUuid,
        public_id: PublicId,
    ) -> Result<Product, StoreError>;

    /// Designate the primary media record.
    async fn set_primary_media(
        &self,
        product: ProductUuid,
        selector: MediaSelector,
    ) -> Result<Product, StoreError>;

    /// Overwrite the media list.
    async fn replace_media_order(
        &self,
        product: ProductUuid,
        records: Vec<MediaRecord>,
    ) -> Result<Product, StoreError>;
}
