//! Products service.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use rustc_hash::FxHashMap;
use tracing::{info, warn};
use vitrine::{
    media::{MediaError, MediaRecord, MediaSelector, MediaTable, NewMediaRecord, PublicId},
    products::{Product, ProductUuid},
    variants::{self, Variant, VariantUuid},
};

use crate::{
    domain::products::errors::ProductsServiceError, media_host::MediaHost, store::ProductStore,
};

/// Outcome of a variant persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedVariants {
    /// The product as stored afterwards.
    pub product: Product,

    /// Durable ids minted for previously draft-only variants, by position.
    pub minted: FxHashMap<usize, VariantUuid>,
}

/// How a media removal treats the hosted asset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DetachOptions {
    /// Also delete the asset from the media host.
    pub purge_remote: bool,
}

#[derive(Clone)]
pub struct StoreProductsService {
    store: Arc<dyn ProductStore>,
    media_host: Arc<dyn MediaHost>,
}

impl StoreProductsService {
    #[must_use]
    pub fn new(store: Arc<dyn ProductStore>, media_host: Arc<dyn MediaHost>) -> Self {
        Self { store, media_host }
    }

    /// Bring stored references in line with the stored variants after a
    /// variant write, submitting the media list only when it changed.
    async fn sync_media(
        &self,
        stored: Product,
        minted: &FxHashMap<usize, VariantUuid>,
    ) -> Result<Product, ProductsServiceError> {
        let mut media = stored.media.clone();

        let upgraded = media.reassign_variant_references(minted);
        media.realign_positions(&stored.variants);

        if media == stored.media {
            return Ok(stored);
        }

        info!(product_uuid = %stored.uuid, upgraded, "synchronised media references");

        Ok(self
            .store
            .replace_media_order(stored.uuid, media.into_records())
            .await?)
    }

    /// Delete the hosted assets of records already removed from the store.
    ///
    /// Every record is attempted; the first failure is reported together with
    /// the stored product.
    async fn purge(
        &self,
        stored: Product,
        records: &[MediaRecord],
    ) -> Result<Product, ProductsServiceError> {
        let mut failure = None;

        for record in records {
            if let Err(error) = self
                .media_host
                .delete(record.public_id().clone(), record.asset.kind)
                .await
            {
                warn!(public_id = %record.public_id(), %error, "failed to delete remote asset");
                failure.get_or_insert(error);
            }
        }

        match failure {
            Some(source) => Err(ProductsServiceError::Purge {
                product: Box::new(stored),
                source,
            }),
            None => Ok(stored),
        }
    }
}

#[async_trait]
impl ProductsService for StoreProductsService {
    async fn get_product(&self, product: ProductUuid) -> Result<Product, ProductsServiceError> {
        Ok(self.store.get_product(product).await?)
    }

    #[tracing::instrument(
        name = "products.service.persist_variants",
        skip(self, variants),
        fields(product_uuid = %product, variant_count = variants.len()),
        err
    )]
    async fn persist_variants(
        &self,
        product: ProductUuid,
        variants: Vec<Variant>,
    ) -> Result<PersistedVariants, ProductsServiceError> {
        let mut candidate = self.store.get_product(product).await?;
        candidate.variants.clone_from(&variants);

        variants::validate_variants(&candidate)?;

        let stored = self.store.replace_variants(product, variants.clone()).await?;
        let minted = variants::minted_ids(&variants, &stored.variants)?;
        let stored = self.sync_media(stored, &minted).await?;

        info!(minted = minted.len(), "persisted variants");

        Ok(PersistedVariants {
            product: stored,
            minted,
        })
    }

    #[tracing::instrument(
        name = "products.service.remove_variant",
        skip(self),
        fields(product_uuid = %product),
        err
    )]
    async fn remove_variant(
        &self,
        product: ProductUuid,
        index: usize,
        options: DetachOptions,
    ) -> Result<Product, ProductsServiceError> {
        let mut remaining = self.store.get_product(product).await?;
        let removed = variants::remove_variant(&mut remaining, index)?;

        for record in &removed.detached {
            self.store
                .remove_media(product, record.public_id().clone())
                .await?;
        }

        let stored = self
            .store
            .replace_variants(product, remaining.variants)
            .await?;

        let stored = self.sync_media(stored, &FxHashMap::default()).await?;

        info!(detached = removed.detached.len(), "removed variant");

        if options.purge_remote {
            return self.purge(stored, &removed.detached).await;
        }

        Ok(stored)
    }

    #[tracing::instrument(
        name = "products.service.attach_media",
        skip(self, records),
        fields(product_uuid = %product, record_count = records.len()),
        err
    )]
    async fn attach_media(
        &self,
        product: ProductUuid,
        records: Vec<NewMediaRecord>,
    ) -> Result<Product, ProductsServiceError> {
        let current = self.store.get_product(product).await?;

        let mut candidate = current.media.clone();
        candidate.attach(records.clone(), &current.variants)?;

        Ok(self.store.append_media(product, records).await?)
    }

    #[tracing::instrument(
        name = "products.service.detach_media",
        skip(self),
        fields(product_uuid = %product, public_id = %public_id),
        err
    )]
    async fn detach_media(
        &self,
        product: ProductUuid,
        public_id: PublicId,
        options: DetachOptions,
    ) -> Result<Product, ProductsServiceError> {
        let current = self.store.get_product(product).await?;
        let record = current
            .media
            .get(&public_id)
            .cloned()
            .ok_or_else(|| MediaError::NotFound(public_id.clone()))?;

        let mut stored = self.store.remove_media(product, public_id).await?;

        if !stored.media.is_empty() && stored.media.primary().is_none() {
            warn!("store left no primary media; designating the first record");

            stored = self
                .store
                .set_primary_media(product, MediaSelector::Index(0))
                .await?;
        }

        if options.purge_remote {
            return self.purge(stored, std::slice::from_ref(&record)).await;
        }

        Ok(stored)
    }

    #[tracing::instrument(
        name = "products.service.set_primary",
        skip(self),
        fields(product_uuid = %product),
        err
    )]
    async fn set_primary(
        &self,
        product: ProductUuid,
        selector: MediaSelector,
    ) -> Result<Product, ProductsServiceError> {
        let mut candidate = self.store.get_product(product).await?.media;
        candidate.set_primary(&selector)?;

        Ok(self.store.set_primary_media(product, selector).await?)
    }

    #[tracing::instrument(
        name = "products.service.reorder_media",
        skip(self, order),
        fields(product_uuid = %product),
        err
    )]
    async fn reorder_media(
        &self,
        product: ProductUuid,
        order: Vec<PublicId>,
    ) -> Result<Product, ProductsServiceError> {
        let mut media = self.store.get_product(product).await?.media;
        media.reorder(&order)?;

        Ok(self
            .store
            .replace_media_order(product, media.into_records())
            .await?)
    }

    #[tracing::instrument(
        name = "products.service.replace_media",
        skip(self, records),
        fields(product_uuid = %product, record_count = records.len()),
        err
    )]
    async fn replace_media(
        &self,
        product: ProductUuid,
        records: Vec<MediaRecord>,
    ) -> Result<Product, ProductsServiceError> {
        let current = self.store.get_product(product).await?;

        let order: Vec<PublicId> = records.iter().map(|r| r.public_id().clone()).collect();
        let mut check = current.media;
        check.reorder(&order)?;

        let media = MediaTable::from_records(records);

        if let Some(record) = media.iter().find(|record| {
            !record.is_product_level() && record.bound_variant(&current.variants).is_none()
        }) {
            return Err(match record.variant_uuid {
                Some(uuid) => MediaError::UnknownVariant(uuid),
                None => MediaError::UnknownVariantIndex(record.variant_index.unwrap_or_default()),
            }
            .into());
        }

        Ok(self
            .store
            .replace_media_order(product, media.into_records())
            .await?)
    }
}

#[automock]
#[async_trait]
pub trait ProductsService: Send + Sync {
    /// Retrieve a single product.
    async fn get_product(&self, product: ProductUuid) -> Result<Product, ProductsServiceError>;

    /// Submit the complete variant list, upgrading positional media
    /// references to the ids the store mints.
    async fn persist_variants(
        &self,
        product: ProductUuid,
        variants: Vec<Variant>,
    ) -> Result<PersistedVariants, ProductsServiceError>;

    /// Remove a variant, detaching its media first.
    async fn remove_variant(
        &self,
        product: ProductUuid,
        index: usize,
        options: DetachOptions,
    ) -> Result<Product, ProductsServiceError>;

    /// Append media records.
    async fn attach_media(
        &self,
        product: ProductUuid,
        records: Vec<NewMediaRecord>,
    ) -> Result<Product, ProductsServiceError>;

    /// Remove a media record.
    async fn detach_media(
        &self,
        product: ProductUuid,
        public_id: PublicId,
        options: DetachOptions,
    ) -> Result<Product, ProductsServiceError>;

    /// Designate the primary media record.
    async fn set_primary(
        &self,
        product: ProductUuid,
        selector: MediaSelector,
    ) -> Result<Product, ProductsServiceError>;

    /// Reorder media by public id; the first becomes primary.
    async fn reorder_media(
        &self,
        product: ProductUuid,
        order: Vec<PublicId>,
    ) -> Result<Product, ProductsServiceError>;

    /// Overwrite the media list with the same records in a new arrangement.
    async fn replace_media(
        &self,
        product: ProductUuid,
        records: Vec<MediaRecord>,
    ) -> Result<Product, ProductsServiceError>;
}
