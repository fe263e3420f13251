//! In-memory product store.

use std::sync::Arc;

use async_trait::async_trait;
use rustc_hash::{FxHashMap, FxHashSet};
use tokio::sync::RwLock;
use vitrine::{
    media::{MediaRecord, MediaSelector, MediaTable, NewMediaRecord, PublicId},
    products::{Product, ProductUuid},
    variants::{Variant, VariantUuid},
};

use crate::store::{ProductStore, StoreError};

/// Product store kept in process memory.
///
/// Writes are applied to a copy and only committed when they succeed.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProductStore {
    products: Arc<RwLock<FxHashMap<ProductUuid, Product>>>,
}

impl InMemoryProductStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a product, repairing its primary designation.
    pub async fn insert(&self, mut product: Product) -> Product {
        product.media = MediaTable::from_records(product.media.into_records());

        self.products
            .write()
            .await
            .insert(product.uuid, product.clone());

        product
    }

    async fn update(
        &self,
        uuid: ProductUuid,
        write: impl FnOnce(&mut Product) -> Result<(), StoreError> + Send,
    ) -> Result<Product, StoreError> {
        let mut products = self.products.write().await;

        let stored = products.get_mut(&uuid).ok_or(StoreError::NotFound)?;
        let mut product = stored.clone();

        write(&mut product)?;

        stored.clone_from(&product);

        Ok(product)
    }
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    async fn get_product(&self, product: ProductUuid) -> Result<Product, StoreError> {
        self.products
            .read()
            .await
            .get(&product)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn replace_variants(
        &self,
        product: ProductUuid,
        variants: Vec<Variant>,
    ) -> Result<Product, StoreError> {
        self.update(product, |product| {
            product.variants = variants
                .into_iter()
                .map(|mut variant| {
                    if variant.uuid.is_none() {
                        variant.uuid = Some(VariantUuid::new());
                    }

                    variant
                })
                .collect();

            Ok(())
        })
        .await
    }

    async fn append_media(
        &self,
        product: ProductUuid,
        records: Vec<NewMediaRecord>,
    ) -> Result<Product, StoreError> {
        self.update(product, |product| {
            product.media.attach(records, &product.variants)?;

            Ok(())
        })
        .await
    }

    async fn remove_media(
        &self,
        product: ProductUuid,
        public_id: PublicId,
    ) -> Result<Product, StoreError> {
        self.update(product, |product| {
            product.media.detach(&public_id)?;

            Ok(())
        })
        .await
    }

    async fn set_primary_media(
        &self,
        product: ProductUuid,
        selector: MediaSelector,
    ) -> Result<Product, StoreError> {
        self.update(product, |product| {
            product.media.set_primary(&selector)?;

            Ok(())
        })
        .await
    }

    async fn replace_media_order(
        &self,
        product: ProductUuid,
        records: Vec<MediaRecord>,
    ) -> Result<Product, StoreError> {
        self.update(product, |product| {
            let mut seen = FxHashSet::default();

            if let Some(duplicate) = records.iter().find(|r| !seen.insert(r.public_id())) {
                return Err(StoreError::Rejected(format!(
                    "media {} listed twice",
                    duplicate.public_id()
                )));
            }

            product.media = MediaTable::from_records(records);

            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;
    use vitrine::fixtures::{draft_variant, new_record, persisted_variant, product};

    use super::*;

    #[tokio::test]
    async fn replace_variants_mints_missing_ids_only() -> TestResult {
        let store = InMemoryProductStore::new();
        let existing = persisted_variant(&["S"]);
        let stored = store.insert(product(vec![existing.clone()])).await;

        let updated = store
            .replace_variants(stored.uuid, vec![existing.clone(), draft_variant(&["M"])])
            .await?;

        assert_eq!(updated.variants.first().and_then(|v| v.uuid), existing.uuid);
        assert!(updated.variants.get(1).is_some_and(Variant::is_persisted));

        Ok(())
    }

    #[tokio::test]
    async fn unknown_product_is_not_found() {
        let store = InMemoryProductStore::new();

        let result = store.get_product(ProductUuid::new()).await;

        assert!(
            matches!(result, Err(StoreError::NotFound)),
            "expected NotFound, got {result:?}"
        );
    }

    #[tokio::test]
    async fn failed_write_leaves_the_product_untouched() -> TestResult {
        let store = InMemoryProductStore::new();
        let stored = store.insert(product(Vec::new())).await;
        store
            .append_media(stored.uuid, vec![new_record("a")])
            .await?;

        let result = store
            .append_media(stored.uuid, vec![new_record("b"), new_record("a")])
            .await;

        assert!(
            matches!(result, Err(StoreError::Media(_))),
            "expected Media, got {result:?}"
        );
        assert_eq!(store.get_product(stored.uuid).await?.media.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn replace_media_order_repairs_primary() -> TestResult {
        let store = InMemoryProductStore::new();
        let stored = store.insert(product(Vec::new())).await;
        let appended = store
            .append_media(stored.uuid, vec![new_record("a"), new_record("b")])
            .await?;

        let mut records = appended.media.into_records();
        records.reverse();
        for record in &mut records {
            record.is_primary = false;
        }

        let updated = store.replace_media_order(stored.uuid, records).await?;

        assert_eq!(
            updated.media.primary().map(|r| r.public_id().as_str()),
            Some("b")
        );

        Ok(())
    }

    #[tokio::test]
    async fn replace_media_order_rejects_duplicates() -> TestResult {
        let store = InMemoryProductStore::new();
        let stored = store.insert(product(Vec::new())).await;
        let appended = store
            .append_media(stored.uuid, vec![new_record("a")])
            .await?;

        let mut records = appended.media.into_records();
        records.extend(records.clone());

        let result = store.replace_media_order(stored.uuid, records).await;

        assert!(
            matches!(result, Err(StoreError::Rejected(_))),
            "expected Rejected, got {result:?}"
        );

        Ok(())
    }
}
