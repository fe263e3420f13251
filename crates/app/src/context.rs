//! App Context

use std::sync::Arc;

use thiserror::Error;

use crate::{
    config::AppConfig,
    domain::{
        carts::{CartStorage, CartsService, StoreCartsService},
        drafts::DraftSessions,
        products::{ProductsService, StoreProductsService},
    },
    media_host::{HttpMediaHost, MediaHost},
    observability::{self, ObservabilityError},
    store::ProductStore,
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to initialise logging")]
    Observability(#[from] ObservabilityError),

    #[error("media host url is not configured")]
    MissingMediaHostUrl,
}

#[derive(Clone)]
pub struct AppContext {
    pub products: Arc<dyn ProductsService>,
    pub carts: Arc<dyn CartsService>,
    pub drafts: DraftSessions,
}

impl AppContext {
    /// Wire services over the given stores and the configured media host.
    ///
    /// # Errors
    ///
    /// Returns an error when the media host url is blank.
    pub fn from_config(
        config: &AppConfig,
        store: Arc<dyn ProductStore>,
        cart_storage: Arc<dyn CartStorage>,
    ) -> Result<Self, AppInitError> {
        if config.media_host.url.trim().is_empty() {
            return Err(AppInitError::MissingMediaHostUrl);
        }

        let media_host: Arc<dyn MediaHost> = Arc::new(HttpMediaHost::new(config.media_host.clone()));

        Ok(Self::new(config, store, cart_storage, media_host))
    }

    /// Like [`AppContext::from_config`], installing the logging subscriber
    /// first.
    ///
    /// # Errors
    ///
    /// Returns an error when logging cannot be initialised or the media host
    /// url is blank.
    pub fn init(
        config: &AppConfig,
        store: Arc<dyn ProductStore>,
        cart_storage: Arc<dyn CartStorage>,
    ) -> Result<Self, AppInitError> {
        observability::init_logging(&config.logging)?;

        Self::from_config(config, store, cart_storage)
    }

    #[must_use]
    pub fn new(
        config: &AppConfig,
        store: Arc<dyn ProductStore>,
        cart_storage: Arc<dyn CartStorage>,
        media_host: Arc<dyn MediaHost>,
    ) -> Self {
        let products: Arc<dyn ProductsService> =
            Arc::new(StoreProductsService::new(store, Arc::clone(&media_host)));

        Self {
            carts: Arc::new(StoreCartsService::new(cart_storage, Arc::clone(&products))),
            drafts: DraftSessions::new(
                Arc::clone(&products),
                media_host,
                config.drafts.clone(),
                config.media_host.folder.clone(),
            ),
            products,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use testresult::TestResult;
    use vitrine::fixtures::product;

    use crate::{
        domain::carts::InMemoryCartStorage, store::InMemoryProductStore, test::RecordingMediaHost,
    };

    use super::*;

    fn config(url: &str) -> TestResult<AppConfig> {
        Ok(AppConfig::try_parse_from([
            "vitrine",
            "--media-host-url",
            url,
            "--media-host-token",
            "secret",
        ])?)
    }

    #[test]
    fn blank_media_host_url_is_rejected() -> TestResult {
        let result = AppContext::from_config(
            &config("  ")?,
            Arc::new(InMemoryProductStore::new()),
            Arc::new(InMemoryCartStorage::new()),
        );

        assert!(
            matches!(result, Err(AppInitError::MissingMediaHostUrl)),
            "expected MissingMediaHostUrl"
        );

        Ok(())
    }

    #[tokio::test]
    async fn wired_services_share_the_store() -> TestResult {
        let store = InMemoryProductStore::new();
        let seeded = store.insert(product(Vec::new())).await;

        let ctx = AppContext::new(
            &config("https://media.test")?,
            Arc::new(store),
            Arc::new(InMemoryCartStorage::new()),
            Arc::new(RecordingMediaHost::new()),
        );

        let loaded = ctx.products.get_product(seeded.uuid).await?;
        let session = ctx.drafts.open(seeded.uuid).await?;

        assert_eq!(loaded, seeded);
        assert_eq!(session.view().await, seeded);

        Ok(())
    }
}
