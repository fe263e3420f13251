//! Products service errors.

use thiserror::Error;
use vitrine::{media::MediaError, products::Product, variants::VariantError};

use crate::{media_host::MediaHostError, store::StoreError};

#[derive(Debug, Error)]
pub enum ProductsServiceError {
    #[error("product not found")]
    NotFound,

    #[error("invalid variant")]
    Variant(#[from] VariantError),

    #[error("invalid media")]
    Media(#[from] MediaError),

    #[error("storage error")]
    Store(#[source] StoreError),

    #[error("remote asset error")]
    RemoteAsset(#[from] MediaHostError),

    /// The store writes succeeded but a hosted asset could not be deleted.
    #[error("stored, but failed to delete a remote asset")]
    Purge {
        product: Box<Product>,
        #[source]
        source: MediaHostError,
    },
}

impl ProductsServiceError {
    /// Whether the error reports a missing product, variant or record.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound => true,
            Self::Variant(error) => error.is_not_found(),
            Self::Media(error) => error.is_not_found(),
            Self::Store(_) | Self::RemoteAsset(_) | Self::Purge { .. } => false,
        }
    }

    /// The product as stored, when the error came after every store write
    /// had succeeded.
    #[must_use]
    pub fn stored_product(&self) -> Option<&Product> {
        match self {
            Self::Purge { product, .. } => Some(product),
            _ => None,
        }
    }
}

impl From<StoreError> for ProductsServiceError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound => Self::NotFound,
            StoreError::Media(error) => Self::Media(error),
            StoreError::Rejected(_) => Self::Store(error),
        }
    }
}
