//! Draft session errors.

use std::time::Duration;

use thiserror::Error;
use vitrine::{draft::EditError, variants::VariantKey};

use crate::{domain::products::ProductsServiceError, media_host::MediaHostError};

#[derive(Debug, Error)]
pub enum DraftError {
    #[error("edit rejected: {0}")]
    Edit(#[from] EditError),

    #[error("product not found")]
    NotFound,

    #[error("{pending} operation(s) still pending after {timeout:?}")]
    ConcurrentEdit { pending: usize, timeout: Duration },

    #[error("a save is in progress")]
    SaveInProgress,

    #[error("variant {0} is being persisted")]
    PersistInFlight(VariantKey),

    #[error("an upload for variant {0} or a later one is in flight")]
    UploadInFlight(VariantKey),

    #[error("remote asset error")]
    RemoteAsset(#[from] MediaHostError),

    #[error("products service error")]
    Service(#[source] ProductsServiceError),
}

impl DraftError {
    /// Whether the error comes from work still running against the session.
    #[must_use]
    pub fn is_concurrent_edit(&self) -> bool {
        matches!(
            self,
            Self::ConcurrentEdit { .. }
                | Self::SaveInProgress
                | Self::PersistInFlight(_)
                | Self::UploadInFlight(_)
        )
    }

    /// Whether the error reports a missing product, variant or record.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound => true,
            Self::Edit(error) => error.is_not_found(),
            Self::Service(error) => error.is_not_found(),
            _ => false,
        }
    }
}

impl From<ProductsServiceError> for DraftError {
    fn from(error: ProductsServiceError) -> Self {
        match error {
            ProductsServiceError::NotFound => Self::NotFound,
            ProductsServiceError::Variant(error) => Self::Edit(error.into()),
            ProductsServiceError::Media(error) => Self::Edit(error.into()),
            ProductsServiceError::RemoteAsset(error) => Self::RemoteAsset(error),
            ProductsServiceError::Purge { source, .. } => Self::RemoteAsset(source),
            ProductsServiceError::Store(_) => Self::Service(error),
        }
    }
}
