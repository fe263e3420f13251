//! Store errors.

use thiserror::Error;
use vitrine::media::MediaError;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("product not found")]
    NotFound,

    #[error("media write refused")]
    Media(#[from] MediaError),

    #[error("store rejected the write: {0}")]
    Rejected(String),
}
