//! Draft errors.

use thiserror::Error;

use crate::{media::MediaError, variants::VariantError};

/// A draft action was rejected; the draft it was applied to is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    /// Variant registry rejection.
    #[error(transparent)]
    Variant(#[from] VariantError),

    /// Media table rejection.
    #[error(transparent)]
    Media(#[from] MediaError),
}

impl EditError {
    /// Whether the action targeted something that does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        match self {
            Self::Variant(error) => error.is_not_found(),
            Self::Media(error) => error.is_not_found(),
        }
    }
}
