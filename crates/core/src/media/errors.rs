//! Media table errors.

use thiserror::Error;

use crate::{media::PublicId, variants::VariantUuid};

/// Errors raised by media table operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediaError {
    /// An attach was requested with no records.
    #[error("no media supplied")]
    Empty,

    /// No record carries the given public id.
    #[error("media {0} not found")]
    NotFound(PublicId),

    /// No record sits at the given position.
    #[error("no media at position {0}")]
    IndexNotFound(usize),

    /// The public id is already attached to the product.
    #[error("media {0} is already attached")]
    Duplicate(PublicId),

    /// A positional reference points past the variant list.
    #[error("variant index {0} does not exist")]
    UnknownVariantIndex(usize),

    /// A durable reference names a variant the product does not have.
    #[error("variant {0} does not exist")]
    UnknownVariant(VariantUuid),

    /// A reorder did not list every attached record exactly once.
    #[error("new order is not a permutation of the attached media")]
    NotAPermutation,
}

impl MediaError {
    /// Whether the error reports a missing target rather than bad input.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::IndexNotFound(_))
    }
}
