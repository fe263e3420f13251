//! Variant registry errors.

use thiserror::Error;

use crate::variants::VariantKey;

/// Errors raised by variant registry operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VariantError {
    /// A variant of a size-bearing product was given no size.
    #[error("variant must have at least one size")]
    MissingSize,

    /// Toggling would strip the last size of a size-bearing variant.
    #[error("variant {0} would be left without sizes; remove it instead")]
    LastSize(VariantKey),

    /// Price is zero.
    #[error("variant price must be positive")]
    NonPositivePrice,

    /// Sale price is zero or above the regular price.
    #[error("sale price {sale_price} must be positive and at most the price {price}")]
    InvalidSalePrice {
        /// Offending sale price.
        sale_price: u64,
        /// Regular price.
        price: u64,
    },

    /// No variant at the given position.
    #[error("no variant at position {0}")]
    IndexNotFound(usize),

    /// No variant matches the given key.
    #[error("variant {0} not found")]
    KeyNotFound(VariantKey),

    /// The store answered a full replace with a different number of variants.
    #[error("store returned {actual} variants for a payload of {expected}")]
    PersistMismatch {
        /// Submitted variant count.
        expected: usize,
        /// Returned variant count.
        actual: usize,
    },
}

impl VariantError {
    /// Whether the error reports a missing target rather than bad input.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::IndexNotFound(_) | Self::KeyNotFound(_))
    }
}
