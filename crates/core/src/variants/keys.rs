//! Variant references and draft keys.

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::variants::{Variant, VariantUuid};

/// Reference to a variant, durable once the store has minted an id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityRef {
    /// The variant's durable id.
    ByDurableId(VariantUuid),

    /// The variant's position in the product's variant list.
    ByPosition(usize),
}

impl EntityRef {
    /// Replace a positional reference with its minted durable id, if any.
    #[must_use]
    pub fn upgrade(self, minted: &FxHashMap<usize, VariantUuid>) -> Self {
        match self {
            Self::ByPosition(index) => minted
                .get(&index)
                .map_or(self, |uuid| Self::ByDurableId(*uuid)),
            Self::ByDurableId(_) => self,
        }
    }

    /// Find the referenced variant's position in `variants`.
    #[must_use]
    pub fn locate(self, variants: &[Variant]) -> Option<usize> {
        match self {
            Self::ByDurableId(uuid) => variants.iter().position(|v| v.uuid == Some(uuid)),
            Self::ByPosition(index) => (index < variants.len()).then_some(index),
        }
    }
}

/// Draft key of a variant: `variant_<uuid>` once persisted, otherwise
/// `variant_<index>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariantKey(EntityRef);

impl VariantKey {
    /// Key of a persisted variant.
    #[must_use]
    pub const fn durable(uuid: VariantUuid) -> Self {
        Self(EntityRef::ByDurableId(uuid))
    }

    /// Key of a draft-only variant at `index`.
    #[must_use]
    pub const fn positional(index: usize) -> Self {
        Self(EntityRef::ByPosition(index))
    }

    /// The reference behind the key.
    #[must_use]
    pub const fn entity_ref(self) -> EntityRef {
        self.0
    }

    /// Whether the key names a persisted variant.
    #[must_use]
    pub const fn is_durable(self) -> bool {
        matches!(self.0, EntityRef::ByDurableId(_))
    }

    /// Find the keyed variant's position in `variants`.
    #[must_use]
    pub fn locate(self, variants: &[Variant]) -> Option<usize> {
        self.0.locate(variants)
    }

    /// Upgrade a positional key to the durable id minted for it.
    #[must_use]
    pub fn upgrade(self, minted: &FxHashMap<usize, VariantUuid>) -> Self {
        Self(self.0.upgrade(minted))
    }

    /// Re-key after the variant at `removed` left the list.
    ///
    /// Returns `None` for the removed variant's own positional key.
    #[must_use]
    pub fn after_removal(self, removed: usize) -> Option<Self> {
        match self.0 {
            EntityRef::ByPosition(index) if index == removed => None,
            EntityRef::ByPosition(index) if index > removed => Some(Self::positional(index - 1)),
            _ => Some(self),
        }
    }
}

impl Display for VariantKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self.0 {
            EntityRef::ByDurableId(uuid) => write!(f, "variant_{uuid}"),
            EntityRef::ByPosition(index) => write!(f, "variant_{index}"),
        }
    }
}

/// Failure to parse a [`VariantKey`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid variant key {0:?}")]
pub struct ParseVariantKeyError(String);

impl FromStr for VariantKey {
    type Err = ParseVariantKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix("variant_")
            .ok_or_else(|| ParseVariantKeyError(s.to_string()))?;

        if let Ok(index) = rest.parse::<usize>() {
            return Ok(Self::positional(index));
        }

        rest.parse::<VariantUuid>()
            .ok()
            .map(Self::durable)
            .ok_or_else(|| ParseVariantKeyError(s.to_string()))
    }
}
