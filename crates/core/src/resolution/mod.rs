//! Resolution
//!
//! Picks the single record that represents a variant reference. The fallback
//! order is an explicit list of matchers; the first one that yields a record
//! wins.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};

use crate::{media::MediaRecord, products::Product, variants::VariantUuid};

mod matchers;

/// A loose reference to a variant, as carried by cart lines and storefront
/// links. Any field may be missing or stale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetRef {
    /// Durable variant id.
    #[serde(default)]
    pub variant_uuid: Option<VariantUuid>,

    /// Position of the variant.
    #[serde(default)]
    pub variant_index: Option<usize>,

    /// Size label.
    #[serde(default)]
    pub size: Option<String>,

    /// Colour name.
    #[serde(default)]
    pub color_name: Option<String>,
}

impl AssetRef {
    /// Reference by durable id.
    #[must_use]
    pub fn variant(uuid: VariantUuid) -> Self {
        Self {
            variant_uuid: Some(uuid),
            ..Self::default()
        }
    }

    /// Reference by position.
    #[must_use]
    pub fn index(index: usize) -> Self {
        Self {
            variant_index: Some(index),
            ..Self::default()
        }
    }

    /// Add a size label.
    #[must_use]
    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = Some(size.into());
        self
    }

    /// Add a colour name.
    #[must_use]
    pub fn with_color(mut self, color_name: impl Into<String>) -> Self {
        self.color_name = Some(color_name.into());
        self
    }
}

/// Fallback tiers, in the order they are attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Product records with the referenced positional index.
    VariantIndex,

    /// The referenced variant's own records.
    VariantOwnMedia,

    /// Records of any variant offering the referenced size.
    Size,

    /// Product records with the referenced durable id.
    VariantUuid,

    /// Records depicting the referenced colour.
    ColorName,

    /// The primary record.
    Primary,

    /// The first record.
    First,
}

impl Tier {
    /// Snake-case name, as used in log fields.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::VariantIndex => "variant_index",
            Self::VariantOwnMedia => "variant_own_media",
            Self::Size => "size",
            Self::VariantUuid => "variant_uuid",
            Self::ColorName => "color_name",
            Self::Primary => "primary",
            Self::First => "first",
        }
    }
}

impl Display for Tier {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// A resolved record and the tier that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution<'p> {
    /// Tier that matched.
    pub tier: Tier,

    /// The chosen record.
    pub record: &'p MediaRecord,
}

/// Resolve the record that represents `asset_ref`, reporting the tier that
/// matched.
///
/// Returns `None` only when the product has no records at all.
#[must_use]
pub fn resolve_with_tier<'p>(product: &'p Product, asset_ref: &AssetRef) -> Option<Resolution<'p>> {
    matchers::STRATEGY.iter().find_map(|(tier, matcher)| {
        matcher(product, asset_ref).map(|record| Resolution {
            tier: *tier,
            record,
        })
    })
}

/// Resolve the record that represents `asset_ref`.
#[must_use]
pub fn resolve_display_asset<'p>(
    product: &'p Product,
    asset_ref: &AssetRef,
) -> Option<&'p MediaRecord> {
    resolve_with_tier(product, asset_ref).map(|resolution| resolution.record)
}
