//! Products

use serde::{Deserialize, Serialize};

use crate::{
    media::MediaTable,
    uuids::TypedUuid,
    variants::{Variant, VariantKey},
};

/// Product UUID
pub type ProductUuid = TypedUuid<Product>;

/// Whether a product's variants are sold in sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sizing {
    /// Every variant offers at least one size.
    #[default]
    SizeBearing,

    /// Variants may have no sizes at all.
    Sizeless,
}

/// A catalog product with its variants and media.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Product UUID
    pub uuid: ProductUuid,

    /// Display name
    pub name: String,

    /// Base price in minor units
    pub base_price: u64,

    /// Sizing category
    #[serde(default)]
    pub sizing: Sizing,

    /// Variants, in display order
    #[serde(default)]
    pub variants: Vec<Variant>,

    /// Media association table
    #[serde(default)]
    pub media: MediaTable,
}

impl Product {
    /// Create a size-bearing product with no variants or media.
    pub fn new(uuid: ProductUuid, name: impl Into<String>, base_price: u64) -> Self {
        Self {
            uuid,
            name: name.into(),
            base_price,
            sizing: Sizing::default(),
            variants: Vec::new(),
            media: MediaTable::new(),
        }
    }

    /// Draft keys of every variant, in list order.
    pub fn variant_keys(&self) -> impl Iterator<Item = VariantKey> + '_ {
        self.variants
            .iter()
            .enumerate()
            .map(|(index, variant)| variant.key(index))
    }
}
