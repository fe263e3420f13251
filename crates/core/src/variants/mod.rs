//! Variants

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::{media::MediaRecord, uuids::TypedUuid};

mod errors;
mod keys;
mod registry;

pub use errors::VariantError;
pub use keys::{EntityRef, ParseVariantKeyError, VariantKey};
pub use registry::*;

/// Variant UUID, minted by the store on first persist.
pub type VariantUuid = TypedUuid<Variant>;

/// Size labels of a variant, in insertion order.
pub type Sizes = SmallVec<[String; 4]>;

/// A size/colour/stock/price combination of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    /// Durable identifier; `None` while the variant only exists in a draft.
    #[serde(default)]
    pub uuid: Option<VariantUuid>,

    /// Size labels.
    #[serde(default)]
    pub sizes: Sizes,

    /// Colour name.
    #[serde(default)]
    pub color_name: Option<String>,

    /// Stock keeping unit.
    #[serde(default)]
    pub sku: Option<String>,

    /// Units in stock.
    pub stock: u32,

    /// Price in minor units.
    pub price: u64,

    /// Sale price in minor units.
    #[serde(default)]
    pub sale_price: Option<u64>,

    /// Records attached directly to the variant.
    #[serde(default)]
    pub media: Vec<MediaRecord>,
}

impl Variant {
    /// Whether the store has assigned a durable id.
    #[must_use]
    pub fn is_persisted(&self) -> bool {
        self.uuid.is_some()
    }

    /// Whether the variant offers `size`, ignoring ASCII case.
    #[must_use]
    pub fn has_size(&self, size: &str) -> bool {
        self.sizes.iter().any(|own| own.eq_ignore_ascii_case(size))
    }

    /// Draft key of the variant sitting at `index`.
    #[must_use]
    pub fn key(&self, index: usize) -> VariantKey {
        match self.uuid {
            Some(uuid) => VariantKey::durable(uuid),
            None => VariantKey::positional(index),
        }
    }
}

/// Input for a new variant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantSpec {
    /// Size labels.
    #[serde(default)]
    pub sizes: Vec<String>,

    /// Colour name.
    #[serde(default)]
    pub color_name: Option<String>,

    /// Stock keeping unit.
    #[serde(default)]
    pub sku: Option<String>,

    /// Units in stock.
    #[serde(default)]
    pub stock: u32,

    /// Price in minor units.
    pub price: u64,

    /// Sale price in minor units.
    #[serde(default)]
    pub sale_price: Option<u64>,
}

impl VariantSpec {
    fn into_variant(self) -> Variant {
        let mut sizes = Sizes::new();

        for size in self.sizes {
            if !sizes.iter().any(|own: &String| own.eq_ignore_ascii_case(&size)) {
                sizes.push(size);
            }
        }

        Variant {
            uuid: None,
            sizes,
            color_name: self.color_name,
            sku: self.sku,
            stock: self.stock,
            price: self.price,
            sale_price: self.sale_price,
            media: Vec::new(),
        }
    }
}

/// Partial update of a variant's scalar attributes.
///
/// Outer `None` leaves a field alone; `Some(None)` clears an optional one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantPatch {
    /// New stock count.
    #[serde(default)]
    pub stock: Option<u32>,

    /// New price.
    #[serde(default)]
    pub price: Option<u64>,

    /// New sale price.
    #[serde(default)]
    pub sale_price: Option<Option<u64>>,

    /// New colour name.
    #[serde(default)]
    pub color_name: Option<Option<String>>,

    /// New SKU.
    #[serde(default)]
    pub sku: Option<Option<String>>,
}

impl VariantPatch {
    fn apply(self, variant: &mut Variant) {
        if let Some(stock) = self.stock {
            variant.stock = stock;
        }

        if let Some(price) = self.price {
            variant.price = price;
        }

        if let Some(sale_price) = self.sale_price {
            variant.sale_price = sale_price;
        }

        if let Some(color_name) = self.color_name {
            variant.color_name = color_name;
        }

        if let Some(sku) = self.sku {
            variant.sku = sku;
        }
    }
}
