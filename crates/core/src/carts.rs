//! Carts
//!
//! Cart lines are owned by cart storage. Rendering decorates them with a
//! display image at read time and never writes the result back.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::{
    products::{Product, ProductUuid},
    resolution::{AssetRef, Tier, resolve_with_tier},
    uuids::TypedUuid,
    variants::VariantUuid,
};

/// Cart UUID
pub type CartUuid = TypedUuid<Cart>;

/// Cart Line UUID
pub type CartLineUuid = TypedUuid<CartLine>;

/// A shopping cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    /// Cart UUID
    pub uuid: CartUuid,

    /// Lines, in insertion order
    pub lines: Vec<CartLine>,
}

/// Lightweight variant reference stored on a cart line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartVariantRef {
    /// Durable variant id, if it was known when the line was added.
    #[serde(default)]
    pub variant_uuid: Option<VariantUuid>,

    /// Chosen size.
    #[serde(default)]
    pub size: Option<String>,

    /// Chosen colour.
    #[serde(default)]
    pub color_name: Option<String>,

    /// Position of the variant when the line was added.
    #[serde(default)]
    pub variant_index: Option<usize>,
}

/// A stored cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Cart Line UUID
    pub uuid: CartLineUuid,

    /// Referenced product
    pub product_uuid: ProductUuid,

    /// Variant reference, absent for products bought without a variant
    #[serde(default)]
    pub variant: Option<CartVariantRef>,

    /// Quantity
    pub quantity: u32,

    /// Image chosen by the client when the line was added
    #[serde(default)]
    pub image_url: Option<String>,
}

impl CartLine {
    /// The resolution reference carried by the line.
    #[must_use]
    pub fn asset_ref(&self) -> AssetRef {
        self.variant
            .as_ref()
            .map(|variant| AssetRef {
                variant_uuid: variant.variant_uuid,
                variant_index: variant.variant_index,
                size: variant.size.clone(),
                color_name: variant.color_name.clone(),
            })
            .unwrap_or_default()
    }
}

/// Where a display image came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "tier")]
pub enum ImageSource {
    /// The line's own `image_url`.
    Line,

    /// Resolved from the product's media at the given tier.
    Resolved(Tier),
}

/// Image shown next to a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayImage {
    /// Image URL
    pub url: String,

    /// Origin of the image
    pub source: ImageSource,
}

/// A cart line decorated for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedCartLine {
    /// The stored line, unchanged.
    #[serde(flatten)]
    pub line: CartLine,

    /// Transient display image.
    pub display_image: Option<DisplayImage>,
}

/// Decorate a line with its display image.
///
/// A line's own `image_url` always wins. Otherwise the image is resolved
/// from `product`, which must be the line's product; a missing or mismatched
/// product renders without an image.
#[must_use]
pub fn render_line(line: &CartLine, product: Option<&Product>) -> RenderedCartLine {
    let display_image = match &line.image_url {
        Some(url) => Some(DisplayImage {
            url: url.clone(),
            source: ImageSource::Line,
        }),
        None => product
            .filter(|product| product.uuid == line.product_uuid)
            .and_then(|product| resolve_with_tier(product, &line.asset_ref()))
            .map(|resolution| DisplayImage {
                url: resolution.record.url().to_string(),
                source: ImageSource::Resolved(resolution.tier),
            }),
    };

    RenderedCartLine {
        line: line.clone(),
        display_image,
    }
}

/// Decorate every line, looking products up in `products`.
#[must_use]
pub fn render_lines(
    lines: &[CartLine],
    products: &FxHashMap<ProductUuid, Product>,
) -> Vec<RenderedCartLine> {
    lines
        .iter()
        .map(|line| render_line(line, products.get(&line.product_uuid)))
        .collect()
}
