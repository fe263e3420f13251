//! Product Fixtures

use crate::{
    products::{Product, ProductUuid},
    variants::{Sizes, Variant, VariantSpec, VariantUuid},
};

/// An empty-media, size-bearing product holding `variants`.
pub fn product(variants: Vec<Variant>) -> Product {
    let mut product = Product::new(ProductUuid::new(), "Linen Shirt", 4_500);
    product.variants = variants;
    product
}

/// A variant that only exists in a draft: no durable id, 10 in stock,
/// priced at 1500.
pub fn draft_variant(sizes: &[&str]) -> Variant {
    Variant {
        uuid: None,
        sizes: sizes.iter().map(ToString::to_string).collect::<Sizes>(),
        color_name: None,
        sku: None,
        stock: 10,
        price: 1_500,
        sale_price: None,
        media: Vec::new(),
    }
}

/// Like [`draft_variant`] but already carrying a durable id.
pub fn persisted_variant(sizes: &[&str]) -> Variant {
    Variant {
        uuid: Some(VariantUuid::new()),
        ..draft_variant(sizes)
    }
}

/// A valid variant spec priced at 1500.
pub fn spec(sizes: &[&str]) -> VariantSpec {
    VariantSpec {
        sizes: sizes.iter().map(ToString::to_string).collect(),
        stock: 10,
        price: 1_500,
        ..VariantSpec::default()
    }
}
