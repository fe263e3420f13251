//! Resolution matchers, one per tier.

use crate::{
    media::MediaRecord,
    products::Product,
    resolution::{AssetRef, Tier},
};

type Matcher = for<'p> fn(&'p Product, &AssetRef) -> Option<&'p MediaRecord>;

/// Matchers in the order they are attempted.
pub(super) const STRATEGY: [(Tier, Matcher); 7] = [
    (Tier::VariantIndex, by_variant_index),
    (Tier::VariantOwnMedia, by_variant_own_media),
    (Tier::Size, by_size),
    (Tier::VariantUuid, by_variant_uuid),
    (Tier::ColorName, by_color_name),
    (Tier::Primary, primary),
    (Tier::First, first),
];

/// Prefer the primary candidate, otherwise the first one.
fn pick<'p>(candidates: impl IntoIterator<Item = &'p MediaRecord>) -> Option<&'p MediaRecord> {
    let mut first = None;

    for candidate in candidates {
        if candidate.is_primary {
            return Some(candidate);
        }

        first = first.or(Some(candidate));
    }

    first
}

fn same_color(left: &str, right: &str) -> bool {
    left.chars()
        .flat_map(char::to_lowercase)
        .eq(right.chars().flat_map(char::to_lowercase))
}

fn by_variant_index<'p>(product: &'p Product, asset_ref: &AssetRef) -> Option<&'p MediaRecord> {
    let index = asset_ref.variant_index?;

    pick(
        product
            .media
            .iter()
            .filter(|record| record.variant_index == Some(index)),
    )
}

fn by_variant_own_media<'p>(product: &'p Product, asset_ref: &AssetRef) -> Option<&'p MediaRecord> {
    let uuid = asset_ref.variant_uuid?;
    let variant = product.variants.iter().find(|v| v.uuid == Some(uuid))?;

    pick(&variant.media)
}

fn by_size<'p>(product: &'p Product, asset_ref: &AssetRef) -> Option<&'p MediaRecord> {
    let size = asset_ref.size.as_deref()?;

    let candidates = product
        .variants
        .iter()
        .enumerate()
        .filter(|(_, variant)| variant.has_size(size))
        .flat_map(move |(index, variant)| {
            let bound = product
                .media
                .bound_to(index, variant.uuid)
                .filter(move |record| {
                    record
                        .size
                        .as_deref()
                        .is_none_or(|own| own.eq_ignore_ascii_case(size))
                });

            variant.media.iter().chain(bound)
        });

    pick(candidates)
}

fn by_variant_uuid<'p>(product: &'p Product, asset_ref: &AssetRef) -> Option<&'p MediaRecord> {
    let uuid = asset_ref.variant_uuid?;

    pick(
        product
            .media
            .iter()
            .filter(|record| record.variant_uuid == Some(uuid)),
    )
}

fn by_color_name<'p>(product: &'p Product, asset_ref: &AssetRef) -> Option<&'p MediaRecord> {
    let color = asset_ref.color_name.as_deref()?;

    pick(product.media.iter().filter(|record| {
        let own = record.color_name.as_deref();
        let bound = record
            .bound_variant(&product.variants)
            .and_then(|variant| variant.color_name.as_deref());

        own.or(bound).is_some_and(|name| same_color(name, color))
    }))
}

fn primary<'p>(product: &'p Product, _asset_ref: &AssetRef) -> Option<&'p MediaRecord> {
    product.media.primary()
}

fn first<'p>(product: &'p Product, _asset_ref: &AssetRef) -> Option<&'p MediaRecord> {
    product.media.iter().next()
}
