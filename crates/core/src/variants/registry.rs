//! Variant registry operations.
//!
//! Every operation works on a whole [`Product`] so that media bound to a
//! variant can be kept consistent with the variant list.

use rustc_hash::FxHashMap;

use crate::{
    media::MediaRecord,
    products::{Product, Sizing},
    variants::{Variant, VariantError, VariantKey, VariantPatch, VariantSpec, VariantUuid},
};

/// Outcome of toggling a size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeToggle {
    /// The size was added to the variant.
    Added,

    /// The size was removed from the variant.
    Removed,
}

/// A variant removed from a product, with the media that was bound to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedVariant {
    /// The removed variant.
    pub variant: Variant,

    /// Records detached because they were bound only to this variant.
    pub detached: Vec<MediaRecord>,
}

/// Check a single variant against the product's sizing rules.
///
/// # Errors
///
/// Returns a `VariantError` for a missing size, a zero price, or an invalid
/// sale price.
pub fn validate_variant(sizing: Sizing, variant: &Variant) -> Result<(), VariantError> {
    if sizing == Sizing::SizeBearing && variant.sizes.is_empty() {
        return Err(VariantError::MissingSize);
    }

    if variant.price == 0 {
        return Err(VariantError::NonPositivePrice);
    }

    match variant.sale_price {
        Some(sale_price) if sale_price == 0 || sale_price > variant.price => {
            Err(VariantError::InvalidSalePrice {
                sale_price,
                price: variant.price,
            })
        }
        _ => Ok(()),
    }
}

/// Check every variant of a product before a persist.
///
/// # Errors
///
/// Returns the first `VariantError` found, in list order.
pub fn validate_variants(product: &Product) -> Result<(), VariantError> {
    product
        .variants
        .iter()
        .try_for_each(|variant| validate_variant(product.sizing, variant))
}

/// Find the position of the variant behind `key`.
///
/// # Errors
///
/// Returns `VariantError::KeyNotFound` when no variant matches.
pub fn locate(product: &Product, key: VariantKey) -> Result<usize, VariantError> {
    key.locate(&product.variants)
        .ok_or(VariantError::KeyNotFound(key))
}

/// Append a draft-only variant, returning its positional key.
///
/// # Errors
///
/// Returns a `VariantError` when the new variant fails validation; the
/// product is left untouched.
pub fn add_variant(product: &mut Product, spec: VariantSpec) -> Result<VariantKey, VariantError> {
    let variant = spec.into_variant();

    validate_variant(product.sizing, &variant)?;

    product.variants.push(variant);

    Ok(VariantKey::positional(product.variants.len() - 1))
}

/// Add `size` to the variant at `index`, or remove it when already present.
///
/// # Errors
///
/// Returns `VariantError::IndexNotFound` for an unknown variant,
/// `VariantError::MissingSize` for a blank label, and
/// `VariantError::LastSize` when a size-bearing variant would be left with
/// no sizes.
pub fn toggle_size(
    product: &mut Product,
    index: usize,
    size: &str,
) -> Result<SizeToggle, VariantError> {
    let sizing = product.sizing;
    let size = size.trim();

    if size.is_empty() {
        return Err(VariantError::MissingSize);
    }

    let variant = product
        .variants
        .get_mut(index)
        .ok_or(VariantError::IndexNotFound(index))?;

    let Some(position) = variant
        .sizes
        .iter()
        .position(|own| own.eq_ignore_ascii_case(size))
    else {
        variant.sizes.push(size.to_string());

        return Ok(SizeToggle::Added);
    };

    if sizing == Sizing::SizeBearing && variant.sizes.len() == 1 {
        return Err(VariantError::LastSize(variant.key(index)));
    }

    variant.sizes.remove(position);

    Ok(SizeToggle::Removed)
}

/// Apply a patch to the variant at `index`.
///
/// # Errors
///
/// Returns a `VariantError` for an unknown variant or when the patched
/// variant fails validation; the variant is left untouched.
pub fn update_variant(
    product: &mut Product,
    index: usize,
    patch: VariantPatch,
) -> Result<(), VariantError> {
    let sizing = product.sizing;
    let variant = product
        .variants
        .get_mut(index)
        .ok_or(VariantError::IndexNotFound(index))?;

    let mut patched = variant.clone();
    patch.apply(&mut patched);

    validate_variant(sizing, &patched)?;

    *variant = patched;

    Ok(())
}

/// Remove the variant at `index`.
///
/// Media bound to the variant is detached first, then the variant leaves the
/// list and positional references of later variants are shifted down.
///
/// # Errors
///
/// Returns `VariantError::IndexNotFound` for an unknown variant.
pub fn remove_variant(product: &mut Product, index: usize) -> Result<RemovedVariant, VariantError> {
    let uuid = product
        .variants
        .get(index)
        .ok_or(VariantError::IndexNotFound(index))?
        .uuid;

    let detached = product.media.detach_variant(index, uuid);
    let variant = product.variants.remove(index);

    product
        .media
        .retarget_after_removal(index, &product.variants);

    Ok(RemovedVariant { variant, detached })
}

/// Collect the durable ids the store minted for a full-replace payload.
///
/// # Errors
///
/// Returns `VariantError::PersistMismatch` when the store did not answer with
/// one variant per submitted variant.
pub fn minted_ids(
    submitted: &[Variant],
    persisted: &[Variant],
) -> Result<FxHashMap<usize, VariantUuid>, VariantError> {
    if submitted.len() != persisted.len() {
        return Err(VariantError::PersistMismatch {
            expected: submitted.len(),
            actual: persisted.len(),
        });
    }

    Ok(submitted
        .iter()
        .zip(persisted)
        .enumerate()
        .filter_map(|(index, (before, after))| match (before.uuid, after.uuid) {
            (None, Some(uuid)) => Some((index, uuid)),
            _ => None,
        })
        .collect())
}

/// Adopt the store's answer to a full replace of `product.variants` and
/// upgrade positional media references to the minted ids.
///
/// # Errors
///
/// Returns `VariantError::PersistMismatch` when the store's answer does not
/// line up with the submitted list; the product is left untouched.
pub fn apply_persisted(
    product: &mut Product,
    persisted: Vec<Variant>,
) -> Result<FxHashMap<usize, VariantUuid>, VariantError> {
    let minted = minted_ids(&product.variants, &persisted)?;

    product.variants = persisted;
    product.media.reassign_variant_references(&minted);

    Ok(minted)
}
