//! Display asset resolution across every fallback tier

use proptest::prelude::*;
use testresult::TestResult;
use vitrine::{
    fixtures::{asset, new_record, persisted_variant, product},
    media::{MediaError, MediaRecord},
    products::Product,
    resolution::{AssetRef, Tier, resolve_display_asset, resolve_with_tier},
    variants::VariantUuid,
};

/// Two persisted variants, "Red" in S/M and "Blue" in L, with product-level,
/// variant-bound and colour-tagged records.
fn catalog() -> Result<Product, MediaError> {
    let mut red = persisted_variant(&["S", "M"]);
    red.color_name = Some("Red".to_string());

    let mut blue = persisted_variant(&["L"]);
    blue.color_name = Some("Blue".to_string());

    let mut product = product(vec![red, blue]);
    product.media.attach(
        vec![
            new_record("hero"),
            new_record("red-front").for_variant_index(0),
            new_record("blue-front").for_variant_index(1),
            new_record("blue-medium").for_variant_index(1).with_size("M"),
            new_record("green-swatch").with_color("Green"),
        ],
        &product.variants.clone(),
    )?;

    Ok(product)
}

fn resolved(product: &Product, asset_ref: &AssetRef) -> Option<(Tier, String)> {
    resolve_with_tier(product, asset_ref)
        .map(|resolution| (resolution.tier, resolution.record.public_id().to_string()))
}

fn variant_uuid(product: &Product, index: usize) -> Result<VariantUuid, &'static str> {
    product
        .variants
        .get(index)
        .and_then(|variant| variant.uuid)
        .ok_or("variant should be persisted")
}

#[test]
fn tiers_are_attempted_in_order() -> TestResult {
    let product = catalog()?;
    let blue = variant_uuid(&product, 1)?;

    let cases = [
        (AssetRef::index(1).with_color("green"), Tier::VariantIndex, "blue-front"),
        (AssetRef::default().with_size("s"), Tier::Size, "red-front"),
        (AssetRef::variant(blue), Tier::VariantUuid, "blue-front"),
        (AssetRef::default().with_color("GREEN"), Tier::ColorName, "green-swatch"),
        (AssetRef::default().with_color("red"), Tier::ColorName, "red-front"),
        (AssetRef::default().with_size("XXL"), Tier::Primary, "hero"),
        (AssetRef::default(), Tier::Primary, "hero"),
    ];

    for (asset_ref, tier, public_id) in cases {
        assert_eq!(
            resolved(&product, &asset_ref),
            Some((tier, public_id.to_string())),
            "resolving {asset_ref:?}"
        );
    }

    Ok(())
}

#[test]
fn own_media_beats_product_records() -> TestResult {
    let mut product = catalog()?;
    let blue = variant_uuid(&product, 1)?;

    if let Some(variant) = product.variants.get_mut(1) {
        variant.media.push(MediaRecord {
            asset: asset("blue-own"),
            is_primary: false,
            variant_uuid: None,
            variant_index: None,
            size: None,
            color_name: None,
        });
    }

    assert_eq!(
        resolved(&product, &AssetRef::variant(blue)),
        Some((Tier::VariantOwnMedia, "blue-own".to_string()))
    );

    Ok(())
}

#[test]
fn size_scoped_records_only_match_their_size() -> TestResult {
    let mut product = catalog()?;
    if let Some(variant) = product.variants.get_mut(1) {
        variant.sizes.push("M".to_string());
    }

    // Red offers M and has only an unscoped record; it is scanned first.
    assert_eq!(
        resolved(&product, &AssetRef::default().with_size("M")),
        Some((Tier::Size, "red-front".to_string()))
    );

    Ok(())
}

#[test]
fn primary_wins_within_a_tier() -> TestResult {
    let mut product = catalog()?;
    product.media.set_primary(&"blue-medium".into())?;

    assert_eq!(
        resolved(&product, &AssetRef::index(1)),
        Some((Tier::VariantIndex, "blue-medium".to_string()))
    );

    Ok(())
}

#[test]
fn stale_references_still_resolve() -> TestResult {
    let product = catalog()?;
    let stale = AssetRef::variant(VariantUuid::new())
        .with_size("gone")
        .with_color("mauve");

    assert_eq!(
        resolved(&product, &AssetRef {
            variant_index: Some(9),
            ..stale
        }),
        Some((Tier::Primary, "hero".to_string()))
    );

    Ok(())
}

#[test]
fn no_media_resolves_to_none() {
    let product = product(vec![persisted_variant(&["S"])]);

    assert_eq!(resolve_display_asset(&product, &AssetRef::index(0)), None);
}

fn asset_ref() -> impl Strategy<Value = AssetRef> {
    (
        prop::option::of(0_usize..4),
        prop::option::of(prop::sample::select(vec!["S", "m", "L", "XL"])),
        prop::option::of(prop::sample::select(vec!["red", "BLUE", "Green", "mauve"])),
        any::<bool>(),
    )
        .prop_map(|(variant_index, size, color_name, stale_uuid)| AssetRef {
            variant_uuid: stale_uuid.then(VariantUuid::new),
            variant_index,
            size: size.map(str::to_string),
            color_name: color_name.map(str::to_string),
        })
}

proptest! {
    #[test]
    fn resolution_is_total_and_deterministic(asset_ref in asset_ref()) {
        let product = catalog().map_err(|e| TestCaseError::fail(e.to_string()))?;

        let first = resolve_display_asset(&product, &asset_ref);
        let second = resolve_display_asset(&product, &asset_ref);

        prop_assert!(first.is_some());
        prop_assert_eq!(first, second);
    }
}
