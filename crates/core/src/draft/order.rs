//! Media ordering for drafts.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::{
    media::{MediaRecord, PublicId},
    variants::{EntityRef, Variant, VariantKey},
};

/// The group a record is reordered within.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaScope {
    /// Records not bound to any variant.
    Product,

    /// Records bound to one variant.
    Variant(VariantKey),
}

impl MediaScope {
    /// Scope of `record` within a product holding `variants`.
    pub fn of(record: &MediaRecord, variants: &[Variant]) -> Self {
        match record.entity_ref() {
            None => Self::Product,
            Some(EntityRef::ByDurableId(uuid)) => Self::Variant(VariantKey::durable(uuid)),
            Some(EntityRef::ByPosition(index)) => Self::Variant(
                variants
                    .get(index)
                    .map_or(VariantKey::positional(index), |variant| variant.key(index)),
            ),
        }
    }
}

/// Public ids of the records in `scope`, in list order.
pub(crate) fn scope_members<'r>(
    records: &'r [MediaRecord],
    variants: &[Variant],
    scope: MediaScope,
) -> Vec<&'r PublicId> {
    records
        .iter()
        .filter(|record| MediaScope::of(record, variants) == scope)
        .map(MediaRecord::public_id)
        .collect()
}

/// Compose the full media order from locally reordered groups.
///
/// Reordered variant groups come first, in variant order, followed by the
/// reordered product group and then every untouched record in its current
/// relative order. Ids in `reordered` that are no longer attached are
/// skipped, so the result is always a permutation of `records`.
pub fn compose_media_order(
    records: &[MediaRecord],
    variants: &[Variant],
    reordered: &[(MediaScope, Vec<PublicId>)],
) -> Vec<PublicId> {
    let attached: FxHashSet<&PublicId> = records.iter().map(MediaRecord::public_id).collect();
    let mut taken: FxHashSet<&PublicId> = FxHashSet::default();
    let mut order = Vec::with_capacity(records.len());

    let scopes = variants
        .iter()
        .enumerate()
        .map(|(index, variant)| MediaScope::Variant(variant.key(index)))
        .chain([MediaScope::Product]);

    for scope in scopes {
        let Some((_, group)) = reordered.iter().find(|(own, _)| *own == scope) else {
            continue;
        };

        for public_id in group {
            if attached.contains(public_id) && taken.insert(public_id) {
                order.push(public_id.clone());
            }
        }
    }

    for record in records {
        if taken.insert(record.public_id()) {
            order.push(record.public_id().clone());
        }
    }

    order
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::{
        fixtures::{draft_variant, new_record, persisted_variant},
        media::MediaTable,
    };

    use super::*;

    fn ids(order: &[PublicId]) -> Vec<&str> {
        order.iter().map(PublicId::as_str).collect()
    }

    #[test]
    fn scope_follows_the_variant_key() -> TestResult {
        let variants = [persisted_variant(&["S"]), draft_variant(&["M"])];
        let mut table = MediaTable::new();
        table.attach(
            vec![
                new_record("p"),
                new_record("a").for_variant_index(0),
                new_record("b").for_variant_index(1),
            ],
            &variants,
        )?;

        let scopes: Vec<MediaScope> = table
            .iter()
            .map(|record| MediaScope::of(record, &variants))
            .collect();

        let persisted = variants.first().map(|v| v.key(0)).ok_or("missing variant")?;

        assert_eq!(
            scopes,
            [
                MediaScope::Product,
                MediaScope::Variant(persisted),
                MediaScope::Variant(VariantKey::positional(1)),
            ]
        );

        Ok(())
    }

    #[test]
    fn groups_come_first_in_variant_order() -> TestResult {
        let variants = [draft_variant(&["S"]), draft_variant(&["M"])];
        let mut table = MediaTable::new();
        table.attach(
            vec![
                new_record("p"),
                new_record("s1").for_variant_index(0),
                new_record("m1").for_variant_index(1),
                new_record("m2").for_variant_index(1),
                new_record("s2").for_variant_index(0),
            ],
            &variants,
        )?;

        let reordered = [
            (
                MediaScope::Variant(VariantKey::positional(1)),
                vec!["m2".into(), "m1".into()],
            ),
            (
                MediaScope::Variant(VariantKey::positional(0)),
                vec!["s2".into(), "s1".into()],
            ),
        ];

        let order = compose_media_order(table.records(), &variants, &reordered);

        assert_eq!(ids(&order), ["s2", "s1", "m2", "m1", "p"]);

        Ok(())
    }

    #[test]
    fn stale_ids_are_skipped() -> TestResult {
        let mut table = MediaTable::new();
        table.attach(vec![new_record("a"), new_record("b")], &[])?;

        let reordered = [(
            MediaScope::Product,
            vec!["gone".into(), "b".into(), "a".into()],
        )];

        let order = compose_media_order(table.records(), &[], &reordered);

        assert_eq!(ids(&order), ["b", "a"]);

        Ok(())
    }
}
