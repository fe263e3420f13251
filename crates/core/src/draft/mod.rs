//! Drafts
//!
//! A draft is an immutable value: the last confirmed product plus the edits
//! made on top of it. Every action returns a new draft and leaves the one it
//! was called on untouched, so a rejected action needs no rollback. Rebases
//! fold a store response into the draft, keeping whatever work the store has
//! not seen yet.

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::{
    media::{MediaError, MediaRecord, MediaSelector, NewMediaRecord, PublicId},
    products::Product,
    variants::{
        self, RemovedVariant, SizeToggle, Variant, VariantKey, VariantPatch, VariantSpec,
        VariantUuid,
    },
};

mod errors;
mod order;

pub use errors::EditError;
pub use order::{MediaScope, compose_media_order};

/// What has to be sent to the store to make its media match the draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaPlan {
    /// The store already matches.
    Unchanged,

    /// Only the primary designation differs.
    Primary(PublicId),

    /// Order or references differ; the full list must be submitted.
    Replace(Vec<MediaRecord>),
}

/// An administrator's edit buffer for one product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    snapshot: Arc<Product>,
    working: Product,
    staged: Vec<PublicId>,
    reordered: Vec<(MediaScope, Vec<PublicId>)>,
    primary: Option<PublicId>,
}

impl Draft {
    /// Start a clean draft from a confirmed product.
    #[must_use]
    pub fn new(confirmed: Product) -> Self {
        Self {
            working: confirmed.clone(),
            snapshot: Arc::new(confirmed),
            staged: Vec::new(),
            reordered: Vec::new(),
            primary: None,
        }
    }

    /// The last confirmed product.
    #[must_use]
    pub fn snapshot(&self) -> &Product {
        &self.snapshot
    }

    /// The product as edited.
    #[must_use]
    pub fn working(&self) -> &Product {
        &self.working
    }

    /// Public ids uploaded in this draft and not yet attached in the store.
    #[must_use]
    pub fn staged(&self) -> &[PublicId] {
        &self.staged
    }

    /// Locally reordered groups.
    #[must_use]
    pub fn reordered(&self) -> &[(MediaScope, Vec<PublicId>)] {
        &self.reordered
    }

    /// Primary chosen in this draft, if any.
    #[must_use]
    pub fn pending_primary(&self) -> Option<&PublicId> {
        self.primary.as_ref()
    }

    /// Whether the draft holds work the store has not seen.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.working != *self.snapshot || !self.staged.is_empty()
    }

    /// Append a variant.
    ///
    /// # Errors
    ///
    /// Returns `EditError::Variant` when the new variant fails validation.
    pub fn add_variant(&self, spec: VariantSpec) -> Result<(Self, VariantKey), EditError> {
        self.edit(|draft| Ok(variants::add_variant(&mut draft.working, spec)?))
    }

    /// Add or remove a size on the keyed variant.
    ///
    /// # Errors
    ///
    /// Returns `EditError::Variant` for an unknown key or when the last size
    /// of a size-bearing variant would be removed.
    pub fn toggle_size(&self, key: VariantKey, size: &str) -> Result<(Self, SizeToggle), EditError> {
        self.edit(|draft| {
            let index = variants::locate(&draft.working, key)?;

            Ok(variants::toggle_size(&mut draft.working, index, size)?)
        })
    }

    /// Patch the keyed variant.
    ///
    /// # Errors
    ///
    /// Returns `EditError::Variant` for an unknown key or an invalid patch.
    pub fn update_variant(&self, key: VariantKey, patch: VariantPatch) -> Result<Self, EditError> {
        self.edit(|draft| {
            let index = variants::locate(&draft.working, key)?;

            Ok(variants::update_variant(&mut draft.working, index, patch)?)
        })
        .map(|(draft, ())| draft)
    }

    /// Remove the keyed variant together with the media bound to it.
    ///
    /// # Errors
    ///
    /// Returns `EditError::Variant` for an unknown key.
    pub fn remove_variant(&self, key: VariantKey) -> Result<(Self, RemovedVariant), EditError> {
        self.edit(|draft| {
            let index = variants::locate(&draft.working, key)?;
            let removed_key = draft
                .working
                .variants
                .get(index)
                .map_or(key, |variant| variant.key(index));

            let removed = variants::remove_variant(&mut draft.working, index)?;

            draft.reordered = std::mem::take(&mut draft.reordered)
                .into_iter()
                .filter_map(|(scope, order)| match scope {
                    MediaScope::Variant(own) if own == removed_key => None,
                    MediaScope::Variant(own) => own
                        .after_removal(index)
                        .map(|own| (MediaScope::Variant(own), order)),
                    MediaScope::Product => Some((scope, order)),
                })
                .collect();

            for record in &removed.detached {
                draft.forget(record.public_id());
            }

            Ok(removed)
        })
    }

    /// Attach freshly uploaded records.
    ///
    /// # Errors
    ///
    /// Returns `EditError::Media` when the batch is empty, repeats an
    /// attached public id or references an unknown variant.
    pub fn stage_media(&self, records: Vec<NewMediaRecord>) -> Result<Self, EditError> {
        self.edit(|draft| {
            let ids: Vec<PublicId> = records
                .iter()
                .map(|record| record.asset.public_id.clone())
                .collect();

            draft.working.media.attach(records, &draft.working.variants)?;
            draft.staged.extend(ids);

            Ok(())
        })
        .map(|(draft, ())| draft)
    }

    /// Remove a record.
    ///
    /// # Errors
    ///
    /// Returns `EditError::Media` when no record has the public id.
    pub fn remove_media(&self, public_id: &PublicId) -> Result<(Self, MediaRecord), EditError> {
        self.edit(|draft| {
            let removed = draft.working.media.detach(public_id)?;
            draft.forget(public_id);

            Ok(removed)
        })
    }

    /// Designate the primary record.
    ///
    /// # Errors
    ///
    /// Returns a not-found `EditError::Media` when the selector matches
    /// nothing.
    pub fn set_primary(&self, selector: &MediaSelector) -> Result<Self, EditError> {
        self.edit(|draft| {
            draft.working.media.set_primary(selector)?;
            draft.primary = draft
                .working
                .media
                .primary()
                .map(|record| record.public_id().clone());

            Ok(())
        })
        .map(|(draft, ())| draft)
    }

    /// Reorder the records of one scope; the first of `order` becomes
    /// primary.
    ///
    /// # Errors
    ///
    /// Returns `EditError::Media` when `order` is empty or is not a
    /// permutation of the scope's records.
    pub fn reorder_media(&self, scope: MediaScope, order: Vec<PublicId>) -> Result<Self, EditError> {
        self.edit(|draft| {
            let first = order.first().cloned().ok_or(MediaError::Empty)?;
            let members = order::scope_members(
                draft.working.media.records(),
                &draft.working.variants,
                scope,
            );

            let unique: FxHashSet<&PublicId> = order.iter().collect();
            let permutation = unique.len() == order.len()
                && members.len() == order.len()
                && members.iter().all(|member| unique.contains(member));

            if !permutation {
                return Err(MediaError::NotAPermutation.into());
            }

            draft.reordered.retain(|(own, _)| *own != scope);
            draft.reordered.push((scope, order));
            draft.primary = Some(first);

            Ok(())
        })
        .map(|(draft, ())| draft)
    }

    /// Records confirmed in the store that the draft has dropped.
    #[must_use]
    pub fn removed_media(&self) -> Vec<MediaRecord> {
        self.snapshot
            .media
            .iter()
            .filter(|record| self.working.media.get(record.public_id()).is_none())
            .cloned()
            .collect()
    }

    /// Whether the variant list differs from the confirmed one.
    #[must_use]
    pub fn variants_changed(&self) -> bool {
        self.working.variants != self.snapshot.variants
    }

    /// The complete variant list to submit.
    #[must_use]
    pub fn variant_payload(&self) -> Vec<Variant> {
        self.working.variants.clone()
    }

    /// Staged records, in list order, ready to attach in the store.
    #[must_use]
    pub fn staged_records(&self) -> Vec<NewMediaRecord> {
        self.working
            .media
            .iter()
            .filter(|record| self.staged.contains(record.public_id()))
            .cloned()
            .map(NewMediaRecord::from)
            .collect()
    }

    /// Compare the confirmed media with the working media.
    #[must_use]
    pub fn media_plan(&self) -> MediaPlan {
        let stored = self.snapshot.media.records();
        let local = self.working.media.records();

        if stored == local {
            return MediaPlan::Unchanged;
        }

        let only_primary_moved = stored.len() == local.len()
            && stored
                .iter()
                .zip(local)
                .all(|(stored, local)| same_apart_from_primary(stored, local));

        match self.working.media.primary() {
            Some(primary) if only_primary_moved => {
                MediaPlan::Primary(primary.public_id().clone())
            }
            _ => MediaPlan::Replace(local.to_vec()),
        }
    }

    /// Adopt a store response that left the working copy's intent intact.
    #[must_use]
    pub fn rebase_confirmed(mut self, confirmed: Product) -> Self {
        self.snapshot = Arc::new(confirmed);
        self
    }

    /// Adopt the store's answer to a variant persist.
    ///
    /// Working variants at minted positions take their new durable id,
    /// positional media references are upgraded to match, and reordered
    /// groups are re-keyed. Edits made while the persist was in flight are
    /// kept.
    #[must_use]
    pub fn rebase_variants(
        mut self,
        confirmed: Product,
        minted: &FxHashMap<usize, VariantUuid>,
    ) -> Self {
        for (index, uuid) in minted {
            if let Some(variant) = self.working.variants.get_mut(*index)
                && variant.uuid.is_none()
            {
                variant.uuid = Some(*uuid);
            }
        }

        self.working.media.reassign_variant_references(minted);

        for (scope, _) in &mut self.reordered {
            if let MediaScope::Variant(key) = scope {
                *key = key.upgrade(minted);
            }
        }

        self.snapshot = Arc::new(confirmed);
        self
    }

    /// Adopt the store's answer to attaching the staged records.
    #[must_use]
    pub fn rebase_staged(mut self, confirmed: Product) -> Self {
        self.staged.clear();
        self.snapshot = Arc::new(confirmed);
        self
    }

    fn edit<T>(
        &self,
        action: impl FnOnce(&mut Self) -> Result<T, EditError>,
    ) -> Result<(Self, T), EditError> {
        let mut draft = self.clone();
        let outcome = action(&mut draft)?;

        draft.recompose()?;

        Ok((draft, outcome))
    }

    fn forget(&mut self, public_id: &PublicId) {
        self.staged.retain(|own| own != public_id);

        for (_, order) in &mut self.reordered {
            order.retain(|own| own != public_id);
        }

        self.reordered.retain(|(_, order)| !order.is_empty());

        if self.primary.as_ref() == Some(public_id) {
            self.primary = None;
        }
    }

    fn recompose(&mut self) -> Result<(), EditError> {
        if self.reordered.is_empty() {
            return Ok(());
        }

        let order = compose_media_order(
            self.working.media.records(),
            &self.working.variants,
            &self.reordered,
        );

        self.working.media.reorder(&order)?;

        if let Some(primary) = &self.primary {
            self.working
                .media
                .set_primary(&MediaSelector::PublicId(primary.clone()))?;
        }

        Ok(())
    }
}

fn same_apart_from_primary(left: &MediaRecord, right: &MediaRecord) -> bool {
    left.asset == right.asset
        && left.variant_uuid == right.variant_uuid
        && left.variant_index == right.variant_index
        && left.size == right.size
        && left.color_name == right.color_name
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::{
        fixtures::{draft_variant, new_record, persisted_variant, product, spec},
        variants::VariantError,
    };

    use super::*;

    fn ids(product: &Product) -> Vec<&str> {
        product
            .media
            .iter()
            .map(|record| record.public_id().as_str())
            .collect()
    }

    fn primary(product: &Product) -> Option<&str> {
        product.media.primary().map(|record| record.public_id().as_str())
    }

    fn confirmed() -> Result<Product, MediaError> {
        let mut product = product(vec![persisted_variant(&["S"]), persisted_variant(&["M"])]);
        product.media.attach(
            vec![
                new_record("p"),
                new_record("s1").for_variant_index(0),
                new_record("s2").for_variant_index(0),
                new_record("m1").for_variant_index(1),
            ],
            &product.variants.clone(),
        )?;

        Ok(product)
    }

    #[test]
    fn new_draft_is_clean() -> TestResult {
        let draft = Draft::new(confirmed()?);

        assert!(!draft.is_dirty(), "fresh draft should be clean");
        assert_eq!(draft.media_plan(), MediaPlan::Unchanged);
        assert!(draft.removed_media().is_empty());

        Ok(())
    }

    #[test]
    fn rejected_action_leaves_the_draft_alone() -> TestResult {
        let draft = Draft::new(confirmed()?);
        let before = draft.clone();

        let result = draft.toggle_size(VariantKey::positional(0), "S");

        assert!(
            matches!(result, Err(EditError::Variant(VariantError::LastSize(_)))),
            "expected LastSize, got {result:?}"
        );
        assert_eq!(draft, before);

        Ok(())
    }

    #[test]
    fn added_variant_is_addressed_positionally() -> TestResult {
        let draft = Draft::new(confirmed()?);

        let (draft, key) = draft.add_variant(spec(&["L"]))?;
        let (draft, toggle) = draft.toggle_size(key, "XL")?;

        assert_eq!(key, VariantKey::positional(2));
        assert_eq!(toggle, SizeToggle::Added);
        assert!(draft.variants_changed(), "variant list should differ");

        Ok(())
    }

    #[test]
    fn staged_media_is_tracked_until_rebased() -> TestResult {
        let draft = Draft::new(confirmed()?);

        let draft = draft.stage_media(vec![new_record("new").for_variant_index(1)])?;

        assert_eq!(draft.staged(), [PublicId::from("new")]);
        assert_eq!(draft.staged_records().len(), 1);

        let confirmed = draft.working().clone();
        let draft = draft.rebase_staged(confirmed);

        assert!(draft.staged().is_empty());
        assert!(!draft.is_dirty(), "store now matches the draft");

        Ok(())
    }

    #[test]
    fn removing_staged_media_forgets_it() -> TestResult {
        let draft = Draft::new(confirmed()?).stage_media(vec![new_record("new")])?;

        let (draft, removed) = draft.remove_media(&"new".into())?;

        assert_eq!(removed.public_id().as_str(), "new");
        assert!(draft.staged().is_empty());
        assert!(draft.removed_media().is_empty(), "never confirmed");

        Ok(())
    }

    #[test]
    fn removing_confirmed_media_is_reported() -> TestResult {
        let draft = Draft::new(confirmed()?);

        let (draft, _) = draft.remove_media(&"p".into())?;

        let removed: Vec<String> = draft
            .removed_media()
            .iter()
            .map(|record| record.public_id().to_string())
            .collect();

        assert_eq!(removed, ["p"]);
        assert_eq!(primary(draft.working()), Some("s1"));

        Ok(())
    }

    #[test]
    fn primary_only_change_is_planned_as_a_selection() -> TestResult {
        let draft = Draft::new(confirmed()?);

        let draft = draft.set_primary(&MediaSelector::Index(3))?;

        assert_eq!(draft.media_plan(), MediaPlan::Primary("m1".into()));

        Ok(())
    }

    #[test]
    fn set_primary_out_of_range_is_not_found() -> TestResult {
        let draft = Draft::new(confirmed()?);

        let result = draft.set_primary(&MediaSelector::Index(9));

        assert!(matches!(result, Err(ref e) if e.is_not_found()), "got {result:?}");

        Ok(())
    }

    #[test]
    fn reordering_a_group_recomposes_the_list() -> TestResult {
        let product = confirmed()?;
        let small = product.variants.first().map(|v| v.key(0)).ok_or("missing variant")?;
        let draft = Draft::new(product);

        let draft = draft.reorder_media(
            MediaScope::Variant(small),
            vec!["s2".into(), "s1".into()],
        )?;

        assert_eq!(ids(draft.working()), ["s2", "s1", "p", "m1"]);
        assert_eq!(primary(draft.working()), Some("s2"));
        assert!(
            matches!(draft.media_plan(), MediaPlan::Replace(ref records) if records.len() == 4),
            "reorder should submit the full list"
        );

        Ok(())
    }

    #[test]
    fn reorder_must_cover_the_whole_scope() -> TestResult {
        let product = confirmed()?;
        let small = product.variants.first().map(|v| v.key(0)).ok_or("missing variant")?;
        let draft = Draft::new(product);

        for order in [vec![], vec!["s1".into()], vec!["s1".into(), "m1".into()]] {
            let result = draft.reorder_media(MediaScope::Variant(small), order);

            assert!(result.is_err(), "partial order should be rejected");
        }

        Ok(())
    }

    #[test]
    fn primary_survives_later_edits() -> TestResult {
        let product = confirmed()?;
        let small = product.variants.first().map(|v| v.key(0)).ok_or("missing variant")?;

        let draft = Draft::new(product)
            .reorder_media(MediaScope::Variant(small), vec!["s2".into(), "s1".into()])?
            .set_primary(&MediaSelector::PublicId("m1".into()))?
            .stage_media(vec![new_record("late")])?;

        assert_eq!(primary(draft.working()), Some("m1"));
        assert_eq!(ids(draft.working()), ["s2", "s1", "p", "m1", "late"]);

        Ok(())
    }

    #[test]
    fn removing_a_variant_rekeys_reordered_groups() -> TestResult {
        let mut base = product(vec![
            draft_variant(&["S"]),
            draft_variant(&["M"]),
            draft_variant(&["L"]),
        ]);
        base.media.attach(
            vec![
                new_record("s").for_variant_index(0),
                new_record("l1").for_variant_index(2),
                new_record("l2").for_variant_index(2),
            ],
            &base.variants.clone(),
        )?;

        let draft = Draft::new(base).reorder_media(
            MediaScope::Variant(VariantKey::positional(2)),
            vec!["l2".into(), "l1".into()],
        )?;

        let (draft, removed) = draft.remove_variant(VariantKey::positional(0))?;

        assert_eq!(removed.detached.len(), 1);
        assert_eq!(
            draft.reordered().first().map(|(scope, _)| *scope),
            Some(MediaScope::Variant(VariantKey::positional(1)))
        );
        assert_eq!(ids(draft.working()), ["l2", "l1"]);
        assert!(
            draft.working().media.iter().all(|r| r.variant_index == Some(1)),
            "large records should follow their variant"
        );

        Ok(())
    }

    #[test]
    fn removing_a_reordered_variant_drops_its_group() -> TestResult {
        let product = confirmed()?;
        let small = product.variants.first().map(|v| v.key(0)).ok_or("missing variant")?;

        let draft = Draft::new(product)
            .reorder_media(MediaScope::Variant(small), vec!["s2".into(), "s1".into()])?;

        let (draft, removed) = draft.remove_variant(small)?;

        assert_eq!(removed.detached.len(), 2);
        assert!(draft.reordered().is_empty());
        assert_eq!(draft.pending_primary(), None);
        assert_eq!(draft.removed_media().len(), 2);

        Ok(())
    }

    #[test]
    fn rebase_variants_upgrades_positional_state() -> TestResult {
        let draft = Draft::new(product(Vec::new()));
        let (draft, key) = draft.add_variant(spec(&["S"]))?;
        let draft = draft
            .stage_media(vec![
                new_record("a").for_variant_index(0),
                new_record("b").for_variant_index(0),
            ])?
            .reorder_media(MediaScope::Variant(key), vec!["b".into(), "a".into()])?;

        let uuid = VariantUuid::new();
        let mut confirmed = draft.snapshot().clone();
        confirmed.variants = draft.variant_payload();
        for variant in &mut confirmed.variants {
            variant.uuid = Some(uuid);
        }

        let draft = draft.rebase_variants(confirmed, &FxHashMap::from_iter([(0, uuid)]));

        assert!(
            draft.working().media.iter().all(|r| r.variant_uuid == Some(uuid)),
            "staged records should carry the minted id"
        );
        assert_eq!(
            draft.reordered().first().map(|(scope, _)| *scope),
            Some(MediaScope::Variant(VariantKey::durable(uuid)))
        );
        assert!(!draft.variants_changed(), "variants are confirmed");

        Ok(())
    }

    #[test]
    fn rebase_variants_keeps_edits_made_while_persisting() -> TestResult {
        let (draft, key) = Draft::new(product(Vec::new())).add_variant(spec(&["S"]))?;
        let payload = draft.variant_payload();
        let (draft, _) = draft.toggle_size(key, "M")?;

        let uuid = VariantUuid::new();
        let mut confirmed = draft.snapshot().clone();
        confirmed.variants = payload;
        for variant in &mut confirmed.variants {
            variant.uuid = Some(uuid);
        }

        let draft = draft.rebase_variants(confirmed, &FxHashMap::from_iter([(0, uuid)]));
        let variant = draft.working().variants.first().ok_or("variant kept")?;

        assert_eq!(variant.uuid, Some(uuid));
        assert!(variant.has_size("M"), "the in-flight toggle should survive");
        assert!(draft.variants_changed(), "the toggle is not confirmed yet");

        Ok(())
    }
}
