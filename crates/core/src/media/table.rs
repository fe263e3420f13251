//! Media association table.

use std::{mem, slice::Iter};

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::{
    media::{MediaError, MediaRecord, MediaSelector, NewMediaRecord, PublicId},
    variants::{Variant, VariantUuid},
};

/// Ordered list of a product's media records.
///
/// Whenever the table is non-empty exactly one record is primary. Every
/// mutating operation either keeps that invariant or fails without touching
/// the table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaTable {
    records: Vec<MediaRecord>,
}

impl MediaTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from stored records, repairing the primary flag.
    ///
    /// The first flagged record stays primary; when none is flagged the first
    /// record is promoted.
    #[must_use]
    pub fn from_records(records: Vec<MediaRecord>) -> Self {
        let mut table = Self { records };
        table.normalize_primary();
        table
    }

    /// Records in list order.
    #[must_use]
    pub fn records(&self) -> &[MediaRecord] {
        &self.records
    }

    /// Consume the table, returning its records in list order.
    #[must_use]
    pub fn into_records(self) -> Vec<MediaRecord> {
        self.records
    }

    /// Iterate over the records in list order.
    pub fn iter(&self) -> Iter<'_, MediaRecord> {
        self.records.iter()
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The primary record, if any.
    #[must_use]
    pub fn primary(&self) -> Option<&MediaRecord> {
        self.records.iter().find(|record| record.is_primary)
    }

    /// Look up a record by public id.
    #[must_use]
    pub fn get(&self, public_id: &PublicId) -> Option<&MediaRecord> {
        self.records
            .iter()
            .find(|record| record.public_id() == public_id)
    }

    /// Position of a record by public id.
    #[must_use]
    pub fn position(&self, public_id: &PublicId) -> Option<usize> {
        self.records
            .iter()
            .position(|record| record.public_id() == public_id)
    }

    /// Records bound to the variant at `index` with durable id `uuid`.
    pub fn bound_to(
        &self,
        index: usize,
        uuid: Option<VariantUuid>,
    ) -> impl Iterator<Item = &MediaRecord> + '_ {
        self.records
            .iter()
            .filter(move |record| record.is_bound_to(index, uuid))
    }

    /// Append records, returning how many were attached.
    ///
    /// Positional references to persisted variants also receive the durable
    /// id; references to draft-only variants stay positional until the next
    /// persist. When the table was empty the first appended record becomes
    /// primary.
    ///
    /// # Errors
    ///
    /// Returns a `MediaError` when no records are supplied, when a public id
    /// is already attached, or when a variant reference does not exist.
    pub fn attach(
        &mut self,
        records: Vec<NewMediaRecord>,
        variants: &[Variant],
    ) -> Result<usize, MediaError> {
        if records.is_empty() {
            return Err(MediaError::Empty);
        }

        let mut seen: FxHashSet<&PublicId> = self.records.iter().map(MediaRecord::public_id).collect();

        for record in &records {
            if !seen.insert(&record.asset.public_id) {
                return Err(MediaError::Duplicate(record.asset.public_id.clone()));
            }

            if let Some(index) = record.variant_index
                && index >= variants.len()
            {
                return Err(MediaError::UnknownVariantIndex(index));
            }

            if let Some(uuid) = record.variant_uuid
                && !variants.iter().any(|variant| variant.uuid == Some(uuid))
            {
                return Err(MediaError::UnknownVariant(uuid));
            }
        }

        let was_empty = self.records.is_empty();
        let attached = records.len();

        for new in records {
            let mut record = new.into_record();

            match (record.variant_uuid, record.variant_index) {
                (None, Some(index)) => {
                    record.variant_uuid = variants.get(index).and_then(|variant| variant.uuid);
                }
                (Some(uuid), None) => {
                    record.variant_index = variants
                        .iter()
                        .position(|variant| variant.uuid == Some(uuid));
                }
                _ => {}
            }

            self.records.push(record);
        }

        if was_empty {
            self.designate_first();
        }

        Ok(attached)
    }

    /// Upgrade positional references to freshly minted durable ids.
    ///
    /// Only records without a durable id are touched; their positional index
    /// is kept. Returns the number of records upgraded.
    pub fn reassign_variant_references(&mut self, minted: &FxHashMap<usize, VariantUuid>) -> usize {
        let mut upgraded = 0;

        for record in &mut self.records {
            if record.variant_uuid.is_some() {
                continue;
            }

            if let Some(uuid) = record.variant_index.and_then(|index| minted.get(&index)) {
                record.variant_uuid = Some(*uuid);
                upgraded += 1;
            }
        }

        upgraded
    }

    /// Remove a record.
    ///
    /// If the removed record was primary the new first record takes over.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::NotFound` when no record has the public id.
    pub fn detach(&mut self, public_id: &PublicId) -> Result<MediaRecord, MediaError> {
        let position = self
            .position(public_id)
            .ok_or_else(|| MediaError::NotFound(public_id.clone()))?;

        let removed = self.records.remove(position);

        if removed.is_primary {
            self.designate_first();
        }

        Ok(removed)
    }

    /// Remove every record bound to the variant at `index` with durable id
    /// `uuid`, returning them in list order.
    pub fn detach_variant(&mut self, index: usize, uuid: Option<VariantUuid>) -> Vec<MediaRecord> {
        let (detached, kept): (Vec<_>, Vec<_>) = mem::take(&mut self.records)
            .into_iter()
            .partition(|record| record.is_bound_to(index, uuid));

        self.records = kept;

        if detached.iter().any(|record| record.is_primary) {
            self.designate_first();
        }

        detached
    }

    /// Realign positional references after the variant at `removed` left the
    /// list; `variants` is the list without it.
    ///
    /// Durable references take the current position of their variant;
    /// positional-only references past the removed slot move down by one.
    pub fn retarget_after_removal(&mut self, removed: usize, variants: &[Variant]) {
        self.realign_positions(variants);

        for record in &mut self.records {
            if let (None, Some(index)) = (record.variant_uuid, record.variant_index)
                && index > removed
            {
                record.variant_index = Some(index - 1);
            }
        }
    }

    /// Point every durable reference's positional index at the variant's
    /// current position in `variants`.
    ///
    /// References to variants missing from the list are left as they are.
    pub fn realign_positions(&mut self, variants: &[Variant]) {
        for record in &mut self.records {
            let Some(uuid) = record.variant_uuid else {
                continue;
            };

            if let Some(position) = variants.iter().position(|v| v.uuid == Some(uuid)) {
                record.variant_index = Some(position);
            }
        }
    }

    /// Make the selected record the only primary one.
    ///
    /// # Errors
    ///
    /// Returns a not-found `MediaError` when the selector matches nothing; the
    /// table is left untouched.
    pub fn set_primary(&mut self, selector: &MediaSelector) -> Result<(), MediaError> {
        let position = match selector {
            MediaSelector::PublicId(public_id) => self
                .position(public_id)
                .ok_or_else(|| MediaError::NotFound(public_id.clone()))?,
            MediaSelector::Index(index) if *index < self.records.len() => *index,
            MediaSelector::Index(index) => return Err(MediaError::IndexNotFound(*index)),
        };

        for (i, record) in self.records.iter_mut().enumerate() {
            record.is_primary = i == position;
        }

        Ok(())
    }

    /// Replace the ordering with a permutation of the attached public ids.
    ///
    /// The first record of the new order becomes primary.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::NotAPermutation` when `order` omits, repeats or
    /// invents a record; the table is left untouched.
    pub fn reorder(&mut self, order: &[PublicId]) -> Result<(), MediaError> {
        if order.len() != self.records.len() {
            return Err(MediaError::NotAPermutation);
        }

        let positions: FxHashMap<&PublicId, usize> = self
            .records
            .iter()
            .enumerate()
            .map(|(i, record)| (record.public_id(), i))
            .collect();

        let mut taken = FxHashSet::default();
        let mut sequence = Vec::with_capacity(order.len());

        for public_id in order {
            let position = positions
                .get(public_id)
                .copied()
                .ok_or(MediaError::NotAPermutation)?;

            if !taken.insert(position) {
                return Err(MediaError::NotAPermutation);
            }

            sequence.push(position);
        }

        let mut slots: Vec<Option<MediaRecord>> =
            mem::take(&mut self.records).into_iter().map(Some).collect();

        self.records = sequence
            .into_iter()
            .filter_map(|position| slots.get_mut(position).and_then(Option::take))
            .collect();

        self.designate_first();

        Ok(())
    }

    fn designate_first(&mut self) {
        for (i, record) in self.records.iter_mut().enumerate() {
            record.is_primary = i == 0;
        }
    }

    fn normalize_primary(&mut self) {
        let primary = self
            .records
            .iter()
            .position(|record| record.is_primary)
            .unwrap_or(0);

        for (i, record) in self.records.iter_mut().enumerate() {
            record.is_primary = i == primary;
        }
    }
}

impl<'a> IntoIterator for &'a MediaTable {
    type Item = &'a MediaRecord;
    type IntoIter = Iter<'a, MediaRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::fixtures::{draft_variant, new_record, persisted_variant};

    use super::*;

    fn primaries(table: &MediaTable) -> Vec<&str> {
        table
            .iter()
            .filter(|record| record.is_primary)
            .map(|record| record.public_id().as_str())
            .collect()
    }

    fn ids(table: &MediaTable) -> Vec<&str> {
        table.iter().map(|record| record.public_id().as_str()).collect()
    }

    #[test]
    fn attach_to_empty_table_promotes_first_record() -> TestResult {
        let mut table = MediaTable::new();

        table.attach(vec![new_record("a"), new_record("b")], &[])?;

        assert_eq!(primaries(&table), ["a"]);

        Ok(())
    }

    #[test]
    fn attach_keeps_existing_primary() -> TestResult {
        let mut table = MediaTable::new();
        table.attach(vec![new_record("a")], &[])?;

        table.attach(vec![new_record("b")], &[])?;

        assert_eq!(primaries(&table), ["a"]);
        assert_eq!(ids(&table), ["a", "b"]);

        Ok(())
    }

    #[test]
    fn attach_rejects_empty_batches() {
        let mut table = MediaTable::new();

        assert_eq!(table.attach(Vec::new(), &[]), Err(MediaError::Empty));
    }

    #[test]
    fn attach_rejects_duplicates_without_partial_writes() -> TestResult {
        let mut table = MediaTable::new();
        table.attach(vec![new_record("a")], &[])?;

        let result = table.attach(vec![new_record("b"), new_record("a")], &[]);

        assert_eq!(result, Err(MediaError::Duplicate(PublicId::from("a"))));
        assert_eq!(ids(&table), ["a"]);

        Ok(())
    }

    #[test]
    fn attach_to_draft_variant_holds_positional_reference() -> TestResult {
        let variants = [draft_variant(&["S"])];
        let mut table = MediaTable::new();

        table.attach(vec![new_record("a").for_variant_index(0)], &variants)?;

        let record = table.get(&"a".into()).ok_or("missing record")?;

        assert_eq!(record.variant_index, Some(0));
        assert_eq!(record.variant_uuid, None);

        Ok(())
    }

    #[test]
    fn attach_to_persisted_variant_resolves_durable_id() -> TestResult {
        let variants = [persisted_variant(&["S"])];
        let mut table = MediaTable::new();

        table.attach(vec![new_record("a").for_variant_index(0)], &variants)?;

        let record = table.get(&"a".into()).ok_or("missing record")?;

        assert_eq!(record.variant_uuid, variants.first().and_then(|v| v.uuid));

        Ok(())
    }

    #[test]
    fn attach_rejects_unknown_variant_index() {
        let mut table = MediaTable::new();

        let result = table.attach(vec![new_record("a").for_variant_index(2)], &[]);

        assert_eq!(result, Err(MediaError::UnknownVariantIndex(2)));
        assert!(table.is_empty());
    }

    #[test]
    fn reassign_upgrades_only_unresolved_records() -> TestResult {
        let variants = [draft_variant(&["S"]), persisted_variant(&["M"])];
        let mut table = MediaTable::new();
        table.attach(
            vec![
                new_record("a").for_variant_index(0),
                new_record("b").for_variant_index(1),
            ],
            &variants,
        )?;

        let minted = VariantUuid::new();
        let upgraded = table.reassign_variant_references(&FxHashMap::from_iter([(0, minted)]));

        assert_eq!(upgraded, 1);
        assert_eq!(table.get(&"a".into()).and_then(|r| r.variant_uuid), Some(minted));
        assert_eq!(
            table.get(&"b".into()).and_then(|r| r.variant_uuid),
            variants.get(1).and_then(|v| v.uuid)
        );

        Ok(())
    }

    #[test]
    fn detaching_primary_promotes_next_record() -> TestResult {
        let mut table = MediaTable::new();
        table.attach(vec![new_record("a"), new_record("b"), new_record("c")], &[])?;

        table.detach(&"a".into())?;

        assert_eq!(primaries(&table), ["b"]);

        Ok(())
    }

    #[test]
    fn detaching_last_record_leaves_no_primary() -> TestResult {
        let mut table = MediaTable::new();
        table.attach(vec![new_record("a")], &[])?;

        table.detach(&"a".into())?;

        assert!(table.is_empty());
        assert!(table.primary().is_none());

        Ok(())
    }

    #[test]
    fn detaching_unknown_record_is_not_found() {
        let mut table = MediaTable::new();

        let result = table.detach(&"ghost".into());

        assert!(matches!(result, Err(ref e) if e.is_not_found()), "got {result:?}");
    }

    #[test]
    fn set_primary_out_of_range_leaves_flags_untouched() -> TestResult {
        let mut table = MediaTable::new();
        table.attach(vec![new_record("a"), new_record("b")], &[])?;
        table.set_primary(&MediaSelector::Index(1))?;

        let result = table.set_primary(&MediaSelector::Index(2));

        assert_eq!(result, Err(MediaError::IndexNotFound(2)));
        assert_eq!(primaries(&table), ["b"]);

        Ok(())
    }

    #[test]
    fn reorder_moves_primary_to_front() -> TestResult {
        let mut table = MediaTable::new();
        table.attach(vec![new_record("a"), new_record("b"), new_record("c")], &[])?;

        table.reorder(&["c".into(), "a".into(), "b".into()])?;

        assert_eq!(ids(&table), ["c", "a", "b"]);
        assert_eq!(primaries(&table), ["c"]);

        Ok(())
    }

    #[test]
    fn reorder_rejects_non_permutations() -> TestResult {
        let mut table = MediaTable::new();
        table.attach(vec![new_record("a"), new_record("b")], &[])?;

        for order in [
            vec!["a".into()],
            vec!["a".into(), "a".into()],
            vec!["a".into(), "z".into()],
        ] {
            assert_eq!(table.reorder(&order), Err(MediaError::NotAPermutation));
        }

        assert_eq!(ids(&table), ["a", "b"]);
        assert_eq!(primaries(&table), ["a"]);

        Ok(())
    }

    #[test]
    fn from_records_repairs_primary_flags() -> TestResult {
        let mut table = MediaTable::new();
        table.attach(vec![new_record("a"), new_record("b"), new_record("c")], &[])?;

        let mut records = table.into_records();
        for record in &mut records {
            record.is_primary = record.public_id().as_str() != "a";
        }

        let repaired = MediaTable::from_records(records);

        assert_eq!(primaries(&repaired), ["b"]);

        Ok(())
    }
}
