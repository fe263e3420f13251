//! Primary designation invariants of the media table

use proptest::prelude::*;
use vitrine::{
    fixtures::new_record,
    media::{MediaSelector, MediaTable, PublicId},
};

#[derive(Debug, Clone)]
enum Op {
    Attach(usize),
    Detach(usize),
    SetPrimary(usize),
    Rotate(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (1_usize..4).prop_map(Op::Attach),
        (0_usize..8).prop_map(Op::Detach),
        (0_usize..8).prop_map(Op::SetPrimary),
        (0_usize..8).prop_map(Op::Rotate),
    ]
}

fn primary_count(table: &MediaTable) -> usize {
    table.iter().filter(|record| record.is_primary).count()
}

proptest! {
    #[test]
    fn exactly_one_primary_after_any_sequence(ops in prop::collection::vec(op(), 1..32)) {
        let mut table = MediaTable::new();
        let mut minted = 0_usize;

        for op in ops {
            match op {
                Op::Attach(count) => {
                    let records = (0..count)
                        .map(|_| {
                            minted += 1;
                            new_record(&format!("m{minted}"))
                        })
                        .collect();

                    prop_assert!(table.attach(records, &[]).is_ok());
                }
                Op::Detach(position) => {
                    let target = table.records().get(position).map(|r| r.public_id().clone());

                    if let Some(public_id) = target {
                        let was_primary = table.primary().map(|r| r.public_id()) == Some(&public_id);
                        let next = table
                            .iter()
                            .find(|r| r.public_id() != &public_id)
                            .map(|r| r.public_id().clone());

                        prop_assert!(table.detach(&public_id).is_ok());

                        if was_primary {
                            prop_assert_eq!(table.primary().map(|r| r.public_id().clone()), next);
                        }
                    }
                }
                Op::SetPrimary(index) => {
                    let before = table.clone();
                    let result = table.set_primary(&MediaSelector::Index(index));

                    if index < before.len() {
                        prop_assert!(result.is_ok());
                        prop_assert!(table.records().get(index).is_some_and(|r| r.is_primary));
                    } else {
                        prop_assert!(result.is_err());
                        prop_assert_eq!(&table, &before);
                    }
                }
                Op::Rotate(by) => {
                    if !table.is_empty() {
                        let mut order: Vec<PublicId> =
                            table.iter().map(|r| r.public_id().clone()).collect();
                        let len = order.len();
                        order.rotate_left(by % len);

                        prop_assert!(table.reorder(&order).is_ok());
                        prop_assert_eq!(
                            table.primary().map(|r| r.public_id()),
                            order.first()
                        );
                    }
                }
            }

            if table.is_empty() {
                prop_assert_eq!(primary_count(&table), 0);
            } else {
                prop_assert_eq!(primary_count(&table), 1);
            }
        }
    }
}

#[test]
fn detaching_every_record_empties_the_table() -> testresult::TestResult {
    let mut table = MediaTable::new();
    table.attach(vec![new_record("a"), new_record("b")], &[])?;

    table.detach(&"a".into())?;
    assert_eq!(primary_count(&table), 1);

    table.detach(&"b".into())?;
    assert!(table.is_empty());
    assert_eq!(primary_count(&table), 0);

    Ok(())
}
