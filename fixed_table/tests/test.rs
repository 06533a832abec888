#![allow(missing_docs)] // test only
use std::hash::BuildHasherDefault;

use fixed_table::{
    ByteRecord, DefaultSlotHasher, FillFactor, FixedTable, HashSlots, KeyEq, KeyEquality,
    ProbeAction, Probed, Record, SlotHasher, TableConfig,
};
use zwohash::ZwoHasher;

/// A 4 byte block number followed by a 4 byte hit counter.
type WorkItem = ByteRecord<8, 4>;

fn blkno(n: u32) -> [u8; 4] {
    n.to_le_bytes()
}

fn hits(item: &WorkItem) -> u32 {
    u32::from_le_bytes(item.payload().try_into().unwrap())
}

fn set_hits(item: &mut WorkItem, hits: u32) {
    item.payload_mut().copy_from_slice(&hits.to_le_bytes());
}

fn work_table(
    fill_factor: f64,
) -> FixedTable<WorkItem, impl SlotHasher<[u8]>, impl KeyEq<[u8], WorkItem>> {
    TableConfig::new(10)
        .with_fill_ratio(fill_factor)
        .with_hasher(HashSlots::new(<BuildHasherDefault<ZwoHasher>>::default()))
        .with_equality(|key: &[u8], item: &WorkItem| item.key() == key)
        .build()
}

#[test]
fn enter_find_clean_fill_drain() {
    let mut table = work_table(0.5);
    assert_eq!(table.physical_size(), 16);

    let (item, found) = table.enter(&blkno(5)).unwrap();
    assert!(!found);
    assert_eq!(hits(item), 0);
    set_hits(item, 11);

    let (item, found) = table.enter(&blkno(101)).unwrap();
    assert!(!found);
    assert_eq!(item.key(), blkno(101));
    assert_eq!(hits(item), 0);

    for expected in 0..2 {
        let probed = table.probe(&blkno(101), ProbeAction::Find);
        assert!(probed.found());
        let Probed::Found(item) = probed else {
            panic!("expected to find block 101")
        };
        assert_eq!(hits(item), expected);
        set_hits(item, expected + 1);
    }
    assert_eq!(table.find(&blkno(101)).map(hits), Some(2));
    assert_eq!(table.find(&blkno(5)).map(hits), Some(11));

    let probed = table.probe(&blkno(4), ProbeAction::Find);
    assert!(!probed.found());
    assert!(probed.record().is_none());

    table.clean();
    assert_eq!(table.len(), 0);
    assert!(!table.contains(&blkno(5)));
    assert!(!table.contains(&blkno(101)));

    let mut next = 1000;
    while let Some((item, found)) = table.enter(&blkno(next)) {
        assert!(!found);
        next += 1;
        set_hits(item, next - 1000);
    }
    assert_eq!(next, 1010);
    assert_eq!(table.len(), 10);
    assert!(table.slots().iter().any(|slot| !slot.is_occupied()));

    for n in (1000..1010).rev() {
        let removed = table.probe(&blkno(n), ProbeAction::Remove);
        assert!(removed.found());
        assert_eq!(removed.record().map(hits), Some(n - 999));
        assert!(!table.contains(&blkno(n)));
    }
    assert!(table.is_empty());
    assert_eq!(table.tombstones(), 10);

    let (_, found) = table.enter(&blkno(111)).unwrap();
    assert!(!found);
    assert_eq!(table.len(), 1);
    assert_eq!(table.physical_size(), 16);
}

#[test]
fn re_enter_keeps_payload() {
    let mut table = work_table(0.5);
    for (i, n) in (1000..1010).enumerate() {
        let (item, found) = table.enter(&blkno(n)).unwrap();
        assert!(!found);
        set_hits(item, i as u32 + 1);
    }
    assert!(table.is_full());

    let (item, found) = table.enter(&blkno(1009)).unwrap();
    assert!(found);
    assert_eq!(hits(item), 10);

    let (item, found) = table.enter(&blkno(1005)).unwrap();
    assert!(found);
    assert_eq!(hits(item), 6);
    assert_eq!(table.len(), 10);
}

#[test]
fn saturation_at_full_fill_factor() {
    for n in [1, 2, 10, 33] {
        let mut table: FixedTable<WorkItem, _, _> = TableConfig::new(n)
            .with_fill_factor(FillFactor::FULL)
            .build();
        assert_eq!(table.physical_size(), n + 1);
        for key in 0..n as u32 {
            assert!(matches!(
                table.probe(&blkno(key), ProbeAction::Enter),
                Probed::Inserted(_)
            ));
        }
        assert!(matches!(
            table.probe(&blkno(n as u32), ProbeAction::Enter),
            Probed::Full
        ));
        assert_eq!(table.len(), n);
        assert_eq!(
            table.slots().iter().filter(|slot| !slot.is_occupied()).count(),
            1
        );
    }
}

#[test]
fn tombstones_are_reused() {
    let mut table = work_table(1.0);
    for round in 0..50u32 {
        for key in 0..10 {
            table.enter(&blkno(round * 10 + key)).unwrap();
        }
        assert!(table.is_full());
        for key in 0..10 {
            assert!(table.remove(&blkno(round * 10 + key)).is_some());
        }
        assert!(table.is_empty());
        assert!(table.tombstones() <= table.physical_size());
    }
    assert_eq!(table.physical_size(), 11);
    for key in 0..10 {
        table.enter(&blkno(key)).unwrap();
        assert!(table.probe_len(&blkno(key)) <= table.physical_size());
    }
    assert_eq!(table.len(), 10);
}

#[test]
fn remove_then_find() {
    let mut table = work_table(0.5);
    for key in 0..8 {
        table.enter(&blkno(key)).unwrap();
    }
    for key in (0..8).step_by(2) {
        let len = table.len();
        assert!(table.remove(&blkno(key)).is_some());
        assert_eq!(table.len(), len - 1);
        assert!(table.find(&blkno(key)).is_none());
        assert!(table.remove(&blkno(key)).is_none());
        assert_eq!(table.len(), len - 1);
    }
    for key in (1..8).step_by(2) {
        assert!(table.contains(&blkno(key)));
    }
}

#[test]
fn scans_see_every_record_once() {
    let mut table = work_table(0.5);
    for key in [17, 3, 99, 42, 5] {
        table.enter(&blkno(key)).unwrap();
    }
    table.remove(&blkno(99)).unwrap();

    let mut from_iter: Vec<_> = table.iter().map(|item| item.key().to_vec()).collect();
    let mut scan = table.seq_scan();
    let mut from_scan = vec![];
    while let Some(item) = scan.next(&table) {
        from_scan.push(item.key().to_vec());
    }
    assert_eq!(from_iter, from_scan);

    from_iter.sort();
    let mut expected: Vec<_> = [3, 5, 17, 42].map(|k| blkno(k).to_vec()).to_vec();
    expected.sort();
    assert_eq!(from_iter, expected);

    scan.reset();
    assert_eq!(scan.position(), 0);
    assert!(scan.next(&table).is_some());
}

#[derive(Debug, PartialEq, Eq)]
struct Named {
    name: String,
    visits: usize,
}

impl Record for Named {
    type Key = str;

    fn with_key(key: &str) -> Self {
        Named {
            name: key.to_owned(),
            visits: 0,
        }
    }

    fn key(&self) -> &str {
        &self.name
    }
}

#[test]
fn unsized_string_keys() {
    let mut table: FixedTable<Named, _, _> = TableConfig::new(3).build();
    for name in ["alpha", "beta", "alpha", "gamma", "beta", "alpha"] {
        table.enter(name).unwrap().0.visits += 1;
    }
    assert_eq!(table.find("alpha").map(|n| n.visits), Some(3));
    assert_eq!(table.find("beta").map(|n| n.visits), Some(2));
    assert!(table.enter("delta").is_none());
    assert_eq!(table.remove("gamma").map(|n| n.visits), Some(1));
    assert!(table.enter("delta").is_some());
    assert_eq!(table.find("delta"), Some(&Named::with_key("delta")));
}

#[test]
fn full_width_keys() {
    let mut table: FixedTable<ByteRecord<2, 2>, DefaultSlotHasher, KeyEquality> =
        TableConfig::new(256).with_fill_ratio(0.25).build();
    assert_eq!(table.physical_size(), 449);
    for a in 0..=255u8 {
        let (_, found) = table.enter(&[a, a.wrapping_mul(3)]).unwrap();
        assert!(!found);
    }
    assert!(table.is_full());
    assert!(table.enter(&[0, 1]).is_none());
    assert!(table.iter().all(|record| record.payload().is_empty()));
    table.destroy();
}
