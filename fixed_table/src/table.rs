//! The [FixedTable] and its probe engine.
use std::fmt;

use crate::{
    config::{FillFactor, TableConfig},
    iter::{Iter, IterMut, SeqScan},
    record::Record,
    slot::Slot,
    strategy::{KeyEq, SlotHasher},
};

/// The operation performed by [FixedTable::probe].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProbeAction {
    /// Look up an existing record.
    Find,
    /// Look up an existing record, inserting a fresh one if none exists.
    Enter,
    /// Remove an existing record.
    Remove,
}

/// The outcome of [FixedTable::probe].
#[derive(Debug)]
pub enum Probed<'a, R> {
    /// A record with the key was present. Produced by [ProbeAction::Find] and
    /// [ProbeAction::Enter].
    Found(&'a mut R),
    /// No record with the key was present and [ProbeAction::Enter] inserted a fresh one.
    Inserted(&'a mut R),
    /// A record with the key was present and [ProbeAction::Remove] removed it.
    Removed(R),
    /// No record with the key was present. Produced by [ProbeAction::Find] and
    /// [ProbeAction::Remove].
    Absent,
    /// No record with the key was present and [ProbeAction::Enter] failed as the table already
    /// holds as many records as its capacity allows.
    Full,
}

impl<R> Probed<'_, R> {
    /// Returns `true` if a record with the probed key existed before the probe.
    pub fn found(&self) -> bool {
        matches!(self, Probed::Found(_) | Probed::Removed(_))
    }

    /// Returns the found, inserted or removed record, if any.
    pub fn record(&self) -> Option<&R> {
        match self {
            Probed::Found(record) | Probed::Inserted(record) => Some(record),
            Probed::Removed(record) => Some(record),
            Probed::Absent | Probed::Full => None,
        }
    }
}

enum Search {
    Hit(usize),
    Miss { insert_at: Option<usize> },
}

/// An open-addressing hash table with a fixed number of slots.
///
/// In `FixedTable<R, H, E>`, `R: Record` is the type of the stored records, `H` chooses the slot
/// at which probing for a key starts and `E` decides whether a stored record matches a key. See
/// [TableConfig] for how tables are built.
///
/// The table allocates all of its slots on construction and never reallocates. At most
/// [capacity](Self::capacity) records are live at the same time, regardless of how many slots are
/// still unused.
pub struct FixedTable<R, H, E> {
    slots: Vec<Slot<R>>,
    len: usize,
    max_entries: usize,
    fill_factor: FillFactor,
    hasher: H,
    eq: E,
}

impl<R: Record, H, E> FixedTable<R, H, E> {
    /// Allocates a table as configured, with all slots empty.
    ///
    /// Same as [TableConfig::build].
    pub fn new(config: TableConfig<H, E>) -> Self {
        let physical_size = config.physical_size();
        let (max_entries, fill_factor, hasher, eq) = config.into_parts();

        log::debug!(
            "allocating {physical_size} slots for {max_entries} records (fill factor {fill_factor})"
        );

        let mut slots = Vec::with_capacity(physical_size);
        slots.resize_with(physical_size, || Slot::Empty);

        FixedTable {
            slots,
            len: 0,
            max_entries,
            fill_factor,
            hasher,
            eq,
        }
    }
}

impl<R, H, E> FixedTable<R, H, E> {
    /// Returns the number of live records.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no records are live.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns `true` if the table holds as many records as its capacity allows.
    pub fn is_full(&self) -> bool {
        self.len == self.max_entries
    }

    /// Returns the maximum number of live records.
    pub fn capacity(&self) -> usize {
        self.max_entries
    }

    /// Returns the number of allocated slots, which always exceeds the capacity.
    pub fn physical_size(&self) -> usize {
        self.slots.len()
    }

    /// Returns the fill factor the table was built with.
    pub fn fill_factor(&self) -> FillFactor {
        self.fill_factor
    }

    /// Returns the number of tombstones left behind by removals.
    ///
    /// This walks all slots.
    pub fn tombstones(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_tombstone()).count()
    }

    /// Returns all slots in physical order.
    pub fn slots(&self) -> &[Slot<R>] {
        &self.slots
    }

    pub(crate) fn slot_mut(&mut self, index: usize) -> &mut Slot<R> {
        &mut self.slots[index]
    }

    /// Removes all records, but keeps the allocated slots.
    ///
    /// All tombstones are cleared as well.
    pub fn clean(&mut self) {
        log::trace!("cleaning {} slots holding {} records", self.slots.len(), self.len);
        self.slots.fill_with(|| Slot::Empty);
        self.len = 0;
    }

    /// Releases the table's storage.
    pub fn destroy(self) {
        log::trace!("releasing {} slots", self.slots.len());
        drop(self);
    }

    /// Returns an iterator over all live records in slot order.
    pub fn iter(&self) -> Iter<'_, R> {
        Iter::new(&self.slots, self.len)
    }

    /// Returns an iterator over all live records in slot order, allowing modification.
    ///
    /// Record keys must not be changed.
    pub fn iter_mut(&mut self) -> IterMut<'_, R> {
        IterMut::new(&mut self.slots, self.len)
    }

    /// Returns a scan cursor positioned at the first slot.
    ///
    /// Same as [SeqScan::new]. The cursor is a plain slot position and is not tied to this table,
    /// unlike [iter](Self::iter) it does not borrow the table between steps. Stepping it over a
    /// different table scans that table from the cursor's position.
    pub fn seq_scan(&self) -> SeqScan {
        SeqScan::new()
    }
}

impl<R: Record, H: SlotHasher<R::Key>, E: KeyEq<R::Key, R>> FixedTable<R, H, E> {
    fn start_slot(&self, key: &R::Key) -> usize {
        let size = self.slots.len();
        let index = self.hasher.slot_index(key, size);
        assert!(
            index < size,
            "hasher returned slot {index} for a table of {size} slots"
        );
        index
    }

    /// Walks the probe sequence of `key`. Visits every slot at most once.
    fn search(&self, key: &R::Key) -> (Search, usize) {
        let size = self.slots.len();
        let mut index = self.start_slot(key);
        let mut reclaimable = None;

        for step in 1..=size {
            match &self.slots[index] {
                Slot::Empty => {
                    let insert_at = reclaimable.unwrap_or(index);
                    return (
                        Search::Miss {
                            insert_at: Some(insert_at),
                        },
                        step,
                    );
                }
                Slot::Occupied(record) if self.eq.matches(key, record) => {
                    return (Search::Hit(index), step);
                }
                Slot::Occupied(_) => {}
                Slot::Tombstone => {
                    reclaimable = reclaimable.or(Some(index));
                }
            }
            index += 1;
            if index == size {
                index = 0;
            }
        }

        (
            Search::Miss {
                insert_at: reclaimable,
            },
            size,
        )
    }

    /// Looks up, inserts or removes the record with the given key.
    ///
    /// See [Probed] for the possible outcomes. Every call visits at most
    /// [physical_size](Self::physical_size) slots.
    pub fn probe(&mut self, key: &R::Key, action: ProbeAction) -> Probed<'_, R> {
        let (search, _) = self.search(key);
        match (search, action) {
            (Search::Hit(index), ProbeAction::Find | ProbeAction::Enter) => {
                match self.slots[index].record_mut() {
                    Some(record) => Probed::Found(record),
                    None => unreachable!(),
                }
            }
            (Search::Hit(index), ProbeAction::Remove) => match self.slots[index].bury() {
                Some(record) => {
                    self.len -= 1;
                    Probed::Removed(record)
                }
                None => unreachable!(),
            },
            (Search::Miss { .. }, ProbeAction::Find | ProbeAction::Remove) => Probed::Absent,
            (Search::Miss { insert_at }, ProbeAction::Enter) => match insert_at {
                Some(index) if self.len < self.max_entries => {
                    self.len += 1;
                    let slot = &mut self.slots[index];
                    *slot = Slot::Occupied(R::with_key(key));
                    match slot.record_mut() {
                        Some(record) => Probed::Inserted(record),
                        None => unreachable!(),
                    }
                }
                _ => {
                    log::trace!(
                        "rejecting insertion, {} of {} records live",
                        self.len,
                        self.max_entries
                    );
                    Probed::Full
                }
            },
        }
    }

    /// Returns the number of slots visited when looking up `key`.
    ///
    /// This is never more than [physical_size](Self::physical_size).
    pub fn probe_len(&self, key: &R::Key) -> usize {
        self.search(key).1
    }

    /// Returns the record with the given key, if present.
    pub fn find(&self, key: &R::Key) -> Option<&R> {
        match self.search(key).0 {
            Search::Hit(index) => self.slots[index].record(),
            Search::Miss { .. } => None,
        }
    }

    /// Returns the record with the given key for modification, if present.
    ///
    /// The record's key must not be changed.
    pub fn find_mut(&mut self, key: &R::Key) -> Option<&mut R> {
        match self.probe(key, ProbeAction::Find) {
            Probed::Found(record) => Some(record),
            _ => None,
        }
    }

    /// Returns `true` if a record with the given key is present.
    pub fn contains(&self, key: &R::Key) -> bool {
        self.find(key).is_some()
    }

    /// Returns the record with the given key, inserting a fresh one if none is present.
    ///
    /// The returned flag is `true` if the record was already present. Returns `None` if the key
    /// is absent and the table is full.
    pub fn enter(&mut self, key: &R::Key) -> Option<(&mut R, bool)> {
        match self.probe(key, ProbeAction::Enter) {
            Probed::Found(record) => Some((record, true)),
            Probed::Inserted(record) => Some((record, false)),
            _ => None,
        }
    }

    /// Removes the record with the given key and returns it, if present.
    pub fn remove(&mut self, key: &R::Key) -> Option<R> {
        match self.probe(key, ProbeAction::Remove) {
            Probed::Removed(record) => Some(record),
            _ => None,
        }
    }
}

impl<R: fmt::Debug, H, E> fmt::Debug for FixedTable<R, H, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<'a, R, H, E> IntoIterator for &'a FixedTable<R, H, E> {
    type Item = &'a R;
    type IntoIter = Iter<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, R, H, E> IntoIterator for &'a mut FixedTable<R, H, E> {
    type Item = &'a mut R;
    type IntoIter = IterMut<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<R: Record, H: SlotHasher<R::Key>, E: KeyEq<R::Key, R>> FixedTable<R, H, E> {
    #[cfg(test)]
    pub(crate) fn check(&self) {
        assert!(self.len <= self.max_entries);
        assert!(self.slots.len() > self.max_entries);
        assert_eq!(
            self.slots.iter().filter(|slot| slot.is_occupied()).count(),
            self.len
        );
        for (index, slot) in self.slots.iter().enumerate() {
            if let Slot::Occupied(record) = slot {
                assert!(
                    matches!(self.search(record.key()).0, Search::Hit(found) if found == index)
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ByteRecord;

    type Item = ByteRecord<8, 4>;

    /// Every key starts probing at slot 0.
    fn colliding() -> FixedTable<Item, impl SlotHasher<[u8]>, impl KeyEq<[u8], Item>> {
        TableConfig::new(4)
            .with_fill_ratio(1.0)
            .with_hasher(|_: &[u8], _: usize| 0)
            .with_equality(|key: &[u8], record: &Item| record.key() == key)
            .build()
    }

    /// Key `n` starts probing at slot `n` modulo the table size.
    fn direct() -> FixedTable<Item, impl SlotHasher<[u8]>, impl KeyEq<[u8], Item>> {
        TableConfig::new(4)
            .with_fill_ratio(1.0)
            .with_hasher(|key: &[u8], size: usize| key[0] as usize % size)
            .build()
    }

    fn key(n: u32) -> [u8; 4] {
        n.to_le_bytes()
    }

    #[test]
    fn probe_actions() {
        let mut table = colliding();
        assert!(matches!(table.probe(&key(1), ProbeAction::Find), Probed::Absent));
        assert!(matches!(table.probe(&key(1), ProbeAction::Remove), Probed::Absent));

        let inserted = table.probe(&key(1), ProbeAction::Enter);
        assert!(!inserted.found());
        assert_eq!(inserted.record().map(|r| r.key()), Some(&key(1)[..]));

        let found = table.probe(&key(1), ProbeAction::Enter);
        assert!(found.found());
        assert_eq!(table.len(), 1);

        let removed = table.probe(&key(1), ProbeAction::Remove);
        assert!(removed.found());
        assert!(matches!(removed, Probed::Removed(_)));
        assert_eq!(table.len(), 0);
        assert_eq!(table.tombstones(), 1);
        table.check();
    }

    #[test]
    fn tombstone_keeps_chain_intact() {
        let mut table = colliding();
        for n in 0..3 {
            table.enter(&key(n)).unwrap();
        }
        assert!(table.remove(&key(1)).is_some());
        assert_eq!(table.slots()[1], Slot::Tombstone);
        assert!(table.contains(&key(2)));
        assert_eq!(table.probe_len(&key(2)), 3);
        table.check();
    }

    #[test]
    fn insertion_reclaims_first_tombstone() {
        let mut table = colliding();
        for n in 0..4 {
            table.enter(&key(n)).unwrap();
        }
        table.remove(&key(2)).unwrap();
        table.remove(&key(1)).unwrap();
        assert_eq!(table.tombstones(), 2);

        let (record, found) = table.enter(&key(9)).unwrap();
        assert!(!found);
        assert_eq!(record.key(), &key(9));
        assert!(table.slots()[1].is_occupied());
        assert!(table.slots()[2].is_tombstone());
        assert_eq!(table.tombstones(), 1);
        table.check();
    }

    #[test]
    fn full_cycle_over_tombstones() {
        let mut table = direct();
        for n in 0..4 {
            table.enter(&key(n)).unwrap();
        }
        table.remove(&key(0)).unwrap();
        table.enter(&key(4)).unwrap();
        table.remove(&key(1)).unwrap();
        // no empty slot is left: two tombstones followed by three records
        assert!(table.slots().iter().all(|slot| *slot != Slot::Empty));

        assert!(table.find(&key(7)).is_none());
        assert_eq!(table.probe_len(&key(7)), table.physical_size());
        assert!(table.remove(&key(7)).is_none());

        let (_, found) = table.enter(&key(7)).unwrap();
        assert!(!found);
        assert!(table.slots()[0].is_occupied());
        assert!(table.slots()[1].is_tombstone());
        assert!(table.is_full());
        assert!(matches!(table.probe(&key(8), ProbeAction::Enter), Probed::Full));
        table.check();
    }

    #[test]
    fn capacity_gates_insertion() {
        let mut table = colliding();
        for n in 0..4 {
            assert!(!table.enter(&key(n)).unwrap().1);
        }
        assert!(table.enter(&key(4)).is_none());
        assert_eq!(table.physical_size(), 5);
        assert!(table.slots()[4] == Slot::Empty);
        assert!(table.enter(&key(3)).unwrap().1);
    }

    #[test]
    #[should_panic]
    fn out_of_range_hasher() {
        let mut table: FixedTable<Item, _, _> = TableConfig::new(2)
            .with_hasher(|_: &[u8], size: usize| size)
            .build();
        table.enter(&key(0));
    }

    #[test]
    fn clean_resets_slots() {
        let mut table = colliding();
        for n in 0..4 {
            table.enter(&key(n)).unwrap();
        }
        table.remove(&key(0)).unwrap();
        table.clean();
        assert!(table.is_empty());
        assert_eq!(table.tombstones(), 0);
        assert_eq!(table.physical_size(), 5);
        assert!(table.iter().next().is_none());
        assert!(!table.contains(&key(1)));
    }
}
