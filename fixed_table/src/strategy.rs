//! Hashing and equality strategies used by a [FixedTable](crate::FixedTable).
//!
//! Both traits are implemented for suitable closures, so ad-hoc strategies don't need a named
//! type.
use std::hash::{BuildHasher, BuildHasherDefault, Hash};

use zwohash::ZwoHasher;

use crate::record::Record;

/// Chooses the slot at which probing for a key starts.
pub trait SlotHasher<K: ?Sized> {
    /// Returns the start slot for `key` in a table with `table_size` slots.
    ///
    /// The result must be less than `table_size`, and equal keys (according to the table's
    /// [KeyEq] strategy) must be mapped to the same slot.
    fn slot_index(&self, key: &K, table_size: usize) -> usize;
}

impl<K: ?Sized, F: Fn(&K, usize) -> usize> SlotHasher<K> for F {
    #[inline(always)]
    fn slot_index(&self, key: &K, table_size: usize) -> usize {
        self(key, table_size)
    }
}

/// Decides whether a stored record matches a query key.
///
/// The arguments are not symmetric: the first is always the key being looked up, the second is a
/// record already present in the table.
pub trait KeyEq<K: ?Sized, R> {
    /// Returns `true` if `record` is stored under `key`.
    fn matches(&self, key: &K, record: &R) -> bool;
}

impl<K: ?Sized, R, F: Fn(&K, &R) -> bool> KeyEq<K, R> for F {
    #[inline(always)]
    fn matches(&self, key: &K, record: &R) -> bool {
        self(key, record)
    }
}

/// A [SlotHasher] reducing the hash of a [BuildHasher] modulo the table size.
#[derive(Clone, Copy, Debug, Default)]
pub struct HashSlots<S> {
    build_hasher: S,
}

impl<S> HashSlots<S> {
    /// Uses `build_hasher` to hash keys.
    pub fn new(build_hasher: S) -> Self {
        HashSlots { build_hasher }
    }
}

impl<K: Hash + ?Sized, S: BuildHasher> SlotHasher<K> for HashSlots<S> {
    #[inline(always)]
    fn slot_index(&self, key: &K, table_size: usize) -> usize {
        (self.build_hasher.hash_one(key) % table_size as u64) as usize
    }
}

/// The [SlotHasher] used when none is configured, based on [ZwoHasher].
pub type DefaultSlotHasher = HashSlots<BuildHasherDefault<ZwoHasher>>;

/// The [KeyEq] used when none is configured, comparing [Record::key] with the query key.
#[derive(Clone, Copy, Debug, Default)]
pub struct KeyEquality;

impl<R: Record> KeyEq<R::Key, R> for KeyEquality
where
    R::Key: PartialEq,
{
    #[inline(always)]
    fn matches(&self, key: &R::Key, record: &R) -> bool {
        record.key() == key
    }
}
