//! [FixedTable] is an open-addressing hash table whose storage is allocated exactly once.
//!
//! The table is sized from a logical capacity (the maximum number of live records) and a
//! [FillFactor] which controls how much extra room the probe sequences get. All slots are
//! allocated when the table is built and the table never grows: once the logical capacity is
//! reached, inserting a new key fails instead of reallocating.
//!
//! Lookups use linear probing. Removal leaves a tombstone behind so that probe sequences stay
//! intact, and insertions reuse the first tombstone they pass.
//!
//! Records are any type implementing [Record]. Which slot a key starts probing at and whether a
//! record matches a key are decided by the [SlotHasher] and [KeyEq] strategies given to the
//! [TableConfig]. For fixed size byte layouts [ByteRecord] can be used as the record type.
#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod iter;
pub mod record;
pub mod slot;
pub mod strategy;
pub mod table;

mod test_table;

pub use config::{FillFactor, TableConfig};
pub use iter::{Iter, IterMut, SeqScan};
pub use record::{ByteRecord, Record};
pub use strategy::{DefaultSlotHasher, HashSlots, KeyEq, KeyEquality, SlotHasher};
pub use table::{FixedTable, ProbeAction, Probed};
