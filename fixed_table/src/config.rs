//! Construction parameters of a [FixedTable].
use std::fmt;

use crate::{
    record::Record,
    strategy::{DefaultSlotHasher, KeyEquality},
    table::FixedTable,
};

/// The fill factor of a table, a value in `(0, 1]`.
///
/// A table with logical capacity `n` and fill factor `f` allocates `ceil(n * (2 - f)) + 1` slots,
/// so smaller fill factors leave more empty slots to terminate probe sequences early.
#[derive(Clone, Copy, PartialEq, PartialOrd)]
pub struct FillFactor(f64);

impl FillFactor {
    /// A fill factor of `1.0`, allocating a single slot beyond the logical capacity.
    pub const FULL: FillFactor = FillFactor(1.0);
    /// A fill factor of `0.5`, allocating one and a half times the logical capacity.
    pub const HALF: FillFactor = FillFactor(0.5);

    /// Returns the fill factor `value`, or `None` if it is not in `(0, 1]`.
    pub fn new(value: f64) -> Option<Self> {
        (value > 0.0 && value <= 1.0).then_some(FillFactor(value))
    }

    /// Returns the fill factor as a float.
    pub fn get(self) -> f64 {
        self.0
    }

    /// Returns the number of slots needed to hold `max_entries` records at this fill factor.
    pub fn physical_size(self, max_entries: usize) -> usize {
        let wanted = max_entries as f64 * (2.0 - self.0);
        // an integral product must not be rounded up due to the fill factor's rounding error
        let nearest = wanted.round();
        let wanted = if (wanted - nearest).abs() <= wanted * f64::EPSILON * 8.0 {
            nearest
        } else {
            wanted.ceil()
        };
        match (wanted as usize).checked_add(1) {
            Some(slots) if slots > max_entries => slots,
            _ => panic!(
                "physical size for {max_entries} records at fill factor {self} does not exceed \
                 the logical capacity"
            ),
        }
    }
}

impl Default for FillFactor {
    fn default() -> Self {
        FillFactor::FULL
    }
}

impl fmt::Debug for FillFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for FillFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Builder for a [FixedTable].
///
/// In `TableConfig<H, E>`, `H` is the [SlotHasher](crate::SlotHasher) choosing where probing
/// starts and `E` is the [KeyEq](crate::KeyEq) matching keys against stored records. Both default
/// to hashing and comparing [Record::key].
#[derive(Clone, Debug)]
pub struct TableConfig<H = DefaultSlotHasher, E = KeyEquality> {
    max_entries: usize,
    fill_factor: FillFactor,
    hasher: H,
    eq: E,
}

impl TableConfig {
    /// Returns a configuration for tables holding at most `max_entries` live records.
    pub fn new(max_entries: usize) -> Self {
        TableConfig {
            max_entries,
            fill_factor: FillFactor::default(),
            hasher: DefaultSlotHasher::default(),
            eq: KeyEquality,
        }
    }
}

impl<H, E> TableConfig<H, E> {
    /// Sets the fill factor.
    pub fn with_fill_factor(mut self, fill_factor: FillFactor) -> Self {
        self.fill_factor = fill_factor;
        self
    }

    /// Sets the fill factor from a float.
    ///
    /// Panics if `ratio` is not in `(0, 1]`.
    pub fn with_fill_ratio(self, ratio: f64) -> Self {
        let Some(fill_factor) = FillFactor::new(ratio) else {
            panic!("fill factor {ratio} is not in (0, 1]")
        };
        self.with_fill_factor(fill_factor)
    }

    /// Replaces the strategy choosing the start slot of a probe sequence.
    pub fn with_hasher<H2>(self, hasher: H2) -> TableConfig<H2, E> {
        TableConfig {
            max_entries: self.max_entries,
            fill_factor: self.fill_factor,
            hasher,
            eq: self.eq,
        }
    }

    /// Replaces the strategy matching query keys against stored records.
    pub fn with_equality<E2>(self, eq: E2) -> TableConfig<H, E2> {
        TableConfig {
            max_entries: self.max_entries,
            fill_factor: self.fill_factor,
            hasher: self.hasher,
            eq,
        }
    }

    /// Maximum number of live records.
    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// The configured fill factor.
    pub fn fill_factor(&self) -> FillFactor {
        self.fill_factor
    }

    /// Number of slots a table built from this configuration allocates.
    pub fn physical_size(&self) -> usize {
        self.fill_factor.physical_size(self.max_entries)
    }

    /// Allocates a table with all slots empty.
    pub fn build<R: Record>(self) -> FixedTable<R, H, E> {
        FixedTable::new(self)
    }

    pub(crate) fn into_parts(self) -> (usize, FillFactor, H, E) {
        (self.max_entries, self.fill_factor, self.hasher, self.eq)
    }
}
