//! Block hit counters, the record type exercised by the demo.
use fixed_table::Record;

/// Number of hits recorded for a block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorkItem {
    pub blkno: i32,
    pub hits: i32,
}

impl Record for WorkItem {
    type Key = i32;

    fn with_key(blkno: &i32) -> Self {
        WorkItem {
            blkno: *blkno,
            hits: 0,
        }
    }

    fn key(&self) -> &i32 {
        &self.blkno
    }
}

/// Sums `x⁴ + x³ + x² + x + 1` over the bytes `x` of the block number, modulo the table size.
///
/// Bytes are read as signed and sign extended, the sum wraps around on overflow. This spreads
/// small block numbers poorly on purpose, producing collisions early.
pub fn polynomial_slot(blkno: &i32, table_size: usize) -> usize {
    let sum = blkno.to_ne_bytes().iter().fold(0u64, |sum, &byte| {
        let x = byte as i8 as u64;
        let x2 = x.wrapping_mul(x);
        let x3 = x2.wrapping_mul(x);
        let x4 = x3.wrapping_mul(x);
        sum.wrapping_add(x4)
            .wrapping_add(x3)
            .wrapping_add(x2)
            .wrapping_add(x)
            .wrapping_add(1)
    });
    (sum % table_size as u64) as usize
}

/// Matches a block number against a stored counter.
pub fn same_block(blkno: &i32, item: &WorkItem) -> bool {
    item.blkno == *blkno
}
