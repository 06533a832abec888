#![allow(missing_docs)]

mod work_item;

use clap::Parser;
use color_eyre::eyre::{ensure, eyre, Result};
use fixed_table::{FillFactor, FixedTable, KeyEq, ProbeAction, Probed, SlotHasher, TableConfig};

use crate::work_item::{polynomial_slot, same_block, WorkItem};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Maximum number of live block counters.
    #[clap(short = 'n', long, default_value = "10")]
    entries: usize,
    /// Fill factor in (0, 1].
    #[clap(short = 'f', long, default_value = "0.5", value_parser = parse_fill_factor)]
    fill_factor: FillFactor,
    /// Log every physical slot after the first lookups.
    #[clap(long)]
    dump: bool,
}

fn parse_fill_factor(arg: &str) -> Result<FillFactor, String> {
    let value: f64 = arg.parse().map_err(|err| format!("{err}"))?;
    FillFactor::new(value).ok_or_else(|| format!("{value} is not in (0, 1]"))
}

fn dump<H, E>(table: &FixedTable<WorkItem, H, E>) {
    for (index, slot) in table.slots().iter().enumerate() {
        match slot.record() {
            Some(item) => log::info!("[{index}] blkno={} hits={}", item.blkno, item.hits),
            None if slot.is_tombstone() => log::info!("[{index}] tombstone"),
            None => log::info!("[{index}] empty"),
        }
    }
}

fn lookups(
    table: &mut FixedTable<WorkItem, impl SlotHasher<i32>, impl KeyEq<i32, WorkItem>>,
    dump_slots: bool,
) -> Result<()> {
    for blkno in [5, 101] {
        let Probed::Inserted(item) = table.probe(&blkno, ProbeAction::Enter) else {
            return Err(eyre!("block {blkno} should be new"));
        };
        ensure!(item.blkno == blkno && item.hits == 0, "fresh counter {item:?}");
        if blkno == 5 {
            item.hits = 11;
        }
        log::info!("entered block {blkno}");
    }

    for expected in 0..2 {
        let Probed::Found(item) = table.probe(&101, ProbeAction::Find) else {
            return Err(eyre!("block 101 should be present"));
        };
        ensure!(item.hits == expected, "block 101 has {} hits", item.hits);
        item.hits += 1;
    }

    let block_5 = table.find(&5).map(|item| item.hits);
    ensure!(block_5 == Some(11), "block 5 has {block_5:?} hits");

    let missing = table.probe(&4, ProbeAction::Find);
    ensure!(!missing.found() && missing.record().is_none(), "block 4 should be absent");

    if dump_slots {
        dump(table);
    }
    Ok(())
}

fn fill(
    table: &mut FixedTable<WorkItem, impl SlotHasher<i32>, impl KeyEq<i32, WorkItem>>,
) -> Result<i32> {
    let mut blkno = 1000;
    let mut hits = 0;
    while let Some((item, found)) = table.enter(&blkno) {
        ensure!(!found, "block {blkno} entered twice");
        blkno += 1;
        hits += 1;
        item.hits = hits;
        log::debug!("{} of {} counters live", table.len(), table.capacity());
    }
    log::info!(
        "table full with {} counters in {} slots",
        table.len(),
        table.physical_size()
    );
    ensure!(table.len() == table.capacity(), "table filled early");
    Ok(blkno)
}

fn drain(
    table: &mut FixedTable<WorkItem, impl SlotHasher<i32>, impl KeyEq<i32, WorkItem>>,
    end: i32,
) -> Result<()> {
    for blkno in (1000..end).rev() {
        let removed = table.probe(&blkno, ProbeAction::Remove);
        ensure!(removed.found(), "block {blkno} missing");
        log::debug!("removed {:?}", removed.record());
    }
    ensure!(table.is_empty(), "{} counters left after draining", table.len());
    log::info!("drained table, {} tombstones", table.tombstones());
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    color_eyre::install()?;
    fixed_table_logger::setup();

    let start = fixed_table_logger::memory_usage();

    let mut table: FixedTable<WorkItem, _, _> = TableConfig::new(args.entries)
        .with_fill_factor(args.fill_factor)
        .with_hasher(polynomial_slot)
        .with_equality(same_block)
        .build();
    log::info!(
        "{} slots for {} counters at fill factor {}",
        table.physical_size(),
        table.capacity(),
        table.fill_factor()
    );

    if args.entries >= 2 {
        lookups(&mut table, args.dump)?;
        table.clean();
        ensure!(!table.contains(&101), "clean kept block 101");
    }

    let end = fill(&mut table)?;

    if end > 1000 {
        let middle = 1000 + (end - 1000) / 2;
        let (item, found) = table
            .enter(&middle)
            .ok_or_else(|| eyre!("entering present block {middle} failed"))?;
        ensure!(found, "block {middle} not found");
        ensure!(item.hits == middle - 999, "block {middle} has {} hits", item.hits);
    }

    let mut scan = table.seq_scan();
    while let Some(item) = scan.next(&table) {
        log::info!("--> blkno={} hits={}", item.blkno, item.hits);
    }

    drain(&mut table, end)?;

    if args.entries > 0 {
        let (_, found) = table
            .enter(&111)
            .ok_or_else(|| eyre!("no room for block 111"))?;
        ensure!(!found && table.len() == 1, "block 111 should be the only counter");
    }

    let end_usage = fixed_table_logger::memory_usage();
    log::info!("resident memory {} -> {}", start.current, end_usage.current);

    table.destroy();
    log::info!("demo passed");
    Ok(())
}
