#![cfg(test)]
#![allow(missing_docs)]
use crate::{FixedTable, KeyEquality, ProbeAction, Probed, Record, SlotHasher, TableConfig};
use hashbrown::HashTable;
use rand::prelude::*;
use std::hash::{BuildHasher, BuildHasherDefault};
use zwohash::ZwoHasher;

#[derive(Clone, Debug, PartialEq, Eq)]
struct Counter {
    key: u32,
    hits: u32,
}

impl Record for Counter {
    type Key = u32;

    fn with_key(key: &u32) -> Self {
        Counter { key: *key, hits: 0 }
    }

    fn key(&self) -> &u32 {
        &self.key
    }
}

fn hash_ref(key: &u32) -> u64 {
    <BuildHasherDefault<ZwoHasher>>::default().hash_one(key)
}

struct CheckedTable<H> {
    dut: FixedTable<Counter, H, KeyEquality>,
    ref_table: HashTable<Counter>,
}

#[derive(Debug, PartialEq, Eq)]
enum Outcome {
    Found(Counter),
    Inserted(Counter),
    Removed(Counter),
    Absent,
    Full,
}

impl<H: SlotHasher<u32>> CheckedTable<H> {
    fn new(config: TableConfig<H>) -> Self {
        CheckedTable {
            dut: config.build(),
            ref_table: HashTable::new(),
        }
    }

    fn probe(&mut self, key: u32, action: ProbeAction) -> Outcome {
        let capacity = self.dut.capacity();
        let ref_len = self.ref_table.len();
        let hash = hash_ref(&key);
        let ref_result = match action {
            ProbeAction::Find | ProbeAction::Enter => {
                match self.ref_table.find_mut(hash, |c| c.key == key) {
                    Some(counter) => {
                        counter.hits += 1;
                        Outcome::Found(counter.clone())
                    }
                    None if action == ProbeAction::Find => Outcome::Absent,
                    None if ref_len < capacity => {
                        let counter = Counter { key, hits: 1 };
                        self.ref_table
                            .insert_unique(hash, counter.clone(), |c| hash_ref(&c.key));
                        Outcome::Inserted(counter)
                    }
                    None => Outcome::Full,
                }
            }
            ProbeAction::Remove => match self.ref_table.find_entry(hash, |c| c.key == key) {
                Ok(entry) => Outcome::Removed(entry.remove().0),
                Err(_) => Outcome::Absent,
            },
        };

        let dut_result = match self.dut.probe(&key, action) {
            Probed::Found(counter) => {
                counter.hits += 1;
                Outcome::Found(counter.clone())
            }
            Probed::Inserted(counter) => {
                assert_eq!(counter.hits, 0);
                counter.hits += 1;
                Outcome::Inserted(counter.clone())
            }
            Probed::Removed(counter) => Outcome::Removed(counter),
            Probed::Absent => Outcome::Absent,
            Probed::Full => Outcome::Full,
        };

        assert_eq!(ref_result, dut_result);
        assert_eq!(self.ref_table.len(), self.dut.len());
        assert!(self.dut.len() <= capacity);
        assert!(self.dut.probe_len(&key) <= self.dut.physical_size());
        dut_result
    }

    fn clean(&mut self) {
        self.dut.clean();
        self.ref_table.clear();
    }

    fn check(&mut self) {
        self.dut.check();
        assert_eq!(self.dut.iter().len(), self.ref_table.len());
        for counter in self.dut.iter() {
            assert_eq!(
                self.ref_table.find(hash_ref(&counter.key), |c| c.key == counter.key),
                Some(counter)
            );
        }
        for counter in self.ref_table.iter() {
            assert_eq!(self.dut.find(&counter.key), Some(counter));
        }
        let mut scan = self.dut.seq_scan();
        let mut scanned = 0;
        while scan.next(&self.dut).is_some() {
            scanned += 1;
        }
        assert_eq!(scanned, self.dut.len());
    }
}

macro_rules! weighted_choose {
    ($rng:expr, $($name:ident: $weight:expr => $body:expr),+) => {
        {
            enum Branches { $( $name,  )* }
            let weights = [$((Branches::$name, $weight)),+];
            match weights.choose_weighted($rng, |x| x.1).unwrap().0 {
                $(Branches::$name => $body),*
            }
        }
    }
}

fn test_suite<H: SlotHasher<u32>, R: Rng + SeedableRng>(config: TableConfig<H>, key_range: u32) {
    let mut table = CheckedTable::new(config);
    let mut rng = R::seed_from_u64(25);
    let mut max_size = 0;
    let mut rejected = 0;
    let verbosity = 1;
    for _ in 0..5000 {
        weighted_choose! {&mut rng,
            Enter: 1.0 => {
                let key = rng.gen_range(0..key_range);
                let result = table.probe(key, ProbeAction::Enter);
                if result == Outcome::Full {
                    rejected += 1;
                }
                if verbosity > 0 {
                    println!("entering {key} -> {result:?}");
                }
            },
            FindPresent: 0.3 => {
                if let Some(key) = table.ref_table.iter().map(|c| c.key).choose(&mut rng) {
                    let result = table.probe(key, ProbeAction::Find);
                    if verbosity > 0 {
                        println!("finding {key} -> {result:?}");
                    }
                }
            },
            FindRandom: 0.3 => {
                let key = rng.gen_range(0..key_range);
                let result = table.probe(key, ProbeAction::Find);
                if verbosity > 0 {
                    println!("finding {key} -> {result:?}");
                }
            },
            RemovePresent: 0.4 => {
                if let Some(key) = table.ref_table.iter().map(|c| c.key).choose(&mut rng) {
                    let result = table.probe(key, ProbeAction::Remove);
                    if verbosity > 0 {
                        println!("removing {key} -> {result:?}");
                    }
                }
            },
            RemoveRandom: 0.3 => {
                let key = rng.gen_range(0..key_range);
                let result = table.probe(key, ProbeAction::Remove);
                if verbosity > 0 {
                    println!("removing {key} -> {result:?}");
                }
            },
            Clean: 0.005 => {
                table.clean();
                if verbosity > 0 {
                    println!("clean");
                }
            },
            Check: 0.15 => {
                table.check();
                if verbosity > 0 {
                    println!("check");
                }
            }
        };
        max_size = std::cmp::max(max_size, table.dut.len());
    }
    table.check();
    println!("max size: {max_size}, rejected insertions: {rejected}");
}

#[test]
fn test_suite_default_hasher() {
    test_suite::<_, rand_pcg::Pcg64>(TableConfig::new(100).with_fill_ratio(0.7), 400);
}

#[test]
fn test_suite_full_fill_factor() {
    test_suite::<_, rand_pcg::Pcg64>(TableConfig::new(64).with_fill_ratio(1.0), 200);
}

#[test]
fn test_suite_clustering_hasher() {
    // map runs of 8 keys to the same start slot to get long probe sequences
    let config = TableConfig::new(40)
        .with_fill_ratio(0.9)
        .with_hasher(|key: &u32, size: usize| (*key as usize / 8) % size);
    test_suite::<_, rand_pcg::Pcg64>(config, 120);
}

#[test]
fn test_suite_constant_hasher() {
    let config = TableConfig::new(12)
        .with_fill_ratio(1.0)
        .with_hasher(|_: &u32, _: usize| 5);
    test_suite::<_, rand_pcg::Pcg64>(config, 30);
}

#[test]
fn test_suite_tiny_table() {
    test_suite::<_, rand_pcg::Pcg64>(TableConfig::new(1).with_fill_ratio(0.5), 4);
}
