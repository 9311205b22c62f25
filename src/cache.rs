use std::fmt;

use log::debug;

use crate::address::Geometry;
use crate::config::{CacheConfig, InsertPolicy, ReplacePolicy};
use crate::prefetch::Prefetcher;
use crate::stats::SimStats;
use crate::trace::AccessKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    L1,
    L2,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::L1 => write!(f, "L1"),
            Level::L2 => write!(f, "L2"),
        }
    }
}

/// Strictly increasing counter used only to order blocks for LRU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogicalClock(u64);

impl LogicalClock {
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Returns the current value and moves past it.
    pub fn tick(&mut self) -> u64 {
        let now = self.0;
        self.0 += 1;
        now
    }

    pub fn advance(&mut self) {
        self.0 += 1;
    }

    pub fn now(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Block {
    pub tag: u64,
    pub valid: bool,
    pub dirty: bool,
    pub timestamp: u64,
    pub frequency: u64,
    pub mru: bool,
}

#[derive(Debug, Clone)]
pub struct CacheSet {
    blocks: Vec<Block>,
}

impl CacheSet {
    pub fn new(ways: usize) -> Self {
        Self {
            blocks: vec![Block::default(); ways],
        }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block_mut(&mut self, way: usize) -> &mut Block {
        &mut self.blocks[way]
    }

    pub fn find(&self, tag: u64) -> Option<usize> {
        self.blocks
            .iter()
            .position(|block| block.valid && block.tag == tag)
    }

    pub fn empty_slot(&self) -> Option<usize> {
        self.blocks.iter().position(|block| !block.valid)
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.iter().all(|block| !block.valid)
    }

    /// Sets the MRU flag on `way` and clears it everywhere else.
    pub fn mark_mru(&mut self, way: usize) {
        for (idx, block) in self.blocks.iter_mut().enumerate() {
            block.mru = idx == way;
        }
    }

    pub fn min_timestamp_except(&self, way: usize) -> Option<u64> {
        self.blocks
            .iter()
            .enumerate()
            .filter(|(idx, block)| *idx != way && block.valid)
            .map(|(_, block)| block.timestamp)
            .min()
    }
}

/// Outcome of installing a block: where it went and what it displaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fill {
    pub index: usize,
    pub way: usize,
    pub evicted: Option<Block>,
}

/// One cache level: its sets, its logical clock and, for the level that
/// prefetches, the prefetcher.
#[derive(Debug)]
pub struct Cache {
    level: Level,
    geometry: Geometry,
    policy: ReplacePolicy,
    sets: Vec<CacheSet>,
    clock: LogicalClock,
    prefetcher: Option<Prefetcher>,
}

impl Cache {
    pub fn new(level: Level, config: &CacheConfig) -> Self {
        let geometry = config.geometry;
        let sets = (0..geometry.num_sets())
            .map(|_| CacheSet::new(geometry.ways()))
            .collect();
        // Seeded above any zeroed timestamp so empty blocks never look recent.
        let seed = 1u64 << (geometry.c - geometry.b + 1);
        Self {
            level,
            geometry,
            policy: config.replace_policy,
            sets,
            clock: LogicalClock::new(seed),
            prefetcher: None,
        }
    }

    pub fn with_prefetcher(mut self, prefetcher: Prefetcher) -> Self {
        self.prefetcher = Some(prefetcher);
        self
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn clock(&self) -> LogicalClock {
        self.clock
    }

    pub fn sets(&self) -> &[CacheSet] {
        &self.sets
    }

    /// Demand probe. Counts the access against this level in `stats`.
    pub fn probe(&self, kind: AccessKind, address: u64, stats: &mut SimStats) -> Option<usize> {
        let hit = self.lookup(address);
        match self.level {
            Level::L1 => stats.record_l1_probe(kind, hit.is_some()),
            Level::L2 => stats.record_l2_probe(kind, hit.is_some()),
        }
        hit
    }

    /// Side-effect free residency check.
    pub fn lookup(&self, address: u64) -> Option<usize> {
        let (tag, index) = self.geometry.decompose(address);
        self.sets[index].find(tag)
    }

    pub fn contains(&self, address: u64) -> bool {
        self.lookup(address).is_some()
    }

    pub fn block(&self, address: u64) -> Option<&Block> {
        let (_, index) = self.geometry.decompose(address);
        self.lookup(address).map(|way| &self.sets[index].blocks()[way])
    }

    pub fn touch(&mut self, index: usize, way: usize) {
        self.policy.on_hit(&mut self.sets[index], way, &mut self.clock);
    }

    pub fn mark_dirty(&mut self, index: usize, way: usize) {
        self.sets[index].block_mut(way).dirty = true;
    }

    /// Installs the block holding `address`, into an empty way if there is
    /// one, otherwise over the policy's victim.
    pub fn fill(&mut self, address: u64, dirty: bool, insert: InsertPolicy) -> Fill {
        let (tag, index) = self.geometry.decompose(address);
        let set = &mut self.sets[index];
        let way = match set.empty_slot() {
            Some(way) => way,
            None => self.policy.select_victim(set),
        };

        let previous = set.blocks()[way];
        let evicted = previous.valid.then_some(previous);
        *set.block_mut(way) = Block {
            tag,
            valid: true,
            dirty,
            ..previous
        };
        match insert {
            InsertPolicy::Mip => self.policy.on_install(set, way, &mut self.clock),
            InsertPolicy::Lip => self.policy.on_cold_install(
                set,
                way,
                evicted.map(|block| block.timestamp),
                &mut self.clock,
            ),
        }

        if let Some(victim) = evicted {
            debug!(
                "Evict from {}: tag {:#x} index {:#x} dirty={}",
                self.level, victim.tag, index, victim.dirty
            );
        }
        Fill { index, way, evicted }
    }

    /// Runs the prefetcher for a demand miss at `address`. Returns the block
    /// address that was installed, or `None` when there is no prefetcher or
    /// the predicted block is already resident.
    pub fn prefetch(&mut self, address: u64) -> Option<u64> {
        let prefetcher = self.prefetcher.as_mut()?;
        let current = self.geometry.block_address(address);
        let predicted = prefetcher.predict(current);
        let insert = prefetcher.insert_policy();

        if self.contains(predicted) {
            return None;
        }
        debug!("Prefetch block {:#x} into {} ({})", predicted, self.level, insert);
        self.fill(predicted, false, insert);
        Some(predicted)
    }
}
