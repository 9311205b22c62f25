use log::{debug, info, warn};

use crate::cache::{Cache, Level};
use crate::config::{InsertPolicy, SimConfig, WriteStrategy};
use crate::prefetch::Prefetcher;
use crate::stats::SimStats;
use crate::trace::{AccessKind, TraceAccess};

#[derive(Debug)]
pub struct Simulator {
    l1: Cache,
    l2: Option<Cache>,
    stats: SimStats,
}

impl Simulator {
    /// Allocates both levels. `config` must already have passed
    /// [`SimConfig::validate`].
    pub fn setup(config: &SimConfig) -> Self {
        if config.l1.prefetcher_disabled() {
            debug!("L1 prefetcher off");
        } else {
            warn!("L1 prefetcher settings are ignored; only L2 prefetches");
        }
        if config.l1.write_strategy != WriteStrategy::WriteBackAllocate {
            warn!(
                "L1 write strategy {:?} is ignored; L1 always write-allocates",
                config.l1.write_strategy
            );
        }

        let l1 = Cache::new(Level::L1, &config.l1);
        let l2 = config.l2.enabled.then(|| {
            let cache = Cache::new(Level::L2, &config.l2);
            match Prefetcher::from_config(&config.l2) {
                Some(prefetcher) => cache.with_prefetcher(prefetcher),
                None => cache,
            }
        });
        info!("Simulating L1 {} / L2 {}", config.l1, config.l2);
        Self {
            l1,
            l2,
            stats: SimStats::default(),
        }
    }

    pub fn l1(&self) -> &Cache {
        &self.l1
    }

    pub fn l2(&self) -> Option<&Cache> {
        self.l2.as_ref()
    }

    pub fn stats(&self) -> &SimStats {
        &self.stats
    }

    pub fn access(&mut self, kind: AccessKind, address: u64) {
        let (tag, index) = self.l1.geometry().decompose(address);
        debug!("{} {:#x} -> L1 tag {:#x} index {:#x}", kind, address, tag, index);

        if let Some(way) = self.l1.probe(kind, address, &mut self.stats) {
            debug!("L1 hit");
            if kind == AccessKind::Write {
                self.l1.mark_dirty(index, way);
            }
            self.l1.touch(index, way);
            return;
        }

        debug!("L1 miss");
        self.resolve_in_l2(address);

        let fill = self.l1.fill(address, kind == AccessKind::Write, InsertPolicy::Mip);
        if let Some(victim) = fill.evicted.filter(|block| block.dirty) {
            let victim_address = self.l1.geometry().recompose(victim.tag, fill.index);
            self.write_back(victim_address);
        }
    }

    pub fn run(&mut self, trace: &[TraceAccess]) {
        for access in trace {
            self.access(access.kind, access.address);
        }
    }

    /// Computes the derived statistics and releases both levels.
    pub fn finish(self) -> SimStats {
        let Self { l1, l2, mut stats } = self;
        stats.finalize(l1.geometry(), l2.as_ref().map(Cache::geometry));
        info!(
            "Finished after {} accesses: L1 AAT {:.3}",
            stats.accesses_l1, stats.avg_access_time_l1
        );
        stats
    }

    /// Brings the block for an L1 miss in through L2, prefetching on an L2
    /// miss. Without L2 the block comes straight from DRAM.
    fn resolve_in_l2(&mut self, address: u64) {
        let Some(l2) = self.l2.as_mut() else {
            self.stats.record_dram_read();
            return;
        };

        match l2.probe(AccessKind::Read, address, &mut self.stats) {
            Some(way) => {
                debug!("L2 read hit");
                let (_, index) = l2.geometry().decompose(address);
                l2.touch(index, way);
            }
            None => {
                debug!("L2 read miss");
                l2.fill(address, false, InsertPolicy::Mip);
                if l2.prefetch(address).is_some() {
                    self.stats.prefetches_l2 += 1;
                }
            }
        }
    }

    /// A dirty L1 victim refreshes its L2 copy if L2 holds one. L2 never
    /// allocates on this path.
    fn write_back(&mut self, address: u64) {
        debug!("Write back {:#x}", address);
        let Some(l2) = self.l2.as_mut() else {
            self.stats.record_dram_write();
            return;
        };
        if let Some(way) = l2.probe(AccessKind::Write, address, &mut self.stats) {
            let (_, index) = l2.geometry().decompose(address);
            l2.touch(index, way);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Geometry;
    use crate::config::{PrefetchMode, ReplacePolicy};

    fn l1_only(geometry: Geometry, policy: ReplacePolicy) -> SimConfig {
        let mut config = SimConfig::default();
        config.l1.geometry = geometry;
        config.l1.replace_policy = policy;
        config.l2.enabled = false;
        config
    }

    #[test]
    fn write_hit_marks_block_dirty() {
        let mut sim = Simulator::setup(&l1_only(Geometry::new(10, 6, 1), ReplacePolicy::Lru));
        sim.access(AccessKind::Read, 0x100);
        assert!(!sim.l1().block(0x100).unwrap().dirty);
        sim.access(AccessKind::Write, 0x104);
        assert!(sim.l1().block(0x100).unwrap().dirty);
    }

    #[test]
    fn disabled_l2_counts_dram_traffic() {
        let mut sim = Simulator::setup(&l1_only(Geometry::new(10, 6, 0), ReplacePolicy::Lfu));
        sim.access(AccessKind::Write, 0x000);
        sim.access(AccessKind::Read, 0x400);
        let stats = sim.finish();
        assert_eq!(stats.reads_l2, 2);
        assert_eq!(stats.read_misses_l2, 2);
        assert_eq!(stats.writes_l2, 1);
        assert_eq!(stats.accesses_l2, 0);
    }

    #[test]
    fn l2_hit_refreshes_without_prefetch() {
        let mut config = SimConfig::default();
        config.l2.prefetcher = PrefetchMode::NextLine;
        let mut sim = Simulator::setup(&config);
        // 0x0 and 0x200 collide in L1 set 0 (2-way); 0x400 pushes 0x0 out
        for address in [0x0, 0x200, 0x400] {
            sim.access(AccessKind::Read, address);
        }
        let prefetches = sim.stats().prefetches_l2;
        sim.access(AccessKind::Read, 0x0);
        assert_eq!(sim.stats().read_hits_l2, 1);
        assert_eq!(sim.stats().prefetches_l2, prefetches);
    }

    #[test]
    fn read_fill_after_dirty_eviction_is_clean() {
        let mut sim = Simulator::setup(&l1_only(Geometry::new(10, 6, 0), ReplacePolicy::Lru));
        sim.access(AccessKind::Write, 0x000);
        sim.access(AccessKind::Read, 0x400);
        assert!(!sim.l1().block(0x400).unwrap().dirty);
        assert!(!sim.l1().contains(0x000));
    }

    fn write_back_config(policy: ReplacePolicy) -> SimConfig {
        let mut config = SimConfig::default();
        config.l1.geometry = Geometry::new(10, 6, 0);
        config.l1.replace_policy = policy;
        config.l2.replace_policy = policy;
        config.l2.prefetcher = PrefetchMode::Off;
        config
    }

    #[test]
    fn dirty_write_back_refreshes_l2_lru_timestamp() {
        let mut sim = Simulator::setup(&write_back_config(ReplacePolicy::Lru));
        sim.access(AccessKind::Write, 0x000);
        let before = sim.l2().unwrap().block(0x000).unwrap().timestamp;
        // 0x400 maps to L1 set 0 and evicts the dirty 0x000
        sim.access(AccessKind::Read, 0x400);
        let after = sim.l2().unwrap().block(0x000).unwrap().timestamp;
        assert_eq!(before, 1024);
        assert_eq!(after, 1026);
        assert!(after > sim.l2().unwrap().block(0x400).unwrap().timestamp);
    }

    #[test]
    fn dirty_write_back_bumps_l2_lfu_frequency() {
        let mut sim = Simulator::setup(&write_back_config(ReplacePolicy::Lfu));
        sim.access(AccessKind::Write, 0x000);
        assert_eq!(sim.l2().unwrap().block(0x000).unwrap().frequency, 1);
        sim.access(AccessKind::Read, 0x400);
        let block = *sim.l2().unwrap().block(0x000).unwrap();
        assert_eq!(block.frequency, 2);
        assert!(block.mru);
        assert!(!block.dirty);
    }
}
