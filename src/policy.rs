use crate::cache::{CacheSet, LogicalClock};
use crate::config::ReplacePolicy;

impl ReplacePolicy {
    /// Picks the way to evict from a full set.
    ///
    /// LRU takes the smallest timestamp, lowest way first on ties. LFU skips
    /// the MRU block and takes the smallest frequency, smallest tag on ties;
    /// when the MRU block is the only candidate (one-way sets) it is evicted.
    pub fn select_victim(self, set: &CacheSet) -> usize {
        let valid = set
            .blocks()
            .iter()
            .enumerate()
            .filter(|(_, block)| block.valid);
        let victim = match self {
            ReplacePolicy::Lru => valid
                .min_by_key(|(_, block)| block.timestamp)
                .map(|(way, _)| way),
            ReplacePolicy::Lfu => valid
                .clone()
                .filter(|(_, block)| !block.mru)
                .min_by_key(|(_, block)| (block.frequency, block.tag))
                .or_else(|| valid.min_by_key(|(_, block)| (block.frequency, block.tag)))
                .map(|(way, _)| way),
        };
        victim.unwrap_or(0)
    }

    /// Demand install: the block becomes the most recent in its set.
    pub fn on_install(self, set: &mut CacheSet, way: usize, clock: &mut LogicalClock) {
        match self {
            ReplacePolicy::Lru => set.block_mut(way).timestamp = clock.tick(),
            ReplacePolicy::Lfu => {
                set.block_mut(way).frequency = 1;
                set.mark_mru(way);
            }
        }
    }

    pub fn on_hit(self, set: &mut CacheSet, way: usize, clock: &mut LogicalClock) {
        match self {
            ReplacePolicy::Lru => set.block_mut(way).timestamp = clock.tick(),
            ReplacePolicy::Lfu => {
                set.block_mut(way).frequency += 1;
                set.mark_mru(way);
            }
        }
    }

    /// Cold install for LIP prefetches: the block becomes the next eviction
    /// candidate. `displaced` is the timestamp of the valid block this one
    /// replaced, if any.
    pub fn on_cold_install(
        self,
        set: &mut CacheSet,
        way: usize,
        displaced: Option<u64>,
        clock: &mut LogicalClock,
    ) {
        match self {
            ReplacePolicy::Lru => match set.min_timestamp_except(way).or(displaced) {
                Some(floor) => {
                    set.block_mut(way).timestamp = floor.saturating_sub(1);
                    clock.advance();
                }
                // nothing to sit below
                None => set.block_mut(way).timestamp = clock.tick(),
            },
            ReplacePolicy::Lfu => {
                let block = set.block_mut(way);
                block.frequency = 0;
                block.mru = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Block;

    fn set_of(blocks: &[Block]) -> CacheSet {
        let mut set = CacheSet::new(blocks.len());
        for (way, block) in blocks.iter().enumerate() {
            *set.block_mut(way) = *block;
        }
        set
    }

    fn lru_block(tag: u64, timestamp: u64) -> Block {
        Block {
            tag,
            valid: true,
            timestamp,
            ..Block::default()
        }
    }

    fn lfu_block(tag: u64, frequency: u64, mru: bool) -> Block {
        Block {
            tag,
            valid: true,
            frequency,
            mru,
            ..Block::default()
        }
    }

    #[test]
    fn lru_picks_oldest_timestamp() {
        let set = set_of(&[lru_block(1, 40), lru_block(2, 12), lru_block(3, 30)]);
        assert_eq!(ReplacePolicy::Lru.select_victim(&set), 1);
    }

    #[test]
    fn lru_breaks_ties_by_lowest_way() {
        let set = set_of(&[lru_block(1, 40), lru_block(2, 7), lru_block(3, 7)]);
        assert_eq!(ReplacePolicy::Lru.select_victim(&set), 1);
    }

    #[test]
    fn lfu_never_picks_mru_block() {
        let set = set_of(&[
            lfu_block(9, 1, true),
            lfu_block(4, 5, false),
            lfu_block(7, 2, false),
        ]);
        assert_eq!(ReplacePolicy::Lfu.select_victim(&set), 2);
    }

    #[test]
    fn lfu_breaks_ties_by_smallest_tag() {
        let set = set_of(&[
            lfu_block(9, 2, false),
            lfu_block(3, 2, false),
            lfu_block(5, 2, true),
            lfu_block(6, 4, false),
        ]);
        assert_eq!(ReplacePolicy::Lfu.select_victim(&set), 1);
    }

    #[test]
    fn lfu_one_way_set_evicts_its_only_block() {
        let set = set_of(&[lfu_block(42, 3, true)]);
        assert_eq!(ReplacePolicy::Lfu.select_victim(&set), 0);
    }

    #[test]
    fn lfu_install_moves_mru_flag() {
        let mut set = set_of(&[lfu_block(1, 3, true), lfu_block(2, 1, false)]);
        let mut clock = LogicalClock::new(100);
        ReplacePolicy::Lfu.on_install(&mut set, 1, &mut clock);
        assert!(!set.blocks()[0].mru);
        assert!(set.blocks()[1].mru);
        assert_eq!(set.blocks()[1].frequency, 1);
        assert_eq!(clock.now(), 100);
    }

    #[test]
    fn lru_hit_takes_fresh_timestamp() {
        let mut set = set_of(&[lru_block(1, 3), lru_block(2, 4)]);
        let mut clock = LogicalClock::new(100);
        ReplacePolicy::Lru.on_hit(&mut set, 0, &mut clock);
        assert_eq!(set.blocks()[0].timestamp, 100);
        assert_eq!(clock.now(), 101);
    }

    #[test]
    fn lru_cold_install_sits_below_minimum() {
        let mut set = set_of(&[lru_block(1, 50), lru_block(2, 60), Block::default()]);
        let mut clock = LogicalClock::new(100);
        set.block_mut(2).valid = true;
        ReplacePolicy::Lru.on_cold_install(&mut set, 2, None, &mut clock);
        assert_eq!(set.blocks()[2].timestamp, 49);
        assert_eq!(clock.now(), 101);
        assert_eq!(ReplacePolicy::Lru.select_victim(&set), 2);
    }

    #[test]
    fn lru_cold_install_into_empty_set_is_fresh() {
        let mut set = CacheSet::new(2);
        let mut clock = LogicalClock::new(100);
        set.block_mut(0).valid = true;
        ReplacePolicy::Lru.on_cold_install(&mut set, 0, None, &mut clock);
        assert_eq!(set.blocks()[0].timestamp, 100);
        assert_eq!(clock.now(), 101);
    }

    #[test]
    fn lfu_cold_install_resets_to_cold() {
        let mut set = set_of(&[lfu_block(1, 3, false), lfu_block(2, 5, true)]);
        let mut clock = LogicalClock::new(100);
        ReplacePolicy::Lfu.on_cold_install(&mut set, 0, Some(0), &mut clock);
        assert_eq!(set.blocks()[0].frequency, 0);
        assert!(!set.blocks()[0].mru);
        assert!(set.blocks()[1].mru);
    }
}
