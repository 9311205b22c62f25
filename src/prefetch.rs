use crate::config::{CacheConfig, InsertPolicy, PrefetchMode};

#[derive(Debug, Clone)]
pub struct Prefetcher {
    mode: PrefetchMode,
    insert: InsertPolicy,
    block_size: u64,
    /// Block address of the last access that triggered a stride prediction.
    previous_block_address: u64,
}

impl Prefetcher {
    pub fn new(mode: PrefetchMode, insert: InsertPolicy, block_size: u64) -> Self {
        Self {
            mode,
            insert,
            block_size,
            previous_block_address: 0,
        }
    }

    /// Builds the prefetcher a level's configuration asks for, if any.
    pub fn from_config(config: &CacheConfig) -> Option<Self> {
        match config.prefetcher {
            PrefetchMode::Off => None,
            mode => Some(Self::new(
                mode,
                config.prefetch_insert_policy,
                config.geometry.block_size(),
            )),
        }
    }

    pub fn mode(&self) -> PrefetchMode {
        self.mode
    }

    pub fn insert_policy(&self) -> InsertPolicy {
        self.insert
    }

    pub fn previous_block_address(&self) -> u64 {
        self.previous_block_address
    }

    /// Predicts the next block from the block-aligned address of a demand
    /// miss. Stride mode remembers `current` for the next call.
    pub fn predict(&mut self, current: u64) -> u64 {
        match self.mode {
            PrefetchMode::Stride => {
                let stride = current.wrapping_sub(self.previous_block_address);
                self.previous_block_address = current;
                current.wrapping_add(stride)
            }
            PrefetchMode::NextLine | PrefetchMode::Off => current.wrapping_add(self.block_size),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;

    #[test]
    fn next_line_adds_one_block() {
        let mut prefetcher = Prefetcher::new(PrefetchMode::NextLine, InsertPolicy::Mip, 64);
        assert_eq!(prefetcher.predict(0x1000), 0x1040);
        assert_eq!(prefetcher.predict(0x1000), 0x1040);
        assert_eq!(prefetcher.previous_block_address(), 0);
    }

    #[test]
    fn stride_follows_delta_between_triggers() {
        let mut prefetcher = Prefetcher::new(PrefetchMode::Stride, InsertPolicy::Lip, 64);
        // first trigger measures against address 0
        assert_eq!(prefetcher.predict(0x100), 0x200);
        assert_eq!(prefetcher.predict(0x300), 0x500);
        assert_eq!(prefetcher.previous_block_address(), 0x300);
    }

    #[test]
    fn stride_handles_descending_streams() {
        let mut prefetcher = Prefetcher::new(PrefetchMode::Stride, InsertPolicy::Lip, 64);
        prefetcher.predict(0x1000);
        assert_eq!(prefetcher.predict(0xf80), 0xf00);
    }

    #[test]
    fn repeated_block_predicts_itself() {
        let mut prefetcher = Prefetcher::new(PrefetchMode::Stride, InsertPolicy::Mip, 64);
        prefetcher.predict(0x40);
        assert_eq!(prefetcher.predict(0x40), 0x40);
    }

    #[test]
    fn from_config_respects_mode() {
        let config = SimConfig::default();
        assert!(Prefetcher::from_config(&config.l1).is_none());
        let l2 = Prefetcher::from_config(&config.l2).unwrap();
        assert_eq!(l2.mode(), PrefetchMode::Stride);
        assert_eq!(l2.insert_policy(), InsertPolicy::Lip);
    }
}
