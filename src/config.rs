use std::fmt;

use clap::ValueEnum;
use thiserror::Error;

use crate::address::Geometry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReplacePolicy {
    Lru,
    Lfu,
}

impl fmt::Display for ReplacePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplacePolicy::Lru => write!(f, "LRU"),
            ReplacePolicy::Lfu => write!(f, "LFU"),
        }
    }
}

/// How a prefetched block enters its set. Demand fills always use `Mip`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InsertPolicy {
    Mip,
    Lip,
}

impl fmt::Display for InsertPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InsertPolicy::Mip => write!(f, "MIP"),
            InsertPolicy::Lip => write!(f, "LIP"),
        }
    }
}

/// Not branched on: L1 always write-allocates and the L1/L2 boundary always
/// behaves as write-through/no-write-allocate. `Simulator::setup` only warns
/// when L1 asks for anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStrategy {
    WriteBackAllocate,
    WriteThroughNoAllocate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefetchMode {
    Off,
    NextLine,
    Stride,
}

impl PrefetchMode {
    /// Maps the driver's `-P` switch: 0 off, 1 next-line, 2 stride.
    pub fn from_switch(value: u8) -> Option<Self> {
        match value {
            0 => Some(PrefetchMode::Off),
            1 => Some(PrefetchMode::NextLine),
            2 => Some(PrefetchMode::Stride),
            _ => None,
        }
    }
}

impl fmt::Display for PrefetchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrefetchMode::Off => write!(f, "off"),
            PrefetchMode::NextLine => write!(f, "+1"),
            PrefetchMode::Stride => write!(f, "strided"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    pub enabled: bool,
    pub geometry: Geometry,
    pub replace_policy: ReplacePolicy,
    pub prefetcher: PrefetchMode,
    pub prefetch_insert_policy: InsertPolicy,
    pub write_strategy: WriteStrategy,
}

impl CacheConfig {
    pub fn prefetcher_disabled(&self) -> bool {
        self.prefetcher == PrefetchMode::Off
    }
}

impl fmt::Display for CacheConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.enabled {
            return write!(f, "disabled");
        }
        let Geometry { c, b, s } = self.geometry;
        write!(
            f,
            "(C,B,S): ({c},{b},{s}). Replacement policy: {}.",
            self.replace_policy
        )?;
        match self.prefetcher {
            PrefetchMode::Off => write!(f, " Prefetcher disabled."),
            PrefetchMode::NextLine => write!(
                f,
                " +1 prefetcher. Prefetch insertion policy: {}.",
                self.prefetch_insert_policy
            ),
            PrefetchMode::Stride => write!(
                f,
                " Strided prefetcher. Prefetch insertion policy: {}.",
                self.prefetch_insert_policy
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimConfig {
    pub l1: CacheConfig,
    pub l2: CacheConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            l1: CacheConfig {
                enabled: true,
                geometry: Geometry::new(10, 6, 1),
                replace_policy: ReplacePolicy::Lru,
                prefetcher: PrefetchMode::Off,
                prefetch_insert_policy: InsertPolicy::Mip,
                write_strategy: WriteStrategy::WriteBackAllocate,
            },
            l2: CacheConfig {
                enabled: true,
                geometry: Geometry::new(15, 6, 3),
                replace_policy: ReplacePolicy::Lru,
                prefetcher: PrefetchMode::Stride,
                prefetch_insert_policy: InsertPolicy::Lip,
                write_strategy: WriteStrategy::WriteThroughNoAllocate,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("The block size must be reasonable: 4 <= B <= 7 (got B = {0})")]
    BlockSize(u32),
    #[error("L1 and L2 must share one block size (L1 B = {l1}, L2 B = {l2})")]
    BlockSizeMismatch { l1: u32, l2: u32 },
    #[error("{level} geometry ({c},{b},{s}) needs C >= B + S")]
    Geometry { level: &'static str, c: u32, b: u32, s: u32 },
    #[error("{level} geometry leaves no tag bits (C - S = {bits})")]
    NoTagBits { level: &'static str, bits: u32 },
    #[error("L1 associativity must be less than or equal to L2 associativity")]
    Associativity,
    #[error("L1 size must be strictly less than L2 size")]
    Capacity,
}

impl SimConfig {
    /// Applies the driver-side rules. Nothing is allocated until this passes.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let l1 = self.l1.geometry;
        let l2 = self.l2.geometry;

        if !(4..=7).contains(&l1.b) {
            return Err(ConfigError::BlockSize(l1.b));
        }
        check_geometry("L1", l1)?;

        if self.l2.enabled {
            if l2.b != l1.b {
                return Err(ConfigError::BlockSizeMismatch { l1: l1.b, l2: l2.b });
            }
            check_geometry("L2", l2)?;
            if l1.s > l2.s {
                return Err(ConfigError::Associativity);
            }
            if l1.c >= l2.c {
                return Err(ConfigError::Capacity);
            }
        }
        Ok(())
    }
}

fn check_geometry(level: &'static str, geometry: Geometry) -> Result<(), ConfigError> {
    let Geometry { c, b, s } = geometry;
    if c < b + s {
        return Err(ConfigError::Geometry { level, c, b, s });
    }
    if c - s >= u64::BITS {
        return Err(ConfigError::NoTagBits { level, bits: c - s });
    }
    Ok(())
}
