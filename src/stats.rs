use std::fmt;

use crate::address::Geometry;
use crate::trace::AccessKind;

pub const DRAM_ACCESS_TIME: f64 = 100.0;
pub const L1_HIT_K0: f64 = 1.0;
pub const L1_HIT_K1: f64 = 0.15;
pub const L1_HIT_K2: f64 = 0.15;
pub const L2_HIT_K3: f64 = 4.0;
pub const L2_HIT_K4: f64 = 0.3;
pub const L2_HIT_K5: f64 = 0.3;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimStats {
    pub reads: u64,
    pub writes: u64,
    pub accesses_l1: u64,
    pub hits_l1: u64,
    pub misses_l1: u64,
    pub accesses_l2: u64,
    pub reads_l2: u64,
    pub writes_l2: u64,
    pub read_hits_l2: u64,
    pub read_misses_l2: u64,
    pub prefetches_l2: u64,

    pub hit_ratio_l1: f64,
    pub miss_ratio_l1: f64,
    pub read_hit_ratio_l2: f64,
    pub read_miss_ratio_l2: f64,
    pub avg_access_time_l1: f64,
    pub avg_access_time_l2: f64,
}

impl SimStats {
    pub fn record_l1_probe(&mut self, kind: AccessKind, hit: bool) {
        self.accesses_l1 += 1;
        match kind {
            AccessKind::Read => self.reads += 1,
            AccessKind::Write => self.writes += 1,
        }
        if hit {
            self.hits_l1 += 1;
        } else {
            self.misses_l1 += 1;
        }
    }

    /// Write probes are write-back checks, not demand reads, so they never
    /// touch the read hit/miss counters.
    pub fn record_l2_probe(&mut self, kind: AccessKind, hit: bool) {
        self.accesses_l2 += 1;
        match kind {
            AccessKind::Read => {
                self.reads_l2 += 1;
                if hit {
                    self.read_hits_l2 += 1;
                } else {
                    self.read_misses_l2 += 1;
                }
            }
            AccessKind::Write => self.writes_l2 += 1,
        }
    }

    /// An L1 miss served straight from DRAM because L2 is disabled.
    pub fn record_dram_read(&mut self) {
        self.reads_l2 += 1;
        self.read_misses_l2 += 1;
    }

    pub fn record_dram_write(&mut self) {
        self.writes_l2 += 1;
    }

    /// Computes ratios and AATs. `l2` is `None` when L2 is disabled.
    pub fn finalize(&mut self, l1: Geometry, l2: Option<Geometry>) {
        self.hit_ratio_l1 = ratio(self.hits_l1, self.accesses_l1);
        self.miss_ratio_l1 = ratio(self.misses_l1, self.accesses_l1);
        self.read_hit_ratio_l2 = ratio(self.read_hits_l2, self.reads_l2);
        self.read_miss_ratio_l2 = ratio(self.read_misses_l2, self.reads_l2);

        self.avg_access_time_l2 = match l2 {
            Some(geometry) => {
                hit_time(geometry, L2_HIT_K3, L2_HIT_K4, L2_HIT_K5)
                    + self.read_miss_ratio_l2 * DRAM_ACCESS_TIME
            }
            None => DRAM_ACCESS_TIME,
        };
        self.avg_access_time_l1 = hit_time(l1, L1_HIT_K0, L1_HIT_K1, L1_HIT_K2)
            + self.miss_ratio_l1 * self.avg_access_time_l2;
    }
}

/// Zero when nothing was counted.
pub fn ratio(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

pub fn hit_time(geometry: Geometry, base: f64, per_index_bit: f64, per_extra_way_bit: f64) -> f64 {
    let index_bits = f64::from(geometry.index_bits());
    let extra_way_bits = f64::from(geometry.s.max(3) - 3);
    base + per_index_bit * index_bits + per_extra_way_bit * extra_way_bits
}

impl fmt::Display for SimStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Cache Statistics")?;
        writeln!(f, "----------------")?;
        writeln!(f, "Reads: {}", self.reads)?;
        writeln!(f, "Writes: {}", self.writes)?;
        writeln!(f)?;
        writeln!(f, "L1 accesses: {}", self.accesses_l1)?;
        writeln!(f, "L1 hits: {}", self.hits_l1)?;
        writeln!(f, "L1 misses: {}", self.misses_l1)?;
        writeln!(f, "L1 hit ratio: {:.3}", self.hit_ratio_l1)?;
        writeln!(f, "L1 miss ratio: {:.3}", self.miss_ratio_l1)?;
        writeln!(f, "L1 average access time (AAT): {:.3}", self.avg_access_time_l1)?;
        writeln!(f)?;
        writeln!(f, "L2 reads: {}", self.reads_l2)?;
        writeln!(f, "L2 writes: {}", self.writes_l2)?;
        writeln!(f, "L2 read hits: {}", self.read_hits_l2)?;
        writeln!(f, "L2 read misses: {}", self.read_misses_l2)?;
        writeln!(f, "L2 prefetches: {}", self.prefetches_l2)?;
        writeln!(f, "L2 read hit ratio: {:.3}", self.read_hit_ratio_l2)?;
        writeln!(f, "L2 read miss ratio: {:.3}", self.read_miss_ratio_l2)?;
        write!(f, "L2 average access time (AAT): {:.3}", self.avg_access_time_l2)
    }
}
