#![allow(dead_code)]

use cachesim::{AccessKind, Geometry, ReplacePolicy, SimConfig, SimStats, Simulator};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn replay(config: &SimConfig, trace: &[(AccessKind, u64)]) -> SimStats {
    init_logging();
    let mut sim = Simulator::setup(config);
    for &(kind, address) in trace {
        sim.access(kind, address);
    }
    sim.finish()
}

pub fn l1_only(geometry: Geometry, policy: ReplacePolicy) -> SimConfig {
    let mut config = SimConfig::default();
    config.l1.geometry = geometry;
    config.l1.replace_policy = policy;
    config.l2.enabled = false;
    config
}

pub fn read(address: u64) -> (AccessKind, u64) {
    (AccessKind::Read, address)
}

pub fn write(address: u64) -> (AccessKind, u64) {
    (AccessKind::Write, address)
}
