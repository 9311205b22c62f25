use std::fmt;

use log::{debug, warn};

use crate::{
    config::{InsertPolicy, PrefetchMode, ReplacePolicy, SimConfig},
    sim::Simulator,
    stats::SimStats,
    trace::TraceFile,
};

#[derive(Debug, Clone)]
pub struct ScenarioConfig {
    pub label: String, // Label to be printed for the Result
    pub config: SimConfig,
}

#[derive(Debug, Clone)]
pub struct ScenarioResult {
    pub label: String,
    pub stats: SimStats,
}

impl fmt::Display for ScenarioResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<40} L1 hit {:>6.2}%  L2 read hit {:>6.2}%  AAT {:>8.3}",
            self.label,
            self.stats.hit_ratio_l1 * 100.0,
            self.stats.read_hit_ratio_l2 * 100.0,
            self.stats.avg_access_time_l1
        )
    }
}

pub fn run_scenarios(trace: &TraceFile, scenarios: &[ScenarioConfig]) -> Vec<ScenarioResult> {
    let mut results = Vec::new();
    for scenario in scenarios {
        if let Err(err) = scenario.config.validate() {
            warn!("Skipping {}: {err}", scenario.label);
            continue;
        }
        let mut sim = Simulator::setup(&scenario.config);
        sim.run(&trace.entries);
        let stats = sim.finish();
        debug!("{}: AAT {:.3}", scenario.label, stats.avg_access_time_l1);
        results.push(ScenarioResult {
            label: scenario.label.clone(),
            stats,
        });
    }
    results
}

/// Smallest L1 AAT; the earliest scenario wins a tie.
pub fn best_by_aat(results: &[ScenarioResult]) -> Option<&ScenarioResult> {
    results.iter().reduce(|best, candidate| {
        if candidate.stats.avg_access_time_l1 < best.stats.avg_access_time_l1 {
            candidate
        } else {
            best
        }
    })
}

pub fn l1_geometries(base: &SimConfig, shapes: &[(u32, u32)]) -> Vec<ScenarioConfig> {
    shapes
        .iter()
        .map(|&(c, s)| {
            let mut cfg = base.clone();
            cfg.l1.geometry.c = c;
            cfg.l1.geometry.s = s;
            ScenarioConfig {
                label: format!("L1 ({c},{},{s})", cfg.l1.geometry.b),
                config: cfg,
            }
        })
        .collect()
}

pub fn replacement_policies(base: &ScenarioConfig) -> Vec<ScenarioConfig> {
    [ReplacePolicy::Lru, ReplacePolicy::Lfu]
        .into_iter()
        .map(|policy| {
            let mut cfg = base.config.clone();
            cfg.l1.replace_policy = policy;
            cfg.l2.replace_policy = policy;
            ScenarioConfig {
                label: format!("{} {policy}", base.label),
                config: cfg,
            }
        })
        .collect()
}

pub fn prefetch_configs(base: &ScenarioConfig) -> Vec<ScenarioConfig> {
    let mut scenarios = Vec::new();
    for mode in [PrefetchMode::Off, PrefetchMode::NextLine, PrefetchMode::Stride] {
        let inserts: &[InsertPolicy] = match mode {
            PrefetchMode::Off => &[InsertPolicy::Mip],
            _ => &[InsertPolicy::Mip, InsertPolicy::Lip],
        };
        for &insert in inserts {
            let mut cfg = base.config.clone();
            cfg.l2.prefetcher = mode;
            cfg.l2.prefetch_insert_policy = insert;
            let label = match mode {
                PrefetchMode::Off => format!("{} no-prefetch", base.label),
                _ => format!("{} {mode}/{insert}", base.label),
            };
            scenarios.push(ScenarioConfig { label, config: cfg });
        }
    }
    scenarios
}

/// Every L1 shape paired with every policy and prefetcher choice. L2 keeps
/// the base geometry; shapes that break validation are dropped.
pub fn sweep_space(base: &SimConfig) -> Vec<ScenarioConfig> {
    let b = base.l1.geometry.b;
    let shapes: Vec<(u32, u32)> = (b..=base.l2.geometry.c.max(b))
        .flat_map(|c| (0..=c - b).map(move |s| (c, s)))
        .collect();
    l1_geometries(base, &shapes)
        .iter()
        .filter(|scenario| scenario.config.validate().is_ok())
        .flat_map(replacement_policies)
        .flat_map(|scenario| {
            if scenario.config.l2.enabled {
                prefetch_configs(&scenario)
            } else {
                vec![scenario]
            }
        })
        .collect()
}
