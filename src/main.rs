use std::{path::PathBuf, process::ExitCode};

use anyhow::{Context, Result};
use cachesim::{
    InsertPolicy, PrefetchMode, ReplacePolicy, SimConfig, Simulator, TraceFile,
    experiments::{ScenarioResult, best_by_aat, run_scenarios, sweep_space},
};
use clap::Parser;
use log::info;

#[derive(Parser, Debug)]
#[command(name = "cachesim", about = "Two-level cache hierarchy simulator")]
struct Args {
    /// Total size for L1 in bytes is 2^C1
    #[arg(short = 'c', value_name = "C1", default_value_t = 10)]
    l1_c: u32,

    /// Size of each block in bytes is 2^B (shared by L1 and L2)
    #[arg(short = 'b', value_name = "B", default_value_t = 6)]
    block_bits: u32,

    /// Number of blocks per set for L1 is 2^S1
    #[arg(short = 's', value_name = "S1", default_value_t = 1)]
    l1_s: u32,

    /// Trace filename
    #[arg(short = 'f', value_name = "TRACEFILE")]
    trace: PathBuf,

    /// Replacement policy for both L1 and L2
    #[arg(short = 'r', value_enum, ignore_case = true, default_value_t = ReplacePolicy::Lru)]
    replace: ReplacePolicy,

    /// Total size in bytes for L2 is 2^C2
    #[arg(short = 'C', value_name = "C2", default_value_t = 15)]
    l2_c: u32,

    /// Number of blocks per set for L2 is 2^S2
    #[arg(short = 'S', value_name = "S2", default_value_t = 3)]
    l2_s: u32,

    /// Insertion policy for L2 prefetching
    #[arg(short = 'I', value_enum, ignore_case = true, default_value_t = InsertPolicy::Lip)]
    insert: InsertPolicy,

    /// Prefetcher: 0 is no prefetch, 1 is +1 prefetch, and 2 is strided
    #[arg(
        short = 'P',
        default_value_t = 2,
        value_parser = clap::value_parser!(u8).range(0..=2)
    )]
    prefetcher: u8,

    /// Disable L2 cache
    #[arg(short = 'D')]
    disable_l2: bool,

    /// Search L1 shapes, policies and prefetchers for the lowest L1 AAT
    #[arg(long)]
    sweep: bool,
}

impl Args {
    fn sim_config(&self) -> SimConfig {
        let mut config = SimConfig::default();
        config.l1.geometry.c = self.l1_c;
        config.l1.geometry.b = self.block_bits;
        config.l1.geometry.s = self.l1_s;
        config.l1.replace_policy = self.replace;

        config.l2.enabled = !self.disable_l2;
        config.l2.geometry.c = self.l2_c;
        config.l2.geometry.b = self.block_bits;
        config.l2.geometry.s = self.l2_s;
        config.l2.replace_policy = self.replace;
        config.l2.prefetch_insert_policy = self.insert;
        config.l2.prefetcher =
            PrefetchMode::from_switch(self.prefetcher).unwrap_or(PrefetchMode::Off);
        config
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            // help is not a failure
            return if err.use_stderr() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            println!("ERROR: {err:#}");
            ExitCode::from(1)
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let config = args.sim_config();

    println!("Cache Settings");
    println!("--------------");
    println!("L1 {}", config.l1);
    println!("L2 {}", config.l2);
    println!();

    config.validate().context("Invalid configuration!")?;

    let trace = TraceFile::load(&args.trace)?;
    info!(
        "Loaded {} accesses from {} ({} lines skipped)",
        trace.entries.len(),
        trace.name,
        trace.skipped
    );

    if args.sweep {
        let results = run_scenarios(&trace, &sweep_space(&config));
        print_sweep(&trace.name, &results);
        return Ok(());
    }

    let mut sim = Simulator::setup(&config);
    sim.run(&trace.entries);
    let stats = sim.finish();
    println!("{stats}");
    Ok(())
}

fn print_sweep(trace_name: &str, results: &[ScenarioResult]) {
    println!("== Sweep over {trace_name} ({} configurations) ==", results.len());
    for result in results {
        println!("  {result}");
    }
    if let Some(best) = best_by_aat(results) {
        println!();
        println!(
            "The smallest L1 average access time (AAT) is: {:.3} ({})",
            best.stats.avg_access_time_l1, best.label
        );
    }
}
