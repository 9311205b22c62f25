pub mod address;
pub mod cache;
pub mod config;
pub mod experiments;
pub mod policy;
pub mod prefetch;
pub mod sim;
pub mod stats;
pub mod trace;

pub use address::Geometry;
pub use config::{
    CacheConfig, ConfigError, InsertPolicy, PrefetchMode, ReplacePolicy, SimConfig, WriteStrategy,
};
pub use sim::Simulator;
pub use stats::SimStats;
pub use trace::{AccessKind, TraceAccess, TraceFile};
