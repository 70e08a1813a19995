//! Telemetry core: readers, temperature resolution and the sampling loop.
//!
//! Each tick the [`Sampler`] reads CPU, GPU and RAM in that order through a
//! shared [`SensorAccess`](crate::platform::SensorAccess) and produces an
//! immutable [`Snapshot`].

pub mod cpu;
pub mod gpu;
pub mod ram;
pub mod thermal;
pub mod units;

mod collector;
mod history;
mod metrics;
mod runtime;

pub use collector::Sampler;
pub use cpu::CpuReader;
pub use gpu::GpuReader;
pub use history::{UsageHistory, DEFAULT_HISTORY_SIZE};
pub use metrics::{
    CpuCoreStats, CpuStats, FreqSource, GpuParams, GpuStaticInfo, GpuStats, GpuVendor, RamStats,
    Snapshot, TempReading, TempState, UsageSource, Zram, ZramStats,
};
pub use ram::RamReader;
pub use runtime::{sampling_loop, SamplerRuntime};
pub use thermal::{ResolverState, TempCandidate, TempResolver};
