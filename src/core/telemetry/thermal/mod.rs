//! Temperature resolution for the CPU and GPU domains.
//!
//! Android kernels expose dozens of thermal zones and hwmon channels with
//! vendor-specific names and units. The resolver scores them by label,
//! samples the best few, and falls back to the thermal service dump when no
//! node is readable.

mod resolver;
mod scoring;

pub use resolver::{scan_candidates, ResolverState, TempCache, TempCandidate, TempResolver};
pub use scoring::{
    parse_dumpsys_thermal, score_label, DumpsysHit, ThermalProfile, CPU_PROFILE, GPU_PROFILE,
};
