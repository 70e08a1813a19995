//! CPU usage and frequency from `/proc/stat` and cpufreq.

use std::collections::HashMap;
use std::time::Instant;

use super::metrics::{CpuCoreStats, CpuStats};
use super::thermal::TempResolver;
use super::units::read_freq_mhz;
use crate::platform::SensorAccess;

const PROC_STAT: &str = "/proc/stat";
const CPU_SYSFS: &str = "/sys/devices/system/cpu";

/// Which `/proc/stat` line a counter pair belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CounterSlot {
    Aggregate,
    Core(usize),
}

/// Cumulative jiffy counters for one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuCounters {
    pub total: u64,
    /// idle + iowait
    pub idle: u64,
}

impl CpuCounters {
    /// Needs at least user, nice, system, idle, iowait.
    pub fn from_fields(fields: &[u64]) -> Option<Self> {
        if fields.len() < 5 {
            return None;
        }
        Some(Self {
            total: fields.iter().fold(0u64, |acc, &f| acc.saturating_add(f)),
            idle: fields[3].saturating_add(fields[4]),
        })
    }
}

/// Parse the `cpu` / `cpuN` lines of `/proc/stat`.
pub fn parse_proc_stat(text: &str) -> Vec<(CounterSlot, CpuCounters)> {
    text.lines()
        .filter(|line| line.starts_with("cpu"))
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let name = parts.next()?;
            let slot = match name.strip_prefix("cpu")? {
                "" => CounterSlot::Aggregate,
                index => CounterSlot::Core(index.parse().ok()?),
            };
            let fields: Vec<u64> = parts.filter_map(|p| p.parse().ok()).collect();
            Some((slot, CpuCounters::from_fields(&fields)?))
        })
        .collect()
}

/// Last-tick counters, keyed by slot.
#[derive(Debug, Clone, Default)]
pub struct PreviousCounters {
    counters: HashMap<CounterSlot, CpuCounters>,
}

impl PreviousCounters {
    /// Usage since the last observation of `slot`, recording `current`.
    ///
    /// The first observation of a slot is defined as 0.
    pub fn usage(&mut self, slot: CounterSlot, current: CpuCounters) -> f32 {
        let Some(previous) = self.counters.insert(slot, current) else {
            return 0.0;
        };

        let total_delta = current.total.saturating_sub(previous.total);
        let idle_delta = current.idle.saturating_sub(previous.idle);
        if total_delta == 0 {
            return 0.0;
        }

        let busy = total_delta.saturating_sub(idle_delta);
        (busy as f32 / total_delta as f32).clamp(0.0, 1.0)
    }
}

/// Current frequency of one core, scaling node first.
pub fn read_core_freq_mhz(access: &SensorAccess, core: usize) -> Option<u32> {
    ["scaling_cur_freq", "cpuinfo_cur_freq"]
        .iter()
        .find_map(|node| {
            read_freq_mhz(
                access,
                &format!("{}/cpu{}/cpufreq/{}", CPU_SYSFS, core, node),
            )
        })
}

/// Owns the CPU-side per-tick state.
#[derive(Debug, Clone)]
pub struct CpuReader {
    previous: PreviousCounters,
    temperature: TempResolver,
}

impl CpuReader {
    pub fn new() -> Self {
        Self {
            previous: PreviousCounters::default(),
            temperature: TempResolver::cpu(),
        }
    }

    pub fn temperature(&self) -> &TempResolver {
        &self.temperature
    }

    pub fn read(&mut self, access: &SensorAccess, now: Instant) -> CpuStats {
        let Some(text) = access.read_any(PROC_STAT) else {
            log::debug!("{} unreadable, CPU stats zeroed", PROC_STAT);
            return CpuStats::default();
        };

        let lines = parse_proc_stat(&text);
        let Some(aggregate) = lines
            .iter()
            .find(|(slot, _)| *slot == CounterSlot::Aggregate)
            .map(|(_, counters)| *counters)
        else {
            return CpuStats::default();
        };

        let usage = self.previous.usage(CounterSlot::Aggregate, aggregate);

        let mut per_core: Vec<(usize, CpuCounters)> = lines
            .iter()
            .filter_map(|(slot, counters)| match slot {
                CounterSlot::Core(index) => Some((*index, *counters)),
                CounterSlot::Aggregate => None,
            })
            .collect();
        per_core.sort_by_key(|(index, _)| *index);

        let cores: Vec<CpuCoreStats> = per_core
            .into_iter()
            .map(|(index, counters)| CpuCoreStats {
                index,
                usage: self.previous.usage(CounterSlot::Core(index), counters),
                freq_mhz: read_core_freq_mhz(access, index),
            })
            .collect();

        let known: Vec<u32> = cores.iter().filter_map(|c| c.freq_mhz).collect();
        let average = if known.is_empty() {
            None
        } else {
            let sum: u64 = known.iter().map(|&f| f as u64).sum();
            Some((sum as f64 / known.len() as f64).round() as u32)
        };
        let freq_mhz = read_core_freq_mhz(access, 0).or(average);

        let temperature = self.temperature.resolve(access, now);

        CpuStats {
            usage,
            freq_mhz,
            temperature,
            cores,
        }
    }
}

impl Default for CpuReader {
    fn default() -> Self {
        Self::new()
    }
}
