//! Memory accounting from `/proc/meminfo` and zram statistics.

use std::collections::HashMap;

use super::metrics::{RamStats, Zram, ZramStats, SWAP_DISABLED};
use super::units::{bytes_to_gib, kb_to_gib};
use crate::platform::SensorAccess;

const MEMINFO: &str = "/proc/meminfo";
const ZRAM_BASE: &str = "/sys/block/zram0";

/// Parse `/proc/meminfo` into `key → kB` (keys keep their trailing colon).
pub fn parse_meminfo(text: &str) -> HashMap<String, u64> {
    text.lines()
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let key = parts.next()?;
            let value = parts.next()?.parse().ok()?;
            Some((key.to_string(), value))
        })
        .collect()
}

/// Memory figures derived from meminfo, in kB.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryAccounting {
    pub total_kb: u64,
    pub available_kb: u64,
    pub used_kb: u64,
    /// Cached + SReclaimable - Shmem
    pub cached_kb: u64,
    /// Available minus the cache estimate
    pub real_free_kb: u64,
    pub swap_total_kb: u64,
    pub swap_used_kb: u64,
}

impl MemoryAccounting {
    /// `None` when `MemTotal` is missing.
    pub fn derive(info: &HashMap<String, u64>) -> Option<Self> {
        let get = |key: &str| info.get(key).copied();

        let total_kb = get("MemTotal:")?;
        let available_kb = get("MemAvailable:").or_else(|| get("MemFree:")).unwrap_or(0);
        let cached_kb = (get("Cached:").unwrap_or(0) + get("SReclaimable:").unwrap_or(0))
            .saturating_sub(get("Shmem:").unwrap_or(0));
        let swap_total_kb = get("SwapTotal:").unwrap_or(0);

        Some(Self {
            total_kb,
            available_kb,
            used_kb: total_kb.saturating_sub(available_kb),
            cached_kb,
            real_free_kb: available_kb.saturating_sub(cached_kb),
            swap_total_kb,
            swap_used_kb: swap_total_kb.saturating_sub(get("SwapFree:").unwrap_or(0)),
        })
    }

    pub fn usage(&self) -> f32 {
        if self.total_kb == 0 {
            return 0.0;
        }
        (self.used_kb as f64 / self.total_kb as f64).clamp(0.0, 1.0) as f32
    }

    /// "disabled" without swap, otherwise "used/total GB".
    pub fn swap_label(&self) -> String {
        let total = kb_to_gib(self.swap_total_kb);
        if total <= 0.0001 {
            return SWAP_DISABLED.to_string();
        }
        format!("{:.1}/{:.1} GB", kb_to_gib(self.swap_used_kb), total)
    }
}

/// Active algorithm from `comp_algorithm`, e.g. `lzo [lz4] zstd` → `lz4`.
pub fn parse_comp_algorithm(raw: &str) -> String {
    raw.split_whitespace()
        .find_map(|token| token.strip_prefix('[')?.strip_suffix(']'))
        .unwrap_or_else(|| raw.trim())
        .to_string()
}

/// Build zram stats from raw node contents.
pub fn zram_stats(algorithm: Option<&str>, disk_size: Option<&str>, mm_stat: Option<&str>) -> ZramStats {
    let numbers: Vec<u64> = mm_stat
        .map(|s| s.split_whitespace().filter_map(|n| n.parse().ok()).collect())
        .unwrap_or_default();
    let orig = numbers.first().copied();
    let compr = numbers.get(1).copied();
    let mem_used = numbers.get(2).copied();

    let ratio = match (orig, compr) {
        (Some(orig), Some(compr)) if compr > 0 => Some(orig as f64 / compr as f64),
        _ => None,
    };

    ZramStats {
        algorithm: algorithm.map(parse_comp_algorithm),
        disk_size_gib: disk_size
            .and_then(|s| s.trim().parse::<u64>().ok())
            .map(bytes_to_gib),
        orig_data_gib: orig.map(bytes_to_gib),
        compr_data_gib: compr.map(bytes_to_gib),
        mem_used_gib: mem_used.map(bytes_to_gib),
        ratio,
    }
}

pub fn read_zram(access: &SensorAccess) -> Zram {
    if !access.exists_any(ZRAM_BASE) {
        return Zram::Disabled;
    }

    let algorithm = access.read_any(&format!("{}/comp_algorithm", ZRAM_BASE));
    let disk_size = access.read_any(&format!("{}/disksize", ZRAM_BASE));
    let mm_stat = access.read_any(&format!("{}/mm_stat", ZRAM_BASE));

    Zram::Active(zram_stats(
        algorithm.as_deref(),
        disk_size.as_deref(),
        mm_stat.as_deref(),
    ))
}

/// Stateless; each tick is read from scratch.
#[derive(Debug, Clone, Copy, Default)]
pub struct RamReader;

impl RamReader {
    pub fn new() -> Self {
        Self
    }

    pub fn read(&self, access: &SensorAccess) -> RamStats {
        let info = access
            .read_any(MEMINFO)
            .map(|text| parse_meminfo(&text))
            .unwrap_or_default();

        let Some(mem) = MemoryAccounting::derive(&info) else {
            log::debug!("{} has no MemTotal, RAM stats defaulted", MEMINFO);
            return RamStats::default();
        };

        RamStats {
            total_gib: kb_to_gib(mem.total_kb),
            used_gib: kb_to_gib(mem.used_kb),
            cached_gib: kb_to_gib(mem.cached_kb),
            available_gib: kb_to_gib(mem.available_kb),
            real_free_gib: kb_to_gib(mem.real_free_kb),
            swap_total_gib: kb_to_gib(mem.swap_total_kb),
            swap_used_gib: kb_to_gib(mem.swap_used_kb),
            swap_label: mem.swap_label(),
            usage: mem.usage(),
            zram: read_zram(access),
        }
    }
}
