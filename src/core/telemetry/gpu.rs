//! GPU usage, frequency and parameters from vendor sysfs nodes.
//!
//! Mobile GPUs expose utilization through several competing backends
//! (Qualcomm kgsl, MediaTek GED, Arm Mali) and frequency through devfreq or
//! vendor-specific clocks. Each multiplexer walks its backends in priority
//! order and the first plausible answer wins.

use std::time::{Duration, Instant};

use once_cell::sync::Lazy;
use regex::Regex;

use super::history::UsageHistory;
use super::metrics::{FreqSource, GpuParams, GpuStaticInfo, GpuStats, GpuVendor, UsageSource};
use super::thermal::TempResolver;
use super::units::{first_integer, normalize_to_mhz, parse_freq_list_mhz, read_freq_mhz, read_integer};
use crate::platform::SensorAccess;

const KGSL_BASE: &str = "/sys/class/kgsl/kgsl-3d0";
const KGSL_DEVFREQ: &str = "/sys/class/kgsl/kgsl-3d0/devfreq";
const KGSL_GPUBUSY: &str = "/sys/class/kgsl/kgsl-3d0/gpubusy";
const KGSL_MODEL: &str = "/sys/class/kgsl/kgsl-3d0/gpu_model";
const KGSL_CLOCKS: [&str; 3] = [
    "/sys/class/kgsl/kgsl-3d0/gpuclk",
    "/sys/class/kgsl/kgsl-3d0/gpu_clock",
    "/sys/kernel/debug/kgsl/kgsl-3d0/gpuclk",
];

const GED_BASE: &str = "/sys/kernel/ged";
const GED_UTILIZATION: &str = "/sys/kernel/ged/hal/gpu_utilization";
const GED_CLOCKS: [&str; 2] = [
    "/sys/kernel/ged/hal/current_freq",
    "/sys/kernel/ged/hal/cur_freq",
];

const GPUFREQ_BASE: &str = "/proc/gpufreq";
const GPUFREQ_DUMP: &str = "/proc/gpufreq/gpufreq_var_dump";

const MALI_MISC: &str = "/sys/class/misc/mali0";
const MALI_UTILIZATION: [&str; 2] = [
    "/sys/class/misc/mali0/device/utilization",
    "/sys/devices/platform/mali/utilization",
];

const DEVFREQ_CLASS: &str = "/sys/class/devfreq";
const DEVFREQ_GPU_HINTS: [&str; 4] = ["kgsl", "gpu", "mali", "mtk"];
const DEVFREQ_GLOB: &str = "ls -d /sys/devices/platform/*mali*/devfreq /sys/devices/platform/*gpu*/devfreq 2>/dev/null | head -n 1";

/// Busy/total totals in this range are a fixed sampling window, not cumulative.
const WINDOW_MIN: u64 = 200_000;
const WINDOW_MAX: u64 = 5_000_000;

const STATIC_TTL: Duration = Duration::from_secs(30);

static MHZ_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d{2,5})\s*MHz").expect("MHz regex is valid"));

/// Guess the GPU vendor from which driver directories exist.
pub fn detect_vendor(access: &SensorAccess) -> GpuVendor {
    if access.exists_any(KGSL_BASE) {
        GpuVendor::Adreno
    } else if access.exists_any(GED_BASE) || access.exists_any(GPUFREQ_BASE) {
        GpuVendor::MediaTek
    } else if access.exists_any(MALI_MISC) {
        GpuVendor::Mali
    } else {
        GpuVendor::Unknown
    }
}

/// Last kgsl busy/total pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpuCounters {
    pub busy: u64,
    pub total: u64,
}

/// Turn a kgsl busy/total pair into usage.
///
/// A windowed pair is used as-is. Cumulative counters are differenced
/// against the previous pair; with no previous pair, or when either value
/// went backwards, the absolute ratio is used instead. A zero total is 0.
pub fn kgsl_usage(current: GpuCounters, previous: Option<GpuCounters>) -> (f32, UsageSource) {
    let GpuCounters { busy, total } = current;
    if total == 0 {
        return (0.0, UsageSource::KgslDelta);
    }
    let absolute = busy as f32 / total as f32;

    let windowed = (WINDOW_MIN..=WINDOW_MAX).contains(&total) && busy <= total;
    if windowed {
        return (absolute.clamp(0.0, 1.0), UsageSource::KgslWindowed);
    }

    let usage = match previous {
        Some(prev) if total >= prev.total && busy >= prev.busy => {
            let busy_delta = busy - prev.busy;
            let total_delta = total - prev.total;
            if total_delta == 0 {
                absolute
            } else {
                busy_delta as f32 / total_delta as f32
            }
        }
        _ => absolute,
    };

    (usage.clamp(0.0, 1.0), UsageSource::KgslDelta)
}

/// Mali utilization may be scaled 0-100 or 0-255.
pub fn mali_usage(raw: i64) -> Option<f32> {
    let usage = match raw {
        0..=100 => raw as f32 / 100.0,
        101..=255 => raw as f32 / 255.0,
        _ => return None,
    };
    Some(usage.clamp(0.0, 1.0))
}

/// Owns the GPU-side per-tick state: counters, caches, history.
#[derive(Debug, Clone)]
pub struct GpuReader {
    previous: Option<GpuCounters>,
    vendor: Option<GpuVendor>,
    devfreq_base: Option<String>,
    static_info: GpuStaticInfo,
    params: GpuParams,
    last_static_refresh: Option<Instant>,
    history: UsageHistory,
    temperature: TempResolver,
}

impl GpuReader {
    pub fn new(history_capacity: usize) -> Self {
        Self {
            previous: None,
            vendor: None,
            devfreq_base: None,
            static_info: GpuStaticInfo::default(),
            params: GpuParams::default(),
            last_static_refresh: None,
            history: UsageHistory::with_capacity(history_capacity),
            temperature: TempResolver::gpu(),
        }
    }

    pub fn history(&self) -> &UsageHistory {
        &self.history
    }

    pub fn temperature(&self) -> &TempResolver {
        &self.temperature
    }

    pub fn read(&mut self, access: &SensorAccess, now: Instant) -> GpuStats {
        let vendor = *self.vendor.get_or_insert_with(|| detect_vendor(access));
        self.refresh_static_if_needed(access, now);

        let (usage, usage_source) = self
            .read_kgsl_usage(access)
            .or_else(|| read_ged_usage(access))
            .or_else(|| read_mali_usage(access))
            .unwrap_or((0.0, UsageSource::Unknown));
        let usage = usage.clamp(0.0, 1.0);
        self.history.push(usage);

        let (freq_mhz, freq_source) = self.read_freq(access);
        let temperature = self.temperature.resolve(access, now);

        GpuStats {
            vendor,
            usage,
            usage_source,
            freq_mhz,
            freq_source,
            temperature,
            history: self.history.to_vec(),
            static_info: self.static_info.clone(),
            params: self.params.clone(),
        }
    }

    /// Resolve the devfreq directory for the GPU, caching it once found.
    pub fn find_devfreq_base(&mut self, access: &SensorAccess) -> Option<String> {
        if let Some(base) = &self.devfreq_base {
            return Some(base.clone());
        }

        let found = locate_devfreq_base(access)?;
        log::debug!("GPU devfreq base: {}", found);
        self.devfreq_base = Some(found.clone());
        Some(found)
    }

    fn refresh_static_if_needed(&mut self, access: &SensorAccess, now: Instant) {
        if let Some(last) = self.last_static_refresh {
            if now.saturating_duration_since(last) < STATIC_TTL && !self.static_info.is_empty() {
                return;
            }
        }

        let model = access.read_any(KGSL_MODEL);
        let renderer_hint = model
            .clone()
            .or_else(|| access.run("getprop ro.hardware.egl"));
        self.static_info = GpuStaticInfo {
            platform: access.run("getprop ro.board.platform"),
            hardware: access.run("getprop ro.hardware"),
            model,
            renderer_hint,
        };

        let base = self.find_devfreq_base(access);
        self.params = match base {
            Some(base) => read_devfreq_params(access, base),
            None => GpuParams::default(),
        };
        self.last_static_refresh = Some(now);
    }

    fn read_kgsl_usage(&mut self, access: &SensorAccess) -> Option<(f32, UsageSource)> {
        let raw = access.read_any(KGSL_GPUBUSY)?;
        let mut parts = raw.split_whitespace();
        let busy: u64 = parts.next()?.parse().ok()?;
        let total: u64 = parts.next()?.parse().ok()?;
        if total == 0 {
            return None;
        }

        let current = GpuCounters { busy, total };
        let result = kgsl_usage(current, self.previous);
        self.previous = Some(current);
        Some(result)
    }

    fn read_freq(&mut self, access: &SensorAccess) -> (Option<u32>, FreqSource) {
        if let Some(base) = self.find_devfreq_base(access) {
            if let Some(mhz) = read_freq_mhz(access, &format!("{}/cur_freq", base)) {
                return (Some(mhz), FreqSource::Devfreq);
            }
        }

        if let Some(mhz) = KGSL_CLOCKS.iter().find_map(|p| read_freq_mhz(access, p)) {
            return (Some(mhz), FreqSource::KgslClock);
        }

        if let Some(mhz) = GED_CLOCKS.iter().find_map(|p| read_freq_mhz(access, p)) {
            return (Some(mhz), FreqSource::Ged);
        }

        let from_dump = access.read_any(GPUFREQ_DUMP).and_then(|dump| {
            MHZ_TOKEN
                .captures(&dump)
                .and_then(|caps| caps.get(1))
                .and_then(|m| m.as_str().parse::<i64>().ok())
                .and_then(normalize_to_mhz)
        });
        if let Some(mhz) = from_dump {
            return (Some(mhz), FreqSource::GpufreqDump);
        }

        (None, FreqSource::Unknown)
    }
}

impl Default for GpuReader {
    fn default() -> Self {
        Self::new(super::history::DEFAULT_HISTORY_SIZE)
    }
}

fn locate_devfreq_base(access: &SensorAccess) -> Option<String> {
    if access.exists_any(KGSL_DEVFREQ) && access.exists_any(&format!("{}/cur_freq", KGSL_DEVFREQ)) {
        return Some(KGSL_DEVFREQ.to_string());
    }

    let scanned = access.list_dir(DEVFREQ_CLASS).into_iter().find_map(|node| {
        let name = node.to_lowercase();
        if !DEVFREQ_GPU_HINTS.iter().any(|hint| name.contains(hint)) {
            return None;
        }
        let path = format!("{}/{}", DEVFREQ_CLASS, node);
        let cur = read_integer(access, &format!("{}/cur_freq", path))?;
        (cur > 0).then_some(path)
    });
    if scanned.is_some() {
        return scanned;
    }

    let globbed = access.run(DEVFREQ_GLOB)?;
    let globbed = globbed.lines().next()?.trim().to_string();
    if !globbed.is_empty() && access.exists_any(&format!("{}/cur_freq", globbed)) {
        log::debug!("GPU devfreq found through shell glob");
        return Some(globbed);
    }

    None
}

fn read_devfreq_params(access: &SensorAccess, base: String) -> GpuParams {
    let governor = access.read_any(&format!("{}/governor", base));
    let available_mhz = parse_freq_list_mhz(
        access
            .read_any(&format!("{}/available_frequencies", base))
            .as_deref(),
    );
    let min_mhz = read_freq_mhz(access, &format!("{}/min_freq", base))
        .or_else(|| available_mhz.first().copied());
    let max_mhz = read_freq_mhz(access, &format!("{}/max_freq", base))
        .or_else(|| available_mhz.last().copied());

    GpuParams {
        devfreq_base: Some(base),
        governor,
        min_mhz,
        max_mhz,
        available_mhz,
    }
}

fn read_ged_usage(access: &SensorAccess) -> Option<(f32, UsageSource)> {
    let raw = access.read_any(GED_UTILIZATION)?;
    let percent = first_integer(&raw)?;
    Some(((percent as f32 / 100.0).clamp(0.0, 1.0), UsageSource::Ged))
}

fn read_mali_usage(access: &SensorAccess) -> Option<(f32, UsageSource)> {
    let raw = MALI_UTILIZATION.iter().find_map(|p| access.read_any(p))?;
    let usage = mali_usage(first_integer(&raw)?)?;
    Some((usage, UsageSource::Mali))
}
