use serde::{Deserialize, Serialize};

/// Complete telemetry snapshot, published once per tick
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub timestamp_ms: i64, // Unix timestamp, milliseconds
    pub cpu: CpuStats,
    pub gpu: GpuStats,
    pub ram: RamStats,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CpuStats {
    pub usage: f32, // 0.0..=1.0
    pub freq_mhz: Option<u32>,
    pub temperature: TempReading,
    pub cores: Vec<CpuCoreStats>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CpuCoreStats {
    pub index: usize,
    pub usage: f32,
    pub freq_mhz: Option<u32>,
}

/// Outcome of one temperature resolution
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum TempState {
    /// Read from sensors this tick
    Fresh,
    /// New value rejected as an implausible jump; cached value returned
    JumpFiltered,
    /// Nothing readable this tick; cached value returned
    Cached,
    #[default]
    Missing,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TempReading {
    pub celsius: Option<f32>,
    pub source: String,
    pub state: TempState,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GpuStats {
    pub vendor: GpuVendor,
    pub usage: f32, // 0.0..=1.0
    pub usage_source: UsageSource,
    pub freq_mhz: Option<u32>,
    pub freq_source: FreqSource,
    pub temperature: TempReading,
    pub history: Vec<f32>,
    pub static_info: GpuStaticInfo,
    pub params: GpuParams,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum GpuVendor {
    Adreno,
    MediaTek,
    Mali,
    #[default]
    Unknown,
}

/// Which usage backend answered
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum UsageSource {
    /// kgsl busy/total pair read as a fixed sampling window
    KgslWindowed,
    /// kgsl busy/total pair read as cumulative counters
    KgslDelta,
    Ged,
    Mali,
    #[default]
    Unknown,
}

/// Which frequency backend answered
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum FreqSource {
    Devfreq,
    KgslClock,
    Ged,
    GpufreqDump,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GpuStaticInfo {
    pub platform: Option<String>,
    pub hardware: Option<String>,
    pub model: Option<String>,
    pub renderer_hint: Option<String>,
}

impl GpuStaticInfo {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GpuParams {
    pub devfreq_base: Option<String>,
    pub governor: Option<String>,
    pub min_mhz: Option<u32>,
    pub max_mhz: Option<u32>,
    pub available_mhz: Vec<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RamStats {
    pub total_gib: f64,
    pub used_gib: f64,
    pub cached_gib: f64,
    pub available_gib: f64,
    pub real_free_gib: f64,
    pub swap_total_gib: f64,
    pub swap_used_gib: f64,
    pub swap_label: String,
    pub usage: f32, // 0.0..=1.0
    pub zram: Zram,
}

impl Default for RamStats {
    fn default() -> Self {
        Self {
            total_gib: 0.0,
            used_gib: 0.0,
            cached_gib: 0.0,
            available_gib: 0.0,
            real_free_gib: 0.0,
            swap_total_gib: 0.0,
            swap_used_gib: 0.0,
            swap_label: SWAP_DISABLED.to_string(),
            usage: 0.0,
            zram: Zram::Disabled,
        }
    }
}

pub const SWAP_DISABLED: &str = "disabled";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(tag = "state")]
pub enum Zram {
    #[default]
    Disabled,
    Active(ZramStats),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ZramStats {
    pub algorithm: Option<String>,
    pub disk_size_gib: Option<f64>,
    pub orig_data_gib: Option<f64>,
    pub compr_data_gib: Option<f64>,
    pub mem_used_gib: Option<f64>,
    pub ratio: Option<f64>,
}

impl Snapshot {
    /// One-line summary for logs and the CLI.
    ///
    /// ```text
    /// CPU 37% 1804 MHz 41.5°C | GPU 12% 585 MHz 39.0°C | RAM 5.0/8.0 GB, swap 0.3/2.0 GB
    /// ```
    pub fn summary(&self) -> String {
        format!(
            "CPU {:.0}% {} {} | GPU {:.0}% {} {} | RAM {:.1}/{:.1} GB, swap {}",
            self.cpu.usage * 100.0,
            format_freq(self.cpu.freq_mhz),
            format_temp(self.cpu.temperature.celsius),
            self.gpu.usage * 100.0,
            format_freq(self.gpu.freq_mhz),
            format_temp(self.gpu.temperature.celsius),
            self.ram.used_gib,
            self.ram.total_gib,
            self.ram.swap_label,
        )
    }
}

fn format_freq(mhz: Option<u32>) -> String {
    match mhz {
        Some(mhz) => format!("{} MHz", mhz),
        None => "-- MHz".to_string(),
    }
}

fn format_temp(celsius: Option<f32>) -> String {
    match celsius {
        Some(c) => format!("{:.1}°C", c),
        None => "--°C".to_string(),
    }
}
