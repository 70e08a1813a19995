use std::time::{Duration, Instant};

use kpstat::core::config::SamplerConfig;
use kpstat::core::telemetry::{
    FreqSource, GpuVendor, Sampler, TempState, UsageSource, Zram,
};
use kpstat::platform::{FixtureFs, NoShell, SensorAccess};

const STAT_T0: &str = "\
cpu  100 0 0 100 0 0 0 0 0 0
cpu0 50 0 0 50 0 0 0 0 0 0
cpu1 50 0 0 50 0 0 0 0 0 0
intr 12345 0 0
ctxt 999
btime 1700000000";

const STAT_T1: &str = "\
cpu  150 0 0 150 0 0 0 0 0 0
cpu0 100 0 0 50 0 0 0 0 0 0
cpu1 50 0 0 100 0 0 0 0 0 0
intr 12400 0 0
ctxt 1200
btime 1700000000";

const MEMINFO: &str = "\
MemTotal:        8388608 kB
MemFree:         1000000 kB
MemAvailable:    3145728 kB
Buffers:           20000 kB
Cached:          1048576 kB
SwapCached:            0 kB
SwapTotal:       2097152 kB
SwapFree:        1782579 kB
Shmem:                 0 kB
SReclaimable:          0 kB";

fn zone(fs: &FixtureFs, index: usize, zone_type: &str, raw: &str) {
    let base = format!("/sys/class/thermal/thermal_zone{}", index);
    fs.insert(&format!("{}/type", base), zone_type);
    fs.insert(&format!("{}/temp", base), raw);
}

/// A small Snapdragon-like device: two cores, kgsl GPU, zram swap.
fn device() -> FixtureFs {
    let fs = FixtureFs::new()
        .with("/proc/stat", STAT_T0)
        .with("/proc/meminfo", MEMINFO)
        .with("/sys/devices/system/cpu/cpu0/cpufreq/scaling_cur_freq", "1804800")
        .with("/sys/devices/system/cpu/cpu1/cpufreq/cpuinfo_cur_freq", "1200000")
        .with("/sys/class/kgsl/kgsl-3d0/gpubusy", "250000 1000000")
        .with("/sys/class/kgsl/kgsl-3d0/gpu_model", "Adreno650v2")
        .with("/sys/class/kgsl/kgsl-3d0/devfreq/cur_freq", "585000000")
        .with("/sys/class/kgsl/kgsl-3d0/devfreq/governor", "msm-adreno-tz")
        .with("/sys/block/zram0/comp_algorithm", "lzo [lz4] zstd")
        .with("/sys/block/zram0/disksize", "4294967296")
        .with("/sys/block/zram0/mm_stat", "209715200 52428800 60000000 0 0 0 0");

    zone(&fs, 0, "cpu-0-0", "41000");
    zone(&fs, 1, "cpu-0-1", "43000");
    zone(&fs, 2, "cpuss-0", "42000");
    zone(&fs, 3, "gpuss-0", "38000");
    zone(&fs, 4, "gpu-1", "40000");
    zone(&fs, 5, "gfx", "39000");
    fs
}

fn sampler_for(fs: &FixtureFs) -> Sampler {
    let access = SensorAccess::new(Box::new(fs.clone()), Box::new(NoShell));
    Sampler::with_access(&SamplerConfig::default(), access)
}

#[test]
fn test_first_tick_reports_zero_cpu_usage() {
    let fs = device();
    let mut sampler = sampler_for(&fs);

    let snapshot = sampler.collect_at(Instant::now());
    assert_eq!(snapshot.cpu.usage, 0.0);
    assert!(snapshot.cpu.cores.iter().all(|core| core.usage == 0.0));
    assert!(snapshot.timestamp_ms > 0);
}

#[test]
fn test_end_to_end_snapshot() {
    let fs = device();
    let mut sampler = sampler_for(&fs);
    let t0 = Instant::now();

    sampler.collect_at(t0);
    fs.insert("/proc/stat", STAT_T1);
    fs.insert("/sys/class/kgsl/kgsl-3d0/gpubusy", "600000 1000000");
    let snapshot = sampler.collect_at(t0 + Duration::from_secs(1));

    // CPU: aggregate (150-100 idle of 300-200 total) is half busy
    let cpu = &snapshot.cpu;
    assert_eq!(cpu.usage, 0.5);
    assert_eq!(cpu.cores.len(), 2);
    assert_eq!(cpu.cores[0].usage, 1.0);
    assert_eq!(cpu.cores[1].usage, 0.0);
    assert_eq!(cpu.cores[0].freq_mhz, Some(1804));
    assert_eq!(cpu.cores[1].freq_mhz, Some(1200));
    assert_eq!(cpu.freq_mhz, Some(1804));
    assert_eq!(cpu.temperature.celsius, Some(42.0));
    assert_eq!(cpu.temperature.state, TempState::Fresh);

    // GPU: kgsl windowed pair, devfreq clock, top three gpu zones averaged
    let gpu = &snapshot.gpu;
    assert_eq!(gpu.vendor, GpuVendor::Adreno);
    assert_eq!(gpu.usage, 0.6);
    assert_eq!(gpu.usage_source, UsageSource::KgslWindowed);
    assert_eq!(gpu.history, vec![0.25, 0.6]);
    assert_eq!(gpu.freq_mhz, Some(585));
    assert_eq!(gpu.freq_source, FreqSource::Devfreq);
    assert_eq!(gpu.params.governor.as_deref(), Some("msm-adreno-tz"));
    assert_eq!(gpu.static_info.model.as_deref(), Some("Adreno650v2"));
    assert_eq!(gpu.temperature.celsius, Some(39.0));

    // RAM: 8 GB total, 3 GB available, 1 GB cache
    let ram = &snapshot.ram;
    assert_eq!(ram.total_gib, 8.0);
    assert_eq!(ram.used_gib, 5.0);
    assert_eq!(ram.cached_gib, 1.0);
    assert_eq!(ram.real_free_gib, 2.0);
    assert_eq!(ram.usage, 0.625);
    assert_eq!(ram.swap_label, "0.3/2.0 GB");

    match &ram.zram {
        Zram::Active(stats) => {
            assert_eq!(stats.algorithm.as_deref(), Some("lz4"));
            assert_eq!(stats.disk_size_gib, Some(4.0));
            assert_eq!(stats.ratio, Some(4.0));
        }
        Zram::Disabled => panic!("zram0 should be active"),
    }
}

#[test]
fn test_empty_device_yields_defaults() {
    let fs = FixtureFs::new();
    let mut sampler = sampler_for(&fs);

    let snapshot = sampler.collect();
    assert_eq!(snapshot.cpu.usage, 0.0);
    assert!(snapshot.cpu.cores.is_empty());
    assert_eq!(snapshot.cpu.temperature.state, TempState::Missing);
    assert_eq!(snapshot.gpu.vendor, GpuVendor::Unknown);
    assert_eq!(snapshot.gpu.usage_source, UsageSource::Unknown);
    assert_eq!(snapshot.gpu.freq_mhz, None);
    assert_eq!(snapshot.ram.total_gib, 0.0);
    assert_eq!(snapshot.ram.swap_label, "disabled");
    assert_eq!(snapshot.ram.zram, Zram::Disabled);
}

#[test]
fn test_gpu_history_respects_capacity() {
    let fs = device();
    let access = SensorAccess::new(Box::new(fs.clone()), Box::new(NoShell));
    let config = SamplerConfig {
        gpu_history_capacity: 3,
        ..SamplerConfig::default()
    };
    let mut sampler = Sampler::with_access(&config, access);
    let t0 = Instant::now();

    for (i, busy) in ["100000", "200000", "300000", "400000", "500000"].iter().enumerate() {
        fs.insert("/sys/class/kgsl/kgsl-3d0/gpubusy", &format!("{} 1000000", busy));
        sampler.collect_at(t0 + Duration::from_secs(i as u64));
    }

    assert_eq!(sampler.gpu().history().to_vec(), vec![0.3, 0.4, 0.5]);
}

#[test]
fn test_usage_stays_in_unit_range() {
    let fs = device();
    let mut sampler = sampler_for(&fs);
    let t0 = Instant::now();

    // Counters that go backwards must not produce negative or >1 usage
    sampler.collect_at(t0);
    fs.insert("/proc/stat", "cpu  10 0 0 10 0 0 0 0 0 0\ncpu0 5 0 0 5 0\ncpu1 5 0 0 5 0");
    fs.insert("/sys/class/kgsl/kgsl-3d0/gpubusy", "9000000 1000000");
    let snapshot = sampler.collect_at(t0 + Duration::from_secs(1));

    assert!((0.0..=1.0).contains(&snapshot.cpu.usage));
    for core in &snapshot.cpu.cores {
        assert!((0.0..=1.0).contains(&core.usage));
    }
    assert!((0.0..=1.0).contains(&snapshot.gpu.usage));
}

#[test]
fn test_snapshot_serializes_to_json() {
    let fs = device();
    let mut sampler = sampler_for(&fs);
    let snapshot = sampler.collect();

    let json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(json["gpu"]["vendor"], "Adreno");
    assert_eq!(json["ram"]["zram"]["state"], "Active");
    assert!(json["cpu"]["temperature"]["source"].as_str().unwrap().contains("thermal:"));
}
