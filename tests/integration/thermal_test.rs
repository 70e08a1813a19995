use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

use kpstat::core::config::SamplerConfig;
use kpstat::core::telemetry::thermal::{scan_candidates, CPU_PROFILE, GPU_PROFILE};
use kpstat::core::telemetry::{FreqSource, ResolverState, Sampler, TempResolver, TempState};
use kpstat::platform::{FixtureFs, FixtureShell, HostFs, NoShell, SensorAccess};
use tempfile::TempDir;

fn write(root: &Path, path: &str, text: &str) {
    let full = root.join(path.trim_start_matches('/'));
    fs::create_dir_all(full.parent().unwrap()).unwrap();
    fs::write(full, text).unwrap();
}

fn rooted(root: &Path) -> SensorAccess {
    SensorAccess::new(Box::new(HostFs::with_root(root)), Box::new(NoShell))
}

#[test]
fn test_rooted_tree_is_scanned_like_sysfs() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(root, "/sys/class/thermal/thermal_zone0/type", "battery\n");
    write(root, "/sys/class/thermal/thermal_zone0/temp", "30000\n");
    write(root, "/sys/class/thermal/thermal_zone1/type", "cpu-1-0\n");
    write(root, "/sys/class/thermal/thermal_zone1/temp", "47000\n");
    write(root, "/sys/class/thermal/cooling_device0/type", "fan\n");
    write(root, "/sys/class/hwmon/hwmon0/name", "gpu_thermal\n");
    write(root, "/sys/class/hwmon/hwmon0/temp1_input", "36500\n");
    write(root, "/sys/class/hwmon/hwmon0/temp1_label", "core\n");

    let access = rooted(root);

    let cpu = scan_candidates(&access, CPU_PROFILE.prefer, CPU_PROFILE.avoid);
    assert_eq!(cpu.len(), 3);
    assert_eq!(cpu[0].label, "thermal:cpu-1-0");
    assert_eq!(cpu.last().unwrap().label, "thermal:battery");

    let gpu = scan_candidates(&access, GPU_PROFILE.prefer, GPU_PROFILE.avoid);
    assert_eq!(gpu[0].label, "hwmon:gpu_thermal core");
    assert_eq!(gpu[0].path, "/sys/class/hwmon/hwmon0/temp1_input");
}

#[test]
fn test_rooted_sampler_reads_captured_tree() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(root, "/proc/stat", "cpu  10 0 10 80 0 0 0 0\ncpu0 10 0 10 80 0 0 0 0\n");
    write(root, "/proc/meminfo", "MemTotal: 4194304 kB\nMemAvailable: 2097152 kB\n");
    write(root, "/sys/class/thermal/thermal_zone0/type", "mtktscpu\n");
    write(root, "/sys/class/thermal/thermal_zone0/temp", "52000\n");
    write(root, "/sys/kernel/ged/hal/gpu_utilization", "45 0 55\n");
    write(root, "/sys/kernel/ged/hal/current_freq", "450000\n");

    let mut sampler = Sampler::with_access(&SamplerConfig::default(), rooted(root));
    let snapshot = sampler.collect();

    assert_eq!(snapshot.cpu.cores.len(), 1);
    assert_eq!(snapshot.cpu.temperature.celsius, Some(52.0));
    assert_eq!(snapshot.gpu.usage, 0.45);
    assert_eq!(snapshot.gpu.freq_mhz, Some(450));
    assert_eq!(snapshot.gpu.freq_source, FreqSource::Ged);
    assert_eq!(snapshot.ram.total_gib, 4.0);
    assert_eq!(snapshot.ram.usage, 0.5);
    assert_eq!(snapshot.ram.swap_label, "disabled");
}

#[test]
fn test_jump_filter_then_accepts_after_window() {
    let fs = FixtureFs::new()
        .with("/sys/class/thermal/thermal_zone0/type", "cpu")
        .with("/sys/class/thermal/thermal_zone0/temp", "40000");
    let access = SensorAccess::new(Box::new(fs.clone()), Box::new(NoShell));
    let mut resolver = TempResolver::cpu();
    let t0 = Instant::now();

    assert_eq!(resolver.resolve(&access, t0).celsius, Some(40.0));

    fs.insert("/sys/class/thermal/thermal_zone0/temp", "60000");
    let filtered = resolver.resolve(&access, t0 + Duration::from_secs(2));
    assert_eq!(filtered.celsius, Some(40.0));
    assert_eq!(filtered.state, TempState::JumpFiltered);
    assert_eq!(filtered.source, "CPU cached (jump filtered)");

    // The accepted timestamp did not move, so the window has now passed
    let accepted = resolver.resolve(&access, t0 + Duration::from_secs(6));
    assert_eq!(accepted.celsius, Some(60.0));
    assert_eq!(accepted.state, TempState::Fresh);
}

#[test]
fn test_cached_value_survives_sensor_loss() {
    let fs = FixtureFs::new()
        .with("/sys/class/thermal/thermal_zone0/type", "gpu")
        .with("/sys/class/thermal/thermal_zone0/temp", "55000");
    let access = SensorAccess::new(Box::new(fs.clone()), Box::new(NoShell));
    let mut resolver = TempResolver::gpu();
    let t0 = Instant::now();

    resolver.resolve(&access, t0);
    fs.remove("/sys/class/thermal/thermal_zone0/temp");

    let reading = resolver.resolve(&access, t0 + Duration::from_secs(1));
    assert_eq!(reading.celsius, Some(55.0));
    assert_eq!(reading.state, TempState::Cached);
    assert!(reading.source.starts_with("GPU using cached: thermal:gpu"));
    assert_eq!(resolver.state(), ResolverState::Sampled);
}

#[test]
fn test_dumpsys_fallback_through_shell() {
    let fs = FixtureFs::new();
    let shell = FixtureShell::new().with(
        "dumpsys thermalservice",
        "Current temperatures from HAL:\n\
         \tTemperature{mValue=31.0, mType=2, mName=battery, mStatus=0}\n\
         \tTemperature{mValue=48.5, mType=0, mName=CPU0, mStatus=0}\n\
         \tTemperature{mValue=44.0, mType=1, mName=GPU0, mStatus=0}",
    );
    let access = SensorAccess::new(Box::new(fs), Box::new(shell.clone()));
    let t0 = Instant::now();

    let mut cpu = TempResolver::cpu();
    let reading = cpu.resolve(&access, t0);
    assert_eq!(reading.celsius, Some(48.5));
    assert_eq!(reading.source, "dumpsys:CPU0");

    let mut gpu = TempResolver::gpu();
    assert_eq!(gpu.resolve(&access, t0).celsius, Some(44.0));
    assert_eq!(shell.calls_to("dumpsys thermalservice"), 2);

    // Throttled to once per 12 s per domain; the cache answers in between
    let reading = cpu.resolve(&access, t0 + Duration::from_secs(5));
    assert_eq!(reading.state, TempState::Cached);
    assert_eq!(shell.calls_to("dumpsys thermalservice"), 2);

    cpu.resolve(&access, t0 + Duration::from_secs(13));
    assert_eq!(shell.calls_to("dumpsys thermalservice"), 3);
}

#[test]
fn test_equal_scores_average_lowest_zones() {
    let fs = FixtureFs::new();
    for zone in 0..12 {
        let raw = if zone < 3 { 40000 + zone * 1000 } else { 90000 };
        fs.insert(&format!("/sys/class/thermal/thermal_zone{}/type", zone), "cpu-cluster");
        fs.insert(&format!("/sys/class/thermal/thermal_zone{}/temp", zone), &raw.to_string());
    }
    let access = SensorAccess::new(Box::new(fs), Box::new(NoShell));

    let mut resolver = TempResolver::cpu();
    let reading = resolver.resolve(&access, Instant::now());

    // zone0..zone2 come first, zone10 and zone11 last
    assert_eq!(reading.celsius, Some(41.0));
    assert_eq!(
        resolver.candidates()[2].path,
        "/sys/class/thermal/thermal_zone2/temp"
    );
}
