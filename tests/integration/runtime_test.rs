use std::sync::Arc;
use std::time::Duration;

use kpstat::core::config::SamplerConfig;
use kpstat::core::telemetry::{sampling_loop, Sampler, SamplerRuntime, Snapshot};
use kpstat::platform::{FixtureFs, NoShell, SensorAccess};
use tokio::sync::{broadcast, watch};

fn fixture_sampler(fs: &FixtureFs, config: &SamplerConfig) -> Sampler {
    let access = SensorAccess::new(Box::new(fs.clone()), Box::new(NoShell));
    Sampler::with_access(config, access)
}

fn device() -> FixtureFs {
    FixtureFs::new()
        .with("/proc/stat", "cpu  100 0 0 100 0 0 0 0\ncpu0 100 0 0 100 0 0 0 0")
        .with("/proc/meminfo", "MemTotal: 2097152 kB\nMemAvailable: 1048576 kB")
        .with("/sys/kernel/ged/hal/gpu_utilization", "20")
}

#[tokio::test(flavor = "multi_thread")]
async fn test_loop_publishes_until_shutdown() {
    let fs = device();
    let config = SamplerConfig {
        interval_ms: 10,
        ..SamplerConfig::default()
    };
    let sampler = fixture_sampler(&fs, &config);

    let (snapshot_tx, mut snapshot_rx) = watch::channel(Arc::new(Snapshot::default()));
    let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);
    let handle = tokio::spawn(sampling_loop(
        sampler,
        config.interval(),
        snapshot_tx,
        shutdown_rx,
    ));

    snapshot_rx.changed().await.unwrap();
    let first = snapshot_rx.borrow_and_update().clone();
    assert_eq!(first.ram.total_gib, 2.0);
    assert_eq!(first.gpu.usage, 0.2);

    snapshot_rx.changed().await.unwrap();
    let second = snapshot_rx.borrow_and_update().clone();
    assert!(second.gpu.history.len() >= 2);
    assert!(second.timestamp_ms >= first.timestamp_ms);

    shutdown_tx.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("loop should stop after shutdown")
        .unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_loop_stops_when_receivers_dropped() {
    let fs = device();
    let config = SamplerConfig {
        interval_ms: 10,
        ..SamplerConfig::default()
    };
    let sampler = fixture_sampler(&fs, &config);

    let (snapshot_tx, snapshot_rx) = watch::channel(Arc::new(Snapshot::default()));
    let (_shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);
    drop(snapshot_rx);

    let handle = tokio::spawn(sampling_loop(
        sampler,
        config.interval(),
        snapshot_tx,
        shutdown_rx,
    ));

    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("loop should stop without receivers")
        .unwrap();
}

#[test]
fn test_runtime_next_snapshot_and_shutdown() {
    let fs = device();
    let config = SamplerConfig {
        interval_ms: 20,
        ..SamplerConfig::default()
    };
    let sampler = fixture_sampler(&fs, &config);

    let mut runtime = SamplerRuntime::start_with(config, sampler).unwrap();
    let first = runtime.next_snapshot().unwrap();
    assert_eq!(first.cpu.cores.len(), 1);

    fs.insert("/sys/kernel/ged/hal/gpu_utilization", "80");
    let mut latest = runtime.next_snapshot().unwrap();
    while latest.gpu.usage != 0.8 {
        latest = runtime.next_snapshot().unwrap();
    }
    assert_eq!(runtime.latest().gpu.usage, 0.8);

    runtime.shutdown();
}

#[test]
fn test_runtime_rejects_invalid_config() {
    let fs = device();
    let config = SamplerConfig {
        interval_ms: 0,
        ..SamplerConfig::default()
    };
    let sampler = fixture_sampler(&fs, &SamplerConfig::default());

    assert!(SamplerRuntime::start_with(config, sampler).is_err());
}
