//! Tokio runtime and sampling loop.
//!
//! The loop is the single owner of the [`Sampler`]; consumers only see
//! `Arc<Snapshot>` values published through a watch channel.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};

use crate::core::config::SamplerConfig;
use crate::error::{KpError, Result};

use super::collector::Sampler;
use super::metrics::Snapshot;

/// Wrapper around the Tokio runtime driving the sampling loop.
pub struct SamplerRuntime {
    /// Receiver for published snapshots
    pub snapshot_rx: watch::Receiver<Arc<Snapshot>>,

    /// Shutdown signal sender
    shutdown_tx: broadcast::Sender<()>,

    /// Handle to the runtime (for shutdown)
    runtime: tokio::runtime::Runtime,
}

impl SamplerRuntime {
    /// Start sampling the live host.
    pub fn start(config: SamplerConfig) -> Result<Self> {
        config.validate()?;
        let sampler = Sampler::new(&config);
        Self::start_with(config, sampler)
    }

    /// Start sampling with a prepared sampler.
    pub fn start_with(config: SamplerConfig, sampler: Sampler) -> Result<Self> {
        config.validate()?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_time()
            .thread_name("kpstat-sampler")
            .build()
            .map_err(|e| KpError::runtime(format!("Failed to build runtime: {}", e)))?;

        let (snapshot_tx, snapshot_rx) = watch::channel(Arc::new(Snapshot::default()));
        let (shutdown_tx, _) = broadcast::channel::<()>(1);

        log::info!(
            "Sampling every {} ms, GPU history {}",
            config.interval_ms,
            config.gpu_history_capacity
        );
        runtime.spawn(sampling_loop(
            sampler,
            config.interval(),
            snapshot_tx,
            shutdown_tx.subscribe(),
        ));

        Ok(Self {
            snapshot_rx,
            shutdown_tx,
            runtime,
        })
    }

    /// Most recently published snapshot.
    pub fn latest(&self) -> Arc<Snapshot> {
        self.snapshot_rx.borrow().clone()
    }

    /// Block until the next snapshot is published.
    ///
    /// Returns `None` once the sampling loop has stopped.
    pub fn next_snapshot(&mut self) -> Option<Arc<Snapshot>> {
        self.runtime.block_on(self.snapshot_rx.changed()).ok()?;
        Some(self.snapshot_rx.borrow_and_update().clone())
    }

    /// Stop the loop; the runtime shuts down when dropped.
    pub fn shutdown(self) {
        log::debug!("Shutting down sampler runtime");
        let _ = self.shutdown_tx.send(());
    }
}

/// Collect, publish, sleep; until shutdown or every receiver is gone.
///
/// Each pass runs on the blocking pool since sensor reads are synchronous
/// and may stall on a slow node.
pub async fn sampling_loop(
    mut sampler: Sampler,
    interval: Duration,
    snapshot_tx: watch::Sender<Arc<Snapshot>>,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        let pass = tokio::task::spawn_blocking(move || {
            let snapshot = sampler.collect();
            (sampler, snapshot)
        })
        .await;

        let snapshot = match pass {
            Ok((returned, snapshot)) => {
                sampler = returned;
                snapshot
            }
            Err(e) => {
                log::error!("Collection pass aborted: {}", e);
                break;
            }
        };

        log::trace!("{}", snapshot.summary());
        if snapshot_tx.send(Arc::new(snapshot)).is_err() {
            log::debug!("No snapshot receivers left, sampling loop stopping");
            break;
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = shutdown.recv() => {
                log::debug!("Sampling loop shutting down");
                break;
            }
        }
    }
}
