use std::time::Instant;

use crate::core::config::SamplerConfig;
use crate::platform::{HostFs, NoShell, SensorAccess};

use super::cpu::CpuReader;
use super::gpu::GpuReader;
use super::metrics::Snapshot;
use super::ram::RamReader;

/// Runs one collection pass per call and owns every reader's state.
///
/// The sampler is the only place counters and caches live; snapshots it
/// returns are plain values with no link back into that state.
pub struct Sampler {
    access: SensorAccess,
    cpu: CpuReader,
    gpu: GpuReader,
    ram: RamReader,
}

impl Sampler {
    /// Sampler over the live host, honouring `shell_fallback`.
    pub fn new(config: &SamplerConfig) -> Self {
        let access = if config.shell_fallback {
            SensorAccess::host()
        } else {
            SensorAccess::new(Box::new(HostFs::new()), Box::new(NoShell))
        };
        Self::with_access(config, access)
    }

    /// Sampler over an injected access capability (fixtures, replay roots).
    pub fn with_access(config: &SamplerConfig, access: SensorAccess) -> Self {
        Self {
            access,
            cpu: CpuReader::new(),
            gpu: GpuReader::new(config.gpu_history_capacity),
            ram: RamReader::new(),
        }
    }

    pub fn access(&self) -> &SensorAccess {
        &self.access
    }

    pub fn cpu(&self) -> &CpuReader {
        &self.cpu
    }

    pub fn gpu(&self) -> &GpuReader {
        &self.gpu
    }

    /// Collect CPU, then GPU, then RAM.
    pub fn collect(&mut self) -> Snapshot {
        self.collect_at(Instant::now())
    }

    pub fn collect_at(&mut self, now: Instant) -> Snapshot {
        let cpu = self.cpu.read(&self.access, now);
        let gpu = self.gpu.read(&self.access, now);
        let ram = self.ram.read(&self.access);

        Snapshot {
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
            cpu,
            gpu,
            ram,
        }
    }
}

impl Default for Sampler {
    fn default() -> Self {
        Self::new(&SamplerConfig::default())
    }
}
