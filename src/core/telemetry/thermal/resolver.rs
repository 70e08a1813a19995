use std::time::{Duration, Instant};

use crate::core::telemetry::metrics::{TempReading, TempState};
use crate::core::telemetry::units::{is_plausible_temp, parse_temp_celsius};
use crate::platform::SensorAccess;

use super::scoring::{parse_dumpsys_thermal, score_label, ThermalProfile, CPU_PROFILE, GPU_PROFILE};

const THERMAL_CLASS: &str = "/sys/class/thermal";
const HWMON_CLASS: &str = "/sys/class/hwmon";
const DUMPSYS_THERMAL: &str = "dumpsys thermalservice";

const RESCAN_INTERVAL: Duration = Duration::from_secs(45);
const FALLBACK_INTERVAL: Duration = Duration::from_secs(12);
const JUMP_WINDOW: Duration = Duration::from_secs(5);
const JUMP_THRESHOLD_C: f32 = 15.0;

const MAX_CANDIDATES: usize = 16;
const SAMPLED_CANDIDATES: usize = 6;
const MAX_READINGS: usize = 3;

/// A temperature node and how well its label matches the domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TempCandidate {
    pub path: String,
    pub label: String,
    pub score: i32,
}

/// Per-domain resolver memory.
#[derive(Debug, Clone, Default)]
pub struct TempCache {
    pub candidates: Vec<TempCandidate>,
    pub last_value: Option<f32>,
    pub last_source: String,
    pub last_update: Option<Instant>,
    pub last_scan: Option<Instant>,
    pub last_fallback: Option<Instant>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverState {
    /// No candidates known yet
    Cold,
    /// Candidates scanned, nothing accepted yet
    Scanned,
    /// At least one value accepted
    Sampled,
}

/// Enumerate thermal-zone and hwmon temperature nodes, best first.
///
/// The sort is stable, so equal scores keep directory order.
pub fn scan_candidates(access: &SensorAccess, prefer: &[&str], avoid: &[&str]) -> Vec<TempCandidate> {
    let mut out = Vec::new();

    for zone in access.list_dir(THERMAL_CLASS) {
        if !zone.starts_with("thermal_zone") {
            continue;
        }
        let base = format!("{}/{}", THERMAL_CLASS, zone);
        let temp_path = format!("{}/temp", base);
        if !access.exists_any(&temp_path) {
            continue;
        }
        let zone_type = access.read_direct(&format!("{}/type", base)).unwrap_or_default();
        let label = format!("thermal:{}", zone_type);
        let score = score_label(&label, prefer, avoid);
        out.push(TempCandidate {
            path: temp_path,
            label,
            score,
        });
    }

    for hwmon in access.list_dir(HWMON_CLASS) {
        let base = format!("{}/{}", HWMON_CLASS, hwmon);
        let name = access
            .read_direct(&format!("{}/name", base))
            .unwrap_or_else(|| hwmon.clone());

        for entry in access.list_dir(&base) {
            let Some(channel) = entry
                .strip_prefix("temp")
                .and_then(|rest| rest.strip_suffix("_input"))
            else {
                continue;
            };
            let channel_label = access
                .read_direct(&format!("{}/temp{}_label", base, channel))
                .unwrap_or_default();
            let label = format!("hwmon:{} {}", name, channel_label).trim().to_string();
            let score = score_label(&label, prefer, avoid);
            out.push(TempCandidate {
                path: format!("{}/{}", base, entry),
                label,
                score,
            });
        }
    }

    out.sort_by(|a, b| b.score.cmp(&a.score));
    out
}

/// Domain-parameterized temperature resolver (one per CPU, one per GPU).
#[derive(Debug, Clone)]
pub struct TempResolver {
    profile: ThermalProfile,
    cache: TempCache,
}

impl TempResolver {
    pub fn new(profile: ThermalProfile) -> Self {
        Self {
            profile,
            cache: TempCache::default(),
        }
    }

    pub fn cpu() -> Self {
        Self::new(CPU_PROFILE)
    }

    pub fn gpu() -> Self {
        Self::new(GPU_PROFILE)
    }

    pub fn profile(&self) -> &ThermalProfile {
        &self.profile
    }

    pub fn cache(&self) -> &TempCache {
        &self.cache
    }

    pub fn candidates(&self) -> &[TempCandidate] {
        &self.cache.candidates
    }

    pub fn state(&self) -> ResolverState {
        if self.cache.last_value.is_some() {
            ResolverState::Sampled
        } else if !self.cache.candidates.is_empty() {
            ResolverState::Scanned
        } else {
            ResolverState::Cold
        }
    }

    /// Resolve the domain temperature for the tick at `now`.
    pub fn resolve(&mut self, access: &SensorAccess, now: Instant) -> TempReading {
        self.rescan_if_stale(access, now);

        let (mut picked, mut source) = self.sample_candidates(access);

        if picked.is_none() {
            if let Some(hit) = self.dumpsys_fallback(access, now) {
                picked = Some(hit.celsius);
                source = hit.source();
            }
        }

        if let (Some(value), Some(last), Some(updated)) =
            (picked, self.cache.last_value, self.cache.last_update)
        {
            if now.saturating_duration_since(updated) < JUMP_WINDOW
                && (value - last).abs() > JUMP_THRESHOLD_C
            {
                log::debug!(
                    "{} temperature jump {:.1} -> {:.1} filtered",
                    self.profile.label,
                    last,
                    value
                );
                return TempReading {
                    celsius: Some(last),
                    source: format!("{} cached (jump filtered)", self.profile.label),
                    state: TempState::JumpFiltered,
                };
            }
        }

        if let Some(value) = picked {
            self.cache.last_value = Some(value);
            self.cache.last_source = source.clone();
            self.cache.last_update = Some(now);
            return TempReading {
                celsius: Some(value),
                source,
                state: TempState::Fresh,
            };
        }

        match self.cache.last_value {
            Some(last) => TempReading {
                celsius: Some(last),
                source: format!("{} using cached: {}", self.profile.label, self.cache.last_source),
                state: TempState::Cached,
            },
            None => TempReading {
                celsius: None,
                source: format!("{} no sensor found", self.profile.label),
                state: TempState::Missing,
            },
        }
    }

    fn rescan_if_stale(&mut self, access: &SensorAccess, now: Instant) {
        let stale = match self.cache.last_scan {
            None => true,
            Some(scanned) => now.saturating_duration_since(scanned) > RESCAN_INTERVAL,
        };
        if !self.cache.candidates.is_empty() && !stale {
            return;
        }

        let mut candidates = scan_candidates(access, self.profile.prefer, self.profile.avoid);
        candidates.truncate(MAX_CANDIDATES);
        log::debug!(
            "{} temperature rescan: {} candidates",
            self.profile.label,
            candidates.len()
        );
        self.cache.candidates = candidates;
        self.cache.last_scan = Some(now);
    }

    /// Average up to three plausible readings from the best candidates.
    fn sample_candidates(&self, access: &SensorAccess) -> (Option<f32>, String) {
        let mut temps = Vec::with_capacity(MAX_READINGS);
        let mut sources = Vec::with_capacity(MAX_READINGS);

        for candidate in self.cache.candidates.iter().take(SAMPLED_CANDIDATES) {
            let Some(raw) = access.read_any(&candidate.path) else {
                continue;
            };
            let Some(celsius) = parse_temp_celsius(&raw, self.cache.last_value) else {
                continue;
            };
            if !is_plausible_temp(celsius) {
                continue;
            }
            temps.push(celsius);
            sources.push(format!("{}({})", candidate.label, candidate.path));
            if temps.len() >= MAX_READINGS {
                break;
            }
        }

        if temps.is_empty() {
            return (None, String::new());
        }

        let average = temps.iter().sum::<f32>() / temps.len() as f32;
        (Some(average), sources.join(" | "))
    }

    fn dumpsys_fallback(
        &mut self,
        access: &SensorAccess,
        now: Instant,
    ) -> Option<super::scoring::DumpsysHit> {
        let due = match self.cache.last_fallback {
            None => true,
            Some(last) => now.saturating_duration_since(last) > FALLBACK_INTERVAL,
        };
        if !due {
            return None;
        }

        self.cache.last_fallback = Some(now);
        let dump = access.run(DUMPSYS_THERMAL)?;
        parse_dumpsys_thermal(&dump, self.profile.dumpsys_prefer, self.profile.dumpsys_avoid)
    }
}
