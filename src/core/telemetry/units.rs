//! Unit normalization shared by every reader.
//!
//! Kernel nodes report the same quantity in wildly different units depending
//! on the driver (Hz, kHz, MHz; °C, deci-, milli- or micro-degrees). These
//! helpers pick the interpretation that lands in a plausible range.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::platform::SensorAccess;

/// Accepted CPU/GPU frequency range, MHz.
pub const MIN_FREQ_MHZ: u32 = 1;
pub const MAX_FREQ_MHZ: u32 = 6000;

/// Accepted temperature range, °C.
pub const MIN_TEMP_C: f32 = 5.0;
pub const MAX_TEMP_C: f32 = 150.0;

const TEMP_DIVISORS: [f64; 6] = [1.0, 10.0, 100.0, 1_000.0, 10_000.0, 1_000_000.0];

static NUMBER_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[-+]?[0-9]+(?:\.[0-9]+)?").expect("number token regex is valid"));

static FREQ_LIST_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s,]+").expect("separator regex is valid"));

/// First signed integer or decimal in `text`.
pub fn first_number_token(text: &str) -> Option<&str> {
    NUMBER_TOKEN.find(text).map(|m| m.as_str())
}

/// First integer token of `text`, e.g. `"1800000 kHz"` → 1800000.
pub fn first_integer(text: &str) -> Option<i64> {
    first_number_token(text)?.parse().ok()
}

/// Convert a raw frequency of unknown unit to MHz.
///
/// ≥ 10,000,000 is taken as Hz, ≥ 10,000 as kHz, anything else as MHz.
/// Results outside [1, 6000] MHz are rejected.
pub fn normalize_to_mhz(raw: i64) -> Option<u32> {
    if raw <= 0 {
        return None;
    }

    let mhz = if raw >= 10_000_000 {
        raw / 1_000_000
    } else if raw >= 10_000 {
        raw / 1_000
    } else {
        raw
    };

    u32::try_from(mhz)
        .ok()
        .filter(|mhz| (MIN_FREQ_MHZ..=MAX_FREQ_MHZ).contains(mhz))
}

pub fn is_plausible_temp(celsius: f32) -> bool {
    (MIN_TEMP_C..=MAX_TEMP_C).contains(&celsius)
}

/// Interpret a raw temperature node as °C.
///
/// Every divisor whose result is plausible is a candidate. Without history
/// the first candidate in divisor order wins; with a previous value the
/// closest candidate wins, which keeps a sensor from flipping units between
/// ticks.
pub fn parse_temp_celsius(raw: &str, last: Option<f32>) -> Option<f32> {
    let token = first_number_token(raw)?;
    let value = match token.parse::<i64>() {
        Ok(v) => v as f64,
        Err(_) => token.parse::<f64>().ok()?,
    };

    let mut options = TEMP_DIVISORS
        .iter()
        .map(|divisor| (value / divisor) as f32)
        .filter(|celsius| is_plausible_temp(*celsius));

    match last {
        None => options.next(),
        Some(last) => options.min_by(|a, b| {
            (a - last)
                .abs()
                .partial_cmp(&(b - last).abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        }),
    }
}

/// Parse a devfreq `available_frequencies` list into sorted, unique MHz.
pub fn parse_freq_list_mhz(raw: Option<&str>) -> Vec<u32> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Vec::new();
    };

    let mut freqs: Vec<u32> = FREQ_LIST_SEPARATOR
        .split(raw)
        .filter_map(|token| token.parse::<i64>().ok())
        .filter_map(normalize_to_mhz)
        .collect();
    freqs.sort_unstable();
    freqs.dedup();
    freqs
}

/// Read a node (with shell fallback) and take its first integer token.
pub fn read_integer(access: &SensorAccess, path: &str) -> Option<i64> {
    access.read_any(path).and_then(|text| first_integer(&text))
}

/// Read a node as a frequency in MHz.
pub fn read_freq_mhz(access: &SensorAccess, path: &str) -> Option<u32> {
    read_integer(access, path).and_then(normalize_to_mhz)
}

pub fn kb_to_gib(kb: u64) -> f64 {
    kb as f64 / 1024.0 / 1024.0
}

pub fn bytes_to_gib(bytes: u64) -> f64 {
    bytes as f64 / 1024.0 / 1024.0 / 1024.0
}
