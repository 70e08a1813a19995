//! Pure label scoring and dumpsys parsing.
//!
//! Nothing here touches the filesystem; the resolver feeds it labels built
//! from thermal-zone types, hwmon names and dumpsys lines.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::telemetry::units::{first_number_token, is_plausible_temp};

const PREFER_BASE: i32 = 120;
const PREFER_STEP: i32 = 6;
const AVOID_PENALTY: i32 = 200;
const GENERIC_BONUS: i32 = 6;
const GENERIC_KEYWORDS: [&str; 4] = ["tsens", "tmu", "therm", "sensor"];

/// Keyword lists for one temperature domain.
#[derive(Debug, Clone, Copy)]
pub struct ThermalProfile {
    /// Domain name used in fallback labels, e.g. "CPU".
    pub label: &'static str,
    pub prefer: &'static [&'static str],
    pub avoid: &'static [&'static str],
    pub dumpsys_prefer: &'static [&'static str],
    pub dumpsys_avoid: &'static [&'static str],
}

pub const CPU_PROFILE: ThermalProfile = ThermalProfile {
    label: "CPU",
    prefer: &[
        "mtktscpu", "cpu", "apss", "cpuss", "soc", "tsens", "big", "little", "cluster",
    ],
    avoid: &["battery", "charger", "skin", "usb", "wifi", "modem", "pmic"],
    dumpsys_prefer: &["cpu", "apss", "cpuss", "soc"],
    dumpsys_avoid: &["battery", "skin", "usb"],
};

pub const GPU_PROFILE: ThermalProfile = ThermalProfile {
    label: "GPU",
    prefer: &["gpu", "gpuss", "gfx", "mali", "adreno", "kgsl", "vgpu"],
    avoid: &[
        "battery", "charger", "skin", "usb", "wifi", "modem", "pmic", "cpu", "apss",
    ],
    dumpsys_prefer: &["gpu", "gpuss", "gfx", "mali", "adreno"],
    dumpsys_avoid: &["battery", "skin", "usb"],
};

/// Score a sensor label against a domain's keyword lists.
///
/// Earlier prefer keywords weigh more; any avoid keyword sinks the label.
pub fn score_label(label: &str, prefer: &[&str], avoid: &[&str]) -> i32 {
    let low = label.to_lowercase();
    let mut score = 0;

    for (i, keyword) in prefer.iter().enumerate() {
        if low.contains(keyword) {
            score += PREFER_BASE - i as i32 * PREFER_STEP;
        }
    }

    for keyword in avoid {
        if low.contains(keyword) {
            score -= AVOID_PENALTY;
        }
    }

    if GENERIC_KEYWORDS.iter().any(|k| low.contains(k)) {
        score += GENERIC_BONUS;
    }

    score
}

static DUMPSYS_M_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"mName=([^,}]+)").expect("mName regex is valid"));
static DUMPSYS_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"name=([^,}]+)").expect("name regex is valid"));
static DUMPSYS_M_VALUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"mValue=([-+]?[0-9]+(?:\.[0-9]+)?)").expect("mValue regex is valid")
});
static DUMPSYS_VALUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"value=([-+]?[0-9]+(?:\.[0-9]+)?)").expect("value regex is valid")
});

/// Best temperature found in a thermal-service dump.
#[derive(Debug, Clone, PartialEq)]
pub struct DumpsysHit {
    pub celsius: f32,
    /// Sensor name, or "unknown" when the line carried none.
    pub name: String,
}

impl DumpsysHit {
    pub fn source(&self) -> String {
        format!("dumpsys:{}", self.name)
    }
}

fn capture<'a>(re: &Regex, line: &'a str) -> Option<&'a str> {
    re.captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Scan a `dumpsys thermalservice` dump for the best-scoring plausible value.
///
/// Tolerates both the `mName=/mValue=` and `name=/value=` spellings and
/// skips anything mentioning the battery or charger.
pub fn parse_dumpsys_thermal(text: &str, prefer: &[&str], avoid: &[&str]) -> Option<DumpsysHit> {
    let mut best: Option<(i32, DumpsysHit)> = None;

    for line in text.lines() {
        let low = line.to_lowercase();
        if low.contains("battery") || low.contains("charger") {
            continue;
        }

        let name = capture(&DUMPSYS_M_NAME, line)
            .or_else(|| capture(&DUMPSYS_NAME, line))
            .map(str::trim)
            .unwrap_or("");

        let value = capture(&DUMPSYS_M_VALUE, line)
            .or_else(|| capture(&DUMPSYS_VALUE, line))
            .or_else(|| first_number_token(line))
            .and_then(|v| v.parse::<f32>().ok());

        let Some(celsius) = value.filter(|v| is_plausible_temp(*v)) else {
            continue;
        };

        let score = score_label(&format!("dumpsys:{} {}", name, line), prefer, avoid);
        if best.as_ref().map_or(true, |(best_score, _)| score > *best_score) {
            let name = if name.is_empty() { "unknown" } else { name };
            best = Some((
                score,
                DumpsysHit {
                    celsius,
                    name: name.to_string(),
                },
            ));
        }
    }

    best.map(|(_, hit)| hit)
}
