//! Temperature candidate listing.
//!
//! Shows what the resolver would consider for each domain, best first, with
//! the value each node currently decodes to.

use anyhow::Result;
use clap::ArgMatches;
use colored::*;

use crate::core::telemetry::thermal::{scan_candidates, ThermalProfile, CPU_PROFILE, GPU_PROFILE};
use crate::core::telemetry::units::parse_temp_celsius;
use crate::platform::SensorAccess;

/// Execute the sensors command
pub fn execute(matches: &ArgMatches) -> Result<()> {
    let access = super::sensor_access(matches, true)?;

    let profiles: Vec<ThermalProfile> = match matches.get_one::<String>("domain").map(String::as_str) {
        Some("cpu") => vec![CPU_PROFILE],
        Some("gpu") => vec![GPU_PROFILE],
        _ => vec![CPU_PROFILE, GPU_PROFILE],
    };

    for (i, profile) in profiles.iter().enumerate() {
        if i > 0 {
            println!();
        }
        print_domain(&access, profile);
    }

    Ok(())
}

fn print_domain(access: &SensorAccess, profile: &ThermalProfile) {
    let candidates = scan_candidates(access, profile.prefer, profile.avoid);

    println!("{}", format!("{} temperature sensors", profile.label).cyan().bold());
    if candidates.is_empty() {
        println!("  {}", "No readable temperature nodes found".dimmed());
        return;
    }

    println!(
        "  {:>6}  {:>8}  {:<28} {}",
        "SCORE".bold(),
        "VALUE".bold(),
        "LABEL".bold(),
        "PATH".bold()
    );
    for candidate in &candidates {
        let value = access
            .read_any(&candidate.path)
            .and_then(|raw| parse_temp_celsius(&raw, None))
            .map(|c| format!("{:.1}°C", c))
            .unwrap_or_else(|| "--".to_string());

        let score = format!("{:>6}", candidate.score);
        let score = if candidate.score > 0 {
            score.green()
        } else if candidate.score < 0 {
            score.red()
        } else {
            score.normal()
        };

        println!(
            "  {}  {:>8}  {:<28} {}",
            score,
            value,
            candidate.label,
            candidate.path.dimmed()
        );
    }
}
