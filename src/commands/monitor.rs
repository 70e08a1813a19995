//! Live sampler command handler.
//!
//! Prints one line per tick, either a coloured summary or a JSON snapshot.

use anyhow::{Context, Result};
use clap::ArgMatches;
use colored::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::core::config::SamplerConfig;
use crate::core::telemetry::{Sampler, SamplerRuntime, Snapshot, TempReading, TempState, Zram};

/// Execute the monitor command
pub fn execute(matches: &ArgMatches) -> Result<()> {
    let config = build_config(matches)?;
    let count = matches.get_one::<u64>("count").copied();
    let json_output = matches.get_flag("json");

    let access = super::sensor_access(matches, config.shell_fallback)?;
    let sampler = Sampler::with_access(&config, access);

    let running = Arc::new(AtomicBool::new(true));
    let running_clone = running.clone();

    // Setup Ctrl+C handler
    ctrlc::set_handler(move || {
        running_clone.store(false, Ordering::Relaxed);
    })
    .map_err(|e| anyhow::anyhow!("Failed to set Ctrl+C handler: {}", e))?;

    let mut runtime =
        SamplerRuntime::start_with(config, sampler).context("Failed to start sampler")?;

    let mut printed = 0u64;
    while running.load(Ordering::Relaxed) {
        let Some(snapshot) = runtime.next_snapshot() else {
            break;
        };
        if !running.load(Ordering::Relaxed) {
            break;
        }

        if json_output {
            println!("{}", serde_json::to_string(snapshot.as_ref())?);
        } else {
            print_snapshot(&snapshot);
        }

        printed += 1;
        if count.is_some_and(|limit| printed >= limit) {
            break;
        }
    }

    runtime.shutdown();
    Ok(())
}

/// Defaults, then the `--config` file, then individual flags.
fn build_config(matches: &ArgMatches) -> Result<SamplerConfig> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => SamplerConfig::load(path)
            .with_context(|| format!("Failed to load config '{}'", path))?,
        None => SamplerConfig::default(),
    };

    if let Some(&interval) = matches.get_one::<u64>("interval") {
        config.interval_ms = interval;
    }
    if let Some(&history) = matches.get_one::<usize>("history") {
        config.gpu_history_capacity = history;
    }
    if matches.get_flag("no-root") {
        config.shell_fallback = false;
    }

    config.validate()?;
    Ok(config)
}

fn print_snapshot(snapshot: &Snapshot) {
    let time = chrono::DateTime::from_timestamp_millis(snapshot.timestamp_ms)
        .map(|t| t.with_timezone(&chrono::Local).format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".to_string());

    let cpu = &snapshot.cpu;
    let gpu = &snapshot.gpu;
    let ram = &snapshot.ram;

    let zram = match &ram.zram {
        Zram::Active(stats) => match stats.ratio {
            Some(ratio) => format!(" zram {:.2}x", ratio),
            None => " zram".to_string(),
        },
        Zram::Disabled => String::new(),
    };

    println!(
        "{} {} {} {} {} {} {} {} {} {} {}",
        time.dimmed(),
        "CPU".cyan().bold(),
        format!("{:>3.0}%", cpu.usage * 100.0),
        format_freq(cpu.freq_mhz),
        format_temp(&cpu.temperature),
        "GPU".green().bold(),
        format!("{:>3.0}%", gpu.usage * 100.0),
        format_freq(gpu.freq_mhz),
        format_temp(&gpu.temperature),
        "RAM".magenta().bold(),
        format!(
            "{:.1}/{:.1} GB ({:.0}%) swap {}{}",
            ram.used_gib,
            ram.total_gib,
            ram.usage * 100.0,
            ram.swap_label,
            zram
        ),
    );
}

fn format_freq(mhz: Option<u32>) -> String {
    match mhz {
        Some(mhz) => format!("{:>4} MHz", mhz),
        None => "  -- MHz".to_string(),
    }
}

fn format_temp(reading: &TempReading) -> ColoredString {
    let text = match reading.celsius {
        Some(c) => format!("{:>5.1}°C", c),
        None => "  --°C".to_string(),
    };

    match reading.state {
        TempState::Fresh => match reading.celsius {
            Some(c) if c >= 80.0 => text.red(),
            Some(c) if c >= 60.0 => text.yellow(),
            _ => text.normal(),
        },
        _ => text.dimmed(),
    }
}
