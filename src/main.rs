use anyhow::Result;
use clap::{Arg, ArgAction, Command};

use kpstat::commands;

fn root_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("no-root")
                .long("no-root")
                .help("Never fall back to `su` for unreadable nodes")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("root")
                .long("root")
                .value_name("DIR")
                .help("Read /sys and /proc from a captured tree under DIR (implies --no-root)"),
        )
}

fn main() -> Result<()> {
    kpstat::init_logging();

    let matches = Command::new("kpstat")
        .version(env!("CARGO_PKG_VERSION"))
        .about("CPU, GPU and RAM telemetry from procfs and sysfs")
        .disable_version_flag(true)
        .arg(
            Arg::new("version")
                .short('v')
                .short_alias('V')
                .long("version")
                .help("Print version information")
                .action(ArgAction::SetTrue),
        )
        .subcommand(root_args(
            Command::new("monitor")
                .about("Sample CPU, GPU and RAM once per interval")
                .arg(
                    Arg::new("interval")
                        .short('i')
                        .long("interval")
                        .value_name("MS")
                        .help("Milliseconds between samples (default: 1000)")
                        .value_parser(clap::value_parser!(u64).range(1..)),
                )
                .arg(
                    Arg::new("history")
                        .long("history")
                        .value_name("N")
                        .help("GPU usage history length (default: 60)")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    Arg::new("count")
                        .short('n')
                        .long("count")
                        .value_name("N")
                        .help("Stop after N snapshots")
                        .value_parser(clap::value_parser!(u64).range(1..)),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print one JSON snapshot per line")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("config")
                        .short('c')
                        .long("config")
                        .value_name("FILE")
                        .help("JSON sampler configuration"),
                ),
        ))
        .subcommand(root_args(
            Command::new("sensors")
                .about("List temperature sensor candidates by score")
                .arg(
                    Arg::new("domain")
                        .short('d')
                        .long("domain")
                        .value_name("DOMAIN")
                        .help("Only show one domain")
                        .value_parser(["cpu", "gpu"]),
                ),
        ))
        .subcommand(Command::new("version").about("Shows version information"))
        .get_matches();

    if matches.get_flag("version") {
        return commands::version();
    }

    match matches.subcommand() {
        Some(("monitor", sub_matches)) => {
            commands::monitor(sub_matches)?;
        }
        Some(("sensors", sub_matches)) => {
            commands::sensors(sub_matches)?;
        }
        Some(("version", _)) => {
            commands::version()?;
        }
        _ => {
            println!("Use 'kpstat --help' for more information.");
        }
    }

    Ok(())
}
