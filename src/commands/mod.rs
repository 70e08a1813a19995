// Command handlers module
pub mod monitor;
pub mod sensors;
pub mod version;

// Re-exports for cleaner imports
pub use monitor::execute as monitor;
pub use sensors::execute as sensors;
pub use version::execute as version;

use anyhow::{bail, Result};
use clap::ArgMatches;
use std::path::Path;

use crate::platform::{HostFs, NoShell, SensorAccess};

/// Build the access capability from the shared `--root` / `--no-root` flags.
///
/// A replay root never falls back to the shell: `su` would read the live
/// host instead of the captured tree.
pub(crate) fn sensor_access(matches: &ArgMatches, shell_fallback: bool) -> Result<SensorAccess> {
    if let Some(root) = matches.get_one::<String>("root") {
        if !Path::new(root).is_dir() {
            bail!("Root directory '{}' does not exist", root);
        }
        log::debug!("Reading sensors under {}", root);
        return Ok(SensorAccess::new(
            Box::new(HostFs::with_root(root)),
            Box::new(NoShell),
        ));
    }

    if matches.get_flag("no-root") || !shell_fallback {
        return Ok(SensorAccess::new(Box::new(HostFs::new()), Box::new(NoShell)));
    }

    Ok(SensorAccess::host())
}
