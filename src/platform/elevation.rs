use std::io::ErrorKind;
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};

use super::access::Shell;

#[cfg(unix)]
pub fn is_elevated() -> bool {
    // On Unix, check if running as root
    unsafe { libc::geteuid() == 0 }
}

#[cfg(not(unix))]
pub fn is_elevated() -> bool {
    false
}

/// Shell capability that runs commands with root privileges.
///
/// Uses `su -c` unless the process is already root, in which case the
/// command goes straight to `sh -c`. When no `su` binary exists the shell
/// disables itself after the first attempt so later ticks do not pay for a
/// failed spawn on every missing node.
pub struct SuShell {
    direct: bool,
    su_program: String,
    su_missing: AtomicBool,
}

impl SuShell {
    pub fn new() -> Self {
        Self {
            direct: is_elevated(),
            su_program: "su".to_string(),
            su_missing: AtomicBool::new(false),
        }
    }

    /// Always escalate through `program` (e.g. `/system/xbin/su`), even as root.
    pub fn with_program<S: Into<String>>(program: S) -> Self {
        Self {
            direct: false,
            su_program: program.into(),
            su_missing: AtomicBool::new(false),
        }
    }

    /// False once the `su` binary turned out to be missing.
    pub fn is_available(&self) -> bool {
        !self.su_missing.load(Ordering::Relaxed)
    }

    fn command(&self, cmd: &str) -> Command {
        let mut command = if self.direct {
            Command::new("sh")
        } else {
            Command::new(&self.su_program)
        };
        command
            .arg("-c")
            .arg(cmd)
            .stdin(Stdio::null())
            .stderr(Stdio::null());
        command
    }
}

impl Default for SuShell {
    fn default() -> Self {
        Self::new()
    }
}

impl Shell for SuShell {
    fn run(&self, cmd: &str) -> Option<String> {
        if self.su_missing.load(Ordering::Relaxed) {
            return None;
        }

        let output = match self.command(cmd).output() {
            Ok(output) => output,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                if !self.su_missing.swap(true, Ordering::Relaxed) {
                    log::warn!("No su binary found, privileged fallback disabled");
                }
                return None;
            }
            Err(e) => {
                log::debug!("Privileged command failed to start: {}", e);
                return None;
            }
        };

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// Shell capability that never runs anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoShell;

impl Shell for NoShell {
    fn run(&self, _cmd: &str) -> Option<String> {
        None
    }
}
