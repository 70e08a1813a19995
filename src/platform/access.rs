//! Privileged access shim.
//!
//! Every sensor read in the crate goes through [`SensorAccess`], which
//! composes two injected capabilities: direct file access ([`SensorFs`]) and
//! an elevated shell ([`Shell`]). Neither capability ever returns an error;
//! a missing, empty or unreadable node is simply `None`.

use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

/// Direct, read-only access to kernel pseudo-files.
pub trait SensorFs: Send + Sync {
    /// Read a node as trimmed text. `None` when absent, unreadable or empty.
    fn read(&self, path: &str) -> Option<String>;

    fn exists(&self, path: &str) -> bool;

    /// Entry names of a directory, sorted. Empty when the directory is absent.
    fn list_dir(&self, path: &str) -> Vec<String>;
}

/// One-shot command runner with a "never fails, maybe returns text" contract.
pub trait Shell: Send + Sync {
    fn run(&self, cmd: &str) -> Option<String>;
}

/// Shell command used to read a node the direct path could not.
pub fn cat_command(path: &str) -> String {
    format!("cat '{}' 2>/dev/null", path)
}

/// Shell command used to probe for a node the direct path could not see.
pub fn exists_command(path: &str) -> String {
    format!("[ -e '{}' ] && echo ok", path)
}

/// Filesystem access against the live host, optionally re-rooted.
///
/// A rooted `HostFs` maps `/proc/stat` to `<root>/proc/stat`, which lets a
/// captured sysfs/procfs tree be replayed on another machine.
#[derive(Debug, Clone)]
pub struct HostFs {
    root: Option<PathBuf>,
}

impl HostFs {
    pub fn new() -> Self {
        Self { root: None }
    }

    pub fn with_root<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        match &self.root {
            Some(root) => root.join(path.trim_start_matches('/')),
            None => PathBuf::from(path),
        }
    }
}

impl Default for HostFs {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorFs for HostFs {
    fn read(&self, path: &str) -> Option<String> {
        let resolved = self.resolve(path);
        let bytes = fs::read(&resolved).ok()?;
        let text = String::from_utf8_lossy(&bytes).trim().to_string();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    fn exists(&self, path: &str) -> bool {
        Path::new(&self.resolve(path)).exists()
    }

    fn list_dir(&self, path: &str) -> Vec<String> {
        let Ok(entries) = fs::read_dir(self.resolve(path)) else {
            return Vec::new();
        };

        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().to_string())
            .collect();
        names.sort_by(|a, b| natural_cmp(a, b));
        names
    }
}

/// Order entry names the way the kernel enumerates them: `thermal_zone2`
/// before `thermal_zone10`. Names without a numeric suffix compare as text.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (a_stem, a_num) = split_index(a);
    let (b_stem, b_num) = split_index(b);
    a_stem
        .cmp(b_stem)
        .then(a_num.cmp(&b_num))
        .then_with(|| a.cmp(b))
}

fn split_index(name: &str) -> (&str, Option<u64>) {
    let stem = name.trim_end_matches(|c: char| c.is_ascii_digit());
    let index = name[stem.len()..].parse().ok();
    (stem, index)
}

/// Composed access capability handed to every reader.
pub struct SensorAccess {
    fs: Box<dyn SensorFs>,
    shell: Box<dyn Shell>,
}

impl SensorAccess {
    pub fn new(fs: Box<dyn SensorFs>, shell: Box<dyn Shell>) -> Self {
        Self { fs, shell }
    }

    /// Access to the live host with `su` fallback.
    pub fn host() -> Self {
        Self::new(
            Box::new(HostFs::new()),
            Box::new(super::elevation::SuShell::new()),
        )
    }

    /// Read without the shell fallback.
    pub fn read_direct(&self, path: &str) -> Option<String> {
        self.fs.read(path)
    }

    /// Read directly, then through the elevated shell.
    pub fn read_any(&self, path: &str) -> Option<String> {
        self.fs
            .read(path)
            .or_else(|| self.shell.run(&cat_command(path)))
    }

    pub fn exists_any(&self, path: &str) -> bool {
        self.fs.exists(path) || self.shell.run(&exists_command(path)).as_deref() == Some("ok")
    }

    pub fn exists_direct(&self, path: &str) -> bool {
        self.fs.exists(path)
    }

    pub fn list_dir(&self, path: &str) -> Vec<String> {
        self.fs.list_dir(path)
    }

    pub fn run(&self, cmd: &str) -> Option<String> {
        self.shell.run(cmd)
    }
}
