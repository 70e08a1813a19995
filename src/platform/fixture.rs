//! In-memory capabilities for tests and offline replay.
//!
//! Both fixtures are cheap handles over shared state, so a test can keep a
//! clone, hand the other to a [`SensorAccess`](super::SensorAccess), and
//! mutate nodes between ticks.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, RwLock};

use super::access::{natural_cmp, SensorFs, Shell};

/// Path → text map standing in for sysfs/procfs.
#[derive(Debug, Clone, Default)]
pub struct FixtureFs {
    files: Arc<RwLock<BTreeMap<String, String>>>,
}

impl FixtureFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, path: &str, text: &str) -> Self {
        self.insert(path, text);
        self
    }

    pub fn insert(&self, path: &str, text: &str) {
        if let Ok(mut files) = self.files.write() {
            files.insert(path.to_string(), text.to_string());
        }
    }

    pub fn remove(&self, path: &str) {
        if let Ok(mut files) = self.files.write() {
            files.remove(path);
        }
    }
}

impl SensorFs for FixtureFs {
    fn read(&self, path: &str) -> Option<String> {
        let files = self.files.read().ok()?;
        let text = files.get(path)?.trim();
        if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        }
    }

    fn exists(&self, path: &str) -> bool {
        let Ok(files) = self.files.read() else {
            return false;
        };
        let prefix = format!("{}/", path.trim_end_matches('/'));
        files.contains_key(path) || files.keys().any(|key| key.starts_with(&prefix))
    }

    fn list_dir(&self, path: &str) -> Vec<String> {
        let Ok(files) = self.files.read() else {
            return Vec::new();
        };
        let prefix = format!("{}/", path.trim_end_matches('/'));
        let names: BTreeSet<String> = files
            .keys()
            .filter_map(|key| key.strip_prefix(&prefix))
            .filter_map(|rest| rest.split('/').next())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();
        let mut names: Vec<String> = names.into_iter().collect();
        names.sort_by(|a, b| natural_cmp(a, b));
        names
    }
}

/// Command → output map standing in for the elevated shell.
#[derive(Debug, Clone, Default)]
pub struct FixtureShell {
    outputs: Arc<RwLock<HashMap<String, String>>>,
    calls: Arc<Mutex<HashMap<String, usize>>>,
}

impl FixtureShell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, cmd: &str, output: &str) -> Self {
        self.insert(cmd, output);
        self
    }

    pub fn insert(&self, cmd: &str, output: &str) {
        if let Ok(mut outputs) = self.outputs.write() {
            outputs.insert(cmd.to_string(), output.to_string());
        }
    }

    /// How many times `cmd` was run, answered or not.
    pub fn calls_to(&self, cmd: &str) -> usize {
        self.calls
            .lock()
            .map(|calls| calls.get(cmd).copied().unwrap_or(0))
            .unwrap_or(0)
    }
}

impl Shell for FixtureShell {
    fn run(&self, cmd: &str) -> Option<String> {
        if let Ok(mut calls) = self.calls.lock() {
            *calls.entry(cmd.to_string()).or_insert(0) += 1;
        }

        let outputs = self.outputs.read().ok()?;
        let text = outputs.get(cmd)?.trim();
        if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        }
    }
}
