// Platform access layer: sysfs/procfs reads and the privileged shell

pub mod access;
pub mod elevation;
pub mod fixture;

// Re-exports for cleaner imports
pub use access::{HostFs, SensorAccess, SensorFs, Shell};
pub use elevation::{is_elevated, NoShell, SuShell};
pub use fixture::{FixtureFs, FixtureShell};
