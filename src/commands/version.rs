use anyhow::Result;

use crate::platform::is_elevated;

pub fn execute() -> Result<()> {
    println!("kpstat version {}", env!("CARGO_PKG_VERSION"));
    if is_elevated() {
        println!("running as root, shell fallback not needed");
    }
    Ok(())
}
