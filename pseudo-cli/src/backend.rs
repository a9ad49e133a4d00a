//! Turning emitted IR into a native program by shelling out to a C toolchain.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Write `ir` next to `exe` and link it with `cc`.
pub fn build(cc: &str, ir: &str, exe: &Path) -> Result<()> {
    let ll: PathBuf = exe.with_extension("ll");
    fs::write(&ll, ir).with_context(|| format!("Error writing '{}'", ll.display()))?;

    tracing::debug!(cc, input = %ll.display(), output = %exe.display(), "linking");
    let status = Command::new(cc)
        .arg(&ll)
        .arg("-o")
        .arg(exe)
        .arg("-Wno-override-module")
        .status()
        .with_context(|| format!("Failed to launch '{cc}'"))?;
    if !status.success() {
        bail!("'{cc}' exited with {status}");
    }
    Ok(())
}

/// Run a built program, returning its exit code.
pub fn run(exe: &Path) -> Result<i32> {
    // A bare file name would be looked up on PATH.
    let target = if exe.components().count() == 1 {
        Path::new(".").join(exe)
    } else {
        exe.to_path_buf()
    };
    let status = Command::new(&target)
        .status()
        .with_context(|| format!("Failed to run '{}'", target.display()))?;
    Ok(status.code().unwrap_or(1))
}
