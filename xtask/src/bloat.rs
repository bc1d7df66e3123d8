// Licensed under the Apache-2.0 license

use anyhow::{Context, Result};
use std::path::Path;
use std::process::Command;

/// Build the library in release mode for `target` and report the size of the
/// resulting archive, per object file where `size` is available.
pub fn size_report(target: &str, output_dir: &str) -> Result<()> {
    println!("Building release library for {target}...");

    let status = Command::new(env!("CARGO"))
        .args(["build", "-p", "c8051-smbus", "--lib", "--release", "--target", target])
        .status()
        .context("Failed to run cargo build")?;
    if !status.success() {
        anyhow::bail!("release build for {target} failed");
    }

    let rlib = Path::new("target")
        .join(target)
        .join("release")
        .join("libc8051_smbus.rlib");
    let bytes = std::fs::metadata(&rlib)
        .with_context(|| format!("Missing build output {}", rlib.display()))?
        .len();

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory: {output_dir}"))?;

    let mut report = format!("# c8051-smbus size report\n\nTarget: `{target}`\n\nArchive: {bytes} bytes\n");

    // `size` from binutils gives the per-section view; skip it when absent.
    if let Ok(output) = Command::new("size").arg("-t").arg(&rlib).output() {
        if output.status.success() {
            report.push_str("\n```\n");
            report.push_str(&String::from_utf8_lossy(&output.stdout));
            report.push_str("```\n");
        }
    }

    let report_file = Path::new(output_dir).join("size_report.md");
    std::fs::write(&report_file, &report)
        .with_context(|| format!("Failed to write report to {}", report_file.display()))?;

    println!("{report}");
    println!("Report written to {}", report_file.display());
    Ok(())
}
