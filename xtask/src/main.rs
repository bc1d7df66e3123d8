// Licensed under the Apache-2.0 license

//! Developer tasks: `cargo xtask <command>`.

mod bloat;

use anyhow::{bail, Context, Result};
use std::process::Command;

const DEFAULT_TARGET: &str = "thumbv6m-none-eabi";
const DEFAULT_REPORT_DIR: &str = "target/size-report";

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let command = args.next().unwrap_or_else(|| "help".to_string());
    let rest: Vec<String> = args.collect();

    match command.as_str() {
        "test" => run_tests(),
        "check-no-std" => check_no_std(option(&rest, "--target").unwrap_or(DEFAULT_TARGET)),
        "bloat" => bloat::size_report(
            option(&rest, "--target").unwrap_or(DEFAULT_TARGET),
            option(&rest, "--output").unwrap_or(DEFAULT_REPORT_DIR),
        ),
        "help" | "--help" | "-h" => {
            print_help();
            Ok(())
        }
        other => {
            print_help();
            bail!("unknown command `{other}`")
        }
    }
}

fn option<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.iter()
        .position(|arg| arg == name)
        .and_then(|index| args.get(index + 1))
        .map(String::as_str)
}

fn print_help() {
    println!("Usage: cargo xtask <command> [options]");
    println!();
    println!("Commands:");
    println!("  test                       run the host test suite");
    println!("  check-no-std [--target T]  build the library for a bare-metal target");
    println!("  bloat [--target T] [--output DIR]");
    println!("                             release build size report");
}

fn cargo(args: &[&str]) -> Result<()> {
    let status = Command::new(env!("CARGO"))
        .args(args)
        .status()
        .with_context(|| format!("failed to run cargo {}", args.join(" ")))?;
    if !status.success() {
        bail!("cargo {} failed with {status}", args.join(" "));
    }
    Ok(())
}

fn run_tests() -> Result<()> {
    cargo(&["test", "-p", "c8051-smbus"])
}

fn check_no_std(target: &str) -> Result<()> {
    println!("Building c8051-smbus for {target}...");
    cargo(&["build", "-p", "c8051-smbus", "--lib", "--target", target])
}
