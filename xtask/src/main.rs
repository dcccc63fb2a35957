//! Workspace chores for pathtiles.
//!
//!     cargo xtask test-all          test every feature combination in release mode
//!     cargo xtask export [config]   build the release binary and write a tile batch

use std::process::{exit, Command};

const PACKAGE: &str = "pathtiles";

/// Feature sets tested besides the defaults; `None` is the bare library.
const FEATURE_MATRIX: &[Option<&str>] = &[
    Some("parallel"),
    Some("stl-io"),
    Some("stl-io,parallel"),
    None,
];

fn main() {
    let mut args = std::env::args().skip(1);
    let cmd = args.next().unwrap_or_default();

    let result = match cmd.as_str() {
        "test-all" => test_all(),
        "export" => export(args.next()),
        _ => {
            eprintln!("Usage:");
            eprintln!("  cargo xtask test-all");
            eprintln!("  cargo xtask export [config.json]");
            exit(1);
        }
    };
    if let Err(e) = result {
        eprintln!("Error: {e}");
        exit(1);
    }
}

/// The `cargo test` arguments for one entry of the matrix.
fn test_args(features: Option<&str>) -> Vec<&str> {
    let mut args = vec!["test", "-p", PACKAGE, "--release", "--no-default-features"];
    match features {
        Some(set) => args.extend(["--features", set]),
        // the binary needs stl-io
        None => args.push("--lib"),
    }
    args
}

fn test_all() -> Result<(), Box<dyn std::error::Error>> {
    run_cmd(&["test", "-p", PACKAGE, "--release"], &[])?;
    for &features in FEATURE_MATRIX {
        println!("\n=== Testing features: {}\n", features.unwrap_or("(none)"));
        run_cmd(&test_args(features), &[])?;
    }
    Ok(())
}

/// Run the exporter with `RUST_LOG=info` unless the caller set a filter.
fn export(config: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let mut args = vec!["run", "-p", PACKAGE, "--release", "--"];
    if let Some(path) = config.as_deref() {
        args.push(path);
    }
    let log = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    run_cmd(&args, &[("RUST_LOG", log.as_str())])
}

fn run_cmd(args: &[&str], envs: &[(&str, &str)]) -> Result<(), Box<dyn std::error::Error>> {
    let status = Command::new("cargo")
        .args(args)
        .envs(envs.iter().copied())
        .spawn()?
        .wait()?;

    if !status.success() {
        return Err(format!("command `cargo {}` failed ({status})", args.join(" ")).into());
    }
    Ok(())
}
