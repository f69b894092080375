use std::path::Path;
use std::process::{exit, Command};

use anyhow::{ensure, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

mod drive;
mod package;

const LAMBDA_PACKAGE: &str = "event_sources_lambda";

/// Function binaries and the artifact each one is packaged into.
const LAMBDA_BINARIES: [(&str, &str); 5] = [
    ("api_lambda", "api.zip"),
    ("async_event_lambda", "async_event.zip"),
    ("dynamo_stream_lambda", "dynamo_stream.zip"),
    ("kinesis_stream_lambda", "kinesis_stream.zip"),
    ("sqs_lambda", "sqs.zip"),
];

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the event sources workspace",
    long_about = "A unified CLI for packaging the Lambda functions, running CI checks,\n\
                  and driving a deployed stack with sample traffic."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run CI checks (fmt, clippy, tests)
    Ci {
        /// Job to run
        #[arg(value_enum, default_value_t = CiJob::Check)]
        job: CiJob,
    },
    /// Build and package Rust Lambda artifacts for deployment
    ServerlessPackage {
        /// Compilation target triple for Lambda binaries
        #[arg(long, default_value = "x86_64-unknown-linux-gnu")]
        target: String,
        /// Build profile used for binaries
        #[arg(value_enum, long, default_value_t = BuildProfile::Release)]
        profile: BuildProfile,
        /// Directory receiving the zip artifacts
        #[arg(long, default_value = "infra/dist")]
        dist_dir: String,
    },
    /// Send one clean and one error-marked request per route to a deployed stack
    Drive {
        /// samconfig.toml environment holding the stack name
        #[arg(default_value = "default")]
        config_name: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum CiJob {
    /// Formatting, clippy, and tests
    Check,
    /// Build every Lambda binary for the host
    Build,
    /// Run check + build
    All,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum BuildProfile {
    Debug,
    Release,
}

impl BuildProfile {
    fn dir_name(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Release => "release",
        }
    }

    fn as_cargo_flag(self) -> Option<&'static str> {
        match self {
            Self::Debug => None,
            Self::Release => Some("--release"),
        }
    }
}

// ── helpers ────────────────────────────────────────────────────────

fn step(label: &str) {
    eprintln!("\n=== {label} ===");
}

/// Runs cargo with inherited stdio, failing on a non-zero exit.
fn run_cargo(args: &[&str]) -> Result<()> {
    eprintln!("+ cargo {}", args.join(" "));
    let status = Command::new("cargo")
        .args(args)
        .status()
        .context("failed to execute cargo")?;
    ensure!(status.success(), "`cargo {}` exited with {status}", args.join(" "));
    Ok(())
}

// ── CI jobs ────────────────────────────────────────────────────────

/// Labelled cargo invocations making up the `check` job, in order.
fn check_steps() -> [(&'static str, Vec<&'static str>); 5] {
    [
        ("Check formatting", vec!["fmt", "--all", "--", "--check"]),
        (
            "Clippy",
            vec!["clippy", "--all-targets", "--all-features", "--", "-D", "warnings"],
        ),
        ("Test event_sources_core", vec!["test", "-p", "event_sources_core"]),
        ("Test event_sources_lambda", vec!["test", "-p", LAMBDA_PACKAGE]),
        ("Test xtask", vec!["test", "-p", "xtask"]),
    ]
}

fn run_ci(job: CiJob) -> Result<()> {
    if matches!(job, CiJob::Check | CiJob::All) {
        for (label, args) in check_steps() {
            step(label);
            run_cargo(&args)?;
        }
    }
    if matches!(job, CiJob::Build | CiJob::All) {
        step("Build lambda binaries");
        run_cargo(&["build", "-p", LAMBDA_PACKAGE, "--bins"])?;
    }
    eprintln!("\nCI job passed.");
    Ok(())
}

// ── main ───────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    let (task, outcome) = match cli.command {
        Commands::Ci { job } => ("ci", run_ci(job)),
        Commands::ServerlessPackage {
            target,
            profile,
            dist_dir,
        } => (
            "serverless-package",
            package::run(&target, profile, Path::new(&dist_dir)),
        ),
        Commands::Drive { config_name } => ("drive", drive::run(&config_name)),
    };

    if let Err(error) = outcome {
        eprintln!("{task} failed: {error:#}");
        exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_job_runs_format_then_lint_then_every_crate_test() {
        let labels: Vec<_> = check_steps().iter().map(|(label, _)| *label).collect();
        assert_eq!(labels[..2], ["Check formatting", "Clippy"]);

        let tested: Vec<_> = check_steps()
            .into_iter()
            .filter(|(_, args)| args[0] == "test")
            .map(|(_, args)| args[2])
            .collect();
        assert_eq!(tested, ["event_sources_core", "event_sources_lambda", "xtask"]);
    }

    #[test]
    fn every_binary_packages_into_a_distinct_zip() {
        let mut zips: Vec<_> = LAMBDA_BINARIES.iter().map(|(_, zip)| *zip).collect();
        zips.sort_unstable();
        zips.dedup();
        assert_eq!(zips.len(), LAMBDA_BINARIES.len());
    }
}
