//! Cross-builds the function binaries and wraps each one in the zip layout
//! the `provided.al2023` runtime expects: a single executable `bootstrap`.

use std::fs;
use std::io::{Seek, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context, Result};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::{BuildProfile, LAMBDA_BINARIES, LAMBDA_PACKAGE};

pub const BOOTSTRAP_ENTRY: &str = "bootstrap";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub binary: PathBuf,
    pub zip: PathBuf,
}

pub fn build_args(target: &str, profile: BuildProfile) -> Vec<String> {
    let mut args: Vec<String> = ["build", "-p", LAMBDA_PACKAGE, "--target", target]
        .into_iter()
        .map(str::to_string)
        .collect();
    for (bin_name, _) in LAMBDA_BINARIES {
        args.push("--bin".to_string());
        args.push(bin_name.to_string());
    }
    if let Some(flag) = profile.as_cargo_flag() {
        args.push(flag.to_string());
    }
    args
}

/// Where each built binary is read from and where its zip is written.
pub fn artifacts(target: &str, profile: BuildProfile, dist_dir: &Path) -> Vec<Artifact> {
    let target_dir = Path::new("target").join(target).join(profile.dir_name());
    let suffix = if target.contains("windows") { ".exe" } else { "" };

    LAMBDA_BINARIES
        .iter()
        .map(|(bin_name, zip_name)| Artifact {
            binary: target_dir.join(format!("{bin_name}{suffix}")),
            zip: dist_dir.join(zip_name),
        })
        .collect()
}

pub fn run(target: &str, profile: BuildProfile, dist_dir: &Path) -> Result<()> {
    ensure_target_installed(target)?;

    crate::step("Build lambda binaries");
    let args = build_args(target, profile);
    crate::run_cargo(&args.iter().map(String::as_str).collect::<Vec<_>>())?;

    crate::step("Package lambda zip artifacts");
    fs::create_dir_all(dist_dir)
        .with_context(|| format!("failed to create {}", dist_dir.display()))?;

    let artifacts = artifacts(target, profile, dist_dir);
    for artifact in &artifacts {
        let binary = fs::read(&artifact.binary)
            .with_context(|| format!("expected lambda binary at {}", artifact.binary.display()))?;
        let file = fs::File::create(&artifact.zip)
            .with_context(|| format!("failed to create {}", artifact.zip.display()))?;
        write_bootstrap_zip(&binary, file)
            .with_context(|| format!("failed to write {}", artifact.zip.display()))?;
    }

    eprintln!("\nPackaged artifacts:");
    for artifact in &artifacts {
        eprintln!("- {}", artifact.zip.display());
    }
    Ok(())
}

/// Writes `binary` as an executable `bootstrap` entry and returns the
/// finished writer.
pub fn write_bootstrap_zip<W: Write + Seek>(binary: &[u8], writer: W) -> Result<W> {
    let mut zip = ZipWriter::new(writer);
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o755);
    zip.start_file(BOOTSTRAP_ENTRY, options)?;
    zip.write_all(binary)?;
    Ok(zip.finish()?)
}

/// Skipped with a warning when rustup itself is unavailable.
fn ensure_target_installed(target: &str) -> Result<()> {
    let output = match Command::new("rustup")
        .args(["target", "list", "--installed"])
        .output()
    {
        Ok(output) => output,
        Err(error) => {
            eprintln!("warning: rustup unavailable ({error}); skipping target check");
            return Ok(());
        }
    };

    if !output.status.success() {
        bail!(
            "`rustup target list --installed` failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    let installed = String::from_utf8_lossy(&output.stdout);
    if !installed.lines().any(|line| line.trim() == target) {
        bail!("rust target `{target}` is not installed; run `rustup target add {target}`");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Read};

    use zip::ZipArchive;

    use super::*;

    #[test]
    fn build_args_name_every_function_binary() {
        let args = build_args("x86_64-unknown-linux-gnu", BuildProfile::Release);

        assert_eq!(
            &args[..5],
            ["build", "-p", "event_sources_lambda", "--target", "x86_64-unknown-linux-gnu"]
        );
        assert_eq!(args.iter().filter(|arg| *arg == "--bin").count(), 5);
        assert!(args.contains(&"sqs_lambda".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("--release"));

        let debug = build_args("x86_64-unknown-linux-gnu", BuildProfile::Debug);
        assert!(!debug.contains(&"--release".to_string()));
    }

    #[test]
    fn artifacts_map_target_binaries_to_dist_zips() {
        let artifacts = artifacts(
            "x86_64-unknown-linux-gnu",
            BuildProfile::Release,
            Path::new("infra/dist"),
        );

        assert_eq!(artifacts.len(), 5);
        assert_eq!(
            artifacts[0],
            Artifact {
                binary: PathBuf::from("target/x86_64-unknown-linux-gnu/release/api_lambda"),
                zip: PathBuf::from("infra/dist/api.zip"),
            }
        );
    }

    #[test]
    fn windows_targets_package_exe_binaries() {
        let artifacts = artifacts("x86_64-pc-windows-msvc", BuildProfile::Debug, Path::new("d"));
        assert!(artifacts[0].binary.ends_with("api_lambda.exe"));
    }

    #[test]
    fn zip_holds_single_executable_bootstrap() {
        let cursor = write_bootstrap_zip(b"\x7fELF binary", Cursor::new(Vec::new()))
            .expect("zip should be written");

        let mut archive = ZipArchive::new(cursor).expect("zip should be readable");
        assert_eq!(archive.len(), 1);
        let mut entry = archive
            .by_name(BOOTSTRAP_ENTRY)
            .expect("bootstrap entry should exist");
        assert_eq!(entry.unix_mode().map(|mode| mode & 0o777), Some(0o755));

        let mut contents = Vec::new();
        entry.read_to_end(&mut contents).expect("entry should be readable");
        assert_eq!(contents, b"\x7fELF binary");
    }
}
