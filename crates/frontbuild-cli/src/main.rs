//! frontbuild - static front-end build pipeline CLI
//!
//! Running `frontbuild` with no arguments performs a full build:
//!
//! 1. Lint the JavaScript sources
//! 2. Run the in-browser test suite
//! 3. Reset the output directory
//! 4. Compile Sass, bundle AMD modules
//! 5. Rewrite the entry page to load the bundle
//!
//! The exit code is 0 when the build completes and 1 otherwise.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, Level};

use frontbuild_core::{
    find_config_from, init_tracing, load_config, BuildReport, ConsoleReporter, PathSet, Pipeline,
    ProcessExecutor,
};

#[derive(Parser, Debug)]
#[command(name = "frontbuild")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Build the front-end bundle: lint, test, compile styles and scripts, rewrite HTML", long_about = None)]
struct Cli {
    /// Project root (default: directory of the nearest frontbuild.toml, else the current directory)
    #[arg(long, env = "FRONTBUILD_BASE_DIR")]
    base_dir: Option<PathBuf>,

    /// Configuration file (default: <base-dir>/frontbuild.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Skip the lint and test gates
    #[arg(long)]
    skip_checks: bool,

    /// Write a JSON build report to this path
    #[arg(long)]
    report: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(cli.json, level);

    // Setup errors end the run before the pipeline prints any banner.
    let pipeline = match prepare(&cli) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            eprintln!("error: {:#}", e);
            println!();
            println!(r"/o\ BUILD FAILED /o\");
            return ExitCode::FAILURE;
        }
    };

    let report = pipeline.run().await;

    if let Some(path) = &cli.report {
        if let Err(e) = write_report(&report, path) {
            eprintln!("error: {:#}", e);
            return ExitCode::FAILURE;
        }
    }

    ExitCode::from(report.exit_code() as u8)
}

/// Load configuration, resolve paths and check the report destination.
fn prepare(cli: &Cli) -> Result<Pipeline> {
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let (base_dir, config_path) =
        resolve_locations(&cwd, cli.base_dir.clone(), cli.config.clone());

    let mut config = load_config(config_path.as_deref()).with_context(|| match &config_path {
        Some(p) => format!("Failed to load {}", p.display()),
        None => "Invalid default configuration".to_string(),
    })?;
    if cli.skip_checks {
        config.pipeline.skip_checks = true;
    }

    let paths = PathSet::resolve(&base_dir, &config).context("Failed to resolve project paths")?;
    info!(base_dir = %paths.base_dir.display(), "project resolved");

    if let Some(report) = &cli.report {
        check_report_destination(report)?;
    }

    Ok(Pipeline::new(
        config,
        paths,
        Arc::new(ProcessExecutor::new()),
        Arc::new(ConsoleReporter::new()),
    ))
}

/// The report's directory must exist before the build starts.
fn check_report_destination(path: &Path) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => return Ok(()),
    };
    if !parent.is_dir() {
        bail!("Report directory {} does not exist", parent.display());
    }
    Ok(())
}

fn write_report(report: &BuildReport, path: &Path) -> Result<()> {
    let json = report.to_json().context("Failed to serialize build report")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write report to {}", path.display()))
}

/// Work out the project root and configuration file.
///
/// An explicit `--config` without `--base-dir` anchors the project at the
/// config file's directory.
fn resolve_locations(
    cwd: &Path,
    base_dir: Option<PathBuf>,
    config: Option<PathBuf>,
) -> (PathBuf, Option<PathBuf>) {
    let absolutize = |p: PathBuf| if p.is_absolute() { p } else { cwd.join(p) };
    let base_dir = base_dir.map(absolutize);
    let config = config.map(absolutize);

    match (base_dir, config) {
        (Some(base), Some(config)) => (base, Some(config)),
        (Some(base), None) => {
            let candidate = base.join(frontbuild_core::CONFIG_FILE_NAME);
            let config = candidate.is_file().then_some(candidate);
            (base, config)
        }
        (None, Some(config)) => {
            let base = config
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| cwd.to_path_buf());
            (base, Some(config))
        }
        (None, None) => match find_config_from(cwd.to_path_buf()) {
            Some(found) => {
                let base = found
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| cwd.to_path_buf());
                (base, Some(found))
            }
            None => (cwd.to_path_buf(), None),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_cli_parses_without_arguments() {
        let cli = Cli::try_parse_from(["frontbuild"]).unwrap();
        assert!(cli.config.is_none());
        assert!(!cli.skip_checks);
        assert!(cli.report.is_none());
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::try_parse_from([
            "frontbuild",
            "--base-dir",
            "/project",
            "--skip-checks",
            "--report",
            "report.json",
            "-v",
        ])
        .unwrap();
        assert_eq!(cli.base_dir, Some(PathBuf::from("/project")));
        assert!(cli.skip_checks);
        assert!(cli.verbose);
        assert_eq!(cli.report, Some(PathBuf::from("report.json")));
    }

    #[test]
    fn test_locations_found_by_walking_up() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("frontbuild.toml"), "").unwrap();
        let nested = temp.path().join("src").join("js");
        std::fs::create_dir_all(&nested).unwrap();

        let (base, config) = resolve_locations(&nested, None, None);
        assert_eq!(base, temp.path());
        assert_eq!(config, Some(temp.path().join("frontbuild.toml")));
    }

    #[test]
    fn test_locations_from_explicit_config() {
        let cwd = Path::new("/work");
        let (base, config) = resolve_locations(cwd, None, Some(PathBuf::from("site/build.toml")));
        assert_eq!(base, PathBuf::from("/work/site"));
        assert_eq!(config, Some(PathBuf::from("/work/site/build.toml")));
    }

    #[test]
    fn test_report_destination_checked() {
        let temp = TempDir::new().unwrap();
        assert!(check_report_destination(&temp.path().join("report.json")).is_ok());
        assert!(check_report_destination(Path::new("report.json")).is_ok());

        let err = check_report_destination(&temp.path().join("missing").join("report.json"))
            .unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_locations_base_dir_without_config_file() {
        let temp = TempDir::new().unwrap();
        let (base, config) = resolve_locations(temp.path(), Some(temp.path().to_path_buf()), None);
        assert_eq!(base, temp.path());
        assert!(config.is_none());
    }
}
