//! In-browser test harness.
//!
//! Builds the runner page from its template and hands it to the headless
//! browser. The generated page stays on disk so it can be opened manually.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::BuildConfig;
use crate::error::{BuildError, Result};
use crate::manifest::{FileManifest, ManifestFilter};
use crate::paths::PathSet;
use crate::runner::ToolExecutor;
use crate::stage::{ToolInvocation, ToolKind};

/// Test suites under the test directory, in inclusion order.
pub fn suite_manifest(config: &BuildConfig, paths: &PathSet) -> Result<FileManifest> {
    let filter = ManifestFilter {
        suffix: ".js",
        prefix: Some(config.tests.prefix.as_str()),
        exclude: &[],
    };
    FileManifest::discover(&paths.test_dir, &filter)
}

/// Replace `placeholder` in `template` with one script tag per suite.
pub fn render_runner_page(
    template: &str,
    template_path: &Path,
    placeholder: &str,
    suites: &FileManifest,
) -> Result<String> {
    if !template.contains(placeholder) {
        return Err(BuildError::Template {
            path: template_path.to_path_buf(),
            placeholder: placeholder.to_string(),
        });
    }

    let tags = suites
        .iter()
        .map(|s| format!("<script src=\"{}\"></script>", s.relative))
        .collect::<Vec<_>>()
        .join("\n");
    Ok(template.replace(placeholder, &tags))
}

/// Write the runner page for the current suites and return its path.
pub fn generate_runner_page(config: &BuildConfig, paths: &PathSet) -> Result<PathBuf> {
    let page = paths.test_dir.join(&config.tests.runner_page);
    match fs::remove_file(&page) {
        Ok(()) => debug!(page = %page.display(), "removed previous runner page"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(BuildError::fs(&page, e)),
    }

    let suites = suite_manifest(config, paths)?;
    let template = fs::read_to_string(&paths.test_template)
        .map_err(|e| BuildError::fs(&paths.test_template, e))?;
    let rendered = render_runner_page(
        &template,
        &paths.test_template,
        &config.tests.placeholder,
        &suites,
    )?;

    fs::write(&page, rendered).map_err(|e| BuildError::fs(&page, e))?;
    info!(suites = suites.len(), page = %page.display(), "runner page generated");
    Ok(page)
}

/// Generate the runner page and run the headless test runner against it.
///
/// The runner executes with the test directory as its working directory;
/// the pipeline's own working directory is never changed.
pub async fn run_tests(
    executor: &dyn ToolExecutor,
    config: &BuildConfig,
    paths: &PathSet,
) -> Result<()> {
    generate_runner_page(config, paths)?;

    let invocation = ToolInvocation::new(ToolKind::TestRunner, &config.tools)
        .arg(config.tools.runner_script.clone())
        .arg(config.tests.runner_page.clone())
        .current_dir(&paths.test_dir);

    executor.execute(&invocation).await?.into_result()?;
    Ok(())
}
