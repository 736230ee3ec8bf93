//! Lint gate over the JavaScript sources.

use std::path::PathBuf;
use tracing::{debug, warn};

use crate::config::BuildConfig;
use crate::error::{BuildError, Result};
use crate::manifest::{FileManifest, ManifestFilter};
use crate::paths::PathSet;
use crate::runner::ToolExecutor;
use crate::stage::{ToolInvocation, ToolKind};

/// Files the linter will be run on, in invocation order.
///
/// Vendored scripts are skipped by file name anywhere in the tree; non-bundled
/// libraries are skipped by their path under the library directory.
pub fn lint_manifest(config: &BuildConfig, paths: &PathSet) -> Result<FileManifest> {
    let filter = ManifestFilter {
        suffix: ".js",
        prefix: None,
        exclude: &config.scripts.vendored,
    };
    let copied: Vec<PathBuf> = config
        .scripts
        .copy_verbatim
        .iter()
        .map(|name| paths.lib_dir.join(name))
        .collect();
    Ok(FileManifest::discover(&paths.js_dir, &filter)?.without_paths(&copied))
}

/// Lint every eligible file, stopping at the first rejection.
///
/// Returns the number of files linted.
pub async fn lint(
    executor: &dyn ToolExecutor,
    config: &BuildConfig,
    paths: &PathSet,
) -> Result<usize> {
    let manifest = lint_manifest(config, paths)?;
    if manifest.is_empty() {
        warn!(dir = %paths.js_dir.display(), "no JavaScript files to lint");
    }

    for entry in manifest.iter() {
        let invocation = ToolInvocation::new(ToolKind::Linter, &config.tools)
            .path_arg(&entry.path)
            .current_dir(&paths.base_dir);

        let outcome = executor.execute(&invocation).await?;
        if !outcome.passed() {
            return Err(BuildError::Lint {
                file: entry.path.clone(),
                exit_code: outcome.exit_code,
            });
        }
        debug!(file = %entry.relative, "lint ok");
    }

    Ok(manifest.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::ScriptedExecutor;
    use std::fs;
    use tempfile::TempDir;

    fn project(files: &[&str]) -> (TempDir, BuildConfig, PathSet) {
        let temp = TempDir::new().unwrap();
        let config = BuildConfig::default();
        let paths = PathSet::resolve(temp.path(), &config).unwrap();
        for rel in files {
            let path = paths.js_dir.join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "define([], function() {});").unwrap();
        }
        (temp, config, paths)
    }

    #[tokio::test]
    async fn test_lints_each_eligible_file_once() {
        let (_temp, config, paths) = project(&[
            "app.js",
            "app/main.js",
            "lib/regexp.js",
            "lib/almond.js",
            "lib/require.js",
        ]);
        let executor = ScriptedExecutor::new();

        let count = lint(&executor, &config, &paths).await.unwrap();
        assert_eq!(count, 3);

        let linted: Vec<String> = executor
            .calls_of(ToolKind::Linter)
            .iter()
            .map(|c| c.args[0].clone())
            .collect();
        assert_eq!(linted.len(), 3);
        assert!(linted.iter().all(|a| !a.ends_with("almond.js")));
        assert!(linted.iter().all(|a| !a.ends_with("require.js")));
        assert!(linted[0].ends_with("app.js"));
        assert!(linted[2].ends_with("regexp.js"));
    }

    #[tokio::test]
    async fn test_copy_verbatim_files_are_not_linted() {
        let (_temp, mut config, paths) = project(&["app.js", "lib/polyfill.js"]);
        config.scripts.copy_verbatim = vec!["polyfill.js".to_string()];
        let executor = ScriptedExecutor::new();

        assert_eq!(lint(&executor, &config, &paths).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_nested_copy_verbatim_file_is_not_linted() {
        let (_temp, mut config, paths) =
            project(&["app.js", "lib/dom/polyfill.js", "app/dom/polyfill.js"]);
        config.scripts.copy_verbatim = vec!["dom/polyfill.js".to_string()];
        let executor = ScriptedExecutor::new();

        assert_eq!(lint(&executor, &config, &paths).await.unwrap(), 2);

        let linted: Vec<String> = executor
            .calls_of(ToolKind::Linter)
            .iter()
            .map(|c| c.args[0].clone())
            .collect();
        assert!(linted[0].ends_with("app.js"));
        assert!(linted[1].ends_with("app/dom/polyfill.js"));
        assert!(linted.iter().all(|a| !a.contains("lib/dom")));
    }

    #[tokio::test]
    async fn test_stops_at_first_failure() {
        let (_temp, config, paths) = project(&["a.js", "b.js", "c.js"]);
        let executor = ScriptedExecutor::new().fail_nth(ToolKind::Linter, 2, 1);

        let err = lint(&executor, &config, &paths).await.unwrap_err();
        match err {
            BuildError::Lint { file, exit_code } => {
                assert!(file.ends_with("b.js"));
                assert_eq!(exit_code, 1);
            }
            other => panic!("expected lint error, got {:?}", other),
        }
        assert_eq!(executor.calls_of(ToolKind::Linter).len(), 2);
    }

    #[tokio::test]
    async fn test_empty_tree_passes() {
        let (_temp, config, paths) = project(&[]);
        let executor = ScriptedExecutor::new();
        assert_eq!(lint(&executor, &config, &paths).await.unwrap(), 0);
        assert!(executor.calls().is_empty());
    }
}
