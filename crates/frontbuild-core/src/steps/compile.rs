//! Style compiler and script bundler invocation.

use std::fs;
use tracing::{debug, info};

use crate::config::BuildConfig;
use crate::error::{BuildError, Result};
use crate::paths::PathSet;
use crate::runner::ToolExecutor;
use crate::stage::{ToolInvocation, ToolKind};

/// Build the style compiler call: `compass compile -c <sass-config>`.
pub fn style_invocation(config: &BuildConfig, paths: &PathSet) -> ToolInvocation {
    ToolInvocation::new(ToolKind::StyleCompiler, &config.tools)
        .arg("compile")
        .arg("-c")
        .path_arg(&paths.sass_config)
        .current_dir(&paths.base_dir)
}

/// Build the bundler call: `r.js -o <js-config>`.
pub fn bundle_invocation(config: &BuildConfig, paths: &PathSet) -> ToolInvocation {
    ToolInvocation::new(ToolKind::Bundler, &config.tools)
        .arg("-o")
        .path_arg(&paths.js_config)
        .current_dir(&paths.base_dir)
}

/// Compile Sass sources into the output directory.
pub async fn compile_styles(
    executor: &dyn ToolExecutor,
    config: &BuildConfig,
    paths: &PathSet,
) -> Result<()> {
    let invocation = style_invocation(config, paths);
    let outcome = executor.execute(&invocation).await?.into_result()?;
    debug!(duration_ms = outcome.duration_ms, "styles compiled");
    Ok(())
}

/// Bundle the AMD sources, then copy the non-bundled library scripts.
///
/// Copies start only after the bundler has exited successfully.
pub async fn bundle_scripts(
    executor: &dyn ToolExecutor,
    config: &BuildConfig,
    paths: &PathSet,
) -> Result<()> {
    let invocation = bundle_invocation(config, paths);
    let outcome = executor.execute(&invocation).await?.into_result()?;
    debug!(duration_ms = outcome.duration_ms, "scripts bundled");

    if config.scripts.copy_verbatim.is_empty() {
        return Ok(());
    }

    fs::create_dir_all(&paths.output_lib_dir)
        .map_err(|e| BuildError::fs(&paths.output_lib_dir, e))?;

    for name in &config.scripts.copy_verbatim {
        let from = paths.lib_dir.join(name);
        let to = paths.output_lib_dir.join(name);
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent).map_err(|e| BuildError::fs(parent, e))?;
        }
        fs::copy(&from, &to).map_err(|e| BuildError::fs(&from, e))?;
        info!(file = %name, "copied non-bundled script");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::ScriptedExecutor;
    use tempfile::TempDir;

    fn setup(copy: &[&str]) -> (TempDir, BuildConfig, PathSet) {
        let temp = TempDir::new().unwrap();
        let mut config = BuildConfig::default();
        config.scripts.copy_verbatim = copy.iter().map(|s| s.to_string()).collect();
        let paths = PathSet::resolve(temp.path(), &config).unwrap();
        (temp, config, paths)
    }

    #[tokio::test]
    async fn test_compile_styles_invokes_compass() {
        let (_temp, config, paths) = setup(&[]);
        let executor = ScriptedExecutor::new();

        compile_styles(&executor, &config, &paths).await.unwrap();

        let calls = executor.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program, "compass");
        assert_eq!(calls[0].args[0], "compile");
        assert_eq!(calls[0].args[1], "-c");
        assert!(calls[0].args[2].ends_with("sass-config.rb"));
        assert_eq!(calls[0].cwd.as_deref(), Some(paths.base_dir.as_path()));
    }

    #[tokio::test]
    async fn test_compile_styles_failure() {
        let (_temp, config, paths) = setup(&[]);
        let executor = ScriptedExecutor::new().fail_kind(ToolKind::StyleCompiler, 1);

        let err = compile_styles(&executor, &config, &paths).await.unwrap_err();
        assert!(matches!(
            err,
            BuildError::ExternalTool { ref tool, exit_code: 1 } if tool == "style-compiler"
        ));
    }

    #[tokio::test]
    async fn test_bundle_copies_after_success() {
        let (_temp, config, paths) = setup(&["promise.js"]);
        fs::create_dir_all(&paths.lib_dir).unwrap();
        fs::write(paths.lib_dir.join("promise.js"), "var Promise;").unwrap();
        let executor = ScriptedExecutor::new();

        bundle_scripts(&executor, &config, &paths).await.unwrap();

        let calls = executor.calls();
        assert_eq!(calls[0].program, "r.js");
        assert_eq!(calls[0].args[0], "-o");
        assert_eq!(
            fs::read_to_string(paths.output_lib_dir.join("promise.js")).unwrap(),
            "var Promise;"
        );
    }

    #[tokio::test]
    async fn test_bundle_failure_skips_copy() {
        let (_temp, config, paths) = setup(&["promise.js"]);
        fs::create_dir_all(&paths.lib_dir).unwrap();
        fs::write(paths.lib_dir.join("promise.js"), "var Promise;").unwrap();
        let executor = ScriptedExecutor::new().fail_kind(ToolKind::Bundler, 2);

        let err = bundle_scripts(&executor, &config, &paths).await.unwrap_err();
        assert!(matches!(err, BuildError::ExternalTool { exit_code: 2, .. }));
        assert!(!paths.output_lib_dir.join("promise.js").exists());
    }

    #[tokio::test]
    async fn test_missing_copy_source_is_filesystem_error() {
        let (_temp, config, paths) = setup(&["absent.js"]);
        let executor = ScriptedExecutor::new();

        let err = bundle_scripts(&executor, &config, &paths).await.unwrap_err();
        assert!(matches!(err, BuildError::Filesystem { .. }));
    }
}
