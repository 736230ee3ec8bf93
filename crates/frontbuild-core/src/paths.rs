//! Workspace path resolution.

use std::path::{Component, Path, PathBuf};

use crate::config::{BuildConfig, ConfigError};

/// Absolute locations used by a single pipeline run.
///
/// Computed once at startup; every path lies under `base_dir`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSet {
    pub base_dir: PathBuf,
    pub src_dir: PathBuf,
    pub js_dir: PathBuf,
    pub lib_dir: PathBuf,
    pub test_dir: PathBuf,
    pub output_dir: PathBuf,
    pub output_js_dir: PathBuf,
    pub output_lib_dir: PathBuf,
    pub config_dir: PathBuf,
    pub sass_config: PathBuf,
    pub js_config: PathBuf,
    pub entry_html: PathBuf,
    pub output_html: PathBuf,
    pub test_template: PathBuf,
}

impl PathSet {
    /// Derive every pipeline path from `base_dir` and the `[paths]` section.
    ///
    /// Absolute entries and entries climbing out with `..` are rejected.
    pub fn resolve(base_dir: &Path, config: &BuildConfig) -> Result<Self, ConfigError> {
        let p = &config.paths;

        let mut errors = Vec::new();
        for (key, value) in [
            ("paths.src_dir", &p.src_dir),
            ("paths.js_dir", &p.js_dir),
            ("paths.lib_dir", &p.lib_dir),
            ("paths.test_dir", &p.test_dir),
            ("paths.output_dir", &p.output_dir),
            ("paths.config_dir", &p.config_dir),
            ("paths.sass_config", &p.sass_config),
            ("paths.js_config", &p.js_config),
            ("paths.entry_html", &p.entry_html),
            ("paths.test_template", &p.test_template),
        ] {
            if !is_contained(value) {
                errors.push(format!(
                    "{} must be a relative path inside the project: {}",
                    key,
                    value.display()
                ));
            }
        }
        if p.output_dir.as_os_str().is_empty() {
            errors.push("paths.output_dir must not be empty".to_string());
        }
        if !errors.is_empty() {
            return Err(ConfigError::Validation(errors));
        }

        let base_dir = std::fs::canonicalize(base_dir).unwrap_or_else(|_| base_dir.to_path_buf());
        let src_dir = base_dir.join(&p.src_dir);
        let js_dir = src_dir.join(&p.js_dir);
        let lib_dir = js_dir.join(&p.lib_dir);
        let test_dir = base_dir.join(&p.test_dir);
        let output_dir = base_dir.join(&p.output_dir);
        let output_js_dir = output_dir.join("js");
        let output_lib_dir = output_js_dir.join("lib");
        let config_dir = base_dir.join(&p.config_dir);

        Ok(Self {
            sass_config: config_dir.join(&p.sass_config),
            js_config: config_dir.join(&p.js_config),
            entry_html: src_dir.join(&p.entry_html),
            output_html: output_dir.join("index.html"),
            test_template: test_dir.join(&p.test_template),
            base_dir,
            src_dir,
            js_dir,
            lib_dir,
            test_dir,
            output_dir,
            output_js_dir,
            output_lib_dir,
            config_dir,
        })
    }
}

fn is_contained(path: &Path) -> bool {
    path.components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_layout() {
        let temp = TempDir::new().unwrap();
        let paths = PathSet::resolve(temp.path(), &BuildConfig::default()).unwrap();
        let base = &paths.base_dir;

        assert_eq!(paths.src_dir, base.join("src"));
        assert_eq!(paths.lib_dir, base.join("src/js/lib"));
        assert_eq!(paths.output_lib_dir, base.join("out/js/lib"));
        assert_eq!(paths.sass_config, base.join("build-config/sass-config.rb"));
        assert_eq!(paths.js_config, base.join("build-config/require-config.js"));
        assert_eq!(paths.entry_html, base.join("src/index.html"));
        assert_eq!(paths.output_html, base.join("out/index.html"));
        assert_eq!(
            paths.test_template,
            base.join("test/.config/index.template.html")
        );
    }

    #[test]
    fn test_every_path_under_base() {
        let temp = TempDir::new().unwrap();
        let paths = PathSet::resolve(temp.path(), &BuildConfig::default()).unwrap();
        let derived = [
            &paths.src_dir,
            &paths.js_dir,
            &paths.lib_dir,
            &paths.test_dir,
            &paths.output_dir,
            &paths.output_js_dir,
            &paths.output_lib_dir,
            &paths.config_dir,
            &paths.sass_config,
            &paths.js_config,
            &paths.entry_html,
            &paths.output_html,
            &paths.test_template,
        ];
        for path in derived {
            assert!(
                path.starts_with(&paths.base_dir),
                "{} escapes base",
                path.display()
            );
        }
    }

    #[test]
    fn test_escaping_path_rejected() {
        let mut config = BuildConfig::default();
        config.paths.output_dir = PathBuf::from("../elsewhere");
        let result = PathSet::resolve(Path::new("/project"), &config);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_absolute_path_rejected() {
        let mut config = BuildConfig::default();
        config.paths.test_dir = std::env::temp_dir();
        let result = PathSet::resolve(Path::new("/project"), &config);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }
}
