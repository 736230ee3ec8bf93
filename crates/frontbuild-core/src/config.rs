//! Configuration loading for `frontbuild.toml`.
//!
//! Every section is optional. Missing keys fall back to the layout of the
//! `compare` project this pipeline was written for.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the project configuration file.
pub const CONFIG_FILE_NAME: &str = "frontbuild.toml";

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("Failed to parse frontbuild.toml: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error
    #[error("Config validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
}

/// Top-level build configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    pub paths: PathsConfig,
    pub tools: ToolsConfig,
    pub scripts: ScriptsConfig,
    pub markup: MarkupConfig,
    pub tests: TestsConfig,
    pub pipeline: PipelineConfig,
}

/// Directory and file layout, relative to the base directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub src_dir: PathBuf,
    /// JavaScript sources, relative to `src_dir`.
    pub js_dir: PathBuf,
    /// Library scripts, relative to `js_dir`.
    pub lib_dir: PathBuf,
    pub test_dir: PathBuf,
    pub output_dir: PathBuf,
    pub config_dir: PathBuf,
    /// Compass configuration, relative to `config_dir`.
    pub sass_config: PathBuf,
    /// r.js build profile, relative to `config_dir`.
    pub js_config: PathBuf,
    /// Entry page, relative to `src_dir`.
    pub entry_html: PathBuf,
    /// Runner page template, relative to `test_dir`.
    pub test_template: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            src_dir: PathBuf::from("src"),
            js_dir: PathBuf::from("js"),
            lib_dir: PathBuf::from("lib"),
            test_dir: PathBuf::from("test"),
            output_dir: PathBuf::from("out"),
            config_dir: PathBuf::from("build-config"),
            sass_config: PathBuf::from("sass-config.rb"),
            js_config: PathBuf::from("require-config.js"),
            entry_html: PathBuf::from("index.html"),
            test_template: PathBuf::from(".config/index.template.html"),
        }
    }
}

/// External tool programs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub style_compiler: String,
    pub bundler: String,
    pub linter: String,
    pub test_runner: String,
    /// Script handed to the test runner as its first argument.
    pub runner_script: String,
    /// Per-invocation timeout in seconds (0 = wait forever).
    pub timeout_secs: u64,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            style_compiler: "compass".to_string(),
            bundler: "r.js".to_string(),
            linter: "jshint".to_string(),
            test_runner: "phantomjs".to_string(),
            runner_script: "runner.js".to_string(),
            timeout_secs: 0,
        }
    }
}

/// Script handling around the bundler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptsConfig {
    /// Third-party file names that are never linted, wherever they live.
    pub vendored: Vec<String>,
    /// Library files left out of the bundle and copied as-is into the output,
    /// relative to the library directory. These are never linted either.
    pub copy_verbatim: Vec<String>,
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self {
            vendored: vec![
                "almond.js".to_string(),
                "require.js".to_string(),
                "promise.js".to_string(),
            ],
            copy_verbatim: Vec::new(),
        }
    }
}

/// Entry page rewrite settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkupConfig {
    /// `id` of the application's entry `<script>` element.
    pub entry_id: String,
    /// Attribute telling the in-browser loader which module to boot.
    pub loader_attribute: String,
    /// `src` value pointing at the bundled script.
    pub bundled_script: String,
}

impl Default for MarkupConfig {
    fn default() -> Self {
        Self {
            entry_id: "app-js".to_string(),
            loader_attribute: "data-main".to_string(),
            bundled_script: "js/compare.js".to_string(),
        }
    }
}

/// Test harness settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestsConfig {
    /// File name prefix marking a test suite.
    pub prefix: String,
    /// Token in the template replaced with the suite `<script>` tags.
    pub placeholder: String,
    /// Generated runner page, written into the test directory.
    pub runner_page: String,
}

impl Default for TestsConfig {
    fn default() -> Self {
        Self {
            prefix: "test_".to_string(),
            placeholder: "{{TESTS}}".to_string(),
            runner_page: "index.html".to_string(),
        }
    }
}

/// Pipeline-wide switches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Skip the lint and test gates and only compile.
    pub skip_checks: bool,
}

impl BuildConfig {
    /// Collect human-readable validation problems.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let programs = [
            ("tools.style_compiler", &self.tools.style_compiler),
            ("tools.bundler", &self.tools.bundler),
            ("tools.linter", &self.tools.linter),
            ("tools.test_runner", &self.tools.test_runner),
            ("tools.runner_script", &self.tools.runner_script),
        ];
        for (key, value) in programs {
            if value.trim().is_empty() {
                errors.push(format!("{} must not be empty", key));
            }
        }

        if self.markup.entry_id.is_empty() {
            errors.push("markup.entry_id must not be empty".to_string());
        }
        if self.markup.loader_attribute.is_empty() {
            errors.push("markup.loader_attribute must not be empty".to_string());
        }
        if self.tests.placeholder.is_empty() {
            errors.push("tests.placeholder must not be empty".to_string());
        }
        if self.tests.runner_page.is_empty() || self.tests.runner_page.contains('/') {
            errors.push("tests.runner_page must be a plain file name".to_string());
        }

        for name in &self.scripts.vendored {
            if name.is_empty() || name.contains('/') || name.contains('\\') {
                errors.push(format!(
                    "scripts.vendored entries must be plain file names: {:?}",
                    name
                ));
            }
        }
        for name in &self.scripts.copy_verbatim {
            if name.is_empty() || Path::new(name).is_absolute() || name.contains("..") {
                errors.push(format!("invalid path in scripts.copy_verbatim: {:?}", name));
            }
        }

        errors
    }
}

/// Walk up from `start` looking for `frontbuild.toml`.
pub fn find_config_from(start: PathBuf) -> Option<PathBuf> {
    let mut current = start;
    loop {
        let candidate = current.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Load configuration from `path`, or defaults when `path` is `None`.
pub fn load_config(path: Option<&Path>) -> Result<BuildConfig, ConfigError> {
    let config = match path {
        Some(p) => {
            let content = std::fs::read_to_string(p)?;
            toml::from_str::<BuildConfig>(&content)?
        }
        None => BuildConfig::default(),
    };

    let errors = config.validate();
    if !errors.is_empty() {
        return Err(ConfigError::Validation(errors));
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_without_file() {
        let config = load_config(None).expect("defaults should validate");
        assert_eq!(config.tools.style_compiler, "compass");
        assert_eq!(config.tools.bundler, "r.js");
        assert_eq!(config.markup.entry_id, "app-js");
        assert_eq!(config.markup.loader_attribute, "data-main");
        assert_eq!(config.tests.placeholder, "{{TESTS}}");
        assert!(!config.pipeline.skip_checks);
    }

    #[test]
    fn test_partial_file_merges_with_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            r#"
[tools]
linter = "eslint"

[scripts]
copy_verbatim = ["promise.js"]
"#,
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.tools.linter, "eslint");
        assert_eq!(config.tools.bundler, "r.js");
        assert_eq!(config.scripts.copy_verbatim, vec!["promise.js".to_string()]);
        assert_eq!(config.paths.output_dir, PathBuf::from("out"));
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[tools\nlinter = ").unwrap();

        let result = load_config(Some(&path));
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_empty_tool_is_validation_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[tools]\nbundler = \"\"\n").unwrap();

        match load_config(Some(&path)) {
            Err(ConfigError::Validation(errors)) => {
                assert!(errors.iter().any(|e| e.contains("tools.bundler")));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_script_lists_validation() {
        let mut config = BuildConfig::default();
        config.scripts.copy_verbatim = vec!["dom/polyfill.js".to_string()];
        assert!(config.validate().is_empty());

        config.scripts.vendored = vec!["lib/almond.js".to_string()];
        config.scripts.copy_verbatim.push("../outside.js".to_string());
        let errors = config.validate();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].contains("scripts.vendored"));
        assert!(errors[1].contains("scripts.copy_verbatim"));
    }

    #[test]
    fn test_find_config_walks_up() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(CONFIG_FILE_NAME), "").unwrap();
        let nested = temp.path().join("src").join("js");
        std::fs::create_dir_all(&nested).unwrap();

        let found = find_config_from(nested).expect("config should be found");
        assert_eq!(found, temp.path().join(CONFIG_FILE_NAME));
    }
}
