//! External tool definitions and invocation descriptors.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::ToolsConfig;

/// External collaborators driven by the pipeline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ToolKind {
    /// compass compile -c <sass-config>
    StyleCompiler,

    /// r.js -o <js-config>
    Bundler,

    /// <linter> <file>
    Linter,

    /// phantomjs runner.js <page>
    TestRunner,
}

impl ToolKind {
    /// Get the tool name as used in errors and logs.
    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::StyleCompiler => "style-compiler",
            ToolKind::Bundler => "bundler",
            ToolKind::Linter => "linter",
            ToolKind::TestRunner => "test-runner",
        }
    }

    /// Configured program for this tool.
    pub fn program<'a>(&self, tools: &'a ToolsConfig) -> &'a str {
        match self {
            ToolKind::StyleCompiler => &tools.style_compiler,
            ToolKind::Bundler => &tools.bundler,
            ToolKind::Linter => &tools.linter,
            ToolKind::TestRunner => &tools.test_runner,
        }
    }
}

impl std::fmt::Display for ToolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A single synchronous subprocess call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Which collaborator this call belongs to.
    pub kind: ToolKind,

    /// Executable name or path.
    pub program: String,

    /// Ordered arguments.
    pub args: Vec<String>,

    /// Working directory for the child; the parent's is left untouched.
    pub cwd: Option<PathBuf>,

    /// Timeout in seconds (0 = none).
    pub timeout_secs: u64,
}

impl ToolInvocation {
    /// Create an invocation of `kind` using the configured program.
    pub fn new(kind: ToolKind, tools: &ToolsConfig) -> Self {
        Self {
            kind,
            program: kind.program(tools).to_string(),
            args: Vec::new(),
            cwd: None,
            timeout_secs: tools.timeout_secs,
        }
    }

    /// Append an argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append a path argument.
    pub fn path_arg(self, path: &Path) -> Self {
        let arg = path.to_string_lossy().into_owned();
        self.arg(arg)
    }

    /// Run the child in `dir`.
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Full command line for display.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_names() {
        assert_eq!(ToolKind::StyleCompiler.name(), "style-compiler");
        assert_eq!(ToolKind::Bundler.name(), "bundler");
        assert_eq!(ToolKind::Linter.name(), "linter");
        assert_eq!(ToolKind::TestRunner.name(), "test-runner");
    }

    #[test]
    fn test_programs_from_config() {
        let tools = ToolsConfig::default();
        assert_eq!(ToolKind::StyleCompiler.program(&tools), "compass");
        assert_eq!(ToolKind::Bundler.program(&tools), "r.js");
        assert_eq!(ToolKind::TestRunner.program(&tools), "phantomjs");
    }

    #[test]
    fn test_builder_collects_arguments() {
        let tools = ToolsConfig {
            timeout_secs: 30,
            ..ToolsConfig::default()
        };
        let inv = ToolInvocation::new(ToolKind::StyleCompiler, &tools)
            .arg("compile")
            .arg("-c")
            .path_arg(Path::new("build-config/sass-config.rb"))
            .current_dir("/project");

        assert_eq!(inv.program, "compass");
        assert_eq!(inv.args, vec!["compile", "-c", "build-config/sass-config.rb"]);
        assert_eq!(inv.cwd, Some(PathBuf::from("/project")));
        assert_eq!(inv.timeout_secs, 30);
        assert_eq!(
            inv.command_line(),
            "compass compile -c build-config/sass-config.rb"
        );
    }

    #[test]
    fn test_kind_serializes_kebab_case() {
        let json = serde_json::to_string(&ToolKind::TestRunner).unwrap();
        assert_eq!(json, "\"test-runner\"");
    }
}
