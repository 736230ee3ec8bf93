//! frontbuild core - static front-end build pipeline
//!
//! Orchestrates the external tools that turn a modular front-end source tree
//! into a distributable bundle:
//! - Lints JavaScript sources and runs the in-browser test suite
//! - Compiles Sass with Compass and bundles AMD modules with r.js
//! - Rewrites the entry page to load the bundle
//!
//! Steps run strictly in sequence; the first failure aborts the build.

pub mod config;
pub mod error;
pub mod fakes;
pub mod manifest;
pub mod obs;
pub mod paths;
pub mod pipeline;
pub mod reporter;
pub mod runner;
pub mod stage;
pub mod steps;
pub mod telemetry;

// Re-export key types
pub use config::{find_config_from, load_config, BuildConfig, ConfigError, CONFIG_FILE_NAME};
pub use error::{BuildError, Result};
pub use manifest::{FileManifest, ManifestEntry, ManifestFilter};
pub use paths::PathSet;
pub use pipeline::{BuildOutcome, BuildReport, BuildState, Pipeline, Step, StepRecord};
pub use reporter::{ConsoleReporter, Reporter};
pub use runner::{OutputMode, ProcessExecutor, ToolExecutor, ToolOutcome};
pub use stage::{ToolInvocation, ToolKind};
pub use telemetry::init_tracing;
