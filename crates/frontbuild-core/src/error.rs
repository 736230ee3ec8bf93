//! Error taxonomy for the build pipeline.

use std::path::PathBuf;

/// Errors produced by pipeline steps.
///
/// Every variant aborts the run; the driver never retries.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("{tool} exited with code {exit_code}")]
    ExternalTool { tool: String, exit_code: i32 },

    #[error("failed to start {tool} ({program}): {source}")]
    Spawn {
        tool: String,
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} timed out after {secs} seconds")]
    Timeout { tool: String, secs: u64 },

    #[error("filesystem error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("lint failed for {} (exit code {exit_code})", file.display())]
    Lint { file: PathBuf, exit_code: i32 },

    #[error("no element matching {element} in {}", path.display())]
    NotFound { element: String, path: PathBuf },

    #[error("malformed markup in {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("template {} has no {placeholder} placeholder", path.display())]
    Template { path: PathBuf, placeholder: String },

    #[error("file discovery failed: {0}")]
    Discovery(String),
}

impl BuildError {
    /// Wrap an I/O error with the path it occurred at.
    pub fn fs(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BuildError::Filesystem {
            path: path.into(),
            source,
        }
    }
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, BuildError>;
