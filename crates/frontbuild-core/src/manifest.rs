//! Source file discovery for lint and test manifests.

use glob::{glob, Pattern};
use std::path::{Component, Path, PathBuf};
use tracing::warn;

use crate::error::{BuildError, Result};

/// A discovered file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Absolute path on disk.
    pub path: PathBuf,
    /// Path relative to the manifest root, `/`-separated on every platform.
    pub relative: String,
}

/// Ordered list of files found under a root directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileManifest {
    entries: Vec<ManifestEntry>,
}

/// Filter applied while walking the tree.
#[derive(Debug, Clone, Default)]
pub struct ManifestFilter<'a> {
    /// Required file name suffix, e.g. `.js`.
    pub suffix: &'a str,
    /// Required file name prefix, if any.
    pub prefix: Option<&'a str>,
    /// File names to skip.
    pub exclude: &'a [String],
}

impl<'a> ManifestFilter<'a> {
    fn accepts(&self, file_name: &str) -> bool {
        file_name.ends_with(self.suffix)
            && self.prefix.map_or(true, |p| file_name.starts_with(p))
            && !self.exclude.iter().any(|e| e == file_name)
    }
}

impl FileManifest {
    /// Recursively collect files under `root` accepted by `filter`.
    ///
    /// Entries are sorted by relative path so the order does not depend on
    /// the filesystem. A missing root yields an empty manifest.
    pub fn discover(root: &Path, filter: &ManifestFilter<'_>) -> Result<Self> {
        if !root.is_dir() {
            warn!(root = %root.display(), "discovery root does not exist");
            return Ok(Self::default());
        }

        let pattern = format!(
            "{}/**/*{}",
            Pattern::escape(&root.to_string_lossy()),
            Pattern::escape(filter.suffix)
        );
        let paths = glob(&pattern)
            .map_err(|e| BuildError::Discovery(format!("invalid pattern '{}': {}", pattern, e)))?;

        let mut entries = Vec::new();
        for entry in paths {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    warn!(error = %e, "error reading path during discovery");
                    continue;
                }
            };
            if !path.is_file() {
                continue;
            }
            let accepted = path
                .file_name()
                .and_then(|n| n.to_str())
                .map_or(false, |name| filter.accepts(name));
            if !accepted {
                continue;
            }
            let relative = relative_slash_path(root, &path);
            entries.push(ManifestEntry { path, relative });
        }

        entries.sort_by(|a, b| a.relative.cmp(&b.relative));
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ManifestEntry> {
        self.entries.iter()
    }

    /// Drop entries whose absolute path is in `paths`.
    pub fn without_paths(mut self, paths: &[PathBuf]) -> Self {
        self.entries.retain(|e| !paths.contains(&e.path));
        self
    }
}

fn relative_slash_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
