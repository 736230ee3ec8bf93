//! Output directory reset.

use std::fs;
use std::path::Path;
use tracing::debug;

use crate::error::{BuildError, Result};
use crate::paths::PathSet;

/// Remove the output directory if present and recreate it, including the
/// library folder that receives non-bundled scripts.
pub fn prepare_output(paths: &PathSet) -> Result<()> {
    reset_dir(&paths.output_dir)?;
    fs::create_dir_all(&paths.output_lib_dir)
        .map_err(|e| BuildError::fs(&paths.output_lib_dir, e))
}

/// Recursively delete `dir` (when it exists) and create it empty.
pub fn reset_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        debug!(dir = %dir.display(), "removing previous output");
        fs::remove_dir_all(dir).map_err(|e| BuildError::fs(dir, e))?;
    }
    fs::create_dir_all(dir).map_err(|e| BuildError::fs(dir, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BuildConfig;
    use tempfile::TempDir;

    #[test]
    fn test_prepare_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let paths = PathSet::resolve(temp.path(), &BuildConfig::default()).unwrap();

        prepare_output(&paths).unwrap();
        fs::write(paths.output_dir.join("stale.css"), "body{}").unwrap();
        fs::write(paths.output_lib_dir.join("old.js"), "x").unwrap();

        prepare_output(&paths).unwrap();

        assert!(paths.output_lib_dir.is_dir());
        assert!(!paths.output_dir.join("stale.css").exists());
        assert_eq!(fs::read_dir(&paths.output_lib_dir).unwrap().count(), 0);
        let top: Vec<_> = fs::read_dir(&paths.output_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(top, vec![std::ffi::OsString::from("js")]);
    }

    #[test]
    fn test_reset_dir_creates_missing() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("a").join("b");
        reset_dir(&dir).unwrap();
        assert!(dir.is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn test_reset_dir_blocked_by_file_parent() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("blocker");
        fs::write(&blocker, "").unwrap();

        let result = reset_dir(&blocker.join("out"));
        assert!(matches!(result, Err(BuildError::Filesystem { .. })));
    }
}
