//! Discovery and management of the `.roster/` directory.

use crate::config::ConfigError;
use std::path::{Path, PathBuf};

/// The name of the roster metadata directory.
const ROSTER_DIR_NAME: &str = ".roster";

/// Environment variable that overrides directory discovery.
const ROSTER_DIR_ENV: &str = "ROSTER_DIR";

/// Walk up the directory tree from `start` looking for a `.roster/` directory.
///
/// The `ROSTER_DIR` environment variable is checked first.
pub fn find_roster_dir(start: &Path) -> Option<PathBuf> {
    if let Ok(env_dir) = std::env::var(ROSTER_DIR_ENV) {
        let env_path = PathBuf::from(&env_dir);
        if env_path.is_dir() {
            return Some(env_path);
        }
    }

    let start = start.canonicalize().ok()?;
    let mut current = start.as_path();
    loop {
        let candidate = current.join(ROSTER_DIR_NAME);
        if candidate.is_dir() {
            return Some(candidate);
        }
        match current.parent() {
            Some(parent) if parent != current => current = parent,
            _ => return None,
        }
    }
}

/// Ensure a `.roster/` directory exists at (or under) `path`.
pub fn ensure_roster_dir(path: &Path) -> Result<PathBuf, ConfigError> {
    let roster_dir = if path.ends_with(ROSTER_DIR_NAME) {
        path.to_path_buf()
    } else {
        path.join(ROSTER_DIR_NAME)
    };

    std::fs::create_dir_all(&roster_dir)?;
    Ok(roster_dir)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_dir_from_nested_child() {
        let dir = tempfile::tempdir().unwrap();
        let roster = dir.path().join(".roster");
        std::fs::create_dir(&roster).unwrap();
        let child = dir.path().join("events").join("2026");
        std::fs::create_dir_all(&child).unwrap();

        let found = find_roster_dir(&child).unwrap().canonicalize().unwrap();
        assert_eq!(found, roster.canonicalize().unwrap());
    }

    #[test]
    fn ensure_creates_once() {
        let dir = tempfile::tempdir().unwrap();
        let first = ensure_roster_dir(dir.path()).unwrap();
        let second = ensure_roster_dir(&first).unwrap();
        assert!(first.is_dir());
        assert!(first.ends_with(".roster"));
        assert_eq!(first, second);
    }
}
