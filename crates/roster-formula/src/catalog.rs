//! Read and write catalog files (TOML and JSON) and resolve catalog paths.

use std::path::{Path, PathBuf};

use crate::error::CatalogError;
use crate::store::MemoryStore;
use crate::types::Catalog;

const SUFFIXES: [&str; 4] = [".catalog.toml", ".catalog.json", ".toml", ".json"];

/// Parse a catalog from a TOML string.
pub fn parse_toml(content: &str) -> Result<Catalog, CatalogError> {
    toml::from_str(content).map_err(|e| CatalogError::Parse(e.to_string()))
}

/// Parse a catalog from a JSON string.
pub fn parse_json(content: &str) -> Result<Catalog, CatalogError> {
    serde_json::from_str(content).map_err(|e| CatalogError::Parse(e.to_string()))
}

/// Load a catalog from a file, picking the format by extension.
///
/// The variable records are checked for duplicate names and orphaned
/// values before the catalog is returned.
pub fn load_catalog(path: &Path) -> Result<Catalog, CatalogError> {
    let content = std::fs::read_to_string(path)?;
    let mut catalog = match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => parse_toml(&content)?,
        Some("json") => parse_json(&content)?,
        _ => parse_json(&content).or_else(|_| parse_toml(&content))?,
    };
    MemoryStore::from_catalog(&catalog).map_err(|source| CatalogError::Invalid {
        path: path.to_path_buf(),
        source,
    })?;
    catalog.source = path.display().to_string();
    tracing::debug!(
        path = %path.display(),
        variables = catalog.variables.len(),
        attributes = catalog.attributes.len(),
        "loaded catalog"
    );
    Ok(catalog)
}

/// Write a catalog, picking the format by extension (TOML unless `.json`).
pub fn save_catalog(path: &Path, catalog: &Catalog) -> Result<(), CatalogError> {
    let content = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => {
            let mut s = serde_json::to_string_pretty(catalog).map_err(|e| CatalogError::Serialize(e.to_string()))?;
            s.push('\n');
            s
        }
        _ => toml::to_string_pretty(catalog).map_err(|e| CatalogError::Serialize(e.to_string()))?,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
}

/// Search for a catalog by name.
///
/// Search order:
/// 1. The name as a path (absolute, or relative to `cwd`)
/// 2. `cwd` with the standard suffixes
/// 3. `.roster/catalogs/` under `cwd`
/// 4. `~/.roster/catalogs/`
pub fn find_catalog(name: &str, cwd: &Path) -> Result<PathBuf, CatalogError> {
    let exact = Path::new(name);
    if exact.is_absolute() && exact.is_file() {
        return Ok(exact.to_path_buf());
    }
    let relative = cwd.join(name);
    if relative.is_file() {
        return Ok(relative);
    }

    let mut dirs = vec![cwd.to_path_buf(), cwd.join(".roster").join("catalogs")];
    if let Some(home) = home_dir() {
        dirs.push(home.join(".roster").join("catalogs"));
    }

    for dir in dirs.iter().filter(|d| d.is_dir()) {
        for suffix in SUFFIXES {
            let candidate = dir.join(format!("{}{}", name, suffix));
            if candidate.is_file() {
                return Ok(candidate);
            }
        }
    }

    Err(CatalogError::NotFound(name.to_string()))
}

fn home_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE").ok().map(PathBuf::from)
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME").ok().map(PathBuf::from)
    }
}
