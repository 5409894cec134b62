//! Runtime context for command execution.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use roster_config::{RosterConfig, find_roster_dir, load_config};
use roster_formula::{Catalog, EvalOptions, MemoryStore, find_catalog, load_catalog, save_catalog};

use crate::cli::GlobalArgs;

/// Runtime context passed to every command handler.
#[derive(Debug)]
pub struct RuntimeContext {
    /// Resolved `.roster/` directory, if any.
    pub roster_dir: Option<PathBuf>,

    /// Effective configuration.
    pub config: RosterConfig,

    /// Whether to produce JSON output.
    pub json: bool,

    /// Verbose output.
    pub verbose: bool,

    /// Quiet mode: suppress non-essential output.
    pub quiet: bool,

    /// Working directory used for catalog lookup.
    pub cwd: PathBuf,
}

/// A catalog together with the file it came from and its variable store.
pub struct LoadedCatalog {
    pub path: PathBuf,
    pub catalog: Catalog,
    pub store: MemoryStore,
}

impl LoadedCatalog {
    /// Writes the store's records back to the catalog file.
    pub fn save(mut self) -> Result<PathBuf> {
        self.store.write_to(&mut self.catalog);
        save_catalog(&self.path, &self.catalog)
            .with_context(|| format!("failed to write catalog {}", self.path.display()))?;
        tracing::debug!(path = %self.path.display(), "saved catalog");
        Ok(self.path)
    }
}

impl RuntimeContext {
    /// Build a `RuntimeContext` from parsed global arguments.
    ///
    /// Configuration comes from `--config`, else the discovered `.roster/`
    /// directory; without either only defaults and `ROSTER_*` variables
    /// apply.
    pub fn from_global_args(global: &GlobalArgs) -> Result<Self> {
        let cwd = std::env::current_dir().context("cannot determine current directory")?;
        let roster_dir = global.config.clone().or_else(|| find_roster_dir(&cwd));

        let config_dir = roster_dir.clone().unwrap_or_else(|| cwd.join(".roster"));
        let config = load_config(&config_dir)
            .with_context(|| format!("failed to load configuration from {}", config_dir.display()))?;

        Ok(Self {
            roster_dir,
            json: global.json || config.json,
            config,
            verbose: global.verbose,
            quiet: global.quiet,
            cwd,
        })
    }

    /// Evaluation options from the pricing configuration.
    pub fn eval_options(&self) -> Result<EvalOptions> {
        Ok(self.config.pricing.eval_options()?)
    }

    /// Resolves a catalog argument, falling back to the configured default.
    pub fn catalog_path(&self, name: Option<&str>) -> Result<PathBuf> {
        let Some(name) = name.or(self.config.catalog.as_deref()) else {
            bail!("no catalog given (use --catalog or set 'catalog' in .roster/config.yaml)");
        };
        Ok(find_catalog(name, &self.cwd)?)
    }

    /// Loads a catalog and builds its variable store.
    pub fn load_catalog(&self, name: Option<&str>) -> Result<LoadedCatalog> {
        let path = self.catalog_path(name)?;
        Self::load_catalog_at(&path)
    }

    /// Loads the catalog if one is given or configured.
    pub fn load_optional_catalog(&self, name: Option<&str>) -> Result<Option<LoadedCatalog>> {
        if name.is_none() && self.config.catalog.is_none() {
            return Ok(None);
        }
        self.load_catalog(name).map(Some)
    }

    fn load_catalog_at(path: &Path) -> Result<LoadedCatalog> {
        let catalog = load_catalog(path).with_context(|| format!("failed to load catalog {}", path.display()))?;
        let store = MemoryStore::from_catalog(&catalog)?;
        Ok(LoadedCatalog {
            path: path.to_path_buf(),
            catalog,
            store,
        })
    }
}
