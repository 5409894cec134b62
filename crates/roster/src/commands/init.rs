//! `roster init` -- create `.roster/` with a configuration and, optionally,
//! an empty catalog that becomes the default.

use anyhow::{Context, Result, bail};
use roster_config::{RosterConfig, ensure_roster_dir, save_config};
use roster_formula::{Catalog, lexer::is_identifier, save_catalog};

use crate::cli::InitArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;

/// Execute the `roster init` command.
pub fn run(ctx: &RuntimeContext, args: &InitArgs) -> Result<()> {
    let roster_dir = ctx.cwd.join(".roster");
    let config_path = roster_dir.join("config.yaml");
    if config_path.exists() && !args.force {
        bail!(
            "{} already exists\n\nUse --force to overwrite the configuration.",
            config_path.display()
        );
    }

    if let Some(name) = &args.catalog {
        if !is_identifier(&name.replace('-', "_")) {
            bail!("invalid catalog name '{}'", name);
        }
    }

    let roster_dir = ensure_roster_dir(&ctx.cwd)
        .with_context(|| format!("failed to create {}", roster_dir.display()))?;

    let config = RosterConfig {
        catalog: args.catalog.clone(),
        ..RosterConfig::default()
    };
    save_config(&roster_dir, &config)?;

    // An existing catalog of the same name is kept as is.
    let catalog_path = match &args.catalog {
        Some(name) => {
            let path = roster_dir.join("catalogs").join(format!("{}.catalog.toml", name));
            if !path.exists() {
                save_catalog(&path, &Catalog::default())?;
            }
            Some(path)
        }
        None => None,
    };
    tracing::info!(dir = %roster_dir.display(), catalog = ?args.catalog, "initialized roster");

    if ctx.json {
        output_json(&serde_json::json!({
            "roster_dir": roster_dir.display().to_string(),
            "config": config_path.display().to_string(),
            "catalog": catalog_path.map(|p| p.display().to_string()),
        }));
    } else if !ctx.quiet {
        println!("Initialized {}", roster_dir.display());
        if let Some(path) = catalog_path {
            println!("Default catalog: {}", path.display());
        }
    }
    Ok(())
}
