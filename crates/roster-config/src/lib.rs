//! Configuration management for roster.
//!
//! This crate loads and saves `.roster/config.yaml`, discovers `.roster/`
//! directories, and turns configuration into the typed options the flag
//! and formula crates consume.

pub mod config;
pub mod roster_dir;

pub use config::{ConfigError, FlagOverrides, PricingConfig, RosterConfig, load_config, save_config};
pub use roster_dir::{ensure_roster_dir, find_roster_dir};
