//! Configuration types and loading.
//!
//! The main entry point is [`RosterConfig`], which represents the contents of
//! `.roster/config.yaml`. Values are layered: built-in defaults, then the
//! YAML file, then `ROSTER_*` environment variables (`__` separates nested
//! keys, e.g. `ROSTER_PRICING__DECIMAL_PLACES=3`).

use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use roster_flags::{Category, Domain, LabelRegistry};
use roster_formula::{EvalOptions, Rounding};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// The configuration could not be parsed or merged.
    #[error("failed to load configuration: {0}")]
    ParseError(#[from] figment::Error),

    /// The configuration could not be written as YAML.
    #[error("failed to serialize configuration: {0}")]
    SerializeError(#[from] serde_yaml::Error),

    /// A configuration value was invalid.
    #[error("invalid configuration value for key '{key}': {reason}")]
    InvalidValue {
        /// The configuration key that had an invalid value.
        key: String,
        /// A description of why the value is invalid.
        reason: String,
    },
}

impl ConfigError {
    fn invalid(key: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidValue {
            key: key.into(),
            reason: reason.to_string(),
        }
    }
}

/// A specialized `Result` type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Largest scale a decimal can carry.
const MAX_DECIMAL_PLACES: u32 = 28;

// ---------------------------------------------------------------------------
// Pricing
// ---------------------------------------------------------------------------

/// Pricing configuration section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Decimal places of computed amounts.
    #[serde(default = "default_decimal_places")]
    pub decimal_places: u32,

    /// How computed amounts are rounded.
    #[serde(default)]
    pub rounding: Rounding,

    /// Decimal separator used when showing amounts and formulas.
    #[serde(default = "default_display_separator")]
    pub display_separator: String,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            decimal_places: default_decimal_places(),
            rounding: Rounding::default(),
            display_separator: default_display_separator(),
        }
    }
}

fn default_decimal_places() -> u32 {
    2
}

fn default_display_separator() -> String {
    ",".to_string()
}

impl PricingConfig {
    /// Evaluation options for the formula engine.
    pub fn eval_options(&self) -> Result<EvalOptions> {
        if self.decimal_places > MAX_DECIMAL_PLACES {
            return Err(ConfigError::invalid(
                "pricing.decimal_places",
                format!("must be at most {}", MAX_DECIMAL_PLACES),
            ));
        }
        Ok(EvalOptions {
            decimal_places: self.decimal_places,
            rounding: self.rounding,
        })
    }

    /// Renders an amount with the configured separator, padded to the
    /// configured number of decimal places.
    pub fn display_amount(&self, amount: Decimal) -> String {
        let mut rounded = amount.round_dp(self.decimal_places);
        rounded.rescale(self.decimal_places);
        rounded.to_string().replace('.', &self.display_separator)
    }

    /// Renders a normalized formula (`.` as decimal point) with the
    /// configured separator.
    pub fn display_formula(&self, expression: &str) -> String {
        expression.replace('.', &self.display_separator)
    }
}

// ---------------------------------------------------------------------------
// Flag overrides
// ---------------------------------------------------------------------------

/// Per-domain label overrides. Keys are flag names or bit values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagOverrides {
    /// Replacement labels.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,

    /// Labels shown when the flag is not set.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub absence: BTreeMap<String, String>,

    /// Presentation categories (`success`, `warning`, ... or any custom name).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub types: BTreeMap<String, String>,
}

impl FlagOverrides {
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty() && self.absence.is_empty() && self.types.is_empty()
    }

    /// Applies these overrides on top of `base`.
    pub fn apply(&self, domain: Domain, base: &LabelRegistry) -> Result<LabelRegistry> {
        let catalog = base.catalog().clone();
        let bit = |section: &str, key: &str| {
            catalog
                .resolve_bit(key)
                .map_err(|e| ConfigError::invalid(format!("flags.{}.{}.{}", domain, section, key), e))
        };

        let mut builder = base.to_builder();
        for (key, label) in &self.labels {
            builder = builder
                .custom_label(bit("labels", key)?, label.as_str())
                .map_err(|e| ConfigError::invalid(format!("flags.{}.labels.{}", domain, key), e))?;
        }
        for (key, label) in &self.absence {
            builder = builder
                .absence_label(bit("absence", key)?, label.as_str())
                .map_err(|e| ConfigError::invalid(format!("flags.{}.absence.{}", domain, key), e))?;
        }
        for (key, category) in &self.types {
            builder = builder
                .custom_type(bit("types", key)?, Category::from(category.as_str()))
                .map_err(|e| ConfigError::invalid(format!("flags.{}.types.{}", domain, key), e))?;
        }
        Ok(builder.build())
    }
}

// ---------------------------------------------------------------------------
// Main config struct
// ---------------------------------------------------------------------------

/// The full roster configuration, corresponding to `.roster/config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterConfig {
    /// Output JSON instead of human-readable text.
    #[serde(default)]
    pub json: bool,

    /// Catalog used when a command gets no `--catalog`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<String>,

    /// Pricing configuration.
    #[serde(default)]
    pub pricing: PricingConfig,

    /// Label overrides keyed by flag domain (`participant_status`, ...).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub flags: BTreeMap<String, FlagOverrides>,
}

impl RosterConfig {
    /// The label registry for `domain` with configured overrides applied.
    pub fn registry(&self, domain: Domain) -> Result<LabelRegistry> {
        let base = domain.registry();
        let overrides = self
            .flags
            .iter()
            .filter(|(key, _)| Domain::from_str(key).is_ok_and(|d| d == domain))
            .map(|(_, o)| o);

        let mut registry = base.clone();
        for o in overrides.filter(|o| !o.is_empty()) {
            registry = o.apply(domain, &registry)?;
        }
        Ok(registry)
    }

    /// Checks values that serde alone cannot validate.
    pub fn validate(&self) -> Result<()> {
        self.pricing.eval_options()?;
        for (key, overrides) in &self.flags {
            let domain = Domain::from_str(key).map_err(|e| ConfigError::invalid(format!("flags.{}", key), e))?;
            overrides.apply(domain, domain.registry())?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Load configuration from `config.yaml` inside `roster_dir`, layered over
/// defaults and under `ROSTER_*` environment variables.
///
/// A missing or empty file yields the defaults.
pub fn load_config(roster_dir: &Path) -> Result<RosterConfig> {
    let config_path = roster_dir.join("config.yaml");

    let mut figment = Figment::from(Serialized::defaults(RosterConfig::default()));
    if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        if !content.trim().is_empty() {
            figment = figment.merge(Yaml::string(&content));
        }
    }
    figment = figment.merge(Env::prefixed("ROSTER_").split("__"));

    let config: RosterConfig = figment.extract()?;
    config.validate()?;
    tracing::debug!(path = %config_path.display(), "loaded configuration");
    Ok(config)
}

/// Save configuration to `config.yaml` inside `roster_dir`, creating the
/// directory if needed.
pub fn save_config(roster_dir: &Path, config: &RosterConfig) -> Result<()> {
    std::fs::create_dir_all(roster_dir)?;

    let config_path = roster_dir.join("config.yaml");
    let yaml = serde_yaml::to_string(config)?;
    std::fs::write(config_path, yaml)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use pretty_assertions::assert_eq;
    use roster_flags::domains::status;

    #[test]
    fn defaults() {
        let cfg = RosterConfig::default();
        assert!(!cfg.json);
        assert_eq!(cfg.pricing.decimal_places, 2);
        assert_eq!(cfg.pricing.rounding, Rounding::HalfUp);
        assert_eq!(cfg.pricing.eval_options().unwrap(), EvalOptions::default());
    }

    #[test]
    fn missing_file_returns_defaults() {
        Jail::expect_with(|jail| {
            let cfg = load_config(&jail.directory().join(".roster")).unwrap();
            assert_eq!(cfg, RosterConfig::default());
            Ok(())
        });
    }

    #[test]
    fn yaml_then_env() {
        Jail::expect_with(|jail| {
            jail.create_dir(".roster")?;
            jail.create_file(
                ".roster/config.yaml",
                "pricing:\n  decimal_places: 3\n  rounding: half-even\n",
            )?;
            let dir = jail.directory().join(".roster");

            let cfg = load_config(&dir).unwrap();
            assert_eq!(cfg.pricing.decimal_places, 3);
            assert_eq!(cfg.pricing.rounding, Rounding::HalfEven);
            assert_eq!(cfg.pricing.display_separator, ",");

            jail.set_env("ROSTER_PRICING__DECIMAL_PLACES", "0");
            let cfg = load_config(&dir).unwrap();
            assert_eq!(cfg.pricing.decimal_places, 0);
            assert_eq!(cfg.pricing.rounding, Rounding::HalfEven);
            Ok(())
        });
    }

    #[test]
    fn rejects_excessive_precision() {
        Jail::expect_with(|jail| {
            jail.create_dir(".roster")?;
            jail.create_file(".roster/config.yaml", "pricing:\n  decimal_places: 40\n")?;
            let err = load_config(&jail.directory().join(".roster")).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "pricing.decimal_places"));
            Ok(())
        });
    }

    #[test]
    fn roundtrip_config() {
        let dir = tempfile::tempdir().unwrap();
        let roster_dir = dir.path().join(".roster");

        let mut cfg = RosterConfig::default();
        cfg.catalog = Some("summer".into());
        cfg.pricing.display_separator = ".".into();
        cfg.flags.insert(
            "participant_status".into(),
            FlagOverrides {
                labels: BTreeMap::from([("paid".into(), "settled".into())]),
                ..Default::default()
            },
        );

        save_config(&roster_dir, &cfg).unwrap();
        let text = std::fs::read_to_string(roster_dir.join("config.yaml")).unwrap();
        let loaded: RosterConfig = serde_yaml::from_str(&text).unwrap();
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn overrides_change_labels_and_categories() {
        let yaml = r#"
flags:
  status:
    labels:
      paid: settled
    absence:
      confirmed: pending
    types:
      "2": primary
"#;
        let cfg: RosterConfig = serde_yaml::from_str(yaml).unwrap();
        let registry = cfg.registry(Domain::ParticipantStatus).unwrap();
        assert_eq!(registry.label(status::PAID), Some("settled"));
        assert_eq!(registry.category(status::PAID), Category::Primary);
        assert_eq!(registry.format(0).unwrap(), vec!["pending".to_string()]);

        // Other domains and the shared default stay untouched.
        assert_eq!(Domain::ParticipantStatus.registry().label(status::PAID), Some("paid"));
        let food = cfg.registry(Domain::ParticipantFood).unwrap();
        assert_eq!(food.format(0).unwrap(), Vec::<String>::new());
    }

    #[test]
    fn unknown_flag_key_is_invalid() {
        let yaml = "flags:\n  participant_food:\n    labels:\n      gluten_free: gf\n";
        let cfg: RosterConfig = serde_yaml::from_str(yaml).unwrap();
        let err = cfg.registry(Domain::ParticipantFood).unwrap_err();
        match err {
            ConfigError::InvalidValue { key, .. } => assert_eq!(key, "flags.participant_food.labels.gluten_free"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn display_amount_uses_separator() {
        let pricing = PricingConfig::default();
        assert_eq!(pricing.display_amount(Decimal::from(13)), "13,00");
        assert_eq!(pricing.display_amount(Decimal::new(125, 1)), "12,50");
    }

    #[test]
    fn display_formula_uses_separator() {
        let mut pricing = PricingConfig::default();
        assert_eq!(pricing.display_formula("10.5 * nights"), "10,5 * nights");
        pricing.display_separator = ".".into();
        assert_eq!(pricing.display_formula("10.5 * nights"), "10.5 * nights");
    }
}
