//! Label and category formatting for flag sets.
//!
//! A [`LabelRegistry`] is built once per domain with a
//! [`LabelRegistryBuilder`] and shared read-only afterwards. It is stateless
//! with respect to individual masks.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::catalog::FlagCatalog;
use crate::error::FlagError;
use crate::flag_set::FlagSet;

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// Semantic presentation category of a label.
///
/// Serializes as a lowercase string; unknown strings are kept as `Custom`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Category {
    #[default]
    Default,
    Primary,
    Success,
    Info,
    Warning,
    Danger,
    Custom(String),
}

impl Category {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Default => "default",
            Self::Primary => "primary",
            Self::Success => "success",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Danger => "danger",
            Self::Custom(s) => s.as_str(),
        }
    }

    /// Returns `true` for the built-in (non-custom) categories.
    pub fn is_builtin(&self) -> bool {
        !matches!(self, Self::Custom(_))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Category {
    fn from(s: &str) -> Self {
        match s {
            "default" | "" => Self::Default,
            "primary" => Self::Primary,
            "success" => Self::Success,
            "info" => Self::Info,
            "warning" => Self::Warning,
            "danger" => Self::Danger,
            other => Self::Custom(other.to_owned()),
        }
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from(s.as_str()))
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// One rendered label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlagLabel {
    /// The bit this label describes.
    pub bit: u32,
    pub label: String,
    pub category: Category,
    /// `true` when this is an absence label (the bit is *not* set).
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub absent: bool,
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Configuration-time builder for a [`LabelRegistry`].
#[derive(Debug, Clone)]
pub struct LabelRegistryBuilder {
    catalog: Arc<FlagCatalog>,
    custom_labels: HashMap<u32, String>,
    absence_labels: HashMap<u32, String>,
    custom_types: HashMap<u32, Category>,
}

impl LabelRegistryBuilder {
    pub fn new(catalog: Arc<FlagCatalog>) -> Self {
        Self {
            catalog,
            custom_labels: HashMap::new(),
            absence_labels: HashMap::new(),
            custom_types: HashMap::new(),
        }
    }

    /// Overrides the catalog's default label for `bit`.
    pub fn custom_label(mut self, bit: u32, label: impl Into<String>) -> Result<Self, FlagError> {
        self.check(bit)?;
        self.custom_labels.insert(bit, label.into());
        Ok(self)
    }

    /// Label shown instead of an empty list when no bit is set.
    pub fn absence_label(mut self, bit: u32, label: impl Into<String>) -> Result<Self, FlagError> {
        self.check(bit)?;
        self.absence_labels.insert(bit, label.into());
        Ok(self)
    }

    /// Semantic category for `bit`.
    pub fn custom_type(mut self, bit: u32, category: Category) -> Result<Self, FlagError> {
        self.check(bit)?;
        self.custom_types.insert(bit, category);
        Ok(self)
    }

    /// Freezes the configuration.
    pub fn build(self) -> LabelRegistry {
        LabelRegistry {
            catalog: self.catalog,
            custom_labels: self.custom_labels,
            absence_labels: self.absence_labels,
            custom_types: self.custom_types,
        }
    }

    fn check(&self, bit: u32) -> Result<(), FlagError> {
        if self.catalog.contains(bit) {
            Ok(())
        } else {
            Err(FlagError::unknown_bit(bit))
        }
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Frozen label configuration for one domain.
#[derive(Debug, Clone)]
pub struct LabelRegistry {
    catalog: Arc<FlagCatalog>,
    custom_labels: HashMap<u32, String>,
    absence_labels: HashMap<u32, String>,
    custom_types: HashMap<u32, Category>,
}

impl LabelRegistry {
    pub fn builder(catalog: Arc<FlagCatalog>) -> LabelRegistryBuilder {
        LabelRegistryBuilder::new(catalog)
    }

    /// Returns a builder pre-populated with this registry's configuration,
    /// so callers can layer further overrides on top.
    pub fn to_builder(&self) -> LabelRegistryBuilder {
        LabelRegistryBuilder {
            catalog: self.catalog.clone(),
            custom_labels: self.custom_labels.clone(),
            absence_labels: self.absence_labels.clone(),
            custom_types: self.custom_types.clone(),
        }
    }

    pub fn catalog(&self) -> &Arc<FlagCatalog> {
        &self.catalog
    }

    /// Effective label for `bit`: override if present, else catalog default.
    pub fn label(&self, bit: u32) -> Option<&str> {
        self.custom_labels
            .get(&bit)
            .map(String::as_str)
            .or_else(|| self.catalog.entry(bit).map(|e| e.label.as_str()))
    }

    pub fn category(&self, bit: u32) -> Category {
        self.custom_types.get(&bit).cloned().unwrap_or_default()
    }

    /// The absence label that applies to an empty mask, with its bit.
    ///
    /// The primary (first declared) bit wins; otherwise the first declared
    /// bit that has one.
    pub fn absence(&self) -> Option<(u32, &str)> {
        let primary = self.catalog.primary()?;
        if let Some(label) = self.absence_labels.get(&primary.bit) {
            return Some((primary.bit, label.as_str()));
        }
        self.catalog
            .entries()
            .iter()
            .find_map(|e| self.absence_labels.get(&e.bit).map(|l| (e.bit, l.as_str())))
    }

    /// Labels of the set bits in catalog declaration order, or the absence
    /// label when the mask is empty.
    pub fn active_labels(&self, set: &FlagSet) -> Vec<String> {
        self.active_labels_with_category(set)
            .into_iter()
            .map(|l| l.label)
            .collect()
    }

    /// Like [`active_labels`](Self::active_labels), with bit and category.
    pub fn active_labels_with_category(&self, set: &FlagSet) -> Vec<FlagLabel> {
        if set.catalog().domain() != self.catalog.domain() {
            tracing::warn!(
                set = set.catalog().domain(),
                registry = self.catalog.domain(),
                "formatting flag set with a registry of another domain"
            );
        }

        let labels: Vec<FlagLabel> = self
            .catalog
            .entries()
            .iter()
            .filter(|e| set.has(e.bit))
            .map(|e| FlagLabel {
                bit: e.bit,
                label: self.label(e.bit).unwrap_or(&e.label).to_string(),
                category: self.category(e.bit),
                absent: false,
            })
            .collect();

        if !labels.is_empty() || !set.is_empty() {
            return labels;
        }

        match self.absence() {
            Some((bit, label)) => vec![FlagLabel {
                bit,
                label: label.to_string(),
                category: Category::Default,
                absent: true,
            }],
            None => Vec::new(),
        }
    }

    /// Formats a stored mask.
    pub fn format(&self, mask: u32) -> Result<Vec<String>, FlagError> {
        let set = FlagSet::from_bits(mask, self.catalog.clone())?;
        Ok(self.active_labels(&set))
    }
}

/// Formats a stored mask with `registry`.
///
/// # Errors
///
/// Returns [`FlagError::InvalidMask`] if the mask carries undeclared bits.
pub fn format_flags(mask: u32, registry: &LabelRegistry) -> Result<Vec<String>, FlagError> {
    registry.format(mask)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn catalog() -> Arc<FlagCatalog> {
        Arc::new(
            FlagCatalog::from_table(
                "status",
                &[(1, "confirmed", "Confirmed"), (4, "withdrawn", "Withdrawn"), (2, "paid", "Paid")],
            )
            .unwrap(),
        )
    }

    fn registry() -> LabelRegistry {
        LabelRegistry::builder(catalog())
            .custom_label(4, "Withdrawn by participant")
            .unwrap()
            .absence_label(1, "Unconfirmed")
            .unwrap()
            .custom_type(1, Category::Success)
            .unwrap()
            .custom_type(4, Category::Warning)
            .unwrap()
            .build()
    }

    #[test]
    fn labels_follow_declaration_order_not_bit_order() {
        let labels = registry().format(7).unwrap();
        assert_eq!(labels, vec!["Confirmed", "Withdrawn by participant", "Paid"]);
    }

    #[test]
    fn empty_mask_shows_absence_label() {
        assert_eq!(registry().format(0).unwrap(), vec!["Unconfirmed"]);
    }

    #[test]
    fn absence_label_hidden_when_any_bit_set() {
        assert_eq!(registry().format(2).unwrap(), vec!["Paid"]);
    }

    #[test]
    fn empty_mask_without_absence_label_is_empty() {
        let reg = LabelRegistry::builder(catalog()).build();
        assert!(reg.format(0).unwrap().is_empty());
    }

    #[test]
    fn absence_label_of_non_primary_bit_used_as_fallback() {
        let reg = LabelRegistry::builder(catalog())
            .absence_label(2, "Not paid")
            .unwrap()
            .build();
        let set = FlagSet::new(catalog());
        let labels = reg.active_labels_with_category(&set);
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].bit, 2);
        assert!(labels[0].absent);
        assert_eq!(labels[0].label, "Not paid");
    }

    #[test]
    fn categories_attached() {
        let set = FlagSet::from_bits(5, catalog()).unwrap();
        let labels = registry().active_labels_with_category(&set);
        let cats: Vec<_> = labels.iter().map(|l| l.category.clone()).collect();
        assert_eq!(cats, vec![Category::Success, Category::Warning]);
    }

    #[test]
    fn builder_rejects_unknown_bits() {
        let err = LabelRegistry::builder(catalog()).custom_label(8, "Eight").unwrap_err();
        assert_eq!(err, FlagError::UnknownBit("8".into()));
    }

    #[test]
    fn format_rejects_stray_bits() {
        assert!(matches!(
            format_flags(8, &registry()),
            Err(FlagError::InvalidMask { stray: 8, .. })
        ));
    }

    #[test]
    fn to_builder_layers_overrides() {
        let reg = registry().to_builder().custom_label(1, "Yes").unwrap().build();
        assert_eq!(reg.format(5).unwrap(), vec!["Yes", "Withdrawn by participant"]);
        assert_eq!(reg.category(1), Category::Success);
    }

    #[test]
    fn category_string_round_trip() {
        assert_eq!(Category::from("danger"), Category::Danger);
        assert_eq!(Category::from("muted"), Category::Custom("muted".into()));
        assert_eq!(serde_json::to_string(&Category::Info).unwrap(), "\"info\"");
        let back: Category = serde_json::from_str("\"warning\"").unwrap();
        assert_eq!(back, Category::Warning);
    }
}
