//! Flag catalogs: the ordered universe of legal bits for one domain.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::FlagError;

/// One named bit of a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagEntry {
    /// The bit value (a single power of two).
    pub bit: u32,

    /// Machine name used on the command line and in configuration.
    pub name: String,

    /// Default human-readable label.
    pub label: String,
}

impl FlagEntry {
    pub fn new(bit: u32, name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            bit,
            name: name.into(),
            label: label.into(),
        }
    }
}

/// The ordered set of bits a flag set may contain.
///
/// Declaration order is significant: labels are always produced in this
/// order, never in numeric bit order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlagCatalog {
    domain: String,
    entries: Vec<FlagEntry>,
    #[serde(skip)]
    universe: u32,
}

impl FlagCatalog {
    /// Builds a catalog, checking that every bit is a distinct single bit and
    /// that names and labels are non-empty and unique.
    pub fn new(domain: impl Into<String>, entries: Vec<FlagEntry>) -> Result<Self, FlagError> {
        let domain = domain.into();
        let mut universe = 0u32;
        let mut names = HashSet::new();

        for entry in &entries {
            if entry.bit == 0 || !entry.bit.is_power_of_two() {
                return Err(FlagError::InvalidCatalog(format!(
                    "{}: bit {} of '{}' is not a single bit",
                    domain, entry.bit, entry.name
                )));
            }
            if universe & entry.bit != 0 {
                return Err(FlagError::InvalidCatalog(format!(
                    "{}: bit {} is declared twice",
                    domain, entry.bit
                )));
            }
            if entry.name.is_empty() || entry.label.is_empty() {
                return Err(FlagError::InvalidCatalog(format!(
                    "{}: bit {} needs a name and a label",
                    domain, entry.bit
                )));
            }
            if !names.insert(entry.name.as_str()) {
                return Err(FlagError::InvalidCatalog(format!(
                    "{}: name '{}' is declared twice",
                    domain, entry.name
                )));
            }
            universe |= entry.bit;
        }

        Ok(Self {
            domain,
            entries,
            universe,
        })
    }

    /// Builds a catalog from a `(bit, name, label)` table.
    pub fn from_table(domain: impl Into<String>, table: &[(u32, &str, &str)]) -> Result<Self, FlagError> {
        let entries = table
            .iter()
            .map(|(bit, name, label)| FlagEntry::new(*bit, *name, *label))
            .collect();
        Self::new(domain, entries)
    }

    /// The domain this catalog belongs to (e.g. `participant_status`).
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Entries in declaration order.
    pub fn entries(&self) -> &[FlagEntry] {
        &self.entries
    }

    /// Bitwise OR of every declared bit.
    pub fn universe(&self) -> u32 {
        self.universe
    }

    /// Returns `true` if `bit` is exactly one declared bit.
    pub fn contains(&self, bit: u32) -> bool {
        bit.is_power_of_two() && self.universe & bit == bit
    }

    /// Bits of `mask` that are not declared by this catalog.
    pub fn stray_bits(&self, mask: u32) -> u32 {
        mask & !self.universe
    }

    /// Looks up the entry for a single bit.
    pub fn entry(&self, bit: u32) -> Option<&FlagEntry> {
        self.entries.iter().find(|e| e.bit == bit)
    }

    /// Resolves a flag by machine name or by its numeric bit value.
    pub fn lookup(&self, key: &str) -> Option<&FlagEntry> {
        let key = key.trim();
        if let Ok(bit) = key.parse::<u32>() {
            return self.entry(bit);
        }
        self.entries.iter().find(|e| e.name.eq_ignore_ascii_case(key))
    }

    /// Like [`lookup`](Self::lookup) but returns the bit or an error.
    pub fn resolve_bit(&self, key: &str) -> Result<u32, FlagError> {
        self.lookup(key)
            .map(|e| e.bit)
            .ok_or_else(|| FlagError::UnknownBit(key.to_string()))
    }

    /// The first declared entry; its absence label is the one shown for an
    /// empty mask.
    pub fn primary(&self) -> Option<&FlagEntry> {
        self.entries.first()
    }
}
