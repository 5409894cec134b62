//! Built-in flag domains: participant status and food preferences.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, LazyLock};

use crate::catalog::{FlagCatalog, FlagEntry};
use crate::error::FlagError;
use crate::flag_set::FlagSet;
use crate::registry::{Category, LabelRegistry};

/// Participant status bits.
pub mod status {
    pub const CONFIRMED: u32 = 1;
    pub const PAID: u32 = 2;
    pub const WITHDRAWN: u32 = 4;
    pub const REJECTED: u32 = 16;
}

/// Food preference bits.
pub mod food {
    pub const VEGAN: u32 = 2;
    pub const VEGETARIAN: u32 = 4;
    pub const NO_PORK: u32 = 8;
    pub const LACTOSE_FREE: u32 = 16;
}

const STATUS_TABLE: &[(u32, &str, &str)] = &[
    (status::CONFIRMED, "confirmed", "confirmed"),
    (status::PAID, "paid", "paid"),
    (status::WITHDRAWN, "withdrawn", "withdrawn"),
    (status::REJECTED, "rejected", "rejected"),
];

const FOOD_TABLE: &[(u32, &str, &str)] = &[
    (food::VEGAN, "vegan", "vegan"),
    (food::VEGETARIAN, "vegetarian", "vegetarian"),
    (food::NO_PORK, "no_pork", "no pork"),
    (food::LACTOSE_FREE, "lactose_free", "lactose free"),
];

fn builtin(domain: &str, table: &[(u32, &str, &str)]) -> Arc<FlagCatalog> {
    let entries = table
        .iter()
        .map(|(bit, name, label)| FlagEntry::new(*bit, *name, *label))
        .collect();
    // The tables above are checked by `builtin_tables_are_valid`.
    match FlagCatalog::new(domain, entries) {
        Ok(catalog) => Arc::new(catalog),
        Err(e) => unreachable!("built-in catalog {domain}: {e}"),
    }
}

static STATUS_CATALOG: LazyLock<Arc<FlagCatalog>> =
    LazyLock::new(|| builtin("participant_status", STATUS_TABLE));

static FOOD_CATALOG: LazyLock<Arc<FlagCatalog>> =
    LazyLock::new(|| builtin("participant_food", FOOD_TABLE));

static STATUS_REGISTRY: LazyLock<LabelRegistry> = LazyLock::new(|| {
    let c = STATUS_CATALOG.clone();
    let mut b = LabelRegistry::builder(c.clone());
    for (bit, category) in [
        (status::CONFIRMED, Category::Success),
        (status::PAID, Category::Info),
        (status::WITHDRAWN, Category::Warning),
        (status::REJECTED, Category::Danger),
    ] {
        b = b.custom_type(bit, category).unwrap_or_else(|e| unreachable!("{e}"));
    }
    b.absence_label(status::CONFIRMED, "unconfirmed")
        .unwrap_or_else(|e| unreachable!("{e}"))
        .build()
});

static FOOD_REGISTRY: LazyLock<LabelRegistry> =
    LazyLock::new(|| LabelRegistry::builder(FOOD_CATALOG.clone()).build());

/// A built-in flag domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    ParticipantStatus,
    ParticipantFood,
}

impl Domain {
    pub const ALL: [Domain; 2] = [Domain::ParticipantStatus, Domain::ParticipantFood];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ParticipantStatus => "participant_status",
            Self::ParticipantFood => "participant_food",
        }
    }

    pub fn catalog(&self) -> Arc<FlagCatalog> {
        match self {
            Self::ParticipantStatus => STATUS_CATALOG.clone(),
            Self::ParticipantFood => FOOD_CATALOG.clone(),
        }
    }

    /// The shared default registry for this domain.
    pub fn registry(&self) -> &'static LabelRegistry {
        match self {
            Self::ParticipantStatus => &STATUS_REGISTRY,
            Self::ParticipantFood => &FOOD_REGISTRY,
        }
    }

    /// Rebuilds a stored mask of this domain.
    pub fn flags(&self, bits: u32) -> Result<FlagSet, FlagError> {
        FlagSet::from_bits(bits, self.catalog())
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = FlagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "participant_status" | "status" => Ok(Self::ParticipantStatus),
            "participant_food" | "food" => Ok(Self::ParticipantFood),
            other => Err(FlagError::UnknownDomain(other.to_string())),
        }
    }
}

/// Confirmed and neither withdrawn nor rejected.
pub fn is_active_participant(set: &FlagSet) -> bool {
    set.has(status::CONFIRMED) && !set.has(status::WITHDRAWN) && !set.has(status::REJECTED)
}

/// Withdrawn or rejected participants no longer take part.
pub fn is_dropped_out(set: &FlagSet) -> bool {
    set.has(status::WITHDRAWN) || set.has(status::REJECTED)
}
