//! The flag set value type.

use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};

use crate::catalog::FlagCatalog;
use crate::error::FlagError;

/// A mask over a [`FlagCatalog`].
///
/// The mask only ever contains declared bits. Mutation goes through
/// [`enable`](Self::enable), [`disable`](Self::disable) and
/// [`toggle`](Self::toggle), which reject undeclared bits; the by-value
/// [`with`](Self::with)/[`without`](Self::without) variants suit
/// copy-on-write use of shared sets.
#[derive(Debug, Clone)]
pub struct FlagSet {
    bits: u32,
    catalog: Arc<FlagCatalog>,
}

impl FlagSet {
    /// An empty set over `catalog`.
    pub fn new(catalog: Arc<FlagCatalog>) -> Self {
        Self { bits: 0, catalog }
    }

    /// Rebuilds a set from a stored mask.
    ///
    /// # Errors
    ///
    /// Returns [`FlagError::InvalidMask`] when `bits` carries undeclared bits.
    pub fn from_bits(bits: u32, catalog: Arc<FlagCatalog>) -> Result<Self, FlagError> {
        let stray = catalog.stray_bits(bits);
        if stray != 0 {
            return Err(FlagError::InvalidMask { mask: bits, stray });
        }
        Ok(Self { bits, catalog })
    }

    pub fn catalog(&self) -> &Arc<FlagCatalog> {
        &self.catalog
    }

    /// The raw mask, for storage.
    pub fn bits(&self) -> u32 {
        self.bits
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Returns `true` if `bit` is set. Undeclared bits are never set.
    pub fn has(&self, bit: u32) -> bool {
        bit != 0 && self.bits & bit == bit
    }

    pub fn enable(&mut self, bit: u32) -> Result<&mut Self, FlagError> {
        self.check(bit)?;
        self.bits |= bit;
        Ok(self)
    }

    pub fn disable(&mut self, bit: u32) -> Result<&mut Self, FlagError> {
        self.check(bit)?;
        self.bits &= !bit;
        Ok(self)
    }

    pub fn toggle(&mut self, bit: u32) -> Result<&mut Self, FlagError> {
        self.check(bit)?;
        self.bits ^= bit;
        Ok(self)
    }

    /// Copy of this set with `bit` enabled.
    pub fn with(mut self, bit: u32) -> Result<Self, FlagError> {
        self.enable(bit)?;
        Ok(self)
    }

    /// Copy of this set with `bit` disabled.
    pub fn without(mut self, bit: u32) -> Result<Self, FlagError> {
        self.disable(bit)?;
        Ok(self)
    }

    /// Set bits in ascending numeric order.
    pub fn active_bits(&self) -> Vec<u32> {
        (0..u32::BITS)
            .map(|shift| 1u32 << shift)
            .filter(|bit| self.bits & bit != 0)
            .collect()
    }

    /// Names of the set bits in catalog declaration order.
    pub fn names(&self) -> Vec<&str> {
        self.catalog
            .entries()
            .iter()
            .filter(|e| self.has(e.bit))
            .map(|e| e.name.as_str())
            .collect()
    }

    fn check(&self, bit: u32) -> Result<(), FlagError> {
        if self.catalog.contains(bit) {
            Ok(())
        } else {
            Err(FlagError::unknown_bit(bit))
        }
    }
}

impl PartialEq for FlagSet {
    fn eq(&self, other: &Self) -> bool {
        self.bits == other.bits
            && (Arc::ptr_eq(&self.catalog, &other.catalog) || self.catalog == other.catalog)
    }
}

impl Eq for FlagSet {}

impl From<&FlagSet> for u32 {
    fn from(set: &FlagSet) -> Self {
        set.bits
    }
}

impl fmt::Display for FlagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = self.names();
        if names.is_empty() {
            f.write_str("-")
        } else {
            f.write_str(&names.join("|"))
        }
    }
}

impl Serialize for FlagSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const CONFIRMED: u32 = 1;
    const WITHDRAWN: u32 = 4;
    const REJECTED: u32 = 16;

    fn catalog() -> Arc<FlagCatalog> {
        Arc::new(
            FlagCatalog::from_table(
                "status",
                &[
                    (CONFIRMED, "confirmed", "Confirmed"),
                    (WITHDRAWN, "withdrawn", "Withdrawn"),
                    (REJECTED, "rejected", "Rejected"),
                ],
            )
            .unwrap(),
        )
    }

    #[test]
    fn mask_five_has_confirmed_and_withdrawn() {
        let mut set = FlagSet::from_bits(5, catalog()).unwrap();
        assert_eq!(set.active_bits(), vec![1, 4]);
        set.disable(WITHDRAWN).unwrap();
        assert_eq!(set.bits(), 1);
    }

    #[test]
    fn stray_bits_rejected_on_construction() {
        match FlagSet::from_bits(0b110, catalog()) {
            Err(FlagError::InvalidMask { mask, stray }) => {
                assert_eq!(mask, 6);
                assert_eq!(stray, 2);
            }
            other => panic!("expected InvalidMask, got {:?}", other),
        }
    }

    #[test]
    fn unknown_bits_rejected_on_mutation() {
        let mut set = FlagSet::new(catalog());
        assert!(matches!(set.enable(2), Err(FlagError::UnknownBit(_))));
        assert!(matches!(set.toggle(5), Err(FlagError::UnknownBit(_))));
        assert!(set.is_empty());
    }

    #[test]
    fn enable_and_disable_are_idempotent() {
        let mut set = FlagSet::new(catalog());
        set.enable(REJECTED).unwrap().enable(REJECTED).unwrap();
        assert_eq!(set.bits(), 16);
        set.disable(CONFIRMED).unwrap().disable(REJECTED).unwrap().disable(REJECTED).unwrap();
        assert_eq!(set.bits(), 0);
    }

    #[test]
    fn toggle_flips() {
        let mut set = FlagSet::new(catalog());
        set.toggle(WITHDRAWN).unwrap();
        assert!(set.has(WITHDRAWN));
        set.toggle(WITHDRAWN).unwrap();
        assert!(!set.has(WITHDRAWN));
    }

    #[test]
    fn enabling_subset_then_disabling_leaves_difference() {
        let bits = [CONFIRMED, WITHDRAWN, REJECTED];
        for enabled in 0u32..8 {
            for disabled in 0u32..8 {
                if disabled & !enabled != 0 {
                    continue;
                }
                let mut set = FlagSet::new(catalog());
                let mut expected = Vec::new();
                for (i, bit) in bits.iter().enumerate() {
                    if enabled & (1 << i) != 0 {
                        set.enable(*bit).unwrap();
                    }
                }
                for (i, bit) in bits.iter().enumerate() {
                    if disabled & (1 << i) != 0 {
                        set.disable(*bit).unwrap();
                    } else if enabled & (1 << i) != 0 {
                        expected.push(*bit);
                    }
                }
                assert_eq!(set.active_bits(), expected);
            }
        }
    }

    #[test]
    fn stored_mask_rebuilds_equal_set() {
        let cat = catalog();
        let set = FlagSet::new(cat.clone()).with(REJECTED).unwrap().with(CONFIRMED).unwrap();
        let restored = FlagSet::from_bits(set.bits(), cat).unwrap();
        assert_eq!(restored, set);
    }

    #[test]
    fn every_mask_rebuilds_equal_set() {
        let cat = catalog();
        let n = cat.entries().len();
        for subset in 0u32..(1 << n) {
            let mut built = FlagSet::new(cat.clone());
            for (i, entry) in cat.entries().iter().enumerate() {
                if subset & (1 << i) != 0 {
                    built.enable(entry.bit).unwrap();
                }
            }
            let mask = built.bits();
            assert_eq!(mask & !cat.universe(), 0);

            let restored = FlagSet::from_bits(mask, cat.clone()).unwrap();
            assert_eq!(restored.bits(), mask);
            assert_eq!(restored, built);
        }
    }

    #[test]
    fn without_leaves_original_untouched() {
        let original = FlagSet::from_bits(5, catalog()).unwrap();
        let changed = original.clone().without(CONFIRMED).unwrap();
        assert_eq!(original.bits(), 5);
        assert_eq!(changed.bits(), 4);
    }

    #[test]
    fn serializes_as_integer() {
        let set = FlagSet::from_bits(17, catalog()).unwrap();
        assert_eq!(serde_json::to_string(&set).unwrap(), "17");
    }

    #[test]
    fn display_uses_declaration_order() {
        let set = FlagSet::from_bits(21, catalog()).unwrap();
        assert_eq!(set.to_string(), "confirmed|withdrawn|rejected");
        assert_eq!(FlagSet::new(catalog()).to_string(), "-");
    }
}
