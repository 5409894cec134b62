//! Flag error types.

/// Errors raised while building catalogs or manipulating flag sets.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlagError {
    /// A stored mask carries bits that the catalog does not declare.
    #[error("mask {mask} contains bits outside the catalog (stray bits {stray:#b})")]
    InvalidMask {
        /// The rejected mask.
        mask: u32,
        /// The bits that are not part of the catalog.
        stray: u32,
    },

    /// A single bit (or flag name) is not declared by the catalog.
    #[error("flag {0} is not part of the catalog")]
    UnknownBit(String),

    /// A flag domain name matches none of the built-in domains.
    #[error("unknown flag domain '{0}'")]
    UnknownDomain(String),

    /// The catalog table itself is malformed.
    #[error("invalid flag catalog: {0}")]
    InvalidCatalog(String),
}

impl FlagError {
    pub(crate) fn unknown_bit(bit: u32) -> Self {
        Self::UnknownBit(bit.to_string())
    }
}
