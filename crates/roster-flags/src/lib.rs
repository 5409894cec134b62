//! Bitmask flag sets for participant attributes.
//!
//! A [`FlagSet`] is an integer mask over a fixed, caller-supplied
//! [`FlagCatalog`]. A [`LabelRegistry`] turns a mask into display labels in
//! catalog declaration order, with absence labels and semantic categories.
//! Built-in catalogs for participant status and food preferences live in
//! [`domains`].

pub mod catalog;
pub mod domains;
pub mod error;
pub mod flag_set;
pub mod registry;

pub use catalog::{FlagCatalog, FlagEntry};
pub use domains::Domain;
pub use error::FlagError;
pub use flag_set::FlagSet;
pub use registry::{Category, FlagLabel, LabelRegistry, LabelRegistryBuilder, format_flags};
