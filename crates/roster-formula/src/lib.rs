//! Price formula engine.
//!
//! Formulas are arithmetic expressions over decimal literals and named
//! variables. Variables carry an optional default and may be overridden per
//! event (or per event and choice option). Evaluation never substitutes zero
//! for a missing value: it fails with [`CalculationImpossible`] naming the
//! variable instead.
//!
//! Pure evaluation ([`resolve`], [`engine`]) is kept apart from the
//! administrative provisioning path ([`store::VariableStore::ensure_value`]).

pub mod catalog;
pub mod consistency;
pub mod engine;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod resolve;
pub mod store;
pub mod types;

pub use catalog::{find_catalog, load_catalog, save_catalog};
pub use consistency::{CHOICE_VALUE, check_attribute, check_catalog, parse_management_title, validate_attribute};
pub use engine::{
    EvalOptions, PriceBreakdown, PriceError, PriceSummand, Rounding, Selection, evaluate, evaluate_formula,
    evaluate_with, price_breakdown,
};
pub use error::{CalculationImpossible, CatalogError, ConsistencyError, EvalError, FormulaError, StoreError};
pub use parser::{ParsedFormula, display_expression, normalize_input, parse};
pub use resolve::{Environment, SnapshotEntry, VariableSnapshot, VariableSource, resolve, try_resolve};
pub use store::{MemoryStore, VariableStore};
pub use types::{
    Attribute, Catalog, ChoiceId, ChoiceOption, EventId, Scope, ScopeKind, Variable, VariableId, VariableValue,
};
