//! Variable resolution and the evaluation snapshot.
//!
//! Resolution is a pure lookup: an override for the exact (narrowed) scope
//! wins, then the variable's default, otherwise [`CalculationImpossible`].
//! Nothing here writes; provisioning lives in [`crate::store`].

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::CalculationImpossible;
use crate::types::{Scope, Variable, VariableId, VariableValue};

/// Read access to variables and their override values.
///
/// Implementations only return live (not soft-deleted) records.
pub trait VariableSource {
    /// Looks up a live variable by formula name.
    fn variable(&self, name: &str) -> Option<&Variable>;

    /// All live variables.
    fn variables(&self) -> Vec<&Variable>;

    /// The live override for exactly this variable and scope.
    fn value(&self, variable: VariableId, scope: &Scope) -> Option<&VariableValue>;
}

/// Resolves `variable` for `scope`, or `None` when neither an explicit
/// value nor a default exists.
pub fn try_resolve(variable: &Variable, scope: &Scope, source: &impl VariableSource) -> Option<Decimal> {
    let scope = scope.narrow(variable.kind);
    if let Some(value) = source.value(variable.id, &scope).and_then(|v| v.value) {
        return Some(value);
    }
    if variable.default_value.is_some() {
        tracing::debug!(variable = %variable.name, %scope, "no override, using default");
    }
    variable.default_value
}

/// Resolves `variable` for `scope`.
///
/// # Errors
///
/// Returns [`CalculationImpossible`] naming the variable when it has no
/// explicit value for the scope and no default.
pub fn resolve(
    variable: &Variable,
    scope: &Scope,
    source: &impl VariableSource,
) -> Result<Decimal, CalculationImpossible> {
    try_resolve(variable, scope, source).ok_or_else(|| CalculationImpossible::new(&variable.name))
}

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

/// Name lookup used by the evaluator.
pub trait Environment {
    fn lookup(&self, name: &str) -> Result<Decimal, CalculationImpossible>;
}

impl Environment for HashMap<String, Decimal> {
    fn lookup(&self, name: &str) -> Result<Decimal, CalculationImpossible> {
        self.get(name).copied().ok_or_else(|| CalculationImpossible::new(name))
    }
}

impl Environment for BTreeMap<String, Decimal> {
    fn lookup(&self, name: &str) -> Result<Decimal, CalculationImpossible> {
        self.get(name).copied().ok_or_else(|| CalculationImpossible::new(name))
    }
}

/// The resolved state of one variable for one scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SnapshotEntry {
    /// Explicit override for the scope, if any.
    pub value: Option<Decimal>,
    /// The variable's configured default.
    pub default: Option<Decimal>,
}

impl SnapshotEntry {
    pub fn effective(&self) -> Option<Decimal> {
        self.value.or(self.default)
    }
}

/// Everything a formula evaluation needs for one scope, captured up front.
///
/// Context values (such as the numeric `value` of the selected choice) are
/// supplied by the host and shadow stored variables of the same name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VariableSnapshot {
    entries: BTreeMap<String, SnapshotEntry>,
    context: BTreeMap<String, Decimal>,
}

impl VariableSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Captures every live variable of `source` for `scope`.
    pub fn capture(source: &impl VariableSource, scope: &Scope) -> Self {
        let entries = source
            .variables()
            .into_iter()
            .map(|variable| {
                let narrowed = scope.narrow(variable.kind);
                let value = source.value(variable.id, &narrowed).and_then(|v| v.value);
                (
                    variable.name.clone(),
                    SnapshotEntry {
                        value,
                        default: variable.default_value,
                    },
                )
            })
            .collect();
        Self {
            entries,
            context: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, entry: SnapshotEntry) {
        self.entries.insert(name.into(), entry);
    }

    /// Adds a variable with only a default.
    pub fn with_default(mut self, name: impl Into<String>, default: Decimal) -> Self {
        self.entries.entry(name.into()).or_default().default = Some(default);
        self
    }

    /// Adds (or overrides) the explicit value of a variable.
    pub fn with_value(mut self, name: impl Into<String>, value: Decimal) -> Self {
        self.entries.entry(name.into()).or_default().value = Some(value);
        self
    }

    /// Adds a host-supplied context value.
    pub fn with_context(mut self, name: impl Into<String>, value: Decimal) -> Self {
        self.context.insert(name.into(), value);
        self
    }

    pub fn entry(&self, name: &str) -> Option<&SnapshotEntry> {
        self.entries.get(name)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &SnapshotEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.context.contains_key(name) || self.entries.contains_key(name)
    }
}

impl Environment for VariableSnapshot {
    fn lookup(&self, name: &str) -> Result<Decimal, CalculationImpossible> {
        if let Some(value) = self.context.get(name) {
            return Ok(*value);
        }
        match self.entries.get(name) {
            Some(entry) => entry.effective().ok_or_else(|| CalculationImpossible::new(name)),
            None => {
                tracing::debug!(variable = name, "formula references an unknown variable");
                Err(CalculationImpossible::new(name))
            }
        }
    }
}
