//! Variable store: the administrative write path.
//!
//! [`VariableStore`] adds provisioning and soft deletion on top of the
//! read-only [`VariableSource`]. Evaluation code only ever sees the read
//! trait, so computing a price can never create records.

use chrono::Utc;
use rust_decimal::Decimal;

use crate::consistency::CHOICE_VALUE;
use crate::error::StoreError;
use crate::lexer::is_identifier;
use crate::resolve::VariableSource;
use crate::types::{Catalog, Scope, ScopeKind, Variable, VariableId, VariableValue};

/// Names reserved for host-supplied context values.
pub const RESERVED_NAMES: &[&str] = &[CHOICE_VALUE];

/// Provisioning interface for variables and their scoped values.
pub trait VariableStore: VariableSource {
    /// Creates a new variable.
    fn create_variable(
        &mut self,
        name: &str,
        default: Option<Decimal>,
        kind: ScopeKind,
    ) -> Result<&Variable, StoreError>;

    /// Returns the live value record for the variable's scope, creating an
    /// empty shell first if none exists. Idempotent. A choice variable
    /// needs a scope with a choice.
    fn ensure_value(&mut self, variable: VariableId, scope: &Scope) -> Result<&VariableValue, StoreError>;

    /// Writes an explicit value (or clears it with `None`).
    ///
    /// When `expected_revision` is given and differs from the stored
    /// revision the write is rejected with [`StoreError::Conflict`].
    fn set_value(
        &mut self,
        variable: VariableId,
        scope: &Scope,
        value: Option<Decimal>,
        expected_revision: Option<u64>,
    ) -> Result<&VariableValue, StoreError>;

    /// Soft-deletes a variable; its values stay for history.
    fn soft_delete_variable(&mut self, variable: VariableId) -> Result<(), StoreError>;

    /// Soft-deletes the value of a variable for one scope.
    fn soft_delete_value(&mut self, variable: VariableId, scope: &Scope) -> Result<(), StoreError>;

    /// Undoes a soft delete of a variable.
    fn restore_variable(&mut self, variable: VariableId) -> Result<(), StoreError>;
}

/// In-memory store, typically loaded from a catalog file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryStore {
    variables: Vec<Variable>,
    values: Vec<VariableValue>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from existing records, checking that names are valid
    /// and not reserved, that live names and live value scopes are unique,
    /// and that every value references a known variable under a scope its
    /// kind looks up.
    pub fn from_parts(variables: Vec<Variable>, values: Vec<VariableValue>) -> Result<Self, StoreError> {
        for (i, v) in variables.iter().enumerate() {
            if !is_identifier(&v.name) || RESERVED_NAMES.contains(&v.name.as_str()) {
                return Err(StoreError::InvalidName(v.name.clone()));
            }
            let clash = variables[..i].iter().any(|o| {
                o.id == v.id || (!o.is_deleted() && !v.is_deleted() && o.name == v.name)
            });
            if clash {
                return Err(StoreError::Duplicate(format!("variable '{}' (id {})", v.name, v.id)));
            }
        }
        for (i, value) in values.iter().enumerate() {
            let Some(variable) = variables.iter().find(|v| v.id == value.variable) else {
                return Err(StoreError::not_found("variable", value.variable));
            };
            let scope = value.scope();
            if !scope.fits(variable.kind) {
                return Err(StoreError::ScopeMismatch {
                    variable: value.variable,
                    scope: scope.to_string(),
                });
            }
            let clash = values[..i]
                .iter()
                .any(|o| !o.is_deleted() && !value.is_deleted() && o.matches(value.variable, &scope));
            if clash {
                return Err(StoreError::Duplicate(format!(
                    "value of variable {} for {}",
                    value.variable, scope
                )));
            }
        }
        Ok(Self { variables, values })
    }

    /// Loads the variable records of a catalog.
    pub fn from_catalog(catalog: &Catalog) -> Result<Self, StoreError> {
        Self::from_parts(catalog.variables.clone(), catalog.values.clone())
    }

    /// Writes this store's records back into a catalog.
    pub fn write_to(&self, catalog: &mut Catalog) {
        catalog.variables = self.variables.clone();
        catalog.values = self.values.clone();
    }

    /// Looks up a variable by id, including soft-deleted ones.
    pub fn variable_by_id(&self, id: VariableId) -> Option<&Variable> {
        self.variables.iter().find(|v| v.id == id)
    }

    /// All variables, including soft-deleted ones.
    pub fn all_variables(&self) -> &[Variable] {
        &self.variables
    }

    /// All value records, including soft-deleted ones.
    pub fn all_values(&self) -> &[VariableValue] {
        &self.values
    }

    /// Live values of one variable.
    pub fn values_of(&self, variable: VariableId) -> impl Iterator<Item = &VariableValue> {
        self.values
            .iter()
            .filter(move |v| v.variable == variable && !v.is_deleted())
    }

    /// Replaces the description of a live variable.
    pub fn set_description(&mut self, id: VariableId, description: &str) -> Result<(), StoreError> {
        self.live_variable(id)?;
        if let Some(v) = self.variables.iter_mut().find(|v| v.id == id) {
            v.description = description.trim().to_string();
        }
        Ok(())
    }

    fn live_variable(&self, id: VariableId) -> Result<&Variable, StoreError> {
        match self.variable_by_id(id) {
            None => Err(StoreError::not_found("variable", id)),
            Some(v) if v.is_deleted() => Err(StoreError::variable_deleted(id)),
            Some(v) => Ok(v),
        }
    }

    fn value_index(&self, variable: VariableId, scope: &Scope) -> Option<usize> {
        self.values
            .iter()
            .position(|v| !v.is_deleted() && v.matches(variable, scope))
    }

    fn provision_index(&mut self, variable: VariableId, scope: &Scope) -> Result<usize, StoreError> {
        let kind = self.live_variable(variable)?.kind;
        let scope = scope.narrow(kind);
        if !scope.fits(kind) {
            return Err(StoreError::ScopeMismatch {
                variable,
                scope: scope.to_string(),
            });
        }
        if let Some(idx) = self.value_index(variable, &scope) {
            return Ok(idx);
        }
        tracing::info!(%variable, %scope, "provisioning variable value");
        self.values.push(VariableValue::shell(variable, &scope));
        Ok(self.values.len() - 1)
    }

    fn next_id(&self) -> Result<VariableId, StoreError> {
        let max = self.variables.iter().map(|v| v.id.0).max().unwrap_or(0);
        max.checked_add(1).map(VariableId).ok_or(StoreError::IdsExhausted)
    }
}

impl VariableSource for MemoryStore {
    fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name == name && !v.is_deleted())
    }

    fn variables(&self) -> Vec<&Variable> {
        self.variables.iter().filter(|v| !v.is_deleted()).collect()
    }

    fn value(&self, variable: VariableId, scope: &Scope) -> Option<&VariableValue> {
        self.value_index(variable, scope).map(|i| &self.values[i])
    }
}

impl VariableStore for MemoryStore {
    fn create_variable(
        &mut self,
        name: &str,
        default: Option<Decimal>,
        kind: ScopeKind,
    ) -> Result<&Variable, StoreError> {
        if !is_identifier(name) || RESERVED_NAMES.contains(&name) {
            return Err(StoreError::InvalidName(name.to_string()));
        }
        if self.variable(name).is_some() {
            return Err(StoreError::Duplicate(format!("variable '{}'", name)));
        }
        let mut variable = Variable::new(self.next_id()?.0, name).with_kind(kind);
        variable.default_value = default;
        self.variables.push(variable);
        Ok(&self.variables[self.variables.len() - 1])
    }

    fn ensure_value(&mut self, variable: VariableId, scope: &Scope) -> Result<&VariableValue, StoreError> {
        let idx = self.provision_index(variable, scope)?;
        Ok(&self.values[idx])
    }

    fn set_value(
        &mut self,
        variable: VariableId,
        scope: &Scope,
        value: Option<Decimal>,
        expected_revision: Option<u64>,
    ) -> Result<&VariableValue, StoreError> {
        let idx = self.provision_index(variable, scope)?;
        let record = &mut self.values[idx];
        if let Some(expected) = expected_revision {
            if expected != record.revision {
                return Err(StoreError::Conflict {
                    expected,
                    actual: record.revision,
                });
            }
        }
        record.value = value;
        record.revision += 1;
        record.modified_at = Some(Utc::now());
        Ok(&*record)
    }

    fn soft_delete_variable(&mut self, variable: VariableId) -> Result<(), StoreError> {
        self.live_variable(variable)?;
        if let Some(v) = self.variables.iter_mut().find(|v| v.id == variable) {
            v.deleted_at = Some(Utc::now());
        }
        Ok(())
    }

    fn soft_delete_value(&mut self, variable: VariableId, scope: &Scope) -> Result<(), StoreError> {
        let kind = self.live_variable(variable)?.kind;
        let scope = scope.narrow(kind);
        let idx = self
            .value_index(variable, &scope)
            .ok_or_else(|| StoreError::not_found("variable value", format!("{} for {}", variable, scope)))?;
        self.values[idx].deleted_at = Some(Utc::now());
        Ok(())
    }

    fn restore_variable(&mut self, variable: VariableId) -> Result<(), StoreError> {
        let name = match self.variable_by_id(variable) {
            None => return Err(StoreError::not_found("variable", variable)),
            Some(v) if !v.is_deleted() => return Ok(()),
            Some(v) => v.name.clone(),
        };
        if self.variable(&name).is_some() {
            return Err(StoreError::Duplicate(format!("variable '{}'", name)));
        }
        if let Some(v) = self.variables.iter_mut().find(|v| v.id == variable) {
            v.deleted_at = None;
        }
        Ok(())
    }
}
