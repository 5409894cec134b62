//! Formula, evaluation, store and consistency error types.

use std::path::PathBuf;

use crate::types::VariableId;

/// A formula could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormulaError {
    #[error("syntax error at position {position}: {message}")]
    Syntax {
        /// Byte offset in the normalized expression.
        position: usize,
        message: String,
    },
}

impl FormulaError {
    pub(crate) fn syntax(position: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            position,
            message: message.into(),
        }
    }
}

/// A referenced variable has neither an override nor a default.
///
/// This is a routine, administrator-fixable state, not a bug.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("calculation impossible: variable '{variable}' has no value and no default")]
pub struct CalculationImpossible {
    /// Name of the variable that blocked the computation.
    pub variable: String,
}

impl CalculationImpossible {
    pub fn new(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
        }
    }
}

/// Errors that can occur while evaluating a formula.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    #[error(transparent)]
    Syntax(#[from] FormulaError),

    #[error(transparent)]
    CalculationImpossible(#[from] CalculationImpossible),

    #[error("division by zero")]
    DivisionByZero,

    #[error("arithmetic overflow")]
    Overflow,
}

impl EvalError {
    /// The blocking variable, if evaluation failed for a missing value.
    pub fn missing_variable(&self) -> Option<&str> {
        match self {
            Self::CalculationImpossible(e) => Some(&e.variable),
            _ => None,
        }
    }
}

/// Errors from the variable store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("{entity} {id} is deleted")]
    Deleted { entity: String, id: String },

    #[error("duplicate {0}")]
    Duplicate(String),

    #[error("invalid variable name '{0}'")]
    InvalidName(String),

    /// A value record keyed by a scope its variable's kind never looks up.
    #[error("variable {variable} cannot hold a value for {scope}")]
    ScopeMismatch { variable: VariableId, scope: String },

    #[error("variable ids exhausted")]
    IdsExhausted,

    /// The record changed since the caller read it.
    #[error("revision conflict: expected {expected}, found {actual}")]
    Conflict { expected: u64, actual: u64 },
}

impl StoreError {
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub(crate) fn variable_deleted(id: VariableId) -> Self {
        Self::Deleted {
            entity: "variable".into(),
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

/// A configuration-time consistency violation that blocks saving.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConsistencyError {
    #[error(
        "attribute '{attribute}': choice '{choice}' needs a numeric management title \
         (found '{title}') because the attribute formula uses 'value'"
    )]
    NonNumericManagementTitle {
        attribute: String,
        choice: String,
        title: String,
    },

    #[error("attribute '{attribute}'{}: {source}", choice_suffix(.choice))]
    Syntax {
        attribute: String,
        choice: Option<String>,
        #[source]
        source: FormulaError,
    },

    #[error("attribute '{attribute}'{}: unknown variable '{variable}'", choice_suffix(.choice))]
    UnknownVariable {
        attribute: String,
        choice: Option<String>,
        variable: String,
    },
}

fn choice_suffix(choice: &Option<String>) -> String {
    match choice {
        Some(c) => format!(", choice '{}'", c),
        None => String::new(),
    }
}

/// Errors that can occur while loading or saving catalog files.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("serialize error: {0}")]
    Serialize(String),

    #[error("catalog '{0}' not found")]
    NotFound(String),

    #[error("invalid catalog {}: {source}", .path.display())]
    Invalid {
        path: PathBuf,
        #[source]
        source: StoreError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
