//! Formula data model: variables, scoped values, attributes and choice
//! options, and the catalog document that holds them.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Stable numeric identity of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableId(pub u64);

impl fmt::Display for VariableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

string_id! {
    /// Identifier of an event.
    EventId
}

string_id! {
    /// Identifier of a choice option of an attribute.
    ChoiceId
}

// ---------------------------------------------------------------------------
// Scope
// ---------------------------------------------------------------------------

/// Which scope a variable's override values are keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeKind {
    /// One value per event.
    #[default]
    Event,
    /// One value per event and choice option.
    Choice,
}

/// The context an override value applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Scope {
    pub event: EventId,
    pub choice: Option<ChoiceId>,
}

impl Scope {
    pub fn event(event: impl Into<EventId>) -> Self {
        Self {
            event: event.into(),
            choice: None,
        }
    }

    pub fn choice(event: impl Into<EventId>, choice: impl Into<ChoiceId>) -> Self {
        Self {
            event: event.into(),
            choice: Some(choice.into()),
        }
    }

    /// The scope a variable of `kind` is looked up under.
    ///
    /// Event variables ignore the choice; choice variables keep it.
    pub fn narrow(&self, kind: ScopeKind) -> Scope {
        match kind {
            ScopeKind::Event => Scope::event(self.event.clone()),
            ScopeKind::Choice => self.clone(),
        }
    }

    /// Whether a value stored under this scope is reachable for a
    /// variable of `kind`.
    pub fn fits(&self, kind: ScopeKind) -> bool {
        match kind {
            ScopeKind::Event => self.choice.is_none(),
            ScopeKind::Choice => self.choice.is_some(),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.choice {
            Some(choice) => write!(f, "event {} / choice {}", self.event, choice),
            None => write!(f, "event {}", self.event),
        }
    }
}

// ---------------------------------------------------------------------------
// Variables
// ---------------------------------------------------------------------------

/// A named quantity that formulas can reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub id: VariableId,

    /// Identifier used inside formulas.
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    #[serde(default)]
    pub kind: ScopeKind,

    /// Fallback when no override exists for a scope.
    #[serde(default, rename = "default", skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Decimal>,

    /// Soft-delete marker; deleted variables stay for history.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Variable {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id: VariableId(id),
            name: name.into(),
            description: String::new(),
            kind: ScopeKind::Event,
            default_value: None,
            deleted_at: None,
        }
    }

    pub fn with_default(mut self, default: Decimal) -> Self {
        self.default_value = Some(default);
        self
    }

    pub fn with_kind(mut self, kind: ScopeKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// An override of a variable for one scope.
///
/// `value == None` is a provisioned shell: the scope falls through to the
/// variable's default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableValue {
    pub variable: VariableId,
    pub event: EventId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choice: Option<ChoiceId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Decimal>,

    /// Incremented on every write; used for optimistic concurrency.
    #[serde(default)]
    pub revision: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl VariableValue {
    /// An empty value shell for `scope`.
    pub fn shell(variable: VariableId, scope: &Scope) -> Self {
        Self {
            variable,
            event: scope.event.clone(),
            choice: scope.choice.clone(),
            value: None,
            revision: 0,
            modified_at: Some(Utc::now()),
            deleted_at: None,
        }
    }

    pub fn scope(&self) -> Scope {
        Scope {
            event: self.event.clone(),
            choice: self.choice.clone(),
        }
    }

    pub fn matches(&self, variable: VariableId, scope: &Scope) -> bool {
        self.variable == variable && self.event == scope.event && self.choice == scope.choice
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

// ---------------------------------------------------------------------------
// Attributes
// ---------------------------------------------------------------------------

/// One selectable option of an attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub id: ChoiceId,

    /// Label shown to participants.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,

    /// Internal description used by administrators; numeric titles feed the
    /// reserved `value` variable of the attribute formula.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub management_title: String,

    /// Option-specific formula, taking precedence over the attribute formula.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
}

/// A form field whose selected choice contributes a price summand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,

    /// Global formula applied to choices without their own formula.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,

    #[serde(default)]
    pub choices: Vec<ChoiceOption>,
}

impl Attribute {
    pub fn choice(&self, id: &ChoiceId) -> Option<&ChoiceOption> {
        self.choices.iter().find(|c| &c.id == id)
    }

    /// The formula that prices `choice`: its own, else the global one.
    pub fn formula_for<'a>(&'a self, choice: &'a ChoiceOption) -> Option<&'a str> {
        choice
            .formula
            .as_deref()
            .filter(|f| !f.trim().is_empty())
            .or_else(|| self.formula.as_deref().filter(|f| !f.trim().is_empty()))
    }
}

// ---------------------------------------------------------------------------
// Catalog document
// ---------------------------------------------------------------------------

/// Root structure of `.catalog.toml` / `.catalog.json` files.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<Variable>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<VariableValue>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<Attribute>,

    /// Where this catalog was loaded from (set by the loader).
    #[serde(skip)]
    pub source: String,
}

impl Catalog {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn event_scope_drops_choice_for_event_variables() {
        let scope = Scope::choice("E1", "c1");
        assert_eq!(scope.narrow(ScopeKind::Event), Scope::event("E1"));
        assert_eq!(scope.narrow(ScopeKind::Choice), scope);
    }

    #[test]
    fn scope_fits_kind() {
        assert!(Scope::event("E1").fits(ScopeKind::Event));
        assert!(!Scope::event("E1").fits(ScopeKind::Choice));
        assert!(Scope::choice("E1", "c1").fits(ScopeKind::Choice));
        assert!(!Scope::choice("E1", "c1").fits(ScopeKind::Event));
    }

    #[test]
    fn choice_formula_wins_over_global() {
        let attr = Attribute {
            name: "room".into(),
            formula: Some("value * nights".into()),
            choices: vec![
                ChoiceOption {
                    id: "single".into(),
                    title: "Single room".into(),
                    management_title: "40".into(),
                    formula: Some("surcharge".into()),
                },
                ChoiceOption {
                    id: "double".into(),
                    title: "Double room".into(),
                    management_title: "30".into(),
                    formula: Some("  ".into()),
                },
            ],
        };
        let single = attr.choice(&"single".into()).unwrap();
        let double = attr.choice(&"double".into()).unwrap();
        assert_eq!(attr.formula_for(single), Some("surcharge"));
        assert_eq!(attr.formula_for(double), Some("value * nights"));
    }

    #[test]
    fn value_shell_has_no_value() {
        let v = VariableValue::shell(VariableId(3), &Scope::choice("E1", "c"));
        assert!(v.value.is_none());
        assert!(v.matches(VariableId(3), &Scope::choice("E1", "c")));
        assert!(!v.matches(VariableId(3), &Scope::event("E1")));
    }
}
