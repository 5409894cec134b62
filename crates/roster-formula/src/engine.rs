//! Evaluate formulas and compute price breakdowns.

use std::collections::HashMap;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::consistency::{CHOICE_VALUE, parse_management_title};
use crate::error::{CalculationImpossible, EvalError, FormulaError};
use crate::parser::{BinOp, Expr, ParsedFormula};
use crate::resolve::{Environment, VariableSnapshot, VariableSource};
use crate::types::{Attribute, ChoiceId, EventId, Scope};

/// How the final result is rounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rounding {
    /// Midpoint away from zero (commercial rounding).
    #[default]
    HalfUp,
    /// Midpoint to even (banker's rounding).
    HalfEven,
    /// Drop extra digits.
    Truncate,
}

impl Rounding {
    fn strategy(self) -> RoundingStrategy {
        match self {
            Rounding::HalfUp => RoundingStrategy::MidpointAwayFromZero,
            Rounding::HalfEven => RoundingStrategy::MidpointNearestEven,
            Rounding::Truncate => RoundingStrategy::ToZero,
        }
    }
}

/// Evaluation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalOptions {
    /// Decimal places of the result; applied once, after evaluation.
    pub decimal_places: u32,
    pub rounding: Rounding,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            decimal_places: 2,
            rounding: Rounding::HalfUp,
        }
    }
}

impl EvalOptions {
    pub fn round(&self, value: Decimal) -> Decimal {
        value.round_dp_with_strategy(self.decimal_places, self.rounding.strategy())
    }
}

/// Evaluates a parsed formula with default options.
pub fn evaluate(formula: &ParsedFormula, env: &impl Environment) -> Result<Decimal, EvalError> {
    evaluate_with(formula, env, &EvalOptions::default())
}

/// Evaluates a parsed formula.
///
/// Every referenced variable is resolved first, in name order; the first
/// one without a value aborts evaluation with
/// [`EvalError::CalculationImpossible`].
pub fn evaluate_with(
    formula: &ParsedFormula,
    env: &impl Environment,
    options: &EvalOptions,
) -> Result<Decimal, EvalError> {
    let mut values = HashMap::with_capacity(formula.variables().len());
    for name in formula.variables() {
        values.insert(name.as_str(), env.lookup(name)?);
    }
    let raw = eval_expr(formula.expr(), &values)?;
    Ok(options.round(raw))
}

/// Normalizes, parses and evaluates `expression` against `snapshot`.
pub fn evaluate_formula(expression: &str, snapshot: &VariableSnapshot) -> Result<Decimal, EvalError> {
    let formula = ParsedFormula::from_input(expression)?;
    evaluate(&formula, snapshot)
}

fn eval_expr(expr: &Expr, values: &HashMap<&str, Decimal>) -> Result<Decimal, EvalError> {
    match expr {
        Expr::Number(n) => Ok(*n),
        // Every referenced name was resolved up front.
        Expr::Variable(name) => values
            .get(name.as_str())
            .copied()
            .ok_or_else(|| CalculationImpossible::new(name).into()),
        Expr::Neg(inner) => Ok(-eval_expr(inner, values)?),
        Expr::Binary { op, lhs, rhs } => {
            let l = eval_expr(lhs, values)?;
            let r = eval_expr(rhs, values)?;
            let result = match op {
                BinOp::Add => l.checked_add(r),
                BinOp::Sub => l.checked_sub(r),
                BinOp::Mul => l.checked_mul(r),
                BinOp::Div => {
                    if r.is_zero() {
                        return Err(EvalError::DivisionByZero);
                    }
                    l.checked_div(r)
                }
            };
            result.ok_or(EvalError::Overflow)
        }
    }
}

// ---------------------------------------------------------------------------
// Price breakdown
// ---------------------------------------------------------------------------

/// A participant's pick for one attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub attribute: String,
    pub choice: ChoiceId,
}

impl Selection {
    pub fn new(attribute: impl Into<String>, choice: impl Into<ChoiceId>) -> Self {
        Self {
            attribute: attribute.into(),
            choice: choice.into(),
        }
    }
}

/// One priced component of a participation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceSummand {
    pub attribute: String,
    pub choice: ChoiceId,
    /// The formula that produced the amount, in dot notation.
    pub formula: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PriceBreakdown {
    pub summands: Vec<PriceSummand>,
    pub total: Decimal,
}

/// Errors that can occur while pricing a participation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PriceError {
    #[error("unknown attribute '{0}'")]
    UnknownAttribute(String),

    #[error("attribute '{attribute}' has no choice '{choice}'")]
    UnknownChoice { attribute: String, choice: String },

    #[error("attribute '{attribute}', choice '{choice}': {source}")]
    Formula {
        attribute: String,
        choice: String,
        #[source]
        source: FormulaError,
    },

    #[error("attribute '{attribute}', choice '{choice}': {source}")]
    Evaluation {
        attribute: String,
        choice: String,
        #[source]
        source: EvalError,
    },

    #[error("price total overflows")]
    Overflow,
}

impl PriceError {
    /// The variable that blocked the computation, if any.
    pub fn missing_variable(&self) -> Option<&str> {
        match self {
            Self::Evaluation { source, .. } => source.missing_variable(),
            _ => None,
        }
    }
}

/// Prices the selected choices of a participant for `event`.
///
/// Each selection is evaluated against a snapshot taken for its own
/// choice scope. A numeric management title of the selected choice is
/// exposed as the context variable `value`. Selections whose choice has
/// no formula contribute nothing. The first failure aborts.
pub fn price_breakdown(
    attributes: &[Attribute],
    source: &impl VariableSource,
    event: &EventId,
    selections: &[Selection],
    options: &EvalOptions,
) -> Result<PriceBreakdown, PriceError> {
    let mut breakdown = PriceBreakdown::default();

    for selection in selections {
        let attribute = attributes
            .iter()
            .find(|a| a.name == selection.attribute)
            .ok_or_else(|| PriceError::UnknownAttribute(selection.attribute.clone()))?;
        let choice = attribute
            .choice(&selection.choice)
            .ok_or_else(|| PriceError::UnknownChoice {
                attribute: attribute.name.clone(),
                choice: selection.choice.to_string(),
            })?;

        let Some(expression) = attribute.formula_for(choice) else {
            tracing::debug!(attribute = %attribute.name, choice = %choice.id, "no formula, skipping");
            continue;
        };

        let formula = ParsedFormula::from_input(expression).map_err(|source| PriceError::Formula {
            attribute: attribute.name.clone(),
            choice: choice.id.to_string(),
            source,
        })?;

        let scope = Scope::choice(event.clone(), choice.id.clone());
        let mut snapshot = VariableSnapshot::capture(source, &scope);
        if let Some(value) = parse_management_title(&choice.management_title) {
            snapshot = snapshot.with_context(CHOICE_VALUE, value);
        }

        let amount = evaluate_with(&formula, &snapshot, options).map_err(|source| PriceError::Evaluation {
            attribute: attribute.name.clone(),
            choice: choice.id.to_string(),
            source,
        })?;

        breakdown.summands.push(PriceSummand {
            attribute: attribute.name.clone(),
            choice: choice.id.clone(),
            formula: formula.source().to_string(),
            amount,
        });
    }

    let total = breakdown
        .summands
        .iter()
        .try_fold(Decimal::ZERO, |acc, s| acc.checked_add(s.amount))
        .ok_or(PriceError::Overflow)?;
    breakdown.total = options.round(total);
    Ok(breakdown)
}
