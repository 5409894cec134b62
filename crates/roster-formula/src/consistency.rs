//! Save-time consistency checks for attribute formulas.
//!
//! An attribute's global formula may use the reserved variable `value`,
//! which is bound to the numeric management title of the selected choice.
//! Such an attribute is only consistent if every choice priced by the
//! global formula has a numeric management title.

use std::collections::BTreeSet;
use std::str::FromStr;

use rust_decimal::Decimal;

use crate::error::ConsistencyError;
use crate::parser::ParsedFormula;
use crate::types::{Attribute, Catalog};

/// Reserved variable bound to the selected choice's management title.
pub const CHOICE_VALUE: &str = "value";

/// Parses a management title as a decimal; `,` is accepted as separator.
pub fn parse_management_title(title: &str) -> Option<Decimal> {
    let title = title.trim();
    if title.is_empty() {
        return None;
    }
    Decimal::from_str(&title.replace(',', ".")).ok()
}

/// Collects every consistency violation of one attribute.
pub fn check_attribute(attribute: &Attribute) -> Vec<ConsistencyError> {
    check(attribute, None)
}

/// Returns the first consistency violation of `attribute`, if any.
pub fn validate_attribute(attribute: &Attribute) -> Result<(), ConsistencyError> {
    match check_attribute(attribute).into_iter().next() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Checks all attributes of a catalog, additionally reporting formulas
/// that reference variables the catalog does not define.
pub fn check_catalog(catalog: &Catalog) -> Vec<ConsistencyError> {
    let mut known: BTreeSet<&str> = catalog
        .variables
        .iter()
        .filter(|v| !v.is_deleted())
        .map(|v| v.name.as_str())
        .collect();
    known.insert(CHOICE_VALUE);

    let errors: Vec<_> = catalog
        .attributes
        .iter()
        .flat_map(|attribute| check(attribute, Some(&known)))
        .collect();
    if !errors.is_empty() {
        tracing::warn!(source = %catalog.source, count = errors.len(), "catalog is inconsistent");
    }
    errors
}

fn check(attribute: &Attribute, known: Option<&BTreeSet<&str>>) -> Vec<ConsistencyError> {
    let mut errors = Vec::new();

    let global = match attribute.formula.as_deref().filter(|f| !f.trim().is_empty()) {
        Some(text) => match ParsedFormula::from_input(text) {
            Ok(formula) => {
                unknown_references(attribute, None, &formula, known, &mut errors);
                Some(formula)
            }
            Err(source) => {
                errors.push(ConsistencyError::Syntax {
                    attribute: attribute.name.clone(),
                    choice: None,
                    source,
                });
                None
            }
        },
        None => None,
    };
    let global_uses_value = global.as_ref().is_some_and(|f| f.references(CHOICE_VALUE));

    for choice in &attribute.choices {
        let own = choice.formula.as_deref().filter(|f| !f.trim().is_empty());
        match own {
            Some(text) => match ParsedFormula::from_input(text) {
                Ok(formula) => {
                    unknown_references(attribute, Some(choice.id.as_str()), &formula, known, &mut errors);
                }
                Err(source) => errors.push(ConsistencyError::Syntax {
                    attribute: attribute.name.clone(),
                    choice: Some(choice.id.to_string()),
                    source,
                }),
            },
            None if global_uses_value && parse_management_title(&choice.management_title).is_none() => {
                errors.push(ConsistencyError::NonNumericManagementTitle {
                    attribute: attribute.name.clone(),
                    choice: choice.id.to_string(),
                    title: choice.management_title.clone(),
                });
            }
            None => {}
        }
    }

    for err in &errors {
        tracing::debug!(attribute = %attribute.name, error = %err, "consistency violation");
    }
    errors
}

fn unknown_references(
    attribute: &Attribute,
    choice: Option<&str>,
    formula: &ParsedFormula,
    known: Option<&BTreeSet<&str>>,
    errors: &mut Vec<ConsistencyError>,
) {
    let Some(known) = known else { return };
    for name in formula.variables() {
        if !known.contains(name.as_str()) {
            errors.push(ConsistencyError::UnknownVariable {
                attribute: attribute.name.clone(),
                choice: choice.map(str::to_string),
                variable: name.clone(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChoiceOption, Variable};
    use pretty_assertions::assert_eq;

    fn option(id: &str, management_title: &str, formula: Option<&str>) -> ChoiceOption {
        ChoiceOption {
            id: id.into(),
            title: id.to_uppercase(),
            management_title: management_title.into(),
            formula: formula.map(str::to_string),
        }
    }

    fn room(formula: Option<&str>, choices: Vec<ChoiceOption>) -> Attribute {
        Attribute {
            name: "room".into(),
            formula: formula.map(str::to_string),
            choices,
        }
    }

    #[test]
    fn management_titles() {
        assert_eq!(parse_management_title("40"), Some(Decimal::from(40)));
        assert_eq!(parse_management_title(" 12,5 "), Decimal::from_str("12.5").ok());
        assert_eq!(parse_management_title("single"), None);
        assert_eq!(parse_management_title(""), None);
    }

    #[test]
    fn value_requires_numeric_titles() {
        let attr = room(
            Some("value * nights"),
            vec![option("single", "40", None), option("tent", "camping", None)],
        );
        assert_eq!(
            validate_attribute(&attr),
            Err(ConsistencyError::NonNumericManagementTitle {
                attribute: "room".into(),
                choice: "tent".into(),
                title: "camping".into(),
            })
        );
    }

    #[test]
    fn own_formula_exempts_choice() {
        let attr = room(
            Some("value * nights"),
            vec![option("single", "40", None), option("tent", "camping", Some("tent_fee"))],
        );
        assert_eq!(validate_attribute(&attr), Ok(()));
    }

    #[test]
    fn titles_irrelevant_without_value() {
        let attr = room(Some("nights * 10"), vec![option("tent", "camping", None)]);
        assert!(check_attribute(&attr).is_empty());
    }

    #[test]
    fn reports_syntax_errors_per_formula() {
        let attr = room(Some("(1 +"), vec![option("a", "", Some("2 **")), option("b", "", None)]);
        let errors = check_attribute(&attr);
        assert_eq!(errors.len(), 2);
        assert!(matches!(&errors[0], ConsistencyError::Syntax { choice: None, .. }));
        assert!(matches!(&errors[1], ConsistencyError::Syntax { choice: Some(c), .. } if c == "a"));
    }

    #[test]
    fn catalog_check_reports_unknown_variables() {
        let catalog = Catalog {
            variables: vec![Variable::new(1, "nights")],
            attributes: vec![room(
                Some("value * nights"),
                vec![option("single", "40", None), option("tent", "x", Some("tent_fee"))],
            )],
            ..Default::default()
        };
        assert_eq!(
            check_catalog(&catalog),
            vec![ConsistencyError::UnknownVariable {
                attribute: "room".into(),
                choice: Some("tent".into()),
                variable: "tent_fee".into(),
            }]
        );
    }

    #[test]
    fn error_messages_name_the_choice() {
        let err = ConsistencyError::UnknownVariable {
            attribute: "room".into(),
            choice: Some("tent".into()),
            variable: "fee".into(),
        };
        assert_eq!(err.to_string(), "attribute 'room', choice 'tent': unknown variable 'fee'");
    }
}
