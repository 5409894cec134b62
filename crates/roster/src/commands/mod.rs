//! Command handlers, one module per top-level subcommand.

pub mod flags;
pub mod formula;
pub mod init;
pub mod price;
pub mod variable;
pub mod version;

use anyhow::{Context, Result, bail};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Parses a decimal argument; `,` is accepted as separator.
pub(crate) fn parse_decimal(input: &str) -> Result<Decimal> {
    let normalized = roster_formula::normalize_input(input);
    Decimal::from_str(&normalized).with_context(|| format!("invalid number '{}'", input))
}

/// Splits a `key=value` argument; `shape` names the expected form.
pub(crate) fn split_pair<'a>(arg: &'a str, shape: &str) -> Result<(&'a str, &'a str)> {
    match arg.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim(), value.trim())),
        _ => bail!("invalid argument '{}': expected {}", arg, shape),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimals_accept_comma() {
        assert_eq!(parse_decimal("12,5").unwrap(), Decimal::new(125, 1));
        assert_eq!(parse_decimal("-3").unwrap(), Decimal::from(-3));
        assert!(parse_decimal("abc").is_err());
    }

    #[test]
    fn pairs() {
        assert_eq!(split_pair("room=single", "ATTRIBUTE=CHOICE").unwrap(), ("room", "single"));
        assert_eq!(split_pair("a = 1", "NAME=VALUE").unwrap(), ("a", "1"));
        assert!(split_pair("room", "ATTRIBUTE=CHOICE").is_err());
        assert!(split_pair("=x", "ATTRIBUTE=CHOICE").is_err());
    }
}
