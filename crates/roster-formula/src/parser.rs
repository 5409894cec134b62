//! Recursive-descent parser producing a formula AST.
//!
//! Grammar:
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary)*
//! unary   := '-' unary | primary
//! primary := NUMBER | IDENT | '(' expr ')'
//! ```

use std::collections::BTreeSet;

use rust_decimal::Decimal;

use crate::error::FormulaError;
use crate::lexer::{Spanned, Token, tokenize};

// ---------------------------------------------------------------------------
// Decimal separator handling
// ---------------------------------------------------------------------------

/// Converts user input to the internal dot notation (`,` → `.`).
pub fn normalize_input(expression: &str) -> String {
    expression.trim().replace(',', ".")
}

/// Converts an internal expression back to the comma notation shown to
/// users (`.` → `,`).
pub fn display_expression(expression: &str) -> String {
    expression.replace('.', ",")
}

// ---------------------------------------------------------------------------
// AST
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Number(Decimal),
    Variable(String),
    Neg(Box<Expr>),
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl Expr {
    fn collect_variables(&self, out: &mut BTreeSet<String>) {
        match self {
            Expr::Number(_) => {}
            Expr::Variable(name) => {
                out.insert(name.clone());
            }
            Expr::Neg(inner) => inner.collect_variables(out),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.collect_variables(out);
                rhs.collect_variables(out);
            }
        }
    }
}

/// A parsed formula with the set of variables it references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFormula {
    source: String,
    expr: Expr,
    variables: BTreeSet<String>,
}

impl ParsedFormula {
    /// Normalizes user input and parses it.
    pub fn from_input(input: &str) -> Result<Self, FormulaError> {
        parse(&normalize_input(input))
    }

    /// The expression in dot notation.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The expression in comma notation, for redisplay.
    pub fn display(&self) -> String {
        display_expression(&self.source)
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Referenced variable names, sorted.
    pub fn variables(&self) -> &BTreeSet<String> {
        &self.variables
    }

    pub fn references(&self, name: &str) -> bool {
        self.variables.contains(name)
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Parses an expression in dot notation.
///
/// # Errors
///
/// Returns [`FormulaError::Syntax`] for empty input, invalid characters,
/// unbalanced parentheses, missing operands and trailing input.
pub fn parse(expression: &str) -> Result<ParsedFormula, FormulaError> {
    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return Err(FormulaError::syntax(0, "empty expression"));
    }

    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        end: expression.len(),
    };
    let expr = parser.expr()?;
    if let Some(extra) = parser.peek() {
        let message = match extra.token {
            Token::RParen => "unbalanced ')'".to_string(),
            ref t => format!("unexpected {} after complete expression", t.describe()),
        };
        return Err(FormulaError::syntax(extra.position, message));
    }

    let mut variables = BTreeSet::new();
    expr.collect_variables(&mut variables);

    Ok(ParsedFormula {
        source: expression.trim().to_string(),
        expr,
        variables,
    })
}

struct Parser<'a> {
    tokens: &'a [Spanned],
    pos: usize,
    end: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Spanned> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&'a Spanned> {
        let t = self.tokens.get(self.pos);
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek().is_some_and(|s| &s.token == token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expr(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.term()?;
        loop {
            let op = if self.eat(&Token::Plus) {
                BinOp::Add
            } else if self.eat(&Token::Minus) {
                BinOp::Sub
            } else {
                return Ok(lhs);
            };
            let rhs = self.term()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
    }

    fn term(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.unary()?;
        loop {
            let op = if self.eat(&Token::Star) {
                BinOp::Mul
            } else if self.eat(&Token::Slash) {
                BinOp::Div
            } else {
                return Ok(lhs);
            };
            let rhs = self.unary()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
    }

    fn unary(&mut self) -> Result<Expr, FormulaError> {
        if self.eat(&Token::Minus) {
            let inner = self.unary()?;
            return Ok(Expr::Neg(Box::new(inner)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, FormulaError> {
        let Some(spanned) = self.next() else {
            return Err(FormulaError::syntax(self.end, "unexpected end of expression"));
        };
        match &spanned.token {
            Token::Number(n) => Ok(Expr::Number(*n)),
            Token::Ident(name) => Ok(Expr::Variable(name.clone())),
            Token::LParen => {
                let inner = self.expr()?;
                if self.eat(&Token::RParen) {
                    Ok(inner)
                } else {
                    Err(FormulaError::syntax(
                        self.peek().map_or(self.end, |s| s.position),
                        format!("unbalanced '(' opened at position {}", spanned.position),
                    ))
                }
            }
            other => Err(FormulaError::syntax(
                spanned.position,
                format!("expected a number, variable or '(' but found {}", other.describe()),
            )),
        }
    }
}
