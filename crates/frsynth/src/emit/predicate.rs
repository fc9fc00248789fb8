//! Attribute predicates (`age > 18`).

use std::fmt;
use std::str::FromStr;

use crate::classifier::{Comparison, format_literal};

/// Errors parsing a [`Predicate`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PredicateError {
    #[error("predicate is empty")]
    Empty,

    #[error("predicate '{0}' has no comparison operator")]
    MissingOperator(String),

    /// Only `>` and `<` are accepted.
    #[error("unsupported operator '{0}', expected '>' or '<'")]
    UnsupportedOperator(String),

    #[error("predicate '{0}' has no attribute name")]
    MissingAttribute(String),

    #[error("cannot parse threshold '{0}' as a number")]
    InvalidThreshold(String),
}

/// `attribute <op> threshold`, declared as a sensitive attribute, a
/// qualification or a fairness target.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub attribute: String,
    pub op: Comparison,
    pub threshold: f64,
}

impl Predicate {
    pub fn new(attribute: impl Into<String>, op: Comparison, threshold: f64) -> Self {
        Self {
            attribute: attribute.into(),
            op,
            threshold,
        }
    }

    /// Parse `"<attribute> <op> <threshold>"` with `op` one of `>` or `<`.
    /// Whitespace around the operator is optional.
    pub fn parse(text: &str) -> Result<Self, PredicateError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(PredicateError::Empty);
        }

        let is_op = |c: char| matches!(c, '<' | '>' | '=' | '!');
        let start = text.find(is_op).ok_or_else(|| PredicateError::MissingOperator(text.to_string()))?;
        let end = text[start..].find(|c: char| !is_op(c)).map_or(text.len(), |len| start + len);

        let op = match &text[start..end] {
            ">" => Comparison::Gt,
            "<" => Comparison::Lt,
            other => return Err(PredicateError::UnsupportedOperator(other.to_string())),
        };
        let attribute = text[..start].trim();
        if attribute.is_empty() {
            return Err(PredicateError::MissingAttribute(text.to_string()));
        }
        let raw = text[end..].trim();
        let threshold: f64 = raw.parse().map_err(|_| PredicateError::InvalidThreshold(raw.to_string()))?;
        if !threshold.is_finite() {
            return Err(PredicateError::InvalidThreshold(raw.to_string()));
        }

        Ok(Self::new(attribute, op, threshold))
    }

    /// Program text with `precision` decimals for the threshold.
    pub fn render(&self, precision: usize) -> String {
        format!("{} {} {}", self.attribute, self.op, format_literal(self.threshold, precision))
    }
}

impl FromStr for Predicate {
    type Err = PredicateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Predicate::parse(s)
    }
}

/// Decimals used by `Display` when the formatter sets no precision.
const DISPLAY_PRECISION: usize = 6;

impl fmt::Display for Predicate {
    /// `{:.N}` selects the threshold's decimals.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let precision = f.precision().unwrap_or(DISPLAY_PRECISION);
        write!(f, "{}", self.render(precision))
    }
}
