//! Symbolic rule trees produced by classifier extraction.

use std::fmt;

// =============================================================================
// Expressions
// =============================================================================

/// Binary arithmetic operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Pow => "**",
        }
    }
}

/// Arithmetic expression over named variables.
///
/// Rendering is purely textual: operands are printed left to right and only
/// [`Expr::Paren`] introduces parentheses, so builders decide grouping.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Var(String),
    /// Real literal, printed with fixed decimals.
    Const(f64),
    /// Integer literal (class indices, clamping bounds).
    Int(i64),
    /// Euler's number, printed in full.
    E,
    Neg(Box<Expr>),
    Paren(Box<Expr>),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl Expr {
    pub fn var(name: impl Into<String>) -> Self {
        Expr::Var(name.into())
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn paren(inner: Expr) -> Self {
        Expr::Paren(Box::new(inner))
    }

    pub fn neg(inner: Expr) -> Self {
        Expr::Neg(Box::new(inner))
    }

    /// `terms[0] + terms[1] + ...`, or `0` when there are no terms.
    pub fn sum(terms: impl IntoIterator<Item = Expr>) -> Self {
        terms
            .into_iter()
            .reduce(|acc, term| Expr::binary(BinaryOp::Add, acc, term))
            .unwrap_or(Expr::Int(0))
    }

    /// `x_0 * w_0 + x_1 * w_1 + ...`
    pub fn weighted_sum<'a>(names: impl IntoIterator<Item = &'a str>, weights: impl IntoIterator<Item = f64>) -> Self {
        Expr::sum(
            names
                .into_iter()
                .zip(weights)
                .map(|(name, w)| Expr::binary(BinaryOp::Mul, Expr::var(name), Expr::Const(w))),
        )
    }

    /// Render with `precision` decimals for real literals.
    pub fn render(&self, precision: usize) -> String {
        let mut out = String::new();
        self.render_into(&mut out, precision);
        out
    }

    fn render_into(&self, out: &mut String, precision: usize) {
        match self {
            Expr::Var(name) => out.push_str(name),
            Expr::Const(value) => out.push_str(&format_literal(*value, precision)),
            Expr::Int(value) => out.push_str(&value.to_string()),
            Expr::E => out.push_str(&std::f64::consts::E.to_string()),
            Expr::Neg(inner) => {
                out.push('-');
                inner.render_into(out, precision);
            }
            Expr::Paren(inner) => {
                out.push('(');
                inner.render_into(out, precision);
                out.push(')');
            }
            Expr::Binary { op, lhs, rhs } => {
                lhs.render_into(out, precision);
                out.push(' ');
                out.push_str(op.symbol());
                out.push(' ');
                rhs.render_into(out, precision);
            }
        }
    }
}

/// Fixed-decimal literal; negative zero prints as zero.
pub fn format_literal(value: f64, precision: usize) -> String {
    let text = format!("{value:.precision$}");
    if text.starts_with('-') && text[1..].chars().all(|c| c == '0' || c == '.') {
        text[1..].to_string()
    } else {
        text
    }
}

// =============================================================================
// Conditions
// =============================================================================

/// Comparison operator of a condition or predicate. The prover's
/// declarations only accept strict comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Gt,
    Lt,
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Comparison::Gt => ">",
            Comparison::Lt => "<",
        })
    }
}

/// `lhs <op> rhs`.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub lhs: Expr,
    pub op: Comparison,
    pub rhs: Expr,
}

impl Condition {
    pub fn new(lhs: Expr, op: Comparison, rhs: Expr) -> Self {
        Self { lhs, op, rhs }
    }

    pub fn render(&self, precision: usize) -> String {
        format!("{} {} {}", self.lhs.render(precision), self.op, self.rhs.render(precision))
    }
}

// =============================================================================
// Rules
// =============================================================================

/// Straight-line or branching procedure.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleNode {
    /// `target = class`.
    Leaf { target: String, class: usize },
    /// `if condition: then_branch [else: else_branch]`.
    Branch {
        condition: Condition,
        then_branch: Box<RuleNode>,
        else_branch: Option<Box<RuleNode>>,
    },
    Sequence(Vec<Statement>),
}

impl RuleNode {
    /// Append `other` after `self`, flattening sequences.
    pub fn then(self, other: RuleNode) -> RuleNode {
        let mut statements = self.into_statements();
        statements.extend(other.into_statements());
        RuleNode::Sequence(statements)
    }

    fn into_statements(self) -> Vec<Statement> {
        match self {
            RuleNode::Sequence(statements) => statements,
            other => vec![Statement::Rule(other)],
        }
    }

    /// Number of `Branch` nodes, including those nested in statements.
    pub fn n_branches(&self) -> usize {
        match self {
            RuleNode::Leaf { .. } => 0,
            RuleNode::Branch {
                then_branch,
                else_branch,
                ..
            } => 1 + then_branch.n_branches() + else_branch.as_ref().map_or(0, |e| e.n_branches()),
            RuleNode::Sequence(statements) => statements
                .iter()
                .map(|s| match s {
                    Statement::Rule(rule) => rule.n_branches(),
                    Statement::Assign { .. } => 0,
                })
                .sum(),
        }
    }
}

/// One line (or nested block) of a [`RuleNode::Sequence`].
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Assign { name: String, expr: Expr },
    Rule(RuleNode),
}

impl Statement {
    pub fn assign(name: impl Into<String>, expr: Expr) -> Self {
        Statement::Assign {
            name: name.into(),
            expr,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weighted_sum_renders_left_to_right() {
        let expr = Expr::weighted_sum(["f0", "f1", "f2"], [1.0, -2.0, 0.5]);
        assert_eq!(expr.render(4), "f0 * 1.0000 + f1 * -2.0000 + f2 * 0.5000");
        assert_eq!(Expr::sum(Vec::new()).render(4), "0");
    }

    #[test]
    fn sigmoid_shape() {
        let name = "hidden_0_0";
        let expr = Expr::binary(
            BinaryOp::Div,
            Expr::Int(1),
            Expr::paren(Expr::binary(
                BinaryOp::Add,
                Expr::Int(1),
                Expr::binary(BinaryOp::Pow, Expr::E, Expr::neg(Expr::var(name))),
            )),
        );
        assert_eq!(expr.render(4), "1 / (1 + 2.718281828459045 ** -hidden_0_0)");
    }

    #[test]
    fn negative_zero_is_normalized() {
        assert_eq!(format_literal(-0.00001, 4), "0.0000");
        assert_eq!(format_literal(-0.5, 2), "-0.50");
        assert_eq!(format_literal(3.0, 6), "3.000000");
    }

    #[test]
    fn sequences_flatten_on_concatenation() {
        let a = RuleNode::Sequence(vec![Statement::assign("x", Expr::Int(1))]);
        let b = RuleNode::Leaf {
            target: "y".into(),
            class: 0,
        };
        let joined = a.then(b);
        let RuleNode::Sequence(statements) = &joined else {
            panic!("expected sequence");
        };
        assert_eq!(statements.len(), 2);
        assert!(matches!(statements[1], Statement::Rule(RuleNode::Leaf { .. })));
        assert_eq!(joined.n_branches(), 0);
    }

    #[test]
    fn condition_renders_operator() {
        let cond = Condition::new(Expr::var("age"), Comparison::Gt, Expr::Const(18.0));
        assert_eq!(cond.render(1), "age > 18.0");
        assert_eq!(Comparison::Lt.to_string(), "<");
    }
}
