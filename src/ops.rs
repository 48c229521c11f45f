//! [`Expression`] operations.

use crate::{
    expr::{BinaryOperation, Expression, Node, NodeKind},
    visit::postvisit,
};
use smol_str::SmolStr;
use std::{
    collections::HashMap,
    convert::Infallible,
    error::Error,
    fmt::{self, Display, Formatter},
};

/// A single differentiation rule.
///
/// A rule receives the node being differentiated, the derivatives of its
/// operands in left-to-right order, and the name of the variable the
/// derivative is taken with respect to. The node's original operands stay
/// reachable through the node itself, so rules like the product rule can
/// mix differentiated and un-differentiated operands.
pub type Rule = fn(&Expression, &[Expression], &str) -> Expression;

#[derive(Debug, Clone, PartialEq)]
pub enum DifferentiationError {
    /// The expression contains a node kind with no registered rule.
    UnsupportedNode { kind: NodeKind },
}

impl Display for DifferentiationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            DifferentiationError::UnsupportedNode { kind } => {
                write!(f, "no rule to differentiate {:?} nodes", kind)
            },
        }
    }
}

impl Error for DifferentiationError {}

/// A table of differentiation rules keyed by node kind.
///
/// The table is open: callers can register rules for new node kinds, or
/// swap out the stock ones, without touching this module. The price of
/// that openness is that hitting a node whose kind has no entry is a
/// runtime error rather than a compile-time one.
#[derive(Debug, Clone)]
pub struct Differentiator {
    rules: HashMap<NodeKind, Rule>,
}

impl Differentiator {
    /// A table holding the standard rules for constants, variables, and
    /// the five arithmetic operators.
    pub fn new() -> Self {
        Differentiator::empty()
            .with_rule(NodeKind::Constant, constant_rule)
            .with_rule(NodeKind::Variable, variable_rule)
            .with_rule(NodeKind::Operator(BinaryOperation::Plus), sum_rule)
            .with_rule(
                NodeKind::Operator(BinaryOperation::Minus),
                difference_rule,
            )
            .with_rule(
                NodeKind::Operator(BinaryOperation::Times),
                product_rule,
            )
            .with_rule(
                NodeKind::Operator(BinaryOperation::Divide),
                quotient_rule,
            )
            .with_rule(NodeKind::Operator(BinaryOperation::Power), power_rule)
    }

    /// A table with no rules in it at all.
    pub fn empty() -> Self {
        Differentiator {
            rules: HashMap::new(),
        }
    }

    pub fn with_rule(mut self, kind: NodeKind, rule: Rule) -> Self {
        self.register(kind, rule);
        self
    }

    /// Register the rule used for a node kind, replacing any existing
    /// entry.
    pub fn register(&mut self, kind: NodeKind, rule: Rule) {
        self.rules.insert(kind, rule);
    }

    /// Differentiate an expression with respect to the variable called
    /// `var`, building a brand new expression.
    ///
    /// The result is left exactly as the rules produced it; nothing is
    /// folded or simplified, so terms like `x + 0` appear verbatim.
    pub fn differentiate(
        &self,
        expr: &Expression,
        var: &str,
    ) -> Result<Expression, DifferentiationError> {
        postvisit(
            expr,
            |node, operands: &[Expression], var: &str| {
                match self.rules.get(&node.kind()) {
                    Some(rule) => Ok(rule(node, operands, var)),
                    None => Err(DifferentiationError::UnsupportedNode {
                        kind: node.kind(),
                    }),
                }
            },
            var,
        )
    }
}

impl Default for Differentiator {
    fn default() -> Self { Differentiator::new() }
}

/// Differentiate an expression with respect to a variable, using the
/// standard rule table.
pub fn differentiate(
    expr: &Expression,
    var: &str,
) -> Result<Expression, DifferentiationError> {
    Differentiator::new().differentiate(expr, var)
}

fn constant_rule(
    _expr: &Expression,
    _operands: &[Expression],
    _var: &str,
) -> Expression {
    Expression::from(0.0)
}

fn variable_rule(
    expr: &Expression,
    _operands: &[Expression],
    var: &str,
) -> Expression {
    match expr.node() {
        Node::Variable(name) if name.as_str() == var => Expression::from(1.0),
        _ => Expression::from(0.0),
    }
}

fn sum_rule(
    _expr: &Expression,
    operands: &[Expression],
    _var: &str,
) -> Expression {
    operands[0].clone() + operands[1].clone()
}

fn difference_rule(
    _expr: &Expression,
    operands: &[Expression],
    _var: &str,
) -> Expression {
    operands[0].clone() - operands[1].clone()
}

fn product_rule(
    expr: &Expression,
    operands: &[Expression],
    _var: &str,
) -> Expression {
    let (a, b) = binary_operands(expr);

    operands[0].clone() * b.clone() + operands[1].clone() * a.clone()
}

fn quotient_rule(
    expr: &Expression,
    operands: &[Expression],
    _var: &str,
) -> Expression {
    let (a, b) = binary_operands(expr);
    let numerator =
        operands[0].clone() * b.clone() - a.clone() * operands[1].clone();

    numerator / b.clone().pow(2.0)
}

/// The exponent is taken to be free of the target variable.
/// Differentiating an expression whose exponent mentions it will quietly
/// come out wrong.
fn power_rule(
    expr: &Expression,
    operands: &[Expression],
    _var: &str,
) -> Expression {
    let (base, exponent) = binary_operands(expr);

    exponent.clone()
        * base.clone().pow(exponent.clone() - 1.0)
        * operands[0].clone()
}

fn binary_operands(expr: &Expression) -> (&Expression, &Expression) {
    match expr.node() {
        Node::Binary { left, right, .. } => (left, right),
        _ => unreachable!("the rule was registered for an operator kind"),
    }
}

/// Every variable name mentioned in the expression, sorted and
/// deduplicated. Shared subexpressions are scanned once.
pub fn variables(expr: &Expression) -> Vec<SmolStr> {
    let collected: Result<Vec<SmolStr>, Infallible> = postvisit(
        expr,
        |node, operands: &[Vec<SmolStr>], _: &()| {
            let mut names: Vec<SmolStr> =
                operands.iter().flatten().cloned().collect();

            if let Node::Variable(name) = node.node() {
                names.push(name.clone());
            }

            Ok(names)
        },
        &(),
    );

    let mut names = match collected {
        Ok(names) => names,
        Err(never) => match never {},
    };
    names.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    names.dedup();

    names
}

/// Does the expression mention the variable called `var` anywhere?
pub fn depends_on(expr: &Expression, var: &str) -> bool {
    variables(expr).iter().any(|name| name.as_str() == var)
}
