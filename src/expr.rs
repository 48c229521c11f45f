use arrayvec::ArrayVec;
use smol_str::SmolStr;
use std::{
    error::Error,
    fmt::{self, Debug, Display, Formatter},
    ops::{Add, Div, Mul, Sub},
    rc::Rc,
};

/// The scalar payload carried by a terminal node.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// A numeric payload, as carried by constants.
    Number(f64),
    /// A textual payload, as carried by variables.
    Name(SmolStr),
}

impl From<f64> for Payload {
    fn from(value: f64) -> Payload { Payload::Number(value) }
}

impl From<i32> for Payload {
    fn from(value: i32) -> Payload { Payload::Number(f64::from(value)) }
}

impl From<&str> for Payload {
    fn from(name: &str) -> Payload { Payload::Name(name.into()) }
}

impl From<String> for Payload {
    fn from(name: String) -> Payload { Payload::Name(name.into()) }
}

impl From<SmolStr> for Payload {
    fn from(name: SmolStr) -> Payload { Payload::Name(name) }
}

/// The error returned when a constant is handed a payload that isn't a
/// number.
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidPayload {
    pub found: Payload,
}

impl Display for InvalidPayload {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "expected a numeric payload, found {:?}", self.found)
    }
}

impl Error for InvalidPayload {}

/// An operation that can be applied to two arguments.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BinaryOperation {
    Plus,
    Minus,
    Times,
    Divide,
    Power,
}

impl BinaryOperation {
    /// The symbol shown when rendering.
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperation::Plus => "+",
            BinaryOperation::Minus => "-",
            BinaryOperation::Times => "*",
            BinaryOperation::Divide => "/",
            BinaryOperation::Power => "^",
        }
    }

    /// The rank used when deciding whether an operand needs parentheses.
    /// Lower ranks bind tighter.
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOperation::Power => 1,
            BinaryOperation::Times | BinaryOperation::Divide => 2,
            BinaryOperation::Plus | BinaryOperation::Minus => 3,
        }
    }
}

/// The shape of a node, without regard to its operands.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Constant,
    Variable,
    Operator(BinaryOperation),
}

/// A single node in an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Constant(f64),
    /// A named variable. The name is stored opaquely and never
    /// interpreted numerically.
    Variable(SmolStr),
    /// An expression involving two operands, in the order they were
    /// written.
    Binary {
        left: Expression,
        right: Expression,
        op: BinaryOperation,
    },
}

/// A cheaply clonable handle to an immutable expression node.
///
/// Cloning a handle shares the underlying node instance instead of
/// copying it, so one subexpression can appear under several parents and
/// the whole thing forms a DAG rather than a strict tree. Equality
/// (`==`) is structural; [`Expression::id`] tells instances apart.
#[derive(Clone, PartialEq)]
pub struct Expression {
    node: Rc<Node>,
}

impl Expression {
    fn from_node(node: Node) -> Expression {
        Expression {
            node: Rc::new(node),
        }
    }

    /// Build a constant from a numeric payload.
    ///
    /// A payload that isn't a number is rejected here and now, rather
    /// than being stored and tripping something up later.
    pub fn constant<P>(payload: P) -> Result<Expression, InvalidPayload>
    where
        P: Into<Payload>,
    {
        match payload.into() {
            Payload::Number(value) => Ok(Expression::from(value)),
            found => Err(InvalidPayload { found }),
        }
    }

    /// Build a named variable.
    pub fn variable<N: Into<SmolStr>>(name: N) -> Expression {
        Expression::from_node(Node::Variable(name.into()))
    }

    /// Build an operator node with the operands in the given order.
    pub fn binary(
        op: BinaryOperation,
        left: Expression,
        right: Expression,
    ) -> Expression {
        Expression::from_node(Node::Binary { left, right, op })
    }

    /// Raise this expression to a power.
    ///
    /// Rust keeps `^` for bitwise xor, so exponentiation is spelled as a
    /// method: `x.pow(3.0)`.
    pub fn pow<T: Into<Expression>>(self, exponent: T) -> Expression {
        Expression::binary(BinaryOperation::Power, self, exponent.into())
    }

    /// The node behind this handle.
    pub fn node(&self) -> &Node { &self.node }

    /// Which kind of node this is.
    pub fn kind(&self) -> NodeKind {
        match self.node() {
            Node::Constant(_) => NodeKind::Constant,
            Node::Variable(_) => NodeKind::Variable,
            Node::Binary { op, .. } => NodeKind::Operator(*op),
        }
    }

    /// The operands of this node in left-to-right order. Terminals have
    /// none.
    pub fn operands(&self) -> ArrayVec<[&Expression; 2]> {
        let mut operands = ArrayVec::new();

        if let Node::Binary { left, right, .. } = self.node() {
            operands.push(left);
            operands.push(right);
        }

        operands
    }

    /// The numeric value of this node, if it is a constant.
    pub fn as_constant(&self) -> Option<f64> {
        match self.node() {
            Node::Constant(value) => Some(*value),
            _ => None,
        }
    }

    /// The name of this node, if it is a variable.
    pub fn as_variable(&self) -> Option<&str> {
        match self.node() {
            Node::Variable(name) => Some(name.as_str()),
            _ => None,
        }
    }

    /// The precedence rank used when rendering. Terminals bind tightest
    /// of all and are never parenthesized.
    pub fn precedence(&self) -> u8 {
        match self.node() {
            Node::Constant(_) | Node::Variable(_) => 0,
            Node::Binary { op, .. } => op.precedence(),
        }
    }

    /// An identity for this particular node instance, stable for as long
    /// as the instance is alive.
    ///
    /// Two handles to the same instance share an id; two
    /// separately-built `Constant(1.0)` nodes compare equal but have
    /// different ids.
    pub fn id(&self) -> usize { Rc::as_ptr(&self.node) as usize }
}

impl From<f64> for Expression {
    /// Promote a raw number to a constant.
    fn from(value: f64) -> Expression {
        Expression::from_node(Node::Constant(value))
    }
}

// Operator overloads so trees can be written out as ordinary arithmetic.
// A raw number on either side is promoted to a constant before the
// operator node is built.

impl<T: Into<Expression>> Add<T> for Expression {
    type Output = Expression;

    fn add(self, rhs: T) -> Expression {
        Expression::binary(BinaryOperation::Plus, self, rhs.into())
    }
}

impl<T: Into<Expression>> Sub<T> for Expression {
    type Output = Expression;

    fn sub(self, rhs: T) -> Expression {
        Expression::binary(BinaryOperation::Minus, self, rhs.into())
    }
}

impl<T: Into<Expression>> Mul<T> for Expression {
    type Output = Expression;

    fn mul(self, rhs: T) -> Expression {
        Expression::binary(BinaryOperation::Times, self, rhs.into())
    }
}

impl<T: Into<Expression>> Div<T> for Expression {
    type Output = Expression;

    fn div(self, rhs: T) -> Expression {
        Expression::binary(BinaryOperation::Divide, self, rhs.into())
    }
}

impl Add<Expression> for f64 {
    type Output = Expression;

    fn add(self, rhs: Expression) -> Expression {
        Expression::binary(BinaryOperation::Plus, Expression::from(self), rhs)
    }
}

impl Sub<Expression> for f64 {
    type Output = Expression;

    fn sub(self, rhs: Expression) -> Expression {
        Expression::binary(BinaryOperation::Minus, Expression::from(self), rhs)
    }
}

impl Mul<Expression> for f64 {
    type Output = Expression;

    fn mul(self, rhs: Expression) -> Expression {
        Expression::binary(BinaryOperation::Times, Expression::from(self), rhs)
    }
}

impl Div<Expression> for f64 {
    type Output = Expression;

    fn div(self, rhs: Expression) -> Expression {
        Expression::binary(BinaryOperation::Divide, Expression::from(self), rhs)
    }
}

impl Display for Expression {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.node() {
            Node::Constant(value) => write!(f, "{}", value),
            Node::Variable(name) => write!(f, "{}", name),
            Node::Binary { left, right, op } => {
                write_operand(left, *op, f)?;
                write!(f, " {} ", op.symbol())?;
                write_operand(right, *op, f)
            },
        }
    }
}

fn write_operand(
    operand: &Expression,
    parent: BinaryOperation,
    f: &mut Formatter<'_>,
) -> fmt::Result {
    if operand.precedence() > parent.precedence() {
        write!(f, "({})", operand)
    } else {
        write!(f, "{}", operand)
    }
}

impl Debug for Expression {
    /// The literal form: the node kind's name followed by its operands,
    /// with no precedence games.
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.node() {
            Node::Constant(value) => write!(f, "Constant({:?})", value),
            Node::Variable(name) => {
                write!(f, "Variable({:?})", name.as_str())
            },
            Node::Binary { left, right, op } => {
                write!(f, "{:?}({:?}, {:?})", op, left, right)
            },
        }
    }
}
