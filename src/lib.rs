//! Symbolic differentiation over immutable expression trees.
//!
//! Expressions are written out with ordinary arithmetic syntax, rendered
//! with minimal parenthesization, and differentiated by driving a table
//! of per-node-kind rules through a generic bottom-up traversal.

#[cfg(test)]
#[macro_use]
extern crate pretty_assertions;

mod expr;
pub mod ops;
mod visit;

pub use expr::{
    BinaryOperation, Expression, InvalidPayload, Node, NodeKind, Payload,
};
pub use ops::{differentiate, DifferentiationError, Differentiator, Rule};
pub use visit::postvisit;
