//! A generic bottom-up walk over expression DAGs.

use crate::expr::Expression;
use arrayvec::ArrayVec;
use std::collections::HashMap;

/// Visit every node reachable from `root` in post-order, combining each
/// node with the already-computed results of its operands.
///
/// `combine` is handed the node itself, its operands' results in
/// left-to-right order, and `ctx`, and produces that node's result;
/// `postvisit` returns the result produced for `root`. Each distinct node
/// *instance* is combined exactly once: a subexpression shared between
/// two parents contributes a single call whose result is reused, while
/// two structurally-equal-but-separate nodes are combined separately.
///
/// The walk runs off an explicit work stack instead of recursing, so the
/// depth it can handle is bounded by memory rather than the call stack.
/// Cycles are not detected; expressions are immutable and acyclic by
/// construction.
///
/// The first error returned by `combine` aborts the walk.
pub fn postvisit<R, C, E, F>(
    root: &Expression,
    mut combine: F,
    ctx: &C,
) -> Result<R, E>
where
    R: Clone,
    C: ?Sized,
    F: FnMut(&Expression, &[R], &C) -> Result<R, E>,
{
    let mut visited: HashMap<usize, R> = HashMap::new();
    let mut stack = vec![root.clone()];

    while let Some(expr) = stack.pop() {
        if visited.contains_key(&expr.id()) {
            // a duplicate push whose result already exists
            continue;
        }

        let pending: ArrayVec<[Expression; 2]> = expr
            .operands()
            .into_iter()
            .filter(|operand| !visited.contains_key(&operand.id()))
            .cloned()
            .collect();

        if pending.is_empty() {
            let results: ArrayVec<[R; 2]> = expr
                .operands()
                .into_iter()
                .map(|operand| visited[&operand.id()].clone())
                .collect();

            let result = combine(&expr, results.as_slice(), ctx)?;
            visited.insert(expr.id(), result);
        } else {
            // not ready yet; the operands go on top so they get combined
            // before this node comes around again
            stack.push(expr);
            stack.extend(pending);
        }
    }

    Ok(visited
        .remove(&root.id())
        .expect("the root is visited by the time the stack drains"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Node;
    use std::convert::Infallible;

    fn var(name: &str) -> Expression { Expression::variable(name) }

    fn count_combines(expr: &Expression) -> usize {
        let mut calls = 0;
        postvisit(
            expr,
            |_, _: &[()], _: &()| {
                calls += 1;
                Ok::<_, Infallible>(())
            },
            &(),
        )
        .unwrap();

        calls
    }

    #[test]
    fn operands_are_combined_before_their_parent() {
        let expr = var("a") * var("b") + 1.0;

        // rebuilding the expression in postfix notation only works if
        // every operand's result exists by the time its parent is visited
        let got = postvisit(
            &expr,
            |node, operands: &[String], _: &()| {
                let own = match node.node() {
                    Node::Constant(value) => value.to_string(),
                    Node::Variable(name) => name.to_string(),
                    Node::Binary { op, .. } => op.symbol().to_string(),
                };

                let mut parts = operands.to_vec();
                parts.push(own);
                Ok::<_, Infallible>(parts.join(" "))
            },
            &(),
        )
        .unwrap();

        assert_eq!(got, "a b * 1 +");
    }

    #[test]
    fn a_shared_instance_is_combined_once() {
        let x = var("x");
        let expr = x.clone() * x.clone();

        // two edges into x, but only two distinct nodes
        assert_eq!(count_combines(&expr), 2);
    }

    #[test]
    fn equal_but_distinct_instances_are_combined_separately() {
        let expr = var("x") * var("x");

        assert_eq!(count_combines(&expr), 3);
    }

    #[test]
    fn shared_results_are_reused() {
        let shared = var("x") + 1.0;
        let expr = shared.clone() * shared.clone();

        assert_eq!(count_combines(&expr), 4);
    }

    #[test]
    fn the_context_reaches_every_call() {
        let expr = var("x") + var("y");

        let got: Result<usize, Infallible> = postvisit(
            &expr,
            |_, operands: &[usize], bump: &usize| {
                Ok(bump + operands.iter().sum::<usize>())
            },
            &10,
        );

        // 10 per node, three nodes
        assert_eq!(got, Ok(30));
    }

    #[test]
    fn errors_abort_the_walk() {
        let expr = var("x") + var("y");

        let got: Result<(), &str> = postvisit(
            &expr,
            |node, _: &[()], _: &()| match node.node() {
                Node::Variable(name) if name.as_str() == "y" => Err("nope"),
                _ => Ok(()),
            },
            &(),
        );

        assert_eq!(got, Err("nope"));
    }

    #[test]
    fn deep_chains_are_fine() {
        let mut expr = var("x");
        for _ in 0..10_000 {
            expr = expr + 1.0;
        }

        let nodes = postvisit(
            &expr,
            |_, operands: &[usize], _: &()| {
                Ok::<_, Infallible>(1 + operands.iter().sum::<usize>())
            },
            &(),
        )
        .unwrap();

        assert_eq!(nodes, 20_001);
    }
}
