//! Structural validation over a linked [`Environment`].
//!
//! Findings are data, never errors: the driver folds the tree once and
//! returns every violation in traversal order. Rules themselves live in
//! `rules`, grouped by the node kind they apply to.

use crate::ast::environment::Environment;
use crate::ast::node::NodeId;

mod rules;

pub use rules::RESERVED_WORDS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Warning,
    Error,
}

/// A single diagnostic: stable code, severity, offending node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    pub code: &'static str,
    pub level: Level,
    pub node: NodeId,
}

/// Validate the whole environment.
pub fn validate(environment: &Environment) -> Vec<Problem> {
    problems_in(environment, environment.root_id())
}

/// Validate the subtree rooted at `node`.
///
/// Problems come out in pre-order traversal position, and within a node in
/// the declaration order of its kind's rules. Consumers rely on this order.
pub fn problems_in(environment: &Environment, node: NodeId) -> Vec<Problem> {
    environment.reduce(node, Vec::new(), |mut problems, node| {
        for rule in rules::rules_for(node.kind()) {
            if !(rule.holds)(environment, node) {
                problems.push(Problem {
                    code: rule.code,
                    level: rule.level,
                    node: node.id(),
                });
            }
        }
        problems
    })
}
