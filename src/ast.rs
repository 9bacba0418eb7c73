//! Syntax tree shared by the validator and the native bridge.
//!
//! The parser (external to this crate) produces the node set in `node` and
//! hands it to `EnvironmentBuilder`, which links the tree into an immutable
//! `Environment` with parent and fully-qualified-name indexes.
pub mod environment;
pub mod node;

pub use environment::{Environment, EnvironmentBuilder};
pub use node::{BaseCall, LiteralValue, Node, NodeId, NodeKind};
