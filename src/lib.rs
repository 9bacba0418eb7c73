//! `wollok-host` library crate.
//!
//! Host-side core for a small object-oriented teaching language:
//! - `ast`: the parsed node tree and its owning `Environment`
//! - `validator`: structural rule checks producing ordered diagnostics
//! - `runtime`: identity-based runtime object model and evaluation state
//! - `natives`: host implementations of the `game` and `Sound` modules
pub mod ast;
pub mod natives;
pub mod runtime;
pub mod validator;
