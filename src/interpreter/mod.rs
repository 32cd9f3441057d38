//! Tree-walking interpreter for the hosted language
//!
//! This module provides the execution side of the host runtime:
//! - [`engine`]: the [`engine::Interpreter`], calls, frames and event emission
//! - [`statements`] / [`expressions`]: AST execution
//! - [`ops`]: operators, attribute and item access, name binding
//! - [`builtins`], [`methods`], [`prelude`]: the builtin namespace
//! - [`repr`], [`format`]: textual representations and the format mini-language
//! - [`introspect`]: the interpreter as a traceable host
//! - [`errors`]: hosted exceptions and control flow
//!
//! # Execution Model
//!
//! The interpreter walks the AST one statement at a time. Before each
//! statement it moves the current frame to the statement's line and reports a
//! `line` step to the attached trace sink; frame entry, exit and unwinding are
//! reported the same way. Without a sink attached nothing is recorded.
//!
//! Every failure inside the hosted program is a hosted exception that
//! `try`/`except` can catch, including the recursion limit.

pub mod builtins;
pub mod console;
pub mod constants;
pub mod engine;
pub mod errors;
pub mod expressions;
pub mod format;
pub mod introspect;
pub mod iteration;
pub mod methods;
pub mod ops;
pub mod prelude;
pub mod repr;
pub mod statements;
pub mod types;
