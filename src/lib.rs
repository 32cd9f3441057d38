//! # Introduction
//!
//! heapscope runs a program written in a teaching subset of Python one step
//! at a time and records, for every executed line, the call stack, the
//! locals, the output so far and a bounded snapshot of the live object graph.
//! The recorded trace is printed as JSON or replayed in a terminal UI built
//! with [ratatui](https://docs.rs/ratatui).
//!
//! ## Execution pipeline
//!
//! ```text
//! Source → Lexer → Parser → AST → Interpreter ⇢ Tracer → Snapshots → Report → JSON / TUI
//! ```
//!
//! 1. [`parser`] tokenises the source and builds an AST.
//! 2. [`interpreter`] walks the AST and reports every call, line, return and
//!    exception to the attached [`trace::TraceSink`].
//! 3. [`memory`] holds the hosted object model: identity-stamped
//!    [`memory::value::Value`]s, the [`memory::heap::Heap`] that allocates
//!    them and the [`memory::stack::CallStack`].
//! 4. [`snapshot`] turns the live frames into bounded, deduplicated
//!    [`snapshot::Snapshot`]s through the read-only [`snapshot::Introspect`]
//!    interface.
//! 5. [`trace`] records one [`trace::TraceEvent`] per step of the user's
//!    own frames.
//! 6. [`runner`] drives a whole run and produces the [`runner::RunReport`].
//! 7. [`ui`] replays a report; not part of the stable library API.

pub mod config;
pub mod interpreter;
pub mod memory;
pub mod parser;
pub mod runner;
pub mod snapshot;
pub mod trace;
pub mod ui;
