//! Memory model for the interpreter
//!
//! This module provides the core memory abstractions:
//! - [`value`]: Runtime value representation with per-object identity
//! - [`heap`]: Address allocator and shared singletons
//! - [`stack`]: Call stack with frames and scopes

pub mod heap;
pub mod stack;
pub mod value;
