//! Runtime error types for the interpreter
//!
//! Every failure inside the hosted program is a hosted exception: an
//! exception object plus the frames it has unwound through so far. The same
//! error type therefore covers user `raise`, failed lookups, type errors,
//! division by zero and the recursion limit, and all of them can be caught
//! by `try`/`except`.

use crate::interpreter::repr::exception_message;
use crate::memory::value::Value;
use crate::snapshot::introspect::SourceId;
use std::fmt;

/// One frame an exception passed through
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracebackEntry {
    pub source_id: SourceId,
    pub line: usize,
    pub function: String,
    /// Call-stack depth of the frame (1 = module)
    pub depth: usize,
}

/// An in-flight hosted exception
#[derive(Debug, Clone)]
pub struct RuntimeError {
    pub exception: Value,
    /// Innermost frame first
    pub traceback: Vec<TracebackEntry>,
    /// Depth at which the exception was last reported to the tracer
    pub(crate) reported_depth: Option<usize>,
}

impl RuntimeError {
    pub fn new(exception: Value) -> Self {
        RuntimeError {
            exception,
            traceback: Vec::new(),
            reported_depth: None,
        }
    }

    /// Exception class name, e.g. `ValueError`
    pub fn type_name(&self) -> String {
        self.exception.type_name()
    }

    /// `str()` of the exception
    pub fn message(&self) -> String {
        exception_message(&self.exception)
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = self.message();
        if message.is_empty() {
            write!(f, "{}", self.type_name())
        } else {
            write!(f, "{}: {}", self.type_name(), message)
        }
    }
}

impl std::error::Error for RuntimeError {}

/// How a statement finished
#[derive(Debug, Clone)]
pub enum Flow {
    Normal,
    Break,
    Continue,
    Return(Value),
}

pub type ExecResult = Result<Flow, RuntimeError>;
pub type EvalResult = Result<Value, RuntimeError>;
