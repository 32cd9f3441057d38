//! Execution tracing
//!
//! The host pushes one [`StepEvent`] per observable execution step into the
//! [`TraceSink`] attached to it. [`tracer::Tracer`] is the sink that turns
//! those steps into [`TraceEvent`] records; [`session::TraceSession`] attaches
//! it for the duration of a run and detaches it on every exit path.

pub mod session;
pub mod tracer;

use crate::snapshot::{Introspect, Snapshot, StackEntry};
use indexmap::IndexMap;
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;

pub use session::TraceSession;
pub use tracer::{Tracer, TracerState};

/// Execution step reported by the host, with its payload
#[derive(Debug, Clone)]
pub enum StepEvent<V> {
    Call,
    Line,
    /// Value the frame returns (`None` when it unwinds with an exception)
    Return(V),
    /// Exception object passing through the frame
    Exception(V),
}

impl<V> StepEvent<V> {
    pub fn kind(&self) -> EventKind {
        match self {
            StepEvent::Call => EventKind::Call,
            StepEvent::Line => EventKind::Line,
            StepEvent::Return(_) => EventKind::Return,
            StepEvent::Exception(_) => EventKind::Exception,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Call,
    Line,
    Return,
    Exception,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Call => "call",
            EventKind::Line => "line",
            EventKind::Return => "return",
            EventKind::Exception => "exception",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExceptionInfo {
    #[serde(rename = "type")]
    pub type_name: String,
    pub message: String,
}

/// One recorded step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceEvent {
    pub event: EventKind,
    pub line: usize,
    pub function: String,
    /// Rendered locals of the current frame
    pub locals: IndexMap<String, String>,
    pub stack: Vec<StackEntry>,
    /// Standard output so far
    pub stdout: String,
    pub memory: Snapshot,
    #[serde(rename = "returnValue", skip_serializing_if = "Option::is_none")]
    pub return_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception: Option<ExceptionInfo>,
}

/// Receives execution steps from a host
pub trait TraceSink<H: TraceHost> {
    fn on_event(&mut self, host: &H, frame: H::Frame, event: StepEvent<H::Value>);
}

/// A runtime that can be traced
pub trait TraceHost: Introspect + Sized {
    fn attach_sink(&mut self, sink: Rc<RefCell<dyn TraceSink<Self>>>);

    fn detach_sink(&mut self);

    /// Standard output produced by the hosted program so far
    fn captured_stdout(&self) -> String;
}
