//! Call stack implementation
//!
//! - [`CallStack`]: the live frames, outermost first
//! - [`Frame`]: one activation record (module body, function call or class body)
//!
//! Module frames share one [`Scope`] for locals and globals. Function frames
//! own a fresh locals scope and see their enclosing function scopes through
//! `closure`. Class bodies run in their own frame whose locals become the
//! class attributes.

use super::value::Scope;
use crate::parser::ast::FunctionCode;
use crate::snapshot::introspect::SourceId;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Module,
    Function,
    Class,
}

/// Stack frame for one activation
pub struct Frame {
    pub function_name: String,
    pub source_id: SourceId,
    pub kind: FrameKind,
    /// Line currently executing
    pub line: usize,
    pub locals: Scope,
    pub globals: Scope,
    /// Enclosing function scopes, innermost last
    pub closure: Vec<Scope>,
    /// Present for function frames
    pub code: Option<Rc<FunctionCode>>,
    /// Iteration variables of the comprehensions being evaluated, innermost last
    pub comprehensions: Vec<Scope>,
}

impl Frame {
    pub fn module(source_id: SourceId, globals: Scope) -> Self {
        Frame {
            function_name: "<module>".to_string(),
            source_id,
            kind: FrameKind::Module,
            line: 1,
            locals: globals.clone(),
            globals,
            closure: Vec::new(),
            code: None,
            comprehensions: Vec::new(),
        }
    }

    /// Whether `name` is a local of this function frame
    pub fn is_local_name(&self, name: &str) -> bool {
        self.code
            .as_ref()
            .is_some_and(|code| code.local_names.contains(name))
    }

    pub fn declares_global(&self, name: &str) -> bool {
        self.code
            .as_ref()
            .is_some_and(|code| code.global_names.contains(name))
    }

    pub fn declares_nonlocal(&self, name: &str) -> bool {
        self.code
            .as_ref()
            .is_some_and(|code| code.nonlocal_names.contains(name))
    }
}

/// The call stack
#[derive(Default)]
pub struct CallStack {
    frames: Vec<Frame>,
}

impl CallStack {
    pub fn new() -> Self {
        CallStack { frames: Vec::new() }
    }

    pub fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    pub fn pop(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    /// Number of live frames
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn current(&self) -> Option<&Frame> {
        self.frames.last()
    }

    pub fn current_mut(&mut self) -> Option<&mut Frame> {
        self.frames.last_mut()
    }

    pub fn get(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    /// Frames from outermost to innermost
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::value::new_scope;

    #[test]
    fn test_module_frame_shares_locals_and_globals() {
        let globals = new_scope();
        let frame = Frame::module(SourceId(0), globals.clone());
        assert!(Rc::ptr_eq(&frame.locals, &globals));
        assert_eq!(frame.function_name, "<module>");
        assert_eq!(frame.kind, FrameKind::Module);
        assert!(!frame.is_local_name("x"));
    }

    #[test]
    fn test_push_pop_order() {
        let mut stack = CallStack::new();
        stack.push(Frame::module(SourceId(0), new_scope()));
        let mut inner = Frame::module(SourceId(1), new_scope());
        inner.function_name = "f".to_string();
        inner.kind = FrameKind::Function;
        stack.push(inner);

        assert_eq!(stack.depth(), 2);
        assert_eq!(stack.current().map(|f| f.function_name.as_str()), Some("f"));
        assert_eq!(stack.frames()[0].function_name, "<module>");
        stack.pop();
        assert_eq!(stack.depth(), 1);
    }
}
