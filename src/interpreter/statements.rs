//! Statement execution
//!
//! Every statement reports a line event before it runs. Loop headers report
//! again each time control returns to them, and each `elif` and `except`
//! clause that gets tested reports its own line, matching what a line tracer
//! observes in the reference interpreter.
//!
//! Exceptions escaping a statement are recorded once per frame by
//! [`Interpreter::note_exception`], which also extends the traceback.

use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::{EvalResult, ExecResult, Flow, RuntimeError};
use crate::interpreter::types::{is_exception, is_exception_class, is_subclass, ExcKind};
use crate::memory::stack::{Frame, FrameKind};
use crate::memory::value::{new_scope, Class, Data, Function, Value};
use crate::parser::ast::{ExceptHandler, FunctionCode, Stmt, StmtKind};
use crate::trace::StepEvent;
use std::rc::Rc;

impl Interpreter {
    pub(crate) fn exec_block(&mut self, stmts: &[Stmt]) -> ExecResult {
        for stmt in stmts {
            match self.exec_stmt(stmt)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    pub(crate) fn exec_stmt(&mut self, stmt: &Stmt) -> ExecResult {
        self.step(stmt.location.line);
        self.exec_stmt_kind(stmt)
            .map_err(|err| self.note_exception(err))
    }

    fn exec_stmt_kind(&mut self, stmt: &Stmt) -> ExecResult {
        match &stmt.kind {
            StmtKind::Expr(expr) => {
                self.eval(expr)?;
            }
            StmtKind::Assign { targets, value } => {
                let value = self.eval(value)?;
                for target in targets {
                    self.assign_target(target, value.clone())?;
                }
            }
            StmtKind::AugAssign { target, op, value } => {
                self.augmented_assign(target, *op, value)?;
            }
            StmtKind::If {
                branches,
                else_body,
            } => {
                for (index, branch) in branches.iter().enumerate() {
                    if index > 0 {
                        self.step(branch.location.line);
                    }
                    let condition = self.eval(&branch.condition)?;
                    if self.truth_of(&condition)? {
                        return self.exec_block(&branch.body);
                    }
                }
                if let Some(body) = else_body {
                    return self.exec_block(body);
                }
            }
            StmtKind::While { condition, body } => loop {
                let value = self.eval(condition)?;
                if !self.truth_of(&value)? {
                    break;
                }
                match self.exec_block(body)? {
                    Flow::Break => break,
                    Flow::Return(value) => return Ok(Flow::Return(value)),
                    Flow::Normal | Flow::Continue => {}
                }
                self.step(stmt.location.line);
            },
            StmtKind::For { target, iter, body } => {
                let iterable = self.eval(iter)?;
                let mut items = self.iterate(&iterable)?;
                while let Some(item) = items.next(&mut self.heap) {
                    self.assign_target(target, item)?;
                    match self.exec_block(body)? {
                        Flow::Break => break,
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Normal | Flow::Continue => {}
                    }
                    self.step(stmt.location.line);
                }
            }
            StmtKind::Break => return Ok(Flow::Break),
            StmtKind::Continue => return Ok(Flow::Continue),
            StmtKind::Pass | StmtKind::Global(_) | StmtKind::Nonlocal(_) => {}
            StmtKind::FunctionDef(code) => {
                let function = self.make_function(code)?;
                self.store_name(&code.name, function)?;
            }
            StmtKind::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval(expr)?,
                    None => self.heap.none(),
                };
                return Ok(Flow::Return(value));
            }
            StmtKind::ClassDef { name, base, body } => {
                let base = match base {
                    Some(expr) => self.eval(expr)?,
                    None => self.types.object.clone(),
                };
                let class = self.define_class(name, base, body, stmt.location.line)?;
                self.store_name(name, class)?;
            }
            StmtKind::Del(targets) => {
                for target in targets {
                    self.delete_target(target)?;
                }
            }
            StmtKind::Raise(None) => {
                return Err(match self.handling.last() {
                    Some(active) => {
                        let mut err = active.clone();
                        err.reported_depth = None;
                        err
                    }
                    None => self.raise(ExcKind::RuntimeError, "No active exception to reraise"),
                });
            }
            StmtKind::Raise(Some(expr)) => {
                let value = self.eval(expr)?;
                let exception = self.exception_from(value)?;
                return Err(RuntimeError::new(exception));
            }
            StmtKind::Try {
                body,
                handlers,
                else_body,
                finally_body,
            } => {
                let outcome = match self.exec_block(body) {
                    Ok(Flow::Normal) => match else_body {
                        Some(else_body) => self.exec_block(else_body),
                        None => Ok(Flow::Normal),
                    },
                    Ok(flow) => Ok(flow),
                    Err(err) => self.handle_exception(err, handlers),
                };
                let Some(finally_body) = finally_body else {
                    return outcome;
                };
                return match self.exec_block(finally_body)? {
                    Flow::Normal => outcome,
                    flow => Ok(flow),
                };
            }
            StmtKind::Assert { test, message } => {
                let value = self.eval(test)?;
                if !self.truth_of(&value)? {
                    let args = match message {
                        Some(expr) => vec![self.eval(expr)?],
                        None => Vec::new(),
                    };
                    return Err(self.raise_with(ExcKind::AssertionError, args));
                }
            }
        }
        Ok(Flow::Normal)
    }

    /// Run the first handler matching `err`, or hand the error back
    fn handle_exception(&mut self, err: RuntimeError, handlers: &[ExceptHandler]) -> ExecResult {
        for handler in handlers {
            self.step(handler.location.line);
            if let Some(kind) = &handler.kind {
                let kind = self.eval(kind)?;
                if !self.exception_matches(&err.exception, &kind)? {
                    continue;
                }
            }
            if let Some(name) = &handler.name {
                self.store_name(name, err.exception.clone())?;
            }
            self.handling.push(err);
            let result = self.exec_block(&handler.body);
            self.handling.pop();
            if let Some(name) = &handler.name {
                self.discard_name(name)?;
            }
            return result;
        }
        Err(err)
    }

    fn exception_matches(&mut self, exception: &Value, kind: &Value) -> Result<bool, RuntimeError> {
        match kind.data() {
            Data::Class(_) if is_exception_class(kind) => {
                let class = self.types.class_of(exception);
                Ok(is_subclass(&class, kind))
            }
            Data::Tuple(kinds) => {
                for kind in kinds {
                    if self.exception_matches(exception, kind)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            _ => Err(self.raise(
                ExcKind::TypeError,
                "catching classes that do not inherit from BaseException is not allowed",
            )),
        }
    }

    /// The exception instance raised by `raise value`
    fn exception_from(&mut self, value: Value) -> EvalResult {
        if is_exception(&value) {
            return Ok(value);
        }
        if value.as_class().is_some() && is_exception_class(&value) {
            return self.instantiate(&value, Vec::new(), Vec::new());
        }
        Err(self.raise(
            ExcKind::TypeError,
            "exceptions must derive from BaseException",
        ))
    }

    /// Execute a class body in its own frame and build the class from the
    /// resulting namespace
    fn define_class(&mut self, name: &str, base: Value, body: &[Stmt], line: usize) -> EvalResult {
        if base.as_class().is_none() {
            let message = format!(
                "class base must be a class, not '{}'",
                base.type_name()
            );
            return Err(self.raise(ExcKind::TypeError, message));
        }
        let Some(outer) = self.stack.current() else {
            return Err(self.raise(ExcKind::RuntimeError, "no active frame"));
        };
        let mut closure = outer.closure.clone();
        if outer.kind == FrameKind::Function {
            closure.push(outer.locals.clone());
        }
        let namespace = new_scope();
        let frame = Frame {
            function_name: name.to_string(),
            source_id: outer.source_id,
            kind: FrameKind::Class,
            line,
            locals: namespace.clone(),
            globals: outer.globals.clone(),
            closure,
            code: None,
            comprehensions: Vec::new(),
        };

        self.stack.push(frame);
        self.emit(StepEvent::Call);
        let result = self.exec_block(body);
        let none = self.heap.none();
        self.emit(StepEvent::Return(none));
        self.stack.pop();
        result?;

        Ok(self.heap.alloc(Data::Class(Class {
            name: name.to_string(),
            base: Some(base),
            attrs: namespace,
            module: "__main__",
        })))
    }

    /// Create a function object from `def` or `lambda` code, evaluating
    /// defaults now and capturing the enclosing scopes
    pub(crate) fn make_function(&mut self, code: &Rc<FunctionCode>) -> EvalResult {
        let mut defaults = Vec::new();
        for param in &code.params {
            if let Some(default) = &param.default {
                defaults.push(self.eval(default)?);
            }
        }
        let Some(frame) = self.stack.current() else {
            return Err(self.raise(ExcKind::RuntimeError, "no active frame"));
        };
        let mut closure = match frame.kind {
            FrameKind::Module => Vec::new(),
            FrameKind::Class => frame.closure.clone(),
            FrameKind::Function => {
                let mut scopes = frame.closure.clone();
                scopes.push(frame.locals.clone());
                scopes
            }
        };
        closure.extend(frame.comprehensions.iter().cloned());
        let function = Function {
            code: code.clone(),
            defaults,
            globals: frame.globals.clone(),
            closure,
            source_id: frame.source_id,
        };
        Ok(self.heap.alloc(Data::Function(function)))
    }
}
