// Execution engine for the hosted language

use crate::interpreter::builtins;
use crate::interpreter::console::Console;
use crate::interpreter::constants::RECURSION_LIMIT;
use crate::interpreter::errors::{EvalResult, Flow, RuntimeError, TracebackEntry};
use crate::interpreter::repr::{repr_or_placeholder, str_value, MAX_REPR_DEPTH};
use crate::interpreter::types::{is_exception_class, lookup_class_attr, BuiltinTypes, ExcKind};
use crate::memory::heap::Heap;
use crate::memory::stack::{CallStack, Frame, FrameKind};
use crate::memory::value::{new_scope, Data, Function, Instance, Namespace, Scope, Value};
use crate::parser::ast::{FunctionBody, Program};
use crate::snapshot::introspect::SourceId;
use crate::trace::{StepEvent, TraceSink};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, warn};

/// A loaded source unit, kept for tracebacks
pub struct SourceUnit {
    pub name: String,
    pub lines: Vec<String>,
}

/// The tree-walking interpreter
pub struct Interpreter {
    pub(crate) heap: Heap,
    pub(crate) stack: CallStack,
    pub(crate) console: Console,
    pub(crate) types: BuiltinTypes,
    /// Names visible from every module
    pub(crate) builtins: Scope,
    sources: Vec<SourceUnit>,
    sink: Option<Rc<RefCell<dyn TraceSink<Interpreter>>>>,
    /// Exceptions whose `except` handlers are running, innermost last
    pub(crate) handling: Vec<RuntimeError>,
}

impl Interpreter {
    /// Create an interpreter with the builtin namespace installed. The prelude
    /// is loaded separately with [`Interpreter::load_prelude`].
    pub fn new() -> Self {
        let mut heap = Heap::new();
        let types = BuiltinTypes::new(&mut heap);
        let mut interpreter = Interpreter {
            heap,
            stack: CallStack::new(),
            console: Console::new(),
            types,
            builtins: new_scope(),
            sources: Vec::new(),
            sink: None,
            handling: Vec::new(),
        };
        builtins::install(&mut interpreter);
        interpreter
    }

    /// Register a source unit and return its id
    pub fn add_source(&mut self, name: &str, text: &str) -> SourceId {
        let id = SourceId(self.sources.len() as u32);
        self.sources.push(SourceUnit {
            name: name.to_string(),
            lines: text.lines().map(str::to_string).collect(),
        });
        id
    }

    pub fn source_name(&self, id: SourceId) -> &str {
        self.sources
            .get(id.0 as usize)
            .map_or("<unknown>", |unit| unit.name.as_str())
    }

    pub fn source_line(&self, id: SourceId, line: usize) -> Option<&str> {
        self.sources
            .get(id.0 as usize)
            .and_then(|unit| unit.lines.get(line.checked_sub(1)?))
            .map(String::as_str)
    }

    pub fn console(&self) -> &Console {
        &self.console
    }

    /// Execute `program` as a module whose code comes from `source_id`.
    /// Returns the module namespace.
    pub fn run_module(
        &mut self,
        source_id: SourceId,
        program: &Program,
        module_name: &str,
    ) -> Result<Scope, RuntimeError> {
        let globals = new_scope();
        let file_name = self.source_name(source_id).to_string();
        let name = self.heap.str(module_name);
        let file = self.heap.str(file_name);
        {
            let mut namespace = globals.borrow_mut();
            namespace.insert("__name__".to_string(), name);
            namespace.insert("__file__".to_string(), file);
        }
        debug!(module = module_name, statements = program.body.len(), "running module");

        self.stack.push(Frame::module(source_id, globals.clone()));
        self.emit(StepEvent::Call);
        let result = self.exec_block(&program.body);
        let none = self.heap.none();
        self.emit(StepEvent::Return(none));
        self.stack.pop();
        result.map(|_| globals)
    }

    // ===== Tracing =====

    pub(crate) fn set_sink(&mut self, sink: Option<Rc<RefCell<dyn TraceSink<Interpreter>>>>) {
        self.sink = sink;
    }

    /// Report a step of the current frame to the attached sink
    pub(crate) fn emit(&self, event: StepEvent<Value>) {
        let Some(sink) = self.sink.clone() else {
            return;
        };
        let Some(frame) = self.stack.depth().checked_sub(1) else {
            return;
        };
        match sink.try_borrow_mut() {
            Ok(mut sink) => sink.on_event(self, frame, event),
            Err(_) => warn!(kind = event.kind().as_str(), "dropping re-entrant trace event"),
        };
    }

    /// Move the current frame to `line` and report it
    pub(crate) fn step(&mut self, line: usize) {
        if let Some(frame) = self.stack.current_mut() {
            frame.line = line;
        }
        self.emit(StepEvent::Line);
    }

    /// Record that `err` is passing through the current frame: adds a
    /// traceback entry and reports the exception, once per frame.
    pub(crate) fn note_exception(&mut self, mut err: RuntimeError) -> RuntimeError {
        let depth = self.stack.depth();
        if err.reported_depth == Some(depth) {
            return err;
        }
        err.reported_depth = Some(depth);
        if let Some(frame) = self.stack.current() {
            let reraised = err.traceback.last().is_some_and(|entry| entry.depth == depth);
            if !reraised {
                err.traceback.push(TracebackEntry {
                    source_id: frame.source_id,
                    line: frame.line,
                    function: frame.function_name.clone(),
                    depth,
                });
            }
        }
        self.emit(StepEvent::Exception(err.exception.clone()));
        err
    }

    // ===== Exceptions =====

    /// Build a builtin exception carrying `message`
    pub(crate) fn raise(&mut self, kind: ExcKind, message: impl Into<String>) -> RuntimeError {
        let message = self.heap.str(message.into());
        self.raise_with(kind, vec![message])
    }

    pub(crate) fn raise_with(&mut self, kind: ExcKind, args: Vec<Value>) -> RuntimeError {
        let class = self.types.exception(kind);
        let exception = self.heap.alloc(Data::Instance(Instance {
            class,
            attrs: new_scope(),
            args,
        }));
        RuntimeError::new(exception)
    }

    /// Python-style traceback report for an uncaught exception
    pub fn format_traceback(&self, err: &RuntimeError) -> String {
        let mut out = String::from("Traceback (most recent call last):\n");
        for entry in err.traceback.iter().rev() {
            out.push_str(&format!(
                "  File \"{}\", line {}, in {}\n",
                self.source_name(entry.source_id),
                entry.line,
                entry.function
            ));
            if let Some(text) = self.source_line(entry.source_id, entry.line) {
                let text = text.trim();
                if !text.is_empty() {
                    out.push_str(&format!("    {}\n", text));
                }
            }
        }
        out.push_str(&format!("{}\n", err));
        out
    }

    // ===== Calls =====

    pub(crate) fn call_value(
        &mut self,
        callee: &Value,
        args: Vec<Value>,
        kwargs: Vec<(String, Value)>,
    ) -> EvalResult {
        match callee.data() {
            Data::Function(_) => self.call_function(callee, args, kwargs),
            Data::BoundMethod { receiver, function } => {
                let mut full = Vec::with_capacity(args.len() + 1);
                full.push(receiver.clone());
                full.extend(args);
                self.call_value(function, full, kwargs)
            }
            Data::Builtin(builtin) => (builtin.func)(self, args, kwargs),
            Data::NativeMethod { receiver, name } => {
                self.call_native_method(receiver, name, args, kwargs)
            }
            Data::Class(_) => self.instantiate(callee, args, kwargs),
            Data::Instance(instance) if lookup_class_attr(&instance.class, "__call__").is_some() => {
                let method = self.get_attribute(callee, "__call__")?;
                self.call_value(&method, args, kwargs)
            }
            _ => Err(self.raise(
                ExcKind::TypeError,
                format!("'{}' object is not callable", callee.type_name()),
            )),
        }
    }

    /// Run a user function in a new frame
    pub(crate) fn call_function(
        &mut self,
        callee: &Value,
        args: Vec<Value>,
        kwargs: Vec<(String, Value)>,
    ) -> EvalResult {
        let Data::Function(function) = callee.data() else {
            return Err(self.raise(ExcKind::TypeError, "expected a function"));
        };
        if self.stack.depth() >= RECURSION_LIMIT {
            return Err(self.raise(ExcKind::RecursionError, "maximum recursion depth exceeded"));
        }
        let locals = self.bind_arguments(function, args, kwargs)?;
        let code = function.code.clone();

        self.stack.push(Frame {
            function_name: code.name.clone(),
            source_id: function.source_id,
            kind: FrameKind::Function,
            line: code.location.line,
            locals: Rc::new(RefCell::new(locals)),
            globals: function.globals.clone(),
            closure: function.closure.clone(),
            code: Some(code.clone()),
            comprehensions: Vec::new(),
        });
        self.emit(StepEvent::Call);

        let result = match &code.body {
            FunctionBody::Block(stmts) => match self.exec_block(stmts) {
                Ok(Flow::Return(value)) => Ok(value),
                Ok(_) => Ok(self.heap.none()),
                Err(err) => Err(err),
            },
            FunctionBody::Expr(expr) => {
                self.emit(StepEvent::Line);
                self.eval(expr).map_err(|err| self.note_exception(err))
            }
        };

        let returned = match &result {
            Ok(value) => value.clone(),
            Err(_) => self.heap.none(),
        };
        self.emit(StepEvent::Return(returned));
        self.stack.pop();
        result
    }

    /// Match call arguments to parameters, filling defaults
    fn bind_arguments(
        &mut self,
        function: &Function,
        args: Vec<Value>,
        kwargs: Vec<(String, Value)>,
    ) -> Result<Namespace, RuntimeError> {
        let code = &function.code;
        let params = &code.params;
        if args.len() > params.len() {
            let message = format!(
                "{}() takes {} positional argument{} but {} {} given",
                code.name,
                params.len(),
                if params.len() == 1 { "" } else { "s" },
                args.len(),
                if args.len() == 1 { "was" } else { "were" }
            );
            return Err(self.raise(ExcKind::TypeError, message));
        }

        let mut slots: Vec<Option<Value>> = vec![None; params.len()];
        for (slot, arg) in slots.iter_mut().zip(args) {
            *slot = Some(arg);
        }
        for (key, value) in kwargs {
            match params.iter().position(|param| param.name == key) {
                Some(index) if slots[index].is_some() => {
                    let message = format!(
                        "{}() got multiple values for argument '{}'",
                        code.name, key
                    );
                    return Err(self.raise(ExcKind::TypeError, message));
                }
                Some(index) => slots[index] = Some(value),
                None => {
                    let message = format!(
                        "{}() got an unexpected keyword argument '{}'",
                        code.name, key
                    );
                    return Err(self.raise(ExcKind::TypeError, message));
                }
            }
        }

        let first_default = params.len() - function.defaults.len();
        let mut namespace = Namespace::new();
        let mut missing = Vec::new();
        for (index, (param, slot)) in params.iter().zip(slots).enumerate() {
            let value = match slot {
                Some(value) => value,
                None if index >= first_default => function.defaults[index - first_default].clone(),
                None => {
                    missing.push(format!("'{}'", param.name));
                    continue;
                }
            };
            namespace.insert(param.name.clone(), value);
        }
        if !missing.is_empty() {
            let message = format!(
                "{}() missing {} required positional argument{}: {}",
                code.name,
                missing.len(),
                if missing.len() == 1 { "" } else { "s" },
                join_names(&missing)
            );
            return Err(self.raise(ExcKind::TypeError, message));
        }
        Ok(namespace)
    }

    /// Call a class: builtin constructors, exceptions and user classes
    pub(crate) fn instantiate(
        &mut self,
        class: &Value,
        args: Vec<Value>,
        kwargs: Vec<(String, Value)>,
    ) -> EvalResult {
        let Some(class_data) = class.as_class() else {
            return Err(self.raise(ExcKind::TypeError, "expected a class"));
        };
        let name = class_data.name.clone();
        let is_exception = is_exception_class(class);

        if class_data.module == "builtins" {
            if !is_exception {
                return builtins::construct(self, &name, args, kwargs);
            }
            if !kwargs.is_empty() {
                let message = format!("{}() takes no keyword arguments", name);
                return Err(self.raise(ExcKind::TypeError, message));
            }
            return Ok(self.heap.alloc(Data::Instance(Instance {
                class: class.clone(),
                attrs: new_scope(),
                args,
            })));
        }

        let instance = self.heap.alloc(Data::Instance(Instance {
            class: class.clone(),
            attrs: new_scope(),
            args: if is_exception { args.clone() } else { Vec::new() },
        }));
        match lookup_class_attr(class, "__init__") {
            Some(init) if matches!(init.data(), Data::Function(_)) => {
                let mut full = Vec::with_capacity(args.len() + 1);
                full.push(instance.clone());
                full.extend(args);
                let result = self.call_function(&init, full, kwargs)?;
                if !result.is_none() {
                    let message = format!(
                        "__init__() should return None, not '{}'",
                        result.type_name()
                    );
                    return Err(self.raise(ExcKind::TypeError, message));
                }
            }
            _ => {
                if !is_exception && (!args.is_empty() || !kwargs.is_empty()) {
                    let message = format!("{}() takes no arguments", name);
                    return Err(self.raise(ExcKind::TypeError, message));
                }
            }
        }
        Ok(instance)
    }

    // ===== Conversions =====

    /// `str(value)`, honouring user `__str__` and `__repr__`
    pub(crate) fn to_display_string(&mut self, value: &Value) -> Result<String, RuntimeError> {
        if let Some(text) = self.call_user_text_method(value, "__str__")? {
            return Ok(text);
        }
        if let Some(text) = self.call_user_text_method(value, "__repr__")? {
            return Ok(text);
        }
        if matches!(
            value.data(),
            Data::List(_) | Data::Tuple(_) | Data::Dict(_) | Data::Set(_)
        ) {
            return self.to_repr_string(value);
        }
        str_value(value).map_err(|_| {
            self.raise(
                ExcKind::RecursionError,
                "maximum recursion depth exceeded while getting the str of an object",
            )
        })
    }

    /// `repr(value)`, honouring user `__repr__` on the value and on anything
    /// nested inside builtin containers
    pub(crate) fn to_repr_string(&mut self, value: &Value) -> Result<String, RuntimeError> {
        let mut active = Vec::new();
        self.repr_nested(value, &mut active)
    }

    fn repr_nested(&mut self, value: &Value, active: &mut Vec<u64>) -> Result<String, RuntimeError> {
        if let Some(text) = self.call_user_text_method(value, "__repr__")? {
            return Ok(text);
        }
        let (open, close) = match value.data() {
            Data::List(_) => ("[", "]"),
            Data::Tuple(_) => ("(", ")"),
            Data::Dict(_) => ("{", "}"),
            Data::Set(entries) if !entries.borrow().is_empty() => ("{", "}"),
            _ => return Ok(repr_or_placeholder(value)),
        };
        if active.contains(&value.address()) {
            return Ok(format!("{}...{}", open, close));
        }
        if active.len() >= MAX_REPR_DEPTH {
            return Err(self.raise(
                ExcKind::RecursionError,
                "maximum recursion depth exceeded while getting the repr of an object",
            ));
        }

        active.push(value.address());
        let mut parts = Vec::new();
        let result = (|| -> Result<(), RuntimeError> {
            match value.data() {
                Data::Dict(entries) => {
                    let pairs: Vec<(Value, Value)> = entries.borrow().values().cloned().collect();
                    for (key, item) in pairs {
                        let key = self.repr_nested(&key, active)?;
                        let item = self.repr_nested(&item, active)?;
                        parts.push(format!("{}: {}", key, item));
                    }
                }
                _ => {
                    let items = match value.data() {
                        Data::List(items) => items.borrow().clone(),
                        Data::Tuple(items) => items.clone(),
                        Data::Set(entries) => entries.borrow().values().cloned().collect(),
                        _ => Vec::new(),
                    };
                    for item in &items {
                        parts.push(self.repr_nested(item, active)?);
                    }
                }
            }
            Ok(())
        })();
        active.pop();
        result?;

        let trailing = if matches!(value.data(), Data::Tuple(_)) && parts.len() == 1 {
            ","
        } else {
            ""
        };
        Ok(format!("{}{}{}{}", open, parts.join(", "), trailing, close))
    }

    fn call_user_text_method(
        &mut self,
        value: &Value,
        name: &str,
    ) -> Result<Option<String>, RuntimeError> {
        let Some(instance) = value.as_instance() else {
            return Ok(None);
        };
        let Some(method) = lookup_class_attr(&instance.class, name) else {
            return Ok(None);
        };
        if !matches!(method.data(), Data::Function(_)) {
            return Ok(None);
        }
        let result = self.call_function(&method, vec![value.clone()], Vec::new())?;
        match result.as_str() {
            Some(text) => Ok(Some(text.to_string())),
            None => {
                let message = format!(
                    "{}() returned non-string (type {})",
                    name,
                    result.type_name()
                );
                Err(self.raise(ExcKind::TypeError, message))
            }
        }
    }

    /// Truth value of `value`
    pub(crate) fn truthy(&self, value: &Value) -> bool {
        match value.data() {
            Data::None => false,
            Data::Bool(b) => *b,
            Data::Int(n) => *n != 0,
            Data::Float(f) => *f != 0.0,
            Data::Str(s) => !s.is_empty(),
            Data::Bytes(b) => !b.is_empty(),
            Data::List(items) => !items.borrow().is_empty(),
            Data::Tuple(items) => !items.is_empty(),
            Data::Dict(entries) => !entries.borrow().is_empty(),
            Data::Set(entries) => !entries.borrow().is_empty(),
            Data::Range { start, stop, step } => {
                crate::memory::value::range_len(*start, *stop, *step) > 0
            }
            _ => true,
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

/// `'a'`, `'a' and 'b'`, `'a', 'b' and 'c'`
fn join_names(names: &[String]) -> String {
    match names {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_names() {
        assert_eq!(join_names(&["'a'".to_string()]), "'a'");
        assert_eq!(
            join_names(&["'a'".to_string(), "'b'".to_string(), "'c'".to_string()]),
            "'a', 'b' and 'c'"
        );
    }

    #[test]
    fn test_source_lines() {
        let mut interpreter = Interpreter::new();
        let id = interpreter.add_source("prog.py", "x = 1\ny = 2\n");
        assert_eq!(interpreter.source_name(id), "prog.py");
        assert_eq!(interpreter.source_line(id, 2), Some("y = 2"));
        assert_eq!(interpreter.source_line(id, 0), None);
        assert_eq!(interpreter.source_line(id, 3), None);
    }
}
