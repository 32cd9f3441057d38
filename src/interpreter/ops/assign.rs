//! Name resolution and assignment
//!
//! Lookup order depends on the kind of the current frame:
//! - function: statically local names, then enclosing function scopes, then
//!   module globals, then builtins
//! - class body: the class namespace, then enclosing scopes, globals, builtins
//! - module: globals, then builtins
//!
//! Comprehension variables shadow everything while their comprehension runs.

use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::{EvalResult, RuntimeError};
use crate::interpreter::types::ExcKind;
use crate::memory::stack::FrameKind;
use crate::memory::value::{Data, Scope, Value};
use crate::parser::ast::{BinOp, Expr, Target};

impl Interpreter {
    // ===== Names =====

    pub(crate) fn load_name(&mut self, name: &str) -> EvalResult {
        if let Some(value) = self.lookup_name(name)? {
            return Ok(value);
        }
        Err(self.raise(
            ExcKind::NameError,
            format!("name '{}' is not defined", name),
        ))
    }

    fn lookup_name(&mut self, name: &str) -> Result<Option<Value>, RuntimeError> {
        let Some(frame) = self.stack.current() else {
            return Ok(self.builtins.borrow().get(name).cloned());
        };

        for scope in frame.comprehensions.iter().rev() {
            if let Some(value) = scope.borrow().get(name) {
                return Ok(Some(value.clone()));
            }
        }

        let found = match frame.kind {
            FrameKind::Function if frame.declares_global(name) => {
                frame.globals.borrow().get(name).cloned()
            }
            FrameKind::Function if frame.is_local_name(name) => {
                let value = frame.locals.borrow().get(name).cloned();
                if value.is_none() {
                    let message = format!(
                        "cannot access local variable '{}' where it is not associated with a value",
                        name
                    );
                    return Err(self.raise(ExcKind::UnboundLocalError, message));
                }
                value
            }
            FrameKind::Function | FrameKind::Class => {
                let local = if frame.kind == FrameKind::Class {
                    frame.locals.borrow().get(name).cloned()
                } else {
                    None
                };
                local
                    .or_else(|| {
                        frame
                            .closure
                            .iter()
                            .rev()
                            .find_map(|scope| scope.borrow().get(name).cloned())
                    })
                    .or_else(|| frame.globals.borrow().get(name).cloned())
            }
            FrameKind::Module => frame.globals.borrow().get(name).cloned(),
        };
        Ok(found.or_else(|| self.builtins.borrow().get(name).cloned()))
    }

    /// Bind `name` in the scope the current frame assigns to
    pub(crate) fn store_name(&mut self, name: &str, value: Value) -> Result<(), RuntimeError> {
        let scope = self.binding_scope(name)?;
        scope.borrow_mut().insert(name.to_string(), value);
        Ok(())
    }

    pub(crate) fn delete_name(&mut self, name: &str) -> Result<(), RuntimeError> {
        let scope = self.binding_scope(name)?;
        let removed = scope.borrow_mut().shift_remove(name);
        if removed.is_none() {
            return Err(self.raise(
                ExcKind::NameError,
                format!("name '{}' is not defined", name),
            ));
        }
        Ok(())
    }

    /// Unbind `name` if it is bound
    pub(crate) fn discard_name(&mut self, name: &str) -> Result<(), RuntimeError> {
        let scope = self.binding_scope(name)?;
        scope.borrow_mut().shift_remove(name);
        Ok(())
    }

    fn binding_scope(&mut self, name: &str) -> Result<Scope, RuntimeError> {
        let Some(frame) = self.stack.current() else {
            return Err(self.raise(ExcKind::RuntimeError, "no active frame"));
        };
        if frame.declares_global(name) {
            return Ok(frame.globals.clone());
        }
        if frame.declares_nonlocal(name) {
            let enclosing = frame
                .closure
                .iter()
                .rev()
                .find(|scope| scope.borrow().contains_key(name))
                .cloned();
            return match enclosing {
                Some(scope) => Ok(scope),
                None => Err(self.raise(
                    ExcKind::NameError,
                    format!("no binding for nonlocal '{}' found", name),
                )),
            };
        }
        Ok(frame.locals.clone())
    }

    // ===== Targets =====

    pub(crate) fn assign_target(&mut self, target: &Target, value: Value) -> Result<(), RuntimeError> {
        match target {
            Target::Name(name) => self.store_name(name, value),
            Target::Attribute { value: object, name } => {
                let object = self.eval(object)?;
                self.set_attribute(&object, name, value)
            }
            Target::Subscript { value: object, index } => {
                let object = self.eval(object)?;
                let index = self.eval(index)?;
                self.set_item(&object, &index, value)
            }
            Target::Tuple(targets) => {
                let items = self.unpack(&value, targets.len())?;
                for (target, item) in targets.iter().zip(items) {
                    self.assign_target(target, item)?;
                }
                Ok(())
            }
        }
    }

    /// Bind a comprehension target inside `scope`
    pub(crate) fn assign_comprehension_target(
        &mut self,
        scope: &Scope,
        target: &Target,
        value: Value,
    ) -> Result<(), RuntimeError> {
        match target {
            Target::Name(name) => {
                scope.borrow_mut().insert(name.clone(), value);
                Ok(())
            }
            Target::Tuple(targets) => {
                let items = self.unpack(&value, targets.len())?;
                for (target, item) in targets.iter().zip(items) {
                    self.assign_comprehension_target(scope, target, item)?;
                }
                Ok(())
            }
            _ => self.assign_target(target, value),
        }
    }

    fn unpack(&mut self, value: &Value, expected: usize) -> Result<Vec<Value>, RuntimeError> {
        if !matches!(
            value.data(),
            Data::List(_) | Data::Tuple(_) | Data::Str(_) | Data::Range { .. } | Data::Dict(_) | Data::Set(_)
        ) {
            let message = format!("cannot unpack non-iterable {} object", value.type_name());
            return Err(self.raise(ExcKind::TypeError, message));
        }
        let items = self.collect_iterable(value)?;
        if items.len() > expected {
            let message = format!("too many values to unpack (expected {})", expected);
            return Err(self.raise(ExcKind::ValueError, message));
        }
        if items.len() < expected {
            let message = format!(
                "not enough values to unpack (expected {}, got {})",
                expected,
                items.len()
            );
            return Err(self.raise(ExcKind::ValueError, message));
        }
        Ok(items)
    }

    pub(crate) fn delete_target(&mut self, target: &Target) -> Result<(), RuntimeError> {
        match target {
            Target::Name(name) => self.delete_name(name),
            Target::Attribute { value: object, name } => {
                let object = self.eval(object)?;
                self.delete_attribute(&object, name)
            }
            Target::Subscript { value: object, index } => {
                let object = self.eval(object)?;
                let index = self.eval(index)?;
                self.delete_item(&object, &index)
            }
            Target::Tuple(targets) => {
                for target in targets {
                    self.delete_target(target)?;
                }
                Ok(())
            }
        }
    }

    /// `target op= value`. Lists are extended in place by `+=`; the
    /// container and index of subscript and attribute targets are evaluated
    /// once.
    pub(crate) fn augmented_assign(
        &mut self,
        target: &Target,
        op: BinOp,
        value: &Expr,
    ) -> Result<(), RuntimeError> {
        match target {
            Target::Name(name) => {
                let current = self.load_name(name)?;
                let operand = self.eval(value)?;
                let result = self.inplace_op(op, &current, &operand)?;
                self.store_name(name, result)
            }
            Target::Attribute { value: object, name } => {
                let object = self.eval(object)?;
                let current = self.get_attribute(&object, name)?;
                let operand = self.eval(value)?;
                let result = self.inplace_op(op, &current, &operand)?;
                self.set_attribute(&object, name, result)
            }
            Target::Subscript { value: object, index } => {
                let object = self.eval(object)?;
                let index = self.eval(index)?;
                let current = self.get_item(&object, &index)?;
                let operand = self.eval(value)?;
                let result = self.inplace_op(op, &current, &operand)?;
                self.set_item(&object, &index, result)
            }
            Target::Tuple(_) => Err(self.raise(
                ExcKind::TypeError,
                "illegal expression for augmented assignment",
            )),
        }
    }

    fn inplace_op(&mut self, op: BinOp, current: &Value, operand: &Value) -> EvalResult {
        if op == BinOp::Add {
            if let Data::List(items) = current.data() {
                let extra = match operand.data() {
                    Data::List(other) => other.borrow().clone(),
                    _ => self.collect_iterable(operand)?,
                };
                items.borrow_mut().extend(extra);
                return Ok(current.clone());
            }
        }
        self.binary_op(op, current, operand)
    }
}
