//! Expression evaluation

use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::{EvalResult, RuntimeError};
use crate::interpreter::iteration::ValueIter;
use crate::interpreter::types::ExcKind;
use crate::memory::value::{new_scope, Data, DictEntries, Scope, SetEntries, Value};
use crate::parser::ast::{BoolOp, Comprehension, Expr, FStringPart};
use std::cell::RefCell;

impl Interpreter {
    pub(crate) fn eval(&mut self, expr: &Expr) -> EvalResult {
        match expr {
            Expr::Int(n) => Ok(self.heap.int(*n)),
            Expr::Float(f) => Ok(self.heap.float(*f)),
            Expr::Str(s) => Ok(self.heap.str(s.as_str())),
            Expr::Bytes(b) => Ok(self.heap.alloc(Data::Bytes(b.clone()))),
            Expr::Bool(b) => Ok(self.heap.bool(*b)),
            Expr::NoneLit => Ok(self.heap.none()),
            Expr::FString(parts) => {
                let mut text = String::new();
                for part in parts {
                    match part {
                        FStringPart::Literal(literal) => text.push_str(literal),
                        FStringPart::Field { expr, repr, spec } => {
                            let value = self.eval(expr)?;
                            text.push_str(&self.format_field(&value, *repr, spec.as_deref())?);
                        }
                    }
                }
                Ok(self.heap.str(text))
            }
            Expr::Name(name) => self.load_name(name),
            Expr::List(items) => {
                let items = self.eval_all(items)?;
                Ok(self.heap.list(items))
            }
            Expr::Tuple(items) => {
                let items = self.eval_all(items)?;
                Ok(self.heap.tuple(items))
            }
            Expr::Set(items) => {
                let items = self.eval_all(items)?;
                let mut entries = SetEntries::new();
                for item in items {
                    let key = self.hash_key_of(&item)?;
                    entries.entry(key).or_insert(item);
                }
                Ok(self.heap.alloc(Data::Set(RefCell::new(entries))))
            }
            Expr::Dict(pairs) => {
                let mut entries = DictEntries::new();
                for (key, value) in pairs {
                    let key = self.eval(key)?;
                    let value = self.eval(value)?;
                    self.insert_entry(&mut entries, key, value)?;
                }
                Ok(self.heap.alloc(Data::Dict(RefCell::new(entries))))
            }
            Expr::ListComp { element, clause } => {
                let mut results = Vec::new();
                self.comprehension(clause, &mut |interp| {
                    results.push(interp.eval(element)?);
                    Ok(())
                })?;
                Ok(self.heap.list(results))
            }
            Expr::DictComp { key, value, clause } => {
                let mut entries = DictEntries::new();
                self.comprehension(clause, &mut |interp| {
                    let k = interp.eval(key)?;
                    let v = interp.eval(value)?;
                    interp.insert_entry(&mut entries, k, v)
                })?;
                Ok(self.heap.alloc(Data::Dict(RefCell::new(entries))))
            }
            Expr::Binary { op, left, right } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                self.binary_op(*op, &left, &right)
            }
            Expr::Unary { op, operand } => {
                let operand = self.eval(operand)?;
                self.unary_op(*op, &operand)
            }
            Expr::Logical { op, left, right } => {
                let left = self.eval(left)?;
                let truth = self.truth_of(&left)?;
                match (op, truth) {
                    (BoolOp::And, false) | (BoolOp::Or, true) => Ok(left),
                    _ => self.eval(right),
                }
            }
            Expr::Compare { left, rest } => {
                let mut current = self.eval(left)?;
                for (op, expr) in rest {
                    let right = self.eval(expr)?;
                    if !self.compare(*op, &current, &right)? {
                        return Ok(self.heap.bool(false));
                    }
                    current = right;
                }
                Ok(self.heap.bool(true))
            }
            Expr::Conditional {
                condition,
                then_value,
                else_value,
            } => {
                let condition = self.eval(condition)?;
                if self.truth_of(&condition)? {
                    self.eval(then_value)
                } else {
                    self.eval(else_value)
                }
            }
            Expr::Call { func, args, kwargs } => {
                let callee = self.eval(func)?;
                let args = self.eval_all(args)?;
                let mut keyword = Vec::with_capacity(kwargs.len());
                for (name, expr) in kwargs {
                    keyword.push((name.clone(), self.eval(expr)?));
                }
                self.call_value(&callee, args, keyword)
            }
            Expr::Attribute { value, name } => {
                let object = self.eval(value)?;
                self.get_attribute(&object, name)
            }
            Expr::Subscript { value, index } => {
                let object = self.eval(value)?;
                if let Expr::Slice { lower, upper, step } = index.as_ref() {
                    let lower = self.eval_optional(lower.as_deref())?;
                    let upper = self.eval_optional(upper.as_deref())?;
                    let step = self.eval_optional(step.as_deref())?;
                    return self.get_slice(&object, lower, upper, step);
                }
                let index = self.eval(index)?;
                self.get_item(&object, &index)
            }
            Expr::Slice { .. } => Err(self.raise(
                ExcKind::TypeError,
                "slices are only supported inside subscripts",
            )),
            Expr::Lambda(code) => self.make_function(code),
        }
    }

    fn eval_all(&mut self, exprs: &[Expr]) -> Result<Vec<Value>, RuntimeError> {
        exprs.iter().map(|expr| self.eval(expr)).collect()
    }

    fn eval_optional(&mut self, expr: Option<&Expr>) -> Result<Option<Value>, RuntimeError> {
        expr.map(|expr| self.eval(expr)).transpose()
    }

    /// Insert or overwrite a dict entry; the first key object is kept
    pub(crate) fn insert_entry(
        &mut self,
        entries: &mut DictEntries,
        key: Value,
        value: Value,
    ) -> Result<(), RuntimeError> {
        let hash = self.hash_key_of(&key)?;
        match entries.get_mut(&hash) {
            Some(slot) => slot.1 = value,
            None => {
                entries.insert(hash, (key, value));
            }
        }
        Ok(())
    }

    /// Run `body` once per item of a comprehension clause, with the clause
    /// variables bound in a scope of their own.
    fn comprehension(
        &mut self,
        clause: &Comprehension,
        body: &mut dyn FnMut(&mut Interpreter) -> Result<(), RuntimeError>,
    ) -> Result<(), RuntimeError> {
        let iterable = self.eval(&clause.iter)?;
        let mut items = self.iterate(&iterable)?;
        let scope = new_scope();
        if let Some(frame) = self.stack.current_mut() {
            frame.comprehensions.push(scope.clone());
        }
        let result = self.comprehension_loop(clause, &mut items, &scope, body);
        if let Some(frame) = self.stack.current_mut() {
            frame.comprehensions.pop();
        }
        result
    }

    fn comprehension_loop(
        &mut self,
        clause: &Comprehension,
        items: &mut ValueIter,
        scope: &Scope,
        body: &mut dyn FnMut(&mut Interpreter) -> Result<(), RuntimeError>,
    ) -> Result<(), RuntimeError> {
        while let Some(item) = items.next(&mut self.heap) {
            self.assign_comprehension_target(scope, &clause.target, item)?;
            if let Some(condition) = &clause.condition {
                let keep = self.eval(condition)?;
                if !self.truth_of(&keep)? {
                    continue;
                }
            }
            body(self)?;
        }
        Ok(())
    }
}
