//! Unary operator evaluation

use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::{EvalResult, RuntimeError};
use crate::interpreter::types::ExcKind;
use crate::memory::value::{Data, Value};
use crate::parser::ast::UnOp;

impl Interpreter {
    pub(crate) fn unary_op(&mut self, op: UnOp, operand: &Value) -> EvalResult {
        if op == UnOp::Not {
            let truth = self.truth_of(operand)?;
            return Ok(self.heap.bool(!truth));
        }

        let special = match op {
            UnOp::Neg => "__neg__",
            UnOp::Pos => "__pos__",
            _ => "__invert__",
        };
        if let Some(result) = self.call_dunder(operand, special, Vec::new())? {
            return Ok(result);
        }

        match (op, operand.data()) {
            (UnOp::Neg, Data::Int(_) | Data::Bool(_)) => {
                let n = operand.as_int().unwrap_or(0);
                match n.checked_neg() {
                    Some(negated) => Ok(self.heap.int(negated)),
                    None => Err(self.raise(ExcKind::OverflowError, "integer negation overflowed")),
                }
            }
            (UnOp::Neg, Data::Float(f)) => Ok(self.heap.float(-f)),
            (UnOp::Pos, Data::Int(_) | Data::Bool(_)) => {
                let n = operand.as_int().unwrap_or(0);
                Ok(self.heap.int(n))
            }
            (UnOp::Pos, Data::Float(_)) => Ok(operand.clone()),
            (UnOp::Invert, Data::Int(_) | Data::Bool(_)) => {
                let n = operand.as_int().unwrap_or(0);
                Ok(self.heap.int(!n))
            }
            _ => {
                let symbol = match op {
                    UnOp::Neg => "unary -",
                    UnOp::Pos => "unary +",
                    _ => "unary ~",
                };
                let message = format!(
                    "bad operand type for {}: '{}'",
                    symbol,
                    operand.type_name()
                );
                Err(self.raise(ExcKind::TypeError, message))
            }
        }
    }

    /// Truth value, honouring user `__bool__` and `__len__`
    pub(crate) fn truth_of(&mut self, value: &Value) -> Result<bool, RuntimeError> {
        if let Some(result) = self.call_dunder(value, "__bool__", Vec::new())? {
            return Ok(self.truthy(&result));
        }
        if let Some(result) = self.call_dunder(value, "__len__", Vec::new())? {
            return Ok(result.as_int().is_some_and(|n| n != 0));
        }
        Ok(self.truthy(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negation_and_not() {
        let mut interpreter = Interpreter::new();
        let five = interpreter.heap.int(5);
        let negated = interpreter.unary_op(UnOp::Neg, &five).unwrap();
        assert_eq!(negated.as_int(), Some(-5));
        let empty = interpreter.heap.list(Vec::new());
        let not_empty = interpreter.unary_op(UnOp::Not, &empty).unwrap();
        assert!(interpreter.truthy(&not_empty));
        let inverted = interpreter.unary_op(UnOp::Invert, &five).unwrap();
        assert_eq!(inverted.as_int(), Some(-6));
    }

    #[test]
    fn test_bad_operand() {
        let mut interpreter = Interpreter::new();
        let text = interpreter.heap.str("x");
        let err = interpreter.unary_op(UnOp::Neg, &text).unwrap_err();
        assert_eq!(err.to_string(), "TypeError: bad operand type for unary -: 'str'");
    }
}
