//! Attribute access, subscripts and slices

use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::{EvalResult, RuntimeError};
use crate::interpreter::methods::native_method_name;
use crate::interpreter::types::{is_exception_class, lookup_class_attr, ExcKind};
use crate::memory::value::{range_len, Data, Value};

impl Interpreter {
    // ===== Attributes =====

    pub(crate) fn get_attribute(&mut self, object: &Value, name: &str) -> EvalResult {
        match object.data() {
            Data::Instance(instance) => {
                if name == "__class__" {
                    return Ok(instance.class.clone());
                }
                if let Some(value) = instance.attrs.borrow().get(name) {
                    return Ok(value.clone());
                }
                if name == "args" && is_exception_class(&instance.class) {
                    return Ok(self.heap.tuple(instance.args.clone()));
                }
                if let Some(value) = lookup_class_attr(&instance.class, name) {
                    if matches!(value.data(), Data::Function(_)) {
                        return Ok(self.heap.alloc(Data::BoundMethod {
                            receiver: object.clone(),
                            function: value,
                        }));
                    }
                    return Ok(value);
                }
            }
            Data::Class(class) => {
                if name == "__name__" {
                    return Ok(self.heap.str(class.name.clone()));
                }
                if name == "__base__" {
                    return Ok(class.base.clone().unwrap_or_else(|| self.heap.none()));
                }
                if let Some(value) = lookup_class_attr(object, name) {
                    return Ok(value);
                }
                let message = format!("type object '{}' has no attribute '{}'", class.name, name);
                return Err(self.raise(ExcKind::AttributeError, message));
            }
            Data::Function(function) if name == "__name__" => {
                return Ok(self.heap.str(function.code.name.clone()));
            }
            Data::Builtin(builtin) if name == "__name__" => {
                return Ok(self.heap.str(builtin.name));
            }
            _ => {
                if let Some(method) = native_method_name(object, name) {
                    return Ok(self.heap.alloc(Data::NativeMethod {
                        receiver: object.clone(),
                        name: method,
                    }));
                }
            }
        }
        let message = format!(
            "'{}' object has no attribute '{}'",
            object.type_name(),
            name
        );
        Err(self.raise(ExcKind::AttributeError, message))
    }

    pub(crate) fn set_attribute(
        &mut self,
        object: &Value,
        name: &str,
        value: Value,
    ) -> Result<(), RuntimeError> {
        let attrs = match object.data() {
            Data::Instance(instance) => &instance.attrs,
            Data::Class(class) if class.module != "builtins" => &class.attrs,
            Data::Class(class) => {
                let message = format!(
                    "cannot set '{}' attribute of immutable type '{}'",
                    name, class.name
                );
                return Err(self.raise(ExcKind::TypeError, message));
            }
            _ => {
                let message = format!(
                    "'{}' object has no attribute '{}'",
                    object.type_name(),
                    name
                );
                return Err(self.raise(ExcKind::AttributeError, message));
            }
        };
        attrs.borrow_mut().insert(name.to_string(), value);
        Ok(())
    }

    pub(crate) fn delete_attribute(&mut self, object: &Value, name: &str) -> Result<(), RuntimeError> {
        let removed = match object.data() {
            Data::Instance(instance) => instance.attrs.borrow_mut().shift_remove(name),
            Data::Class(class) if class.module != "builtins" => {
                class.attrs.borrow_mut().shift_remove(name)
            }
            _ => None,
        };
        if removed.is_none() {
            let message = format!(
                "'{}' object has no attribute '{}'",
                object.type_name(),
                name
            );
            return Err(self.raise(ExcKind::AttributeError, message));
        }
        Ok(())
    }

    // ===== Subscripts =====

    pub(crate) fn get_item(&mut self, object: &Value, index: &Value) -> EvalResult {
        match object.data() {
            Data::List(items) => {
                let items = items.borrow();
                let i = self.sequence_index(index, items.len(), "list")?;
                Ok(items[i].clone())
            }
            Data::Tuple(items) => {
                let i = self.sequence_index(index, items.len(), "tuple")?;
                Ok(items[i].clone())
            }
            Data::Str(s) => {
                let chars: Vec<char> = s.chars().collect();
                let i = self.sequence_index(index, chars.len(), "string")?;
                Ok(self.heap.str(chars[i].to_string()))
            }
            Data::Bytes(bytes) => {
                let i = self.sequence_index(index, bytes.len(), "index")?;
                Ok(self.heap.int(bytes[i] as i64))
            }
            Data::Range { start, stop, step } => {
                let len = range_len(*start, *stop, *step);
                let i = match index.as_int() {
                    Some(raw) if raw < 0 => i128::from(raw) + len,
                    Some(raw) => i128::from(raw),
                    None => {
                        let message = format!("range indices must be integers, not {}", index.type_name());
                        return Err(self.raise(ExcKind::TypeError, message));
                    }
                };
                if i < 0 || i >= len {
                    return Err(self.raise(ExcKind::IndexError, "range object index out of range"));
                }
                // Lies between start and stop, so it fits
                let item = i128::from(*start) + i128::from(*step) * i;
                Ok(self.heap.int(item as i64))
            }
            Data::Dict(entries) => {
                let key = self.hash_key_of(index)?;
                let found = entries.borrow().get(&key).map(|(_, v)| v.clone());
                match found {
                    Some(value) => Ok(value),
                    None => Err(self.raise_with(ExcKind::KeyError, vec![index.clone()])),
                }
            }
            _ => {
                let message = format!("'{}' object is not subscriptable", object.type_name());
                Err(self.raise(ExcKind::TypeError, message))
            }
        }
    }

    pub(crate) fn set_item(
        &mut self,
        object: &Value,
        index: &Value,
        value: Value,
    ) -> Result<(), RuntimeError> {
        match object.data() {
            Data::List(items) => {
                let len = items.borrow().len();
                let i = self.sequence_index(index, len, "list assignment")?;
                items.borrow_mut()[i] = value;
                Ok(())
            }
            Data::Dict(entries) => {
                let key = self.hash_key_of(index)?;
                let mut entries = entries.borrow_mut();
                match entries.get_mut(&key) {
                    Some(slot) => slot.1 = value,
                    None => {
                        entries.insert(key, (index.clone(), value));
                    }
                }
                Ok(())
            }
            _ => {
                let message = format!(
                    "'{}' object does not support item assignment",
                    object.type_name()
                );
                Err(self.raise(ExcKind::TypeError, message))
            }
        }
    }

    pub(crate) fn delete_item(&mut self, object: &Value, index: &Value) -> Result<(), RuntimeError> {
        match object.data() {
            Data::List(items) => {
                let len = items.borrow().len();
                let i = self.sequence_index(index, len, "list assignment")?;
                items.borrow_mut().remove(i);
                Ok(())
            }
            Data::Dict(entries) => {
                let key = self.hash_key_of(index)?;
                let removed = entries.borrow_mut().shift_remove(&key);
                match removed {
                    Some(_) => Ok(()),
                    None => Err(self.raise_with(ExcKind::KeyError, vec![index.clone()])),
                }
            }
            _ => {
                let message = format!(
                    "'{}' object does not support item deletion",
                    object.type_name()
                );
                Err(self.raise(ExcKind::TypeError, message))
            }
        }
    }

    /// Resolve a possibly negative index against `len`
    fn sequence_index(&mut self, index: &Value, len: usize, what: &str) -> Result<usize, RuntimeError> {
        let Some(raw) = index.as_int() else {
            let message = format!(
                "{} indices must be integers, not {}",
                what.split(' ').next().unwrap_or(what),
                index.type_name()
            );
            return Err(self.raise(ExcKind::TypeError, message));
        };
        let resolved = if raw < 0 { raw + len as i64 } else { raw };
        if resolved < 0 || resolved >= len as i64 {
            return Err(self.raise(
                ExcKind::IndexError,
                format!("{} index out of range", what),
            ));
        }
        Ok(resolved as usize)
    }

    // ===== Slices =====

    pub(crate) fn get_slice(
        &mut self,
        object: &Value,
        lower: Option<Value>,
        upper: Option<Value>,
        step: Option<Value>,
    ) -> EvalResult {
        let len = match object.data() {
            Data::List(items) => items.borrow().len(),
            Data::Tuple(items) => items.len(),
            Data::Str(s) => s.chars().count(),
            Data::Bytes(bytes) => bytes.len(),
            _ => {
                let message = format!("'{}' object is not subscriptable", object.type_name());
                return Err(self.raise(ExcKind::TypeError, message));
            }
        };
        let bound = |interp: &mut Interpreter, value: Option<Value>| -> Result<Option<i64>, RuntimeError> {
            match value {
                None => Ok(None),
                Some(v) if v.is_none() => Ok(None),
                Some(v) => match v.as_int() {
                    Some(n) => Ok(Some(n)),
                    None => Err(interp.raise(
                        ExcKind::TypeError,
                        "slice indices must be integers or None",
                    )),
                },
            }
        };
        let lower = bound(self, lower)?;
        let upper = bound(self, upper)?;
        let step = bound(self, step)?.unwrap_or(1);
        if step == 0 {
            return Err(self.raise(ExcKind::ValueError, "slice step cannot be zero"));
        }
        let indices = slice_indices(len, lower, upper, step);

        Ok(match object.data() {
            Data::List(items) => {
                let items = items.borrow();
                let picked = indices.iter().map(|&i| items[i].clone()).collect();
                self.heap.list(picked)
            }
            Data::Tuple(items) => {
                let picked = indices.iter().map(|&i| items[i].clone()).collect();
                self.heap.tuple(picked)
            }
            Data::Str(s) => {
                let chars: Vec<char> = s.chars().collect();
                let picked: String = indices.iter().map(|&i| chars[i]).collect();
                self.heap.str(picked)
            }
            Data::Bytes(bytes) => {
                let picked = indices.iter().map(|&i| bytes[i]).collect();
                self.heap.alloc(Data::Bytes(picked))
            }
            _ => self.heap.none(),
        })
    }
}

/// Positions selected by `[lower:upper:step]` on a sequence of length `len`
pub(crate) fn slice_indices(len: usize, lower: Option<i64>, upper: Option<i64>, step: i64) -> Vec<usize> {
    let len = len as i64;
    let clamp = |value: i64, low: i64, high: i64| value.max(low).min(high);
    let resolve = |value: i64| if value < 0 { value + len } else { value };

    let mut indices = Vec::new();
    if step > 0 {
        let start = lower.map_or(0, |v| clamp(resolve(v), 0, len));
        let stop = upper.map_or(len, |v| clamp(resolve(v), 0, len));
        let mut i = start;
        while i < stop {
            indices.push(i as usize);
            i += step;
        }
    } else {
        let start = lower.map_or(len - 1, |v| clamp(resolve(v), -1, len - 1));
        let stop = upper.map_or(-1, |v| clamp(resolve(v), -1, len - 1));
        let mut i = start;
        while i > stop {
            indices.push(i as usize);
            i += step;
        }
    }
    indices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_indices() {
        assert_eq!(slice_indices(5, None, None, 1), [0, 1, 2, 3, 4]);
        assert_eq!(slice_indices(5, Some(1), Some(3), 1), [1, 2]);
        assert_eq!(slice_indices(5, Some(-2), None, 1), [3, 4]);
        assert_eq!(slice_indices(5, None, None, -1), [4, 3, 2, 1, 0]);
        assert_eq!(slice_indices(5, None, None, 2), [0, 2, 4]);
        assert_eq!(slice_indices(5, Some(10), None, 1), Vec::<usize>::new());
        assert_eq!(slice_indices(5, Some(3), Some(0), -1), [3, 2, 1]);
        assert_eq!(slice_indices(0, None, None, -1), Vec::<usize>::new());
    }
}
