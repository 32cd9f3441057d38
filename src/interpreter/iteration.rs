//! Iteration over hosted values

use crate::interpreter::constants::MAX_REPEAT_LEN;
use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::types::ExcKind;
use crate::memory::heap::Heap;
use crate::memory::value::{range_len, Data, Value};

/// Cursor over an iterable.
///
/// Ranges are produced lazily and lists are read live, so appending to a
/// list while looping over it extends the loop. Other containers iterate over
/// a copy taken when the loop starts.
pub(crate) enum ValueIter {
    Range { next: i64, stop: i64, step: i64 },
    List { list: Value, index: usize },
    Items(std::vec::IntoIter<Value>),
}

impl ValueIter {
    pub(crate) fn next(&mut self, heap: &mut Heap) -> Option<Value> {
        match self {
            ValueIter::Range { next, stop, step } => {
                let more = if *step > 0 { *next < *stop } else { *next > *stop };
                if !more {
                    return None;
                }
                let current = *next;
                *next = next.checked_add(*step).unwrap_or(*stop);
                Some(heap.int(current))
            }
            ValueIter::List { list, index } => {
                let Data::List(items) = list.data() else {
                    return None;
                };
                let item = items.borrow().get(*index).cloned();
                *index += 1;
                item
            }
            ValueIter::Items(items) => items.next(),
        }
    }
}

impl Interpreter {
    pub(crate) fn iterate(&mut self, value: &Value) -> Result<ValueIter, RuntimeError> {
        let iter = match value.data() {
            Data::Range { start, stop, step } => ValueIter::Range {
                next: *start,
                stop: *stop,
                step: *step,
            },
            Data::List(_) => ValueIter::List {
                list: value.clone(),
                index: 0,
            },
            Data::Tuple(items) => ValueIter::Items(items.clone().into_iter()),
            Data::Dict(entries) => {
                let keys: Vec<Value> = entries.borrow().values().map(|(k, _)| k.clone()).collect();
                ValueIter::Items(keys.into_iter())
            }
            Data::Set(entries) => {
                let items: Vec<Value> = entries.borrow().values().cloned().collect();
                ValueIter::Items(items.into_iter())
            }
            Data::Str(s) => {
                let chars: Vec<Value> = s
                    .chars()
                    .map(|c| self.heap.str(c.to_string()))
                    .collect();
                ValueIter::Items(chars.into_iter())
            }
            Data::Bytes(bytes) => {
                let ints: Vec<Value> = bytes.iter().map(|b| self.heap.int(*b as i64)).collect();
                ValueIter::Items(ints.into_iter())
            }
            _ => {
                let message = format!("'{}' object is not iterable", value.type_name());
                return Err(self.raise(ExcKind::TypeError, message));
            }
        };
        Ok(iter)
    }

    /// Drain an iterable into a vector
    pub(crate) fn collect_iterable(&mut self, value: &Value) -> Result<Vec<Value>, RuntimeError> {
        if let Data::Range { start, stop, step } = value.data() {
            if range_len(*start, *stop, *step) > MAX_REPEAT_LEN as i128 {
                return Err(self.raise(ExcKind::OverflowError, "too many items to collect"));
            }
        }
        let mut iter = self.iterate(value)?;
        let mut items = Vec::new();
        while let Some(item) = iter.next(&mut self.heap) {
            if items.len() >= MAX_REPEAT_LEN {
                return Err(self.raise(ExcKind::OverflowError, "too many items to collect"));
            }
            items.push(item);
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_iteration_with_negative_step() {
        let mut interpreter = Interpreter::new();
        let range = interpreter.heap.alloc(Data::Range {
            start: 5,
            stop: 0,
            step: -2,
        });
        let items = interpreter.collect_iterable(&range).unwrap();
        let ints: Vec<i64> = items.iter().filter_map(Value::as_int).collect();
        assert_eq!(ints, [5, 3, 1]);
    }

    #[test]
    fn test_list_iteration_sees_appends() {
        let mut interpreter = Interpreter::new();
        let one = interpreter.heap.int(1);
        let list = interpreter.heap.list(vec![one]);
        let mut iter = interpreter.iterate(&list).unwrap();
        assert!(iter.next(&mut interpreter.heap).is_some());
        if let Data::List(items) = list.data() {
            let two = interpreter.heap.int(2);
            items.borrow_mut().push(two);
        }
        assert_eq!(iter.next(&mut interpreter.heap).and_then(|v| v.as_int()), Some(2));
        assert!(iter.next(&mut interpreter.heap).is_none());
    }

    #[test]
    fn test_int_is_not_iterable() {
        let mut interpreter = Interpreter::new();
        let n = interpreter.heap.int(3);
        let err = interpreter.iterate(&n).err().unwrap();
        assert_eq!(err.to_string(), "TypeError: 'int' object is not iterable");
    }
}
