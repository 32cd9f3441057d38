//! Methods of builtin values (`list.append`, `dict.get`, `str.split`, ...)
//!
//! Attribute lookup on a builtin value yields a `NativeMethod` carrying the
//! receiver and the method name; calling it dispatches here.

use crate::interpreter::builtins::{check_arity, reject_kwargs, take_kwarg};
use crate::interpreter::constants::MAX_REPEAT_LEN;
use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::{EvalResult, RuntimeError};
use crate::interpreter::types::ExcKind;
use crate::memory::value::{Data, SetEntries, Value};
use crate::parser::ast::CmpOp;
use std::cell::RefCell;

const LIST_METHODS: &[&str] = &[
    "append", "extend", "pop", "insert", "remove", "index", "count", "reverse", "sort", "clear",
    "copy",
];

const DICT_METHODS: &[&str] = &[
    "get", "keys", "values", "items", "pop", "setdefault", "update", "clear", "copy",
];

const SET_METHODS: &[&str] = &[
    "add", "remove", "discard", "pop", "clear", "copy", "union", "intersection", "difference",
];

const STR_METHODS: &[&str] = &[
    "upper", "lower", "strip", "lstrip", "rstrip", "split", "join", "replace", "startswith",
    "endswith", "find", "count", "isdigit", "isalpha", "isspace", "title", "capitalize", "format",
    "zfill", "ljust", "rjust", "center",
];

/// The interned method name if `object` has a builtin method called `name`
pub(crate) fn native_method_name(object: &Value, name: &str) -> Option<&'static str> {
    let table = match object.data() {
        Data::List(_) => LIST_METHODS,
        Data::Dict(_) => DICT_METHODS,
        Data::Set(_) => SET_METHODS,
        Data::Str(_) => STR_METHODS,
        _ => return None,
    };
    table.iter().find(|method| **method == name).copied()
}

impl Interpreter {
    pub(crate) fn call_native_method(
        &mut self,
        receiver: &Value,
        name: &str,
        args: Vec<Value>,
        kwargs: Vec<(String, Value)>,
    ) -> EvalResult {
        match receiver.data() {
            Data::List(_) => self.list_method(receiver, name, args, kwargs),
            Data::Dict(_) => {
                reject_kwargs(self, name, &kwargs)?;
                self.dict_method(receiver, name, args)
            }
            Data::Set(_) => {
                reject_kwargs(self, name, &kwargs)?;
                self.set_method(receiver, name, args)
            }
            Data::Str(s) => {
                let s = s.clone();
                if name == "format" {
                    let text = self.str_format(&s, &args, &kwargs)?;
                    return Ok(self.heap.str(text));
                }
                reject_kwargs(self, name, &kwargs)?;
                self.str_method(&s, name, args)
            }
            _ => {
                let message = format!(
                    "'{}' object has no attribute '{}'",
                    receiver.type_name(),
                    name
                );
                Err(self.raise(ExcKind::AttributeError, message))
            }
        }
    }

    // ===== list =====

    fn list_method(
        &mut self,
        receiver: &Value,
        name: &str,
        args: Vec<Value>,
        mut kwargs: Vec<(String, Value)>,
    ) -> EvalResult {
        let Data::List(items) = receiver.data() else {
            return Ok(self.heap.none());
        };
        if name == "sort" {
            check_arity(self, name, args.len(), 0, 0)?;
            let key = take_kwarg(&mut kwargs, "key").filter(|key| !key.is_none());
            let reverse = match take_kwarg(&mut kwargs, "reverse") {
                Some(flag) => self.truth_of(&flag)?,
                None => false,
            };
            reject_kwargs(self, name, &kwargs)?;
            let current = items.borrow().clone();
            let sorted = self.sort_values(current, key, reverse)?;
            *items.borrow_mut() = sorted;
            return Ok(self.heap.none());
        }
        reject_kwargs(self, name, &kwargs)?;

        match name {
            "append" => {
                check_arity(self, name, args.len(), 1, 1)?;
                items.borrow_mut().extend(args);
            }
            "extend" => {
                check_arity(self, name, args.len(), 1, 1)?;
                let extra = self.collect_iterable(&args[0])?;
                items.borrow_mut().extend(extra);
            }
            "pop" => {
                check_arity(self, name, args.len(), 0, 1)?;
                let len = items.borrow().len();
                if len == 0 {
                    return Err(self.raise(ExcKind::IndexError, "pop from empty list"));
                }
                let index = match args.first() {
                    Some(index) => self.index_arg(index)?,
                    None => -1,
                };
                let resolved = if index < 0 { index + len as i64 } else { index };
                if resolved < 0 || resolved >= len as i64 {
                    return Err(self.raise(ExcKind::IndexError, "pop index out of range"));
                }
                return Ok(items.borrow_mut().remove(resolved as usize));
            }
            "insert" => {
                check_arity(self, name, args.len(), 2, 2)?;
                let index = self.index_arg(&args[0])?;
                let len = items.borrow().len() as i64;
                let position = if index < 0 { (index + len).max(0) } else { index.min(len) };
                items.borrow_mut().insert(position as usize, args[1].clone());
            }
            "remove" | "index" => {
                check_arity(self, name, args.len(), 1, 1)?;
                let snapshot = items.borrow().clone();
                let mut found = None;
                for (position, item) in snapshot.iter().enumerate() {
                    if item.is(&args[0]) || self.equals(item, &args[0])? {
                        found = Some(position);
                        break;
                    }
                }
                return match (name, found) {
                    ("index", Some(position)) => Ok(self.heap.int(position as i64)),
                    (_, Some(position)) => {
                        let mut items = items.borrow_mut();
                        if position < items.len() {
                            items.remove(position);
                        }
                        Ok(self.heap.none())
                    }
                    ("index", None) => {
                        let shown = self.to_repr_string(&args[0])?;
                        Err(self.raise(ExcKind::ValueError, format!("{} is not in list", shown)))
                    }
                    _ => Err(self.raise(ExcKind::ValueError, "list.remove(x): x not in list")),
                };
            }
            "count" => {
                check_arity(self, name, args.len(), 1, 1)?;
                let snapshot = items.borrow().clone();
                let mut count = 0;
                for item in &snapshot {
                    if item.is(&args[0]) || self.equals(item, &args[0])? {
                        count += 1;
                    }
                }
                return Ok(self.heap.int(count));
            }
            "reverse" => {
                check_arity(self, name, args.len(), 0, 0)?;
                items.borrow_mut().reverse();
            }
            "clear" => {
                check_arity(self, name, args.len(), 0, 0)?;
                items.borrow_mut().clear();
            }
            "copy" => {
                check_arity(self, name, args.len(), 0, 0)?;
                let copy = items.borrow().clone();
                return Ok(self.heap.list(copy));
            }
            _ => return Err(self.no_method(receiver, name)),
        }
        Ok(self.heap.none())
    }

    // ===== dict =====

    fn dict_method(&mut self, receiver: &Value, name: &str, args: Vec<Value>) -> EvalResult {
        let Data::Dict(entries) = receiver.data() else {
            return Ok(self.heap.none());
        };
        match name {
            "get" => {
                check_arity(self, name, args.len(), 1, 2)?;
                let key = self.hash_key_of(&args[0])?;
                let found = entries.borrow().get(&key).map(|(_, v)| v.clone());
                Ok(found
                    .or_else(|| args.get(1).cloned())
                    .unwrap_or_else(|| self.heap.none()))
            }
            "keys" | "values" | "items" => {
                check_arity(self, name, args.len(), 0, 0)?;
                let pairs: Vec<(Value, Value)> = entries.borrow().values().cloned().collect();
                let listed: Vec<Value> = match name {
                    "keys" => pairs.into_iter().map(|(k, _)| k).collect(),
                    "values" => pairs.into_iter().map(|(_, v)| v).collect(),
                    _ => pairs
                        .into_iter()
                        .map(|(k, v)| self.heap.tuple(vec![k, v]))
                        .collect(),
                };
                Ok(self.heap.list(listed))
            }
            "pop" => {
                check_arity(self, name, args.len(), 1, 2)?;
                let key = self.hash_key_of(&args[0])?;
                let removed = entries.borrow_mut().shift_remove(&key);
                match (removed, args.get(1)) {
                    (Some((_, value)), _) => Ok(value),
                    (None, Some(default)) => Ok(default.clone()),
                    (None, None) => Err(self.raise_with(ExcKind::KeyError, vec![args[0].clone()])),
                }
            }
            "setdefault" => {
                check_arity(self, name, args.len(), 1, 2)?;
                let key = self.hash_key_of(&args[0])?;
                let default = args.get(1).cloned().unwrap_or_else(|| self.heap.none());
                let mut entries = entries.borrow_mut();
                let (_, value) = entries
                    .entry(key)
                    .or_insert_with(|| (args[0].clone(), default));
                Ok(value.clone())
            }
            "update" => {
                check_arity(self, name, args.len(), 0, 1)?;
                if let Some(other) = args.first() {
                    let pairs = self.pairs_of(other)?;
                    let mut updated = entries.borrow().clone();
                    for (key, value) in pairs {
                        self.insert_entry(&mut updated, key, value)?;
                    }
                    *entries.borrow_mut() = updated;
                }
                Ok(self.heap.none())
            }
            "clear" => {
                check_arity(self, name, args.len(), 0, 0)?;
                entries.borrow_mut().clear();
                Ok(self.heap.none())
            }
            "copy" => {
                check_arity(self, name, args.len(), 0, 0)?;
                let copy = entries.borrow().clone();
                Ok(self.heap.alloc(Data::Dict(RefCell::new(copy))))
            }
            _ => Err(self.no_method(receiver, name)),
        }
    }

    /// Key/value pairs of a mapping or of an iterable of pairs
    pub(crate) fn pairs_of(&mut self, source: &Value) -> Result<Vec<(Value, Value)>, RuntimeError> {
        if let Data::Dict(entries) = source.data() {
            return Ok(entries.borrow().values().cloned().collect());
        }
        let items = self.collect_iterable(source)?;
        let mut pairs = Vec::with_capacity(items.len());
        for (position, item) in items.iter().enumerate() {
            let pair = self.collect_iterable(item).ok().filter(|pair| pair.len() == 2);
            match pair {
                Some(pair) => pairs.push((pair[0].clone(), pair[1].clone())),
                None => {
                    let message = format!(
                        "dictionary update sequence element #{} has the wrong shape",
                        position
                    );
                    return Err(self.raise(ExcKind::ValueError, message));
                }
            }
        }
        Ok(pairs)
    }

    // ===== set =====

    fn set_method(&mut self, receiver: &Value, name: &str, args: Vec<Value>) -> EvalResult {
        let Data::Set(entries) = receiver.data() else {
            return Ok(self.heap.none());
        };
        match name {
            "add" | "remove" | "discard" => {
                check_arity(self, name, args.len(), 1, 1)?;
                let key = self.hash_key_of(&args[0])?;
                let mut entries = entries.borrow_mut();
                match name {
                    "add" => {
                        entries.entry(key).or_insert_with(|| args[0].clone());
                    }
                    "discard" => {
                        entries.shift_remove(&key);
                    }
                    _ => {
                        if entries.shift_remove(&key).is_none() {
                            drop(entries);
                            return Err(self.raise_with(ExcKind::KeyError, vec![args[0].clone()]));
                        }
                    }
                }
                Ok(self.heap.none())
            }
            "pop" => {
                check_arity(self, name, args.len(), 0, 0)?;
                let popped = entries.borrow_mut().shift_remove_index(0);
                match popped {
                    Some((_, value)) => Ok(value),
                    None => Err(self.raise(ExcKind::KeyError, "pop from an empty set")),
                }
            }
            "clear" => {
                check_arity(self, name, args.len(), 0, 0)?;
                entries.borrow_mut().clear();
                Ok(self.heap.none())
            }
            "copy" => {
                check_arity(self, name, args.len(), 0, 0)?;
                let copy = entries.borrow().clone();
                Ok(self.heap.alloc(Data::Set(RefCell::new(copy))))
            }
            "union" | "intersection" | "difference" => {
                let mut result: SetEntries = entries.borrow().clone();
                for other in &args {
                    let other = self.set_entries_of(other)?;
                    result = match name {
                        "union" => {
                            for (key, value) in other {
                                result.entry(key).or_insert(value);
                            }
                            result
                        }
                        "intersection" => result
                            .into_iter()
                            .filter(|(key, _)| other.contains_key(key))
                            .collect(),
                        _ => result
                            .into_iter()
                            .filter(|(key, _)| !other.contains_key(key))
                            .collect(),
                    };
                }
                Ok(self.heap.alloc(Data::Set(RefCell::new(result))))
            }
            _ => Err(self.no_method(receiver, name)),
        }
    }

    /// Members of any iterable, keyed for set operations
    pub(crate) fn set_entries_of(&mut self, source: &Value) -> Result<SetEntries, RuntimeError> {
        if let Data::Set(entries) = source.data() {
            return Ok(entries.borrow().clone());
        }
        let mut entries = SetEntries::new();
        for item in self.collect_iterable(source)? {
            let key = self.hash_key_of(&item)?;
            entries.entry(key).or_insert(item);
        }
        Ok(entries)
    }

    // ===== str =====

    fn str_method(&mut self, s: &str, name: &str, args: Vec<Value>) -> EvalResult {
        let text_arg = |interp: &mut Interpreter, value: &Value| -> Result<String, RuntimeError> {
            match value.as_str() {
                Some(text) => Ok(text.to_string()),
                None => {
                    let message = format!("must be str, not {}", value.type_name());
                    Err(interp.raise(ExcKind::TypeError, message))
                }
            }
        };

        match name {
            "upper" | "lower" | "title" | "capitalize" => {
                check_arity(self, name, args.len(), 0, 0)?;
                let converted = match name {
                    "upper" => s.to_uppercase(),
                    "lower" => s.to_lowercase(),
                    "title" => title_case(s),
                    _ => capitalize(s),
                };
                Ok(self.heap.str(converted))
            }
            "strip" | "lstrip" | "rstrip" => {
                check_arity(self, name, args.len(), 0, 1)?;
                let chars = match args.first().filter(|v| !v.is_none()) {
                    Some(value) => Some(text_arg(self, value)?),
                    None => None,
                };
                let matches = |c: char| match &chars {
                    Some(set) => set.contains(c),
                    None => c.is_whitespace(),
                };
                let stripped = match name {
                    "strip" => s.trim_matches(matches),
                    "lstrip" => s.trim_start_matches(matches),
                    _ => s.trim_end_matches(matches),
                };
                Ok(self.heap.str(stripped))
            }
            "split" => {
                check_arity(self, name, args.len(), 0, 2)?;
                let separator = match args.first().filter(|v| !v.is_none()) {
                    Some(value) => Some(text_arg(self, value)?),
                    None => None,
                };
                let max_split = match args.get(1) {
                    Some(value) => self.index_arg(value)?,
                    None => -1,
                };
                let pieces: Vec<String> = match separator {
                    Some(sep) if sep.is_empty() => {
                        return Err(self.raise(ExcKind::ValueError, "empty separator"))
                    }
                    Some(sep) if max_split >= 0 => s
                        .splitn(max_split as usize + 1, sep.as_str())
                        .map(str::to_string)
                        .collect(),
                    Some(sep) => s.split(sep.as_str()).map(str::to_string).collect(),
                    None => split_whitespace(s, max_split),
                };
                let values = pieces.into_iter().map(|piece| self.heap.str(piece)).collect();
                Ok(self.heap.list(values))
            }
            "join" => {
                check_arity(self, name, args.len(), 1, 1)?;
                let items = self.collect_iterable(&args[0])?;
                let mut parts = Vec::with_capacity(items.len());
                for (position, item) in items.iter().enumerate() {
                    match item.as_str() {
                        Some(text) => parts.push(text.to_string()),
                        None => {
                            let message = format!(
                                "sequence item {}: expected str instance, {} found",
                                position,
                                item.type_name()
                            );
                            return Err(self.raise(ExcKind::TypeError, message));
                        }
                    }
                }
                Ok(self.heap.str(parts.join(s)))
            }
            "replace" => {
                check_arity(self, name, args.len(), 2, 3)?;
                let old = text_arg(self, &args[0])?;
                let new = text_arg(self, &args[1])?;
                let count = match args.get(2) {
                    Some(count) => self.index_arg(count)?,
                    None => -1,
                };
                let replaced = if count >= 0 {
                    s.replacen(old.as_str(), &new, count as usize)
                } else {
                    s.replace(old.as_str(), &new)
                };
                Ok(self.heap.str(replaced))
            }
            "startswith" | "endswith" => {
                check_arity(self, name, args.len(), 1, 1)?;
                let candidates = match args[0].data() {
                    Data::Tuple(items) => items.clone(),
                    _ => vec![args[0].clone()],
                };
                let mut matched = false;
                for candidate in &candidates {
                    let affix = text_arg(self, candidate)?;
                    matched |= if name == "startswith" {
                        s.starts_with(affix.as_str())
                    } else {
                        s.ends_with(affix.as_str())
                    };
                }
                Ok(self.heap.bool(matched))
            }
            "find" => {
                check_arity(self, name, args.len(), 1, 1)?;
                let needle = text_arg(self, &args[0])?;
                let position = s
                    .find(needle.as_str())
                    .map_or(-1, |byte| s[..byte].chars().count() as i64);
                Ok(self.heap.int(position))
            }
            "count" => {
                check_arity(self, name, args.len(), 1, 1)?;
                let needle = text_arg(self, &args[0])?;
                let count = if needle.is_empty() {
                    s.chars().count() + 1
                } else {
                    s.matches(needle.as_str()).count()
                };
                Ok(self.heap.int(count as i64))
            }
            "isdigit" | "isalpha" | "isspace" => {
                check_arity(self, name, args.len(), 0, 0)?;
                let test: fn(char) -> bool = match name {
                    "isdigit" => |c| c.is_ascii_digit(),
                    "isalpha" => char::is_alphabetic,
                    _ => char::is_whitespace,
                };
                Ok(self.heap.bool(!s.is_empty() && s.chars().all(test)))
            }
            "zfill" => {
                check_arity(self, name, args.len(), 1, 1)?;
                let width = self.width_arg(&args[0])?;
                let len = s.chars().count();
                if len >= width {
                    return Ok(self.heap.str(s));
                }
                let (sign, digits) = match s.strip_prefix(['-', '+']) {
                    Some(rest) => (&s[..1], rest),
                    None => ("", s),
                };
                Ok(self.heap.str(format!("{}{}{}", sign, "0".repeat(width - len), digits)))
            }
            "ljust" | "rjust" | "center" => {
                check_arity(self, name, args.len(), 1, 2)?;
                let width = self.width_arg(&args[0])?;
                let fill = match args.get(1) {
                    Some(value) => {
                        let fill = text_arg(self, value)?;
                        let mut chars = fill.chars();
                        match (chars.next(), chars.next()) {
                            (Some(c), None) => c,
                            _ => {
                                return Err(self.raise(
                                    ExcKind::TypeError,
                                    "The fill character must be exactly one character long",
                                ))
                            }
                        }
                    }
                    None => ' ',
                };
                let len = s.chars().count();
                let padding = width.saturating_sub(len);
                let pad = |n: usize| fill.to_string().repeat(n);
                let padded = match name {
                    "ljust" => format!("{}{}", s, pad(padding)),
                    "rjust" => format!("{}{}", pad(padding), s),
                    _ => {
                        let left = padding / 2 + (padding & width & 1);
                        format!("{}{}{}", pad(left), s, pad(padding - left))
                    }
                };
                Ok(self.heap.str(padded))
            }
            _ => {
                let receiver = self.heap.str(s);
                Err(self.no_method(&receiver, name))
            }
        }
    }

    fn no_method(&mut self, receiver: &Value, name: &str) -> RuntimeError {
        let message = format!(
            "'{}' object has no attribute '{}'",
            receiver.type_name(),
            name
        );
        self.raise(ExcKind::AttributeError, message)
    }

    /// An integer argument (`int` or `bool`)
    /// Padding width for `zfill`, `ljust`, `rjust` and `center`
    fn width_arg(&mut self, value: &Value) -> Result<usize, RuntimeError> {
        let width = self.index_arg(value)?.max(0) as usize;
        if width > MAX_REPEAT_LEN {
            return Err(self.raise(ExcKind::ValueError, "width too big"));
        }
        Ok(width)
    }

    pub(crate) fn index_arg(&mut self, value: &Value) -> Result<i64, RuntimeError> {
        match value.as_int() {
            Some(n) => Ok(n),
            None => {
                let message = format!(
                    "'{}' object cannot be interpreted as an integer",
                    value.type_name()
                );
                Err(self.raise(ExcKind::TypeError, message))
            }
        }
    }

    // ===== Sorting =====

    /// Stable sort by `key(item)` (or the item itself) using `<`
    pub(crate) fn sort_values(
        &mut self,
        items: Vec<Value>,
        key: Option<Value>,
        reverse: bool,
    ) -> Result<Vec<Value>, RuntimeError> {
        let mut keyed = Vec::with_capacity(items.len());
        for item in items {
            let sort_key = match &key {
                Some(key) => self.call_value(key, vec![item.clone()], Vec::new())?,
                None => item.clone(),
            };
            keyed.push((sort_key, item));
        }
        let sorted = merge_sort(keyed, &mut |a: &(Value, Value), b: &(Value, Value)| {
            if reverse {
                self.compare(CmpOp::Lt, &a.0, &b.0)
            } else {
                self.compare(CmpOp::Lt, &b.0, &a.0)
            }
        })?;
        Ok(sorted.into_iter().map(|(_, item)| item).collect())
    }
}

/// Stable merge sort with a fallible comparator. `goes_after(a, b)` is true
/// when `a` must be placed after `b`; equal elements keep their order.
pub(crate) fn merge_sort<T, E>(
    items: Vec<T>,
    goes_after: &mut dyn FnMut(&T, &T) -> Result<bool, E>,
) -> Result<Vec<T>, E> {
    if items.len() <= 1 {
        return Ok(items);
    }
    let mut items = items;
    let right = items.split_off(items.len() / 2);
    let left = merge_sort(items, goes_after)?;
    let right = merge_sort(right, goes_after)?;

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    loop {
        let take_right = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => goes_after(l, r)?,
            (Some(_), None) => false,
            (None, Some(_)) => true,
            (None, None) => break,
        };
        let next = if take_right { right.next() } else { left.next() };
        merged.extend(next);
    }
    Ok(merged)
}

fn split_whitespace(s: &str, max_split: i64) -> Vec<String> {
    if max_split < 0 {
        return s.split_whitespace().map(str::to_string).collect();
    }
    let mut pieces = Vec::new();
    let mut rest = s.trim_start();
    while !rest.is_empty() {
        if pieces.len() as i64 == max_split {
            pieces.push(rest.to_string());
            break;
        }
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        pieces.push(rest[..end].to_string());
        rest = rest[end..].trim_start();
    }
    pieces
}

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut previous_cased = false;
    for c in s.chars() {
        if previous_cased {
            out.extend(c.to_lowercase());
        } else {
            out.extend(c.to_uppercase());
        }
        previous_cased = c.is_alphabetic();
    }
    out
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_sort_is_stable() {
        let items = vec![(2, 'a'), (1, 'b'), (2, 'c'), (1, 'd')];
        let sorted = merge_sort(items, &mut |a: &(i32, char), b: &(i32, char)| {
            Ok::<bool, ()>(a.0 > b.0)
        })
        .unwrap();
        assert_eq!(sorted, [(1, 'b'), (1, 'd'), (2, 'a'), (2, 'c')]);
    }

    #[test]
    fn test_merge_sort_propagates_errors() {
        let result = merge_sort(vec![3, 1, 2], &mut |_: &i32, _: &i32| Err::<bool, &str>("boom"));
        assert_eq!(result, Err("boom"));
    }

    #[test]
    fn test_text_helpers() {
        assert_eq!(title_case("hello wORLD 2nd"), "Hello World 2Nd");
        assert_eq!(capitalize("hELLO"), "Hello");
        assert_eq!(split_whitespace("  a b  c ", 1), ["a", "b  c "]);
        assert_eq!(split_whitespace("  a b  c ", -1), ["a", "b", "c"]);
    }

    #[test]
    fn test_native_method_lookup() {
        let mut interpreter = Interpreter::new();
        let list = interpreter.heap.list(Vec::new());
        assert_eq!(native_method_name(&list, "append"), Some("append"));
        assert_eq!(native_method_name(&list, "upper"), None);
        let n = interpreter.heap.int(1);
        assert_eq!(native_method_name(&n, "append"), None);
    }

    #[test]
    fn test_sort_with_reverse_keeps_ties_in_order() {
        let mut interpreter = Interpreter::new();
        let words: Vec<Value> = ["bb", "a", "cc", "d"]
            .iter()
            .map(|w| interpreter.heap.str(*w))
            .collect();
        let len = interpreter.builtins.borrow().get("len").cloned().unwrap();
        let sorted = interpreter.sort_values(words, Some(len), true).unwrap();
        let texts: Vec<&str> = sorted.iter().filter_map(Value::as_str).collect();
        assert_eq!(texts, ["bb", "cc", "a", "d"]);
    }

    #[test]
    fn test_sort_of_mixed_types_fails() {
        let mut interpreter = Interpreter::new();
        let one = interpreter.heap.int(1);
        let text = interpreter.heap.str("a");
        let err = interpreter.sort_values(vec![one, text], None, false).unwrap_err();
        assert_eq!(
            err.to_string(),
            "TypeError: '<' not supported between instances of 'str' and 'int'"
        );
    }
}
