//! Built-in function implementations
//!
//! The builtin namespace holds the builtin classes (`int`, `list`, the
//! exception hierarchy, ...) and the builtin functions below. Calling a
//! builtin class goes through [`construct`].
//!
//! # Implementation Notes
//!
//! - `reversed`, `enumerate` and `zip` return lists rather than lazy iterators
//! - `print` writes to the captured console, never to the real stdout
//! - `round` rounds half to even

use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::{EvalResult, RuntimeError};
use crate::interpreter::repr::quote_str;
use crate::interpreter::types::{is_builtin_exception, is_subclass, lookup_class_attr, ExcKind};
use crate::memory::value::{new_scope, range_len, Builtin, BuiltinFn, Data, DictEntries, Instance, Value};
use crate::parser::ast::{BinOp, CmpOp};
use std::cell::RefCell;

const FUNCTIONS: &[(&str, BuiltinFn)] = &[
    ("print", builtin_print),
    ("len", builtin_len),
    ("repr", builtin_repr),
    ("sorted", builtin_sorted),
    ("reversed", builtin_reversed),
    ("enumerate", builtin_enumerate),
    ("zip", builtin_zip),
    ("min", builtin_min),
    ("max", builtin_max),
    ("sum", builtin_sum),
    ("abs", builtin_abs),
    ("round", builtin_round),
    ("divmod", builtin_divmod),
    ("isinstance", builtin_isinstance),
    ("id", builtin_id),
    ("hasattr", builtin_hasattr),
    ("getattr", builtin_getattr),
    ("setattr", builtin_setattr),
    ("callable", builtin_callable),
    ("format", builtin_format),
    ("ord", builtin_ord),
    ("chr", builtin_chr),
];

/// Populate the builtin namespace
pub fn install(interpreter: &mut Interpreter) {
    let types = &interpreter.types;
    let mut classes = vec![
        types.object.clone(),
        types.type_.clone(),
        types.bool.clone(),
        types.int.clone(),
        types.float.clone(),
        types.str.clone(),
        types.bytes.clone(),
        types.list.clone(),
        types.tuple.clone(),
        types.dict.clone(),
        types.set.clone(),
        types.range.clone(),
    ];
    classes.extend(types.exceptions().cloned());

    let mut functions = Vec::with_capacity(FUNCTIONS.len());
    for &(name, func) in FUNCTIONS {
        let value = interpreter.heap.alloc(Data::Builtin(Builtin { name, func }));
        functions.push((name.to_string(), value));
    }

    let mut namespace = interpreter.builtins.borrow_mut();
    for class in classes {
        if let Some(name) = class.as_class().map(|c| c.name.clone()) {
            namespace.insert(name, class);
        }
    }
    namespace.extend(functions);
}

// ===== Argument helpers =====

/// Fail unless `min <= given <= max`
pub(crate) fn check_arity(
    interpreter: &mut Interpreter,
    name: &str,
    given: usize,
    min: usize,
    max: usize,
) -> Result<(), RuntimeError> {
    if (min..=max).contains(&given) {
        return Ok(());
    }
    let plural = |n: usize| if n == 1 { "argument" } else { "arguments" };
    let message = if min == max {
        match min {
            0 => format!("{}() takes no arguments ({} given)", name, given),
            1 => format!("{}() takes exactly one argument ({} given)", name, given),
            n => format!("{}() takes exactly {} {} ({} given)", name, n, plural(n), given),
        }
    } else if given < min {
        format!("{}() takes at least {} {} ({} given)", name, min, plural(min), given)
    } else {
        format!("{}() takes at most {} {} ({} given)", name, max, plural(max), given)
    };
    Err(interpreter.raise(ExcKind::TypeError, message))
}

/// Remove and return keyword argument `name`
pub(crate) fn take_kwarg(kwargs: &mut Vec<(String, Value)>, name: &str) -> Option<Value> {
    let position = kwargs.iter().position(|(key, _)| key == name)?;
    Some(kwargs.remove(position).1)
}

/// Fail if any keyword arguments are left over
pub(crate) fn reject_kwargs(
    interpreter: &mut Interpreter,
    name: &str,
    kwargs: &[(String, Value)],
) -> Result<(), RuntimeError> {
    match kwargs.first() {
        None => Ok(()),
        Some((key, _)) => {
            let message = format!("'{}' is an invalid keyword argument for {}()", key, name);
            Err(interpreter.raise(ExcKind::TypeError, message))
        }
    }
}

fn is_error_of(interpreter: &Interpreter, err: &RuntimeError, kind: ExcKind) -> bool {
    let class = interpreter.types.class_of(&err.exception);
    is_builtin_exception(&class, kind)
}

fn name_arg(interpreter: &mut Interpreter, function: &str, value: &Value) -> Result<String, RuntimeError> {
    match value.as_str() {
        Some(name) => Ok(name.to_string()),
        None => {
            let message = format!(
                "{}(): attribute name must be string, not '{}'",
                function,
                value.type_name()
            );
            Err(interpreter.raise(ExcKind::TypeError, message))
        }
    }
}

// ===== Functions =====

fn builtin_print(interp: &mut Interpreter, args: Vec<Value>, mut kwargs: Vec<(String, Value)>) -> EvalResult {
    let mut separator = " ".to_string();
    let mut end = "\n".to_string();
    for (key, target) in [("sep", &mut separator), ("end", &mut end)] {
        if let Some(value) = take_kwarg(&mut kwargs, key) {
            match value.data() {
                Data::None => {}
                Data::Str(s) => *target = s.clone(),
                _ => {
                    let message = format!("{} must be None or a string, not {}", key, value.type_name());
                    return Err(interp.raise(ExcKind::TypeError, message));
                }
            }
        }
    }
    reject_kwargs(interp, "print", &kwargs)?;

    let mut parts = Vec::with_capacity(args.len());
    for arg in &args {
        parts.push(interp.to_display_string(arg)?);
    }
    let line = format!("{}{}", parts.join(&separator), end);
    interp.console.write(&line);
    Ok(interp.heap.none())
}

fn builtin_len(interp: &mut Interpreter, args: Vec<Value>, kwargs: Vec<(String, Value)>) -> EvalResult {
    reject_kwargs(interp, "len", &kwargs)?;
    check_arity(interp, "len", args.len(), 1, 1)?;
    let value = &args[0];
    if let Some(result) = interp.call_dunder(value, "__len__", Vec::new())? {
        return Ok(result);
    }
    let len = match value.data() {
        Data::Str(s) => s.chars().count(),
        Data::Bytes(b) => b.len(),
        Data::List(items) => items.borrow().len(),
        Data::Tuple(items) => items.len(),
        Data::Dict(entries) => entries.borrow().len(),
        Data::Set(entries) => entries.borrow().len(),
        Data::Range { start, stop, step } => match usize::try_from(range_len(*start, *stop, *step)) {
            Ok(len) if len <= i64::MAX as usize => len,
            _ => {
                return Err(interp.raise(
                    ExcKind::OverflowError,
                    "Python int too large to convert to C ssize_t",
                ))
            }
        },
        _ => {
            let message = format!("object of type '{}' has no len()", value.type_name());
            return Err(interp.raise(ExcKind::TypeError, message));
        }
    };
    Ok(interp.heap.int(len as i64))
}

fn builtin_repr(interp: &mut Interpreter, args: Vec<Value>, kwargs: Vec<(String, Value)>) -> EvalResult {
    reject_kwargs(interp, "repr", &kwargs)?;
    check_arity(interp, "repr", args.len(), 1, 1)?;
    let text = interp.to_repr_string(&args[0])?;
    Ok(interp.heap.str(text))
}

fn builtin_sorted(interp: &mut Interpreter, args: Vec<Value>, mut kwargs: Vec<(String, Value)>) -> EvalResult {
    check_arity(interp, "sorted", args.len(), 1, 1)?;
    let key = take_kwarg(&mut kwargs, "key").filter(|key| !key.is_none());
    let reverse = match take_kwarg(&mut kwargs, "reverse") {
        Some(flag) => interp.truth_of(&flag)?,
        None => false,
    };
    reject_kwargs(interp, "sorted", &kwargs)?;
    let items = interp.collect_iterable(&args[0])?;
    let sorted = interp.sort_values(items, key, reverse)?;
    Ok(interp.heap.list(sorted))
}

fn builtin_reversed(interp: &mut Interpreter, args: Vec<Value>, kwargs: Vec<(String, Value)>) -> EvalResult {
    reject_kwargs(interp, "reversed", &kwargs)?;
    check_arity(interp, "reversed", args.len(), 1, 1)?;
    if matches!(args[0].data(), Data::Set(_)) {
        let message = format!("'{}' object is not reversible", args[0].type_name());
        return Err(interp.raise(ExcKind::TypeError, message));
    }
    let mut items = interp.collect_iterable(&args[0])?;
    items.reverse();
    Ok(interp.heap.list(items))
}

fn builtin_enumerate(interp: &mut Interpreter, args: Vec<Value>, mut kwargs: Vec<(String, Value)>) -> EvalResult {
    let start_kwarg = take_kwarg(&mut kwargs, "start");
    reject_kwargs(interp, "enumerate", &kwargs)?;
    check_arity(interp, "enumerate", args.len(), 1, 2)?;
    let start = match args.get(1).or(start_kwarg.as_ref()) {
        Some(start) => interp.index_arg(start)?,
        None => 0,
    };
    let items = interp.collect_iterable(&args[0])?;
    let mut pairs = Vec::with_capacity(items.len());
    for (offset, item) in items.into_iter().enumerate() {
        let Some(position) = i64::try_from(offset).ok().and_then(|o| start.checked_add(o)) else {
            return Err(interp.raise(ExcKind::OverflowError, "integer result of '+' is too large"));
        };
        let index = interp.heap.int(position);
        pairs.push(interp.heap.tuple(vec![index, item]));
    }
    Ok(interp.heap.list(pairs))
}

fn builtin_zip(interp: &mut Interpreter, args: Vec<Value>, kwargs: Vec<(String, Value)>) -> EvalResult {
    reject_kwargs(interp, "zip", &kwargs)?;
    let mut columns = Vec::with_capacity(args.len());
    for arg in &args {
        columns.push(interp.collect_iterable(arg)?);
    }
    let rows = columns.iter().map(Vec::len).min().unwrap_or(0);
    let mut zipped = Vec::with_capacity(rows);
    for row in 0..rows {
        let tuple = columns.iter().map(|column| column[row].clone()).collect();
        zipped.push(interp.heap.tuple(tuple));
    }
    Ok(interp.heap.list(zipped))
}

fn builtin_min(interp: &mut Interpreter, args: Vec<Value>, kwargs: Vec<(String, Value)>) -> EvalResult {
    extreme(interp, "min", CmpOp::Lt, args, kwargs)
}

fn builtin_max(interp: &mut Interpreter, args: Vec<Value>, kwargs: Vec<(String, Value)>) -> EvalResult {
    extreme(interp, "max", CmpOp::Gt, args, kwargs)
}

/// Shared body of `min` and `max`: the first item that no later item beats
fn extreme(
    interp: &mut Interpreter,
    name: &str,
    beats: CmpOp,
    args: Vec<Value>,
    mut kwargs: Vec<(String, Value)>,
) -> EvalResult {
    let key = take_kwarg(&mut kwargs, "key").filter(|key| !key.is_none());
    let default = take_kwarg(&mut kwargs, "default");
    reject_kwargs(interp, name, &kwargs)?;
    let items = match args.len() {
        0 => {
            let message = format!("{} expected at least 1 argument, got 0", name);
            return Err(interp.raise(ExcKind::TypeError, message));
        }
        1 => interp.collect_iterable(&args[0])?,
        _ => args,
    };

    let mut best: Option<(Value, Value)> = None;
    for item in items {
        let score = match &key {
            Some(key) => interp.call_value(key, vec![item.clone()], Vec::new())?,
            None => item.clone(),
        };
        let replace = match &best {
            Some((best_score, _)) => interp.compare(beats, &score, best_score)?,
            None => true,
        };
        if replace {
            best = Some((score, item));
        }
    }
    match (best, default) {
        (Some((_, item)), _) => Ok(item),
        (None, Some(default)) => Ok(default),
        (None, None) => {
            let message = format!("{}() arg is an empty sequence", name);
            Err(interp.raise(ExcKind::ValueError, message))
        }
    }
}

fn builtin_sum(interp: &mut Interpreter, args: Vec<Value>, mut kwargs: Vec<(String, Value)>) -> EvalResult {
    let start_kwarg = take_kwarg(&mut kwargs, "start");
    reject_kwargs(interp, "sum", &kwargs)?;
    check_arity(interp, "sum", args.len(), 1, 2)?;
    let mut total = match args.get(1).cloned().or(start_kwarg) {
        Some(start) => start,
        None => interp.heap.int(0),
    };
    if total.as_str().is_some() {
        return Err(interp.raise(
            ExcKind::TypeError,
            "sum() can't sum strings [use ''.join(seq) instead]",
        ));
    }
    for item in interp.collect_iterable(&args[0])? {
        total = interp.binary_op(BinOp::Add, &total, &item)?;
    }
    Ok(total)
}

fn builtin_abs(interp: &mut Interpreter, args: Vec<Value>, kwargs: Vec<(String, Value)>) -> EvalResult {
    reject_kwargs(interp, "abs", &kwargs)?;
    check_arity(interp, "abs", args.len(), 1, 1)?;
    let value = &args[0];
    if let Some(result) = interp.call_dunder(value, "__abs__", Vec::new())? {
        return Ok(result);
    }
    match value.data() {
        Data::Int(_) | Data::Bool(_) => {
            let n = value.as_int().unwrap_or(0);
            match n.checked_abs() {
                Some(magnitude) => Ok(interp.heap.int(magnitude)),
                None => Err(interp.raise(ExcKind::OverflowError, "integer absolute value overflowed")),
            }
        }
        Data::Float(f) => Ok(interp.heap.float(f.abs())),
        _ => {
            let message = format!("bad operand type for abs(): '{}'", value.type_name());
            Err(interp.raise(ExcKind::TypeError, message))
        }
    }
}

fn builtin_round(interp: &mut Interpreter, args: Vec<Value>, mut kwargs: Vec<(String, Value)>) -> EvalResult {
    let digits_kwarg = take_kwarg(&mut kwargs, "ndigits");
    reject_kwargs(interp, "round", &kwargs)?;
    check_arity(interp, "round", args.len(), 1, 2)?;
    let digits = match args.get(1).cloned().or(digits_kwarg) {
        Some(digits) if !digits.is_none() => Some(interp.index_arg(&digits)?),
        _ => None,
    };
    let value = &args[0];
    match (value.data(), digits) {
        (Data::Int(_) | Data::Bool(_), None) => {
            let n = value.as_int().unwrap_or(0);
            Ok(interp.heap.int(n))
        }
        (Data::Int(_) | Data::Bool(_), Some(digits)) => {
            let n = value.as_int().unwrap_or(0);
            if digits >= 0 {
                return Ok(interp.heap.int(n));
            }
            match round_to_power(n, digits.unsigned_abs()) {
                Some(rounded) => Ok(interp.heap.int(rounded)),
                None => Err(interp.raise(ExcKind::OverflowError, "int too large to convert")),
            }
        }
        (Data::Float(f), None) => {
            let n = float_to_int(interp, f.round_ties_even())?;
            Ok(interp.heap.int(n))
        }
        (Data::Float(f), Some(digits)) => {
            let scale = 10f64.powi(digits.clamp(-308, 308) as i32);
            let rounded = (f * scale).round_ties_even() / scale;
            Ok(interp.heap.float(if rounded.is_finite() { rounded } else { *f }))
        }
        _ => {
            let message = format!(
                "type {} doesn't define __round__ method",
                value.type_name()
            );
            Err(interp.raise(ExcKind::TypeError, message))
        }
    }
}

/// Round `n` to a multiple of `10^places`, ties to even; `None` when the
/// result leaves the integer range
fn round_to_power(n: i64, places: u64) -> Option<i64> {
    // |n| < 10^19 / 2, so anything coarser rounds to zero
    if places >= 20 {
        return Some(0);
    }
    let scale = 10i128.pow(places as u32);
    let n = i128::from(n);
    let quotient = n.div_euclid(scale);
    let doubled = n.rem_euclid(scale) * 2;
    let rounded = if doubled > scale || (doubled == scale && quotient % 2 != 0) {
        quotient + 1
    } else {
        quotient
    };
    i64::try_from(rounded * scale).ok()
}

/// Truncate a float toward zero the way `int()` does
pub(crate) fn float_to_int(interp: &mut Interpreter, f: f64) -> Result<i64, RuntimeError> {
    if f.is_nan() {
        return Err(interp.raise(ExcKind::ValueError, "cannot convert float NaN to integer"));
    }
    if f.is_infinite() {
        return Err(interp.raise(
            ExcKind::OverflowError,
            "cannot convert float infinity to integer",
        ));
    }
    if f.abs() >= 9.223_372_036_854_775_808e18 {
        return Err(interp.raise(ExcKind::OverflowError, "int too large to convert"));
    }
    Ok(f.trunc() as i64)
}

fn builtin_divmod(interp: &mut Interpreter, args: Vec<Value>, kwargs: Vec<(String, Value)>) -> EvalResult {
    reject_kwargs(interp, "divmod", &kwargs)?;
    check_arity(interp, "divmod", args.len(), 2, 2)?;
    let quotient = interp.binary_op(BinOp::FloorDiv, &args[0], &args[1])?;
    let remainder = interp.binary_op(BinOp::Mod, &args[0], &args[1])?;
    Ok(interp.heap.tuple(vec![quotient, remainder]))
}

fn builtin_isinstance(interp: &mut Interpreter, args: Vec<Value>, kwargs: Vec<(String, Value)>) -> EvalResult {
    reject_kwargs(interp, "isinstance", &kwargs)?;
    check_arity(interp, "isinstance", args.len(), 2, 2)?;
    let class = interp.types.class_of(&args[0]);
    let candidates = match args[1].data() {
        Data::Tuple(items) => items.clone(),
        _ => vec![args[1].clone()],
    };
    let mut matched = false;
    for candidate in &candidates {
        if candidate.as_class().is_none() {
            return Err(interp.raise(
                ExcKind::TypeError,
                "isinstance() arg 2 must be a type, a tuple of types, or a union",
            ));
        }
        matched |= is_subclass(&class, candidate);
    }
    Ok(interp.heap.bool(matched))
}

fn builtin_id(interp: &mut Interpreter, args: Vec<Value>, kwargs: Vec<(String, Value)>) -> EvalResult {
    reject_kwargs(interp, "id", &kwargs)?;
    check_arity(interp, "id", args.len(), 1, 1)?;
    Ok(interp.heap.int(args[0].address() as i64))
}

fn builtin_hasattr(interp: &mut Interpreter, args: Vec<Value>, kwargs: Vec<(String, Value)>) -> EvalResult {
    reject_kwargs(interp, "hasattr", &kwargs)?;
    check_arity(interp, "hasattr", args.len(), 2, 2)?;
    let name = name_arg(interp, "hasattr", &args[1])?;
    match interp.get_attribute(&args[0], &name) {
        Ok(_) => Ok(interp.heap.bool(true)),
        Err(err) if is_error_of(interp, &err, ExcKind::AttributeError) => Ok(interp.heap.bool(false)),
        Err(err) => Err(err),
    }
}

fn builtin_getattr(interp: &mut Interpreter, args: Vec<Value>, kwargs: Vec<(String, Value)>) -> EvalResult {
    reject_kwargs(interp, "getattr", &kwargs)?;
    check_arity(interp, "getattr", args.len(), 2, 3)?;
    let name = name_arg(interp, "getattr", &args[1])?;
    match (interp.get_attribute(&args[0], &name), args.get(2)) {
        (Ok(value), _) => Ok(value),
        (Err(err), Some(default)) if is_error_of(interp, &err, ExcKind::AttributeError) => {
            Ok(default.clone())
        }
        (Err(err), _) => Err(err),
    }
}

fn builtin_setattr(interp: &mut Interpreter, args: Vec<Value>, kwargs: Vec<(String, Value)>) -> EvalResult {
    reject_kwargs(interp, "setattr", &kwargs)?;
    check_arity(interp, "setattr", args.len(), 3, 3)?;
    let name = name_arg(interp, "setattr", &args[1])?;
    interp.set_attribute(&args[0], &name, args[2].clone())?;
    Ok(interp.heap.none())
}

fn builtin_callable(interp: &mut Interpreter, args: Vec<Value>, kwargs: Vec<(String, Value)>) -> EvalResult {
    reject_kwargs(interp, "callable", &kwargs)?;
    check_arity(interp, "callable", args.len(), 1, 1)?;
    let callable = match args[0].data() {
        Data::Function(_)
        | Data::Builtin(_)
        | Data::BoundMethod { .. }
        | Data::NativeMethod { .. }
        | Data::Class(_) => true,
        Data::Instance(instance) => {
            lookup_class_attr(&instance.class, "__call__").is_some()
        }
        _ => false,
    };
    Ok(interp.heap.bool(callable))
}

fn builtin_format(interp: &mut Interpreter, args: Vec<Value>, kwargs: Vec<(String, Value)>) -> EvalResult {
    reject_kwargs(interp, "format", &kwargs)?;
    check_arity(interp, "format", args.len(), 1, 2)?;
    let spec = match args.get(1) {
        Some(spec) => name_arg(interp, "format", spec)?,
        None => String::new(),
    };
    let text = interp.format_value(&args[0], &spec)?;
    Ok(interp.heap.str(text))
}

fn builtin_ord(interp: &mut Interpreter, args: Vec<Value>, kwargs: Vec<(String, Value)>) -> EvalResult {
    reject_kwargs(interp, "ord", &kwargs)?;
    check_arity(interp, "ord", args.len(), 1, 1)?;
    let Some(text) = args[0].as_str() else {
        let message = format!(
            "ord() expected string of length 1, but {} found",
            args[0].type_name()
        );
        return Err(interp.raise(ExcKind::TypeError, message));
    };
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(interp.heap.int(c as i64)),
        _ => {
            let message = format!(
                "ord() expected a character, but string of length {} found",
                text.chars().count()
            );
            Err(interp.raise(ExcKind::TypeError, message))
        }
    }
}

fn builtin_chr(interp: &mut Interpreter, args: Vec<Value>, kwargs: Vec<(String, Value)>) -> EvalResult {
    reject_kwargs(interp, "chr", &kwargs)?;
    check_arity(interp, "chr", args.len(), 1, 1)?;
    let code = interp.index_arg(&args[0])?;
    match u32::try_from(code).ok().and_then(char::from_u32) {
        Some(c) => Ok(interp.heap.str(c.to_string())),
        None => Err(interp.raise(ExcKind::ValueError, "chr() arg not in range(0x110000)")),
    }
}

// ===== Constructors =====

/// Call a builtin (non-exception) class
pub(crate) fn construct(
    interp: &mut Interpreter,
    name: &str,
    args: Vec<Value>,
    mut kwargs: Vec<(String, Value)>,
) -> EvalResult {
    if name != "dict" {
        reject_kwargs(interp, name, &kwargs)?;
    }
    match name {
        "object" => {
            check_arity(interp, name, args.len(), 0, 0)?;
            let class = interp.types.object.clone();
            Ok(interp.heap.alloc(Data::Instance(Instance {
                class,
                attrs: new_scope(),
                args: Vec::new(),
            })))
        }
        "type" => {
            check_arity(interp, name, args.len(), 1, 1)?;
            Ok(interp.types.class_of(&args[0]))
        }
        "bool" => {
            check_arity(interp, name, args.len(), 0, 1)?;
            let truth = match args.first() {
                Some(value) => interp.truth_of(value)?,
                None => false,
            };
            Ok(interp.heap.bool(truth))
        }
        "int" => construct_int(interp, args),
        "float" => construct_float(interp, args),
        "str" => {
            check_arity(interp, name, args.len(), 0, 1)?;
            let text = match args.first() {
                Some(value) => interp.to_display_string(value)?,
                None => String::new(),
            };
            Ok(interp.heap.str(text))
        }
        "bytes" => construct_bytes(interp, args),
        "list" | "tuple" | "set" => {
            check_arity(interp, name, args.len(), 0, 1)?;
            let items = match args.first() {
                Some(source) => interp.collect_iterable(source)?,
                None => Vec::new(),
            };
            match name {
                "list" => Ok(interp.heap.list(items)),
                "tuple" => Ok(interp.heap.tuple(items)),
                _ => {
                    let collected = interp.heap.list(items);
                    let entries = interp.set_entries_of(&collected)?;
                    Ok(interp.heap.alloc(Data::Set(RefCell::new(entries))))
                }
            }
        }
        "dict" => {
            check_arity(interp, name, args.len(), 0, 1)?;
            let mut entries = DictEntries::new();
            if let Some(source) = args.first() {
                for (key, value) in interp.pairs_of(source)? {
                    interp.insert_entry(&mut entries, key, value)?;
                }
            }
            for (key, value) in kwargs.drain(..) {
                let key = interp.heap.str(key);
                interp.insert_entry(&mut entries, key, value)?;
            }
            Ok(interp.heap.alloc(Data::Dict(RefCell::new(entries))))
        }
        "range" => {
            check_arity(interp, name, args.len(), 1, 3)?;
            let mut bounds = Vec::with_capacity(args.len());
            for arg in &args {
                bounds.push(interp.index_arg(arg)?);
            }
            let (start, stop, step) = match bounds.as_slice() {
                [stop] => (0, *stop, 1),
                [start, stop] => (*start, *stop, 1),
                [start, stop, step] => (*start, *stop, *step),
                _ => (0, 0, 1),
            };
            if step == 0 {
                return Err(interp.raise(ExcKind::ValueError, "range() arg 3 must not be zero"));
            }
            Ok(interp.heap.alloc(Data::Range { start, stop, step }))
        }
        _ => {
            let message = format!("cannot create '{}' instances", name);
            Err(interp.raise(ExcKind::TypeError, message))
        }
    }
}

fn construct_int(interp: &mut Interpreter, args: Vec<Value>) -> EvalResult {
    check_arity(interp, "int", args.len(), 0, 2)?;
    let Some(value) = args.first() else {
        return Ok(interp.heap.int(0));
    };
    let base = match args.get(1) {
        Some(base) => {
            let base = interp.index_arg(base)?;
            if base != 0 && !(2..=36).contains(&base) {
                return Err(interp.raise(ExcKind::ValueError, "int() base must be >= 2 and <= 36, or 0"));
            }
            Some(base as u32)
        }
        None => None,
    };
    match (value.data(), base) {
        (Data::Int(_) | Data::Bool(_), None) => {
            let n = value.as_int().unwrap_or(0);
            Ok(interp.heap.int(n))
        }
        (Data::Float(f), None) => {
            let n = float_to_int(interp, *f)?;
            Ok(interp.heap.int(n))
        }
        (Data::Str(s), base) => match parse_int(s, base.unwrap_or(10)) {
            Some(n) => Ok(interp.heap.int(n)),
            None => {
                let message = format!(
                    "invalid literal for int() with base {}: {}",
                    base.unwrap_or(10),
                    quote_str(s)
                );
                Err(interp.raise(ExcKind::ValueError, message))
            }
        },
        (_, Some(_)) => Err(interp.raise(
            ExcKind::TypeError,
            "int() can't convert non-string with explicit base",
        )),
        _ => {
            if let Some(result) = interp.call_dunder(value, "__int__", Vec::new())? {
                return Ok(result);
            }
            let message = format!(
                "int() argument must be a string, a bytes-like object or a real number, not '{}'",
                value.type_name()
            );
            Err(interp.raise(ExcKind::TypeError, message))
        }
    }
}

/// Parse an integer literal the way `int(text, base)` does. Base 0 infers the
/// base from a `0x`/`0o`/`0b` prefix.
fn parse_int(text: &str, base: u32) -> Option<i64> {
    let trimmed = text.trim();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let lower = digits.to_ascii_lowercase();
    let (base, digits) = match (base, lower.get(..2)) {
        (0 | 16, Some("0x")) => (16, &digits[2..]),
        (0 | 8, Some("0o")) => (8, &digits[2..]),
        (0 | 2, Some("0b")) => (2, &digits[2..]),
        (0, _) => (10, digits),
        (base, _) => (base, digits),
    };
    if digits.is_empty() || digits.starts_with('_') || digits.ends_with('_') || digits.contains("__") {
        return None;
    }
    if digits.starts_with(['+', '-']) {
        return None;
    }
    let cleaned: String = digits.chars().filter(|c| *c != '_').collect();
    let magnitude = i64::from_str_radix(&cleaned, base).ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

fn construct_float(interp: &mut Interpreter, args: Vec<Value>) -> EvalResult {
    check_arity(interp, "float", args.len(), 0, 1)?;
    let Some(value) = args.first() else {
        return Ok(interp.heap.float(0.0));
    };
    match value.data() {
        Data::Float(_) | Data::Int(_) | Data::Bool(_) => {
            let f = value.as_float().unwrap_or(0.0);
            Ok(interp.heap.float(f))
        }
        Data::Str(s) => match parse_float(s) {
            Some(f) => Ok(interp.heap.float(f)),
            None => {
                let message = format!(
                    "could not convert string to float: {}",
                    quote_str(s)
                );
                Err(interp.raise(ExcKind::ValueError, message))
            }
        },
        _ => {
            if let Some(result) = interp.call_dunder(value, "__float__", Vec::new())? {
                return Ok(result);
            }
            let message = format!(
                "float() argument must be a string or a real number, not '{}'",
                value.type_name()
            );
            Err(interp.raise(ExcKind::TypeError, message))
        }
    }
}

fn parse_float(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    let (sign, body) = match trimmed.as_bytes().first() {
        Some(b'-') => (-1.0, &trimmed[1..]),
        Some(b'+') => (1.0, &trimmed[1..]),
        _ => (1.0, trimmed),
    };
    match body.to_ascii_lowercase().as_str() {
        "inf" | "infinity" => return Some(sign * f64::INFINITY),
        "nan" => return Some(f64::NAN),
        _ => {}
    }
    if body.is_empty() || !body.chars().all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-' | '_')) {
        return None;
    }
    let cleaned: String = body.chars().filter(|c| *c != '_').collect();
    cleaned.parse::<f64>().ok().map(|f| sign * f)
}

fn construct_bytes(interp: &mut Interpreter, args: Vec<Value>) -> EvalResult {
    check_arity(interp, "bytes", args.len(), 0, 2)?;
    let bytes = match (args.first().map(Value::data), args.get(1)) {
        (None, _) => Vec::new(),
        (Some(Data::Str(s)), Some(_)) => s.as_bytes().to_vec(),
        (Some(Data::Str(_)), None) => {
            return Err(interp.raise(ExcKind::TypeError, "string argument without an encoding"))
        }
        (Some(Data::Int(n)), None) => {
            if *n < 0 {
                return Err(interp.raise(ExcKind::ValueError, "negative count"));
            }
            vec![0; (*n).min(1 << 24) as usize]
        }
        _ => {
            let mut bytes = Vec::new();
            for item in interp.collect_iterable(&args[0])? {
                match item.as_int().and_then(|n| u8::try_from(n).ok()) {
                    Some(byte) => bytes.push(byte),
                    None => {
                        return Err(interp.raise(ExcKind::ValueError, "bytes must be in range(0, 256)"))
                    }
                }
            }
            bytes
        }
    };
    Ok(interp.heap.alloc(Data::Bytes(bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(interp: &mut Interpreter, name: &str, args: Vec<Value>) -> EvalResult {
        let function = interp.builtins.borrow().get(name).cloned().unwrap();
        interp.call_value(&function, args, Vec::new())
    }

    #[test]
    fn test_parse_int() {
        assert_eq!(parse_int(" 42 ", 10), Some(42));
        assert_eq!(parse_int("-1_000", 10), Some(-1000));
        assert_eq!(parse_int("ff", 16), Some(255));
        assert_eq!(parse_int("0x1F", 0), Some(31));
        assert_eq!(parse_int("1.5", 10), None);
        assert_eq!(parse_int("", 10), None);
    }

    #[test]
    fn test_parse_float() {
        assert_eq!(parse_float("2.5"), Some(2.5));
        assert_eq!(parse_float(" -1e3 "), Some(-1000.0));
        assert_eq!(parse_float("-inf"), Some(f64::NEG_INFINITY));
        assert!(parse_float("abc").is_none());
    }

    #[test]
    fn test_print_writes_to_console() {
        let mut interp = Interpreter::new();
        let a = interp.heap.str("a");
        let one = interp.heap.int(1);
        let print = interp.builtins.borrow().get("print").cloned().unwrap();
        let sep = interp.heap.str("-");
        interp
            .call_value(&print, vec![a, one], vec![("sep".to_string(), sep)])
            .unwrap();
        assert_eq!(interp.console().stdout(), "a-1\n");
    }

    #[test]
    fn test_len_and_arity() {
        let mut interp = Interpreter::new();
        let text = interp.heap.str("héllo");
        let len = call(&mut interp, "len", vec![text]).unwrap();
        assert_eq!(len.as_int(), Some(5));
        let err = call(&mut interp, "len", Vec::new()).unwrap_err();
        assert_eq!(err.to_string(), "TypeError: len() takes exactly one argument (0 given)");
        let n = interp.heap.int(3);
        let err = call(&mut interp, "len", vec![n]).unwrap_err();
        assert_eq!(err.to_string(), "TypeError: object of type 'int' has no len()");
    }

    #[test]
    fn test_round_half_even() {
        let mut interp = Interpreter::new();
        let half = interp.heap.float(2.5);
        assert_eq!(call(&mut interp, "round", vec![half]).unwrap().as_int(), Some(2));
        let other = interp.heap.float(3.5);
        assert_eq!(call(&mut interp, "round", vec![other]).unwrap().as_int(), Some(4));
    }

    #[test]
    fn test_round_to_power() {
        assert_eq!(round_to_power(15, 1), Some(20));
        assert_eq!(round_to_power(25, 1), Some(20));
        assert_eq!(round_to_power(-15, 1), Some(-20));
        assert_eq!(round_to_power(149, 2), Some(100));
        assert_eq!(round_to_power(i64::MAX, 1), None);
        assert_eq!(round_to_power(i64::MIN, 19), None);
        assert_eq!(round_to_power(5, u64::MAX), Some(0));
    }

    #[test]
    fn test_min_max_and_sum() {
        let mut interp = Interpreter::new();
        let items: Vec<Value> = [3, 1, 2].iter().map(|n| interp.heap.int(*n)).collect();
        let list = interp.heap.list(items);
        assert_eq!(call(&mut interp, "min", vec![list.clone()]).unwrap().as_int(), Some(1));
        assert_eq!(call(&mut interp, "max", vec![list.clone()]).unwrap().as_int(), Some(3));
        assert_eq!(call(&mut interp, "sum", vec![list]).unwrap().as_int(), Some(6));
        let empty = interp.heap.list(Vec::new());
        let err = call(&mut interp, "max", vec![empty]).unwrap_err();
        assert_eq!(err.to_string(), "ValueError: max() arg is an empty sequence");
    }

    #[test]
    fn test_isinstance_follows_bases() {
        let mut interp = Interpreter::new();
        let flag = interp.heap.bool(true);
        let int_class = interp.types.int.clone();
        let result = call(&mut interp, "isinstance", vec![flag, int_class]).unwrap();
        assert!(interp.truthy(&result));
    }

    #[test]
    fn test_int_constructor() {
        let mut interp = Interpreter::new();
        let text = interp.heap.str("12");
        let int_class = interp.types.int.clone();
        let n = interp.call_value(&int_class, vec![text], Vec::new()).unwrap();
        assert_eq!(n.as_int(), Some(12));
        let bad = interp.heap.str("x");
        let err = interp.call_value(&int_class, vec![bad], Vec::new()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "ValueError: invalid literal for int() with base 10: 'x'"
        );
    }
}
