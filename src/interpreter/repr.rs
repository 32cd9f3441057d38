//! Natural representations of hosted values
//!
//! These follow the usual `repr()` conventions and never run hosted code:
//! user-defined `__repr__` and `__str__` are honoured by the interpreter's
//! `print`/`str()` path, not here.

use crate::interpreter::types::{is_builtin_exception, is_exception_class, ExcKind};
use crate::memory::value::{Data, Value};
use crate::snapshot::introspect::ReprError;

/// Containers nested deeper than this cannot be represented
pub const MAX_REPR_DEPTH: usize = 64;

/// `repr(value)`
pub fn repr_value(value: &Value) -> Result<String, ReprError> {
    let mut out = String::new();
    let mut active = Vec::new();
    write_repr(value, &mut out, &mut active)?;
    Ok(out)
}

/// `str(value)` without consulting user-defined methods
pub fn str_value(value: &Value) -> Result<String, ReprError> {
    match value.data() {
        Data::Str(s) => Ok(s.clone()),
        Data::Instance(instance) if is_exception_class(&instance.class) => {
            Ok(exception_message(value))
        }
        _ => repr_value(value),
    }
}

/// `str()` of an exception: empty without arguments, the argument itself for
/// one argument, the argument tuple otherwise. `KeyError` shows its key as a
/// representation.
pub fn exception_message(exception: &Value) -> String {
    let Some(instance) = exception.as_instance() else {
        return str_value(exception).unwrap_or_default();
    };
    match instance.args.as_slice() {
        [] => String::new(),
        [arg] if is_builtin_exception(&instance.class, ExcKind::KeyError) => {
            repr_or_placeholder(arg)
        }
        [arg] => str_value(arg).unwrap_or_else(|_| placeholder(arg)),
        args => {
            let mut out = String::new();
            let result = write_sequence(args, "(", ")", args.len() == 1, &mut out, &mut Vec::new());
            match result {
                Ok(()) => out,
                Err(_) => placeholder(exception),
            }
        }
    }
}

/// Representation, or a placeholder naming the type
pub fn repr_or_placeholder(value: &Value) -> String {
    repr_value(value).unwrap_or_else(|_| placeholder(value))
}

fn placeholder(value: &Value) -> String {
    format!("<unrepresentable {}>", value.type_name())
}

fn write_repr(value: &Value, out: &mut String, active: &mut Vec<u64>) -> Result<(), ReprError> {
    match value.data() {
        Data::None => out.push_str("None"),
        Data::Bool(b) => out.push_str(if *b { "True" } else { "False" }),
        Data::Int(n) => out.push_str(&n.to_string()),
        Data::Float(f) => out.push_str(&format_float(*f)),
        Data::Str(s) => out.push_str(&quote_str(s)),
        Data::Bytes(b) => out.push_str(&quote_bytes(b)),
        Data::Range { start, stop, step } => {
            if *step == 1 {
                out.push_str(&format!("range({}, {})", start, stop));
            } else {
                out.push_str(&format!("range({}, {}, {})", start, stop, step));
            }
        }
        Data::List(items) => {
            if active.contains(&value.address()) {
                out.push_str("[...]");
                return Ok(());
            }
            enter(value, active)?;
            let items = items.borrow();
            write_sequence(&items, "[", "]", false, out, active)?;
            active.pop();
        }
        Data::Tuple(items) => {
            enter(value, active)?;
            write_sequence(items, "(", ")", items.len() == 1, out, active)?;
            active.pop();
        }
        Data::Set(entries) => {
            let entries = entries.borrow();
            if entries.is_empty() {
                out.push_str("set()");
                return Ok(());
            }
            enter(value, active)?;
            let items: Vec<Value> = entries.values().cloned().collect();
            write_sequence(&items, "{", "}", false, out, active)?;
            active.pop();
        }
        Data::Dict(entries) => {
            if active.contains(&value.address()) {
                out.push_str("{...}");
                return Ok(());
            }
            enter(value, active)?;
            out.push('{');
            for (i, (key, val)) in entries.borrow().values().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_repr(key, out, active)?;
                out.push_str(": ");
                write_repr(val, out, active)?;
            }
            out.push('}');
            active.pop();
        }
        Data::Function(function) => {
            out.push_str(&format!(
                "<function {} at 0x{:x}>",
                function.code.name,
                value.address()
            ));
        }
        Data::Class(class) => {
            if class.module == "builtins" {
                out.push_str(&format!("<class '{}'>", class.name));
            } else {
                out.push_str(&format!("<class '{}.{}'>", class.module, class.name));
            }
        }
        Data::Instance(instance) => {
            let class_name = instance
                .class
                .as_class()
                .map(|c| c.name.clone())
                .unwrap_or_else(|| "object".to_string());
            if is_exception_class(&instance.class) {
                enter(value, active)?;
                out.push_str(&class_name);
                write_sequence(&instance.args, "(", ")", false, out, active)?;
                active.pop();
            } else {
                let module = instance.class.as_class().map_or("builtins", |c| c.module);
                if module == "builtins" {
                    out.push_str(&format!("<{} object at 0x{:x}>", class_name, value.address()));
                } else {
                    out.push_str(&format!(
                        "<{}.{} object at 0x{:x}>",
                        module,
                        class_name,
                        value.address()
                    ));
                }
            }
        }
        Data::BoundMethod { receiver, function } => {
            let class_name = receiver
                .as_instance()
                .and_then(|i| i.class.as_class().map(|c| c.name.clone()))
                .unwrap_or_else(|| receiver.type_name());
            let method_name = match function.data() {
                Data::Function(f) => f.code.name.clone(),
                _ => "?".to_string(),
            };
            enter(value, active)?;
            out.push_str(&format!("<bound method {}.{} of ", class_name, method_name));
            write_repr(receiver, out, active)?;
            out.push('>');
            active.pop();
        }
        Data::Builtin(builtin) => {
            out.push_str(&format!("<built-in function {}>", builtin.name));
        }
        Data::NativeMethod { receiver, name } => {
            out.push_str(&format!(
                "<built-in method {} of {} object at 0x{:x}>",
                name,
                receiver.type_name(),
                receiver.address()
            ));
        }
    }
    Ok(())
}

fn enter(value: &Value, active: &mut Vec<u64>) -> Result<(), ReprError> {
    if active.len() >= MAX_REPR_DEPTH {
        return Err(ReprError::new("maximum nesting depth exceeded"));
    }
    active.push(value.address());
    Ok(())
}

fn write_sequence(
    items: &[Value],
    open: &str,
    close: &str,
    trailing_comma: bool,
    out: &mut String,
    active: &mut Vec<u64>,
) -> Result<(), ReprError> {
    out.push_str(open);
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_repr(item, out, active)?;
    }
    if trailing_comma {
        out.push(',');
    }
    out.push_str(close);
    Ok(())
}

/// Float formatting: shortest round-trip digits, exponent notation outside
/// `1e-4 <= |f| < 1e16`
pub fn format_float(f: f64) -> String {
    if f.is_nan() {
        return "nan".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if f == 0.0 {
        return if f.is_sign_negative() { "-0.0" } else { "0.0" }.to_string();
    }
    let scientific = format!("{:e}", f);
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (scientific.as_str(), 0),
    };
    if !(-4..16).contains(&exponent) {
        let sign = if exponent < 0 { '-' } else { '+' };
        return format!("{}e{}{:02}", mantissa, sign, exponent.abs());
    }
    let plain = format!("{}", f);
    if plain.contains('.') {
        plain
    } else {
        format!("{}.0", plain)
    }
}

/// Quoted string literal, preferring single quotes
pub fn quote_str(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

pub fn quote_bytes(bytes: &[u8]) -> String {
    let quote = if bytes.contains(&b'\'') && !bytes.contains(&b'"') {
        b'"'
    } else {
        b'\''
    };
    let mut out = String::with_capacity(bytes.len() + 3);
    out.push('b');
    out.push(quote as char);
    for &b in bytes {
        match b {
            b'\\' => out.push_str("\\\\"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            b if b == quote => {
                out.push('\\');
                out.push(b as char);
            }
            0x20..=0x7e => out.push(b as char),
            b => out.push_str(&format!("\\x{:02x}", b)),
        }
    }
    out.push(quote as char);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::heap::Heap;
    use crate::memory::value::{new_scope, Instance};
    use crate::interpreter::types::BuiltinTypes;
    use std::cell::RefCell;

    #[test]
    fn test_float_formatting() {
        assert_eq!(format_float(1.0), "1.0");
        assert_eq!(format_float(0.1), "0.1");
        assert_eq!(format_float(-2.5), "-2.5");
        assert_eq!(format_float(1e16), "1e+16");
        assert_eq!(format_float(1.5e-7), "1.5e-07");
        assert_eq!(format_float(0.0001), "0.0001");
        assert_eq!(format_float(123456789.0), "123456789.0");
        assert_eq!(format_float(f64::INFINITY), "inf");
        assert_eq!(format_float(f64::NAN), "nan");
    }

    #[test]
    fn test_string_quoting() {
        assert_eq!(quote_str("hi"), "'hi'");
        assert_eq!(quote_str("it's"), "\"it's\"");
        assert_eq!(quote_str("a\"b'c"), "'a\"b\\'c'");
        assert_eq!(quote_str("line\n"), "'line\\n'");
        assert_eq!(quote_bytes(b"ab\x00"), "b'ab\\x00'");
    }

    #[test]
    fn test_container_reprs() {
        let mut heap = Heap::new();
        let one = heap.int(1);
        let two = heap.str("two");
        let list = heap.list(vec![one.clone(), two.clone()]);
        assert_eq!(repr_value(&list).unwrap(), "[1, 'two']");
        let single = heap.tuple(vec![one.clone()]);
        assert_eq!(repr_value(&single).unwrap(), "(1,)");
        let empty = heap.tuple(Vec::new());
        assert_eq!(repr_value(&empty).unwrap(), "()");
        let set = heap.alloc(Data::Set(RefCell::new(Default::default())));
        assert_eq!(repr_value(&set).unwrap(), "set()");
        let range = heap.alloc(Data::Range {
            start: 0,
            stop: 5,
            step: 1,
        });
        assert_eq!(repr_value(&range).unwrap(), "range(0, 5)");
    }

    #[test]
    fn test_recursive_list_repr() {
        let mut heap = Heap::new();
        let list = heap.list(Vec::new());
        if let Data::List(items) = list.data() {
            items.borrow_mut().push(list.clone());
        }
        assert_eq!(repr_value(&list).unwrap(), "[[...]]");
    }

    #[test]
    fn test_deep_nesting_fails() {
        let mut heap = Heap::new();
        let mut value = heap.list(Vec::new());
        for _ in 0..100 {
            value = heap.list(vec![value]);
        }
        assert!(repr_value(&value).is_err());
        assert_eq!(repr_or_placeholder(&value), "<unrepresentable list>");
    }

    #[test]
    fn test_exception_repr_and_message() {
        let mut heap = Heap::new();
        let types = BuiltinTypes::new(&mut heap);
        let msg = heap.str("boom");
        let exc = heap.alloc(Data::Instance(Instance {
            class: types.exception(ExcKind::ValueError),
            attrs: new_scope(),
            args: vec![msg],
        }));
        assert_eq!(repr_value(&exc).unwrap(), "ValueError('boom')");
        assert_eq!(exception_message(&exc), "boom");

        let key = heap.str("k");
        let key_error = heap.alloc(Data::Instance(Instance {
            class: types.exception(ExcKind::KeyError),
            attrs: new_scope(),
            args: vec![key],
        }));
        assert_eq!(exception_message(&key_error), "'k'");

        let bare = heap.alloc(Data::Instance(Instance {
            class: types.exception(ExcKind::TypeError),
            attrs: new_scope(),
            args: Vec::new(),
        }));
        assert_eq!(repr_value(&bare).unwrap(), "TypeError()");
        assert_eq!(exception_message(&bare), "");
    }
}
