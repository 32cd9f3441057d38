use crate::interpreter::builtins::float_to_int;
use crate::interpreter::constants::{MAX_FORMAT_PRECISION, MAX_REPEAT_LEN};
use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::{EvalResult, RuntimeError};
use crate::interpreter::types::{lookup_class_attr, ExcKind};
use crate::memory::value::{range_len, values_equal, Data, HashKey, SetEntries, Value};
use crate::parser::ast::{BinOp, CmpOp};
use std::cell::RefCell;
use std::cmp::Ordering;

/// Operand type names of a failed ordering comparison
pub(crate) type Unorderable = (String, String);

impl Interpreter {
    /// Evaluate `left op right`
    pub(crate) fn binary_op(&mut self, op: BinOp, left: &Value, right: &Value) -> EvalResult {
        if let Some(result) = self.call_dunder(left, dunder_name(op), vec![right.clone()])? {
            return Ok(result);
        }
        if let Some(result) = self.call_dunder(right, &reflected_name(op), vec![left.clone()])? {
            return Ok(result);
        }

        match (left.data(), right.data()) {
            (Data::Bool(a), Data::Bool(b)) if matches!(op, BinOp::BitAnd | BinOp::BitOr | BinOp::BitXor) => {
                let result = match op {
                    BinOp::BitAnd => a & b,
                    BinOp::BitOr => a | b,
                    _ => a ^ b,
                };
                return Ok(self.heap.bool(result));
            }
            (Data::Int(_) | Data::Bool(_), Data::Int(_) | Data::Bool(_)) => {
                let (a, b) = (left.as_int().unwrap_or(0), right.as_int().unwrap_or(0));
                return self.int_op(op, a, b);
            }
            (Data::Float(_), Data::Int(_) | Data::Bool(_) | Data::Float(_))
            | (Data::Int(_) | Data::Bool(_), Data::Float(_)) => {
                let (a, b) = (left.as_float().unwrap_or(0.0), right.as_float().unwrap_or(0.0));
                if let Some(result) = self.float_op(op, a, b)? {
                    return Ok(result);
                }
            }
            _ => {}
        }

        match op {
            BinOp::Add => self.concat(left, right),
            BinOp::Mul => self.repeat(left, right),
            BinOp::Mod if left.as_str().is_some() => self.percent_format(left, right),
            BinOp::BitAnd | BinOp::BitOr | BinOp::BitXor | BinOp::Sub => {
                match (left.data(), right.data()) {
                    (Data::Set(a), Data::Set(b)) => {
                        let combined = set_algebra(op, &a.borrow(), &b.borrow());
                        Ok(self.heap.alloc(Data::Set(RefCell::new(combined))))
                    }
                    _ => Err(self.unsupported(op, left, right)),
                }
            }
            _ => Err(self.unsupported(op, left, right)),
        }
    }

    fn unsupported(&mut self, op: BinOp, left: &Value, right: &Value) -> RuntimeError {
        let message = format!(
            "unsupported operand type(s) for {}: '{}' and '{}'",
            op.symbol(),
            left.type_name(),
            right.type_name()
        );
        self.raise(ExcKind::TypeError, message)
    }

    fn int_op(&mut self, op: BinOp, a: i64, b: i64) -> EvalResult {
        let result = match op {
            BinOp::Add => a.checked_add(b),
            BinOp::Sub => a.checked_sub(b),
            BinOp::Mul => a.checked_mul(b),
            BinOp::Div => {
                if b == 0 {
                    return Err(self.raise(ExcKind::ZeroDivisionError, "division by zero"));
                }
                return Ok(self.heap.float(a as f64 / b as f64));
            }
            BinOp::FloorDiv | BinOp::Mod => {
                if b == 0 {
                    return Err(self.raise(
                        ExcKind::ZeroDivisionError,
                        "integer division or modulo by zero",
                    ));
                }
                if op == BinOp::FloorDiv {
                    floor_div(a, b)
                } else {
                    floor_mod(a, b)
                }
            }
            BinOp::Pow => {
                if b < 0 {
                    if a == 0 {
                        return Err(self.raise(
                            ExcKind::ZeroDivisionError,
                            "0.0 cannot be raised to a negative power",
                        ));
                    }
                    return Ok(self.heap.float((a as f64).powf(b as f64)));
                }
                u32::try_from(b).ok().and_then(|exp| a.checked_pow(exp))
            }
            BinOp::BitAnd => Some(a & b),
            BinOp::BitOr => Some(a | b),
            BinOp::BitXor => Some(a ^ b),
            BinOp::Shl | BinOp::Shr => {
                if b < 0 {
                    return Err(self.raise(ExcKind::ValueError, "negative shift count"));
                }
                if op == BinOp::Shr {
                    Some(if b >= 64 { if a < 0 { -1 } else { 0 } } else { a >> b })
                } else if a == 0 {
                    Some(0)
                } else {
                    u32::try_from(b)
                        .ok()
                        .filter(|&shift| shift < 63)
                        .and_then(|shift| a.checked_mul(1i64.checked_shl(shift)?))
                }
            }
        };
        match result {
            Some(n) => Ok(self.heap.int(n)),
            None => Err(self.raise(
                ExcKind::OverflowError,
                format!("integer result of '{}' is too large", op.symbol()),
            )),
        }
    }

    /// Float arithmetic; `None` for operators floats do not support
    fn float_op(&mut self, op: BinOp, a: f64, b: f64) -> Result<Option<Value>, RuntimeError> {
        let result = match op {
            BinOp::Add => a + b,
            BinOp::Sub => a - b,
            BinOp::Mul => a * b,
            BinOp::Div => {
                if b == 0.0 {
                    return Err(self.raise(ExcKind::ZeroDivisionError, "float division by zero"));
                }
                a / b
            }
            BinOp::FloorDiv => {
                if b == 0.0 {
                    return Err(self.raise(
                        ExcKind::ZeroDivisionError,
                        "float floor division by zero",
                    ));
                }
                float_floor_div(a, b)
            }
            BinOp::Mod => {
                if b == 0.0 {
                    return Err(self.raise(ExcKind::ZeroDivisionError, "float modulo"));
                }
                let r = a % b;
                if r != 0.0 && (r < 0.0) != (b < 0.0) {
                    r + b
                } else {
                    r
                }
            }
            BinOp::Pow => {
                if a == 0.0 && b < 0.0 {
                    return Err(self.raise(
                        ExcKind::ZeroDivisionError,
                        "0.0 cannot be raised to a negative power",
                    ));
                }
                let r = a.powf(b);
                if r.is_infinite() && a.is_finite() && b.is_finite() {
                    return Err(self.raise(ExcKind::OverflowError, "(34, 'Numerical result out of range')"));
                }
                r
            }
            _ => return Ok(None),
        };
        Ok(Some(self.heap.float(result)))
    }

    fn concat(&mut self, left: &Value, right: &Value) -> EvalResult {
        match (left.data(), right.data()) {
            (Data::Str(a), Data::Str(b)) => Ok(self.heap.str(format!("{}{}", a, b))),
            (Data::Bytes(a), Data::Bytes(b)) => {
                let joined = a.iter().chain(b).copied().collect();
                Ok(self.heap.alloc(Data::Bytes(joined)))
            }
            (Data::List(a), Data::List(b)) => {
                let joined = a.borrow().iter().chain(b.borrow().iter()).cloned().collect();
                Ok(self.heap.list(joined))
            }
            (Data::Tuple(a), Data::Tuple(b)) => {
                let joined = a.iter().chain(b).cloned().collect();
                Ok(self.heap.tuple(joined))
            }
            (Data::Str(_) | Data::List(_) | Data::Tuple(_), _) => {
                let kind = left.type_name();
                let message = format!(
                    "can only concatenate {} (not \"{}\") to {}",
                    kind,
                    right.type_name(),
                    kind
                );
                Err(self.raise(ExcKind::TypeError, message))
            }
            _ => Err(self.unsupported(BinOp::Add, left, right)),
        }
    }

    fn repeat(&mut self, left: &Value, right: &Value) -> EvalResult {
        let (sequence, count) = match (left.as_int(), right.as_int()) {
            (None, Some(n)) => (left, n),
            (Some(n), None) => (right, n),
            _ => return Err(self.unsupported(BinOp::Mul, left, right)),
        };
        let times = count.max(0) as usize;
        let unit_len = match sequence.data() {
            Data::Str(s) => s.len(),
            Data::Bytes(b) => b.len(),
            Data::List(items) => items.borrow().len(),
            Data::Tuple(items) => items.len(),
            _ => return Err(self.unsupported(BinOp::Mul, left, right)),
        };
        if unit_len.saturating_mul(times) > MAX_REPEAT_LEN {
            return Err(self.raise(ExcKind::OverflowError, "repeated sequence is too long"));
        }
        Ok(match sequence.data() {
            Data::Str(s) => self.heap.str(s.repeat(times)),
            Data::Bytes(b) => self.heap.alloc(Data::Bytes(b.repeat(times))),
            Data::List(items) => {
                let repeated = repeat_values(&items.borrow(), times);
                self.heap.list(repeated)
            }
            Data::Tuple(items) => self.heap.tuple(repeat_values(items, times)),
            _ => self.heap.none(),
        })
    }

    /// `"..." % args` with `%s`, `%r`, `%d`, `%i`, `%f` (optionally `%.Nf`) and `%%`
    fn percent_format(&mut self, template: &Value, args: &Value) -> EvalResult {
        let template = template.as_str().unwrap_or_default().to_string();
        let values: Vec<Value> = match args.data() {
            Data::Tuple(items) => items.clone(),
            _ => vec![args.clone()],
        };
        let mut values = values.into_iter();
        let mut out = String::new();
        let mut chars = template.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '%' {
                out.push(c);
                continue;
            }
            let mut precision = String::new();
            if chars.peek() == Some(&'.') {
                chars.next();
                while let Some(d) = chars.peek().copied().filter(char::is_ascii_digit) {
                    precision.push(d);
                    chars.next();
                }
            }
            let Some(conversion) = chars.next() else {
                return Err(self.raise(ExcKind::ValueError, "incomplete format"));
            };
            if conversion == '%' {
                out.push('%');
                continue;
            }
            let Some(value) = values.next() else {
                return Err(self.raise(
                    ExcKind::TypeError,
                    "not enough arguments for format string",
                ));
            };
            match conversion {
                's' => out.push_str(&self.to_display_string(&value)?),
                'r' => out.push_str(&self.to_repr_string(&value)?),
                'd' | 'i' | 'f' => {
                    let Some(number) = value.as_float() else {
                        let message = format!(
                            "%{} format: a real number is required, not {}",
                            conversion,
                            value.type_name()
                        );
                        return Err(self.raise(ExcKind::TypeError, message));
                    };
                    if conversion == 'f' {
                        let digits = if precision.is_empty() {
                            6
                        } else {
                            match precision.parse::<usize>() {
                                Ok(digits) if digits <= MAX_FORMAT_PRECISION => digits,
                                _ => return Err(self.raise(ExcKind::ValueError, "precision too big")),
                            }
                        };
                        out.push_str(&format!("{:.*}", digits, number));
                    } else if let Some(n) = value.as_int() {
                        out.push_str(&n.to_string());
                    } else {
                        let n = float_to_int(self, number)?;
                        out.push_str(&n.to_string());
                    }
                }
                other => {
                    let message = format!("unsupported format character '{}'", other);
                    return Err(self.raise(ExcKind::ValueError, message));
                }
            }
        }
        if values.next().is_some() {
            return Err(self.raise(
                ExcKind::TypeError,
                "not all arguments converted during string formatting",
            ));
        }
        Ok(self.heap.str(out))
    }

    // ===== Comparisons =====

    pub(crate) fn compare(&mut self, op: CmpOp, left: &Value, right: &Value) -> Result<bool, RuntimeError> {
        match op {
            CmpOp::Is => Ok(left.is(right)),
            CmpOp::IsNot => Ok(!left.is(right)),
            CmpOp::In => self.contains(right, left),
            CmpOp::NotIn => Ok(!self.contains(right, left)?),
            CmpOp::Eq => self.equals(left, right),
            CmpOp::Ne => {
                if let Some(result) = self.call_dunder(left, "__ne__", vec![right.clone()])? {
                    return Ok(self.truthy(&result));
                }
                Ok(!self.equals(left, right)?)
            }
            CmpOp::Lt | CmpOp::Le | CmpOp::Gt | CmpOp::Ge => {
                let (name, reflected) = match op {
                    CmpOp::Lt => ("__lt__", "__gt__"),
                    CmpOp::Le => ("__le__", "__ge__"),
                    CmpOp::Gt => ("__gt__", "__lt__"),
                    _ => ("__ge__", "__le__"),
                };
                if let Some(result) = self.call_dunder(left, name, vec![right.clone()])? {
                    return Ok(self.truthy(&result));
                }
                if let Some(result) = self.call_dunder(right, reflected, vec![left.clone()])? {
                    return Ok(self.truthy(&result));
                }
                match order_values(left, right) {
                    Ok(ordering) => Ok(ordering_satisfies(op, ordering)),
                    Err((a, b)) => {
                        let message = format!(
                            "'{}' not supported between instances of '{}' and '{}'",
                            op.symbol(),
                            a,
                            b
                        );
                        Err(self.raise(ExcKind::TypeError, message))
                    }
                }
            }
        }
    }

    /// `==`, honouring a user `__eq__`
    pub(crate) fn equals(&mut self, left: &Value, right: &Value) -> Result<bool, RuntimeError> {
        if let Some(result) = self.call_dunder(left, "__eq__", vec![right.clone()])? {
            return Ok(self.truthy(&result));
        }
        if let Some(result) = self.call_dunder(right, "__eq__", vec![left.clone()])? {
            return Ok(self.truthy(&result));
        }
        Ok(values_equal(left, right))
    }

    /// `item in container`
    pub(crate) fn contains(&mut self, container: &Value, item: &Value) -> Result<bool, RuntimeError> {
        if let Some(result) = self.call_dunder(container, "__contains__", vec![item.clone()])? {
            return Ok(self.truthy(&result));
        }
        match container.data() {
            Data::Str(haystack) => match item.as_str() {
                Some(needle) => Ok(haystack.contains(needle)),
                None => {
                    let message = format!(
                        "'in <string>' requires string as left operand, not {}",
                        item.type_name()
                    );
                    Err(self.raise(ExcKind::TypeError, message))
                }
            },
            Data::List(items) => {
                let items = items.borrow().clone();
                self.any_equal(&items, item)
            }
            Data::Tuple(items) => {
                let items = items.clone();
                self.any_equal(&items, item)
            }
            Data::Dict(entries) => {
                let key = self.hash_key_of(item)?;
                Ok(entries.borrow().contains_key(&key))
            }
            Data::Set(entries) => {
                let key = self.hash_key_of(item)?;
                Ok(entries.borrow().contains_key(&key))
            }
            Data::Range { start, stop, step } => Ok(match item.as_int() {
                Some(n) => {
                    let offset = i128::from(n) - i128::from(*start);
                    let stride = i128::from(*step);
                    offset % stride == 0 && {
                        let index = offset / stride;
                        index >= 0 && index < range_len(*start, *stop, *step)
                    }
                }
                None => false,
            }),
            _ => {
                let message = format!("argument of type '{}' is not iterable", container.type_name());
                Err(self.raise(ExcKind::TypeError, message))
            }
        }
    }

    fn any_equal(&mut self, items: &[Value], item: &Value) -> Result<bool, RuntimeError> {
        for candidate in items {
            if candidate.is(item) || self.equals(candidate, item)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Hash key of a dict key or set member
    pub(crate) fn hash_key_of(&mut self, value: &Value) -> Result<HashKey, RuntimeError> {
        match value.hash_key() {
            Some(key) => Ok(key),
            None => {
                let message = format!("unhashable type: '{}'", unhashable_part(value));
                Err(self.raise(ExcKind::TypeError, message))
            }
        }
    }

    /// Call the user-defined special method `name` on an instance, if it has one
    pub(crate) fn call_dunder(
        &mut self,
        receiver: &Value,
        name: &str,
        args: Vec<Value>,
    ) -> Result<Option<Value>, RuntimeError> {
        let Some(instance) = receiver.as_instance() else {
            return Ok(None);
        };
        let Some(method) = lookup_class_attr(&instance.class, name) else {
            return Ok(None);
        };
        if !matches!(method.data(), Data::Function(_)) {
            return Ok(None);
        }
        let mut full = Vec::with_capacity(args.len() + 1);
        full.push(receiver.clone());
        full.extend(args);
        self.call_function(&method, full, Vec::new()).map(Some)
    }
}

fn dunder_name(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "__add__",
        BinOp::Sub => "__sub__",
        BinOp::Mul => "__mul__",
        BinOp::Div => "__truediv__",
        BinOp::FloorDiv => "__floordiv__",
        BinOp::Mod => "__mod__",
        BinOp::Pow => "__pow__",
        BinOp::BitAnd => "__and__",
        BinOp::BitOr => "__or__",
        BinOp::BitXor => "__xor__",
        BinOp::Shl => "__lshift__",
        BinOp::Shr => "__rshift__",
    }
}

/// `__add__` → `__radd__`
fn reflected_name(op: BinOp) -> String {
    format!("__r{}", &dunder_name(op)[2..])
}

/// First unhashable type found in `value`; tuples report their offending member
fn unhashable_part(value: &Value) -> String {
    match value.data() {
        Data::Tuple(items) => items
            .iter()
            .find(|item| item.hash_key().is_none())
            .map_or_else(|| value.type_name(), unhashable_part),
        _ => value.type_name(),
    }
}

fn floor_div(a: i64, b: i64) -> Option<i64> {
    let q = a.checked_div(b)?;
    if a % b != 0 && ((a < 0) != (b < 0)) {
        Some(q - 1)
    } else {
        Some(q)
    }
}

fn floor_mod(a: i64, b: i64) -> Option<i64> {
    let r = a.checked_rem(b)?;
    if r != 0 && ((r < 0) != (b < 0)) {
        Some(r + b)
    } else {
        Some(r)
    }
}

fn set_algebra(op: BinOp, a: &SetEntries, b: &SetEntries) -> SetEntries {
    match op {
        BinOp::BitOr => a
            .iter()
            .chain(b.iter().filter(|(k, _)| !a.contains_key(*k)))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
        BinOp::BitAnd => a
            .iter()
            .filter(|(k, _)| b.contains_key(*k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
        BinOp::Sub => a
            .iter()
            .filter(|(k, _)| !b.contains_key(*k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
        _ => a
            .iter()
            .filter(|(k, _)| !b.contains_key(*k))
            .chain(b.iter().filter(|(k, _)| !a.contains_key(*k)))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    }
}

/// Whether an ordering comparison holds. `None` (unordered, e.g. NaN) never does.
fn ordering_satisfies(op: CmpOp, ordering: Option<Ordering>) -> bool {
    match (op, ordering) {
        (_, None) => false,
        (CmpOp::Lt, Some(o)) => o == Ordering::Less,
        (CmpOp::Le, Some(o)) => o != Ordering::Greater,
        (CmpOp::Gt, Some(o)) => o == Ordering::Greater,
        (CmpOp::Ge, Some(o)) => o != Ordering::Less,
        _ => false,
    }
}

/// Natural ordering of builtin values.
///
/// Numbers compare by value, strings and bytes lexicographically, lists and
/// tuples element-wise, and sets by inclusion. `Ok(None)` means the values are
/// of orderable types but unordered (NaN, incomparable sets); `Err` carries the
/// operand type names when the types cannot be ordered at all.
pub(crate) fn order_values(a: &Value, b: &Value) -> Result<Option<Ordering>, Unorderable> {
    match (a.data(), b.data()) {
        (Data::Int(_) | Data::Bool(_), Data::Int(_) | Data::Bool(_)) => {
            Ok(a.as_int().partial_cmp(&b.as_int()))
        }
        (Data::Int(_) | Data::Bool(_) | Data::Float(_), Data::Int(_) | Data::Bool(_) | Data::Float(_)) => {
            Ok(a.as_float().partial_cmp(&b.as_float()))
        }
        (Data::Str(x), Data::Str(y)) => Ok(Some(x.cmp(y))),
        (Data::Bytes(x), Data::Bytes(y)) => Ok(Some(x.cmp(y))),
        (Data::List(x), Data::List(y)) => order_sequences(&x.borrow(), &y.borrow()),
        (Data::Tuple(x), Data::Tuple(y)) => order_sequences(x, y),
        (Data::Set(x), Data::Set(y)) => {
            let (x, y) = (x.borrow(), y.borrow());
            let x_in_y = x.keys().all(|k| y.contains_key(k));
            let y_in_x = y.keys().all(|k| x.contains_key(k));
            Ok(match (x_in_y, y_in_x) {
                (true, true) => Some(Ordering::Equal),
                (true, false) => Some(Ordering::Less),
                (false, true) => Some(Ordering::Greater),
                (false, false) => None,
            })
        }
        _ => Err((a.type_name(), b.type_name())),
    }
}

fn order_sequences(x: &[Value], y: &[Value]) -> Result<Option<Ordering>, Unorderable> {
    for (a, b) in x.iter().zip(y) {
        if !values_equal(a, b) {
            return order_values(a, b);
        }
    }
    Ok(Some(x.len().cmp(&y.len())))
}

/// Floor of `a / b` computed from the remainder, so non-finite operands give
/// NaN where a plain `floor` would give an infinity
fn float_floor_div(a: f64, b: f64) -> f64 {
    let remainder = a % b;
    let mut quotient = (a - remainder) / b;
    if remainder != 0.0 && (b < 0.0) != (remainder < 0.0) {
        quotient -= 1.0;
    }
    if quotient == 0.0 {
        return 0f64.copysign(a / b);
    }
    let floored = quotient.floor();
    if quotient - floored > 0.5 {
        floored + 1.0
    } else {
        floored
    }
}

/// `times` back-to-back copies of `items`
fn repeat_values(items: &[Value], times: usize) -> Vec<Value> {
    let mut repeated = Vec::with_capacity(items.len() * times);
    for _ in 0..times {
        repeated.extend(items.iter().cloned());
    }
    repeated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::repr::repr_value;

    #[test]
    fn test_floor_semantics() {
        assert_eq!(floor_div(7, 2), Some(3));
        assert_eq!(floor_div(-7, 2), Some(-4));
        assert_eq!(floor_div(7, -2), Some(-4));
        assert_eq!(floor_mod(-7, 2), Some(1));
        assert_eq!(floor_mod(7, -2), Some(-1));
        assert_eq!(floor_div(i64::MIN, -1), None);
    }

    #[test]
    fn test_float_floor_division() {
        assert_eq!(float_floor_div(7.0, 2.0), 3.0);
        assert_eq!(float_floor_div(-7.0, 2.0), -4.0);
        assert_eq!(float_floor_div(7.5, -2.0), -4.0);
        assert_eq!(float_floor_div(1.0, f64::INFINITY), 0.0);
        assert_eq!(float_floor_div(-1.0, f64::INFINITY), -1.0);
        assert!(float_floor_div(f64::INFINITY, 1.0).is_nan());
        assert!(float_floor_div(f64::NEG_INFINITY, 3.0).is_nan());
    }

    #[test]
    fn test_repetition_clones_elements() {
        let mut interpreter = Interpreter::new();
        let one = interpreter.heap.int(1);
        let two = interpreter.heap.int(2);
        let three = interpreter.heap.int(3);
        let list = interpreter.heap.list(vec![one.clone(), two]);
        let repeated = interpreter.binary_op(BinOp::Mul, &list, &three).unwrap();
        assert_eq!(repr_value(&repeated).unwrap(), "[1, 2, 1, 2, 1, 2]");

        let single = interpreter.heap.tuple(vec![one]);
        let pair = interpreter.heap.int(2);
        let doubled = interpreter.binary_op(BinOp::Mul, &pair, &single).unwrap();
        assert_eq!(repr_value(&doubled).unwrap(), "(1, 1)");

        let negative = interpreter.heap.int(-1);
        let empty = interpreter.binary_op(BinOp::Mul, &list, &negative).unwrap();
        assert_eq!(repr_value(&empty).unwrap(), "[]");
    }

    #[test]
    fn test_reflected_names() {
        assert_eq!(reflected_name(BinOp::Add), "__radd__");
        assert_eq!(reflected_name(BinOp::Div), "__rtruediv__");
    }

    #[test]
    fn test_arithmetic_results() {
        let mut interpreter = Interpreter::new();
        let seven = interpreter.heap.int(7);
        let two = interpreter.heap.int(2);
        let quotient = interpreter.binary_op(BinOp::Div, &seven, &two).unwrap();
        assert_eq!(quotient.as_float(), Some(3.5));
        let power = interpreter.binary_op(BinOp::Pow, &two, &seven).unwrap();
        assert_eq!(power.as_int(), Some(128));
        let half = interpreter.heap.float(0.5);
        let sum = interpreter.binary_op(BinOp::Add, &seven, &half).unwrap();
        assert_eq!(sum.as_float(), Some(7.5));
    }

    #[test]
    fn test_division_by_zero_messages() {
        let mut interpreter = Interpreter::new();
        let one = interpreter.heap.int(1);
        let zero = interpreter.heap.int(0);
        let fzero = interpreter.heap.float(0.0);
        let err = interpreter.binary_op(BinOp::Div, &one, &zero).unwrap_err();
        assert_eq!(err.to_string(), "ZeroDivisionError: division by zero");
        let err = interpreter.binary_op(BinOp::FloorDiv, &one, &zero).unwrap_err();
        assert_eq!(
            err.to_string(),
            "ZeroDivisionError: integer division or modulo by zero"
        );
        let err = interpreter.binary_op(BinOp::Div, &one, &fzero).unwrap_err();
        assert_eq!(err.to_string(), "ZeroDivisionError: float division by zero");
    }

    #[test]
    fn test_mixed_type_errors() {
        let mut interpreter = Interpreter::new();
        let text = interpreter.heap.str("a");
        let one = interpreter.heap.int(1);
        let err = interpreter.binary_op(BinOp::Add, &text, &one).unwrap_err();
        assert_eq!(
            err.to_string(),
            "TypeError: can only concatenate str (not \"int\") to str"
        );
        let err = interpreter.binary_op(BinOp::Add, &one, &text).unwrap_err();
        assert_eq!(
            err.to_string(),
            "TypeError: unsupported operand type(s) for +: 'int' and 'str'"
        );
        let err = interpreter.compare(CmpOp::Lt, &one, &text).unwrap_err();
        assert_eq!(
            err.to_string(),
            "TypeError: '<' not supported between instances of 'int' and 'str'"
        );
    }

    #[test]
    fn test_sequence_ordering_and_membership() {
        let mut interpreter = Interpreter::new();
        let one = interpreter.heap.int(1);
        let two = interpreter.heap.int(2);
        let short = interpreter.heap.list(vec![one.clone()]);
        let long = interpreter.heap.list(vec![one.clone(), two.clone()]);
        assert_eq!(order_values(&short, &long), Ok(Some(Ordering::Less)));
        assert!(interpreter.contains(&long, &two).unwrap());
        let range = interpreter.heap.alloc(Data::Range {
            start: 0,
            stop: 10,
            step: 3,
        });
        let nine = interpreter.heap.int(9);
        assert!(interpreter.contains(&range, &nine).unwrap());
        assert!(!interpreter.contains(&range, &two).unwrap());
    }

    #[test]
    fn test_nan_is_unordered() {
        let mut interpreter = Interpreter::new();
        let nan = interpreter.heap.float(f64::NAN);
        let one = interpreter.heap.int(1);
        assert_eq!(order_values(&nan, &one), Ok(None));
        assert!(!interpreter.compare(CmpOp::Lt, &nan, &one).unwrap());
        assert!(!interpreter.compare(CmpOp::Ge, &nan, &one).unwrap());
    }

    #[test]
    fn test_percent_format() {
        let mut interpreter = Interpreter::new();
        let template = interpreter.heap.str("%s has %d items (%.1f%%)");
        let name = interpreter.heap.str("cart");
        let count = interpreter.heap.int(3);
        let share = interpreter.heap.float(42.26);
        let args = interpreter.heap.tuple(vec![name, count, share]);
        let result = interpreter.binary_op(BinOp::Mod, &template, &args).unwrap();
        assert_eq!(result.as_str(), Some("cart has 3 items (42.3%)"));
    }

    #[test]
    fn test_percent_format_limits() {
        let mut interpreter = Interpreter::new();
        let huge = interpreter.heap.float(1e300);
        let template = interpreter.heap.str("%d");
        let err = interpreter.binary_op(BinOp::Mod, &template, &huge).unwrap_err();
        assert_eq!(err.to_string(), "OverflowError: int too large to convert");

        let template = interpreter.heap.str("%.99999999f");
        let one = interpreter.heap.float(1.0);
        let err = interpreter.binary_op(BinOp::Mod, &template, &one).unwrap_err();
        assert_eq!(err.to_string(), "ValueError: precision too big");

        let template = interpreter.heap.str("%d");
        let truncated = interpreter.heap.float(-2.7);
        let result = interpreter.binary_op(BinOp::Mod, &template, &truncated).unwrap();
        assert_eq!(result.as_str(), Some("-2"));
    }
}
