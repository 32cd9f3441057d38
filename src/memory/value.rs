//! Runtime value representation
//!
//! Every hosted value is a reference-counted [`Object`] stamped with a virtual
//! address when it is allocated on the [`Heap`](super::heap::Heap). Two values
//! are the *same object* exactly when their addresses match; structural
//! equality is a separate, host-level notion.
//!
//! # Value Types
//!
//! - scalars: `None`, `bool`, `int` (64-bit), `float`, `str`, `bytes`
//! - containers: `list`, `tuple`, `dict`, `set`, `range`
//! - callables: user functions, builtins, bound and native methods
//! - classes and their instances (exceptions are instances of builtin classes)

use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::RuntimeError;
use crate::parser::ast::FunctionCode;
use crate::snapshot::introspect::SourceId;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Virtual memory address type (64-bit)
pub type Address = u64;

/// Name → value bindings in insertion order
pub type Namespace = IndexMap<String, Value>;

/// A shared, mutable namespace (module globals, function locals, class and
/// instance attributes). Closures hold on to the scopes they capture.
pub type Scope = Rc<RefCell<Namespace>>;

pub fn new_scope() -> Scope {
    Rc::new(RefCell::new(Namespace::new()))
}

/// A heap object: identity plus payload
pub struct Object {
    pub address: Address,
    pub data: Data,
}

/// Handle to a heap object. Cloning shares the object.
#[derive(Clone)]
pub struct Value(Rc<Object>);

pub type DictEntries = IndexMap<HashKey, (Value, Value)>;
pub type SetEntries = IndexMap<HashKey, Value>;

pub type BuiltinFn =
    fn(&mut Interpreter, Vec<Value>, Vec<(String, Value)>) -> Result<Value, RuntimeError>;

pub enum Data {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    List(RefCell<Vec<Value>>),
    Tuple(Vec<Value>),
    Dict(RefCell<DictEntries>),
    Set(RefCell<SetEntries>),
    Range { start: i64, stop: i64, step: i64 },
    Function(Function),
    Class(Class),
    Instance(Instance),
    BoundMethod { receiver: Value, function: Value },
    Builtin(Builtin),
    NativeMethod { receiver: Value, name: &'static str },
}

/// A user-defined function or lambda
pub struct Function {
    pub code: Rc<FunctionCode>,
    pub defaults: Vec<Value>,
    pub globals: Scope,
    /// Enclosing function scopes, innermost last
    pub closure: Vec<Scope>,
    pub source_id: SourceId,
}

pub struct Class {
    pub name: String,
    pub base: Option<Value>,
    pub attrs: Scope,
    /// `"builtins"` for native classes, `"__main__"` otherwise
    pub module: &'static str,
}

pub struct Instance {
    pub class: Value,
    pub attrs: Scope,
    /// Constructor arguments, kept for exception instances
    pub args: Vec<Value>,
}

pub struct Builtin {
    pub name: &'static str,
    pub func: BuiltinFn,
}

/// Hashable projection of a value, used as dict/set key.
///
/// Numbers that compare equal hash equal: `True`, `1` and `1.0` share a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HashKey {
    None,
    Int(i64),
    Float(u64),
    Str(String),
    Bytes(Vec<u8>),
    Tuple(Vec<HashKey>),
    Identity(Address),
}

impl Value {
    pub fn new(address: Address, data: Data) -> Self {
        Value(Rc::new(Object { address, data }))
    }

    pub fn address(&self) -> Address {
        self.0.address
    }

    pub fn data(&self) -> &Data {
        &self.0.data
    }

    /// Identity comparison (`is`)
    pub fn is(&self, other: &Value) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn is_none(&self) -> bool {
        matches!(self.data(), Data::None)
    }

    /// Integer view of `int` and `bool` values
    pub fn as_int(&self) -> Option<i64> {
        match self.data() {
            Data::Int(n) => Some(*n),
            Data::Bool(b) => Some(*b as i64),
            _ => None,
        }
    }

    /// Numeric view of `int`, `bool` and `float` values
    pub fn as_float(&self) -> Option<f64> {
        match self.data() {
            Data::Float(f) => Some(*f),
            _ => self.as_int().map(|n| n as f64),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self.data() {
            Data::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_class(&self) -> Option<&Class> {
        match self.data() {
            Data::Class(class) => Some(class),
            _ => None,
        }
    }

    pub fn as_instance(&self) -> Option<&Instance> {
        match self.data() {
            Data::Instance(instance) => Some(instance),
            _ => None,
        }
    }

    /// Display name of the runtime type, as `type(v).__name__` would report it
    pub fn type_name(&self) -> String {
        let name = match self.data() {
            Data::None => "NoneType",
            Data::Bool(_) => "bool",
            Data::Int(_) => "int",
            Data::Float(_) => "float",
            Data::Str(_) => "str",
            Data::Bytes(_) => "bytes",
            Data::List(_) => "list",
            Data::Tuple(_) => "tuple",
            Data::Dict(_) => "dict",
            Data::Set(_) => "set",
            Data::Range { .. } => "range",
            Data::Function(_) => "function",
            Data::Class(_) => "type",
            Data::Instance(instance) => {
                return instance
                    .class
                    .as_class()
                    .map(|c| c.name.clone())
                    .unwrap_or_else(|| "object".to_string())
            }
            Data::BoundMethod { .. } => "method",
            Data::Builtin(_) | Data::NativeMethod { .. } => "builtin_function_or_method",
        };
        name.to_string()
    }

    /// Hash key for dict/set membership, or `None` when the value is unhashable.
    pub fn hash_key(&self) -> Option<HashKey> {
        Some(match self.data() {
            Data::None => HashKey::None,
            Data::Bool(b) => HashKey::Int(*b as i64),
            Data::Int(n) => HashKey::Int(*n),
            Data::Float(f) => {
                if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                    HashKey::Int(*f as i64)
                } else {
                    HashKey::Float(f.to_bits())
                }
            }
            Data::Str(s) => HashKey::Str(s.clone()),
            Data::Bytes(b) => HashKey::Bytes(b.clone()),
            Data::Tuple(items) => HashKey::Tuple(
                items
                    .iter()
                    .map(Value::hash_key)
                    .collect::<Option<Vec<_>>>()?,
            ),
            Data::List(_) | Data::Dict(_) | Data::Set(_) => return None,
            _ => HashKey::Identity(self.address()),
        })
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} at 0x{:x}>", self.type_name(), self.address())
    }
}

/// Structural equality (`==`) for builtin types; identity for everything else.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    if a.is(b) {
        return !matches!(a.data(), Data::Float(f) if f.is_nan());
    }
    match (a.data(), b.data()) {
        (Data::None, Data::None) => true,
        (Data::Float(_), _) | (_, Data::Float(_)) => match (a.as_float(), b.as_float()) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        },
        (Data::Int(_) | Data::Bool(_), Data::Int(_) | Data::Bool(_)) => a.as_int() == b.as_int(),
        (Data::Str(x), Data::Str(y)) => x == y,
        (Data::Bytes(x), Data::Bytes(y)) => x == y,
        (Data::List(x), Data::List(y)) => sequences_equal(&x.borrow(), &y.borrow()),
        (Data::Tuple(x), Data::Tuple(y)) => sequences_equal(x, y),
        (Data::Dict(x), Data::Dict(y)) => {
            let (x, y) = (x.borrow(), y.borrow());
            x.len() == y.len()
                && x.iter().all(|(key, (_, xv))| {
                    y.get(key).is_some_and(|(_, yv)| values_equal(xv, yv))
                })
        }
        (Data::Set(x), Data::Set(y)) => {
            let (x, y) = (x.borrow(), y.borrow());
            x.len() == y.len() && x.keys().all(|k| y.contains_key(k))
        }
        (
            Data::Range {
                start: s1,
                stop: e1,
                step: t1,
            },
            Data::Range {
                start: s2,
                stop: e2,
                step: t2,
            },
        ) => s1 == s2 && e1 == e2 && t1 == t2,
        (
            Data::BoundMethod {
                receiver: r1,
                function: f1,
            },
            Data::BoundMethod {
                receiver: r2,
                function: f2,
            },
        ) => r1.is(r2) && f1.is(f2),
        _ => false,
    }
}

fn sequences_equal(x: &[Value], y: &[Value]) -> bool {
    x.len() == y.len() && x.iter().zip(y).all(|(a, b)| values_equal(a, b))
}

/// Number of items in a range. Wide enough for any pair of `i64` bounds.
pub fn range_len(start: i64, stop: i64, step: i64) -> i128 {
    let (start, stop, step) = (i128::from(start), i128::from(stop), i128::from(step));
    if step > 0 && start < stop {
        (stop - start - 1) / step + 1
    } else if step < 0 && start > stop {
        (start - stop - 1) / (-step) + 1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(address: Address, data: Data) -> Value {
        Value::new(address, data)
    }

    #[test]
    fn test_identity_is_by_address_not_content() {
        let a = v(1, Data::Int(5));
        let b = v(2, Data::Int(5));
        assert!(values_equal(&a, &b));
        assert!(!a.is(&b));
        assert!(a.is(&a.clone()));
    }

    #[test]
    fn test_numeric_hash_keys_unify() {
        assert_eq!(v(1, Data::Bool(true)).hash_key(), Some(HashKey::Int(1)));
        assert_eq!(v(2, Data::Float(1.0)).hash_key(), Some(HashKey::Int(1)));
        assert_eq!(v(3, Data::Float(-0.0)).hash_key(), Some(HashKey::Int(0)));
        assert_eq!(
            v(4, Data::Float(1.5)).hash_key(),
            Some(HashKey::Float(1.5f64.to_bits()))
        );
    }

    #[test]
    fn test_unhashable_containers() {
        let list = v(1, Data::List(RefCell::new(Vec::new())));
        assert!(list.hash_key().is_none());
        let tuple = v(2, Data::Tuple(vec![list]));
        assert!(tuple.hash_key().is_none());
    }

    #[test]
    fn test_range_len() {
        assert_eq!(range_len(0, 5, 1), 5);
        assert_eq!(range_len(0, 5, 2), 3);
        assert_eq!(range_len(5, 0, -1), 5);
        assert_eq!(range_len(5, 5, 1), 0);
        assert_eq!(range_len(0, 5, -1), 0);
        assert_eq!(range_len(i64::MIN, i64::MAX, 1), u64::MAX as i128);
        assert_eq!(range_len(i64::MAX, i64::MIN, i64::MIN), 2);
    }
}
