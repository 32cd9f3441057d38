//! Builtin classes
//!
//! Builtin types are ordinary class objects (module `builtins`) so that
//! `type()`, `isinstance()` and `except` clauses work uniformly for builtin
//! and user-defined classes. Exceptions form the usual hierarchy rooted at
//! `BaseException`.

use crate::memory::heap::Heap;
use crate::memory::value::{new_scope, Class, Data, Value};

/// Builtin exception classes the interpreter raises itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExcKind {
    BaseException,
    Exception,
    ValueError,
    TypeError,
    NameError,
    UnboundLocalError,
    AttributeError,
    LookupError,
    IndexError,
    KeyError,
    ArithmeticError,
    ZeroDivisionError,
    OverflowError,
    RuntimeError,
    RecursionError,
    NotImplementedError,
    AssertionError,
    StopIteration,
}

impl ExcKind {
    /// Every kind, bases before subclasses
    pub const ALL: [ExcKind; 18] = [
        ExcKind::BaseException,
        ExcKind::Exception,
        ExcKind::ValueError,
        ExcKind::TypeError,
        ExcKind::NameError,
        ExcKind::UnboundLocalError,
        ExcKind::AttributeError,
        ExcKind::LookupError,
        ExcKind::IndexError,
        ExcKind::KeyError,
        ExcKind::ArithmeticError,
        ExcKind::ZeroDivisionError,
        ExcKind::OverflowError,
        ExcKind::RuntimeError,
        ExcKind::RecursionError,
        ExcKind::NotImplementedError,
        ExcKind::AssertionError,
        ExcKind::StopIteration,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ExcKind::BaseException => "BaseException",
            ExcKind::Exception => "Exception",
            ExcKind::ValueError => "ValueError",
            ExcKind::TypeError => "TypeError",
            ExcKind::NameError => "NameError",
            ExcKind::UnboundLocalError => "UnboundLocalError",
            ExcKind::AttributeError => "AttributeError",
            ExcKind::LookupError => "LookupError",
            ExcKind::IndexError => "IndexError",
            ExcKind::KeyError => "KeyError",
            ExcKind::ArithmeticError => "ArithmeticError",
            ExcKind::ZeroDivisionError => "ZeroDivisionError",
            ExcKind::OverflowError => "OverflowError",
            ExcKind::RuntimeError => "RuntimeError",
            ExcKind::RecursionError => "RecursionError",
            ExcKind::NotImplementedError => "NotImplementedError",
            ExcKind::AssertionError => "AssertionError",
            ExcKind::StopIteration => "StopIteration",
        }
    }

    pub fn base(self) -> Option<ExcKind> {
        match self {
            ExcKind::BaseException => None,
            ExcKind::Exception => Some(ExcKind::BaseException),
            ExcKind::UnboundLocalError => Some(ExcKind::NameError),
            ExcKind::IndexError | ExcKind::KeyError => Some(ExcKind::LookupError),
            ExcKind::ZeroDivisionError | ExcKind::OverflowError => Some(ExcKind::ArithmeticError),
            ExcKind::RecursionError | ExcKind::NotImplementedError => Some(ExcKind::RuntimeError),
            _ => Some(ExcKind::Exception),
        }
    }
}

/// Class objects for the builtin types
pub struct BuiltinTypes {
    pub object: Value,
    pub type_: Value,
    pub none: Value,
    pub bool: Value,
    pub int: Value,
    pub float: Value,
    pub str: Value,
    pub bytes: Value,
    pub list: Value,
    pub tuple: Value,
    pub dict: Value,
    pub set: Value,
    pub range: Value,
    pub function: Value,
    pub method: Value,
    pub builtin_function: Value,
    exceptions: Vec<Value>,
}

fn builtin_class(heap: &mut Heap, name: &str, base: Option<&Value>) -> Value {
    heap.alloc(Data::Class(Class {
        name: name.to_string(),
        base: base.cloned(),
        attrs: new_scope(),
        module: "builtins",
    }))
}

impl BuiltinTypes {
    pub fn new(heap: &mut Heap) -> Self {
        let object = builtin_class(heap, "object", None);
        let int = builtin_class(heap, "int", Some(&object));
        let mut exceptions: Vec<Value> = Vec::with_capacity(ExcKind::ALL.len());
        for kind in ExcKind::ALL {
            let base = match kind.base() {
                Some(base) => exceptions[base as usize].clone(),
                None => object.clone(),
            };
            exceptions.push(builtin_class(heap, kind.name(), Some(&base)));
        }
        BuiltinTypes {
            type_: builtin_class(heap, "type", Some(&object)),
            none: builtin_class(heap, "NoneType", Some(&object)),
            bool: builtin_class(heap, "bool", Some(&int)),
            float: builtin_class(heap, "float", Some(&object)),
            str: builtin_class(heap, "str", Some(&object)),
            bytes: builtin_class(heap, "bytes", Some(&object)),
            list: builtin_class(heap, "list", Some(&object)),
            tuple: builtin_class(heap, "tuple", Some(&object)),
            dict: builtin_class(heap, "dict", Some(&object)),
            set: builtin_class(heap, "set", Some(&object)),
            range: builtin_class(heap, "range", Some(&object)),
            function: builtin_class(heap, "function", Some(&object)),
            method: builtin_class(heap, "method", Some(&object)),
            builtin_function: builtin_class(heap, "builtin_function_or_method", Some(&object)),
            int,
            object,
            exceptions,
        }
    }

    pub fn exception(&self, kind: ExcKind) -> Value {
        self.exceptions[kind as usize].clone()
    }

    pub fn exceptions(&self) -> impl Iterator<Item = &Value> {
        self.exceptions.iter()
    }

    /// `type(value)`
    pub fn class_of(&self, value: &Value) -> Value {
        match value.data() {
            Data::None => self.none.clone(),
            Data::Bool(_) => self.bool.clone(),
            Data::Int(_) => self.int.clone(),
            Data::Float(_) => self.float.clone(),
            Data::Str(_) => self.str.clone(),
            Data::Bytes(_) => self.bytes.clone(),
            Data::List(_) => self.list.clone(),
            Data::Tuple(_) => self.tuple.clone(),
            Data::Dict(_) => self.dict.clone(),
            Data::Set(_) => self.set.clone(),
            Data::Range { .. } => self.range.clone(),
            Data::Function(_) => self.function.clone(),
            Data::Class(_) => self.type_.clone(),
            Data::Instance(instance) => instance.class.clone(),
            Data::BoundMethod { .. } => self.method.clone(),
            Data::Builtin(_) | Data::NativeMethod { .. } => self.builtin_function.clone(),
        }
    }
}

/// Iterate a class and its bases, most derived first
pub fn class_chain(class: &Value) -> impl Iterator<Item = Value> {
    std::iter::successors(Some(class.clone()), |current| {
        current.as_class().and_then(|c| c.base.clone())
    })
    .filter(|c| c.as_class().is_some())
}

pub fn is_subclass(class: &Value, base: &Value) -> bool {
    class_chain(class).any(|c| c.is(base))
}

/// Attribute defined on `class` or one of its bases
pub fn lookup_class_attr(class: &Value, name: &str) -> Option<Value> {
    class_chain(class).find_map(|c| {
        c.as_class()
            .and_then(|class| class.attrs.borrow().get(name).cloned())
    })
}

pub fn is_exception_class(class: &Value) -> bool {
    class_chain(class).any(|c| {
        c.as_class()
            .is_some_and(|c| c.module == "builtins" && c.name == "BaseException")
    })
}

/// Whether `class` derives from the builtin exception `kind`
pub fn is_builtin_exception(class: &Value, kind: ExcKind) -> bool {
    class_chain(class).any(|c| {
        c.as_class()
            .is_some_and(|c| c.module == "builtins" && c.name == kind.name())
    })
}

pub fn is_exception(value: &Value) -> bool {
    value
        .as_instance()
        .is_some_and(|instance| is_exception_class(&instance.class))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exception_hierarchy() {
        let mut heap = Heap::new();
        let types = BuiltinTypes::new(&mut heap);
        let key_error = types.exception(ExcKind::KeyError);
        assert!(is_subclass(&key_error, &types.exception(ExcKind::LookupError)));
        assert!(is_subclass(&key_error, &types.exception(ExcKind::Exception)));
        assert!(is_subclass(&key_error, &types.object));
        assert!(!is_subclass(&key_error, &types.exception(ExcKind::ValueError)));
        assert!(is_exception_class(&key_error));
        assert!(!is_exception_class(&types.int));
        assert!(is_builtin_exception(
            &types.exception(ExcKind::RecursionError),
            ExcKind::RuntimeError
        ));
    }

    #[test]
    fn test_bool_is_an_int() {
        let mut heap = Heap::new();
        let types = BuiltinTypes::new(&mut heap);
        let t = heap.bool(true);
        assert!(is_subclass(&types.class_of(&t), &types.int));
        assert!(!is_subclass(&types.int, &types.bool));
    }
}
