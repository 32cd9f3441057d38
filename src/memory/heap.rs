//! Object allocator
//!
//! Hands out monotonically increasing virtual addresses, starting at
//! [`HEAP_ADDRESS_START`] and advancing by [`OBJECT_ALIGNMENT`], so every
//! object has a stable identity for the lifetime of a run. Memory itself is
//! reclaimed by reference counting; addresses are never reused.
//!
//! `None`, `True`, `False` and the small integers are preallocated and shared,
//! mirroring the usual interning behaviour so aliasing shows up in snapshots
//! the way users expect.

use super::value::{Address, Data, Value};
use crate::interpreter::constants::{
    HEAP_ADDRESS_START, OBJECT_ALIGNMENT, SMALL_INT_MAX, SMALL_INT_MIN,
};
use std::cell::RefCell;

pub struct Heap {
    next_address: Address,
    allocations: usize,
    none: Value,
    true_value: Value,
    false_value: Value,
    small_ints: Vec<Value>,
}

impl Heap {
    pub fn new() -> Self {
        let mut heap = Heap {
            next_address: HEAP_ADDRESS_START,
            allocations: 0,
            none: Value::new(0, Data::None),
            true_value: Value::new(0, Data::None),
            false_value: Value::new(0, Data::None),
            small_ints: Vec::new(),
        };
        heap.none = heap.alloc(Data::None);
        heap.true_value = heap.alloc(Data::Bool(true));
        heap.false_value = heap.alloc(Data::Bool(false));
        heap.small_ints = (SMALL_INT_MIN..=SMALL_INT_MAX)
            .map(|n| heap.alloc(Data::Int(n)))
            .collect();
        heap
    }

    /// Allocate a new object at the next free address
    pub fn alloc(&mut self, data: Data) -> Value {
        let address = self.next_address;
        self.next_address += OBJECT_ALIGNMENT;
        self.allocations += 1;
        Value::new(address, data)
    }

    /// Total number of objects allocated so far
    pub fn allocations(&self) -> usize {
        self.allocations
    }

    pub fn none(&self) -> Value {
        self.none.clone()
    }

    pub fn bool(&self, b: bool) -> Value {
        if b {
            self.true_value.clone()
        } else {
            self.false_value.clone()
        }
    }

    pub fn int(&mut self, n: i64) -> Value {
        if (SMALL_INT_MIN..=SMALL_INT_MAX).contains(&n) {
            return self.small_ints[(n - SMALL_INT_MIN) as usize].clone();
        }
        self.alloc(Data::Int(n))
    }

    pub fn float(&mut self, f: f64) -> Value {
        self.alloc(Data::Float(f))
    }

    pub fn str(&mut self, s: impl Into<String>) -> Value {
        self.alloc(Data::Str(s.into()))
    }

    pub fn list(&mut self, items: Vec<Value>) -> Value {
        self.alloc(Data::List(RefCell::new(items)))
    }

    pub fn tuple(&mut self, items: Vec<Value>) -> Value {
        self.alloc(Data::Tuple(items))
    }
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addresses_are_unique_and_aligned() {
        let mut heap = Heap::new();
        let a = heap.str("a");
        let b = heap.str("a");
        assert_ne!(a.address(), b.address());
        assert_eq!(b.address() - a.address(), OBJECT_ALIGNMENT);
        assert!(a.address() >= HEAP_ADDRESS_START);
    }

    #[test]
    fn test_singletons_and_small_ints_are_shared() {
        let mut heap = Heap::new();
        assert!(heap.none().is(&heap.none()));
        assert!(heap.bool(true).is(&heap.bool(true)));
        assert!(!heap.bool(true).is(&heap.bool(false)));
        assert!(heap.int(7).is(&heap.int(7)));
        assert!(!heap.int(100_000).is(&heap.int(100_000)));
    }
}
