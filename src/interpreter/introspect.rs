//! The interpreter as a traceable host
//!
//! Frame handles are indices into the call stack, outermost first.

use crate::interpreter::engine::Interpreter;
use crate::interpreter::repr::repr_value;
use crate::memory::value::{Data, Value};
use crate::snapshot::introspect::{CollectionKind, Identity, Introspect, ReprError, Shape, SourceId};
use crate::trace::{TraceHost, TraceSink};
use std::cell::RefCell;
use std::rc::Rc;

impl Introspect for Interpreter {
    type Value = Value;
    type Frame = usize;

    fn identity(&self, value: &Value) -> Identity {
        Identity(value.address())
    }

    fn type_name(&self, value: &Value) -> String {
        value.type_name()
    }

    fn repr(&self, value: &Value) -> Result<String, ReprError> {
        repr_value(value)
    }

    fn classify(&self, value: &Value) -> Shape {
        match value.data() {
            Data::Dict(_) => Shape::Mapping,
            Data::List(_) => Shape::Collection(CollectionKind::List),
            Data::Tuple(_) => Shape::Collection(CollectionKind::Tuple),
            Data::Set(_) => Shape::Collection(CollectionKind::Set),
            Data::Instance(_) | Data::Function(_) => Shape::Object,
            _ => Shape::Primitive,
        }
    }

    fn entries(&self, value: &Value, limit: usize) -> Vec<(Value, Value)> {
        match value.data() {
            Data::Dict(entries) => entries.borrow().values().take(limit).cloned().collect(),
            _ => Vec::new(),
        }
    }

    fn elements(&self, value: &Value, limit: usize) -> Vec<Value> {
        match value.data() {
            Data::List(items) => items.borrow().iter().take(limit).cloned().collect(),
            Data::Tuple(items) => items.iter().take(limit).cloned().collect(),
            Data::Set(entries) => entries.borrow().values().take(limit).cloned().collect(),
            _ => Vec::new(),
        }
    }

    fn fields(&self, value: &Value) -> Vec<(String, Value)> {
        match value.data() {
            Data::Instance(instance) => instance
                .attrs
                .borrow()
                .iter()
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
            _ => Vec::new(),
        }
    }

    fn caller(&self, frame: usize) -> Option<usize> {
        frame.checked_sub(1)
    }

    fn source_id(&self, frame: usize) -> SourceId {
        self.stack
            .get(frame)
            .map_or(SourceId(u32::MAX), |frame| frame.source_id)
    }

    fn function_name(&self, frame: usize) -> String {
        self.stack
            .get(frame)
            .map(|frame| frame.function_name.clone())
            .unwrap_or_default()
    }

    fn line(&self, frame: usize) -> usize {
        self.stack.get(frame).map_or(0, |frame| frame.line)
    }

    fn locals(&self, frame: usize) -> Vec<(String, Value)> {
        let Some(frame) = self.stack.get(frame) else {
            return Vec::new();
        };
        let mut locals: Vec<(String, Value)> = frame
            .locals
            .borrow()
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        // Comprehension variables shadow the frame's own bindings while live
        for scope in &frame.comprehensions {
            for (name, value) in scope.borrow().iter() {
                match locals.iter_mut().find(|(existing, _)| existing == name) {
                    Some(slot) => slot.1 = value.clone(),
                    None => locals.push((name.clone(), value.clone())),
                }
            }
        }
        locals
    }
}

impl TraceHost for Interpreter {
    fn attach_sink(&mut self, sink: Rc<RefCell<dyn TraceSink<Self>>>) {
        self.set_sink(Some(sink));
    }

    fn detach_sink(&mut self) {
        self.set_sink(None);
    }

    fn captured_stdout(&self) -> String {
        self.console.stdout().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::value::{new_scope, Instance};

    #[test]
    fn test_classify_builtin_values() {
        let mut interp = Interpreter::new();
        let n = interp.heap.int(3);
        let list = interp.heap.list(vec![n.clone()]);
        let range = interp.heap.alloc(Data::Range {
            start: 0,
            stop: 3,
            step: 1,
        });
        let class = interp.types.int.clone();
        assert_eq!(interp.classify(&n), Shape::Primitive);
        assert_eq!(interp.classify(&list), Shape::Collection(CollectionKind::List));
        assert_eq!(interp.classify(&range), Shape::Primitive);
        assert_eq!(interp.classify(&class), Shape::Primitive);
    }

    #[test]
    fn test_instance_fields_in_definition_order() {
        let mut interp = Interpreter::new();
        let attrs = new_scope();
        let one = interp.heap.int(1);
        let two = interp.heap.int(2);
        attrs.borrow_mut().insert("b".to_string(), one);
        attrs.borrow_mut().insert("a".to_string(), two);
        let instance = interp.heap.alloc(Data::Instance(Instance {
            class: interp.types.object.clone(),
            attrs,
            args: Vec::new(),
        }));
        assert_eq!(interp.classify(&instance), Shape::Object);
        let names: Vec<String> = interp.fields(&instance).into_iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["b", "a"]);
    }

    #[test]
    fn test_elements_respect_limit() {
        let mut interp = Interpreter::new();
        let items: Vec<Value> = (0..10).map(|n| interp.heap.int(n)).collect();
        let tuple = interp.heap.tuple(items);
        assert_eq!(interp.elements(&tuple, 4).len(), 4);
        assert!(interp.entries(&tuple, 4).is_empty());
    }
}
