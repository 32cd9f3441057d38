//! Minimal host used by the engine, frame and tracer unit tests

use super::introspect::{CollectionKind, Identity, Introspect, ReprError, Shape, SourceId};
use crate::trace::{StepEvent, TraceHost, TraceSink};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

pub enum MockData {
    Int(i64),
    Str(String),
    List(Vec<MockValue>),
    Tuple(Vec<MockValue>),
    Set(Vec<MockValue>),
    Dict(Vec<(MockValue, MockValue)>),
    Object {
        class: String,
        fields: Vec<(String, MockValue)>,
    },
    Class(String),
    /// A value whose representation always fails
    Broken,
}

pub struct MockObject {
    id: u64,
    data: RefCell<MockData>,
}

#[derive(Clone)]
pub struct MockValue(Rc<MockObject>);

pub struct MockFrame {
    pub function: String,
    pub source: SourceId,
    pub line: usize,
    pub locals: Vec<(String, MockValue)>,
}

/// Frames are stored outermost first; a frame handle is its index.
pub struct MockHost {
    next_id: Cell<u64>,
    pub frames: RefCell<Vec<MockFrame>>,
    pub stdout: RefCell<String>,
    sink: Option<Rc<RefCell<dyn TraceSink<MockHost>>>>,
}

impl MockHost {
    pub fn new() -> Self {
        MockHost {
            next_id: Cell::new(1),
            frames: RefCell::new(Vec::new()),
            stdout: RefCell::new(String::new()),
            sink: None,
        }
    }

    fn alloc(&self, data: MockData) -> MockValue {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        MockValue(Rc::new(MockObject {
            id,
            data: RefCell::new(data),
        }))
    }

    pub fn int(&self, n: i64) -> MockValue {
        self.alloc(MockData::Int(n))
    }

    pub fn str(&self, s: &str) -> MockValue {
        self.alloc(MockData::Str(s.to_string()))
    }

    pub fn list(&self, items: Vec<MockValue>) -> MockValue {
        self.alloc(MockData::List(items))
    }

    pub fn tuple(&self, items: Vec<MockValue>) -> MockValue {
        self.alloc(MockData::Tuple(items))
    }

    pub fn set(&self, items: Vec<MockValue>) -> MockValue {
        self.alloc(MockData::Set(items))
    }

    pub fn dict(&self, pairs: Vec<(MockValue, MockValue)>) -> MockValue {
        self.alloc(MockData::Dict(pairs))
    }

    pub fn object(&self, class: &str, fields: Vec<(String, MockValue)>) -> MockValue {
        self.alloc(MockData::Object {
            class: class.to_string(),
            fields,
        })
    }

    pub fn class(&self, name: &str) -> MockValue {
        self.alloc(MockData::Class(name.to_string()))
    }

    pub fn broken(&self) -> MockValue {
        self.alloc(MockData::Broken)
    }

    pub fn push(&self, list: &MockValue, item: MockValue) {
        if let MockData::List(items) = &mut *list.0.data.borrow_mut() {
            items.push(item);
        }
    }

    pub fn set_field(&self, object: &MockValue, name: &str, value: MockValue) {
        if let MockData::Object { fields, .. } = &mut *object.0.data.borrow_mut() {
            fields.push((name.to_string(), value));
        }
    }

    /// Push a frame and return its handle
    pub fn enter(&self, function: &str, source: SourceId, line: usize) -> usize {
        let mut frames = self.frames.borrow_mut();
        frames.push(MockFrame {
            function: function.to_string(),
            source,
            line,
            locals: Vec::new(),
        });
        frames.len() - 1
    }

    pub fn bind(&self, frame: usize, name: &str, value: MockValue) {
        self.frames.borrow_mut()[frame]
            .locals
            .push((name.to_string(), value));
    }

    /// Deliver an event to the attached sink, the way a host would
    pub fn emit(&self, frame: usize, event: StepEvent<MockValue>) {
        if let Some(sink) = self.sink.clone() {
            if let Ok(mut sink) = sink.try_borrow_mut() {
                sink.on_event(self, frame, event);
            }
        }
    }

    fn repr_inner(&self, value: &MockValue, active: &mut Vec<u64>) -> Result<String, ReprError> {
        if active.contains(&value.0.id) {
            return Ok(match &*value.0.data.borrow() {
                MockData::Dict(_) => "{...}".to_string(),
                _ => "[...]".to_string(),
            });
        }
        active.push(value.0.id);
        let data = value.0.data.borrow();
        let join = |host: &MockHost, items: &[MockValue], active: &mut Vec<u64>| {
            items
                .iter()
                .map(|item| host.repr_inner(item, active))
                .collect::<Result<Vec<_>, _>>()
                .map(|parts| parts.join(", "))
        };
        let text = match &*data {
            MockData::Int(n) => n.to_string(),
            MockData::Str(s) => format!("'{}'", s),
            MockData::List(items) => format!("[{}]", join(self, items, active)?),
            MockData::Tuple(items) if items.len() == 1 => {
                format!("({},)", join(self, items, active)?)
            }
            MockData::Tuple(items) => format!("({})", join(self, items, active)?),
            MockData::Set(items) => format!("{{{}}}", join(self, items, active)?),
            MockData::Dict(pairs) => {
                let mut parts = Vec::new();
                for (k, v) in pairs {
                    parts.push(format!(
                        "{}: {}",
                        self.repr_inner(k, active)?,
                        self.repr_inner(v, active)?
                    ));
                }
                format!("{{{}}}", parts.join(", "))
            }
            MockData::Object { class, .. } => format!("<{} object>", class),
            MockData::Class(name) => format!("<class '{}'>", name),
            MockData::Broken => return Err(ReprError::new("broken")),
        };
        active.pop();
        Ok(text)
    }
}

impl Introspect for MockHost {
    type Value = MockValue;
    type Frame = usize;

    fn identity(&self, value: &MockValue) -> Identity {
        Identity(value.0.id)
    }

    fn type_name(&self, value: &MockValue) -> String {
        match &*value.0.data.borrow() {
            MockData::Int(_) => "int".to_string(),
            MockData::Str(_) => "str".to_string(),
            MockData::List(_) => "list".to_string(),
            MockData::Tuple(_) => "tuple".to_string(),
            MockData::Set(_) => "set".to_string(),
            MockData::Dict(_) => "dict".to_string(),
            MockData::Object { class, .. } => class.clone(),
            MockData::Class(_) => "type".to_string(),
            MockData::Broken => "Broken".to_string(),
        }
    }

    fn repr(&self, value: &MockValue) -> Result<String, ReprError> {
        self.repr_inner(value, &mut Vec::new())
    }

    fn classify(&self, value: &MockValue) -> Shape {
        match &*value.0.data.borrow() {
            MockData::List(_) => Shape::Collection(CollectionKind::List),
            MockData::Tuple(_) => Shape::Collection(CollectionKind::Tuple),
            MockData::Set(_) => Shape::Collection(CollectionKind::Set),
            MockData::Dict(_) => Shape::Mapping,
            MockData::Object { .. } => Shape::Object,
            _ => Shape::Primitive,
        }
    }

    fn entries(&self, value: &MockValue, limit: usize) -> Vec<(MockValue, MockValue)> {
        match &*value.0.data.borrow() {
            MockData::Dict(pairs) => pairs.iter().take(limit).cloned().collect(),
            _ => Vec::new(),
        }
    }

    fn elements(&self, value: &MockValue, limit: usize) -> Vec<MockValue> {
        match &*value.0.data.borrow() {
            MockData::List(items) | MockData::Tuple(items) | MockData::Set(items) => {
                items.iter().take(limit).cloned().collect()
            }
            _ => Vec::new(),
        }
    }

    fn fields(&self, value: &MockValue) -> Vec<(String, MockValue)> {
        match &*value.0.data.borrow() {
            MockData::Object { fields, .. } => fields.clone(),
            _ => Vec::new(),
        }
    }

    fn caller(&self, frame: usize) -> Option<usize> {
        frame.checked_sub(1)
    }

    fn source_id(&self, frame: usize) -> SourceId {
        self.frames.borrow()[frame].source
    }

    fn function_name(&self, frame: usize) -> String {
        self.frames.borrow()[frame].function.clone()
    }

    fn line(&self, frame: usize) -> usize {
        self.frames.borrow()[frame].line
    }

    fn locals(&self, frame: usize) -> Vec<(String, MockValue)> {
        self.frames.borrow()[frame].locals.clone()
    }
}

impl TraceHost for MockHost {
    fn attach_sink(&mut self, sink: Rc<RefCell<dyn TraceSink<Self>>>) {
        self.sink = Some(sink);
    }

    fn detach_sink(&mut self) {
        self.sink = None;
    }

    fn captured_stdout(&self) -> String {
        self.stdout.borrow().clone()
    }
}
