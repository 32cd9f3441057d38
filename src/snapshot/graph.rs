//! Heap snapshot engine
//!
//! [`MemoryGraph`] walks the object graph reachable from a set of roots and
//! records one [`GraphNode`] per distinct identity, in first-visit order.
//! Cycles and aliases resolve to the node that already exists. Output stays
//! finite through three bounds ([`Limits`]): nesting depth, children per node
//! and total nodes. A graph is built for exactly one snapshot and consumed by
//! [`MemoryGraph::snapshot`].

use super::introspect::{CollectionKind, Identity, Introspect, Shape};
use super::render::render;
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use serde::Serialize;

/// Traversal bounds for one snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Nodes at this depth (roots are depth 0) are not expanded
    pub max_depth: usize,
    /// Children encoded per mapping, collection or object
    pub max_items: usize,
    /// Total nodes per snapshot
    pub max_objects: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_depth: 4,
            max_items: 25,
            max_objects: 256,
        }
    }
}

/// Reference from inside the graph (or from a frame) to a value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ValueRef {
    /// Inline rendering, used for values that have no node
    Primitive { value: String },
    Reference {
        #[serde(rename = "objectId")]
        object_id: String,
        preview: String,
    },
}

impl ValueRef {
    pub fn object_id(&self) -> Option<&str> {
        match self {
            ValueRef::Reference { object_id, .. } => Some(object_id),
            ValueRef::Primitive { .. } => None,
        }
    }

    /// Text shown for the referenced value
    pub fn text(&self) -> &str {
        match self {
            ValueRef::Primitive { value } => value,
            ValueRef::Reference { preview, .. } => preview,
        }
    }
}

/// Mapping keys are encoded like values, except primitive keys are always inline
pub type KeyRef = ValueRef;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub key: KeyRef,
    pub value: ValueRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attribute {
    pub name: String,
    pub value: ValueRef,
}

/// One distinct-identity value in a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphNode {
    pub id: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(rename = "kind")]
    pub shape: Shape,
    #[serde(rename = "repr")]
    pub display: String,
    #[serde(rename = "value", skip_serializing_if = "Option::is_none")]
    pub scalar_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elements: Option<Vec<ValueRef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entries: Option<Vec<Entry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Vec<Attribute>>,
    #[serde(rename = "collectionType", skip_serializing_if = "Option::is_none")]
    pub collection_kind: Option<CollectionKind>,
    #[serde(skip_serializing_if = "is_false")]
    pub truncated: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl GraphNode {
    fn new(id: String, type_name: String, shape: Shape, display: String) -> Self {
        GraphNode {
            id,
            type_name,
            shape,
            display,
            scalar_value: None,
            elements: None,
            entries: None,
            attributes: None,
            collection_kind: shape.collection_kind(),
            truncated: false,
        }
    }
}

/// One user frame and its locals, as references into the node table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameView {
    pub function: String,
    pub line: usize,
    pub locals: IndexMap<String, ValueRef>,
}

/// Frames (outermost first) plus every node created while resolving them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct Snapshot {
    pub frames: Vec<FrameView>,
    pub objects: Vec<GraphNode>,
}

impl Snapshot {
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.objects.iter().find(|node| node.id == id)
    }
}

/// Per-snapshot traversal state
pub struct MemoryGraph<'h, H: Introspect> {
    host: &'h H,
    limits: Limits,
    repr_length: usize,
    seen: FxHashMap<Identity, usize>,
    nodes: Vec<GraphNode>,
}

impl<'h, H: Introspect> MemoryGraph<'h, H> {
    pub fn new(host: &'h H, limits: Limits, repr_length: usize) -> Self {
        MemoryGraph {
            host,
            limits,
            repr_length,
            seen: FxHashMap::default(),
            nodes: Vec::new(),
        }
    }

    /// Register `value` and return its node id, or `None` when the object
    /// budget is spent and the caller has to render the value inline.
    pub fn reference(&mut self, value: &H::Value, depth: usize) -> Option<String> {
        let identity = self.host.identity(value);
        if let Some(&index) = self.seen.get(&identity) {
            return Some(self.nodes[index].id.clone());
        }
        if self.nodes.len() >= self.limits.max_objects {
            return None;
        }

        let index = self.nodes.len();
        let id = format!("obj{}", index + 1);
        self.seen.insert(identity, index);

        let shape = self.host.classify(value);
        let display = self.render(value);
        self.nodes.push(GraphNode::new(
            id.clone(),
            self.host.type_name(value),
            shape,
            display,
        ));

        if depth >= self.limits.max_depth {
            let node = &mut self.nodes[index];
            node.truncated = true;
            if shape == Shape::Primitive {
                node.scalar_value = Some(node.display.clone());
            }
            return Some(id);
        }

        match shape {
            Shape::Primitive => {
                let node = &mut self.nodes[index];
                node.scalar_value = Some(node.display.clone());
            }
            Shape::Mapping => self.expand_mapping(index, value, depth),
            Shape::Collection(kind) => self.expand_collection(index, value, kind, depth),
            Shape::Object => self.expand_object(index, value, depth),
        }
        Some(id)
    }

    /// Reference to `value` as a root (depth 0)
    pub fn describe(&mut self, value: &H::Value) -> ValueRef {
        self.describe_ref(value, 0)
    }

    /// Number of nodes created so far
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Pair `frames` with the node table, in creation order
    pub fn snapshot(self, frames: Vec<FrameView>) -> Snapshot {
        Snapshot {
            frames,
            objects: self.nodes,
        }
    }

    fn render(&self, value: &H::Value) -> String {
        render(self.host, value, self.repr_length)
    }

    fn describe_ref(&mut self, value: &H::Value, depth: usize) -> ValueRef {
        match self.reference(value, depth) {
            Some(object_id) => ValueRef::Reference {
                object_id,
                preview: self.render(value),
            },
            None => ValueRef::Primitive {
                value: self.render(value),
            },
        }
    }

    fn describe_key(&mut self, key: &H::Value, depth: usize) -> KeyRef {
        if self.host.classify(key) == Shape::Primitive {
            return ValueRef::Primitive {
                value: self.render(key),
            };
        }
        self.describe_ref(key, depth)
    }

    fn expand_mapping(&mut self, index: usize, value: &H::Value, depth: usize) {
        let max_items = self.limits.max_items;
        let pairs = self.host.entries(value, max_items.saturating_add(1));
        let mut entries = Vec::with_capacity(pairs.len().min(max_items));
        let mut truncated = false;
        for (position, (key, val)) in pairs.iter().enumerate() {
            if position >= max_items {
                truncated = true;
                break;
            }
            let key = self.describe_key(key, depth + 1);
            let value = self.describe_ref(val, depth + 1);
            entries.push(Entry { key, value });
        }
        let node = &mut self.nodes[index];
        node.entries = Some(entries);
        node.truncated |= truncated;
    }

    fn expand_collection(
        &mut self,
        index: usize,
        value: &H::Value,
        kind: CollectionKind,
        depth: usize,
    ) {
        let max_items = self.limits.max_items;
        let items = if kind == CollectionKind::Set {
            // Canonical order: stable sort by rendered text, ties keep
            // host iteration order.
            let mut keyed: Vec<(String, H::Value)> = self
                .host
                .elements(value, usize::MAX)
                .into_iter()
                .map(|item| (render(self.host, &item, usize::MAX), item))
                .collect();
            keyed.sort_by(|a, b| a.0.cmp(&b.0));
            keyed.into_iter().map(|(_, item)| item).collect()
        } else {
            self.host.elements(value, max_items.saturating_add(1))
        };

        let mut elements = Vec::with_capacity(items.len().min(max_items));
        let mut truncated = false;
        for (position, item) in items.iter().enumerate() {
            if position >= max_items {
                truncated = true;
                break;
            }
            elements.push(self.describe_ref(item, depth + 1));
        }
        let node = &mut self.nodes[index];
        node.elements = Some(elements);
        node.truncated |= truncated;
    }

    fn expand_object(&mut self, index: usize, value: &H::Value, depth: usize) {
        let max_items = self.limits.max_items;
        let mut attributes = Vec::new();
        let mut truncated = false;
        let fields = self.host.fields(value);
        let visible = fields.iter().filter(|(name, _)| !name.starts_with("__"));
        for (position, (name, val)) in visible.enumerate() {
            if position >= max_items {
                truncated = true;
                break;
            }
            let value = self.describe_ref(val, depth + 1);
            attributes.push(Attribute {
                name: name.clone(),
                value,
            });
        }

        let node = &mut self.nodes[index];
        node.truncated |= truncated;
        if attributes.is_empty() {
            node.shape = Shape::Primitive;
            node.scalar_value = Some(node.display.clone());
        } else {
            node.attributes = Some(attributes);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::mock::MockHost;

    fn graph(host: &MockHost, limits: Limits) -> MemoryGraph<'_, MockHost> {
        MemoryGraph::new(host, limits, 120)
    }

    #[test]
    fn test_primitive_root_gets_scalar_value() {
        let host = MockHost::new();
        let x = host.int(1);
        let mut g = graph(&host, Limits::default());
        assert_eq!(g.reference(&x, 0).as_deref(), Some("obj1"));
        let snapshot = g.snapshot(Vec::new());
        let node = &snapshot.objects[0];
        assert_eq!(node.shape, Shape::Primitive);
        assert_eq!(node.type_name, "int");
        assert_eq!(node.scalar_value.as_deref(), Some("1"));
        assert!(!node.truncated);
    }

    #[test]
    fn test_aliased_elements_share_one_node() {
        let host = MockHost::new();
        let x = host.int(1);
        let y = host.list(vec![x.clone(), x.clone()]);
        let mut g = graph(&host, Limits::default());
        let x_id = g.reference(&x, 0);
        let y_id = g.reference(&y, 0);
        let snapshot = g.snapshot(Vec::new());

        assert_eq!(snapshot.objects.len(), 2);
        let list = snapshot.node(y_id.as_deref().unwrap()).unwrap();
        assert_eq!(list.shape, Shape::Collection(CollectionKind::List));
        let elements = list.elements.as_ref().unwrap();
        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0].object_id(), x_id.as_deref());
        assert_eq!(elements[1].object_id(), x_id.as_deref());
    }

    #[test]
    fn test_self_referencing_list_terminates() {
        let host = MockHost::new();
        let list = host.list(Vec::new());
        host.push(&list, list.clone());
        let mut g = graph(&host, Limits::default());
        let id = g.reference(&list, 0).unwrap();
        let snapshot = g.snapshot(Vec::new());

        assert_eq!(snapshot.objects.len(), 1);
        let elements = snapshot.objects[0].elements.as_ref().unwrap();
        assert_eq!(elements[0].object_id(), Some(id.as_str()));
        assert_eq!(snapshot.objects[0].display, "[[...]]");
    }

    #[test]
    fn test_cycle_through_intermediate_object() {
        let host = MockHost::new();
        let node = host.object("Node", Vec::new());
        let holder = host.list(vec![node.clone()]);
        host.set_field(&node, "owner", holder.clone());
        let mut g = graph(&host, Limits::default());
        g.reference(&node, 0);
        let snapshot = g.snapshot(Vec::new());

        assert_eq!(snapshot.objects.len(), 2);
        let holder_node = &snapshot.objects[1];
        let back = holder_node.elements.as_ref().unwrap()[0].object_id();
        assert_eq!(back, Some("obj1"));
    }

    #[test]
    fn test_max_items_truncates_list() {
        let host = MockHost::new();
        let items = (0..5).map(|n| host.int(n)).collect();
        let list = host.list(items);
        let limits = Limits {
            max_items: 2,
            ..Limits::default()
        };
        let mut g = graph(&host, limits);
        g.reference(&list, 0);
        let snapshot = g.snapshot(Vec::new());
        let node = &snapshot.objects[0];
        assert_eq!(node.elements.as_ref().unwrap().len(), 2);
        assert!(node.truncated);
        assert_eq!(snapshot.objects.len(), 3);
    }

    #[test]
    fn test_exactly_max_items_is_not_truncated() {
        let host = MockHost::new();
        let items = (0..2).map(|n| host.int(n)).collect();
        let list = host.list(items);
        let limits = Limits {
            max_items: 2,
            ..Limits::default()
        };
        let mut g = graph(&host, limits);
        g.reference(&list, 0);
        let snapshot = g.snapshot(Vec::new());
        assert!(!snapshot.objects[0].truncated);
    }

    #[test]
    fn test_max_depth_suppresses_nested_children() {
        let host = MockHost::new();
        let inner = host.list(vec![host.int(1), host.int(2)]);
        let outer = host.list(vec![inner.clone()]);
        let limits = Limits {
            max_depth: 1,
            ..Limits::default()
        };
        let mut g = graph(&host, limits);
        g.reference(&outer, 0);
        let snapshot = g.snapshot(Vec::new());

        assert_eq!(snapshot.objects.len(), 2);
        let outer_node = &snapshot.objects[0];
        assert!(!outer_node.truncated);
        let inner_node = &snapshot.objects[1];
        assert!(inner_node.truncated);
        assert!(inner_node.elements.is_none());
        assert_eq!(inner_node.shape, Shape::Collection(CollectionKind::List));
        assert_eq!(inner_node.collection_kind, Some(CollectionKind::List));
        assert_eq!(inner_node.scalar_value, None);
    }

    #[test]
    fn test_depth_truncated_primitive_keeps_scalar() {
        let host = MockHost::new();
        let n = host.int(7);
        let limits = Limits {
            max_depth: 0,
            ..Limits::default()
        };
        let mut g = graph(&host, limits);
        g.reference(&n, 0);
        let snapshot = g.snapshot(Vec::new());
        assert!(snapshot.objects[0].truncated);
        assert_eq!(snapshot.objects[0].scalar_value.as_deref(), Some("7"));
    }

    #[test]
    fn test_max_objects_falls_back_inline() {
        let host = MockHost::new();
        let a = host.list(vec![host.str("x")]);
        let b = host.list(Vec::new());
        let limits = Limits {
            max_objects: 1,
            ..Limits::default()
        };
        let mut g = graph(&host, limits);
        let a_ref = g.describe(&a);
        let b_ref = g.describe(&b);
        let snapshot = g.snapshot(Vec::new());

        assert_eq!(snapshot.objects.len(), 1);
        assert_eq!(a_ref.object_id(), Some("obj1"));
        assert_eq!(
            b_ref,
            ValueRef::Primitive {
                value: "[]".to_string()
            }
        );
        let inner = &snapshot.objects[0].elements.as_ref().unwrap()[0];
        assert_eq!(
            inner,
            &ValueRef::Primitive {
                value: "'x'".to_string()
            }
        );
    }

    #[test]
    fn test_set_elements_sorted_by_rendered_text() {
        let host = MockHost::new();
        let set = host.set(vec![host.int(3), host.int(1), host.int(2)]);
        let mut g = graph(&host, Limits::default());
        g.reference(&set, 0);
        let snapshot = g.snapshot(Vec::new());
        let texts: Vec<&str> = snapshot.objects[0]
            .elements
            .as_ref()
            .unwrap()
            .iter()
            .map(ValueRef::text)
            .collect();
        assert_eq!(texts, ["1", "2", "3"]);
        assert_eq!(
            snapshot.objects[0].collection_kind,
            Some(CollectionKind::Set)
        );
    }

    #[test]
    fn test_set_sorted_before_cutoff() {
        let host = MockHost::new();
        let set = host.set(vec![host.int(9), host.int(4), host.int(1)]);
        let limits = Limits {
            max_items: 1,
            ..Limits::default()
        };
        let mut g = graph(&host, limits);
        g.reference(&set, 0);
        let snapshot = g.snapshot(Vec::new());
        let node = &snapshot.objects[0];
        assert_eq!(node.elements.as_ref().unwrap()[0].text(), "1");
        assert!(node.truncated);
    }

    #[test]
    fn test_mapping_keys_inline_when_primitive() {
        let host = MockHost::new();
        let tuple_key = host.tuple(vec![host.int(1)]);
        let dict = host.dict(vec![
            (host.str("a"), host.int(1)),
            (tuple_key, host.int(2)),
        ]);
        let mut g = graph(&host, Limits::default());
        g.reference(&dict, 0);
        let snapshot = g.snapshot(Vec::new());
        let entries = snapshot.objects[0].entries.as_ref().unwrap();
        assert_eq!(
            entries[0].key,
            ValueRef::Primitive {
                value: "'a'".to_string()
            }
        );
        assert!(entries[0].value.object_id().is_some());
        assert!(entries[1].key.object_id().is_some());
        assert_eq!(entries[1].key.text(), "(1,)");
    }

    #[test]
    fn test_dunder_attributes_skipped_and_empty_object_demoted() {
        let host = MockHost::new();
        let hidden = host.object("Hidden", vec![("__secret".to_string(), host.int(1))]);
        let shown = host.object(
            "Shown",
            vec![
                ("__secret".to_string(), host.int(1)),
                ("x".to_string(), host.int(2)),
            ],
        );
        let mut g = graph(&host, Limits::default());
        g.reference(&hidden, 0);
        g.reference(&shown, 0);
        let snapshot = g.snapshot(Vec::new());

        let hidden_node = &snapshot.objects[0];
        assert_eq!(hidden_node.shape, Shape::Primitive);
        assert_eq!(hidden_node.scalar_value.as_deref(), Some(hidden_node.display.as_str()));
        assert!(hidden_node.attributes.is_none());

        let shown_node = snapshot.node("obj2").unwrap();
        assert_eq!(shown_node.shape, Shape::Object);
        let attributes = shown_node.attributes.as_ref().unwrap();
        assert_eq!(attributes.len(), 1);
        assert_eq!(attributes[0].name, "x");
    }

    #[test]
    fn test_class_objects_are_primitive() {
        let host = MockHost::new();
        let class = host.class("Point");
        let mut g = graph(&host, Limits::default());
        g.reference(&class, 0);
        let snapshot = g.snapshot(Vec::new());
        assert_eq!(snapshot.objects[0].shape, Shape::Primitive);
        assert_eq!(snapshot.objects[0].display, "<class 'Point'>");
    }

    #[test]
    fn test_wire_shape_omits_inapplicable_fields() {
        let host = MockHost::new();
        let list = host.list(vec![host.int(1)]);
        let mut g = graph(&host, Limits::default());
        g.reference(&list, 0);
        let snapshot = g.snapshot(Vec::new());
        let json = serde_json::to_value(&snapshot.objects[0]).unwrap();
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            ["id", "type", "kind", "repr", "elements", "collectionType"]
        );
        assert_eq!(json["kind"], "collection");
        assert_eq!(json["collectionType"], "list");
        assert_eq!(json["elements"][0]["type"], "reference");
        assert_eq!(json["elements"][0]["objectId"], "obj2");
        assert_eq!(json["elements"][0]["preview"], "1");
    }

    #[test]
    fn test_serialization_is_idempotent() {
        let host = MockHost::new();
        let list = host.list(vec![host.int(1), host.str("two")]);
        let mut g = graph(&host, Limits::default());
        g.reference(&list, 0);
        let snapshot = g.snapshot(Vec::new());
        let first = serde_json::to_string(&snapshot).unwrap();
        let second = serde_json::to_string(&snapshot).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_equivalent_inputs_build_equal_snapshots() {
        let build = || {
            let host = MockHost::new();
            let inner = host.dict(vec![(host.str("k"), host.int(5))]);
            let root = host.list(vec![inner.clone(), inner, host.set(vec![host.int(2), host.int(1)])]);
            let mut g = graph(&host, Limits::default());
            g.reference(&root, 0);
            serde_json::to_string(&g.snapshot(Vec::new())).unwrap()
        };
        assert_eq!(build(), build());
    }
}
