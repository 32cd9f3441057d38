//! Introspection boundary between the snapshot engine and a host runtime
//!
//! The engine, the frame view builder and the tracer only ever talk to the
//! running program through [`Introspect`]. The interpreter implements it for
//! its own values and frames; unit tests implement it for a tiny mock host.

use serde::{Serialize, Serializer};
use std::fmt;

/// Stable per-object surrogate key. Two values are the same object exactly
/// when their identities are equal; structural equality never enters into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity(pub u64);

/// Identifies the source unit a frame's code came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    List,
    Tuple,
    Set,
}

impl CollectionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CollectionKind::List => "list",
            CollectionKind::Tuple => "tuple",
            CollectionKind::Set => "set",
        }
    }
}

/// Structural category of a value, deciding how the graph walker expands it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Primitive,
    Mapping,
    Collection(CollectionKind),
    Object,
}

impl Shape {
    /// Wire name of the shape (`kind` field of a graph node)
    pub fn as_str(self) -> &'static str {
        match self {
            Shape::Primitive => "primitive",
            Shape::Mapping => "mapping",
            Shape::Collection(_) => "collection",
            Shape::Object => "object",
        }
    }

    pub fn collection_kind(self) -> Option<CollectionKind> {
        match self {
            Shape::Collection(kind) => Some(kind),
            _ => None,
        }
    }
}

impl Serialize for Shape {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A value's natural representation could not be produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReprError {
    pub message: String,
}

impl ReprError {
    pub fn new(message: impl Into<String>) -> Self {
        ReprError {
            message: message.into(),
        }
    }
}

impl fmt::Display for ReprError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "repr failed: {}", self.message)
    }
}

impl std::error::Error for ReprError {}

/// Read-only view of a running program.
///
/// None of these methods may run hosted code or produce trace events.
pub trait Introspect {
    type Value: Clone;
    type Frame: Copy;

    fn identity(&self, value: &Self::Value) -> Identity;

    /// Display name of the value's runtime type
    fn type_name(&self, value: &Self::Value) -> String;

    /// Natural textual representation, untruncated
    fn repr(&self, value: &Self::Value) -> Result<String, ReprError>;

    fn classify(&self, value: &Self::Value) -> Shape;

    /// Up to `limit` key/value pairs of a mapping, in iteration order
    fn entries(&self, value: &Self::Value, limit: usize) -> Vec<(Self::Value, Self::Value)>;

    /// Up to `limit` elements of a collection, in iteration order
    fn elements(&self, value: &Self::Value, limit: usize) -> Vec<Self::Value>;

    /// Own fields of an object, in definition order, unfiltered
    fn fields(&self, value: &Self::Value) -> Vec<(String, Self::Value)>;

    /// The frame that called `frame`, if any
    fn caller(&self, frame: Self::Frame) -> Option<Self::Frame>;

    fn source_id(&self, frame: Self::Frame) -> SourceId;

    fn function_name(&self, frame: Self::Frame) -> String;

    /// Line currently executing in `frame`
    fn line(&self, frame: Self::Frame) -> usize;

    /// Local bindings of `frame`, in binding order, unfiltered
    fn locals(&self, frame: Self::Frame) -> Vec<(String, Self::Value)>;
}
