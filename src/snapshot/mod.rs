//! Heap snapshots
//!
//! A snapshot is a bounded, deduplicated rendering of every object reachable
//! from the locals of the user's live frames, taken at one instant:
//!
//! - [`introspect`]: the read-only host interface everything here depends on
//! - [`render`]: short display strings for single values
//! - [`graph`]: the identity-deduplicating graph walker
//! - [`frames`]: user-frame filtering, stack trails and snapshot assembly
//!
//! Nothing in this module runs hosted code.

pub mod frames;
pub mod graph;
pub mod introspect;
pub mod render;

#[cfg(test)]
pub(crate) mod mock;

pub use frames::{build_frames, build_snapshot, build_stack, StackEntry};
pub use graph::{FrameView, GraphNode, Limits, MemoryGraph, Snapshot, ValueRef};
pub use introspect::{CollectionKind, Identity, Introspect, ReprError, Shape, SourceId};
pub use render::render;
