//! Frame view builder
//!
//! Walks the live call chain innermost first, keeps only frames whose code
//! comes from the user's source unit and returns them outermost first.
//! Library frames are dropped entirely, even between two user frames.

use super::graph::{FrameView, Limits, MemoryGraph, Snapshot};
use super::introspect::{Introspect, SourceId};
use serde::Serialize;

/// Default cap on frames walked for the per-event stack trail
pub const DEFAULT_MAX_STACK_FRAMES: usize = 32;

/// One entry of the lightweight stack trail
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StackEntry {
    pub function: String,
    pub line: usize,
}

/// User frames of the chain ending at `current`, outermost first, with locals
/// resolved through `graph` so aliasing across frames is preserved.
pub fn build_frames<H: Introspect>(
    host: &H,
    graph: &mut MemoryGraph<'_, H>,
    current: H::Frame,
    user_source: SourceId,
) -> Vec<FrameView> {
    let mut frames = Vec::new();
    let mut cursor = Some(current);
    while let Some(frame) = cursor {
        if host.source_id(frame) == user_source {
            let locals = host
                .locals(frame)
                .into_iter()
                .filter(|(name, _)| !name.starts_with("__"))
                .map(|(name, value)| {
                    let reference = graph.describe(&value);
                    (name, reference)
                })
                .collect();
            frames.push(FrameView {
                function: host.function_name(frame),
                line: host.line(frame),
                locals,
            });
        }
        cursor = host.caller(frame);
    }
    frames.reverse();
    frames
}

/// Stack trail of user frames, outermost first. At most `max_frames` frames
/// of the whole chain are examined.
pub fn build_stack<H: Introspect>(
    host: &H,
    current: H::Frame,
    user_source: SourceId,
    max_frames: usize,
) -> Vec<StackEntry> {
    let mut stack = Vec::new();
    let mut cursor = Some(current);
    let mut walked = 0;
    while let Some(frame) = cursor {
        if walked >= max_frames {
            break;
        }
        if host.source_id(frame) == user_source {
            stack.push(StackEntry {
                function: host.function_name(frame),
                line: host.line(frame),
            });
        }
        cursor = host.caller(frame);
        walked += 1;
    }
    stack.reverse();
    stack
}

/// Full heap snapshot rooted at the locals of every user frame
pub fn build_snapshot<H: Introspect>(
    host: &H,
    current: H::Frame,
    user_source: SourceId,
    limits: Limits,
    repr_length: usize,
) -> Snapshot {
    let mut graph = MemoryGraph::new(host, limits, repr_length);
    let frames = build_frames(host, &mut graph, current, user_source);
    graph.snapshot(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::mock::MockHost;

    const USER: SourceId = SourceId(1);
    const LIBRARY: SourceId = SourceId(2);

    #[test]
    fn test_library_frames_between_user_frames_are_elided() {
        let host = MockHost::new();
        let module = host.enter("<module>", USER, 10);
        let _lib = host.enter("map", LIBRARY, 3);
        let inner = host.enter("square", USER, 2);
        let _ = module;

        let stack = build_stack(&host, inner, USER, DEFAULT_MAX_STACK_FRAMES);
        let names: Vec<&str> = stack.iter().map(|e| e.function.as_str()).collect();
        assert_eq!(names, ["<module>", "square"]);
        assert_eq!(stack[0].line, 10);

        let snapshot = build_snapshot(&host, inner, USER, Limits::default(), 120);
        let names: Vec<&str> = snapshot.frames.iter().map(|f| f.function.as_str()).collect();
        assert_eq!(names, ["<module>", "square"]);
    }

    #[test]
    fn test_aliasing_across_frames_shares_object_id() {
        let host = MockHost::new();
        let shared = host.list(vec![host.int(1)]);
        let outer = host.enter("<module>", USER, 4);
        host.bind(outer, "data", shared.clone());
        let inner = host.enter("f", USER, 1);
        host.bind(inner, "items", shared);

        let snapshot = build_snapshot(&host, inner, USER, Limits::default(), 120);
        let outer_ref = &snapshot.frames[0].locals["data"];
        let inner_ref = &snapshot.frames[1].locals["items"];
        assert!(outer_ref.object_id().is_some());
        assert_eq!(outer_ref.object_id(), inner_ref.object_id());
    }

    #[test]
    fn test_dunder_locals_are_skipped() {
        let host = MockHost::new();
        let frame = host.enter("<module>", USER, 1);
        host.bind(frame, "__name__", host.str("__main__"));
        host.bind(frame, "x", host.int(1));

        let snapshot = build_snapshot(&host, frame, USER, Limits::default(), 120);
        let keys: Vec<&str> = snapshot.frames[0].locals.keys().map(String::as_str).collect();
        assert_eq!(keys, ["x"]);
        assert_eq!(snapshot.objects.len(), 1);
    }

    #[test]
    fn test_stack_walk_is_capped() {
        let host = MockHost::new();
        let mut top = 0;
        for depth in 0..40 {
            top = host.enter("f", USER, depth + 1);
        }
        let stack = build_stack(&host, top, USER, DEFAULT_MAX_STACK_FRAMES);
        assert_eq!(stack.len(), 32);
        // Innermost frames survive the cap
        assert_eq!(stack.last().map(|e| e.line), Some(40));
        assert_eq!(stack[0].line, 9);
    }
}
