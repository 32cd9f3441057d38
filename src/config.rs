//! Run configuration

use crate::snapshot::frames::DEFAULT_MAX_STACK_FRAMES;
use crate::snapshot::graph::Limits;
use crate::snapshot::render::DEFAULT_REPR_LENGTH;

/// Bounds applied while tracing a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceConfig {
    /// Heap snapshot bounds
    pub limits: Limits,
    /// Maximum rendered length of a single value
    pub repr_length: usize,
    /// Frames walked for each event's stack trail
    pub max_stack_frames: usize,
}

impl Default for TraceConfig {
    fn default() -> Self {
        TraceConfig {
            limits: Limits::default(),
            repr_length: DEFAULT_REPR_LENGTH,
            max_stack_frames: DEFAULT_MAX_STACK_FRAMES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TraceConfig::default();
        assert_eq!(config.limits.max_depth, 4);
        assert_eq!(config.limits.max_items, 25);
        assert_eq!(config.limits.max_objects, 256);
        assert_eq!(config.repr_length, 120);
        assert_eq!(config.max_stack_frames, 32);
    }
}
