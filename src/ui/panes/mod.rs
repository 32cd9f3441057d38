//! TUI pane rendering modules
//!
//! Every pane renders one aspect of the [`TraceEvent`] under the cursor.
//!
//! # Pane Modules
//!
//! - [`source`]: program source with the current line highlighted
//! - [`stack`]: user frames (outermost first) and their locals
//! - [`heap`]: the snapshot's object table
//! - [`terminal`]: output printed up to the current step
//! - [`status`]: step counter, event kind and keybindings
//! - `utils`: shared block, scroll and value helpers
//!
//! Each pane module exports a `render_*` function plus the scroll state it
//! keeps between frames.
//!
//! [`TraceEvent`]: crate::trace::TraceEvent

mod utils;

pub mod heap;
pub mod source;
pub mod stack;
pub mod status;
pub mod terminal;

pub use heap::{render_heap_pane, HeapScrollState};
pub use source::{render_source_pane, SourceScrollState};
pub use stack::{render_stack_pane, StackScrollState};
pub use status::{render_status_bar, StatusRenderData};
pub use terminal::render_terminal_pane;
