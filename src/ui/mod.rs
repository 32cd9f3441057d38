//! Terminal replay viewer built on [ratatui](https://github.com/ratatui-org/ratatui).
//!
//! The viewer never runs the program: it steps through the events of a
//! finished [`RunReport`]. It is organized into three layers:
//!
//! - **[`app`]**: replay cursor, keyboard event loop, pane focus, auto-play
//! - **[`panes`]**: stateless render functions for each visible pane (source, stack,
//!   heap, terminal, status bar)
//! - **[`theme`]**: centralized color palette used by all panes
//!
//! The entry point for consumers is [`App`]: construct it with a report and the
//! program source and call [`App::run`] to start the event loop.
//!
//! [`RunReport`]: crate::runner::RunReport
//! [`App::run`]: app::App::run

pub mod app;
pub mod panes;
pub mod theme;

pub use app::App;
