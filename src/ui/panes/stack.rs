//! Stack pane rendering: user frames and their locals
//!
//! Frames come from the event's snapshot, outermost first, so the innermost
//! (currently executing) frame is drawn last. Locals that refer to heap
//! objects show the object id they point at, matching the heap pane.

use super::utils::{clamp_scroll, pane_block, value_ref_span, visible_rows};
use crate::trace::{EventKind, TraceEvent};
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem},
    Frame,
};

/// Scroll state for the stack pane
#[derive(Debug, Default)]
pub struct StackScrollState {
    pub offset: usize,
}

fn frame_lines(event: &TraceEvent) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let frames = &event.memory.frames;
    for (depth, frame) in frames.iter().enumerate() {
        lines.push(Line::from(vec![
            Span::styled("▸ ", Style::default().fg(DEFAULT_THEME.secondary)),
            Span::styled(
                format!("Frame {} ", depth),
                Style::default().fg(DEFAULT_THEME.comment),
            ),
            Span::styled("│ ", Style::default().fg(DEFAULT_THEME.comment)),
            Span::styled(
                frame.function.clone(),
                Style::default()
                    .fg(DEFAULT_THEME.function)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  line {}", frame.line),
                Style::default().fg(DEFAULT_THEME.comment),
            ),
        ]));

        if frame.locals.is_empty() {
            lines.push(Line::from(Span::styled(
                "    (no locals)",
                Style::default().fg(DEFAULT_THEME.comment),
            )));
        }
        for (name, value) in &frame.locals {
            lines.push(Line::from(vec![
                Span::raw("    "),
                Span::styled(name.clone(), Style::default().fg(DEFAULT_THEME.fg)),
                Span::styled(" = ", Style::default().fg(DEFAULT_THEME.comment)),
                value_ref_span(value),
            ]));
        }
    }

    match (&event.return_value, &event.exception) {
        (Some(value), _) if event.event == EventKind::Return => {
            lines.push(Line::from(vec![
                Span::styled(
                    "⮐ returns ",
                    Style::default()
                        .fg(DEFAULT_THEME.return_value)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(value.clone(), Style::default().fg(DEFAULT_THEME.return_value)),
            ]));
        }
        (_, Some(exception)) => {
            lines.push(Line::from(Span::styled(
                format!("✖ {}: {}", exception.type_name, exception.message),
                Style::default()
                    .fg(DEFAULT_THEME.error)
                    .add_modifier(Modifier::BOLD),
            )));
        }
        _ => {}
    }
    lines
}

/// Render the stack pane
pub fn render_stack_pane(
    frame: &mut Frame,
    area: Rect,
    event: Option<&TraceEvent>,
    is_focused: bool,
    scroll_state: &mut StackScrollState,
) {
    let block = pane_block(" Call Stack ", is_focused);

    let lines = match event {
        Some(event) => frame_lines(event),
        None => vec![Line::from(Span::styled(
            "(empty)",
            Style::default().fg(DEFAULT_THEME.comment),
        ))],
    };

    let visible_height = visible_rows(area.height);
    scroll_state.offset = clamp_scroll(scroll_state.offset, lines.len(), visible_height);
    let items: Vec<ListItem> = lines
        .into_iter()
        .skip(scroll_state.offset)
        .take(visible_height)
        .map(ListItem::new)
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}
