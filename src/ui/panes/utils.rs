//! Helpers shared by the panes

use crate::snapshot::ValueRef;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    style::{Modifier, Style},
    text::Span,
    widgets::{Block, Borders},
};

/// Bordered, titled pane block; the border is highlighted when focused
pub(super) fn pane_block(title: &str, is_focused: bool) -> Block<'_> {
    let border_style = if is_focused {
        Style::default()
            .fg(DEFAULT_THEME.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.border_normal)
    };
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style)
}

/// Rows available inside a bordered pane of `height`, at least 1
pub(super) fn visible_rows(height: u16) -> usize {
    height.saturating_sub(2).max(1) as usize
}

/// Clamp a scroll offset so the last page stays full
pub(super) fn clamp_scroll(offset: usize, total_items: usize, visible_height: usize) -> usize {
    if total_items > visible_height {
        offset.min(total_items - visible_height)
    } else {
        0
    }
}

/// Styled text for a value reference: object links in the type colour,
/// inline values in the number colour
pub(super) fn value_ref_span(value: &ValueRef) -> Span<'static> {
    match value {
        ValueRef::Primitive { value } => {
            Span::styled(value.clone(), Style::default().fg(DEFAULT_THEME.number))
        }
        ValueRef::Reference { object_id, preview } => Span::styled(
            format!("{} → {}", preview, object_id),
            Style::default().fg(DEFAULT_THEME.type_name),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_scroll() {
        assert_eq!(clamp_scroll(10, 5, 8), 0);
        assert_eq!(clamp_scroll(10, 20, 8), 10);
        assert_eq!(clamp_scroll(usize::MAX, 20, 8), 12);
    }

    #[test]
    fn test_visible_rows_has_a_floor() {
        assert_eq!(visible_rows(0), 1);
        assert_eq!(visible_rows(10), 8);
    }
}
