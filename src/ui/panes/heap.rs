//! Heap pane rendering: the snapshot's object table
//!
//! Objects are listed in creation order, each with its type and children:
//! elements by index, mapping entries by key, object attributes by name.
//! Truncated nodes are flagged so a cut-off view is never mistaken for the
//! whole value.

use super::utils::{clamp_scroll, pane_block, value_ref_span, visible_rows};
use crate::snapshot::{GraphNode, Shape, Snapshot};
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem},
    Frame,
};

/// Scroll state for the heap pane
#[derive(Debug, Default)]
pub struct HeapScrollState {
    pub offset: usize,
}

fn node_lines(node: &GraphNode) -> Vec<Line<'static>> {
    let comment = Style::default().fg(DEFAULT_THEME.comment);
    let mut header = vec![
        Span::styled(
            format!("{} ", node.id),
            Style::default()
                .fg(DEFAULT_THEME.secondary)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(node.type_name.clone(), Style::default().fg(DEFAULT_THEME.type_name)),
    ];
    if node.shape == Shape::Primitive {
        header.push(Span::styled(" = ", comment));
        header.push(Span::styled(
            node.display.clone(),
            Style::default().fg(DEFAULT_THEME.number),
        ));
    }
    if node.truncated {
        header.push(Span::styled(
            " (truncated)",
            Style::default().fg(DEFAULT_THEME.error),
        ));
    }
    let mut lines = vec![Line::from(header)];

    let child = |label: String, value: Span<'static>| {
        Line::from(vec![
            Span::raw("    "),
            Span::styled(label, Style::default().fg(DEFAULT_THEME.fg)),
            Span::styled(": ", comment),
            value,
        ])
    };
    if let Some(elements) = &node.elements {
        for (index, element) in elements.iter().enumerate() {
            lines.push(child(format!("[{}]", index), value_ref_span(element)));
        }
    }
    if let Some(entries) = &node.entries {
        for entry in entries {
            lines.push(child(entry.key.text().to_string(), value_ref_span(&entry.value)));
        }
    }
    if let Some(attributes) = &node.attributes {
        for attribute in attributes {
            lines.push(child(format!(".{}", attribute.name), value_ref_span(&attribute.value)));
        }
    }
    lines
}

/// Render the heap pane
pub fn render_heap_pane(
    frame: &mut Frame,
    area: Rect,
    snapshot: Option<&Snapshot>,
    is_focused: bool,
    scroll_state: &mut HeapScrollState,
) {
    let title = match snapshot {
        Some(snapshot) => format!(" Heap ({} objects) ", snapshot.objects.len()),
        None => " Heap ".to_string(),
    };
    let block = pane_block(&title, is_focused);

    let lines: Vec<Line> = match snapshot {
        Some(snapshot) if !snapshot.objects.is_empty() => {
            snapshot.objects.iter().flat_map(node_lines).collect()
        }
        _ => vec![Line::from(Span::styled(
            "(no objects)",
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{CollectionKind, ValueRef};

    fn text(line: &Line) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    #[test]
    fn test_collection_node_lists_elements() {
        let node = GraphNode {
            id: "obj2".to_string(),
            type_name: "list".to_string(),
            shape: Shape::Collection(CollectionKind::List),
            display: "[1, 1]".to_string(),
            scalar_value: None,
            elements: Some(vec![
                ValueRef::Reference {
                    object_id: "obj1".to_string(),
                    preview: "1".to_string(),
                },
                ValueRef::Primitive {
                    value: "1".to_string(),
                },
            ]),
            entries: None,
            attributes: None,
            collection_kind: Some(CollectionKind::List),
            truncated: true,
        };
        let lines = node_lines(&node);
        assert_eq!(text(&lines[0]), "obj2 list (truncated)");
        assert_eq!(text(&lines[1]), "    [0]: 1 → obj1");
        assert_eq!(text(&lines[2]), "    [1]: 1");
    }
}
