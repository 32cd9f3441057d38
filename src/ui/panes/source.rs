//! Source code pane rendering with syntax highlighting
//!
//! The pane uses a simple character-by-character tokenizer to apply syntax
//! highlighting styles without requiring the full lexer, so it also renders
//! programs that failed to parse.

use super::utils::{pane_block, visible_rows};
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// Simple syntax highlighting for one source line
fn highlight_source_code(line: &str) -> Line<'static> {
    let mut spans = Vec::new();
    let mut current_word = String::new();
    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;

    let flush = |word: &mut String, spans: &mut Vec<Span<'static>>, is_call: bool| {
        if !word.is_empty() {
            let style = keyword_style(word, is_call);
            spans.push(Span::styled(std::mem::take(word), style));
        }
    };

    while i < chars.len() {
        let c = chars[i];

        if c == '#' {
            flush(&mut current_word, &mut spans, false);
            let rest: String = chars[i..].iter().collect();
            spans.push(Span::styled(rest, Style::default().fg(DEFAULT_THEME.comment)));
            break;
        }

        if c == '"' || c == '\'' {
            // A prefix such as f or b stays attached to the literal
            let prefix = std::mem::take(&mut current_word);
            let mut end = i + 1;
            while end < chars.len() && chars[end] != c {
                end += if chars[end] == '\\' { 2 } else { 1 };
            }
            let end = (end + 1).min(chars.len());
            let literal: String = prefix.chars().chain(chars[i..end].iter().copied()).collect();
            spans.push(Span::styled(literal, Style::default().fg(DEFAULT_THEME.string)));
            i = end;
            continue;
        }

        if !c.is_alphanumeric() && c != '_' {
            flush(&mut current_word, &mut spans, c == '(');
            let style = match c {
                '{' | '}' | '(' | ')' | '[' | ']' => Style::default().fg(DEFAULT_THEME.primary),
                _ => Style::default().fg(DEFAULT_THEME.fg),
            };
            spans.push(Span::styled(c.to_string(), style));
            i += 1;
            continue;
        }

        current_word.push(c);
        i += 1;
    }
    flush(&mut current_word, &mut spans, false);

    Line::from(spans)
}

fn keyword_style(word: &str, is_call: bool) -> Style {
    match word {
        "def" | "class" | "return" | "if" | "elif" | "else" | "while" | "for" | "in" | "not"
        | "and" | "or" | "is" | "break" | "continue" | "pass" | "try" | "except" | "finally"
        | "raise" | "global" | "nonlocal" | "del" | "lambda" | "assert" | "as" => Style::default()
            .fg(DEFAULT_THEME.keyword)
            .add_modifier(Modifier::BOLD),
        "None" | "True" | "False" => Style::default().fg(DEFAULT_THEME.number),
        "self" => Style::default().fg(DEFAULT_THEME.type_name),
        _ if word.chars().all(|c| c.is_ascii_digit() || c == '_') => {
            Style::default().fg(DEFAULT_THEME.number)
        }
        _ if is_call => Style::default().fg(DEFAULT_THEME.function),
        _ => Style::default().fg(DEFAULT_THEME.fg),
    }
}

/// Scroll state for the source pane
#[derive(Debug, Default)]
pub struct SourceScrollState {
    pub offset: usize,
    /// Visual row the current line is pinned to (None = not initialized yet)
    pub target_line_row: Option<usize>,
}

/// Render the source code pane
pub fn render_source_pane(
    frame: &mut Frame,
    area: Rect,
    source_code: &str,
    current_line: usize,
    is_error: bool,
    is_focused: bool,
    scroll_state: &mut SourceScrollState,
) {
    let block = pane_block(" Source Code ", is_focused);

    let lines: Vec<&str> = source_code.lines().collect();
    let total_lines = lines.len();
    let visible_height = visible_rows(area.height);

    // Keep the current line at a fixed visual row while stepping
    let target_row = scroll_state
        .target_line_row
        .unwrap_or(visible_height / 2)
        .min(visible_height.saturating_sub(1));
    scroll_state.target_line_row = Some(target_row);

    if current_line > 0 && current_line <= total_lines {
        let offset = (current_line - 1).saturating_sub(target_row);
        scroll_state.offset = if total_lines > visible_height {
            offset.min(total_lines - visible_height)
        } else {
            0
        };
    }

    let visible_lines: Vec<Line> = lines
        .iter()
        .enumerate()
        .skip(scroll_state.offset)
        .take(visible_height)
        .map(|(idx, line)| {
            let line_num = idx + 1;
            let is_current = line_num == current_line;
            let mut content_line = highlight_source_code(line);

            let num_style = if is_current {
                let color = if is_error {
                    DEFAULT_THEME.error
                } else {
                    DEFAULT_THEME.secondary
                };
                Style::default().fg(color).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(DEFAULT_THEME.comment)
            };

            if is_current && is_error {
                let error_style = Style::default()
                    .bg(DEFAULT_THEME.error)
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD);
                for span in &mut content_line.spans {
                    span.style = error_style;
                }
            } else if is_current {
                let current_style = Style::default().bg(DEFAULT_THEME.current_line_bg);
                for span in &mut content_line.spans {
                    span.style = span.style.patch(current_style);
                }
            }

            let marker = if is_current { "▶" } else { " " };
            let mut spans = vec![Span::styled(format!("{}{:4} ", marker, line_num), num_style)];
            spans.extend(content_line.spans);
            Line::from(spans)
        })
        .collect();

    let paragraph = Paragraph::new(visible_lines).block(block);
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(line: &Line) -> Vec<String> {
        line.spans.iter().map(|span| span.content.to_string()).collect()
    }

    #[test]
    fn test_highlight_keeps_text() {
        let source = "def f(x):  # double it";
        let line = highlight_source_code(source);
        assert_eq!(texts(&line).concat(), source);
    }

    #[test]
    fn test_string_prefix_stays_with_literal() {
        let line = highlight_source_code("print(f'{x}')");
        assert!(texts(&line).contains(&"f'{x}'".to_string()));
    }

    #[test]
    fn test_keyword_styles() {
        assert!(keyword_style("def", false).add_modifier.contains(Modifier::BOLD));
        assert_eq!(keyword_style("print", true).fg, Some(DEFAULT_THEME.function));
        assert_eq!(keyword_style("42", false).fg, Some(DEFAULT_THEME.number));
    }
}
