//! Source editor pane
//!
//! Renders the learner's program with light Python highlighting, locked
//! tokens dimmed, the cursor while editing, the line of the most recent step
//! and the line of the last error.

use crate::lesson::buffer::{Cursor, LockedRange, SourceBuffer};
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Width of the line-number gutter, see [`line_anchor`]
pub const GUTTER: u16 = 5;

/// Simple syntax highlighting for one line of Python
fn highlight_source_code(line: &str) -> Vec<(String, Style)> {
    let mut spans = Vec::new();
    let mut current_word = String::new();

    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '#' {
            flush_word(&mut spans, &mut current_word, false);
            spans.push((
                chars[i..].iter().collect(),
                Style::default().fg(DEFAULT_THEME.comment),
            ));
            break;
        }

        if c == '"' || c == '\'' {
            flush_word(&mut spans, &mut current_word, false);
            let mut end = i + 1;
            while end < chars.len() && chars[end] != c {
                end += if chars[end] == '\\' { 2 } else { 1 };
            }
            end = (end + 1).min(chars.len());
            spans.push((
                chars[i..end].iter().collect(),
                Style::default().fg(DEFAULT_THEME.string),
            ));
            i = end;
            continue;
        }

        if !c.is_alphanumeric() && c != '_' {
            flush_word(&mut spans, &mut current_word, c == '(');
            let style = match c {
                '(' | ')' | '[' | ']' => Style::default().fg(DEFAULT_THEME.primary),
                _ => Style::default().fg(DEFAULT_THEME.fg),
            };
            spans.push((c.to_string(), style));
            i += 1;
            continue;
        }

        current_word.push(c);
        i += 1;
    }

    flush_word(&mut spans, &mut current_word, false);
    spans
}

fn flush_word(spans: &mut Vec<(String, Style)>, word: &mut String, is_function: bool) {
    if !word.is_empty() {
        let style = get_keyword_style(word, is_function);
        spans.push((std::mem::take(word), style));
    }
}

fn get_keyword_style(word: &str, is_function: bool) -> Style {
    match word {
        "int" | "float" | "str" | "bool" => Style::default().fg(DEFAULT_THEME.type_name),
        "print" | "input" => Style::default()
            .fg(DEFAULT_THEME.function)
            .add_modifier(Modifier::BOLD),
        "and" | "or" | "not" | "pass" | "if" | "else" | "for" | "while" | "def" | "return" => {
            Style::default()
                .fg(DEFAULT_THEME.keyword)
                .add_modifier(Modifier::BOLD)
        }
        "True" | "False" | "None" => Style::default().fg(DEFAULT_THEME.number),
        _ if word.chars().all(|c| c.is_ascii_digit() || c == '_') => {
            Style::default().fg(DEFAULT_THEME.number)
        }
        _ if is_function => Style::default().fg(DEFAULT_THEME.function),
        _ => Style::default().fg(DEFAULT_THEME.fg),
    }
}

/// Split highlighted spans into single characters so per-column styling
/// (locks, cursor) can be layered on top.
fn styled_chars(line: &str) -> Vec<(char, Style)> {
    highlight_source_code(line)
        .into_iter()
        .flat_map(|(text, style)| text.chars().map(move |c| (c, style)).collect::<Vec<_>>())
        .collect()
}

fn is_locked(ranges: &[LockedRange], column: usize) -> bool {
    ranges.iter().any(|r| r.start <= column && column < r.end)
}

pub struct SourceRenderData<'a> {
    pub buffer: &'a SourceBuffer,
    /// 0-based line of the last executed step
    pub active_line: Option<usize>,
    /// 0-based line of the last error
    pub error_line: Option<usize>,
    pub show_cursor: bool,
    pub is_focused: bool,
    pub title: &'a str,
}

/// Screen position of a source line, for sparks leaving it
pub fn line_anchor(area: Rect, line: usize, scroll: usize) -> Option<(u16, u16)> {
    let row = line.checked_sub(scroll)?;
    let visible = area.height.saturating_sub(2) as usize;
    (row < visible).then(|| (area.x + 1 + GUTTER, area.y + 1 + row as u16))
}

/// Render the source pane, adjusting `scroll` so the line of interest stays visible
pub fn render_source_pane(
    frame: &mut Frame,
    area: Rect,
    data: &SourceRenderData<'_>,
    scroll: &mut usize,
) {
    let border_style = if data.is_focused {
        Style::default()
            .fg(DEFAULT_THEME.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.border_normal)
    };

    let title = if data.buffer.is_read_only() {
        format!(" {} [running] ", data.title)
    } else {
        format!(" {} ", data.title)
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style);

    let visible_height = area.height.saturating_sub(2).max(1) as usize;
    let Cursor {
        line: cursor_line,
        column: cursor_column,
    } = data.buffer.cursor();

    // Keep the line of interest on screen
    let focus_line = if data.show_cursor {
        cursor_line
    } else {
        data.error_line.or(data.active_line).unwrap_or(0)
    };
    if focus_line < *scroll {
        *scroll = focus_line;
    } else if focus_line >= *scroll + visible_height {
        *scroll = focus_line + 1 - visible_height;
    }

    let lines: Vec<Line> = data
        .buffer
        .lines()
        .iter()
        .enumerate()
        .skip(*scroll)
        .take(visible_height)
        .map(|(idx, text)| {
            let is_error = data.error_line == Some(idx);
            let is_current = data.active_line == Some(idx);
            let locks = data.buffer.locked_ranges(idx);

            let num_style = if is_error {
                Style::default()
                    .fg(DEFAULT_THEME.error)
                    .add_modifier(Modifier::BOLD)
            } else if is_current {
                Style::default()
                    .fg(DEFAULT_THEME.secondary)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(DEFAULT_THEME.comment)
            };
            let marker = if is_current { '▶' } else { ' ' };
            let mut spans = vec![Span::styled(format!("{:3}{}", idx + 1, marker), num_style)];
            spans.push(Span::raw(" "));

            let mut chars = styled_chars(text);
            // Room for the cursor at end of line
            if data.show_cursor && idx == cursor_line && cursor_column >= chars.len() {
                chars.push((' ', Style::default()));
            }
            for (column, (c, mut style)) in chars.into_iter().enumerate() {
                if is_locked(locks, column) {
                    style = style.fg(DEFAULT_THEME.locked).add_modifier(Modifier::DIM);
                }
                if is_error {
                    style = style.bg(DEFAULT_THEME.error).fg(Color::White);
                } else if is_current {
                    style = style.bg(DEFAULT_THEME.current_line_bg);
                }
                if data.show_cursor && idx == cursor_line && column == cursor_column {
                    style = style.add_modifier(Modifier::REVERSED);
                }
                spans.push(Span::styled(c.to_string(), style));
            }
            Line::from(spans)
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
