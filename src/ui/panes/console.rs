//! Console pane: program output and the input prompt

use crate::ui::stage::{Fading, StageState};
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Padding},
    Frame,
};

/// Data needed to render the console pane
pub struct ConsoleRenderData<'a> {
    pub stage: &'a StageState,
    /// Output substring picked out by the walkthrough
    pub highlight: Option<&'a str>,
    pub is_focused: bool,
}

/// Screen position where the next output line will appear
pub fn console_anchor(area: Rect, line_count: usize, scroll: usize) -> (u16, u16) {
    let visible = area.height.saturating_sub(2).max(1) as usize;
    let row = line_count.saturating_sub(scroll).min(visible - 1);
    (area.x + 2, area.y + 1 + row as u16)
}

fn highlighted(text: &str, highlight: Option<&str>, base: Style) -> Vec<Span<'static>> {
    let chalk = Style::default()
        .fg(Color::Black)
        .bg(DEFAULT_THEME.chalk_bg)
        .add_modifier(Modifier::BOLD);
    match highlight.filter(|h| !h.is_empty()).and_then(|h| {
        text.find(h).map(|start| (start, start + h.len()))
    }) {
        Some((start, end)) => vec![
            Span::styled(text[..start].to_string(), base),
            Span::styled(text[start..end].to_string(), chalk),
            Span::styled(text[end..].to_string(), base),
        ],
        None => vec![Span::styled(text.to_string(), base)],
    }
}

/// Render the console pane
pub fn render_console_pane(
    frame: &mut Frame,
    area: Rect,
    data: &ConsoleRenderData<'_>,
    scroll_offset: &mut usize,
) {
    let border_style = if data.is_focused || data.stage.input.is_some() {
        Style::default()
            .fg(DEFAULT_THEME.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.border_normal)
    };

    let block = Block::default()
        .title(" Console ")
        .borders(Borders::ALL)
        .border_style(border_style)
        .padding(Padding::new(1, 0, 0, 0));

    let mut all_items: Vec<ListItem> = data
        .stage
        .lines
        .iter()
        .map(|line| {
            let mut base = Style::default().fg(DEFAULT_THEME.fg);
            if data.stage.fading == Some(Fading::Output(line.handle)) {
                base = base.add_modifier(Modifier::DIM | Modifier::CROSSED_OUT);
            }
            let mut spans = vec![Span::raw(" ".repeat(line.indent() as usize))];
            spans.extend(highlighted(&line.text, data.highlight, base));
            ListItem::new(Line::from(spans))
        })
        .collect();

    if let Some(request) = &data.stage.input {
        all_items.push(ListItem::new(Line::from(vec![
            Span::styled(
                request.prompt.clone(),
                Style::default().fg(DEFAULT_THEME.secondary),
            ),
            Span::styled(
                request.value.clone(),
                Style::default()
                    .fg(DEFAULT_THEME.fg)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled("█", Style::default().fg(DEFAULT_THEME.primary)),
        ])));
    }

    if all_items.is_empty() {
        all_items
            .push(ListItem::new("(no output)").style(Style::default().fg(DEFAULT_THEME.comment)));
    }

    // Follow the newest line
    let total_items = all_items.len();
    let visible_height = area.height.saturating_sub(2).max(1) as usize;
    *scroll_offset = total_items.saturating_sub(visible_height);

    let visible_items: Vec<ListItem> = all_items
        .into_iter()
        .skip(*scroll_offset)
        .take(visible_height)
        .collect();

    frame.render_widget(List::new(visible_items).block(block), area);
}
