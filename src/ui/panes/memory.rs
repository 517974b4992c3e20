//! Memory pane: one labelled box per variable
//!
//! Boxes are drawn from the animation stage, not from the store, so a box
//! appears only once its spark has landed.

use crate::ui::stage::{Fading, StageState};
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

/// Screen position of the memory row `index` (existing or next free)
pub fn box_anchor(area: Rect, index: usize) -> (u16, u16) {
    let last_row = area.height.saturating_sub(2);
    let row = (index as u16).min(last_row.saturating_sub(1));
    (area.x + 3, area.y + 1 + row)
}

/// Render the memory pane
pub fn render_memory_pane(frame: &mut Frame, area: Rect, stage: &StageState, is_focused: bool) {
    let border_style = if is_focused {
        Style::default()
            .fg(DEFAULT_THEME.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.border_normal)
    };

    let block = Block::default()
        .title(" Memory ")
        .borders(Borders::ALL)
        .border_style(border_style);

    let mut items: Vec<ListItem> = Vec::new();
    if stage.boxes.is_empty() {
        items.push(
            ListItem::new("(no variables yet)").style(Style::default().fg(DEFAULT_THEME.comment)),
        );
    }

    let name_width = stage
        .boxes
        .iter()
        .map(|b| b.name.chars().count())
        .max()
        .unwrap_or(0);

    for memory_box in &stage.boxes {
        let fading = stage.fading == Some(Fading::Memory(memory_box.name.clone()));
        let mut value_style = Style::default().fg(DEFAULT_THEME.string);
        if memory_box.is_popping() {
            value_style = Style::default()
                .fg(Color::Black)
                .bg(DEFAULT_THEME.spark)
                .add_modifier(Modifier::BOLD);
        }
        if fading {
            value_style = value_style.add_modifier(Modifier::DIM | Modifier::CROSSED_OUT);
        }

        items.push(ListItem::new(Line::from(vec![
            Span::styled("▸ ", Style::default().fg(DEFAULT_THEME.secondary)),
            Span::styled(
                format!("{:<width$}", memory_box.name, width = name_width),
                Style::default()
                    .fg(DEFAULT_THEME.primary)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(" │ ", Style::default().fg(DEFAULT_THEME.comment)),
            Span::styled(format!(" {} ", memory_box.value), value_style),
        ])));
    }

    if let Some(label) = &stage.converting {
        items.push(ListItem::new(""));
        items.push(ListItem::new(Line::from(vec![
            Span::styled(" ⚙ converting ", Style::default().fg(DEFAULT_THEME.comment)),
            Span::styled(
                format!(" \"{}\" → {} ", label, label),
                Style::default()
                    .fg(Color::Black)
                    .bg(DEFAULT_THEME.secondary)
                    .add_modifier(Modifier::BOLD),
            ),
        ])));
    }

    frame.render_widget(List::new(items).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_anchor_clamps_to_pane() {
        let area = Rect::new(10, 5, 30, 6);
        assert_eq!(box_anchor(area, 0), (13, 6));
        assert_eq!(box_anchor(area, 99), (13, 9));
    }
}
