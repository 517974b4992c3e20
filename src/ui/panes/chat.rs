//! Chat pane: conversation log and the question being typed

use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    Learner,
    Teacher,
}

#[derive(Debug, Clone)]
pub struct ChatLine {
    pub speaker: Speaker,
    pub text: String,
}

pub struct ChatRenderData<'a> {
    pub log: &'a [ChatLine],
    pub input: &'a str,
    pub waiting: bool,
    pub is_focused: bool,
}

/// Render the chat pane
pub fn render_chat_pane(frame: &mut Frame, area: Rect, data: &ChatRenderData<'_>) {
    let border_style = if data.is_focused {
        Style::default()
            .fg(DEFAULT_THEME.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.border_normal)
    };
    let block = Block::default()
        .title(" Ask the Teacher ")
        .borders(Borders::ALL)
        .border_style(border_style);

    let mut lines: Vec<Line> = Vec::new();
    for entry in data.log {
        let (who, style) = match entry.speaker {
            Speaker::Learner => ("you", Style::default().fg(DEFAULT_THEME.secondary)),
            Speaker::Teacher => ("teacher", Style::default().fg(DEFAULT_THEME.success)),
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{}: ", who), style.add_modifier(Modifier::BOLD)),
            Span::styled(entry.text.clone(), Style::default().fg(DEFAULT_THEME.fg)),
        ]));
    }
    if data.waiting {
        lines.push(Line::from(Span::styled(
            "teacher is typing…",
            Style::default()
                .fg(DEFAULT_THEME.comment)
                .add_modifier(Modifier::ITALIC),
        )));
    }
    lines.push(Line::from(vec![
        Span::styled("> ", Style::default().fg(DEFAULT_THEME.primary)),
        Span::raw(data.input.to_string()),
        Span::styled(
            if data.is_focused { "█" } else { "" },
            Style::default().fg(DEFAULT_THEME.primary),
        ),
    ]));

    // Keep the prompt visible: scroll so the last lines fit
    let visible = area.height.saturating_sub(2) as usize;
    let width = area.width.saturating_sub(2).max(1) as usize;
    let wrapped: usize = lines.iter().map(|l| l.width().max(1).div_ceil(width)).sum();
    let scroll = wrapped.saturating_sub(visible) as u16;

    frame.render_widget(
        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((scroll, 0)),
        area,
    );
}
