//! Teacher bubble and walkthrough panes

use crate::explain::walkthrough::VariablePanel;
use crate::explain::Walkthrough;
use crate::session::{TeacherMessage, Tone};
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

fn border(is_focused: bool) -> Style {
    if is_focused {
        Style::default()
            .fg(DEFAULT_THEME.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.border_normal)
    }
}

/// Render the teacher bubble
pub fn render_teacher_pane(
    frame: &mut Frame,
    area: Rect,
    message: &TeacherMessage,
    pending: bool,
    is_focused: bool,
) {
    let color = match message.tone {
        Tone::Info => DEFAULT_THEME.fg,
        Tone::Success => DEFAULT_THEME.success,
        Tone::Error => DEFAULT_THEME.error,
    };

    let title = if pending { " Teacher (thinking…) " } else { " Teacher " };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border(is_focused));

    let text = if message.text.is_empty() {
        Line::from(Span::styled(
            "Write some code and press Ctrl-R to run it.",
            Style::default().fg(DEFAULT_THEME.comment),
        ))
    } else {
        Line::from(Span::styled(message.text.clone(), Style::default().fg(color)))
    };

    frame.render_widget(
        Paragraph::new(text).block(block).wrap(Wrap { trim: true }),
        area,
    );
}

/// Render the walkthrough with its variable panel
pub fn render_walkthrough_pane(
    frame: &mut Frame,
    area: Rect,
    walkthrough: Option<&Walkthrough>,
    index: usize,
    is_focused: bool,
) {
    let Some(walkthrough) = walkthrough.filter(|w| !w.is_empty()) else {
        let block = Block::default()
            .title(" Walkthrough ")
            .borders(Borders::ALL)
            .border_style(border(is_focused));
        frame.render_widget(
            Paragraph::new("Asking the teacher for a walkthrough…")
                .style(Style::default().fg(DEFAULT_THEME.comment))
                .block(block),
            area,
        );
        return;
    };

    let index = index.min(walkthrough.len() - 1);
    let entry = &walkthrough.entries[index];

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let title = match entry.line {
        Some(line) => format!(" Walkthrough {}/{} · line {} ", index + 1, walkthrough.len(), line),
        None => format!(" Walkthrough {}/{} ", index + 1, walkthrough.len()),
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border(is_focused));
    frame.render_widget(
        Paragraph::new(entry.text.clone())
            .style(Style::default().fg(DEFAULT_THEME.fg))
            .block(block)
            .wrap(Wrap { trim: true }),
        rows[0],
    );

    let lines: Vec<Line> = match &entry.variables {
        VariablePanel::Absent => vec![Line::from(Span::styled(
            VariablePanel::PLACEHOLDER,
            Style::default().fg(DEFAULT_THEME.comment),
        ))],
        VariablePanel::Invalid => vec![Line::from(Span::styled(
            VariablePanel::INVALID,
            Style::default().fg(DEFAULT_THEME.error),
        ))],
        VariablePanel::Parsed(vars) => vars
            .iter()
            .map(|(name, value)| {
                Line::from(vec![
                    Span::styled(
                        name.clone(),
                        Style::default()
                            .fg(DEFAULT_THEME.primary)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(" = ", Style::default().fg(DEFAULT_THEME.comment)),
                    Span::styled(value.clone(), Style::default().fg(DEFAULT_THEME.string)),
                ])
            })
            .collect(),
    };
    let block = Block::default()
        .title(" Variables ")
        .borders(Borders::ALL)
        .border_style(border(false));
    frame.render_widget(Paragraph::new(lines).block(block), rows[1]);
}
