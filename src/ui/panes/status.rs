//! Status bar rendering with keybindings and state indicators

use crate::session::Phase;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// Which keys currently mean something
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMode {
    Editing,
    Running,
    Input,
    Chat,
    Walkthrough,
}

pub struct StatusRenderData<'a> {
    pub message: &'a str,
    pub lesson: &'a str,
    pub phase: Phase,
    pub current: usize,
    pub total: usize,
    pub mode: KeyMode,
    pub is_animating: bool,
}

fn badge(text: &'static str, bg: Color) -> Span<'static> {
    Span::styled(
        text,
        Style::default()
            .bg(bg)
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD),
    )
}

/// Render the status bar at the bottom.
pub fn render_status_bar(frame: &mut Frame, area: Rect, data: &StatusRenderData<'_>) {
    let layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let failed = data.phase == Phase::Failed;
    let step_text = if data.phase.is_running() || data.phase == Phase::Complete || failed {
        format!(" Step {}/{} ", data.current, data.total)
    } else {
        format!(" {} ", data.lesson)
    };

    let left_spans = vec![
        Span::styled(
            step_text,
            Style::default()
                .bg(if failed {
                    DEFAULT_THEME.error
                } else if data.mode == KeyMode::Input {
                    DEFAULT_THEME.secondary
                } else {
                    DEFAULT_THEME.primary
                })
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            " | ",
            Style::default()
                .bg(DEFAULT_THEME.current_line_bg)
                .fg(DEFAULT_THEME.comment),
        ),
        Span::styled(
            format!(" {} ", data.message),
            Style::default()
                .bg(DEFAULT_THEME.current_line_bg)
                .fg(if failed {
                    DEFAULT_THEME.error
                } else {
                    DEFAULT_THEME.fg
                }),
        ),
    ];

    frame.render_widget(
        Paragraph::new(Line::from(left_spans))
            .style(Style::default().bg(DEFAULT_THEME.current_line_bg))
            .alignment(Alignment::Left),
        layout[0],
    );

    let key_style = Style::default().bg(DEFAULT_THEME.comment).fg(Color::Black);
    let desc_style = Style::default()
        .bg(DEFAULT_THEME.current_line_bg)
        .fg(DEFAULT_THEME.fg);
    let sep_style = Style::default()
        .bg(DEFAULT_THEME.current_line_bg)
        .fg(DEFAULT_THEME.comment);

    let bindings: &[(&str, &str)] = match data.mode {
        KeyMode::Editing => &[
            ("^R", "run"),
            ("^T", "template"),
            ("^E", "walkthrough"),
            ("⇥", "chat"),
            ("esc", "quit"),
        ],
        KeyMode::Running => &[
            ("→", "next step"),
            ("←", "back"),
            ("^X", "reset"),
            ("⇥", "chat"),
            ("q", "quit"),
        ],
        KeyMode::Input => &[("↵", "submit"), ("esc", "cancel")],
        KeyMode::Chat => &[("↵", "ask"), ("⇥/esc", "close chat")],
        KeyMode::Walkthrough => &[("←/→", "line"), ("esc", "close")],
    };

    let mut right_spans = Vec::new();
    for (i, (key, desc)) in bindings.iter().enumerate() {
        if i > 0 {
            right_spans.push(Span::styled("│", sep_style));
            right_spans.push(Span::styled(" ", desc_style));
        }
        right_spans.push(Span::styled(format!(" {} ", key), key_style));
        right_spans.push(Span::styled(format!(" {} ", desc), desc_style));
    }

    let indicator = if data.mode == KeyMode::Input {
        Some(badge(" ⌨ INPUT ", DEFAULT_THEME.secondary))
    } else if data.is_animating {
        Some(badge(" ✦ ANIMATING ", DEFAULT_THEME.spark))
    } else {
        match data.phase {
            Phase::Complete => Some(badge(" END ", DEFAULT_THEME.success)),
            Phase::Failed => Some(badge(" ERROR ", DEFAULT_THEME.error)),
            Phase::Ready => Some(badge(" START ", DEFAULT_THEME.success)),
            _ => None,
        }
    };
    if let Some(indicator) = indicator {
        right_spans.push(Span::styled("│", sep_style));
        right_spans.push(indicator);
    }

    frame.render_widget(
        Paragraph::new(Line::from(right_spans))
            .style(Style::default().bg(DEFAULT_THEME.current_line_bg))
            .alignment(Alignment::Right),
        layout[1],
    );
}
