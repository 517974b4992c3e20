//! Overlay for value labels in flight between panes

use crate::ui::stage::{Anchor, StageState};
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Span,
    widgets::Paragraph,
    Frame,
};

/// Resolves an anchor to a screen cell for the current frame
pub trait AnchorMap {
    fn locate(&self, anchor: &Anchor, stage: &StageState) -> Option<(u16, u16)>;
}

fn lerp(from: u16, to: u16, t: f64) -> u16 {
    (from as f64 + (to as f64 - from as f64) * t).round().max(0.0) as u16
}

/// Draw every spark at its interpolated position, clipped to `bounds`
pub fn render_sparks(frame: &mut Frame, bounds: Rect, stage: &StageState, anchors: &impl AnchorMap) {
    for spark in &stage.sparks {
        let (Some(from), Some(to)) = (
            anchors.locate(&spark.from, stage),
            anchors.locate(&spark.to, stage),
        ) else {
            continue;
        };
        let t = spark.progress();
        let x = lerp(from.0, to.0, t);
        let y = lerp(from.1, to.1, t);
        if y < bounds.y || y >= bounds.bottom() || x >= bounds.right() {
            continue;
        }

        let label = format!(" {} ", spark.label);
        let width = (label.chars().count() as u16).min(bounds.right() - x);
        frame.render_widget(
            Paragraph::new(Span::styled(
                label,
                Style::default()
                    .fg(Color::Black)
                    .bg(DEFAULT_THEME.spark)
                    .add_modifier(Modifier::BOLD),
            )),
            Rect::new(x, y, width, 1),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lerp_endpoints() {
        assert_eq!(lerp(10, 30, 0.0), 10);
        assert_eq!(lerp(10, 30, 1.0), 30);
        assert_eq!(lerp(30, 10, 0.5), 20);
    }
}
