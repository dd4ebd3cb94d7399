//! Lifecycle activity feed panel.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::App;
use crate::model::{LifecycleEvent, LifecycleKind};
use crate::ui::Theme;

/// Render the activity feed showing recent lifecycle events.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Activity [l:hide] ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    if app.feed.is_empty() {
        let empty = Paragraph::new(Span::styled(
            "  no activity yet",
            Style::default().add_modifier(Modifier::DIM),
        ))
        .block(block);
        frame.render_widget(empty, area);
        return;
    }

    // Newest events at the top, as many as fit inside the borders
    let visible = area.height.saturating_sub(2) as usize;
    let lines: Vec<Line> = app
        .feed
        .iter()
        .rev()
        .take(visible)
        .map(|event| event_line(&app.theme, event))
        .collect();

    let feed = Paragraph::new(lines).block(block);
    frame.render_widget(feed, area);
}

fn event_line<'a>(theme: &Theme, event: &'a LifecycleEvent) -> Line<'a> {
    let mut spans = vec![
        Span::styled(
            format!(" c{:<4}", event.cycle),
            Style::default().add_modifier(Modifier::DIM),
        ),
        Span::styled(format!("{:<11}", event.kind.label()), kind_style(theme, event.kind)),
        Span::raw(event.id.as_str()),
    ];
    if let Some(detail) = &event.detail {
        spans.push(Span::styled(
            format!("  {}", detail),
            Style::default().add_modifier(Modifier::DIM),
        ));
    }
    Line::from(spans)
}

fn kind_style(theme: &Theme, kind: LifecycleKind) -> Style {
    match kind {
        LifecycleKind::Appeared | LifecycleKind::Reappeared | LifecycleKind::Recovered => {
            Style::default().fg(theme.active)
        }
        LifecycleKind::Stalled => Style::default().fg(theme.stalled),
        LifecycleKind::Terminated => Style::default().fg(theme.terminated),
        LifecycleKind::Purged => Style::default()
            .fg(theme.terminated)
            .add_modifier(Modifier::DIM),
    }
}
