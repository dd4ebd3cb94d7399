//! Common UI components shared across views.
//!
//! This module contains the header bar, outage banner, status bar, the
//! help overlay, and the value formatters the table and detail views share.

use std::time::Duration;

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::App;
use crate::model::{format_age, format_duration, WorkspaceStatus};

/// Render the header bar with the town-wide overview.
///
/// Displays: status indicator, workspace counts by status, the source
/// description, poll cycle and interval, and pause/overrun markers.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let counts = app.snapshot.status_counts();

    // Overall indicator takes the worst live status
    let (status_icon, status_style) = if counts.stalled > 0 {
        ("●", app.theme.status_style(WorkspaceStatus::Stalled))
    } else if counts.active > 0 {
        ("●", app.theme.status_style(WorkspaceStatus::Active))
    } else {
        ("●", app.theme.status_style(WorkspaceStatus::Idle))
    };

    let mut spans = vec![
        Span::styled(format!(" {} ", status_icon), status_style),
        Span::styled("GASTOP ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("│ "),
        Span::styled(
            counts.active.to_string(),
            Style::default().fg(app.theme.active),
        ),
        Span::raw(" active "),
        Span::styled(counts.idle.to_string(), Style::default().fg(app.theme.idle)),
        Span::raw(" idle "),
        if counts.stalled > 0 {
            Span::styled(
                counts.stalled.to_string(),
                Style::default().fg(app.theme.stalled).add_modifier(Modifier::BOLD),
            )
        } else {
            Span::styled("0", Style::default().add_modifier(Modifier::DIM))
        },
        Span::raw(" stalled "),
        if counts.terminated > 0 {
            Span::styled(
                counts.terminated.to_string(),
                Style::default().fg(app.theme.terminated),
            )
        } else {
            Span::styled("0", Style::default().add_modifier(Modifier::DIM))
        },
        Span::raw(" gone │ "),
        Span::raw(app.source_description.clone()),
        Span::raw(format!(" │ cycle {} │ {}", app.last_cycle, format_duration(app.interval))),
    ];

    if app.paused {
        spans.push(Span::styled(
            " paused",
            Style::default().fg(app.theme.stalled).add_modifier(Modifier::BOLD),
        ));
    }
    if app.overrun {
        spans.push(Span::styled(
            " overrun",
            Style::default().fg(app.theme.stalled),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Render the source outage banner.
///
/// Present from the first failed poll; switches to the loud persistent
/// style once the failure streak escalates.
pub fn render_banner(frame: &mut Frame, app: &App, area: Rect) {
    let Some((text, persistent)) = app.source_banner() else {
        return;
    };
    let style = if persistent {
        app.theme.banner
    } else {
        Style::default().fg(app.theme.stalled).add_modifier(Modifier::BOLD)
    };
    let line = format!(" ⚠ {} (retrying every {}) ", text, format_duration(app.interval));
    frame.render_widget(Paragraph::new(line).style(style), area);
}

/// Render the status bar at the bottom.
///
/// Shows temporary feedback messages when present, otherwise the data age
/// and the context-sensitive key hints.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    // Check for temporary status message first
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    let status = if app.last_cycle == 0 {
        " Loading... | q:quit".to_string()
    } else {
        let controls = if app.filter_active {
            "Type to filter | Enter:apply Esc:cancel"
        } else {
            "/:filter s:sort Enter:detail x:kill n:nudge p:pause ?:help q:quit"
        };
        format!(
            " Updated {:.1}s ago | {}",
            app.snapshot.taken_at.elapsed().as_secs_f64(),
            controls,
        )
    };

    let paragraph = Paragraph::new(status).style(Style::default().add_modifier(Modifier::DIM));
    frame.render_widget(paragraph, area);
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the current view.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        Line::from(vec![Span::styled(
            " Navigation",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from("  ↑/↓ j/k     Move selection"),
        Line::from("  PgUp/PgDn   Jump 10 rows"),
        Line::from("  Home/End    Jump to first/last"),
        Line::from("  Enter       Workspace detail"),
        Line::from("  Esc         Go back"),
        Line::from(""),
        Line::from(vec![Span::styled(
            " Table",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from("  /         Start filter"),
        Line::from("  c         Clear filter"),
        Line::from("  s         Cycle sort column"),
        Line::from("  S         Toggle sort direction"),
        Line::from("  g         Show/hide gone workspaces"),
        Line::from("  l         Show/hide activity feed"),
        Line::from(""),
        Line::from(vec![Span::styled(
            " Sampling",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from("  p         Pause/resume polling"),
        Line::from("  r         Refresh now"),
        Line::from("  + / -     Poll faster/slower"),
        Line::from(""),
        Line::from(vec![Span::styled(
            " Actions",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from("  x         Kill selected workspace"),
        Line::from("  n         Nudge selected workspace"),
        Line::from("  q         Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    // Center the help overlay - responsive to terminal size
    let help_width = 44u16.min(area.width.saturating_sub(4));
    let help_height = 32u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(help_width)) / 2;
    let y = area.y + (area.height.saturating_sub(help_height)) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    // Clear the area behind the help
    frame.render_widget(Clear, help_area);
    frame.render_widget(paragraph, help_area);
}

/// Format a CPU fraction for display (1.0 = one full core).
pub fn format_cpu(cpu: Option<f64>) -> String {
    match cpu {
        Some(c) => format!("{:.0}%", c * 100.0),
        None => "-".to_string(),
    }
}

/// Format a byte count with binary suffixes (e.g., 1536 -> "1.5K").
pub fn format_bytes(bytes: Option<u64>) -> String {
    const KIB: f64 = 1024.0;
    let Some(bytes) = bytes else {
        return "-".to_string();
    };
    let b = bytes as f64;
    if b >= KIB * KIB * KIB {
        format!("{:.1}G", b / (KIB * KIB * KIB))
    } else if b >= KIB * KIB {
        format!("{:.1}M", b / (KIB * KIB))
    } else if b >= KIB {
        format!("{:.1}K", b / KIB)
    } else {
        format!("{}B", bytes)
    }
}

/// Format an optional age for a table cell.
pub fn format_opt_age(age: Option<Duration>) -> String {
    match age {
        Some(age) => format_age(age),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_cpu() {
        assert_eq!(format_cpu(None), "-");
        assert_eq!(format_cpu(Some(0.0)), "0%");
        assert_eq!(format_cpu(Some(1.0)), "100%");
        assert_eq!(format_cpu(Some(2.5)), "250%");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(None), "-");
        assert_eq!(format_bytes(Some(512)), "512B");
        assert_eq!(format_bytes(Some(1536)), "1.5K");
        assert_eq!(format_bytes(Some(64 << 20)), "64.0M");
        assert_eq!(format_bytes(Some(3 << 30)), "3.0G");
    }

    #[test]
    fn test_format_opt_age() {
        assert_eq!(format_opt_age(None), "-");
        assert_eq!(format_opt_age(Some(Duration::from_secs(90))), "1m");
    }
}
