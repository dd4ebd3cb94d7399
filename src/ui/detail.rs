//! Detail overlay rendering.
//!
//! Displays a modal overlay with detailed information about the selected
//! workspace.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::App;
use crate::ui::common::{format_bytes, format_cpu, format_opt_age};

/// Minimum width required for the detail overlay to render properly.
const MIN_OVERLAY_WIDTH: u16 = 50;
/// Minimum height required for the detail overlay to render properly.
const MIN_OVERLAY_HEIGHT: u16 = 16;

/// Render the workspace detail as a modal overlay.
///
/// Shows the full derived state for the selected workspace, including
/// session identity, stall diagnosis, and resource usage.
pub fn render_overlay(frame: &mut Frame, app: &App, area: Rect) {
    // Skip rendering if terminal is too small for the overlay
    if area.width < MIN_OVERLAY_WIDTH || area.height < MIN_OVERLAY_HEIGHT {
        return;
    }

    let Some(workspace) = app.selected_workspace() else {
        return;
    };

    let overlay_area = overlay_rect(area);

    // Clear the area behind the overlay
    frame.render_widget(Clear, overlay_area);

    let chunks = Layout::vertical([
        Constraint::Length(5), // Header with identity
        Constraint::Min(8),    // Session and resource fields
        Constraint::Length(1), // Footer
    ])
    .split(overlay_area);

    // ===== HEADER SECTION =====
    let status_style = app.theme.status_style(workspace.status);
    let header_lines = vec![
        Line::from(vec![Span::styled(
            format!(" {} ", workspace.id),
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from(""),
        Line::from(vec![
            Span::raw(" Rig: "),
            Span::styled(
                workspace.rig.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw("    State: "),
            Span::styled(
                format!("{} {}", workspace.state.icon(), workspace.state.label()),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw("    Status: "),
            Span::styled(
                format!("{} {}", workspace.status.symbol(), workspace.status.label()),
                status_style.add_modifier(Modifier::BOLD),
            ),
        ]),
    ];

    let header_block = Block::default()
        .title(" Workspace Detail ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let header = Paragraph::new(header_lines).block(header_block);
    frame.render_widget(header, chunks[0]);

    // ===== CONTENT SECTION (Session and Resources) =====
    let content_chunks = Layout::vertical([
        Constraint::Percentage(50), // Session
        Constraint::Percentage(50), // Resources
    ])
    .split(chunks[1]);

    // ----- SESSION -----
    let mut session_lines = vec![
        field("Name", workspace.name.clone()),
        field(
            "Session",
            workspace.session_id.clone().unwrap_or_else(|| "-".into()),
        ),
        field("Attached", if workspace.attached { "yes" } else { "no" }.into()),
        field("Bead", workspace.bead.clone().unwrap_or_else(|| "-".into())),
    ];
    if let Some(reason) = &workspace.stall_reason {
        session_lines.push(Line::from(vec![
            Span::styled(" Stalled:  ", Style::default().add_modifier(Modifier::DIM)),
            Span::styled(
                reason.clone(),
                Style::default()
                    .fg(app.theme.stalled)
                    .add_modifier(Modifier::BOLD),
            ),
        ]));
    }
    if workspace.missed_polls > 0 {
        session_lines.push(field(
            "Missed",
            format!("{} polls", workspace.missed_polls),
        ));
    }

    let session = Paragraph::new(session_lines).block(
        Block::default()
            .title(" Session ")
            .borders(Borders::ALL)
            .border_type(app.theme.border_type)
            .border_style(Style::default().fg(app.theme.border)),
    );
    frame.render_widget(session, content_chunks[0]);

    // ----- RESOURCES -----
    let first_seen = app
        .first_seen(&workspace.id)
        .map(|cycle| format!("cycle {}", cycle))
        .unwrap_or_else(|| "-".into());

    let resource_lines = vec![
        field("Cpu", format_cpu(workspace.cpu)),
        field("Mem", format_bytes(workspace.mem_bytes)),
        field("Uptime", format_opt_age(workspace.uptime)),
        field("Idle", format_opt_age(workspace.idle_for)),
        field("Seen", first_seen),
    ];

    let resources = Paragraph::new(resource_lines).block(
        Block::default()
            .title(" Resources ")
            .borders(Borders::ALL)
            .border_type(app.theme.border_type)
            .border_style(Style::default().fg(app.theme.border)),
    );
    frame.render_widget(resources, content_chunks[1]);

    // ===== FOOTER =====
    let footer = Paragraph::new(Line::from(vec![Span::styled(
        " Press Esc to close ",
        Style::default().add_modifier(Modifier::DIM),
    )]));
    frame.render_widget(footer, chunks[2]);
}

/// Centered overlay at 80% of the screen, clamped to
/// [MIN_OVERLAY_WIDTH, 80] x [MIN_OVERLAY_HEIGHT, 24]. The proportional
/// term saturates; width * 4 overflows u16 past 16k columns.
fn overlay_rect(area: Rect) -> Rect {
    let overlay_width = (area.width.saturating_mul(4) / 5).clamp(MIN_OVERLAY_WIDTH, 80);
    let overlay_height = (area.height.saturating_mul(4) / 5).clamp(MIN_OVERLAY_HEIGHT, 24);
    let x = area.x + (area.width.saturating_sub(overlay_width)) / 2;
    let y = area.y + (area.height.saturating_sub(overlay_height)) / 2;
    Rect::new(x, y, overlay_width, overlay_height)
}

fn field(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!(" {:<9}", format!("{}:", label)),
            Style::default().add_modifier(Modifier::DIM),
        ),
        Span::raw(value),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlay_fits_wide_terminals() {
        let rect = overlay_rect(Rect::new(0, 0, 900, 50));
        assert_eq!(rect.width, 80);
        assert_eq!(rect.height, 24);
        assert_eq!(rect.x, 410);
        assert_eq!(rect.y, 13);
    }

    #[test]
    fn test_overlay_fills_a_minimum_terminal() {
        let area = Rect::new(0, 0, MIN_OVERLAY_WIDTH, MIN_OVERLAY_HEIGHT);
        assert_eq!(overlay_rect(area), area);
    }
}
