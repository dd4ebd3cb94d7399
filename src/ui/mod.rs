//! Terminal UI rendering.
//!
//! Pure functions from application state to a ratatui frame. Nothing here
//! mutates the app; event handling lives in [`crate::events`].

use ratatui::{
    layout::{Constraint, Layout},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

pub mod common;
pub mod detail;
pub mod feed;
pub mod table;
pub mod theme;

pub use theme::Theme;

use crate::app::App;

/// Minimum terminal width for a usable layout.
const MIN_WIDTH: u16 = 60;
/// Minimum terminal height for a usable layout.
const MIN_HEIGHT: u16 = 12;

/// Render one frame of the full interface.
pub fn draw(frame: &mut Frame, app: &App) {
    let area = frame.area();

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let message = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "Terminal too small",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                format!("Need at least {}x{}", MIN_WIDTH, MIN_HEIGHT),
                Style::default().add_modifier(Modifier::DIM),
            )),
        ])
        .centered();
        frame.render_widget(message, area);
        return;
    }

    let banner_height = if app.source_banner().is_some() { 1 } else { 0 };
    let feed_height = if app.show_feed {
        app.feed_lines as u16 + 2
    } else {
        0
    };

    let chunks = Layout::vertical([
        Constraint::Length(1),           // Header
        Constraint::Length(banner_height), // Source banner, when failing
        Constraint::Min(5),              // Workspace table
        Constraint::Length(feed_height), // Activity feed
        Constraint::Length(1),           // Status bar
    ])
    .split(area);

    common::render_header(frame, app, chunks[0]);
    common::render_banner(frame, app, chunks[1]);
    table::render(frame, app, chunks[2]);
    if app.show_feed {
        feed::render(frame, app, chunks[3]);
    }
    common::render_status_bar(frame, app, chunks[4]);

    // Overlays render last so they sit on top of everything else
    if app.show_detail {
        detail::render_overlay(frame, app, area);
    }
    if app.show_help {
        common::render_help(frame, app, area);
    }
}
