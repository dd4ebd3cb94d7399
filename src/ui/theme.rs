//! Theme configuration for the TUI.
//!
//! Supports light and dark themes with automatic terminal detection.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::block::BorderType;

use crate::model::WorkspaceStatus;

/// Color and style theme for the TUI.
///
/// Use [`Theme::auto_detect()`] for automatic theme selection based on
/// terminal background, or [`Theme::dark()`]/[`Theme::light()`] explicitly.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Accent color for highlights and active elements.
    pub highlight: Color,
    /// Color for active (working) workspaces.
    pub active: Color,
    /// Color for idle workspaces.
    pub idle: Color,
    /// Color for stalled workspaces.
    pub stalled: Color,
    /// Color for terminated workspaces in their grace window.
    pub terminated: Color,
    /// Color for borders and separators.
    pub border: Color,
    /// Style for header rows in tables.
    pub header: Style,
    /// Style for selected/highlighted rows.
    pub selected: Style,
    /// Style for the source outage banner.
    pub banner: Style,
    /// Border style (rounded, plain, etc.).
    pub border_type: BorderType,
}

impl Theme {
    /// Create a dark theme suitable for dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            highlight: Color::Cyan,
            active: Color::Green,
            idle: Color::Gray,
            stalled: Color::Yellow,
            terminated: Color::Red,
            border: Color::Gray,
            header: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            selected: Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD),
            banner: Style::default().fg(Color::Black).bg(Color::Red).add_modifier(Modifier::BOLD),
            border_type: BorderType::Rounded,
        }
    }

    /// Create a light theme suitable for light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            highlight: Color::Blue,
            active: Color::Green,
            idle: Color::DarkGray,
            stalled: Color::Yellow,
            terminated: Color::Red,
            border: Color::DarkGray,
            header: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            selected: Style::default().bg(Color::LightBlue).add_modifier(Modifier::BOLD),
            banner: Style::default().fg(Color::White).bg(Color::Red).add_modifier(Modifier::BOLD),
            border_type: BorderType::Rounded,
        }
    }

    /// Auto-detect based on terminal background
    pub fn auto_detect() -> Self {
        // Use terminal-light crate to detect background luminance
        match terminal_light::luma() {
            Ok(luma) if luma > 0.5 => Self::light(),
            _ => Self::dark(),
        }
    }

    /// Get style for a workspace status
    pub fn status_style(&self, status: WorkspaceStatus) -> Style {
        match status {
            WorkspaceStatus::Active => Style::default().fg(self.active),
            WorkspaceStatus::Idle => Style::default().fg(self.idle),
            WorkspaceStatus::Stalled => {
                Style::default().fg(self.stalled).add_modifier(Modifier::BOLD)
            }
            WorkspaceStatus::Terminated => {
                Style::default().fg(self.terminated).add_modifier(Modifier::DIM)
            }
        }
    }
}
