//! Workspace table rendering.
//!
//! Displays the filtered, sorted workspace table with per-status styling
//! and the sort indicator on the active column header.

use ratatui::{
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::app::App;
use crate::model::ReportedState;
use crate::ui::common::{format_bytes, format_cpu, format_opt_age};
use crate::ui::Theme;
use crate::view::SortKey;

/// Render the workspace table.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let rows_data = app.visible();
    let total = app.snapshot.len();

    // Build title with filter info
    let filter_info = if app.filter_active {
        format!(" /{}_", app.filter_text)
    } else if !app.filter_text.is_empty() {
        format!(" /{}/ [c:clear]", app.filter_text)
    } else {
        String::new()
    };

    let selected = app.selected.min(rows_data.len().saturating_sub(1));
    let position_info = if !rows_data.is_empty() {
        format!(" [{}/{}]", selected + 1, rows_data.len())
    } else {
        String::new()
    };

    let title = format!(
        " Workspaces ({}/{}) [s:sort {}{}]{}{} ",
        rows_data.len(),
        total,
        app.sort_key.label(),
        app.sort_direction.arrow(),
        filter_info,
        position_info
    );

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    // An empty view is a real state, not an error
    if rows_data.is_empty() {
        let message = if app.filter_text.is_empty() {
            "  no workspaces"
        } else {
            "  no workspaces match"
        };
        let empty = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                message,
                Style::default().add_modifier(Modifier::DIM),
            )),
        ])
        .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let header = Row::new(vec![
        Cell::from(format_header("Workspace", Some(SortKey::Name), app)),
        Cell::from(format_header("St", None, app)),
        Cell::from(format_header("Bead", None, app)),
        Cell::from(format_header("Cpu", Some(SortKey::Cpu), app)),
        Cell::from(format_header("Mem", Some(SortKey::Mem), app)),
        Cell::from(format_header("Up", Some(SortKey::Uptime), app)),
        Cell::from(format_header("Idle", None, app)),
        Cell::from(format_header("Status", Some(SortKey::Status), app)),
    ])
    .height(1)
    .style(app.theme.header);

    let rows: Vec<Row> = rows_data
        .iter()
        .map(|w| {
            let status_style = app.theme.status_style(w.status);
            Row::new(vec![
                Cell::from(w.id.to_string()),
                Cell::from(w.state.icon()).style(state_style(&app.theme, w.state)),
                Cell::from(w.bead.clone().unwrap_or_else(|| "-".to_string())),
                Cell::from(format_cpu(w.cpu)),
                Cell::from(format_bytes(w.mem_bytes)),
                Cell::from(format_opt_age(w.uptime)),
                Cell::from(format_opt_age(w.idle_for)),
                Cell::from(format!("{} {}", w.status.symbol(), w.status.label()))
                    .style(status_style),
            ])
        })
        .collect();

    let widths = [
        Constraint::Fill(3),   // Workspace - gets the largest share
        Constraint::Length(2), // State icon
        Constraint::Fill(2),   // Bead
        Constraint::Length(6), // Cpu
        Constraint::Length(7), // Mem
        Constraint::Length(6), // Up
        Constraint::Length(6), // Idle
        Constraint::Min(10),   // Status
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    state.select(Some(selected));

    frame.render_stateful_widget(table, area, &mut state);
}

fn format_header(name: &str, key: Option<SortKey>, app: &App) -> Span<'static> {
    match key {
        Some(key) if app.sort_key == key => {
            Span::raw(format!("{}{}", name, app.sort_direction.arrow()))
        }
        _ => Span::raw(name.to_string()),
    }
}

fn state_style(theme: &Theme, state: ReportedState) -> Style {
    match state {
        ReportedState::Working => Style::default().fg(theme.active),
        ReportedState::Done => Style::default().fg(theme.highlight),
        ReportedState::Stuck => Style::default().fg(theme.stalled),
        ReportedState::Idle | ReportedState::Unknown => Style::default().fg(theme.idle),
    }
}
