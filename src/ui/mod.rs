mod panel;
mod picker;

pub use picker::render as render_picker;

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Tabs};
use ratatui::Frame;

use crate::state::{AppState, StatusTag};
use crate::view::{self, Detail, StatusLine};

pub fn render(frame: &mut Frame, state: &AppState) {
    let layout = view::render(state);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, &layout.header, chunks[0]);
    render_body(frame, &layout, chunks[1]);
    render_status_bar(frame, &layout.status, chunks[2]);
}

fn render_header(frame: &mut Frame, title: &str, area: Rect) {
    let header = Paragraph::new(Line::from(vec![Span::styled(
        title.to_string(),
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )]))
    .style(Style::default().bg(Color::DarkGray));

    frame.render_widget(header, area);
}

fn render_body(frame: &mut Frame, layout: &view::Layout, area: Rect) {
    let detail_area = match (&layout.repos, &layout.detail) {
        (Some(repos), Some(_)) => {
            let chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Length(repo_pane_width(area.width)), Constraint::Min(0)])
                .split(area);
            panel::render(frame, repos, chunks[0]);
            chunks[1]
        }
        (Some(repos), None) => {
            panel::render(frame, repos, area);
            return;
        }
        (None, _) => area,
    };

    let Some(detail) = &layout.detail else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(detail_area);

    if let Some(tabs) = &layout.tabs {
        let tabs = Tabs::new(tabs.titles.clone())
            .block(Block::default().borders(Borders::ALL))
            .select(tabs.active)
            .style(Style::default().fg(Color::Gray))
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            );
        frame.render_widget(tabs, chunks[0]);
    }

    match detail {
        Detail::List(list) => panel::render(frame, list, chunks[1]),
        Detail::Split { list, side } => {
            let split = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
                .split(chunks[1]);
            panel::render(frame, list, split[0]);
            panel::render(frame, side, split[1]);
        }
    }
}

/// A third of the width, never narrower than 20 columns.
fn repo_pane_width(total: u16) -> u16 {
    (total.saturating_sub(10) / 3).max(20).min(total)
}

fn render_status_bar(frame: &mut Frame, status: &StatusLine, area: Rect) {
    let line = match status {
        StatusLine::Filter(query) => Line::from(vec![
            Span::styled(
                format!("Filter: {}", query),
                Style::default().fg(Color::Yellow),
            ),
            Span::styled(
                "  (esc: cancel, enter: apply)",
                Style::default().fg(Color::Gray),
            ),
        ]),
        StatusLine::Message(message) => {
            let color = match message.tag {
                StatusTag::Info => Color::Green,
                StatusTag::Error(_) => Color::Red,
            };
            Line::from(vec![Span::styled(
                message.text.clone(),
                Style::default().fg(color),
            )])
        }
        StatusLine::Help(help) => {
            Line::from(vec![Span::styled(*help, Style::default().fg(Color::Gray))])
        }
    };

    let status_bar = Paragraph::new(line).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(status_bar, area);
}
