use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use ratatui::Frame;

use crate::picker::ProfilePicker;

pub fn render(frame: &mut Frame, picker: &ProfilePicker) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(frame.area());

    let items: Vec<ListItem> = picker
        .entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            if i == picker.cursor {
                ListItem::new(Line::from(vec![
                    Span::styled(
                        "> ",
                        Style::default()
                            .fg(Color::Yellow)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        entry.clone(),
                        Style::default()
                            .fg(Color::Yellow)
                            .add_modifier(Modifier::BOLD),
                    ),
                ]))
            } else {
                ListItem::new(Line::from(format!("  {}", entry)))
            }
        })
        .collect();

    let mut list_state = ListState::default();
    list_state.select(Some(picker.cursor));

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title("Select a workspace"),
        )
        .highlight_style(Style::default().bg(Color::DarkGray));

    frame.render_stateful_widget(list, chunks[0], &mut list_state);

    let help = Paragraph::new(Line::from(vec![Span::styled(
        "j/k: navigate  enter: select  q: quit",
        Style::default().fg(Color::Gray),
    )]))
    .style(Style::default().bg(Color::DarkGray));
    frame.render_widget(help, chunks[1]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    #[test]
    fn marks_hovered_profile() {
        let picker = ProfilePicker {
            entries: vec!["work (acme)".to_string(), "home (me)".to_string()],
            cursor: 1,
        };
        let mut terminal = Terminal::new(TestBackend::new(40, 6)).unwrap();
        terminal.draw(|frame| render(frame, &picker)).unwrap();

        let buffer = terminal.backend().buffer().clone();
        let rows: Vec<String> = buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect())
            .collect();

        assert!(rows[0].contains("Select a workspace"));
        assert!(rows[1].contains("  work (acme)"));
        assert!(rows[2].contains("> home (me)"));
        assert!(rows[5].contains("enter: select"));
    }
}
