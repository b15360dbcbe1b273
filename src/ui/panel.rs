use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use ratatui::Frame;

use crate::view::{BranchTone, Panel, Row, Tag};

const BRANCH_PALETTE: [u8; 12] = [33, 69, 81, 111, 147, 177, 207, 214, 179, 44, 75, 109];

pub fn render(frame: &mut Frame, panel: &Panel, area: Rect) {
    let border = if panel.focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(panel.title.clone());
    if panel.more_above {
        block = block.title(Line::from(" ↑ more ").alignment(Alignment::Right));
    }
    if panel.more_below {
        block = block.title_bottom(Line::from(" ↓ more ").alignment(Alignment::Right));
    }

    if let Some(placeholder) = &panel.placeholder {
        let empty = Paragraph::new(placeholder.clone())
            .block(block)
            .style(Style::default().fg(Color::Gray));
        frame.render_widget(empty, area);
        return;
    }

    let items: Vec<ListItem> = panel.rows.iter().map(list_item).collect();
    let mut list_state = ListState::default();
    list_state.select(panel.rows.iter().position(|r| r.selected));

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray));

    frame.render_stateful_widget(list, area, &mut list_state);
}

fn list_item(row: &Row) -> ListItem<'static> {
    let mut spans = Vec::with_capacity(row.spans.len() + 1);
    if row.selected {
        spans.push(Span::styled(
            "> ",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ));
    }

    spans.extend(row.spans.iter().enumerate().map(|(i, span)| {
        let mut style = tag_style(span.tag);
        // the leading cell of the cursor row carries the selection color
        if row.selected && i == 0 && span.tag == Tag::Plain {
            style = style.fg(Color::Yellow).add_modifier(Modifier::BOLD);
        }
        Span::styled(span.text.clone(), style)
    }));

    ListItem::new(Line::from(spans))
}

fn tag_style(tag: Tag) -> Style {
    let style = Style::default();
    match tag {
        Tag::Plain => style,
        Tag::Muted => style.fg(Color::Gray),
        Tag::Id => style.fg(Color::Cyan),
        Tag::Author => style.fg(Color::Indexed(111)),
        Tag::Heading => style.fg(Color::Cyan).add_modifier(Modifier::BOLD),
        Tag::Success => style.fg(Color::Indexed(42)),
        Tag::Failure => style.fg(Color::Red),
        Tag::Warning => style.fg(Color::Indexed(214)),
        Tag::Running => style.fg(Color::Indexed(220)),
        Tag::Completed => style.fg(Color::Indexed(99)),
        Tag::DiffAdded => style.fg(Color::Green),
        Tag::DiffRemoved => style.fg(Color::Red),
        Tag::DiffHunk => style.fg(Color::Magenta),
        Tag::Branch(tone) => style.fg(branch_color(tone)).add_modifier(Modifier::BOLD),
    }
}

fn branch_color(tone: BranchTone) -> Color {
    match tone {
        BranchTone::Develop => Color::Indexed(45),
        BranchTone::Staging => Color::Indexed(220),
        BranchTone::Main => Color::Indexed(42),
        BranchTone::Master => Color::Indexed(39),
        BranchTone::Missing => Color::Indexed(241),
        BranchTone::Hashed(i) => BRANCH_PALETTE
            .get(usize::from(i))
            .map(|c| Color::Indexed(*c))
            .unwrap_or(Color::Reset),
    }
}
