use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use ratatui::Frame;

use crate::app::App;
use crate::types::Character;
use crate::ui::{title_or_untitled, truncate};

/// At most this many famous phrases are shown per card.
const MAX_PHRASES: usize = 3;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Characters ({}) ", app.characters.len()));

    if app.characters.is_empty() {
        let message = if app.characters.is_loading() {
            "Loading characters..."
        } else if app.characters.is_exhausted() {
            "The API returned no characters"
        } else {
            "Nothing loaded yet"
        };
        let empty = Paragraph::new(message)
            .block(block)
            .style(Style::default().fg(Color::Gray));
        frame.render_widget(empty, area);
        return;
    }

    let w = area.width.saturating_sub(4) as usize;

    let mut items: Vec<ListItem> = app
        .characters
        .items()
        .iter()
        .enumerate()
        .map(|(i, character)| card(character, i == app.character_index, w))
        .collect();

    if app.characters.is_loading() {
        items.push(ListItem::new(Line::from(Span::styled(
            "Loading more...",
            Style::default().fg(Color::DarkGray),
        ))));
    }

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray));

    let mut state = ListState::default();
    state.select(Some(app.character_index));

    frame.render_stateful_widget(list, area, &mut state);
}

fn card(character: &Character, selected: bool, width: usize) -> ListItem<'static> {
    let title_style = if selected {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };

    let mut title = vec![Span::styled(
        truncate(title_or_untitled(&character.name), width),
        title_style,
    )];
    if let Some(status) = &character.status {
        let status_color = match status.as_str() {
            "Alive" => Color::Green,
            "Deceased" => Color::Red,
            _ => Color::Gray,
        };
        title.push(Span::raw(" "));
        title.push(Span::styled(
            format!("[{}]", status),
            Style::default().fg(status_color),
        ));
    }
    if character.portrait_path.is_some() {
        title.push(Span::styled(" [img]", Style::default().fg(Color::DarkGray)));
    }

    let mut lines = vec![Line::from(title)];

    if let Some(age) = character.age {
        lines.push(field("Age", format!("{} years", age)));
    }
    if let Some(occupation) = &character.occupation {
        lines.push(field("Occupation", truncate(occupation, width)));
    }
    if let Some(gender) = &character.gender {
        lines.push(field("Gender", gender.clone()));
    }

    for phrase in character.phrases.iter().take(MAX_PHRASES) {
        lines.push(Line::from(Span::styled(
            format!("  \"{}\"", truncate(phrase, width.saturating_sub(4))),
            Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::ITALIC),
        )));
    }

    lines.push(Line::raw(""));
    ListItem::new(lines)
}

fn field(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {}: ", label), Style::default().fg(Color::DarkGray)),
        Span::raw(value),
    ])
}
