use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use ratatui::Frame;

use crate::app::App;
use crate::types::Location;
use crate::ui::{title_or_untitled, truncate};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Locations ({}) ", app.locations.len()));

    if app.locations.is_empty() {
        let message = if app.locations.is_loading() {
            "Loading locations..."
        } else if app.locations.is_exhausted() {
            "The API returned no locations"
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
        .locations
        .items()
        .iter()
        .enumerate()
        .map(|(i, location)| card(location, i == app.location_index, w))
        .collect();

    if app.locations.is_loading() {
        items.push(ListItem::new(Line::from(Span::styled(
            "Loading more...",
            Style::default().fg(Color::DarkGray),
        ))));
    }

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray));

    let mut state = ListState::default();
    state.select(Some(app.location_index));

    frame.render_stateful_widget(list, area, &mut state);
}

fn card(location: &Location, selected: bool, width: usize) -> ListItem<'static> {
    let title_style = if selected {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };

    let mut title = vec![Span::styled(
        truncate(title_or_untitled(&location.name), width),
        title_style,
    )];
    if location.image_path.is_some() {
        title.push(Span::styled(" [img]", Style::default().fg(Color::DarkGray)));
    }

    let mut lines = vec![Line::from(title)];

    if let Some(town) = &location.town {
        lines.push(field("Town", town.clone()));
    }
    if let Some(purpose) = &location.purpose {
        lines.push(field("Use", truncate(purpose, width)));
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
