use chrono::NaiveDate;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use ratatui::Frame;

use crate::app::App;
use crate::types::Episode;
use crate::ui::{title_or_untitled, truncate};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Episodes ({}) ", app.episodes.len()));

    if app.episodes.is_empty() {
        let message = if app.episodes.is_loading() {
            "Loading episodes..."
        } else if app.episodes.is_exhausted() {
            "The API returned no episodes"
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
        .episodes
        .items()
        .iter()
        .enumerate()
        .map(|(i, episode)| card(episode, i == app.episode_index, w))
        .collect();

    if app.episodes.is_loading() {
        items.push(ListItem::new(Line::from(Span::styled(
            "Loading more...",
            Style::default().fg(Color::DarkGray),
        ))));
    }

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray));

    let mut state = ListState::default();
    state.select(Some(app.episode_index));

    frame.render_stateful_widget(list, area, &mut state);
}

fn card(episode: &Episode, selected: bool, width: usize) -> ListItem<'static> {
    let title_style = if selected {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };

    let mut title = Vec::new();
    if let Some(code) = episode_code(episode) {
        title.push(Span::styled(code, Style::default().fg(Color::Cyan)));
        title.push(Span::raw(" "));
    }
    title.push(Span::styled(
        truncate(title_or_untitled(&episode.name), width),
        title_style,
    ));
    if episode.image_path.is_some() {
        title.push(Span::styled(" [img]", Style::default().fg(Color::DarkGray)));
    }

    let mut lines = vec![Line::from(title)];

    if let Some(airdate) = &episode.airdate {
        lines.push(Line::from(vec![
            Span::styled("  Aired: ", Style::default().fg(Color::DarkGray)),
            Span::raw(format_airdate(airdate)),
        ]));
    }
    if let Some(synopsis) = &episode.synopsis {
        lines.push(Line::from(Span::styled(
            format!("  {}", truncate(synopsis, width.saturating_sub(2))),
            Style::default().fg(Color::Gray),
        )));
    }

    lines.push(Line::raw(""));
    ListItem::new(lines)
}

/// `S02E07`-style code, when both season and episode number are known.
fn episode_code(episode: &Episode) -> Option<String> {
    match (episode.season, episode.episode_number) {
        (Some(season), Some(number)) => Some(format!("S{:02}E{:02}", season, number)),
        _ => None,
    }
}

/// Air dates arrive as `1989-12-17`; anything else is shown verbatim.
fn format_airdate(raw: &str) -> String {
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => date.format("%d %b %Y").to_string(),
        Err(_) => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn episode(season: Option<u32>, number: Option<u32>) -> Episode {
        Episode {
            name: "Simpsons Roasting on an Open Fire".to_string(),
            season,
            episode_number: number,
            airdate: None,
            synopsis: None,
            image_path: None,
        }
    }

    #[test]
    fn episode_code_pads_both_numbers() {
        assert_eq!(episode_code(&episode(Some(1), Some(5))).as_deref(), Some("S01E05"));
        assert_eq!(episode_code(&episode(Some(12), Some(3))).as_deref(), Some("S12E03"));
    }

    #[test]
    fn episode_code_needs_both_fields() {
        assert_eq!(episode_code(&episode(Some(1), None)), None);
        assert_eq!(episode_code(&episode(None, Some(5))), None);
    }

    #[test]
    fn airdate_is_reformatted() {
        assert_eq!(format_airdate("1989-12-17"), "17 Dec 1989");
    }

    #[test]
    fn malformed_airdate_passes_through() {
        assert_eq!(format_airdate("someday"), "someday");
    }
}
