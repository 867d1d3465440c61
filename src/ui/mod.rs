mod characters;
mod episodes;
mod locations;

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Tabs};
use ratatui::Frame;

use crate::action::ExportPhase;
use crate::app::{App, ExportStatus};
use crate::types::ResourceKind;

const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

pub fn render(frame: &mut Frame, app: &App) {
    let error = app.active_error().map(str::to_string);

    let mut constraints = vec![
        Constraint::Length(1),
        Constraint::Length(3),
        Constraint::Min(0),
    ];
    if error.is_some() {
        constraints.push(Constraint::Length(1));
    }
    constraints.push(Constraint::Length(1));

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(frame.area());

    render_header(frame, app, chunks[0]);
    render_tabs(frame, app, chunks[1]);

    match app.tab {
        ResourceKind::Characters => characters::render(frame, app, chunks[2]),
        ResourceKind::Episodes => episodes::render(frame, app, chunks[2]),
        ResourceKind::Locations => locations::render(frame, app, chunks[2]),
    }

    if let Some(message) = error {
        render_error_line(frame, app, message, chunks[3]);
        render_status_bar(frame, app, chunks[4]);
    } else {
        render_status_bar(frame, app, chunks[3]);
    }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let header = Paragraph::new(Line::from(vec![Span::styled(
        format!("cromulent - {}", app.tab),
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )]))
    .style(Style::default().bg(Color::DarkGray));

    frame.render_widget(header, area);
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<String> = ResourceKind::ALL
        .iter()
        .enumerate()
        .map(|(i, kind)| format!("[{}] {}", i + 1, kind))
        .collect();

    let tabs = Tabs::new(titles)
        .block(
            Block::default().borders(Borders::ALL).title(Span::styled(
                " The Simpsons API ",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )),
        )
        .select(
            ResourceKind::ALL
                .iter()
                .position(|kind| *kind == app.tab)
                .unwrap_or(0),
        )
        .style(Style::default().fg(Color::Gray))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    frame.render_widget(tabs, area);
}

fn render_error_line(frame: &mut Frame, app: &App, message: String, area: Rect) {
    let line = Paragraph::new(Line::from(Span::styled(
        format!("✗ Could not load {}: {}", app.tab, message),
        Style::default().fg(Color::Red),
    )));
    frame.render_widget(line, area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let status = if let Some(notice) = &app.notice {
        Line::from(Span::styled(
            notice.clone(),
            Style::default().fg(Color::Cyan),
        ))
    } else {
        match &app.export {
            ExportStatus::Running(phase) => {
                let text = match phase {
                    ExportPhase::FetchingData => "export: fetching data...".to_string(),
                    ExportPhase::Downloading { done, total } => {
                        format!("export: downloading images {done}/{total}")
                    }
                    ExportPhase::Packaging => "export: packaging archive...".to_string(),
                };
                Line::from(Span::styled(
                    format!("{} {}", spinner(app.ticks), text),
                    Style::default().fg(Color::Yellow),
                ))
            }
            ExportStatus::Done { packed, archive } => Line::from(Span::styled(
                format!("Saved {} ({} images)", archive.display(), packed),
                Style::default().fg(Color::Green),
            )),
            ExportStatus::Failed(message) => Line::from(Span::styled(
                format!("Export failed: {}", message),
                Style::default().fg(Color::Red),
            )),
            ExportStatus::Idle => {
                if app.active_loading() {
                    Line::from(Span::styled(
                        format!("{} Loading...", spinner(app.ticks)),
                        Style::default().fg(Color::Yellow),
                    ))
                } else {
                    let help = match app.tab {
                        ResourceKind::Episodes => {
                            "j/k: scroll | Ctrl+d/u: page | Tab/1-3: tabs | o: view image | y: yank url | q: quit"
                        }
                        _ => {
                            "j/k: scroll | Ctrl+d/u: page | Tab/1-3: tabs | o: view image | y: yank url | d: download images | q: quit"
                        }
                    };
                    Line::from(Span::styled(help, Style::default().fg(Color::Gray)))
                }
            }
        }
    };

    let status_bar = Paragraph::new(status).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(status_bar, area);
}

fn spinner(ticks: u64) -> &'static str {
    SPINNER_FRAMES[(ticks as usize) % SPINNER_FRAMES.len()]
}

/// Truncate to `max` characters, appending an ellipsis when cut.
/// Operates on chars, so accented names never split mid-codepoint.
pub(crate) fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{cut}...")
}

/// Display name with the "Untitled" fallback for unnamed items.
pub(crate) fn title_or_untitled(name: &str) -> &str {
    if name.is_empty() {
        "Untitled"
    } else {
        name
    }
}
