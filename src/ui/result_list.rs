//! Result list screen rendering
//!
//! Shows one line per search result: title, question date and score. The
//! selected result is marked with a cursor and kept in view.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::render_footer;
use crate::app::App;
use crate::render::{format_date, NO_RESULTS_MESSAGE};

/// Color for a vote count
fn score_color(score: i64) -> Color {
    if score >= 100 {
        Color::Green
    } else if score > 0 {
        Color::Yellow
    } else {
        Color::Red
    }
}

/// First row to draw so that `selected` stays inside `height` rows
fn scroll_start(selected: usize, height: usize) -> usize {
    if height == 0 {
        return 0;
    }
    selected.saturating_sub(height - 1)
}

/// Renders the result list screen
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Header
            Constraint::Min(3),    // Results
            Constraint::Length(1), // Help text
        ])
        .split(area);

    render_header(frame, app, chunks[0]);
    render_list(frame, app, chunks[1]);
    render_footer(
        frame,
        chunks[2],
        app,
        &[
            ("↑/↓", "Navigate"),
            ("Enter", "Open"),
            ("s", "Save alias"),
            ("?", "Help"),
            ("q", "Quit"),
        ],
    );
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let lines = vec![
        Line::from(vec![
            Span::styled(
                "STACKX",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled("Search results for query: ", Style::default().fg(Color::Green)),
            Span::styled(
                format!("'{}'", app.query),
                Style::default()
                    .fg(Color::Magenta)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(Span::styled(
            "─".repeat(area.width.saturating_sub(2) as usize),
            Style::default().fg(Color::DarkGray),
        )),
    ];

    frame.render_widget(Paragraph::new(lines), area);
}

fn render_list(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(format!(" Results ({}) ", app.result_count()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    if app.results.is_empty() {
        let paragraph = Paragraph::new(Line::from(Span::styled(
            NO_RESULTS_MESSAGE,
            Style::default().fg(Color::DarkGray),
        )))
        .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let visible = block.inner(area).height as usize;
    let start = scroll_start(app.selected_index, visible);

    let lines: Vec<Line> = app
        .results
        .iter()
        .enumerate()
        .skip(start)
        .take(visible)
        .map(|(index, result)| {
            let is_selected = index == app.selected_index;
            let cursor = if is_selected { "\u{25B8} " } else { "  " }; // ▸ or space
            let title_style = if is_selected {
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };

            Line::from(vec![
                Span::styled(cursor, Style::default().fg(Color::Cyan)),
                Span::styled(format!("{:>3}. ", index + 1), Style::default().fg(Color::DarkGray)),
                Span::styled(result.question.title.clone(), title_style),
                Span::raw(" "),
                Span::styled(
                    format!("[{}", format_date(result.question.creation_date)),
                    Style::default().fg(Color::Gray),
                ),
                Span::styled(" | ", Style::default().fg(Color::DarkGray)),
                Span::styled(
                    format!("{} votes]", result.question.score),
                    Style::default().fg(score_color(result.question.score)),
                ),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
