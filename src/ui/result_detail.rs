//! Result detail screen UI
//!
//! Renders the question and its accepted answer as one scrollable page.
//! Bodies are wrapped to the frame width before layout, so the number of
//! lines is known and the scroll offset can be clamped here.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::render_footer;
use crate::app::App;
use crate::render::{format_date, html_to_text};
use crate::search::SearchResult;

/// Color scheme for the detail page
mod colors {
    use ratatui::style::Color;

    /// Question section headers
    pub const QUESTION: Color = Color::Green;
    /// Answer section headers
    pub const ANSWER: Color = Color::Blue;
    /// Primary text
    pub const PRIMARY: Color = Color::White;
    pub const SECONDARY: Color = Color::Gray;
}

/// Builds every line of the page for a content area `width` columns wide
pub fn detail_lines(result: &SearchResult, width: u16) -> Vec<Line<'static>> {
    let width = (width as usize).max(20);
    let rule = "─".repeat(width);
    let question = &result.question;
    let answer = &result.answer;

    let mut lines = vec![
        Line::from(Span::styled(
            format!(
                "Question | {} | {} votes",
                format_date(question.creation_date),
                question.score
            ),
            Style::default()
                .fg(colors::QUESTION)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            question.title.clone(),
            Style::default()
                .fg(colors::PRIMARY)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    lines.extend(body_lines(&question.body, width));
    lines.push(Line::from(Span::styled(
        rule,
        Style::default().fg(colors::SECONDARY),
    )));
    lines.push(Line::from(Span::styled(
        format!(
            "Answer | {} | {} votes",
            format_date(answer.creation_date),
            answer.score
        ),
        Style::default()
            .fg(colors::ANSWER)
            .add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(""));
    lines.extend(body_lines(&answer.body, width));
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("Question link: ", Style::default().fg(colors::QUESTION)),
        Span::raw(question.link.clone()),
    ]));

    lines
}

fn body_lines(html: &str, width: usize) -> Vec<Line<'static>> {
    html_to_text(html, width)
        .lines()
        .map(|line| Line::from(line.to_string()))
        .collect()
}

/// Largest scroll offset that still fills a `height`-row viewport
fn max_scroll(line_count: usize, height: u16) -> u16 {
    u16::try_from(line_count)
        .unwrap_or(u16::MAX)
        .saturating_sub(height)
}

/// Renders the result detail screen for the result at `index`
pub fn render(frame: &mut Frame, app: &mut App, index: usize) {
    let area = frame.area();

    let Some(result) = app.results.get(index) else {
        render_missing(frame, area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Span::styled(
            format!(" {}/{} ", index + 1, app.results.len()),
            Style::default().fg(colors::PRIMARY),
        ));
    let inner = block.inner(chunks[0]);
    let lines = detail_lines(result, inner.width);

    // Clamp scroll offset to the real content height
    let max_scroll = max_scroll(lines.len(), inner.height);
    if app.detail_scroll_offset > max_scroll {
        app.detail_scroll_offset = max_scroll;
    }

    let paragraph = Paragraph::new(lines)
        .block(block)
        .scroll((app.detail_scroll_offset, 0));
    frame.render_widget(paragraph, chunks[0]);

    render_footer(
        frame,
        chunks[1],
        app,
        &[
            ("j/k", "Scroll"),
            ("g/G", "Top/Bottom"),
            ("Esc/b", "Back"),
            ("s", "Save alias"),
            ("?", "Help"),
            ("q", "Quit"),
        ],
    );
}

fn render_missing(frame: &mut Frame, area: Rect) {
    let paragraph = Paragraph::new("Result not available. Press Esc to go back.")
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(paragraph, area);
}
