//! UI rendering for the interactive result browser
//!
//! Each screen lives in its own module; [`render`] picks the one matching
//! the current [`AppState`] and draws overlays on top.

pub mod alias_prompt;
pub mod help_overlay;
pub mod result_detail;
pub mod result_list;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::app::{App, AppState};

/// Renders the UI based on the current application state
pub fn render(frame: &mut Frame, app: &mut App) {
    match app.state.clone() {
        AppState::ResultList => result_list::render(frame, app),
        AppState::ResultDetail(index) => result_detail::render(frame, app, index),
        AppState::AliasPrompt {
            index,
            input,
            from_detail,
        } => {
            if from_detail {
                result_detail::render(frame, app, index);
            } else {
                result_list::render(frame, app);
            }
            let title = app
                .results
                .get(index)
                .map(|r| r.question.title.as_str())
                .unwrap_or_default();
            alias_prompt::render(frame, title, &input);
        }
    }

    if app.show_help {
        help_overlay::render(frame);
    }
}

/// Renders the bottom line: the status message if set, key hints otherwise
pub(crate) fn render_footer(frame: &mut Frame, area: Rect, app: &App, keys: &[(&str, &str)]) {
    let line = match app.status_message {
        Some(ref message) => Line::from(Span::styled(
            message.clone(),
            Style::default().fg(Color::Green),
        )),
        None => Line::from(
            keys.iter()
                .flat_map(|(key, action)| {
                    [
                        Span::styled(key.to_string(), Style::default().fg(Color::Yellow)),
                        Span::raw(format!(" {}  ", action)),
                    ]
                })
                .collect::<Vec<_>>(),
        ),
    };

    let paragraph = Paragraph::new(line).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(paragraph, area);
}

/// Helper function to create a centered rect
pub(crate) fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length((area.height.saturating_sub(height)) / 2),
            Constraint::Length(height),
            Constraint::Length((area.height.saturating_sub(height)) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length((area.width.saturating_sub(width)) / 2),
            Constraint::Length(width),
            Constraint::Length((area.width.saturating_sub(width)) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
