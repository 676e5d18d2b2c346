//! Application state for the interactive result browser
//!
//! This module holds the browser state and handles keyboard input and
//! transitions between the result list, the result detail view and the
//! alias prompt. It performs no I/O: saving an alias is queued for the
//! event loop through [`App::take_pending_alias`].

use crossterm::event::{KeyCode, KeyEvent};

use crate::search::SearchResult;

/// Maximum scroll offset before the renderer clamps to the real content height
const MAX_SCROLL: u16 = u16::MAX;

/// Application state enum representing the current view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppState {
    /// List of result titles
    ResultList,
    /// Question and accepted answer for the result at this index
    ResultDetail(usize),
    /// Typing an alias for the result at `index`
    AliasPrompt {
        index: usize,
        input: String,
        from_detail: bool,
    },
}

/// An alias the user confirmed, waiting to be written to the cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAlias {
    pub alias: String,
    pub index: usize,
}

/// Main application struct managing browser state
pub struct App {
    /// Current application state/view
    pub state: AppState,
    /// Query the results were found for
    pub query: String,
    pub results: Vec<SearchResult>,
    /// Index of currently selected result in list view
    pub selected_index: usize,
    /// Flag indicating the application should quit
    pub should_quit: bool,
    /// Flag to show help overlay
    pub show_help: bool,
    /// Scroll offset for result detail view
    pub detail_scroll_offset: u16,
    /// One-line feedback shown in the footer until the next key press
    pub status_message: Option<String>,
    /// Whether a cache is available to save aliases into
    pub can_save_alias: bool,
    pending_alias: Option<PendingAlias>,
}

impl App {
    pub fn new(query: impl Into<String>, results: Vec<SearchResult>) -> Self {
        Self {
            state: AppState::ResultList,
            query: query.into(),
            results,
            selected_index: 0,
            should_quit: false,
            show_help: false,
            detail_scroll_offset: 0,
            status_message: None,
            can_save_alias: true,
            pending_alias: None,
        }
    }

    /// Disables or enables the `s` (save alias) command
    pub fn with_alias_saving(mut self, enabled: bool) -> Self {
        self.can_save_alias = enabled;
        self
    }

    pub fn result_count(&self) -> usize {
        self.results.len()
    }

    /// Returns the currently selected result, if any
    pub fn selected_result(&self) -> Option<&SearchResult> {
        self.results.get(self.selected_index)
    }

    /// Takes the alias confirmed in the prompt, if any
    pub fn take_pending_alias(&mut self) -> Option<PendingAlias> {
        self.pending_alias.take()
    }

    /// Sets the footer message
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    /// Handles keyboard input based on current state
    pub fn handle_key(&mut self, key_event: KeyEvent) {
        self.status_message = None;

        // Help overlay intercepts all keys when shown
        if self.show_help {
            match key_event.code {
                KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q') => {
                    self.show_help = false;
                }
                _ => {}
            }
            return;
        }

        match self.state {
            AppState::ResultList => match key_event.code {
                KeyCode::Char('q') | KeyCode::Esc => {
                    self.should_quit = true;
                }
                KeyCode::Up | KeyCode::Char('k') => {
                    self.move_selection_up();
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    self.move_selection_down();
                }
                KeyCode::Enter => {
                    if self.selected_result().is_some() {
                        self.state = AppState::ResultDetail(self.selected_index);
                    }
                }
                KeyCode::Char('s') => {
                    self.start_alias_prompt(self.selected_index, false);
                }
                KeyCode::Char('?') => {
                    self.show_help = true;
                }
                _ => {}
            },
            AppState::ResultDetail(index) => match key_event.code {
                KeyCode::Char('q') => {
                    self.should_quit = true;
                }
                KeyCode::Esc | KeyCode::Char('b') => {
                    self.detail_scroll_offset = 0;
                    self.state = AppState::ResultList;
                }
                KeyCode::Char('j') | KeyCode::Down => {
                    self.scroll_down();
                }
                KeyCode::Char('k') | KeyCode::Up => {
                    self.scroll_up();
                }
                KeyCode::Char('g') => {
                    self.scroll_to_top();
                }
                KeyCode::Char('G') => {
                    self.scroll_to_bottom();
                }
                KeyCode::Char('s') => {
                    self.start_alias_prompt(index, true);
                }
                KeyCode::Char('?') => {
                    self.show_help = true;
                }
                _ => {}
            },
            AppState::AliasPrompt { .. } => self.handle_prompt_key(key_event.code),
        }
    }

    fn start_alias_prompt(&mut self, index: usize, from_detail: bool) {
        if index >= self.results.len() {
            return;
        }
        if !self.can_save_alias {
            self.set_status("Caching is disabled; cannot save an alias");
            return;
        }
        self.state = AppState::AliasPrompt {
            index,
            input: String::new(),
            from_detail,
        };
    }

    fn handle_prompt_key(&mut self, code: KeyCode) {
        let AppState::AliasPrompt {
            index,
            ref mut input,
            from_detail,
        } = self.state
        else {
            return;
        };

        match code {
            KeyCode::Char(c) => {
                input.push(c);
                return;
            }
            KeyCode::Backspace => {
                input.pop();
                return;
            }
            KeyCode::Enter => {
                let alias = input.trim().to_string();
                if alias.is_empty() {
                    self.set_status("Alias name must not be empty");
                } else {
                    self.pending_alias = Some(PendingAlias { alias, index });
                }
            }
            KeyCode::Esc => {}
            _ => return,
        }

        self.state = if from_detail {
            AppState::ResultDetail(index)
        } else {
            AppState::ResultList
        };
    }

    /// Moves the selection up in the list, wrapping to bottom if at top
    fn move_selection_up(&mut self) {
        let count = self.result_count();
        if count == 0 {
            return;
        }
        if self.selected_index == 0 {
            self.selected_index = count - 1;
        } else {
            self.selected_index -= 1;
        }
    }

    /// Moves the selection down in the list, wrapping to top if at bottom
    fn move_selection_down(&mut self) {
        let count = self.result_count();
        if count == 0 {
            return;
        }
        self.selected_index = (self.selected_index + 1) % count;
    }

    pub fn scroll_up(&mut self) {
        self.detail_scroll_offset = self.detail_scroll_offset.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        self.detail_scroll_offset = self.detail_scroll_offset.saturating_add(1);
    }

    pub fn scroll_to_top(&mut self) {
        self.detail_scroll_offset = 0;
    }

    /// Sets the offset past any real content; the renderer clamps it
    pub fn scroll_to_bottom(&mut self) {
        self.detail_scroll_offset = MAX_SCROLL;
    }
}
