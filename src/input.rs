//! Keyboard input controller.
//!
//! A modal state machine: single keystrokes either trigger a command in
//! [`InputMode::Normal`] or edit the buffer of the active entry mode.
//! While an entry mode or the help screen is up no other binding fires.

use crate::session::{InputMode, Session, ViewMode, FILTER_CAPACITY, NUMERIC_CAPACITY};
use crate::sort::SortColumn;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Result of dispatching one keystroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Nothing visible changed.
    None,
    /// Session state changed; redraw now.
    Redraw,
    /// Leave the main loop.
    Quit,
}

/// Interprets keystrokes against a [`Session`].
#[derive(Debug, Clone)]
pub struct InputController {
    /// Filter buffer capacity, in characters.
    pub filter_capacity: usize,
    /// Numeric buffer capacity, in characters.
    pub numeric_capacity: usize,
}

impl Default for InputController {
    fn default() -> Self {
        Self::new()
    }
}

impl InputController {
    /// Creates a controller with the standard buffer capacities.
    #[must_use]
    pub fn new() -> Self {
        Self { filter_capacity: FILTER_CAPACITY, numeric_capacity: NUMERIC_CAPACITY }
    }

    /// Handles one key event, mutating `session`.
    pub fn handle_key(&self, session: &mut Session, event: KeyEvent) -> Action {
        // Raw mode swallows SIGINT, so Ctrl+C is handled here in every mode
        if event.modifiers.contains(KeyModifiers::CONTROL) {
            if matches!(event.code, KeyCode::Char('c' | 'C')) {
                session.quit();
                return Action::Quit;
            }
            return Action::None;
        }

        match session.input {
            InputMode::Normal => self.normal(session, event.code),
            InputMode::Help => {
                session.input = InputMode::Normal;
                Action::Redraw
            }
            InputMode::FilterEntry => self.filter_entry(session, event.code),
            InputMode::LimitEntry(_) | InputMode::RefreshEntry(_) => {
                self.numeric_entry(session, event.code)
            }
        }
    }

    fn normal(&self, session: &mut Session, code: KeyCode) -> Action {
        let KeyCode::Char(c) = code else {
            return Action::None;
        };

        match c.to_ascii_lowercase() {
            'q' => {
                session.quit();
                return Action::Quit;
            }
            '/' => {
                session.filter.clear();
                session.input = InputMode::FilterEntry;
            }
            'l' => session.input = InputMode::LimitEntry(String::new()),
            'r' => session.input = InputMode::RefreshEntry(String::new()),
            'h' => session.input = InputMode::Help,
            'f' => {
                session.toggle_freeze();
                crate::info!("input", "freeze {}", if session.frozen { "on" } else { "off" });
            }
            't' => session.toggle_tree(),
            'c' => session.view = ViewMode::Process,
            'n' => session.view = ViewMode::Network,
            's' => session.view = ViewMode::Storage,
            d @ '1'..='9' => {
                let digit = d as u8 - b'0';
                if !select_column(session, digit) {
                    return Action::None;
                }
            }
            _ => return Action::None,
        }
        Action::Redraw
    }

    fn filter_entry(&self, session: &mut Session, code: KeyCode) -> Action {
        match code {
            KeyCode::Esc => {
                session.filter.clear();
                session.input = InputMode::Normal;
            }
            KeyCode::Enter => {
                session.input = InputMode::Normal;
                crate::debug!("input", "filter '{}'", session.filter);
            }
            KeyCode::Backspace => {
                session.filter.pop();
            }
            KeyCode::Char(c) if !c.is_control() => {
                if session.filter.chars().count() >= self.filter_capacity {
                    return Action::None;
                }
                session.filter.push(c);
            }
            _ => return Action::None,
        }
        Action::Redraw
    }

    fn numeric_entry(&self, session: &mut Session, code: KeyCode) -> Action {
        let accepts_dot = matches!(session.input, InputMode::RefreshEntry(_));
        let buffer = match &mut session.input {
            InputMode::LimitEntry(buffer) | InputMode::RefreshEntry(buffer) => buffer,
            _ => return Action::None,
        };

        match code {
            KeyCode::Esc => session.input = InputMode::Normal,
            KeyCode::Enter => {
                let mode = std::mem::take(&mut session.input);
                commit(session, &mode);
            }
            KeyCode::Backspace => {
                buffer.pop();
            }
            KeyCode::Char(c) if c.is_ascii_digit() || (accepts_dot && c == '.') => {
                if buffer.len() >= self.numeric_capacity {
                    return Action::None;
                }
                buffer.push(c);
            }
            _ => return Action::None,
        }
        Action::Redraw
    }
}

/// Applies a committed numeric entry; unparseable or out-of-range
/// values are dropped.
fn commit(session: &mut Session, mode: &InputMode) {
    match mode {
        InputMode::LimitEntry(buffer) => match buffer.parse::<usize>() {
            Ok(limit) if session.set_limit(limit) => {
                crate::info!("input", "display limit {}", limit);
            }
            _ => crate::debug!("input", "ignored limit '{}'", buffer),
        },
        InputMode::RefreshEntry(buffer) => match buffer.parse::<f64>() {
            Ok(secs) if session.set_interval_secs(secs) => {
                crate::info!("input", "refresh interval {:.2}s", secs);
            }
            _ => crate::debug!("input", "ignored refresh '{}'", buffer),
        },
        _ => {}
    }
}

/// Maps a digit key onto the active view's columns.
fn select_column(session: &mut Session, digit: u8) -> bool {
    fn pick<C: SortColumn>(state: &mut crate::sort::SortState<C>, digit: u8) -> bool {
        match C::from_digit(digit) {
            Some(column) => {
                state.select(column);
                true
            }
            None => false,
        }
    }

    match session.view {
        ViewMode::Process => pick(&mut session.process_sort, digit),
        ViewMode::Network => pick(&mut session.network_sort, digit),
        ViewMode::Storage => pick(&mut session.disk_sort, digit),
    }
}
