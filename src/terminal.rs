//! Terminal ownership and keystroke input.
//!
//! [`TerminalGuard`] holds raw mode and the alternate screen for as long as
//! it lives. [`EventSource`] is the single bounded wait of the main loop.

use crate::error::Result;
use crossterm::cursor::{Hide, Show};
use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::{self, stdout, Stdout};
use std::time::{Duration, Instant};

/// One outcome of a bounded wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// A key was pressed.
    Key(KeyEvent),
    /// The terminal was resized.
    Resize,
    /// The wait ran out with no input.
    Timeout,
}

/// Source of keystrokes for the main loop.
pub trait EventSource {
    /// Waits for the next event.
    ///
    /// `None` waits indefinitely; `Some(timeout)` returns
    /// [`InputEvent::Timeout`] once `timeout` has passed without input.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be read.
    fn next_event(&mut self, timeout: Option<Duration>) -> Result<InputEvent>;
}

/// Keystrokes from the real terminal via crossterm.
#[derive(Debug, Default)]
pub struct CrosstermEvents;

impl CrosstermEvents {
    /// Creates the event source.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl EventSource for CrosstermEvents {
    fn next_event(&mut self, timeout: Option<Duration>) -> Result<InputEvent> {
        let deadline = timeout.map(|t| Instant::now() + t);
        loop {
            if let Some(deadline) = deadline {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() || !event::poll(remaining)? {
                    return Ok(InputEvent::Timeout);
                }
            }
            // Release and repeat events are skipped without extending the deadline
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    return Ok(InputEvent::Key(key));
                }
                Event::Resize(..) => return Ok(InputEvent::Resize),
                _ => {}
            }
        }
    }
}

/// Restores the terminal to cooked mode on the main screen.
fn restore() -> io::Result<()> {
    disable_raw_mode()?;
    let mut out = stdout();
    out.execute(LeaveAlternateScreen)?;
    out.execute(Show)?;
    Ok(())
}

/// Raw mode plus alternate screen, released on drop.
pub struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalGuard {
    /// Enters raw mode and the alternate screen.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be switched; any partial
    /// setup is undone first.
    pub fn new() -> Result<Self> {
        enable_raw_mode()?;
        let setup = (|| -> io::Result<Terminal<CrosstermBackend<Stdout>>> {
            let mut out = stdout();
            out.execute(EnterAlternateScreen)?;
            out.execute(Hide)?;
            let mut terminal = Terminal::new(CrosstermBackend::new(out))?;
            terminal.clear()?;
            Ok(terminal)
        })();

        match setup {
            Ok(terminal) => {
                crate::debug!("terminal", "raw mode on");
                Ok(Self { terminal })
            }
            Err(e) => {
                let _ = restore();
                Err(e.into())
            }
        }
    }

    /// The ratatui terminal.
    pub fn terminal(&mut self) -> &mut Terminal<CrosstermBackend<Stdout>> {
        &mut self.terminal
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        match restore() {
            Ok(()) => crate::debug!("terminal", "restored"),
            Err(e) => crate::error!("terminal", "restore failed: {}", e),
        }
    }
}

/// Chains a panic hook that restores the terminal before the default
/// hook prints the panic message.
pub fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = restore();
        previous(info);
    }));
}
