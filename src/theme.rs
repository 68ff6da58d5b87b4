//! Threshold colors for the dashboard.

use crate::types::ProcessState;
use ratatui::style::{Color, Modifier, Style};

/// CPU percentage at which a row turns yellow.
pub const CPU_WARN: f64 = 80.0;
/// CPU percentage at which a row turns red.
pub const CPU_CRIT: f64 = 95.0;
/// I/O wait (ms) at which a cell turns yellow.
pub const WAIT_WARN: f64 = 500.0;
/// I/O wait (ms) at which a cell turns red.
pub const WAIT_CRIT: f64 = 1000.0;

/// Warning color.
pub const WARN: Color = Color::Yellow;
/// Critical color.
pub const CRIT: Color = Color::Red;
/// Normal color.
pub const OK: Color = Color::Green;

/// Styles used by the renderer; a disabled theme yields plain styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    /// Colors on.
    pub enabled: bool,
}

impl Default for Theme {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Theme {
    /// Creates a theme.
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    fn fg(self, color: Color) -> Style {
        if self.enabled {
            Style::default().fg(color)
        } else {
            Style::default()
        }
    }

    /// Color for a CPU percentage.
    #[must_use]
    pub fn cpu_color(cpu_pct: f64) -> Color {
        if cpu_pct >= CPU_CRIT {
            CRIT
        } else if cpu_pct >= CPU_WARN {
            WARN
        } else {
            OK
        }
    }

    /// Color for an I/O wait in milliseconds.
    #[must_use]
    pub fn wait_color(wait_ms: f64) -> Color {
        if wait_ms >= WAIT_CRIT {
            CRIT
        } else if wait_ms >= WAIT_WARN {
            WARN
        } else {
            OK
        }
    }

    /// Color for a run state.
    #[must_use]
    pub fn state_color(state: ProcessState) -> Color {
        match state {
            ProcessState::DiskWait => CRIT,
            ProcessState::Zombie => WARN,
            _ => OK,
        }
    }

    /// Style for a CPU cell.
    #[must_use]
    pub fn cpu_style(self, cpu_pct: f64) -> Style {
        self.fg(Self::cpu_color(cpu_pct))
    }

    /// Style for an I/O wait cell.
    #[must_use]
    pub fn wait_style(self, wait_ms: f64) -> Style {
        self.fg(Self::wait_color(wait_ms))
    }

    /// Style for a state cell.
    #[must_use]
    pub fn state_style(self, state: ProcessState) -> Style {
        self.fg(Self::state_color(state))
    }

    /// Style for table headers.
    #[must_use]
    pub fn header_style(self) -> Style {
        let style = Style::default().add_modifier(Modifier::BOLD);
        if self.enabled {
            style.fg(Color::Cyan)
        } else {
            style
        }
    }

    /// Style for the active entry prompt.
    #[must_use]
    pub fn prompt_style(self) -> Style {
        let style = Style::default().add_modifier(Modifier::BOLD);
        if self.enabled {
            style.fg(Color::Black).bg(Color::Yellow)
        } else {
            style.add_modifier(Modifier::REVERSED)
        }
    }

    /// Style for dimmed text (thread rows, legend).
    #[must_use]
    pub fn dim_style(self) -> Style {
        if self.enabled {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpu_thresholds() {
        assert_eq!(Theme::cpu_color(0.0), OK);
        assert_eq!(Theme::cpu_color(79.9), OK);
        assert_eq!(Theme::cpu_color(80.0), WARN);
        assert_eq!(Theme::cpu_color(95.0), CRIT);
        assert_eq!(Theme::cpu_color(400.0), CRIT);
    }

    #[test]
    fn test_wait_thresholds() {
        assert_eq!(Theme::wait_color(499.0), OK);
        assert_eq!(Theme::wait_color(500.0), WARN);
        assert_eq!(Theme::wait_color(1000.0), CRIT);
    }

    #[test]
    fn test_state_colors() {
        assert_eq!(Theme::state_color(ProcessState::DiskWait), CRIT);
        assert_eq!(Theme::state_color(ProcessState::Zombie), WARN);
        assert_eq!(Theme::state_color(ProcessState::Sleeping), OK);
    }

    #[test]
    fn test_disabled_theme_is_plain() {
        let theme = Theme::new(false);
        assert_eq!(theme.cpu_style(99.0), Style::default());
        assert_eq!(theme.state_style(ProcessState::Zombie), Style::default());
        assert_eq!(Theme::default().cpu_style(99.0), Style::default().fg(CRIT));
    }
}
