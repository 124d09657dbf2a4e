//! Terminal user interface module
//!
//! Console report lines for each scenario, and a ratatui dashboard that
//! charts RS against LRC across scenarios.

pub mod report;
pub mod terminal;

pub use terminal::ResultsDashboard;

use crate::metrics::RecoveryMetrics;
use crossterm::event::{KeyCode, KeyEvent};

/// Events that can be triggered by user input
#[derive(Debug, Clone, PartialEq)]
pub enum UIEvent {
    /// User wants to quit the application
    Quit,
    /// Chart the next metric
    NextMetric,
    /// Chart the previous metric
    PreviousMetric,
    /// Select the next scenario for the detail panel
    NextScenario,
    /// Select the previous scenario for the detail panel
    PreviousScenario,
    /// User wants to show help
    ShowHelp,
    /// User pressed an unrecognized key
    Unknown(KeyCode),
}

impl From<KeyEvent> for UIEvent {
    fn from(key_event: KeyEvent) -> Self {
        match key_event.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => UIEvent::Quit,
            KeyCode::Tab | KeyCode::Char('m') | KeyCode::Char('M') => UIEvent::NextMetric,
            KeyCode::BackTab => UIEvent::PreviousMetric,
            KeyCode::Right | KeyCode::Char('l') => UIEvent::NextScenario,
            KeyCode::Left | KeyCode::Char('j') => UIEvent::PreviousScenario,
            KeyCode::Char('h') | KeyCode::Char('H') | KeyCode::F(1) => UIEvent::ShowHelp,
            KeyCode::Esc => UIEvent::Quit,
            other => UIEvent::Unknown(other),
        }
    }
}

/// Metric plotted by the dashboard chart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartMetric {
    BandwidthEfficiency,
    FragmentsAccessed,
    XorOperations,
    MultiplicationOperations,
    RecoveryTime,
}

impl ChartMetric {
    pub const ALL: [ChartMetric; 5] = [
        ChartMetric::BandwidthEfficiency,
        ChartMetric::FragmentsAccessed,
        ChartMetric::XorOperations,
        ChartMetric::MultiplicationOperations,
        ChartMetric::RecoveryTime,
    ];

    fn position(self) -> usize {
        Self::ALL.iter().position(|&m| m == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.position() + 1) % Self::ALL.len()]
    }

    pub fn previous(self) -> Self {
        Self::ALL[(self.position() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    pub fn title(self) -> &'static str {
        match self {
            ChartMetric::BandwidthEfficiency => "Bandwidth Efficiency (%)",
            ChartMetric::FragmentsAccessed => "Fragments Accessed",
            ChartMetric::XorOperations => "XOR Operations (bits)",
            ChartMetric::MultiplicationOperations => "GF(256) Multiplications (bits)",
            ChartMetric::RecoveryTime => "Recovery Time (us)",
        }
    }

    /// Bar height for one scheme; bars are integral
    pub fn bar_value(self, metrics: &RecoveryMetrics) -> u64 {
        match self {
            ChartMetric::BandwidthEfficiency => metrics.bandwidth_efficiency.round() as u64,
            ChartMetric::FragmentsAccessed => metrics.fragments_accessed as u64,
            ChartMetric::XorOperations => metrics.xor_operations,
            ChartMetric::MultiplicationOperations => metrics.multiplication_operations,
            ChartMetric::RecoveryTime => (metrics.recovery_time * 1000.0).round() as u64,
        }
    }
}

/// Color scheme for the UI
#[derive(Debug, Clone, Copy)]
pub struct ColorScheme {
    pub rs: ratatui::style::Color,
    pub lrc: ratatui::style::Color,
    pub text: ratatui::style::Color,
    pub highlight: ratatui::style::Color,
    pub success: ratatui::style::Color,
    pub error: ratatui::style::Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            rs: ratatui::style::Color::Yellow,
            lrc: ratatui::style::Color::Green,
            text: ratatui::style::Color::White,
            highlight: ratatui::style::Color::Cyan,
            success: ratatui::style::Color::Green,
            error: ratatui::style::Color::Red,
        }
    }
}

/// Configuration for UI rendering
#[derive(Debug, Clone)]
pub struct UIConfig {
    /// Color scheme to use
    pub colors: ColorScheme,
    /// Redraw interval in milliseconds
    pub update_interval_ms: u64,
    /// Width of a single bar in cells
    pub bar_width: u16,
}

impl Default for UIConfig {
    fn default() -> Self {
        Self {
            colors: ColorScheme::default(),
            update_interval_ms: 100,
            bar_width: 7,
        }
    }
}

/// Navigation state of the dashboard, independent of the terminal
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardState {
    pub metric: ChartMetric,
    /// Scenario shown in the detail panel
    pub selected: usize,
    pub show_help: bool,
    pub quit: bool,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            metric: ChartMetric::BandwidthEfficiency,
            selected: 0,
            show_help: false,
            quit: false,
        }
    }
}

impl DashboardState {
    /// Apply one input event given how many scenarios are loaded
    pub fn apply(&mut self, event: &UIEvent, scenarios: usize) {
        // Any key closes the help popup
        if self.show_help && *event != UIEvent::Quit {
            self.show_help = false;
            return;
        }

        match event {
            UIEvent::Quit => self.quit = true,
            UIEvent::NextMetric => self.metric = self.metric.next(),
            UIEvent::PreviousMetric => self.metric = self.metric.previous(),
            UIEvent::NextScenario if scenarios > 0 => {
                self.selected = (self.selected + 1) % scenarios
            }
            UIEvent::PreviousScenario if scenarios > 0 => {
                self.selected = (self.selected + scenarios - 1) % scenarios
            }
            UIEvent::ShowHelp => self.show_help = true,
            _ => {}
        }
    }
}

/// Help text for the application
pub const HELP_TEXT: &str = r#"
Erasure Coding Comparison - Controls

Navigation:
  Q, Esc       - Quit application
  H, F1        - Show/hide this help

Chart:
  Tab, M       - Next metric
  Shift+Tab    - Previous metric

Scenarios:
  Right, L     - Next scenario
  Left, J      - Previous scenario

Each scenario shows two bars:
- Yellow: flat Reed-Solomon
- Green: Local Reconstruction Code

Press any key to return to the dashboard.
"#;

/// Utility functions for UI rendering
pub mod utils {
    use ratatui::layout::{Constraint, Direction, Layout, Rect};

    /// Create a centered rectangle with given width and height
    pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
        let popup_layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length((area.height.saturating_sub(height)) / 2),
                Constraint::Length(height),
                Constraint::Length((area.height.saturating_sub(height)) / 2),
            ])
            .split(area);

        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length((area.width.saturating_sub(width)) / 2),
                Constraint::Length(width),
                Constraint::Length((area.width.saturating_sub(width)) / 2),
            ])
            .split(popup_layout[1])[1]
    }
}
