//! Terminal UI implementation using ratatui
//!
//! Charts one metric for RS and LRC side by side per scenario, with a detail
//! panel for the selected scenario.

use crate::metrics::MetricsSummary;
use crate::ui::{report, ChartMetric, DashboardState, UIConfig, UIEvent, HELP_TEXT};
use crate::Result;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::Line,
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Clear, Paragraph, Wrap},
    Frame, Terminal,
};
use std::io::{self, Stdout};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Results dashboard over a set of scenario summaries
pub struct ResultsDashboard {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    config: UIConfig,
    state: DashboardState,
    results: Vec<MetricsSummary>,
}

impl ResultsDashboard {
    pub fn new(results: Vec<MetricsSummary>) -> Result<Self> {
        let backend = CrosstermBackend::new(io::stdout());
        let terminal = Terminal::new(backend)?;

        Ok(Self {
            terminal,
            config: UIConfig::default(),
            state: DashboardState::default(),
            results,
        })
    }

    /// Run until the user quits
    pub async fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        execute!(self.terminal.backend_mut(), EnterAlternateScreen)?;

        let mut event_receiver = self.setup_event_handling();
        let mut last_update: Option<Instant> = None;

        while !self.state.quit {
            let mut dirty = false;
            while let Ok(event) = event_receiver.try_recv() {
                self.state.apply(&event, self.results.len());
                dirty = true;
            }

            let due = last_update.map_or(true, |t| {
                t.elapsed() >= Duration::from_millis(self.config.update_interval_ms)
            });
            if dirty || due {
                self.draw()?;
                last_update = Some(Instant::now());
            }

            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        self.cleanup()
    }

    /// Forward key presses from a blocking reader thread
    fn setup_event_handling(&self) -> mpsc::UnboundedReceiver<UIEvent> {
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::task::spawn_blocking(move || loop {
            if let Ok(true) = event::poll(Duration::from_millis(50)) {
                if let Ok(Event::Key(key)) = event::read() {
                    if tx.send(UIEvent::from(key)).is_err() {
                        break; // Receiver dropped
                    }
                }
            } else if tx.is_closed() {
                break;
            }
        });

        rx
    }

    fn draw(&mut self) -> Result<()> {
        let state = self.state.clone();
        let config = self.config.clone();
        let results = &self.results;

        self.terminal.draw(|f| {
            Self::render_main(f, results, &state, &config);
            if state.show_help {
                Self::render_help(f, &config);
            }
        })?;
        Ok(())
    }

    fn render_main(
        f: &mut Frame,
        results: &[MetricsSummary],
        state: &DashboardState,
        config: &UIConfig,
    ) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),  // Title
                Constraint::Min(10),    // Chart
                Constraint::Length(9),  // Detail
                Constraint::Length(1),  // Status bar
            ])
            .split(f.size());

        let title = Paragraph::new(format!("RS vs LRC - {}", state.metric.title()))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .style(Style::default().fg(config.colors.highlight)),
            )
            .alignment(Alignment::Center)
            .style(Style::default().add_modifier(Modifier::BOLD));
        f.render_widget(title, chunks[0]);

        Self::render_chart(f, chunks[1], results, state.metric, config);
        Self::render_detail(f, chunks[2], results.get(state.selected), config);

        let status = Paragraph::new(format!(
            "Scenario {}/{} | Tab: metric | Left/Right: scenario | H: help | Q: quit",
            (state.selected + 1).min(results.len()),
            results.len()
        ))
        .style(Style::default().fg(config.colors.text))
        .alignment(Alignment::Center);
        f.render_widget(status, chunks[3]);
    }

    fn render_chart(
        f: &mut Frame,
        area: Rect,
        results: &[MetricsSummary],
        metric: ChartMetric,
        config: &UIConfig,
    ) {
        let block = Block::default().title(metric.title()).borders(Borders::ALL);
        let mut chart = BarChart::default()
            .block(block)
            .bar_width(config.bar_width)
            .bar_gap(1)
            .group_gap(3);

        for summary in results {
            let bars: Vec<Bar> = [
                (&summary.rs_metrics, "RS", config.colors.rs),
                (&summary.lrc_metrics, "LRC", config.colors.lrc),
            ]
            .into_iter()
            .filter_map(|(metrics, label, color)| {
                metrics.as_ref().map(|m| {
                    let value = metric.bar_value(m);
                    Bar::default()
                        .value(value)
                        .label(Line::from(label))
                        .text_value(value.to_string())
                        .style(Style::default().fg(color))
                })
            })
            .collect();

            let group = BarGroup::default()
                .label(Line::from(format!("Scenario {}", summary.scenario_id)))
                .bars(&bars);
            chart = chart.data(group);
        }

        f.render_widget(chart, area);
    }

    fn render_detail(
        f: &mut Frame,
        area: Rect,
        summary: Option<&MetricsSummary>,
        config: &UIConfig,
    ) {
        let block = Block::default().title("Scenario Detail").borders(Borders::ALL);

        let (text, color) = match summary {
            Some(summary) => {
                let healthy = [&summary.rs_metrics, &summary.lrc_metrics]
                    .into_iter()
                    .flatten()
                    .all(|m| m.reconstruction_success && m.data_integrity);
                let color = if healthy {
                    config.colors.success
                } else {
                    config.colors.error
                };
                (report::summary_lines(summary).join("\n"), color)
            }
            None => ("No scenario results loaded".to_string(), config.colors.text),
        };

        let paragraph = Paragraph::new(text)
            .block(block)
            .style(Style::default().fg(color))
            .wrap(Wrap { trim: false });
        f.render_widget(paragraph, area);
    }

    fn render_help(f: &mut Frame, config: &UIConfig) {
        let popup_area = crate::ui::utils::centered_rect(60, 24, f.size());
        f.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Help")
            .borders(Borders::ALL)
            .style(Style::default().fg(config.colors.highlight));

        let paragraph = Paragraph::new(HELP_TEXT)
            .block(block)
            .wrap(Wrap { trim: true })
            .style(Style::default().fg(config.colors.text));

        f.render_widget(paragraph, popup_area);
    }

    /// Cleanup terminal state
    fn cleanup(&mut self) -> Result<()> {
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Drop for ResultsDashboard {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}
