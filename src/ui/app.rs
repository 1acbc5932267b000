use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{backend::CrosstermBackend, Frame, Terminal};
use tokio::sync::mpsc;

use crate::analysis::{parse_tickers, GrowthScreener, ProgressFn};
use crate::api::{FinancialDataProvider, RequestPacer};
use crate::export::export_csv;
use crate::models::{Config, ScreeningCriteria};

use super::state::{ScreenUpdate, ScreenerState};
use super::view;

pub struct ScreenerApp {
    pub state: ScreenerState,
    pub should_quit: bool,
    config: Config,
    provider: Arc<dyn FinancialDataProvider>,
    update_tx: mpsc::UnboundedSender<ScreenUpdate>,
    update_rx: mpsc::UnboundedReceiver<ScreenUpdate>,
}

impl ScreenerApp {
    /// Create the app. `previous_tickers` seeds the input line with the
    /// last run's value; the caller owns that piece of session state.
    pub fn new(
        config: Config,
        provider: Arc<dyn FinancialDataProvider>,
        previous_tickers: &str,
        criteria: &ScreeningCriteria,
    ) -> Self {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        Self {
            state: ScreenerState::new(previous_tickers, criteria),
            should_quit: false,
            config,
            provider,
            update_tx,
            update_rx,
        }
    }

    pub fn draw(&mut self, f: &mut Frame) {
        view::render(f, &self.state);
    }

    /// Drain pending updates from the background screening task
    pub fn process_updates(&mut self) {
        while let Ok(update) = self.update_rx.try_recv() {
            self.state.apply_update(update);
        }
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) -> Result<()> {
        // Ctrl shortcuts work whether or not a run is active
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('a') | KeyCode::Char('A') => {
                    self.state.toggle_show_all();
                }
                KeyCode::Char('e') | KeyCode::Char('E') => {
                    self.export_results();
                }
                KeyCode::Char('c') | KeyCode::Char('C') => {
                    self.should_quit = true;
                }
                _ => {}
            }
            return Ok(());
        }

        match key.code {
            KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Tab => {
                self.state.focused = self.state.focused.next();
            }
            KeyCode::BackTab => {
                self.state.focused = self.state.focused.previous();
            }
            KeyCode::Enter => {
                self.start_screening();
            }
            KeyCode::Char(c) if !self.state.running => {
                self.state.focused_input_mut().push(c);
            }
            KeyCode::Backspace if !self.state.running => {
                self.state.focused_input_mut().pop();
            }
            _ => {}
        }
        Ok(())
    }

    /// Kick off a screening run on a background task; progress and the
    /// final records arrive through the update channel.
    fn start_screening(&mut self) {
        if self.state.running {
            return;
        }

        let criteria = match self.state.criteria() {
            Ok(criteria) => criteria,
            Err(message) => {
                self.state.status = Some(message);
                return;
            }
        };

        if parse_tickers(&self.state.ticker_input).is_empty() {
            self.state.status = Some("Enter at least one ticker symbol".to_string());
            return;
        }

        self.state.running = true;
        self.state.progress = None;
        self.state.status = None;

        let provider = self.provider.clone();
        let rate = self.config.rate_limit_per_minute;
        let tickers_input = self.state.ticker_input.clone();
        let finished_tx = self.update_tx.clone();
        let progress_tx = self.update_tx.clone();

        tokio::spawn(async move {
            let screener = GrowthScreener::new(provider, RequestPacer::new(rate));
            let progress: ProgressFn = Box::new(move |completed, total, ticker| {
                let _ = progress_tx.send(ScreenUpdate::Progress {
                    completed,
                    total,
                    ticker: ticker.to_string(),
                });
            });

            let records = screener.screen(&tickers_input, &criteria, Some(progress)).await;
            let _ = finished_tx.send(ScreenUpdate::Finished { records });
        });
    }

    fn export_results(&mut self) {
        let Some(report) = &self.state.report else {
            self.state.status = Some("Nothing to export yet".to_string());
            return;
        };

        match export_csv(&report.displayed, Path::new(&self.config.export_dir)) {
            Ok(path) => {
                self.state.status = Some(format!("Exported to {}", path.display()));
            }
            Err(e) => {
                self.state.status = Some(format!("Export failed: {}", e));
            }
        }
    }
}

/// Run the interactive screener until the user quits.
/// Must be called from within a tokio runtime (screening runs spawn tasks).
pub fn run_app(
    config: Config,
    provider: Arc<dyn FinancialDataProvider>,
    previous_tickers: &str,
    criteria: &ScreeningCriteria,
) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    io::stdout().execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;

    let mut app = ScreenerApp::new(config, provider, previous_tickers, criteria);

    // Main application loop
    let result = loop {
        app.process_updates();

        if let Err(e) = terminal.draw(|f| app.draw(f)) {
            break Err(e.into());
        }

        // Poll with a timeout so progress updates keep rendering while the
        // user is idle
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Err(e) = app.handle_key_event(key) {
                        break Err(e);
                    }
                }
            }
        }

        if app.should_quit {
            break Ok(());
        }
    };

    // Cleanup terminal
    disable_raw_mode()?;
    io::stdout().execute(LeaveAlternateScreen)?;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::FetchError;
    use crate::models::{CompanySnapshot, ScreeningCriteria};

    struct NullProvider;

    #[async_trait::async_trait]
    impl FinancialDataProvider for NullProvider {
        async fn fetch_company(&self, symbol: &str) -> Result<CompanySnapshot, FetchError> {
            Err(FetchError::UnknownSymbol(symbol.to_string()))
        }
    }

    fn app() -> ScreenerApp {
        let config = Config {
            quote_api_base: "http://unused".to_string(),
            user_agent: "test".to_string(),
            rate_limit_per_minute: 60_000,
            export_dir: ".".to_string(),
        };
        ScreenerApp::new(
            config,
            Arc::new(NullProvider),
            "AAPL,MSFT",
            &ScreeningCriteria::default(),
        )
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[tokio::test]
    async fn test_typing_edits_focused_field() {
        let mut app = app();
        app.handle_key_event(press(KeyCode::Char(','))).unwrap();
        app.handle_key_event(press(KeyCode::Char('G'))).unwrap();
        assert_eq!(app.state.ticker_input, "AAPL,MSFT,G");

        app.handle_key_event(press(KeyCode::Backspace)).unwrap();
        assert_eq!(app.state.ticker_input, "AAPL,MSFT,");

        app.handle_key_event(press(KeyCode::Tab)).unwrap();
        app.handle_key_event(press(KeyCode::Char('0'))).unwrap();
        assert_eq!(app.state.min_revenue_input, "150");
    }

    #[tokio::test]
    async fn test_empty_ticker_input_is_rejected_without_fetch() {
        let mut app = app();
        app.state.ticker_input = " , ".to_string();

        app.handle_key_event(press(KeyCode::Enter)).unwrap();

        assert!(!app.state.running);
        assert_eq!(
            app.state.status.as_deref(),
            Some("Enter at least one ticker symbol")
        );
    }

    #[tokio::test]
    async fn test_invalid_threshold_is_rejected() {
        let mut app = app();
        app.state.min_revenue_input = "lots".to_string();

        app.handle_key_event(press(KeyCode::Enter)).unwrap();

        assert!(!app.state.running);
        assert!(app
            .state
            .status
            .as_deref()
            .unwrap()
            .contains("Invalid revenue growth threshold"));
    }

    #[tokio::test]
    async fn test_screening_run_finishes_through_channel() {
        let mut app = app();
        app.handle_key_event(press(KeyCode::Enter)).unwrap();
        assert!(app.state.running);

        // Both tickers fail against the null provider, but the run still
        // yields one error record per ticker
        let mut updates = Vec::new();
        while updates.len() < 3 {
            match app.update_rx.recv().await {
                Some(update) => updates.push(update),
                None => break,
            }
        }
        for update in updates {
            app.state.apply_update(update);
        }

        assert!(!app.state.running);
        let report = app.state.report.as_ref().unwrap();
        assert_eq!(report.errors.len(), 2);
        assert_eq!(report.summary.total_analyzed, 0);
    }

    #[tokio::test]
    async fn test_escape_quits() {
        let mut app = app();
        app.handle_key_event(press(KeyCode::Esc)).unwrap();
        assert!(app.should_quit);
    }
}
