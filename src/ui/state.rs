use crate::analysis::{build_report, ScreeningReport};
use crate::models::{ScreeningCriteria, TickerRecord};

/// Updates streamed from the background screening task into the draw loop
#[derive(Debug)]
pub enum ScreenUpdate {
    Progress {
        completed: usize,
        total: usize,
        ticker: String,
    },
    Finished {
        records: Vec<TickerRecord>,
    },
}

/// Which input line currently receives keystrokes
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputField {
    Tickers,
    MinRevenueGrowth,
    MinEarningsGrowth,
}

impl InputField {
    pub fn next(self) -> Self {
        match self {
            Self::Tickers => Self::MinRevenueGrowth,
            Self::MinRevenueGrowth => Self::MinEarningsGrowth,
            Self::MinEarningsGrowth => Self::Tickers,
        }
    }

    pub fn previous(self) -> Self {
        match self {
            Self::Tickers => Self::MinEarningsGrowth,
            Self::MinRevenueGrowth => Self::Tickers,
            Self::MinEarningsGrowth => Self::MinRevenueGrowth,
        }
    }
}

/// All mutable TUI state. The previous run's ticker input is passed in
/// explicitly rather than read from any ambient global.
pub struct ScreenerState {
    pub ticker_input: String,
    pub min_revenue_input: String,
    pub min_earnings_input: String,
    pub show_all: bool,
    pub focused: InputField,
    pub running: bool,
    /// (completed, total, last finished ticker) while a run is active
    pub progress: Option<(usize, usize, String)>,
    pub records: Vec<TickerRecord>,
    pub report: Option<ScreeningReport>,
    pub status: Option<String>,
}

impl ScreenerState {
    pub fn new(previous_tickers: &str, criteria: &ScreeningCriteria) -> Self {
        Self {
            ticker_input: previous_tickers.to_string(),
            min_revenue_input: format!("{}", criteria.min_revenue_growth),
            min_earnings_input: format!("{}", criteria.min_earnings_growth),
            show_all: criteria.show_all,
            focused: InputField::Tickers,
            running: false,
            progress: None,
            records: Vec::new(),
            report: None,
            status: None,
        }
    }

    pub fn focused_input_mut(&mut self) -> &mut String {
        match self.focused {
            InputField::Tickers => &mut self.ticker_input,
            InputField::MinRevenueGrowth => &mut self.min_revenue_input,
            InputField::MinEarningsGrowth => &mut self.min_earnings_input,
        }
    }

    /// Parse the threshold inputs into screening criteria.
    /// Returns a user-facing validation message on bad input.
    pub fn criteria(&self) -> Result<ScreeningCriteria, String> {
        let min_revenue_growth = self
            .min_revenue_input
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("Invalid revenue growth threshold: '{}'", self.min_revenue_input))?;
        let min_earnings_growth = self
            .min_earnings_input
            .trim()
            .parse::<f64>()
            .map_err(|_| {
                format!("Invalid earnings growth threshold: '{}'", self.min_earnings_input)
            })?;

        Ok(ScreeningCriteria {
            min_revenue_growth,
            min_earnings_growth,
            show_all: self.show_all,
        })
    }

    /// Fold a background update into the state
    pub fn apply_update(&mut self, update: ScreenUpdate) {
        match update {
            ScreenUpdate::Progress {
                completed,
                total,
                ticker,
            } => {
                self.progress = Some((completed, total, ticker));
            }
            ScreenUpdate::Finished { records } => {
                self.records = records;
                self.rebuild_report();
                self.running = false;
                self.progress = None;
                self.status = Some(format!(
                    "Screened {} tickers ({} failed)",
                    self.records.len(),
                    self.records.iter().filter(|r| r.is_error()).count()
                ));
            }
        }
    }

    /// Recompute the presentation view after a run or a show-all toggle
    pub fn rebuild_report(&mut self) {
        if self.records.is_empty() {
            self.report = None;
        } else {
            self.report = Some(build_report(&self.records, self.show_all));
        }
    }

    pub fn toggle_show_all(&mut self) {
        self.show_all = !self.show_all;
        self.rebuild_report();
    }
}
