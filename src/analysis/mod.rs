use std::sync::Arc;

use tracing::{debug, warn};

use crate::api::{FinancialDataProvider, RequestPacer};
use crate::models::{CompanySnapshot, ScreeningCriteria, TickerRecord};

pub mod report;
pub use report::{build_report, ScreeningReport, ScreeningSummary};

/// Progress callback: (completed, total, ticker just finished)
pub type ProgressFn = Box<dyn Fn(usize, usize, &str) + Send + Sync>;

/// Year-over-year growth of a financial line item, in percent.
///
/// `series` is ordered most recent period first. Growth is undefined (and
/// the result absent) when fewer than two periods exist, when either of the
/// two most recent values is missing, or when the prior value is zero.
///
/// The denominator is `abs(previous)` so the sign of `current - previous`
/// survives a negative prior period: a company moving from a loss to a
/// profit reads as positive growth instead of a sign flip.
pub fn derive_growth(series: &[Option<f64>]) -> Option<f64> {
    if series.len() < 2 {
        return None;
    }

    let current = series[0]?;
    let previous = series[1]?;
    if previous == 0.0 {
        return None;
    }

    Some(round2(((current - previous) / previous.abs()) * 100.0))
}

/// Round to 2 decimal places for display and export
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Split free-text comma-separated ticker input, trimming whitespace and
/// dropping empty entries. Order is preserved; duplicates are kept and
/// processed independently.
pub fn parse_tickers(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Growth metrics screening pipeline: one provider call per ticker, growth
/// derivation, threshold check, and per-ticker error capture.
pub struct GrowthScreener {
    provider: Arc<dyn FinancialDataProvider>,
    pacer: RequestPacer,
}

impl GrowthScreener {
    pub fn new(provider: Arc<dyn FinancialDataProvider>, pacer: RequestPacer) -> Self {
        Self { provider, pacer }
    }

    /// Build the record for a single ticker.
    ///
    /// Any fetch failure is swallowed here and turned into an error record;
    /// it must never abort processing of the remaining tickers.
    pub async fn build_record(
        &self,
        ticker: &str,
        criteria: &ScreeningCriteria,
    ) -> TickerRecord {
        match self.provider.fetch_company(ticker).await {
            Ok(snapshot) => {
                debug!("Fetched {} ({} statement periods)", ticker, snapshot.statements.len());
                record_from_snapshot(ticker, &snapshot, criteria)
            }
            Err(e) => {
                warn!("Could not fetch data for {}: {}", ticker, e);
                TickerRecord::from_error(ticker, &e.to_string())
            }
        }
    }

    /// Screen a comma-separated ticker list, strictly sequentially.
    ///
    /// Returns one record per non-empty ticker, failed ones included, in
    /// input order. Progress is reported after each ticker completes.
    pub async fn screen(
        &self,
        tickers_input: &str,
        criteria: &ScreeningCriteria,
        progress: Option<ProgressFn>,
    ) -> Vec<TickerRecord> {
        let tickers = parse_tickers(tickers_input);
        let total = tickers.len();
        let mut records = Vec::with_capacity(total);

        for (index, ticker) in tickers.iter().enumerate() {
            if index > 0 {
                // Space out requests to respect the provider's usage norms
                self.pacer.wait().await;
            }

            let record = self.build_record(ticker, criteria).await;
            records.push(record);

            if let Some(ref callback) = progress {
                callback(index + 1, total, ticker);
            }
        }

        records
    }
}

/// Derive growth metrics from a fetched snapshot and apply the thresholds
fn record_from_snapshot(
    ticker: &str,
    snapshot: &CompanySnapshot,
    criteria: &ScreeningCriteria,
) -> TickerRecord {
    let revenue_series: Vec<Option<f64>> = snapshot
        .statements
        .iter()
        .map(|s| s.total_revenue)
        .collect();
    let earnings_series: Vec<Option<f64>> =
        snapshot.statements.iter().map(|s| s.net_income).collect();

    let revenue_growth_pct = derive_growth(&revenue_series);
    let earnings_growth_pct = derive_growth(&earnings_series);

    // Both growth values must exist and clear their thresholds; an absent
    // value always fails the screen.
    let meets_criteria = match (revenue_growth_pct, earnings_growth_pct) {
        (Some(revenue), Some(earnings)) => {
            revenue >= criteria.min_revenue_growth && earnings >= criteria.min_earnings_growth
        }
        _ => false,
    };

    TickerRecord {
        ticker: ticker.to_string(),
        company_name: snapshot
            .profile
            .long_name
            .clone()
            .unwrap_or_else(|| ticker.to_string()),
        market_cap_billions: snapshot.profile.market_cap.map(|cap| round2(cap / 1e9)),
        pe_ratio: snapshot.profile.trailing_pe.map(round2),
        sector: snapshot.profile.sector.clone(),
        revenue_growth_pct,
        earnings_growth_pct,
        meets_criteria,
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::FetchError;
    use crate::models::{CompanyProfile, StatementPeriod};
    use pretty_assertions::assert_eq;

    fn series(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().map(|&v| Some(v)).collect()
    }

    #[test]
    fn test_growth_basic_increase() {
        assert_eq!(derive_growth(&series(&[120.0, 100.0])), Some(20.0));
    }

    #[test]
    fn test_growth_basic_decrease() {
        assert_eq!(derive_growth(&series(&[80.0, 100.0])), Some(-20.0));
    }

    #[test]
    fn test_growth_loss_to_profit_stays_positive() {
        // ((100 - (-50)) / 50) * 100
        assert_eq!(derive_growth(&series(&[100.0, -50.0])), Some(300.0));
    }

    #[test]
    fn test_growth_single_period_is_absent() {
        assert_eq!(derive_growth(&series(&[100.0])), None);
        assert_eq!(derive_growth(&[]), None);
    }

    #[test]
    fn test_growth_zero_prior_is_absent() {
        assert_eq!(derive_growth(&series(&[100.0, 0.0])), None);
    }

    #[test]
    fn test_growth_missing_values_are_absent() {
        assert_eq!(derive_growth(&[None, Some(100.0)]), None);
        assert_eq!(derive_growth(&[Some(100.0), None]), None);
    }

    #[test]
    fn test_growth_rounds_to_two_decimals() {
        // (1/3) * 100 = 33.333...
        assert_eq!(derive_growth(&series(&[400.0, 300.0])), Some(33.33));
    }

    #[test]
    fn test_growth_uses_later_periods_only_for_context() {
        // Extra history beyond the two most recent periods is ignored
        assert_eq!(
            derive_growth(&series(&[120.0, 100.0, 10.0, 5.0])),
            Some(20.0)
        );
    }

    #[test]
    fn test_parse_tickers_trims_and_drops_empties() {
        assert_eq!(parse_tickers("AAPL, , MSFT"), vec!["AAPL", "MSFT"]);
        assert_eq!(parse_tickers("  nvda ,GOOGL"), vec!["nvda", "GOOGL"]);
        assert_eq!(parse_tickers(" , ,"), Vec::<String>::new());
        assert_eq!(parse_tickers(""), Vec::<String>::new());
    }

    #[test]
    fn test_parse_tickers_keeps_duplicates_and_order() {
        assert_eq!(parse_tickers("MSFT,AAPL,MSFT"), vec!["MSFT", "AAPL", "MSFT"]);
    }

    fn snapshot(revenues: &[f64], earnings: &[f64]) -> CompanySnapshot {
        let statements = revenues
            .iter()
            .zip(earnings.iter())
            .map(|(&revenue, &income)| StatementPeriod {
                end_date: None,
                total_revenue: Some(revenue),
                net_income: Some(income),
            })
            .collect();

        CompanySnapshot {
            profile: CompanyProfile {
                long_name: Some("Test Corp".to_string()),
                market_cap: Some(1_234_567_000_000.0),
                trailing_pe: Some(28.916),
                sector: Some("Technology".to_string()),
            },
            statements,
        }
    }

    #[test]
    fn test_record_from_snapshot_passes_thresholds() {
        let criteria = ScreeningCriteria::default();
        let record = record_from_snapshot(
            "TST",
            &snapshot(&[120.0, 100.0], &[115.0, 100.0]),
            &criteria,
        );

        assert_eq!(record.revenue_growth_pct, Some(20.0));
        assert_eq!(record.earnings_growth_pct, Some(15.0));
        assert!(record.meets_criteria);
        assert_eq!(record.company_name, "Test Corp");
        assert_eq!(record.market_cap_billions, Some(1234.57));
        assert_eq!(record.pe_ratio, Some(28.92));
        assert!(record.error.is_none());
    }

    #[test]
    fn test_record_threshold_boundaries_are_inclusive() {
        let criteria = ScreeningCriteria::default();
        // Exactly 15.0% revenue growth and 10.0% earnings growth
        let record = record_from_snapshot(
            "TST",
            &snapshot(&[115.0, 100.0], &[110.0, 100.0]),
            &criteria,
        );
        assert!(record.meets_criteria);
    }

    #[test]
    fn test_record_fails_when_one_threshold_missed() {
        let criteria = ScreeningCriteria::default();
        let record = record_from_snapshot(
            "TST",
            &snapshot(&[120.0, 100.0], &[105.0, 100.0]),
            &criteria,
        );
        assert!(!record.meets_criteria);
    }

    #[test]
    fn test_record_absent_growth_forces_fail() {
        let criteria = ScreeningCriteria::default();
        let mut snap = snapshot(&[120.0, 100.0], &[115.0, 100.0]);
        snap.statements[1].net_income = None;

        let record = record_from_snapshot("TST", &snap, &criteria);
        assert_eq!(record.revenue_growth_pct, Some(20.0));
        assert_eq!(record.earnings_growth_pct, None);
        assert!(!record.meets_criteria);
    }

    #[test]
    fn test_record_missing_line_item_is_not_an_error() {
        let criteria = ScreeningCriteria::default();
        let snap = CompanySnapshot {
            profile: CompanyProfile::default(),
            statements: vec![StatementPeriod::default(), StatementPeriod::default()],
        };

        let record = record_from_snapshot("BARE", &snap, &criteria);
        assert!(record.error.is_none());
        assert!(record.revenue_growth_pct.is_none());
        assert!(record.earnings_growth_pct.is_none());
        assert_eq!(record.company_name, "BARE"); // falls back to the ticker
    }

    /// Provider stub: fails for configured symbols, succeeds otherwise
    struct StubProvider {
        failing: Vec<String>,
    }

    #[async_trait::async_trait]
    impl FinancialDataProvider for StubProvider {
        async fn fetch_company(&self, symbol: &str) -> Result<CompanySnapshot, FetchError> {
            if self.failing.iter().any(|s| s == symbol) {
                return Err(FetchError::UnknownSymbol(symbol.to_string()));
            }
            Ok(snapshot(&[120.0, 100.0], &[115.0, 100.0]))
        }
    }

    fn screener(failing: &[&str]) -> GrowthScreener {
        GrowthScreener::new(
            Arc::new(StubProvider {
                failing: failing.iter().map(|s| s.to_string()).collect(),
            }),
            RequestPacer::new(60_000), // effectively no delay in tests
        )
    }

    #[tokio::test]
    async fn test_screen_preserves_order_and_drops_empties() {
        let records = screener(&[])
            .screen("AAPL, , MSFT", &ScreeningCriteria::default(), None)
            .await;

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].ticker, "AAPL");
        assert_eq!(records[1].ticker, "MSFT");
    }

    #[tokio::test]
    async fn test_screen_isolates_per_ticker_failure() {
        let records = screener(&["AAPL"])
            .screen("AAPL,MSFT", &ScreeningCriteria::default(), None)
            .await;

        assert_eq!(records.len(), 2);
        assert!(records[0].is_error());
        assert!(records[0].error.as_deref().unwrap().contains("AAPL"));
        assert!(!records[1].is_error());
        assert!(records[1].meets_criteria);
    }

    #[tokio::test]
    async fn test_screen_reports_progress_per_ticker() {
        use std::sync::Mutex;

        let seen: Arc<Mutex<Vec<(usize, usize, String)>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let progress: ProgressFn = Box::new(move |completed, total, ticker| {
            sink.lock().unwrap().push((completed, total, ticker.to_string()));
        });

        screener(&[])
            .screen("AAPL,MSFT,NVDA", &ScreeningCriteria::default(), Some(progress))
            .await;

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                (1, 3, "AAPL".to_string()),
                (2, 3, "MSFT".to_string()),
                (3, 3, "NVDA".to_string()),
            ]
        );
    }
}
