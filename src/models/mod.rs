use serde::{Deserialize, Serialize};

/// Screening outcome for a single requested ticker.
///
/// A record is built exactly once per ticker per run and never mutated
/// afterwards. It is either a populated profile with `error` absent, or an
/// error record where every derived field is empty and `meets_criteria`
/// is false.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerRecord {
    pub ticker: String,
    pub company_name: String,
    pub market_cap_billions: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub sector: Option<String>,
    pub revenue_growth_pct: Option<f64>,
    pub earnings_growth_pct: Option<f64>,
    pub meets_criteria: bool,
    pub error: Option<String>,
}

impl TickerRecord {
    /// Build an error record for a ticker whose fetch or derivation failed.
    /// The message is truncated to 100 characters for display.
    pub fn from_error(ticker: &str, message: &str) -> Self {
        Self {
            ticker: ticker.to_string(),
            company_name: ticker.to_string(),
            market_cap_billions: None,
            pe_ratio: None,
            sector: None,
            revenue_growth_pct: None,
            earnings_growth_pct: None,
            meets_criteria: false,
            error: Some(message.chars().take(100).collect()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// User-supplied screening thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningCriteria {
    pub min_revenue_growth: f64,  // percent, default 15.0
    pub min_earnings_growth: f64, // percent, default 10.0
    pub show_all: bool,
}

impl Default for ScreeningCriteria {
    fn default() -> Self {
        Self {
            min_revenue_growth: 15.0,
            min_earnings_growth: 10.0,
            show_all: false,
        }
    }
}

/// Company metadata returned by the market-data provider
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub long_name: Option<String>,
    pub market_cap: Option<f64>,
    pub trailing_pe: Option<f64>,
    pub sector: Option<String>,
}

/// One annual income-statement row. Line items missing from the filing
/// stay `None`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatementPeriod {
    /// Fiscal period end as a unix timestamp, when the provider gives one
    pub end_date: Option<i64>,
    pub total_revenue: Option<f64>,
    pub net_income: Option<f64>,
}

/// Everything fetched for one ticker in a single provider call.
/// Statement rows are ordered most recent period first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanySnapshot {
    pub profile: CompanyProfile,
    pub statements: Vec<StatementPeriod>,
}

/// Configuration for the application
#[derive(Debug, Clone)]
pub struct Config {
    pub quote_api_base: String,
    pub user_agent: String,
    pub rate_limit_per_minute: u32,
    pub export_dir: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        Ok(Config {
            quote_api_base: std::env::var("QUOTE_API_BASE")
                .unwrap_or_else(|_| "https://query1.finance.yahoo.com".to_string()),
            user_agent: std::env::var("QUOTE_API_USER_AGENT")
                .unwrap_or_else(|_| "growth-screener/0.1".to_string()),
            rate_limit_per_minute: std::env::var("RATE_LIMIT_PER_MINUTE")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap_or(30),
            export_dir: std::env::var("EXPORT_DIR").unwrap_or_else(|_| ".".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        std::env::remove_var("QUOTE_API_BASE");
        std::env::remove_var("RATE_LIMIT_PER_MINUTE");

        let config = Config::from_env().unwrap();
        assert_eq!(config.quote_api_base, "https://query1.finance.yahoo.com");
        assert_eq!(config.rate_limit_per_minute, 30); // default value
    }

    #[test]
    fn test_error_record_has_no_derived_fields() {
        let record = TickerRecord::from_error("FAKE", "connection refused");

        assert_eq!(record.ticker, "FAKE");
        assert_eq!(record.company_name, "FAKE");
        assert!(record.market_cap_billions.is_none());
        assert!(record.pe_ratio.is_none());
        assert!(record.sector.is_none());
        assert!(record.revenue_growth_pct.is_none());
        assert!(record.earnings_growth_pct.is_none());
        assert!(!record.meets_criteria);
        assert_eq!(record.error.as_deref(), Some("connection refused"));
    }

    #[test]
    fn test_error_message_truncated_to_100_chars() {
        let long_message = "x".repeat(250);
        let record = TickerRecord::from_error("FAKE", &long_message);

        assert_eq!(record.error.unwrap().chars().count(), 100);
    }

    #[test]
    fn test_default_criteria() {
        let criteria = ScreeningCriteria::default();
        assert_eq!(criteria.min_revenue_growth, 15.0);
        assert_eq!(criteria.min_earnings_growth, 10.0);
        assert!(!criteria.show_all);
    }
}
