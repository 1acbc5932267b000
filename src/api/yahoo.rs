use reqwest::Client;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::models::{CompanyProfile, CompanySnapshot, Config, StatementPeriod};

use super::{FetchError, FinancialDataProvider};

const QUOTE_SUMMARY_MODULES: &str = "price,summaryDetail,assetProfile,incomeStatementHistory";

/// Client for the Yahoo Finance quoteSummary API.
///
/// A single quoteSummary call returns both the company metadata and the
/// annual income-statement history, so one request per ticker is enough.
pub struct YahooClient {
    client: Client,
    base_url: String,
}

impl YahooClient {
    /// Create a new Yahoo Finance client
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            base_url: config.quote_api_base.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch the raw quoteSummary payload for a symbol
    async fn quote_summary(&self, symbol: &str) -> Result<Value, FetchError> {
        let mut url = Url::parse(&format!(
            "{}/v10/finance/quoteSummary/{}",
            self.base_url, symbol
        ))
        .map_err(|e| FetchError::Malformed(format!("invalid request URL: {}", e)))?;
        url.query_pairs_mut()
            .append_pair("modules", QUOTE_SUMMARY_MODULES);

        debug!("Making request to: {}", url);

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status { status, body });
        }

        let json: Value = response.json().await?;
        Ok(json)
    }
}

#[async_trait::async_trait]
impl FinancialDataProvider for YahooClient {
    async fn fetch_company(&self, symbol: &str) -> Result<CompanySnapshot, FetchError> {
        let data = self.quote_summary(symbol).await?;
        let snapshot = parse_quote_summary(symbol, &data)?;

        debug!(
            "Retrieved snapshot for {}: {} statement periods",
            symbol,
            snapshot.statements.len()
        );
        Ok(snapshot)
    }
}

/// Extract a snapshot from a quoteSummary response body
fn parse_quote_summary(symbol: &str, data: &Value) -> Result<CompanySnapshot, FetchError> {
    let summary = data
        .get("quoteSummary")
        .ok_or_else(|| FetchError::Malformed("missing quoteSummary envelope".to_string()))?;

    if let Some(error) = summary.get("error") {
        if !error.is_null() {
            let description = error
                .get("description")
                .and_then(|v| v.as_str())
                .unwrap_or("unspecified provider error");
            return Err(FetchError::Provider(description.to_string()));
        }
    }

    let result = summary
        .get("result")
        .and_then(|v| v.as_array())
        .and_then(|results| results.first())
        .ok_or_else(|| FetchError::UnknownSymbol(symbol.to_string()))?;

    let price = result.get("price");
    let profile = CompanyProfile {
        long_name: price
            .and_then(|p| p.get("longName"))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string()),
        market_cap: price.and_then(|p| raw_f64(p.get("marketCap"))),
        trailing_pe: result
            .get("summaryDetail")
            .and_then(|d| raw_f64(d.get("trailingPE"))),
        sector: result
            .get("assetProfile")
            .and_then(|p| p.get("sector"))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string()),
    };

    // Yahoo orders statement rows most recent fiscal year first, which is
    // the order the growth derivation expects.
    let statements = result
        .get("incomeStatementHistory")
        .and_then(|h| h.get("incomeStatementHistory"))
        .and_then(|v| v.as_array())
        .map(|rows| {
            rows.iter()
                .map(|row| StatementPeriod {
                    end_date: row
                        .get("endDate")
                        .and_then(|d| d.get("raw"))
                        .and_then(|v| v.as_i64()),
                    total_revenue: raw_f64(row.get("totalRevenue")),
                    net_income: raw_f64(row.get("netIncome")),
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(CompanySnapshot {
        profile,
        statements,
    })
}

/// Yahoo wraps numeric fields as `{"raw": 1234.5, "fmt": "1.23k"}`
fn raw_f64(field: Option<&Value>) -> Option<f64> {
    field.and_then(|v| v.get("raw")).and_then(|v| v.as_f64())
}
