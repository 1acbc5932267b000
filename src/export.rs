use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Local;
use tracing::info;

use crate::analysis::report::format_metric;
use crate::models::TickerRecord;

/// Column headers, matching the display column order
const CSV_HEADERS: [&str; 8] = [
    "Ticker",
    "Company",
    "Sector",
    "Market Cap (B)",
    "P/E Ratio",
    "Revenue Growth (%)",
    "Earnings Growth (%)",
    "Meets Criteria",
];

/// Write the displayed records to a timestamped CSV file in `dir`.
/// Returns the path of the file written.
pub fn export_csv(records: &[TickerRecord], dir: &Path) -> Result<PathBuf> {
    let filename = format!(
        "growth_screen_{}.csv",
        Local::now().format("%Y%m%d_%H%M%S")
    );
    let path = dir.join(filename);

    let mut writer = csv::Writer::from_path(&path)?;
    writer.write_record(CSV_HEADERS)?;

    for record in records {
        writer.write_record([
            record.ticker.clone(),
            record.company_name.clone(),
            record.sector.clone().unwrap_or_else(|| "N/A".to_string()),
            format_metric(record.market_cap_billions),
            format_metric(record.pe_ratio),
            format_metric(record.revenue_growth_pct),
            format_metric(record.earnings_growth_pct),
            if record.meets_criteria { "Yes" } else { "No" }.to_string(),
        ])?;
    }

    writer.flush()?;
    info!("Exported {} records to {}", records.len(), path.display());
    Ok(path)
}
