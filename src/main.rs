use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use growth_screener::analysis::report::format_metric;
use growth_screener::analysis::{build_report, parse_tickers, GrowthScreener, ProgressFn};
use growth_screener::api::{RequestPacer, YahooClient};
use growth_screener::export::export_csv;
use growth_screener::models::{Config, ScreeningCriteria};
use growth_screener::ui;

/// Default ticker list shown on first launch of the TUI
const DEFAULT_TICKERS: &str = "AAPL,MSFT,GOOGL,NVDA";

#[derive(Parser, Debug)]
#[command(
    name = "growth-screener",
    about = "Screen stocks on year-over-year revenue and earnings growth"
)]
struct Cli {
    /// Comma-separated ticker symbols; omit to launch the interactive TUI
    #[arg(long)]
    tickers: Option<String>,

    /// Minimum revenue growth threshold, percent
    #[arg(long, default_value_t = 15.0)]
    min_revenue_growth: f64,

    /// Minimum earnings growth threshold, percent
    #[arg(long, default_value_t = 10.0)]
    min_earnings_growth: f64,

    /// Show every fetched company instead of only those meeting the criteria
    #[arg(long)]
    show_all: bool,

    /// Directory to write the results CSV into
    #[arg(long)]
    export: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Configuration Error: {}", e);
            std::process::exit(1);
        }
    };

    let criteria = ScreeningCriteria {
        min_revenue_growth: cli.min_revenue_growth,
        min_earnings_growth: cli.min_earnings_growth,
        show_all: cli.show_all,
    };

    match cli.tickers {
        Some(tickers) => {
            // Headless run: normal logging to stderr
            let subscriber = FmtSubscriber::builder()
                .with_max_level(Level::INFO)
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| "growth_screener=info".into()),
                )
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)
                .expect("setting default subscriber failed");

            run_headless(&config, &criteria, &tickers, cli.export.as_deref()).await
        }
        None => {
            // Suppress most logs so they do not corrupt the TUI
            let subscriber = FmtSubscriber::builder()
                .with_max_level(Level::ERROR)
                .with_env_filter("growth_screener=error")
                .finish();
            tracing::subscriber::set_global_default(subscriber)
                .expect("setting default subscriber failed");

            let provider = Arc::new(YahooClient::new(&config)?);
            let criteria = criteria.clone();
            let config_for_app = config.clone();
            tokio::task::block_in_place(move || {
                ui::run_app(config_for_app, provider, DEFAULT_TICKERS, &criteria)
            })
        }
    }
}

/// Screen once and print the results to stdout
async fn run_headless(
    config: &Config,
    criteria: &ScreeningCriteria,
    tickers: &str,
    export_dir: Option<&std::path::Path>,
) -> Result<()> {
    if parse_tickers(tickers).is_empty() {
        eprintln!("❌ Enter at least one ticker symbol");
        std::process::exit(1);
    }

    let provider = Arc::new(YahooClient::new(config)?);
    let screener = GrowthScreener::new(provider, RequestPacer::new(config.rate_limit_per_minute));

    let progress: ProgressFn = Box::new(|completed, total, ticker| {
        println!("🔍 [{}/{}] {}", completed, total, ticker);
    });

    let records = screener.screen(tickers, criteria, Some(progress)).await;
    let report = build_report(&records, criteria.show_all);

    println!();
    if report.filter_fell_back {
        println!("⚠️  No stocks met the criteria, showing all results");
        println!();
    }

    println!(
        "{:<8} {:<28} {:<18} {:>12} {:>8} {:>13} {:>14} {:>6}",
        "Ticker", "Company", "Sector", "Mkt Cap (B)", "P/E", "Rev Growth %", "Earn Growth %", "Meets"
    );
    for record in &report.displayed {
        println!(
            "{:<8} {:<28} {:<18} {:>12} {:>8} {:>13} {:>14} {:>6}",
            record.ticker,
            truncate(&record.company_name, 28),
            truncate(record.sector.as_deref().unwrap_or("N/A"), 18),
            format_metric(record.market_cap_billions),
            format_metric(record.pe_ratio),
            format_metric(record.revenue_growth_pct),
            format_metric(record.earnings_growth_pct),
            if record.meets_criteria { "Yes" } else { "No" },
        );
    }

    if !report.errors.is_empty() {
        println!();
        println!("⚠️  Failed tickers:");
        for record in &report.errors {
            println!(
                "   {}: {}",
                record.ticker,
                record.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    println!();
    println!(
        "📊 Analyzed: {} • Meeting criteria: {} • Avg revenue growth: {} • Avg earnings growth: {}",
        report.summary.total_analyzed,
        report.summary.meeting_criteria,
        format_metric(report.summary.avg_revenue_growth),
        format_metric(report.summary.avg_earnings_growth),
    );

    if let Some(dir) = export_dir {
        let path = export_csv(&report.displayed, dir)?;
        println!("✅ Exported to {}", path.display());
    }

    Ok(())
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let head: String = text.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", head)
    } else {
        text.to_string()
    }
}
