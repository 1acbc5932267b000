use crate::models::TickerRecord;

use super::round2;

/// Aggregate statistics over the successfully fetched records
#[derive(Debug, Clone, PartialEq)]
pub struct ScreeningSummary {
    pub total_analyzed: usize,
    pub meeting_criteria: usize,
    /// Mean revenue growth over records where it is present; absent when
    /// no record has a value
    pub avg_revenue_growth: Option<f64>,
    pub avg_earnings_growth: Option<f64>,
}

/// Presentation-ready view of a screening run
#[derive(Debug, Clone)]
pub struct ScreeningReport {
    /// Filtered and sorted success records, ready for display and export
    pub displayed: Vec<TickerRecord>,
    /// Records whose fetch failed, listed separately
    pub errors: Vec<TickerRecord>,
    pub summary: ScreeningSummary,
    /// True when the criteria filter matched nothing and the view fell
    /// back to showing every success record
    pub filter_fell_back: bool,
}

/// Partition, filter, sort and summarize raw screening records.
///
/// With `show_all` false only records meeting the criteria are displayed;
/// if none do, the view falls back to all success records. Display order
/// is revenue growth descending, records without a value last.
pub fn build_report(records: &[TickerRecord], show_all: bool) -> ScreeningReport {
    let (success, errors): (Vec<TickerRecord>, Vec<TickerRecord>) =
        records.iter().cloned().partition(|r| !r.is_error());

    let summary = summarize(&success);

    let mut filter_fell_back = false;
    let mut displayed: Vec<TickerRecord> = if show_all {
        success
    } else {
        let passing: Vec<TickerRecord> = success
            .iter()
            .filter(|r| r.meets_criteria)
            .cloned()
            .collect();
        if passing.is_empty() && !success.is_empty() {
            filter_fell_back = true;
            success
        } else {
            passing
        }
    };

    displayed.sort_by(|a, b| match (a.revenue_growth_pct, b.revenue_growth_pct) {
        (Some(left), Some(right)) => right
            .partial_cmp(&left)
            .unwrap_or(std::cmp::Ordering::Equal),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });

    ScreeningReport {
        displayed,
        errors,
        summary,
        filter_fell_back,
    }
}

fn summarize(success: &[TickerRecord]) -> ScreeningSummary {
    ScreeningSummary {
        total_analyzed: success.len(),
        meeting_criteria: success.iter().filter(|r| r.meets_criteria).count(),
        avg_revenue_growth: mean_of(success.iter().filter_map(|r| r.revenue_growth_pct)),
        avg_earnings_growth: mean_of(success.iter().filter_map(|r| r.earnings_growth_pct)),
    }
}

fn mean_of(values: impl Iterator<Item = f64>) -> Option<f64> {
    let values: Vec<f64> = values.collect();
    if values.is_empty() {
        None
    } else {
        Some(round2(values.iter().sum::<f64>() / values.len() as f64))
    }
}

/// Format an optional metric for display, `N/A` when undefined
pub fn format_metric(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.2}", v))
        .unwrap_or_else(|| "N/A".to_string())
}
