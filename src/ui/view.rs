use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Gauge, List, ListItem, Paragraph, Row, Table},
    Frame,
};

use crate::analysis::report::format_metric;

use super::state::{InputField, ScreenerState};

/// Render the whole screener view
pub fn render(f: &mut Frame, state: &ScreenerState) {
    let error_count = state
        .report
        .as_ref()
        .map(|r| r.errors.len())
        .unwrap_or(0);
    let errors_height = if error_count > 0 {
        (error_count as u16 + 2).min(8)
    } else {
        0
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5),             // Criteria inputs
            Constraint::Length(3),             // Progress / notices
            Constraint::Min(0),                // Results table
            Constraint::Length(errors_height), // Failed tickers
            Constraint::Length(3),             // Summary + key help
        ])
        .split(f.area());

    render_inputs(f, state, chunks[0]);
    render_progress(f, state, chunks[1]);
    render_results(f, state, chunks[2]);
    if errors_height > 0 {
        render_errors(f, state, chunks[3]);
    }
    render_status_bar(f, state, chunks[4]);
}

fn input_line<'a>(label: &'a str, value: &'a str, focused: bool) -> Line<'a> {
    let marker = if focused { "▸ " } else { "  " };
    let value_style = if focused {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    };

    Line::from(vec![
        Span::styled(marker, Style::default().fg(Color::Yellow)),
        Span::styled(label, Style::default().fg(Color::Gray)),
        Span::styled(value, value_style),
        if focused {
            Span::styled("█", Style::default().fg(Color::Yellow))
        } else {
            Span::raw("")
        },
    ])
}

fn render_inputs(f: &mut Frame, state: &ScreenerState, area: Rect) {
    let lines = vec![
        input_line(
            "Tickers (comma-separated): ",
            &state.ticker_input,
            state.focused == InputField::Tickers,
        ),
        input_line(
            "Min Revenue Growth (%):    ",
            &state.min_revenue_input,
            state.focused == InputField::MinRevenueGrowth,
        ),
        input_line(
            "Min Earnings Growth (%):   ",
            &state.min_earnings_input,
            state.focused == InputField::MinEarningsGrowth,
        ),
    ];

    let title = format!(
        "📈 Growth Stock Screener (show all: {})",
        if state.show_all { "on" } else { "off" }
    );
    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title));

    f.render_widget(paragraph, area);
}

fn render_progress(f: &mut Frame, state: &ScreenerState, area: Rect) {
    if state.running {
        let (completed, total, ticker) = state
            .progress
            .clone()
            .unwrap_or((0, 0, String::new()));
        let ratio = if total > 0 {
            completed as f64 / total as f64
        } else {
            0.0
        };
        let label = if total > 0 {
            format!("{}/{}: {}", completed, total, ticker)
        } else {
            "Starting...".to_string()
        };

        let gauge = Gauge::default()
            .block(Block::default().borders(Borders::ALL).title("Screening"))
            .gauge_style(Style::default().fg(Color::Green))
            .ratio(ratio)
            .label(label);
        f.render_widget(gauge, area);
        return;
    }

    let mut notices: Vec<Span> = Vec::new();
    if let Some(report) = &state.report {
        if report.filter_fell_back {
            notices.push(Span::styled(
                "No stocks met the criteria, showing all results. ",
                Style::default().fg(Color::Yellow),
            ));
        }
    }
    if let Some(status) = &state.status {
        notices.push(Span::styled(
            status.clone(),
            Style::default().fg(Color::Gray),
        ));
    }
    if notices.is_empty() {
        notices.push(Span::styled(
            "Press Enter to screen",
            Style::default().fg(Color::Gray),
        ));
    }

    let paragraph = Paragraph::new(Line::from(notices))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(paragraph, area);
}

fn render_results(f: &mut Frame, state: &ScreenerState, area: Rect) {
    let Some(report) = &state.report else {
        let paragraph = Paragraph::new(vec![
            Line::from(""),
            Line::from("Enter tickers above and press Enter to screen for"),
            Line::from("revenue and earnings growth."),
        ])
        .block(Block::default().borders(Borders::ALL).title("Results"))
        .style(Style::default().fg(Color::Gray));
        f.render_widget(paragraph, area);
        return;
    };

    let header = Row::new(vec![
        "Ticker",
        "Company",
        "Sector",
        "Mkt Cap (B)",
        "P/E",
        "Rev Growth %",
        "Earn Growth %",
        "Meets",
    ])
    .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = report
        .displayed
        .iter()
        .map(|record| {
            let meets_cell = if record.meets_criteria {
                Cell::from("✔").style(Style::default().fg(Color::Green))
            } else {
                Cell::from("✘").style(Style::default().fg(Color::Red))
            };

            Row::new(vec![
                Cell::from(record.ticker.clone()),
                Cell::from(record.company_name.clone()),
                Cell::from(record.sector.clone().unwrap_or_else(|| "N/A".to_string())),
                Cell::from(format_metric(record.market_cap_billions)),
                Cell::from(format_metric(record.pe_ratio)),
                Cell::from(format_metric(record.revenue_growth_pct)),
                Cell::from(format_metric(record.earnings_growth_pct)),
                meets_cell,
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(8),
        Constraint::Min(20),
        Constraint::Length(18),
        Constraint::Length(12),
        Constraint::Length(8),
        Constraint::Length(13),
        Constraint::Length(14),
        Constraint::Length(6),
    ];

    let title = format!("Results ({} shown)", report.displayed.len());
    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title));

    f.render_widget(table, area);
}

fn render_errors(f: &mut Frame, state: &ScreenerState, area: Rect) {
    let Some(report) = &state.report else {
        return;
    };

    let items: Vec<ListItem> = report
        .errors
        .iter()
        .map(|record| {
            ListItem::new(format!(
                "{}: {}",
                record.ticker,
                record.error.as_deref().unwrap_or("unknown error")
            ))
            .style(Style::default().fg(Color::Red))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("⚠ Failed tickers ({})", report.errors.len())),
    );
    f.render_widget(list, area);
}

fn render_status_bar(f: &mut Frame, state: &ScreenerState, area: Rect) {
    let summary = state
        .report
        .as_ref()
        .map(|report| {
            format!(
                "Analyzed: {} • Meeting criteria: {} • Avg rev growth: {} • Avg earn growth: {}  |  ",
                report.summary.total_analyzed,
                report.summary.meeting_criteria,
                format_metric(report.summary.avg_revenue_growth),
                format_metric(report.summary.avg_earnings_growth),
            )
        })
        .unwrap_or_default();

    let line = Line::from(vec![
        Span::styled(summary, Style::default().fg(Color::White)),
        Span::styled("Tab", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
        Span::styled(" field • ", Style::default().fg(Color::Gray)),
        Span::styled("Enter", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
        Span::styled(" screen • ", Style::default().fg(Color::Gray)),
        Span::styled("Ctrl-A", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
        Span::styled(" show all • ", Style::default().fg(Color::Gray)),
        Span::styled("Ctrl-E", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
        Span::styled(" export • ", Style::default().fg(Color::Gray)),
        Span::styled("Esc", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
        Span::styled(" quit", Style::default().fg(Color::Gray)),
    ]);

    let paragraph = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
    f.render_widget(paragraph, area);
}
