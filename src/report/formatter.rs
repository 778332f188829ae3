use std::fmt::{self, Write};

use crate::data::types::{Market, MarketEvent, NOT_AVAILABLE};

/// Decimal places for probabilities in the text report.
pub const REPORT_DECIMALS: usize = 2;

const RULE_WIDTH: usize = 60;

/// Render the event as the plain-text report used for display and as the
/// body of the analysis prompt.
///
/// Layout: header (title, description), one section per market (question,
/// numbered odds, stats, status), footer (end date). Missing values print
/// as `N/A`.
pub fn format_report(event: &MarketEvent) -> String {
    let mut out = String::new();
    // Writing into a String never fails.
    write_report(&mut out, event).map(|()| out).unwrap_or_default()
}

fn write_report(out: &mut impl Write, event: &MarketEvent) -> fmt::Result {
    let heavy = "=".repeat(RULE_WIDTH);
    let light = "─".repeat(RULE_WIDTH);

    writeln!(out, "📊 POLYMARKET EVENT DATA")?;
    writeln!(out, "{}\n", heavy)?;
    writeln!(out, "📋 Event: {}", or_na(event.title.as_deref()))?;
    writeln!(out, "📝 Description: {}\n", or_na(event.description.as_deref()))?;
    writeln!(out, "🎯 MARKETS & CURRENT ODDS:")?;

    if event.markets.is_empty() {
        writeln!(out, "\n⚠️  No markets found for this event")?;
    }

    for (i, market) in event.markets.iter().enumerate() {
        writeln!(out, "\n{}", light)?;
        write_market(out, i + 1, market)?;
    }

    writeln!(out, "\n{}", heavy)?;
    writeln!(out, "📅 EVENT INFO:")?;
    writeln!(out, "  • End Date: {}", or_na(event.end_date.as_deref()))
}

fn write_market(out: &mut impl Write, number: usize, market: &Market) -> fmt::Result {
    writeln!(out, "Market {}: {}\n", number, or_na(market.question.as_deref()))?;
    writeln!(out, "💰 OUTCOMES & ODDS:")?;

    if market.outcomes.is_empty() {
        writeln!(out, "  ⚠️  No outcomes available")?;
    }
    for (j, row) in market.outcome_rows(REPORT_DECIMALS).iter().enumerate() {
        writeln!(out, "  {}. {}: {}", j + 1, row.label, row.probability)?;
    }

    writeln!(out, "\n📈 MARKET STATS:")?;
    writeln!(out, "  • Total Volume: {}", stat(market.volume))?;
    writeln!(out, "  • 24h Volume: {}", stat(market.volume_24hr))?;
    writeln!(out, "  • Liquidity: {}", stat(market.liquidity))?;
    writeln!(out, "  • Status: {}", status_marker(market))
}

/// Status flag shown per market.
pub fn status_marker(market: &Market) -> &'static str {
    if market.is_active() {
        "🟢 Active"
    } else {
        "🔴 Closed"
    }
}

fn stat(value: Option<f64>) -> String {
    value.map(format_grouped).unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn or_na(value: Option<&str>) -> &str {
    value.unwrap_or(NOT_AVAILABLE)
}

/// Format with thousands separators and at most three fraction digits,
/// e.g. `1234567.891` -> `1,234,567.891`, `1000000.0` -> `1,000,000`.
pub fn format_grouped(value: f64) -> String {
    let fixed = format!("{:.3}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut out = String::with_capacity(fixed.len() + int_part.len() / 3 + 1);
    if value < 0.0 && fixed.bytes().any(|b| b.is_ascii_digit() && b != b'0') {
        out.push('-');
    }
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(frac_part);
    }
    out
}
