use std::fmt::Write;

use crate::ai::response::AnalysisResult;
use crate::data::types::{MarketEvent, NOT_AVAILABLE};

/// Decimal places for probabilities in the on-screen odds table.
pub const DISPLAY_DECIMALS: usize = 1;

/// Odds table as markup: one group per market, one row per outcome.
/// Never fed back into the prompt.
pub fn render_odds(event: &MarketEvent) -> String {
    if event.markets.is_empty() {
        return r#"<div class="odds-display"><p class="odds-empty">No market data available</p></div>"#
            .to_string();
    }

    let mut out = String::from(r#"<div class="odds-display">"#);
    for market in &event.markets {
        out.push_str(r#"<div class="odds-market">"#);
        let _ = write!(
            out,
            r#"<div class="odds-question">{}</div>"#,
            escape(market.question.as_deref().unwrap_or("Market"))
        );

        if market.outcomes.is_empty() {
            out.push_str(r#"<p class="odds-empty">No outcomes available</p>"#);
        }
        for row in market.outcome_rows(DISPLAY_DECIMALS) {
            let _ = write!(
                out,
                r#"<div class="odds-item"><span class="odds-label">{}</span><span class="odds-value">{}</span></div>"#,
                escape(&row.label),
                escape(&row.probability)
            );
        }
        out.push_str("</div>");
    }
    out.push_str("</div>");
    out
}

/// Analysis block: confidence and risk badges followed by the reply text.
pub fn render_analysis(result: &AnalysisResult) -> String {
    let confidence = result
        .confidence_percent
        .map(|c| format!("{}%", c.min(100)))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    let (risk_class, risk) = match result.risk_level {
        Some(level) => (level.to_string().to_lowercase(), level.to_string()),
        None => ("unknown".to_string(), NOT_AVAILABLE.to_string()),
    };

    format!(
        concat!(
            r#"<div class="analysis">"#,
            r#"<div class="analysis-badges">"#,
            r#"<span class="badge confidence">Confidence: {}</span>"#,
            r#"<span class="badge risk risk-{}">Risk: {}</span>"#,
            "</div>",
            r#"<div class="analysis-text" style="white-space: pre-wrap;">{}</div>"#,
            "</div>"
        ),
        confidence,
        risk_class,
        risk,
        escape(&result.raw_text)
    )
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
