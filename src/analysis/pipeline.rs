use serde_json::Value;

use crate::ai::prompt::{build_prompt, search_query as query_for_event};
use crate::ai::response::{parse_response, AnalysisResult};
use crate::data::normalizer::{normalize_payload, PayloadError};
use crate::data::types::MarketEvent;
use crate::report::display::render_odds;
use crate::report::formatter::format_report;

/// Everything derived from one payload before the backend is called.
#[derive(Debug, Clone)]
pub struct PreparedAnalysis {
    pub event: MarketEvent,
    pub report: String,
    pub odds_markup: String,
    pub search_query: String,
    pub prompt: String,
}

/// Payload -> normalized event -> report/markup -> prompt.
pub fn prepare(payload: &Value, context: Option<&str>) -> Result<PreparedAnalysis, PayloadError> {
    let event = normalize_payload(payload)?;
    Ok(prepare_event(event, context))
}

pub fn prepare_event(event: MarketEvent, context: Option<&str>) -> PreparedAnalysis {
    let report = format_report(&event);
    let odds_markup = render_odds(&event);
    let search_query = query_for_event(&event);
    let prompt = build_prompt(&report, context, &search_query);

    PreparedAnalysis {
        event,
        report,
        odds_markup,
        search_query,
        prompt,
    }
}

/// Query for the context lookup, derived without building the report.
pub fn search_query(payload: &Value) -> Result<String, PayloadError> {
    normalize_payload(payload).map(|event| query_for_event(&event))
}

pub fn finish(reply: &str) -> AnalysisResult {
    parse_response(reply)
}
