use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::data::types::{Market, MarketEvent, PriceValue, NOT_AVAILABLE};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PayloadError {
    #[error("Invalid event data structure: expected an object or a list, got {0}")]
    NotAnObject(&'static str),

    #[error("Invalid event data structure: event has no markets field")]
    MissingMarkets,

    #[error("Invalid event data structure: markets field is not a list")]
    MarketsNotAList,
}

/// Gamma encodes list fields either as real arrays or as JSON text inside a
/// string (`"[\"Yes\", \"No\"]"`, sometimes with single quotes).
#[derive(Debug, Deserialize, Clone)]
#[serde(untagged)]
enum JsonStringOrVec {
    Vec(Vec<Value>),
    JsonString(String),
}

impl JsonStringOrVec {
    fn into_vec(self) -> Option<Vec<Value>> {
        match self {
            JsonStringOrVec::Vec(v) => Some(v),
            JsonStringOrVec::JsonString(s) => {
                let s = s.trim();
                if s.is_empty() {
                    return None;
                }
                serde_json::from_str(s)
                    .or_else(|_| serde_json::from_str(&s.replace('\'', "\"")))
                    .ok()
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMarket {
    #[serde(default)]
    question: Option<String>,
    #[serde(default)]
    outcomes: Option<JsonStringOrVec>,
    #[serde(default)]
    outcome_prices: Option<JsonStringOrVec>,
    #[serde(default)]
    volume: Option<Value>,
    #[serde(default, rename = "volume24hr")]
    volume_24hr: Option<Value>,
    #[serde(default)]
    liquidity: Option<Value>,
    #[serde(default)]
    active: Option<bool>,
    #[serde(default)]
    closed: Option<bool>,
}

/// Normalize a raw event payload.
///
/// Accepts either an event object carrying a `markets` list, or a list. A list
/// whose first element is itself an event (what `/events?slug=` returns) is
/// unwrapped; any other list is taken as the market list of an untitled event.
///
/// Individual markets that are malformed are dropped, never reported.
pub fn normalize_payload(payload: &Value) -> Result<MarketEvent, PayloadError> {
    match payload {
        Value::Object(obj) => {
            let markets = match obj.get("markets") {
                None | Some(Value::Null) => return Err(PayloadError::MissingMarkets),
                Some(Value::Array(markets)) => markets,
                Some(_) => return Err(PayloadError::MarketsNotAList),
            };

            Ok(MarketEvent {
                title: text_field(payload, "title"),
                description: text_field(payload, "description"),
                end_date: text_field(payload, "endDate"),
                markets: normalize_markets(markets),
            })
        }
        Value::Array(items) => match items.first() {
            Some(first) if first.get("markets").is_some() => normalize_payload(first),
            _ => Ok(MarketEvent {
                title: None,
                description: None,
                end_date: None,
                markets: normalize_markets(items),
            }),
        },
        other => Err(PayloadError::NotAnObject(json_kind(other))),
    }
}

/// Normalize every market independently, keeping source order.
pub fn normalize_markets(raw: &[Value]) -> Vec<Market> {
    raw.iter()
        .enumerate()
        .filter_map(|(i, value)| match normalize_market(value) {
            Some(market) => Some(market),
            None => {
                debug!("Skipping market #{}: missing or unparsable outcomes", i + 1);
                None
            }
        })
        .collect()
}

/// Convert one raw market. `None` means the market is dropped.
pub fn normalize_market(value: &Value) -> Option<Market> {
    let raw: RawMarket = match serde_json::from_value(value.clone()) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Malformed market record: {}", e);
            return None;
        }
    };

    let outcomes = raw.outcomes?.into_vec()?;
    let prices = raw.outcome_prices?.into_vec()?;

    Some(Market {
        question: raw.question.filter(|q| !q.is_empty()),
        outcomes: outcomes.into_iter().map(label_text).collect(),
        outcome_prices: prices.into_iter().map(price_value).collect(),
        volume: raw.volume.as_ref().and_then(numeric),
        volume_24hr: raw.volume_24hr.as_ref().and_then(numeric),
        liquidity: raw.liquidity.as_ref().and_then(numeric),
        active: raw.active.unwrap_or(false),
        closed: raw.closed.unwrap_or(false),
    })
}

fn text_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn label_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

fn price_value(value: Value) -> PriceValue {
    match value {
        Value::Number(n) => match n.as_f64().filter(|f| renders_as_percentage(*f)) {
            Some(f) => PriceValue::Fraction(f),
            None => PriceValue::Raw(n.to_string()),
        },
        Value::String(s) => match s.trim().parse::<f64>() {
            Ok(f) if renders_as_percentage(f) => PriceValue::Fraction(f),
            _ => PriceValue::Raw(s),
        },
        Value::Null => PriceValue::Raw(NOT_AVAILABLE.to_string()),
        other => PriceValue::Raw(other.to_string()),
    }
}

/// The value must stay finite once scaled to a percentage.
fn renders_as_percentage(fraction: f64) -> bool {
    (fraction * 100.0).is_finite()
}

/// Gamma reports volume/liquidity as numbers or numeric strings.
fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pairing_order_and_count_preserved() {
        let market = normalize_market(&json!({
            "question": "Who wins?",
            "outcomes": ["A", "B", "C"],
            "outcomePrices": ["0.5", "0.3", "0.2"],
        }))
        .unwrap();

        let rows = market.outcome_rows(2);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].label, "A");
        assert_eq!(rows[0].probability, "50.00%");
        assert_eq!(rows[1].label, "B");
        assert_eq!(rows[1].probability, "30.00%");
        assert_eq!(rows[2].label, "C");
        assert_eq!(rows[2].probability, "20.00%");
    }

    #[test]
    fn test_single_quoted_strings_match_true_arrays() {
        let stringified = normalize_market(&json!({
            "outcomes": "['Yes','No']",
            "outcomePrices": "['0.6','0.4']",
        }))
        .unwrap();
        let arrays = normalize_market(&json!({
            "outcomes": ["Yes", "No"],
            "outcomePrices": ["0.6", "0.4"],
        }))
        .unwrap();

        assert_eq!(stringified, arrays);
    }

    #[test]
    fn test_double_quoted_json_string() {
        let market = normalize_market(&json!({
            "outcomes": "[\"Yes\", \"No\"]",
            "outcomePrices": "[\"0.755\", \"0.245\"]",
        }))
        .unwrap();

        assert_eq!(market.outcomes, vec!["Yes", "No"]);
        assert_eq!(market.outcome_prices[0], PriceValue::Fraction(0.755));
    }

    #[test]
    fn test_apostrophe_in_double_quoted_labels() {
        let market = normalize_market(&json!({
            "outcomes": "[\"Beto O'Rourke\", \"Ted Cruz\"]",
            "outcomePrices": "[\"0.4\", \"0.6\"]",
        }))
        .unwrap();

        assert_eq!(market.outcomes, vec!["Beto O'Rourke", "Ted Cruz"]);
        assert_eq!(market.outcome_prices[1], PriceValue::Fraction(0.6));
    }

    #[test]
    fn test_huge_price_is_raw() {
        let market = normalize_market(&json!({
            "outcomes": ["Yes", "No"],
            "outcomePrices": ["1e308", 1e308],
        }))
        .unwrap();

        assert_eq!(market.outcome_prices[0], PriceValue::Raw("1e308".to_string()));
        assert!(matches!(market.outcome_prices[1], PriceValue::Raw(_)));
        assert_eq!(market.outcome_rows(2)[0].probability, "1e308");
    }

    #[test]
    fn test_missing_fields_drop_market() {
        assert!(normalize_market(&json!({ "outcomes": ["Yes", "No"] })).is_none());
        assert!(normalize_market(&json!({ "outcomePrices": ["0.5"] })).is_none());
        assert!(normalize_market(&json!({ "outcomes": "", "outcomePrices": "" })).is_none());
    }

    #[test]
    fn test_unparsable_market_does_not_abort_others() {
        let markets = normalize_markets(&[
            json!({ "question": "bad", "outcomes": "[Yes, No", "outcomePrices": "[0.5]" }),
            json!("not a market"),
            json!({ "question": "good", "outcomes": ["Yes"], "outcomePrices": [0.9] }),
        ]);

        assert_eq!(markets.len(), 1);
        assert_eq!(markets[0].question.as_deref(), Some("good"));
        assert_eq!(markets[0].outcome_prices[0], PriceValue::Fraction(0.9));
    }

    #[test]
    fn test_non_numeric_price_is_raw() {
        let market = normalize_market(&json!({
            "outcomes": ["Yes", "No"],
            "outcomePrices": ["tbd", null],
        }))
        .unwrap();

        assert_eq!(market.outcome_prices[0], PriceValue::Raw("tbd".to_string()));
        assert_eq!(market.outcome_prices[1], PriceValue::Raw("N/A".to_string()));
    }

    #[test]
    fn test_stats_accept_numbers_and_strings() {
        let market = normalize_market(&json!({
            "outcomes": ["Yes", "No"],
            "outcomePrices": ["0.5", "0.5"],
            "volume": "1234.5",
            "volume24hr": 99,
            "liquidity": "lots",
            "active": true,
            "closed": false,
        }))
        .unwrap();

        assert_eq!(market.volume, Some(1234.5));
        assert_eq!(market.volume_24hr, Some(99.0));
        assert_eq!(market.liquidity, None);
        assert!(market.is_active());
    }

    #[test]
    fn test_event_object() {
        let event = normalize_payload(&json!({
            "title": "Will X happen?",
            "description": "",
            "endDate": "2026-12-31T00:00:00Z",
            "markets": [
                { "outcomes": ["Yes", "No"], "outcomePrices": ["0.6", "0.4"] },
                { "question": "dropped" },
            ],
        }))
        .unwrap();

        assert_eq!(event.title.as_deref(), Some("Will X happen?"));
        assert_eq!(event.description, None);
        assert_eq!(event.end_date.as_deref(), Some("2026-12-31T00:00:00Z"));
        assert_eq!(event.markets.len(), 1);
    }

    #[test]
    fn test_event_list_is_unwrapped() {
        let event = normalize_payload(&json!([
            { "title": "First", "markets": [] },
            { "title": "Second", "markets": [] },
        ]))
        .unwrap();

        assert_eq!(event.title.as_deref(), Some("First"));
    }

    #[test]
    fn test_bare_market_list() {
        let event = normalize_payload(&json!([
            { "question": "Q1", "outcomes": ["Yes", "No"], "outcomePrices": ["0.1", "0.9"] },
        ]))
        .unwrap();

        assert_eq!(event.title, None);
        assert_eq!(event.markets.len(), 1);
    }

    #[test]
    fn test_malformed_payload_is_error() {
        assert_eq!(
            normalize_payload(&json!("oops")),
            Err(PayloadError::NotAnObject("a string"))
        );
        assert_eq!(
            normalize_payload(&json!({ "title": "no markets" })),
            Err(PayloadError::MissingMarkets)
        );
        assert_eq!(
            normalize_payload(&json!({ "markets": "[]" })),
            Err(PayloadError::MarketsNotAList)
        );
    }
}
