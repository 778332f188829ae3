use serde::{Deserialize, Serialize};

/// Event as seen by the pipeline after normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketEvent {
    pub title: Option<String>,
    pub description: Option<String>,
    pub end_date: Option<String>,
    pub markets: Vec<Market>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Market {
    pub question: Option<String>,
    pub outcomes: Vec<String>,
    pub outcome_prices: Vec<PriceValue>,
    pub volume: Option<f64>,
    pub volume_24hr: Option<f64>,
    pub liquidity: Option<f64>,
    pub active: bool,
    pub closed: bool,
}

/// A single outcome price. Gamma sends fractions (`"0.755"`), but anything
/// that does not parse as a number is carried through verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PriceValue {
    Fraction(f64),
    Raw(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedOutcome {
    pub label: String,
    pub probability: String,
}

pub const NOT_AVAILABLE: &str = "N/A";

impl PriceValue {
    /// Render as a percentage with `decimals` places, e.g. `0.755` -> `75.50%`.
    pub fn as_percentage(&self, decimals: usize) -> String {
        match self {
            PriceValue::Fraction(p) if (p * 100.0).is_finite() => {
                format!("{:.*}%", decimals, p * 100.0)
            }
            PriceValue::Fraction(p) => p.to_string(),
            PriceValue::Raw(s) => s.clone(),
        }
    }
}

impl Market {
    /// Active only while the market is open for trading.
    pub fn is_active(&self) -> bool {
        self.active && !self.closed
    }

    /// Outcome labels paired positionally with their prices. Missing prices
    /// render as `N/A`.
    pub fn outcome_rows(&self, decimals: usize) -> Vec<NormalizedOutcome> {
        self.outcomes
            .iter()
            .enumerate()
            .map(|(i, label)| NormalizedOutcome {
                label: label.clone(),
                probability: self
                    .outcome_prices
                    .get(i)
                    .map(|p| p.as_percentage(decimals))
                    .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            })
            .collect()
    }
}
