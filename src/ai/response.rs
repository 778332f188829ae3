use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

use crate::ai::prompt::{CONFIDENCE_LABEL, RISK_LABEL};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    fn from_word(word: &str) -> Option<Self> {
        match word.to_ascii_lowercase().as_str() {
            "low" => Some(RiskLevel::Low),
            "medium" => Some(RiskLevel::Medium),
            "high" => Some(RiskLevel::High),
            _ => None,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "Low"),
            RiskLevel::Medium => write!(f, "Medium"),
            RiskLevel::High => write!(f, "High"),
        }
    }
}

/// Structured view of a backend reply.
///
/// `confidence_percent` is whatever integer followed the marker; it is not
/// clamped here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub confidence_percent: Option<u32>,
    pub risk_level: Option<RiskLevel>,
    pub raw_text: String,
}

// Emphasis (`*`, `_`) and spacing may wrap either side of the colon.
static CONFIDENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i){}[*_\s]*:[*_\s]*([0-9]+)\s*%",
        label_pattern(CONFIDENCE_LABEL)
    ))
    .unwrap()
});

static RISK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i){}[*_\s]*:[*_\s]*(low|medium|high)(?:[^a-zA-Z]|$)",
        label_pattern(RISK_LABEL)
    ))
    .unwrap()
});

/// Words of a section label, tolerant of extra whitespace between them.
fn label_pattern(label: &str) -> String {
    label
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+")
}

/// Pull the confidence and risk markers out of free text. The first match of
/// each wins; absence of either is not an error. Confidence values too large
/// for `u32` saturate.
pub fn parse_response(text: &str) -> AnalysisResult {
    let confidence_percent = CONFIDENCE_RE
        .captures(text)
        .map(|cap| cap[1].parse::<u32>().unwrap_or(u32::MAX));

    let risk_level = RISK_RE
        .captures(text)
        .and_then(|cap| RiskLevel::from_word(&cap[1]));

    AnalysisResult {
        confidence_percent,
        risk_level,
        raw_text: text.to_string(),
    }
}
