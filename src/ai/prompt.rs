use crate::data::types::MarketEvent;

/// Section labels shared with the response parser. The model is asked to
/// echo these verbatim.
pub const RECOMMENDATION_LABEL: &str = "TOP RECOMMENDATION";
pub const ASSESSMENT_LABEL: &str = "MARKET ASSESSMENT";
pub const RISKS_LABEL: &str = "KEY RISKS";
pub const CONFIDENCE_LABEL: &str = "CONFIDENCE LEVEL";
pub const RISK_LABEL: &str = "RISK LEVEL";

/// Query used when neither the event nor its markets carry any text.
pub const FALLBACK_QUERY: &str = "market analysis";

/// Search query for the context lookup: event title, else the first
/// market's question, else [`FALLBACK_QUERY`].
pub fn search_query(event: &MarketEvent) -> String {
    event
        .title
        .as_deref()
        .or_else(|| event.markets.first().and_then(|m| m.question.as_deref()))
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .unwrap_or(FALLBACK_QUERY)
        .to_string()
}

/// Assemble the analysis prompt around a formatted report.
///
/// The context block is only emitted when `context` has non-blank text. The
/// report is embedded unmodified regardless of its size.
pub fn build_prompt(report: &str, context: Option<&str>, query: &str) -> String {
    let context_block = match context.map(str::trim).filter(|c| !c.is_empty()) {
        Some(text) => format!(
            "📰 RECENT NEWS & CONTEXT (search: \"{}\"):\n{}\n\n",
            query, text
        ),
        None => String::new(),
    };

    format!(
        r#"You are a professional Polymarket betting analyst with access to real-time market data.

{report}
{context_block}Provide a concise, actionable betting analysis using exactly these sections:

**🎲 {recommendation}**
- Outcome: [Specific option with current odds]
- Expected Value: [Why this is +EV]
- Key Reasoning: [2-3 critical factors]

**📊 {assessment}**
- Are current odds accurate?
- Any mispriced outcomes?

**⚠️ {risks}**
- Main factors that could change the outcome
- Information gaps

**🎯 {confidence}: [X]%**
State your confidence as a whole-number percentage between 0 and 100.

**📉 {risk}: [Low/Medium/High]**
State exactly one of Low, Medium or High.

Be direct, analytical, and focus on VALUE."#,
        report = report,
        context_block = context_block,
        recommendation = RECOMMENDATION_LABEL,
        assessment = ASSESSMENT_LABEL,
        risks = RISKS_LABEL,
        confidence = CONFIDENCE_LABEL,
        risk = RISK_LABEL,
    )
}
