use anyhow::{Context, Result};
use reqwest::{Client, Url};
use serde_json::Value;
use tracing::{debug, info};

pub struct GammaApiClient {
    client: Client,
    base_url: String,
}

/// The market the user asked about. Passed explicitly to every handler
/// instead of living in shared state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketTarget {
    pub slug: String,
}

impl MarketTarget {
    /// Build from a Polymarket event URL or a bare slug.
    pub fn parse(input: &str) -> Option<Self> {
        extract_slug(input).map(|slug| Self { slug })
    }

    /// Human-readable form of the slug for status lines.
    pub fn label(&self) -> String {
        self.slug.replace('-', " ")
    }
}

impl GammaApiClient {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }

    /// Fetch the raw event payload for a slug.
    ///
    /// The body is returned untouched; normalization happens in the pipeline.
    pub async fn fetch_event(&self, slug: &str) -> Result<Value> {
        let url = format!("{}/events/slug/{}", self.base_url.trim_end_matches('/'), slug);
        info!("Fetching market data: {}", url);

        let response = self.client
            .get(&url)
            .send()
            .await
            .context("Failed to fetch event")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            );
        }

        let payload: Value = response
            .json()
            .await
            .context("Failed to parse event response")?;

        debug!("Event payload: {}", payload);
        Ok(payload)
    }
}

/// Extract the event slug from `https://polymarket.com/event/<slug>/...`.
/// A bare slug is returned as-is.
pub fn extract_slug(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if !input.contains("://") {
        if input.contains('/') || input.contains(char::is_whitespace) {
            return None;
        }
        return Some(input.to_string());
    }

    let url = Url::parse(input).ok()?;
    let mut parts = url.path_segments()?.filter(|p| !p.is_empty());

    match (parts.next(), parts.next()) {
        (Some("event"), Some(slug)) => Some(slug.to_string()),
        _ => None,
    }
}
