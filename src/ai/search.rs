use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info};

/// Client for the local search service that supplies news context.
pub struct SearchClient {
    client: Client,
    base_url: String,
    max_results: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub relevance_score: u32,
}

/// Older deployments answer with a plain text blob in `data`; newer ones
/// return the hit list plus a pre-rendered `context`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SearchData {
    Text(String),
    Hits(Vec<SearchHit>),
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<SearchData>,
    #[serde(default)]
    error: Option<String>,
}

impl SearchClient {
    pub fn new(base_url: String, max_results: usize) -> Self {
        Self {
            client: Client::new(),
            base_url,
            max_results,
        }
    }

    /// Look up context text for `query`. `Ok(None)` when nothing was found.
    pub async fn lookup(&self, query: &str) -> Result<Option<String>> {
        let url = format!("{}/search", self.base_url.trim_end_matches('/'));
        let max_results = self.max_results.to_string();
        info!("Searching context for: {}", query);

        let body: SearchResponse = self.client
            .get(&url)
            .query(&[("q", query), ("max_results", max_results.as_str())])
            .send()
            .await
            .context("Search request failed")?
            .error_for_status()
            .context("Search service returned an error status")?
            .json()
            .await
            .context("Failed to parse search response")?;

        context_from_response(body, query, self.max_results)
    }
}

fn context_from_response(
    body: SearchResponse,
    query: &str,
    max_results: usize,
) -> Result<Option<String>> {
    if !body.success {
        anyhow::bail!(
            "Search service error: {}",
            body.error.unwrap_or_else(|| "unknown".to_string())
        );
    }

    let text = match body.data {
        None => String::new(),
        Some(SearchData::Text(text)) => text,
        Some(SearchData::Hits(hits)) => {
            let ranked = merge_and_rank(hits, query, max_results);
            debug!("Ranked {} search hits", ranked.len());
            render_context(&ranked)
        }
    };

    let text = text.trim();
    if text.is_empty() || text == "No results found" {
        Ok(None)
    } else {
        Ok(Some(text.to_string()))
    }
}

/// Score a hit by query-term frequency: two points per occurrence in
/// title+snippet, five more for each term present in the title.
pub fn relevance_score(hit: &SearchHit, query: &str) -> u32 {
    let text = format!("{} {}", hit.title, hit.snippet).to_lowercase();
    let title = hit.title.to_lowercase();

    query
        .to_lowercase()
        .split_whitespace()
        .map(|term| {
            let in_text = text.matches(term).count() as u32 * 2;
            let in_title = if title.contains(term) { 5 } else { 0 };
            in_text + in_title
        })
        .sum()
}

/// Deduplicate by URL, score, sort by score descending and keep `max_results`.
pub fn merge_and_rank(hits: Vec<SearchHit>, query: &str, max_results: usize) -> Vec<SearchHit> {
    let mut seen = HashSet::new();
    let mut unique: Vec<SearchHit> = hits
        .into_iter()
        .filter(|hit| !hit.url.is_empty() && seen.insert(hit.url.clone()))
        .map(|mut hit| {
            hit.relevance_score = relevance_score(&hit, query);
            hit
        })
        .collect();

    unique.sort_by(|a, b| b.relevance_score.cmp(&a.relevance_score));
    unique.truncate(max_results);
    unique
}

/// `title\nsnippet` blocks separated by blank lines.
pub fn render_context(hits: &[SearchHit]) -> String {
    hits.iter()
        .map(|hit| format!("{}\n{}", hit.title, hit.snippet))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(title: &str, snippet: &str, url: &str) -> SearchHit {
        SearchHit {
            title: title.to_string(),
            snippet: snippet.to_string(),
            url: url.to_string(),
            source: "duckduckgo".to_string(),
            relevance_score: 0,
        }
    }

    #[test]
    fn test_relevance_score() {
        // "fed": 2 occurrences * 2 + title 5; "cut": 1 * 2 + title 5
        let h = hit("Fed cut ahead", "the fed meets", "u");
        assert_eq!(relevance_score(&h, "Fed cut"), 16);
        assert_eq!(relevance_score(&h, "bitcoin"), 0);
    }

    #[test]
    fn test_merge_dedupes_and_ranks() {
        let ranked = merge_and_rank(
            vec![
                hit("Weather today", "sunny", "a"),
                hit("Fed rate cut", "Fed signals cut", "b"),
                hit("Fed rate cut (mirror)", "dup", "b"),
                hit("No url", "fed fed fed", ""),
            ],
            "fed cut",
            10,
        );

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].url, "b");
        assert_eq!(ranked[0].title, "Fed rate cut");
        assert_eq!(ranked[1].relevance_score, 0);
    }

    #[test]
    fn test_merge_truncates() {
        let hits = (0..5).map(|i| hit("t", "s", &format!("u{i}"))).collect();
        assert_eq!(merge_and_rank(hits, "t", 3).len(), 3);
    }

    #[test]
    fn test_render_context() {
        let text = render_context(&[hit("A", "a1", "x"), hit("B", "b1", "y")]);
        assert_eq!(text, "A\na1\n\nB\nb1");
    }

    #[test]
    fn test_text_response() {
        let body: SearchResponse =
            serde_json::from_str(r#"{"success": true, "data": "Polls tighten."}"#).unwrap();
        assert_eq!(
            context_from_response(body, "q", 3).unwrap().as_deref(),
            Some("Polls tighten.")
        );

        let body: SearchResponse =
            serde_json::from_str(r#"{"success": true, "data": "No results found"}"#).unwrap();
        assert_eq!(context_from_response(body, "q", 3).unwrap(), None);
    }

    #[test]
    fn test_hits_response() {
        let body: SearchResponse = serde_json::from_str(
            r#"{"success": true, "query": "fed", "count": 1, "context": "ignored",
                "data": [{"title": "Fed holds", "snippet": "No change", "url": "https://x", "source": "bing"}]}"#,
        )
        .unwrap();
        assert_eq!(
            context_from_response(body, "fed", 3).unwrap().as_deref(),
            Some("Fed holds\nNo change")
        );
    }

    #[test]
    fn test_failed_response() {
        let body: SearchResponse =
            serde_json::from_str(r#"{"success": false, "error": "boom"}"#).unwrap();
        assert!(context_from_response(body, "q", 3).is_err());
    }
}
