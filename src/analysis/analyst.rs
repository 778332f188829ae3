use anyhow::Result;
use tracing::{info, warn};

use crate::ai::ollama::OllamaClient;
use crate::ai::prompt::search_query;
use crate::ai::response::AnalysisResult;
use crate::ai::search::SearchClient;
use crate::analysis::pipeline::{self, PreparedAnalysis};
use crate::config::Config;
use crate::data::cache::ContextCache;
use crate::data::gamma_api::{GammaApiClient, MarketTarget};
use crate::data::normalizer::{normalize_payload, PayloadError};
use crate::report::display::render_analysis;

/// Outcome of one user-initiated analysis.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub prepared: PreparedAnalysis,
    pub result: AnalysisResult,
    pub result_markup: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("No valid market found for: {0}")]
    InvalidSlug(String),

    #[error("Failed to fetch market data: {0:#}")]
    MarketData(anyhow::Error),

    #[error(transparent)]
    Payload(#[from] PayloadError),

    #[error("Text-generation backend failed at {url}: {reason:#}")]
    Backend { url: String, reason: anyhow::Error },
}

impl AnalysisError {
    /// Short message suitable for showing to the person who asked.
    pub fn user_message(&self) -> String {
        match self {
            AnalysisError::Backend { url, .. } => format!(
                "Could not connect to the text-generation backend at {}. Make sure it is running.",
                url
            ),
            AnalysisError::MarketData(e) if e.to_string().starts_with("HTTP") => {
                format!("API Error: {}", e)
            }
            AnalysisError::Payload(_) => {
                "Could not parse market data. The event structure may be different.".to_string()
            }
            other => format!("Error: {}", other),
        }
    }
}

/// Runs the full flow for a market: fetch, normalize, optional context,
/// prompt, generate, parse.
pub struct Analyst {
    gamma: GammaApiClient,
    llm: OllamaClient,
    search: Option<SearchClient>,
    context_cache: ContextCache,
}

impl Analyst {
    pub fn new(
        gamma: GammaApiClient,
        llm: OllamaClient,
        search: Option<SearchClient>,
        context_cache: ContextCache,
    ) -> Self {
        Self {
            gamma,
            llm,
            search,
            context_cache,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let gamma = GammaApiClient::new(config.endpoints.gamma_url.clone());
        let llm = OllamaClient::new(
            config.endpoints.ollama_url.clone(),
            config.llm.model.clone(),
            config.request_timeout(),
        )?;
        let search = config.context.enabled.then(|| {
            SearchClient::new(config.endpoints.search_url.clone(), config.context.max_results)
        });

        Ok(Self::new(gamma, llm, search, ContextCache::new(config.cache_ttl())))
    }

    pub async fn analyze(&self, target: &MarketTarget) -> Result<Analysis, AnalysisError> {
        let payload = self.fetch(target).await?;
        self.analyze_payload(&payload).await
    }

    pub async fn fetch(&self, target: &MarketTarget) -> Result<serde_json::Value, AnalysisError> {
        if target.slug.is_empty() {
            return Err(AnalysisError::InvalidSlug(target.slug.clone()));
        }
        info!("Analyzing market: {}", target.label());

        self.gamma
            .fetch_event(&target.slug)
            .await
            .map_err(AnalysisError::MarketData)
    }

    /// Normalize an already-fetched payload and build the prompt, pulling in
    /// search context when enabled.
    pub async fn prepare(
        &self,
        payload: &serde_json::Value,
    ) -> Result<PreparedAnalysis, AnalysisError> {
        let event = normalize_payload(payload)?;
        info!("Normalized {} market(s)", event.markets.len());

        let query = search_query(&event);
        let context = self.context_for(&query).await;
        Ok(pipeline::prepare_event(event, context.as_deref()))
    }

    /// Same as [`Analyst::analyze`] for an already-fetched payload.
    pub async fn analyze_payload(
        &self,
        payload: &serde_json::Value,
    ) -> Result<Analysis, AnalysisError> {
        let prepared = self.prepare(payload).await?;

        let reply = self
            .llm
            .generate(&prepared.prompt)
            .await
            .map_err(|reason| AnalysisError::Backend {
                url: self.llm.base_url().to_string(),
                reason,
            })?;

        let result = pipeline::finish(&reply);
        info!(
            "Analysis complete: confidence={:?}, risk={:?}",
            result.confidence_percent, result.risk_level
        );
        let result_markup = render_analysis(&result);

        Ok(Analysis {
            prepared,
            result,
            result_markup,
        })
    }

    /// Context is optional: lookup failures are logged and swallowed.
    async fn context_for(&self, query: &str) -> Option<String> {
        let search = self.search.as_ref()?;

        if let Some(cached) = self.context_cache.get(query) {
            info!("Context cache hit for: {}", query);
            return Some(cached);
        }

        match search.lookup(query).await {
            Ok(Some(text)) => {
                self.context_cache.insert(query, text.clone());
                Some(text)
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Context lookup failed, continuing without context: {:#}", e);
                None
            }
        }
    }
}
