//! Tavily search API engine.

use super::{WebSearchEngine, WebSearchHit};
use async_trait::async_trait;
use ragchat_core::{AppError, AppResult};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default Tavily API URL
pub const DEFAULT_TAVILY_URL: &str = "https://api.tavily.com";

/// Tavily accepts at most 20 results per request
const MAX_RESULTS_PER_REQUEST: usize = 20;

/// Web search through the Tavily API.
pub struct TavilySearchEngine {
    api_key: String,
    base_url: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct TavilyRequest<'a> {
    query: &'a str,
    max_results: usize,
    search_depth: &'a str,
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    title: String,
    url: String,
    #[serde(default)]
    content: String,
    score: Option<f32>,
}

impl TavilySearchEngine {
    /// Create a new engine. A blank key is a configuration error.
    pub fn new(api_key: &str, base_url: Option<&str>, timeout: Duration) -> AppResult<Self> {
        if api_key.trim().is_empty() {
            return Err(AppError::Config("Tavily API key is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key: api_key.to_string(),
            base_url: base_url
                .unwrap_or(DEFAULT_TAVILY_URL)
                .trim_end_matches('/')
                .to_string(),
            client,
        })
    }

    fn convert_response(response: TavilyResponse) -> Vec<WebSearchHit> {
        response
            .results
            .into_iter()
            .map(|r| WebSearchHit {
                title: r.title,
                url: r.url,
                snippet: r.content,
                score: r.score,
            })
            .collect()
    }
}

#[async_trait]
impl WebSearchEngine for TavilySearchEngine {
    async fn search(&self, query: &str, num_results: usize) -> AppResult<Vec<WebSearchHit>> {
        let url = format!("{}/search", self.base_url);
        let request = TavilyRequest {
            query,
            max_results: num_results.min(MAX_RESULTS_PER_REQUEST),
            search_depth: "basic",
        };

        tracing::debug!("Tavily request: {:?}", request);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::Retrieval("Tavily request timed out".to_string())
                } else {
                    AppError::Retrieval(format!("Tavily request failed: {}", e))
                }
            })?;

        let status = response.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(AppError::Retrieval(
                "Tavily rejected the API key".to_string(),
            ));
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(AppError::Retrieval("Tavily rate limit reached".to_string()));
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AppError::Retrieval(format!(
                "Tavily API error ({}): {}",
                status, message
            )));
        }

        let data: TavilyResponse = response
            .json()
            .await
            .map_err(|e| AppError::Retrieval(format!("Failed to parse Tavily response: {}", e)))?;

        let hits = Self::convert_response(data);
        tracing::debug!("Tavily returned {} results", hits.len());

        Ok(hits)
    }

    fn name(&self) -> &'static str {
        "tavily"
    }
}
