//! Web search collaborator
//!
//! Google Custom Search wrapper behind a trait so the router can run
//! without search configured and tests can supply canned hits.

use crate::error::{AgentError, Result};
use lazy_static::lazy_static;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

const SEARCH_API_URL: &str = "https://www.googleapis.com/customsearch/v1";
const MAX_RESULTS: usize = 10;

lazy_static! {
    static ref HTTP_CLIENT: Client = Client::builder()
        .timeout(Duration::from_secs(15))
        .build()
        .unwrap_or_else(|_| Client::new());
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub title: String,
    pub snippet: String,
    pub link: String,
}

#[async_trait::async_trait]
pub trait SearchProvider: Send + Sync {
    /// Top `n` hits for the query. An empty vec means the query ran
    /// fine but matched nothing.
    async fn search(&self, query: &str, n: usize) -> Result<Vec<SearchHit>>;
}

pub struct GoogleSearchClient {
    api_key: String,
    cse_id: String,
}

impl GoogleSearchClient {
    pub fn new(api_key: String, cse_id: String) -> Self {
        Self { api_key, cse_id }
    }
}

#[async_trait::async_trait]
impl SearchProvider for GoogleSearchClient {
    async fn search(&self, query: &str, n: usize) -> Result<Vec<SearchHit>> {
        let num = n.min(MAX_RESULTS).max(1);

        debug!(%query, num, "running web search");

        let response = HTTP_CLIENT
            .get(SEARCH_API_URL)
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.cse_id.as_str()),
                ("q", query),
                ("num", &num.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                429 => AgentError::QuotaExceeded(detail),
                401 | 403 => AgentError::AuthFailure(detail),
                code => AgentError::ExternalCall(format!("search status {code}: {detail}")),
            });
        }

        let payload: Value = response.json().await?;
        let items = match payload["items"].as_array() {
            Some(items) => items,
            None => {
                warn!(%query, "search returned no items");
                return Ok(Vec::new());
            }
        };

        let hits = items
            .iter()
            .filter_map(|item| {
                Some(SearchHit {
                    title: item["title"].as_str()?.to_string(),
                    snippet: item["snippet"].as_str().unwrap_or_default().to_string(),
                    link: item["link"].as_str().unwrap_or_default().to_string(),
                })
            })
            .collect();

        Ok(hits)
    }
}
