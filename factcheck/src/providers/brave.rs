//! Brave Search web retriever

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use factcheck_sdk::{Retriever, SearchHit, SearchResults};
use reqwest::{header, Client};
use serde::Deserialize;
use std::time::Duration;

use crate::util::execute_batch;

pub const BRAVE_API_KEY_ENV: &str = "BRAVE_SEARCH_API_KEY";

const BRAVE_WEB_SEARCH_URL: &str = "https://api.search.brave.com/res/v1/web/search";
const PROVIDER_NAME: &str = "brave";
const MAX_EXTRA_SNIPPETS: usize = 3;

pub struct BraveSearchRetriever {
    http: Client,
    api_key: String,
    endpoint: String,
    country: String,
    search_lang: String,
    max_concurrent_queries: usize,
}

#[derive(Debug, Deserialize)]
struct BraveResponse {
    #[serde(default)]
    web: Option<BraveWeb>,
}

#[derive(Debug, Deserialize)]
struct BraveWeb {
    #[serde(default)]
    results: Vec<BraveResult>,
}

#[derive(Debug, Deserialize)]
struct BraveResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    age: Option<String>,
    #[serde(default)]
    extra_snippets: Vec<String>,
}

impl From<BraveResult> for SearchHit {
    fn from(result: BraveResult) -> Self {
        let mut extra_snippets = result.extra_snippets;
        extra_snippets.truncate(MAX_EXTRA_SNIPPETS);
        SearchHit {
            title: result.title,
            url: result.url,
            description: result.description,
            age: result.age,
            extra_snippets,
        }
    }
}

impl BraveSearchRetriever {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            endpoint: BRAVE_WEB_SEARCH_URL.to_string(),
            country: "us".to_string(),
            search_lang: "en".to_string(),
            max_concurrent_queries: 4,
        })
    }

    /// Build from `BRAVE_SEARCH_API_KEY`
    pub fn from_env() -> Result<Self> {
        match std::env::var(BRAVE_API_KEY_ENV) {
            Ok(key) if !key.trim().is_empty() => Self::new(key.trim()),
            _ => bail!("{} is not set.", BRAVE_API_KEY_ENV),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_locale(mut self, country: impl Into<String>, search_lang: impl Into<String>) -> Self {
        self.country = country.into();
        self.search_lang = search_lang.into();
        self
    }

    /// Run a single query
    pub async fn search_one(&self, query: &str, count: usize) -> Result<SearchResults> {
        let count = count.clamp(1, 20).to_string();

        let response = self
            .http
            .get(&self.endpoint)
            .header(header::ACCEPT, "application/json")
            .header("X-Subscription-Token", &self.api_key)
            .query(&[
                ("q", query),
                ("count", count.as_str()),
                ("country", self.country.as_str()),
                ("search_lang", self.search_lang.as_str()),
                ("extra_snippets", "true"),
            ])
            .send()
            .await
            .with_context(|| format!("Brave search request failed for query: {}", query))?;

        let status = response.status();
        if !status.is_success() {
            bail!("Brave search returned HTTP {} for query: {}", status, query);
        }

        let body: BraveResponse = response
            .json()
            .await
            .context("Failed to decode Brave search response")?;

        let results: Vec<SearchHit> = body
            .web
            .map(|web| web.results)
            .unwrap_or_default()
            .into_iter()
            .map(SearchHit::from)
            .collect();

        Ok(SearchResults {
            provider: PROVIDER_NAME.to_string(),
            query: query.to_string(),
            result_count: results.len(),
            results,
            error: None,
        })
    }
}

#[async_trait]
impl Retriever for BraveSearchRetriever {
    /// One result set per query, in query order; failed queries carry an error
    async fn search(&self, queries: &[String], results_per_query: usize) -> Result<Vec<SearchResults>> {
        if queries.is_empty() {
            return Ok(Vec::new());
        }

        let outcomes = execute_batch(
            queries.to_vec(),
            self.max_concurrent_queries,
            |query, _ctx| async move { self.search_one(&query, results_per_query).await },
        )
        .await?;

        Ok(queries
            .iter()
            .zip(outcomes)
            .map(|(query, outcome)| {
                outcome.unwrap_or_else(|e| {
                    tracing::warn!(query = %query, error = %e, "brave search query failed");
                    SearchResults::failed(PROVIDER_NAME, query.clone(), format!("{:#}", e))
                })
            })
            .collect())
    }
}
