use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::{counter, histogram};
use serde::Deserialize;
use std::time::Duration;

use crate::error::PipelineError;
use crate::ingest::config::NewsApiConfig;
use crate::ingest::types::{Article, ArticleSource, FetchQuery};
use crate::ingest::{collect_pages, ensure_metrics_described};

/// NewsAPI never returns more than this per page.
pub const MAX_PAGE_SIZE: u32 = 100;

const TS_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

#[derive(Debug, Deserialize)]
struct EverythingResponse {
    #[serde(default)]
    articles: Option<Vec<Article>>,
}

pub struct NewsApiProvider {
    cfg: NewsApiConfig,
    client: reqwest::Client,
}

impl NewsApiProvider {
    pub fn new(cfg: NewsApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("corridor-risk/0.1")
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .build()
            .context("building newsapi http client")?;
        Ok(Self { cfg, client })
    }

    pub fn from_env() -> Result<Self> {
        let cfg = NewsApiConfig::from_env()?;
        Self::new(cfg)
    }

    /// Query string for one page of the `everything` endpoint.
    fn page_params(&self, q: &FetchQuery, page_size: u32, page: u32) -> Vec<(&'static str, String)> {
        vec![
            ("q", q.query.clone()),
            ("language", self.cfg.language.clone()),
            ("sortBy", "publishedAt".to_string()),
            ("pageSize", page_size.to_string()),
            ("page", page.to_string()),
            ("from", q.from.format(TS_FORMAT).to_string()),
            ("to", q.to.format(TS_FORMAT).to_string()),
            ("apiKey", self.cfg.api_key.clone()),
        ]
    }

    async fn fetch_page(&self, q: &FetchQuery, page_size: u32, page: u32) -> Result<Vec<Article>> {
        let params = self.page_params(q, page_size, page);
        counter!("ingest_pages_total").increment(1);
        let resp = self
            .client
            .get(&self.cfg.base_url)
            .query(&params)
            .send()
            .await
            .context("newsapi http get()")?
            .error_for_status()
            .context("newsapi http status")?;
        let body: EverythingResponse = resp.json().await.context("newsapi json body")?;
        Ok(body.articles.unwrap_or_default())
    }
}

#[async_trait]
impl ArticleSource for NewsApiProvider {
    async fn fetch_articles(&self, q: &FetchQuery) -> Result<Vec<Article>> {
        ensure_metrics_described();
        let t0 = std::time::Instant::now();
        let page_size = effective_page_size(q);

        let res = collect_pages(page_size, q.max_pages, |page| {
            self.fetch_page(q, page_size, page)
        })
        .await;
        histogram!("ingest_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

        match res {
            Ok(articles) => {
                counter!("ingest_articles_total").increment(articles.len() as u64);
                tracing::debug!(target: "ingest", count = articles.len(), "newsapi fetch done");
                Ok(articles)
            }
            Err(e) => {
                tracing::warn!(
                    target: "ingest",
                    error = ?e,
                    provider = "NewsAPI",
                    "provider http error"
                );
                counter!("ingest_provider_errors_total").increment(1);
                Err(e)
            }
        }
    }

    fn name(&self) -> &'static str {
        "NewsAPI"
    }
}

fn effective_page_size(q: &FetchQuery) -> u32 {
    q.page_size.clamp(1, MAX_PAGE_SIZE)
}

/// Stand-in used when `NEWSAPI_KEY` is absent: the service still boots and
/// every fetch fails with `MissingConfiguration`.
pub struct UnconfiguredSource;

#[async_trait]
impl ArticleSource for UnconfiguredSource {
    async fn fetch_articles(&self, _q: &FetchQuery) -> Result<Vec<Article>> {
        Err(PipelineError::MissingConfiguration(crate::ingest::config::ENV_NEWSAPI_KEY).into())
    }

    fn name(&self) -> &'static str {
        "unconfigured"
    }
}
