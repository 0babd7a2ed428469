// src/ingest/types.rs
use anyhow::Result;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Raw article record as returned by the news search endpoint.
/// Every field is optional upstream; missing values stay `None` here and
/// are treated as empty strings by the text normalizer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Article {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Body, possibly truncated by the source with a "read more" marker.
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub source: Option<ArticleSourceName>,
    /// ISO-8601 UTC string; may be missing or malformed.
    #[serde(default, rename = "publishedAt")]
    pub published_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArticleSourceName {
    #[serde(default)]
    pub name: Option<String>,
}

impl Article {
    pub fn source_name(&self) -> Option<&str> {
        self.source.as_ref().and_then(|s| s.name.as_deref())
    }
}

/// One search request against an article source.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchQuery {
    pub query: String,
    pub from: NaiveDateTime,
    pub to: NaiveDateTime,
    /// Capped at 100 by the providers.
    pub page_size: u32,
    pub max_pages: u32,
}

#[async_trait::async_trait]
pub trait ArticleSource: Send + Sync {
    /// Fetch every page for `q`. Any error discards what was collected so far.
    async fn fetch_articles(&self, q: &FetchQuery) -> Result<Vec<Article>>;
    fn name(&self) -> &'static str;
}
