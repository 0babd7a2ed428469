//! # Article Table
//! One `ScopedArticleRecord` per fetched article, carrying text, sentiment,
//! keyword tags and the normalized publish time.
//!
//! The builder is strictly one-to-one and order-preserving: duplicates from
//! the upstream fetch stay duplicated, and the same url may appear under
//! several scopes (each scored on its own).

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::datetime::{date_of, parse_published_at};
use crate::ingest::text_from_article;
use crate::ingest::types::Article;
use crate::sentiment::{analyze_sentiment, SentimentLabel, SentimentModel};
use crate::taxonomy::{KeywordTags, RiskTaxonomy};

/// Which query produced an article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Corridor,
    Origin,
    Destination,
}

impl Scope {
    pub const ALL: [Scope; 3] = [Scope::Corridor, Scope::Origin, Scope::Destination];

    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Corridor => "corridor",
            Scope::Origin => "origin",
            Scope::Destination => "destination",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "corridor" => Ok(Scope::Corridor),
            "origin" => Ok(Scope::Origin),
            "destination" => Ok(Scope::Destination),
            other => Err(format!("unknown scope '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScopedArticleRecord {
    pub scope: Scope,
    /// Raw `publishedAt` as received.
    pub published_at: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Cross-reference key for enrichment; empty when the source sent none.
    pub url: String,
    pub source: Option<String>,
    pub content_text: String,
    pub polarity: f64,
    pub subjectivity: f64,
    pub sentiment_label: SentimentLabel,
    pub keyword_tags: KeywordTags,
    /// `None` when `published_at` is missing or unparseable.
    pub published_at_dt: Option<NaiveDateTime>,
    pub date: Option<NaiveDate>,
    pub flagged: bool,
}

impl ScopedArticleRecord {
    /// Derive a record from one raw article. `flagged` starts `false`; the
    /// flagging stage sets it once the threshold is known.
    pub fn from_article(
        article: &Article,
        scope: Scope,
        model: &dyn SentimentModel,
        taxonomy: &RiskTaxonomy,
    ) -> Self {
        let text = text_from_article(article);
        let sentiment = analyze_sentiment(model, &text);
        let keyword_tags = taxonomy.tag_keywords(&text);
        let published_at_dt = parse_published_at(article.published_at.as_deref());
        Self {
            scope,
            published_at: article.published_at.clone(),
            title: article.title.clone(),
            description: article.description.clone(),
            url: article.url.clone().unwrap_or_default(),
            source: article.source_name().map(str::to_string),
            content_text: text,
            polarity: sentiment.polarity,
            subjectivity: sentiment.subjectivity,
            sentiment_label: sentiment.label,
            keyword_tags,
            published_at_dt,
            date: date_of(published_at_dt),
            flagged: false,
        }
    }
}

/// Map a batch of articles for one scope to records (1:1, order kept).
pub fn build_records(
    articles: &[Article],
    scope: Scope,
    model: &dyn SentimentModel,
    taxonomy: &RiskTaxonomy,
) -> Vec<ScopedArticleRecord> {
    articles
        .iter()
        .map(|a| ScopedArticleRecord::from_article(a, scope, model, taxonomy))
        .collect()
}
