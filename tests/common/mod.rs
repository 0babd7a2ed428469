// tests/common/mod.rs
// Shared stubs: a scripted article source, a counting enrichment client and
// a keyword-driven sentiment model, so integration tests never hit the network.
#![allow(dead_code)]

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

use corridor_risk::ai_adapter::{BoxFut, BriefingItem, EnrichmentClient, EnrichmentMeta, Severity};
use corridor_risk::ingest::types::{Article, ArticleSource, ArticleSourceName, FetchQuery};
use corridor_risk::pipeline::Pipeline;
use corridor_risk::sentiment::SentimentModel;
use corridor_risk::table::Scope;
use corridor_risk::taxonomy::RiskTaxonomy;

pub const ORIGIN: &str = "Shanghai";
pub const DESTINATION: &str = "Los Angeles";

pub fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 3, 10)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

pub fn article(title: &str, url: &str, published_at: &str) -> Article {
    Article {
        title: Some(title.to_string()),
        url: Some(url.to_string()),
        published_at: Some(published_at.to_string()),
        source: Some(ArticleSourceName {
            name: Some("Wire".to_string()),
        }),
        ..Default::default()
    }
}

/// "grim" → -0.5, "bright" → +0.5, anything else neutral.
pub struct KeywordSentiment;

impl SentimentModel for KeywordSentiment {
    fn polarity_subjectivity(&self, text: &str) -> (f64, f64) {
        let t = text.to_lowercase();
        if t.contains("grim") {
            (-0.5, 0.5)
        } else if t.contains("bright") {
            (0.5, 0.5)
        } else {
            (0.0, 0.0)
        }
    }
}

/// Serves fixed batches per scope; the scope is recognised from the query
/// text built for `ORIGIN`/`DESTINATION`.
#[derive(Default)]
pub struct ScriptedSource {
    pub corridor: Vec<Article>,
    pub origin: Vec<Article>,
    pub destination: Vec<Article>,
    pub fail_scope: Option<Scope>,
    pub calls: Mutex<Vec<FetchQuery>>,
}

impl ScriptedSource {
    pub fn scope_of(q: &FetchQuery) -> Scope {
        if q.query.contains(" AND ") {
            Scope::Corridor
        } else if q.query == format!("\"{ORIGIN}\"") {
            Scope::Origin
        } else {
            Scope::Destination
        }
    }

    pub fn calls(&self) -> Vec<FetchQuery> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArticleSource for ScriptedSource {
    async fn fetch_articles(&self, q: &FetchQuery) -> Result<Vec<Article>> {
        self.calls.lock().unwrap().push(q.clone());
        let scope = Self::scope_of(q);
        if self.fail_scope == Some(scope) {
            return Err(anyhow!("HTTP 500 from upstream"));
        }
        Ok(match scope {
            Scope::Corridor => self.corridor.clone(),
            Scope::Origin => self.origin.clone(),
            Scope::Destination => self.destination.clone(),
        })
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Always answers `severity`; counts classify calls and echoes the briefing
/// headlines it was given.
pub struct CountingEnricher {
    pub severity: Severity,
    pub classified: Mutex<Vec<String>>,
    pub calls: AtomicUsize,
}

impl CountingEnricher {
    pub fn new(severity: Severity) -> Self {
        Self {
            severity,
            classified: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl EnrichmentClient for CountingEnricher {
    fn classify<'a>(&'a self, title: &'a str, _description: &'a str) -> BoxFut<'a, EnrichmentMeta> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.classified.lock().unwrap().push(title.to_string());
        let meta = EnrichmentMeta {
            categories: BTreeSet::from(["logistics".to_string()]),
            summary: format!("summary of {title}"),
            severity: self.severity,
            error: None,
        };
        Box::pin(async move { meta })
    }

    fn narrate<'a>(
        &'a self,
        _origin: &'a str,
        _destination: &'a str,
        flagged: &'a [BriefingItem],
        top_k: usize,
    ) -> BoxFut<'a, String> {
        let titles: Vec<&str> = flagged.iter().take(top_k).map(|i| i.title.as_str()).collect();
        let out = titles.join("|");
        Box::pin(async move { out })
    }

    fn provider_name(&self) -> &'static str {
        "counting"
    }
}

/// Corridor: a grim strike story, a bright one, a grim one with a broken
/// timestamp. Origin: a storm story plus the strike story again.
pub fn scenario_source() -> ScriptedSource {
    ScriptedSource {
        corridor: vec![
            article("Grim port strike halts shipments", "u1", "2025-03-09T10:00:00Z"),
            article("Bright trade outlook", "u2", "2025-03-08T09:00:00Z"),
            article("Grim outlook", "u3", "not a date"),
        ],
        origin: vec![
            article("Storm nears coast", "u4", "2025-03-09T08:00:00Z"),
            article("Grim port strike halts shipments", "u1", "2025-03-09T10:00:00Z"),
        ],
        ..Default::default()
    }
}

pub fn pipeline_with(source: Arc<dyn ArticleSource>, enricher: Arc<dyn EnrichmentClient>) -> Pipeline {
    Pipeline::new(
        source,
        enricher,
        Arc::new(KeywordSentiment),
        Arc::new(RiskTaxonomy::default()),
    )
}

pub fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}
