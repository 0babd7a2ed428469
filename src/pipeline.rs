//! # Pipeline
//! One analysis pass, recomputed from scratch on every call:
//!
//! fetch (3 scopes, concurrently) → article table → flags → enrichment of
//! the top-K flagged → per-category scores → daily aggregates → briefing.
//!
//! Only fetching can fail the run. Enrichment, narration and date parsing
//! degrade per article.

use chrono::{Duration, NaiveDateTime, Utc};
use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info};

use crate::aggregate::{aggregate_scores, DailyAggregate};
use crate::analyze::ai_adapter::{BriefingItem, DynEnrichmentClient};
use crate::analyze::{EnrichmentMeta, ScoredArticle};
use crate::config::run::{RunConfig, BRIEFING_TOP_K, CORRIDOR_MAX_PAGES, SCOPE_MAX_PAGES};
use crate::error::PipelineError;
use crate::flagging::{apply_flags, flagged_pool};
use crate::ingest::build_queries;
use crate::ingest::types::{Article, ArticleSource, FetchQuery};
use crate::sentiment::{SentimentLabel, SentimentModel};
use crate::table::{build_records, Scope, ScopedArticleRecord};
use crate::taxonomy::{KeywordTags, RiskTaxonomy};

pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("pipeline_runs_total", "Completed analysis runs.");
        describe_counter!("pipeline_fetch_failures_total", "Runs aborted by a fetch failure.");
        describe_counter!("pipeline_articles_total", "Articles analyzed, by scope.");
        describe_counter!("pipeline_flagged_total", "Articles flagged across all scopes.");
        describe_counter!("pipeline_enrichment_calls_total", "Classification calls made.");
        describe_histogram!("pipeline_run_ms", "End-to-end run time in milliseconds.");
    });
}

/// Short stable id for logs; article urls are not logged verbatim.
pub(crate) fn url_id(url: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(url.as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Flagged-table row as shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlaggedArticle {
    pub scope: Scope,
    pub published_at_dt: Option<NaiveDateTime>,
    pub source: Option<String>,
    pub title: Option<String>,
    pub sentiment_label: SentimentLabel,
    pub polarity: f64,
    pub keyword_tags: KeywordTags,
    pub url: String,
}

impl From<&ScopedArticleRecord> for FlaggedArticle {
    fn from(r: &ScopedArticleRecord) -> Self {
        Self {
            scope: r.scope,
            published_at_dt: r.published_at_dt,
            source: r.source.clone(),
            title: r.title.clone(),
            sentiment_label: r.sentiment_label,
            polarity: r.polarity,
            keyword_tags: r.keyword_tags.clone(),
            url: r.url.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DailySeries {
    pub corridor: Vec<DailyAggregate>,
    pub origin: Vec<DailyAggregate>,
    pub destination: Vec<DailyAggregate>,
}

impl DailySeries {
    pub fn get(&self, scope: Scope) -> &[DailyAggregate] {
        match scope {
            Scope::Corridor => &self.corridor,
            Scope::Origin => &self.origin,
            Scope::Destination => &self.destination,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub origin: String,
    pub destination: String,
    pub days: u32,
    pub generated_at: NaiveDateTime,
    pub categories: Vec<String>,
    pub total_articles: usize,
    pub articles: Vec<ScopedArticleRecord>,
    /// The whole flagged pool, most recent first, undated last. Not capped
    /// to a display size; consumers slice it themselves.
    pub flagged: Vec<FlaggedArticle>,
    /// url → classifier output, only for enriched articles.
    pub enrichment: BTreeMap<String, EnrichmentMeta>,
    pub scores: Vec<ScoredArticle>,
    pub daily: DailySeries,
    pub briefing: String,
}

/// Collaborators for a run. Cheap to clone.
#[derive(Clone)]
pub struct Pipeline {
    pub source: Arc<dyn ArticleSource>,
    pub enricher: DynEnrichmentClient,
    pub sentiment: Arc<dyn SentimentModel>,
    pub taxonomy: Arc<RiskTaxonomy>,
}

impl Pipeline {
    pub fn new(
        source: Arc<dyn ArticleSource>,
        enricher: DynEnrichmentClient,
        sentiment: Arc<dyn SentimentModel>,
        taxonomy: Arc<RiskTaxonomy>,
    ) -> Self {
        Self {
            source,
            enricher,
            sentiment,
            taxonomy,
        }
    }

    pub async fn run(&self, cfg: RunConfig) -> Result<RunReport, PipelineError> {
        self.run_at(cfg, Utc::now().naive_utc()).await
    }

    /// Same as `run` with an explicit "now" (end of the fetch window).
    pub async fn run_at(&self, cfg: RunConfig, now: NaiveDateTime) -> Result<RunReport, PipelineError> {
        ensure_metrics_described();
        let t0 = std::time::Instant::now();
        let cfg = cfg.validated()?;

        let from = now - Duration::days(i64::from(cfg.days));
        let (corridor_q, origin_q, destination_q) = build_queries(&cfg.origin, &cfg.destination);
        let query = |q: String, max_pages: u32| FetchQuery {
            query: q,
            from,
            to: now,
            page_size: cfg.max_articles,
            max_pages,
        };
        let corridor_q = query(corridor_q, CORRIDOR_MAX_PAGES);
        let origin_q = query(origin_q, SCOPE_MAX_PAGES);
        let destination_q = query(destination_q, SCOPE_MAX_PAGES);

        info!(
            target: "pipeline",
            origin = %cfg.origin,
            destination = %cfg.destination,
            days = cfg.days,
            source = self.source.name(),
            "fetching articles"
        );
        let fetched = tokio::try_join!(
            self.fetch_scope(Scope::Corridor, &corridor_q),
            self.fetch_scope(Scope::Origin, &origin_q),
            self.fetch_scope(Scope::Destination, &destination_q),
        );
        let (corridor, origin, destination) = match fetched {
            Ok(v) => v,
            Err(e) => {
                counter!("pipeline_fetch_failures_total").increment(1);
                return Err(e);
            }
        };

        let report = self
            .analyze_batches(
                &cfg,
                vec![
                    (Scope::Corridor, corridor),
                    (Scope::Origin, origin),
                    (Scope::Destination, destination),
                ],
                now,
            )
            .await;

        counter!("pipeline_runs_total").increment(1);
        histogram!("pipeline_run_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        Ok(report)
    }

    async fn fetch_scope(&self, scope: Scope, q: &FetchQuery) -> Result<Vec<Article>, PipelineError> {
        self.source
            .fetch_articles(q)
            .await
            .map_err(|source| PipelineError::Fetch { scope, source })
    }

    /// Everything after fetching. `cfg` is expected to be validated.
    pub async fn analyze_batches(
        &self,
        cfg: &RunConfig,
        batches: Vec<(Scope, Vec<Article>)>,
        now: NaiveDateTime,
    ) -> RunReport {
        let taxonomy = self.taxonomy.as_ref();
        let categories = taxonomy.names();

        // 1) Article table
        let mut records: Vec<ScopedArticleRecord> = Vec::new();
        for (scope, articles) in &batches {
            counter!("pipeline_articles_total", "scope" => scope.as_str())
                .increment(articles.len() as u64);
            records.extend(build_records(articles, *scope, self.sentiment.as_ref(), taxonomy));
        }
        info!(target: "pipeline", total = records.len(), "analyzed articles");

        // 2) Flags
        let n_flagged = apply_flags(&mut records, cfg.polarity_threshold);
        let pool = flagged_pool(&records);
        counter!("pipeline_flagged_total").increment(n_flagged as u64);
        info!(target: "pipeline", flagged = n_flagged, "flagged articles");

        // 3) Enrichment, once per unique url among the top-K flagged
        let enrichment = self.enrich(&records, &pool, cfg.top_k).await;

        // 4) Scores
        let scores: Vec<ScoredArticle> = records
            .iter()
            .map(|r| ScoredArticle::new(r, taxonomy, enrichment.get(&r.url)))
            .collect();

        // 5) Daily aggregates
        let daily = DailySeries {
            corridor: aggregate_scores(&records, &scores, &categories, Scope::Corridor),
            origin: aggregate_scores(&records, &scores, &categories, Scope::Origin),
            destination: aggregate_scores(&records, &scores, &categories, Scope::Destination),
        };

        // 6) Briefing
        let items: Vec<BriefingItem> = pool
            .iter()
            .map(|&i| {
                let r = &records[i];
                BriefingItem {
                    title: r.title.clone().unwrap_or_default(),
                    source: r.source.clone().unwrap_or_default(),
                    url: r.url.clone(),
                }
            })
            .collect();
        let briefing = self
            .enricher
            .narrate(&cfg.origin, &cfg.destination, &items, BRIEFING_TOP_K)
            .await;

        let flagged = pool.iter().map(|&i| FlaggedArticle::from(&records[i])).collect();
        RunReport {
            origin: cfg.origin.clone(),
            destination: cfg.destination.clone(),
            days: cfg.days,
            generated_at: now,
            categories,
            total_articles: records.len(),
            articles: records,
            flagged,
            enrichment: enrichment.into_iter().collect(),
            scores,
            daily,
            briefing,
        }
    }

    async fn enrich(
        &self,
        records: &[ScopedArticleRecord],
        pool: &[usize],
        top_k: usize,
    ) -> HashMap<String, EnrichmentMeta> {
        let mut out: HashMap<String, EnrichmentMeta> = HashMap::new();
        if !self.enricher.enabled() || top_k == 0 || pool.is_empty() {
            return out;
        }
        for &i in pool.iter().take(top_k) {
            let r = &records[i];
            if r.url.is_empty() || out.contains_key(&r.url) {
                continue;
            }
            let meta = self
                .enricher
                .classify(
                    r.title.as_deref().unwrap_or_default(),
                    r.description.as_deref().unwrap_or_default(),
                )
                .await;
            counter!("pipeline_enrichment_calls_total").increment(1);
            debug!(
                target: "pipeline",
                id = %url_id(&r.url),
                severity = ?meta.severity,
                provider = self.enricher.provider_name(),
                "enriched flagged article"
            );
            out.insert(r.url.clone(), meta);
        }
        out
    }
}
