// src/ingest/mod.rs
pub mod config;
pub mod providers;
pub mod types;

use crate::ingest::types::Article;
use anyhow::Result;
use metrics::{describe_counter, describe_histogram};
use once_cell::sync::OnceCell;
use std::future::Future;

/// Markers sources append where the body was cut off. NewsAPI ships either
/// a real ellipsis or its mis-decoded UTF-8 form ("â€¦").
pub const READ_MORE_MARKERS: [&str; 2] = ["\u{2026}", "â€¦"];

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_articles_total", "Articles returned by the article source.");
        describe_counter!("ingest_pages_total", "Pages requested from the article source.");
        describe_counter!(
            "ingest_provider_errors_total",
            "Article source fetch/parse errors."
        );
        describe_histogram!("ingest_fetch_ms", "Per-query fetch time in milliseconds.");
    });
}

/// Single analyzable text blob: title, description and the body cut at the
/// read-more marker, joined by single spaces (empty parts skipped).
pub fn text_from_article(a: &Article) -> String {
    let body = a.content.as_deref().unwrap_or_default();
    let cut = READ_MORE_MARKERS
        .iter()
        .filter_map(|m| body.find(m))
        .min()
        .unwrap_or(body.len());
    let body = &body[..cut];
    let parts = [
        a.title.as_deref().unwrap_or_default(),
        a.description.as_deref().unwrap_or_default(),
        body,
    ];
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

/// Search queries for (corridor, origin, destination).
pub fn build_queries(origin: &str, destination: &str) -> (String, String, String) {
    let o = origin.trim();
    let d = destination.trim();
    let corridor = format!(r#"("{o}" AND "{d}") OR "{o} {d}" OR {o} OR {d}"#);
    (corridor, format!(r#""{o}""#), format!(r#""{d}""#))
}

/// Page through a search endpoint starting at page 1.
///
/// Stops on an empty page, on a short page (`len < page_size`) or after
/// `max_pages`. The first error is returned as-is and everything collected
/// before it is dropped.
pub async fn collect_pages<F, Fut>(
    page_size: u32,
    max_pages: u32,
    mut fetch_page: F,
) -> Result<Vec<Article>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Vec<Article>>>,
{
    let mut all = Vec::new();
    for page in 1..=max_pages {
        let mut articles = fetch_page(page).await?;
        if articles.is_empty() {
            break;
        }
        let short = articles.len() < page_size as usize;
        all.append(&mut articles);
        if short {
            break;
        }
    }
    Ok(all)
}
