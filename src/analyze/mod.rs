// src/analyze/mod.rs
//! Scoring stage: enrichment collaborator + per-category risk scorer.

pub mod ai_adapter;
pub mod scoring;

pub use crate::analyze::ai_adapter::{EnrichmentClient, EnrichmentMeta, Severity};
pub use crate::analyze::scoring::{score_article, CategoryScores, ScoredArticle};

/// Round half away from zero to 4 decimals.
#[inline]
pub fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}
