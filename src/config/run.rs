//! Per-run knobs exposed to the HTTP body / CLI flags.
//!
//! Out-of-range numbers are clamped into their allowed interval rather than
//! rejected (same as a slider would do); only blank locations are an error.

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use tracing::debug;

use crate::error::PipelineError;

pub const DAYS_RANGE: RangeInclusive<u32> = 1..=30;
pub const MAX_ARTICLES_RANGE: RangeInclusive<u32> = 20..=100;
pub const TOP_K_RANGE: RangeInclusive<usize> = 0..=50;
pub const POLARITY_THRESHOLD_RANGE: RangeInclusive<f64> = -1.0..=0.0;

/// Pages fetched for the corridor query; origin/destination get one.
pub const CORRIDOR_MAX_PAGES: u32 = 2;
pub const SCOPE_MAX_PAGES: u32 = 1;
/// Headlines quoted in the narrative briefing.
pub const BRIEFING_TOP_K: usize = 3;

fn default_origin() -> String {
    "Shanghai".to_string()
}
fn default_destination() -> String {
    "Los Angeles".to_string()
}
fn default_days() -> u32 {
    30
}
fn default_max_articles() -> u32 {
    100
}
fn default_top_k() -> usize {
    8
}
fn default_polarity_threshold() -> f64 {
    -0.1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_origin")]
    pub origin: String,
    #[serde(default = "default_destination")]
    pub destination: String,
    #[serde(default = "default_days")]
    pub days: u32,
    /// Page size of every search query.
    #[serde(default = "default_max_articles")]
    pub max_articles: u32,
    /// Flagged articles sent to enrichment.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Flag when polarity <= this value.
    #[serde(default = "default_polarity_threshold")]
    pub polarity_threshold: f64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            destination: default_destination(),
            days: default_days(),
            max_articles: default_max_articles(),
            top_k: default_top_k(),
            polarity_threshold: default_polarity_threshold(),
        }
    }
}

impl RunConfig {
    /// Trim locations and clamp every number into its range.
    pub fn validated(mut self) -> Result<Self, PipelineError> {
        self.origin = self.origin.trim().to_string();
        self.destination = self.destination.trim().to_string();
        if self.origin.is_empty() {
            return Err(PipelineError::InvalidConfig("origin must not be empty".into()));
        }
        if self.destination.is_empty() {
            return Err(PipelineError::InvalidConfig(
                "destination must not be empty".into(),
            ));
        }

        let before = self.clone();
        self.days = self.days.clamp(*DAYS_RANGE.start(), *DAYS_RANGE.end());
        self.max_articles = self
            .max_articles
            .clamp(*MAX_ARTICLES_RANGE.start(), *MAX_ARTICLES_RANGE.end());
        self.top_k = self.top_k.clamp(*TOP_K_RANGE.start(), *TOP_K_RANGE.end());
        self.polarity_threshold = if self.polarity_threshold.is_nan() {
            default_polarity_threshold()
        } else {
            self.polarity_threshold.clamp(
                *POLARITY_THRESHOLD_RANGE.start(),
                *POLARITY_THRESHOLD_RANGE.end(),
            )
        };
        if before != self {
            debug!(target: "pipeline", ?before, after = ?self, "run config clamped");
        }
        Ok(self)
    }
}
