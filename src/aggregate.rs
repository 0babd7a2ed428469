//! # Daily Aggregation
//! Per (scope, date): unweighted mean of each category score, the overall
//! risk as the mean of those category means, and the mean article polarity.
//!
//! Records without a date are never grouped. Dates with no articles are not
//! synthesized, so the series may have gaps.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::analyze::{CategoryScores, ScoredArticle};
use crate::table::{Scope, ScopedArticleRecord};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyAggregate {
    pub scope: Scope,
    pub date: NaiveDate,
    /// Mean score per category, taxonomy order.
    pub categories: CategoryScores,
    /// Mean of the category means (not of the raw article scores).
    pub overall_risk: f64,
    /// Mean polarity of the scope's records for this date, if any.
    pub avg_polarity: Option<f64>,
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Date-ascending daily series for `scope`. Empty when either the scope's
/// records or its scores are empty.
pub fn aggregate_scores(
    records: &[ScopedArticleRecord],
    scores: &[ScoredArticle],
    categories: &[String],
    scope: Scope,
) -> Vec<DailyAggregate> {
    let scope_records: Vec<&ScopedArticleRecord> =
        records.iter().filter(|r| r.scope == scope).collect();
    if scope_records.is_empty() {
        return Vec::new();
    }
    let scope_scores: Vec<&ScoredArticle> = scores.iter().filter(|s| s.scope == scope).collect();
    if scope_scores.is_empty() {
        return Vec::new();
    }

    let mut by_date: BTreeMap<NaiveDate, Vec<&ScoredArticle>> = BTreeMap::new();
    for s in scope_scores {
        if let Some(d) = s.date {
            by_date.entry(d).or_default().push(s);
        }
    }

    let mut polarity: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
    for r in scope_records {
        if let Some(d) = r.date {
            polarity.entry(d).or_default().push(r.polarity);
        }
    }

    by_date
        .into_iter()
        .map(|(date, rows)| {
            let cat_means: CategoryScores = categories
                .iter()
                .filter_map(|cat| {
                    let vals: Vec<f64> = rows.iter().filter_map(|r| r.scores.get(cat)).collect();
                    mean(&vals).map(|m| (cat.clone(), m))
                })
                .collect();
            let means: Vec<f64> = cat_means.iter().map(|(_, m)| m).collect();
            DailyAggregate {
                scope,
                date,
                overall_risk: mean(&means).unwrap_or(0.0),
                categories: cat_means,
                avg_polarity: polarity.get(&date).and_then(|v| mean(v)),
            }
        })
        .collect()
}
