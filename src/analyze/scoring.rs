//! Per-category risk scoring.
//!
//! For every category of the taxonomy:
//!
//! ```text
//! sentiment_risk = max(0, -polarity)
//! keyword        = 0.4 if the category has keyword hits else 0.0
//! severity_boost = 0.5 (high) | 0.25 (medium) | 0.0 (low/unknown/absent)
//! score          = round4(min(1, 0.6*sentiment_risk + keyword + 0.4*severity_boost))
//! ```
//!
//! Severity and sentiment are article-wide; only the keyword term differs
//! between categories of one article.

use chrono::NaiveDate;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use super::ai_adapter::{EnrichmentMeta, Severity};
use super::round4;
use crate::sentiment::SentimentLabel;
use crate::table::{Scope, ScopedArticleRecord};
use crate::taxonomy::{KeywordTags, RiskTaxonomy};

pub const SENTIMENT_WEIGHT: f64 = 0.6;
pub const KEYWORD_BUMP: f64 = 0.4;
pub const SEVERITY_WEIGHT: f64 = 0.4;

/// Category → score in [0,1], in taxonomy order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryScores(Vec<(String, f64)>);

impl CategoryScores {
    pub fn get(&self, category: &str) -> Option<f64> {
        self.0.iter().find(|(c, _)| c == category).map(|(_, s)| *s)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(c, s)| (c.as_str(), *s))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, f64)> for CategoryScores {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Serialize for CategoryScores {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (cat, score) in &self.0 {
            map.serialize_entry(cat, score)?;
        }
        map.end()
    }
}

/// One scored table row: the category scores plus what aggregation and
/// export need to place it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredArticle {
    pub url: String,
    pub title: Option<String>,
    pub scope: Scope,
    pub date: Option<NaiveDate>,
    pub polarity: f64,
    pub sentiment_label: SentimentLabel,
    pub scores: CategoryScores,
    /// Enrichment summary, empty when the article was not enriched.
    pub summary: String,
}

impl ScoredArticle {
    pub fn new(
        record: &ScopedArticleRecord,
        taxonomy: &RiskTaxonomy,
        meta: Option<&EnrichmentMeta>,
    ) -> Self {
        Self {
            url: record.url.clone(),
            title: record.title.clone(),
            scope: record.scope,
            date: record.date,
            polarity: record.polarity,
            sentiment_label: record.sentiment_label,
            scores: score_article(taxonomy, record.polarity, &record.keyword_tags, meta),
            summary: meta.map(|m| m.summary.clone()).unwrap_or_default(),
        }
    }
}

pub fn severity_boost(meta: Option<&EnrichmentMeta>) -> f64 {
    match meta.map(|m| m.severity) {
        Some(Severity::High) => 0.5,
        Some(Severity::Medium) => 0.25,
        _ => 0.0,
    }
}

/// Score one article against every category of `taxonomy`. Missing
/// enrichment behaves exactly like an empty one.
pub fn score_article(
    taxonomy: &RiskTaxonomy,
    polarity: f64,
    keyword_tags: &KeywordTags,
    meta: Option<&EnrichmentMeta>,
) -> CategoryScores {
    let sentiment_risk = (-polarity).max(0.0);
    let boost = severity_boost(meta);

    taxonomy
        .categories()
        .iter()
        .map(|cat| {
            let keyword_contrib = if keyword_tags.contains(&cat.name) {
                KEYWORD_BUMP
            } else {
                0.0
            };
            let raw = sentiment_risk * SENTIMENT_WEIGHT + keyword_contrib + boost * SEVERITY_WEIGHT;
            (cat.name.clone(), round4(raw.min(1.0)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn meta(sev: Severity) -> EnrichmentMeta {
        EnrichmentMeta {
            severity: sev,
            ..EnrichmentMeta::unknown()
        }
    }

    #[test]
    fn no_tags_no_meta_is_sentiment_only() {
        let tax = RiskTaxonomy::default();
        for p in [-1.0, -0.55, -0.3, 0.0, 0.4, 1.0] {
            let s = score_article(&tax, p, &KeywordTags::default(), None);
            let expected = round4(((-p).max(0.0) * 0.6).min(1.0));
            assert_eq!(s.len(), tax.len());
            for (_, v) in s.iter() {
                assert!(approx(v, expected), "p={p} v={v} expected={expected}");
            }
        }
    }

    #[test]
    fn port_strike_example() {
        let tax = RiskTaxonomy::default();
        let tags = tax.tag_keywords("Port strike disrupts shipments");
        assert!(tags.contains("labor") && tags.contains("logistics"));
        let s = score_article(&tax, -0.3, &tags, None);
        assert!(approx(s.get("labor").unwrap(), 0.58));
        assert!(approx(s.get("logistics").unwrap(), 0.58));
        assert!(approx(s.get("weather").unwrap(), 0.18));
        assert!(approx(s.get("political").unwrap(), 0.18));
    }

    #[test]
    fn severity_boost_applies_to_every_category() {
        let tax = RiskTaxonomy::default();
        let none = KeywordTags::default();
        let high = score_article(&tax, 0.0, &none, Some(&meta(Severity::High)));
        let med = score_article(&tax, 0.0, &none, Some(&meta(Severity::Medium)));
        let low = score_article(&tax, 0.0, &none, Some(&meta(Severity::Low)));
        for (_, v) in high.iter() {
            assert!(approx(v, 0.2));
        }
        for (_, v) in med.iter() {
            assert!(approx(v, 0.1));
        }
        for (_, v) in low.iter() {
            assert!(approx(v, 0.0));
        }
    }

    #[test]
    fn unknown_severity_matches_absent_meta() {
        let tax = RiskTaxonomy::default();
        let tags = tax.tag_keywords("flood warning");
        let a = score_article(&tax, -0.42, &tags, None);
        let b = score_article(&tax, -0.42, &tags, Some(&EnrichmentMeta::unknown()));
        assert_eq!(a, b);
    }

    #[test]
    fn keyword_hit_adds_flat_bump_once() {
        let tax = RiskTaxonomy::default();
        // several labor keywords still count as a single hit
        let tags = tax.tag_keywords("strike walkout union strike");
        let s = score_article(&tax, 0.0, &tags, None);
        assert!(approx(s.get("labor").unwrap(), KEYWORD_BUMP));
        assert!(approx(s.get("weather").unwrap(), 0.0));
    }

    #[test]
    fn clamps_at_extremes() {
        let tax = RiskTaxonomy::default();
        let tags = tax.tag_keywords("strike storm shipment sanction spill");
        let s = score_article(&tax, -5.0, &tags, Some(&meta(Severity::High)));
        for (_, v) in s.iter() {
            assert!(approx(v, 1.0));
        }
    }

    #[test]
    fn serializes_in_taxonomy_order() {
        let tax = RiskTaxonomy::default();
        let s = score_article(&tax, 0.0, &KeywordTags::default(), None);
        assert_eq!(
            serde_json::to_string(&s).unwrap(),
            r#"{"logistics":0.0,"political":0.0,"weather":0.0,"labor":0.0,"esg":0.0}"#
        );
    }
}
