//! # Risk Taxonomy
//!
//! Fixed, ordered mapping from risk category to trigger keywords. The
//! taxonomy is a plain value passed to the tagger, scorer and aggregator,
//! so alternate taxonomies can be used side by side (tests, per-deployment
//! config) without touching scoring logic.
//!
//! - Built-in default: logistics, political, weather, labor, esg.
//! - Optional file override (TOML or JSON), `$RISK_TAXONOMY_PATH` first,
//!   then `config/taxonomy.toml`, then `config/taxonomy.json`.
//! - Matching is case-insensitive substring search; results keep
//!   taxonomy order.

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const ENV_TAXONOMY_PATH: &str = "RISK_TAXONOMY_PATH";

static DEFAULT_TAXONOMY: Lazy<RiskTaxonomy> = Lazy::new(|| {
    let seed: [(&str, &[&str]); 5] = [
        (
            "logistics",
            &[
                "shipment",
                "delay",
                "port congestion",
                "container",
                "truck",
                "vessel",
                "berth",
                "backlog",
            ],
        ),
        (
            "political",
            &[
                "sanction",
                "election",
                "government",
                "protest",
                "policy",
                "geopolitical",
                "ussc",
                "embargo",
            ],
        ),
        (
            "weather",
            &["hurricane", "storm", "flood", "earthquake", "typhoon", "cyclone"],
        ),
        (
            "labor",
            &["strike", "union", "workers", "labor", "walkout", "dockworker"],
        ),
        (
            "esg",
            &["environment", "emission", "spill", "pollution", "accident"],
        ),
    ];
    RiskTaxonomy {
        categories: seed
            .iter()
            .map(|(name, kws)| RiskCategory {
                name: name.to_string(),
                keywords: kws.iter().map(|k| k.to_string()).collect(),
            })
            .collect(),
    }
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskCategory {
    pub name: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskTaxonomy {
    categories: Vec<RiskCategory>,
}

impl Default for RiskTaxonomy {
    fn default() -> Self {
        DEFAULT_TAXONOMY.clone()
    }
}

impl RiskTaxonomy {
    /// Build from raw categories: names/keywords are trimmed, empties and
    /// duplicate category names (first wins) are dropped. Fails when nothing
    /// is left.
    pub fn new(categories: Vec<RiskCategory>) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut out = Vec::with_capacity(categories.len());
        for c in categories {
            let name = c.name.trim().to_string();
            if name.is_empty() || !seen.insert(name.clone()) {
                continue;
            }
            let keywords = c
                .keywords
                .iter()
                .map(|k| k.trim())
                .filter(|k| !k.is_empty())
                .map(str::to_string)
                .collect();
            out.push(RiskCategory { name, keywords });
        }
        if out.is_empty() {
            return Err(anyhow!("risk taxonomy has no categories"));
        }
        Ok(Self { categories: out })
    }

    /// Category names in taxonomy order.
    pub fn names(&self) -> Vec<String> {
        self.categories.iter().map(|c| c.name.clone()).collect()
    }

    pub fn categories(&self) -> &[RiskCategory] {
        &self.categories
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Keyword hits per category. A category is present iff at least one of
    /// its keywords occurs in the lower-cased text.
    pub fn tag_keywords(&self, text: &str) -> KeywordTags {
        let lower = text.to_lowercase();
        let mut tags = KeywordTags::default();
        for cat in &self.categories {
            let hits: Vec<String> = cat
                .keywords
                .iter()
                .filter(|w| lower.contains(&w.to_lowercase()))
                .cloned()
                .collect();
            if !hits.is_empty() {
                tags.0.push((cat.name.clone(), hits));
            }
        }
        tags
    }
}

/// Category → matched keywords, in taxonomy order. Never holds an empty
/// keyword list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordTags(Vec<(String, Vec<String>)>);

impl KeywordTags {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, category: &str) -> bool {
        self.0.iter().any(|(c, _)| c == category)
    }

    pub fn get(&self, category: &str) -> Option<&[String]> {
        self.0
            .iter()
            .find(|(c, _)| c == category)
            .map(|(_, kws)| kws.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(c, k)| (c.as_str(), k.as_slice()))
    }
}

impl FromIterator<(String, Vec<String>)> for KeywordTags {
    fn from_iter<I: IntoIterator<Item = (String, Vec<String>)>>(iter: I) -> Self {
        Self(iter.into_iter().filter(|(_, k)| !k.is_empty()).collect())
    }
}

impl Serialize for KeywordTags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (cat, kws) in &self.0 {
            map.serialize_entry(cat, kws)?;
        }
        map.end()
    }
}

/* ----------------------------
File loading (TOML / JSON)
---------------------------- */

#[derive(Deserialize)]
struct TaxonomyFile {
    categories: Vec<RiskCategory>,
}

/// Load a taxonomy from an explicit path. Supports TOML or JSON formats.
pub fn load_taxonomy_from(path: &Path) -> Result<RiskTaxonomy> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading risk taxonomy from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_taxonomy(&content, &ext)
}

/// Resolve the deployment taxonomy:
/// 1) $RISK_TAXONOMY_PATH
/// 2) config/taxonomy.toml
/// 3) config/taxonomy.json
/// 4) built-in default
///
/// A broken file is logged and replaced by the default.
pub fn load_taxonomy_default() -> RiskTaxonomy {
    let candidates: Vec<PathBuf> = match std::env::var(ENV_TAXONOMY_PATH) {
        Ok(p) => vec![PathBuf::from(p)],
        Err(_) => vec![
            PathBuf::from("config/taxonomy.toml"),
            PathBuf::from("config/taxonomy.json"),
        ],
    };
    for p in candidates.iter().filter(|p| p.exists()) {
        match load_taxonomy_from(p) {
            Ok(t) => return t,
            Err(e) => {
                warn!(error = ?e, path = %p.display(), "invalid risk taxonomy; using built-in default");
                return RiskTaxonomy::default();
            }
        }
    }
    RiskTaxonomy::default()
}

fn parse_taxonomy(s: &str, hint_ext: &str) -> Result<RiskTaxonomy> {
    let file = if hint_ext == "json" {
        parse_json(s)?
    } else {
        match toml::from_str::<TaxonomyFile>(s) {
            Ok(f) => f,
            Err(toml_err) => parse_json(s).map_err(|_| anyhow!(toml_err))?,
        }
    };
    RiskTaxonomy::new(file.categories)
}

fn parse_json(s: &str) -> Result<TaxonomyFile> {
    // Accept both `{"categories": [...]}` and a bare array.
    if let Ok(f) = serde_json::from_str::<TaxonomyFile>(s) {
        return Ok(f);
    }
    let categories: Vec<RiskCategory> = serde_json::from_str(s)?;
    Ok(TaxonomyFile { categories })
}
