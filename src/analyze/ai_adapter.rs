//! AI adapter: enrichment (per-article classification) and narrative briefing.
//!
//! Every failure path degrades to a well-formed value: `classify` yields
//! `EnrichmentMeta::unknown()`, `narrate` yields a fixed fallback string.
//! Nothing here returns an error to the pipeline.

use std::collections::BTreeSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use metrics::counter;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::ai::AiConfig;

pub const BRIEFING_NO_CLIENT: &str =
    "AI key not set. Configure OPENAI_API_KEY to generate the briefing.";
pub const BRIEFING_UNAVAILABLE: &str = "Briefing unavailable (AI error).";

/// Extra labels the classifier may use besides the taxonomy names.
const EXTRA_CATEGORIES: [&str; 2] = ["security", "other"];

// ------------------------------------------------------------
// Public surface
// ------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Severity {
    Low,
    Medium,
    High,
    #[default]
    Unknown,
}

impl Severity {
    /// Case-insensitive; anything unrecognised is `Unknown`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Severity::Low,
            "medium" => Severity::Medium,
            "high" => Severity::High,
            _ => Severity::Unknown,
        }
    }
}

impl From<String> for Severity {
    fn from(s: String) -> Self {
        Severity::parse(&s)
    }
}

/// Classifier output for one article (keyed by url in the pipeline).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentMeta {
    #[serde(default)]
    pub categories: BTreeSet<String>,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub severity: Severity,
    /// Failure text when this value is a degraded fallback.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EnrichmentMeta {
    pub fn unknown() -> Self {
        Self::default()
    }

    fn failed(err: &anyhow::Error) -> Self {
        Self {
            error: Some(format!("{err:#}")),
            ..Self::default()
        }
    }
}

/// Headline handed to the briefing prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BriefingItem {
    pub title: String,
    pub source: String,
    pub url: String,
}

pub type BoxFut<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Enrichment collaborator used by the pipeline.
pub trait EnrichmentClient: Send + Sync {
    /// Classify one article. Never fails; see `EnrichmentMeta::unknown`.
    fn classify<'a>(&'a self, title: &'a str, description: &'a str) -> BoxFut<'a, EnrichmentMeta>;
    /// Plaintext briefing for the corridor. Never fails; falls back to a fixed text.
    fn narrate<'a>(
        &'a self,
        origin: &'a str,
        destination: &'a str,
        flagged: &'a [BriefingItem],
        top_k: usize,
    ) -> BoxFut<'a, String>;
    /// Provider name for diagnostics/headers.
    fn provider_name(&self) -> &'static str;
    /// `false` means no classification calls should be made at all.
    fn enabled(&self) -> bool {
        true
    }
}

pub type DynEnrichmentClient = Arc<dyn EnrichmentClient>;

/// Factory: build a client according to config and environment variables.
///
/// * If `AI_TEST_MODE=mock`, returns a deterministic mock client.
/// * Else if `config.enabled==false` or no key is available, returns a disabled client.
/// * Else builds the OpenAI client.
pub fn build_client_from_config(config: &AiConfig, categories: &[String]) -> DynEnrichmentClient {
    if std::env::var("AI_TEST_MODE")
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        return Arc::new(MockEnricher::default());
    }

    if !config.enabled || config.api_key.trim().is_empty() {
        return Arc::new(DisabledClient);
    }

    match config.provider.as_str() {
        "openai" => match OpenAiEnricher::new(config, categories) {
            Ok(c) => Arc::new(c),
            Err(e) => {
                warn!(target: "ai", error = ?e, "openai client build failed; enrichment disabled");
                Arc::new(DisabledClient)
            }
        },
        other => {
            warn!(target: "ai", provider = other, "unsupported AI provider; enrichment disabled");
            Arc::new(DisabledClient)
        }
    }
}

// ------------------------------------------------------------
// Prompts + response parsing
// ------------------------------------------------------------

pub fn classify_prompt(title: &str, description: &str, categories: &[String]) -> String {
    let mut allowed: Vec<String> = categories.to_vec();
    for extra in EXTRA_CATEGORIES {
        if !allowed.iter().any(|c| c == extra) {
            allowed.push(extra.to_string());
        }
    }
    let allowed = serde_json::to_string(&allowed).unwrap_or_else(|_| "[]".to_string());
    let article = serde_json::json!({ "title": title, "description": description });
    format!(
        "You are an analyst. Given the following article title and description, return a JSON object with keys:\n\
         - categories: list chosen from {allowed}\n\
         - summary: one-sentence summary of the issue\n\
         - severity: \"low\", \"medium\", or \"high\"\n\n\
         Article:\n{article}\n"
    )
}

pub fn briefing_prompt(
    origin: &str,
    destination: &str,
    flagged: &[BriefingItem],
    top_k: usize,
) -> String {
    let bullets = flagged
        .iter()
        .take(top_k)
        .map(|a| format!("- {} ({})\n  {}", a.title, a.source, a.url))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "You are a supply chain analyst. Produce a concise daily briefing (3-6 short paragraphs) for the corridor between {origin} and {destination}.\n\
         - Use any provided risk and sentiment context implied by the flagged headlines.\n\
         - Mention the most likely disruption categories (logistics, political, weather, labor, esg) if present.\n\
         - Then add 2-3 recommended actions for a logistics manager (short bullets).\n\
         - Finally, list the top {top_k} flagged articles (title + source + url).\n\n\
         Flagged items:\n{bullets}\n\n\
         Return plaintext only.\n"
    )
}

/// Parse the classifier's JSON reply. Fields are optional; severity is lenient.
pub fn parse_meta_json(content: &str) -> Result<EnrichmentMeta> {
    #[derive(Deserialize)]
    struct Raw {
        #[serde(default)]
        categories: Vec<String>,
        #[serde(default)]
        summary: Option<String>,
        #[serde(default)]
        severity: Option<String>,
    }
    let raw: Raw = serde_json::from_str(content.trim()).context("classifier reply is not JSON")?;
    Ok(EnrichmentMeta {
        categories: raw
            .categories
            .into_iter()
            .map(|c| c.trim().to_ascii_lowercase())
            .filter(|c| !c.is_empty())
            .collect(),
        summary: raw.summary.unwrap_or_default().trim().to_string(),
        severity: Severity::parse(raw.severity.as_deref().unwrap_or_default()),
        error: None,
    })
}

// ------------------------------------------------------------
// Concrete clients
// ------------------------------------------------------------

/// OpenAI Chat Completions client. Requires an API key.
pub struct OpenAiEnricher {
    http: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
    categories: Vec<String>,
}

impl OpenAiEnricher {
    pub fn new(config: &AiConfig, categories: &[String]) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("corridor-risk/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(30))
            .build()
            .context("building openai http client")?;
        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            endpoint: config.endpoint.clone(),
            categories: categories.to_vec(),
        })
    }

    async fn chat(
        &self,
        prompt: &str,
        temperature: f32,
        max_tokens: u32,
        json_mode: bool,
    ) -> Result<String> {
        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }
        #[derive(Serialize)]
        struct ResponseFormat {
            #[serde(rename = "type")]
            kind: &'static str,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            temperature: f32,
            max_tokens: u32,
            #[serde(skip_serializing_if = "Option::is_none")]
            response_format: Option<ResponseFormat>,
        }
        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMsg,
        }
        #[derive(Deserialize)]
        struct ChoiceMsg {
            #[serde(default)]
            content: Option<String>,
        }

        let req = Req {
            model: &self.model,
            messages: vec![Msg {
                role: "user",
                content: prompt,
            }],
            temperature,
            max_tokens,
            response_format: json_mode.then_some(ResponseFormat {
                kind: "json_object",
            }),
        };

        counter!("ai_requests_total").increment(1);
        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .context("openai http post()")?
            .error_for_status()
            .context("openai http status")?;
        let body: Resp = resp.json().await.context("openai json body")?;
        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| anyhow!("openai reply has no content"))
    }

    async fn classify_impl(&self, title: &str, description: &str) -> EnrichmentMeta {
        let prompt = classify_prompt(title, description, &self.categories);
        let res = match self.chat(&prompt, 0.0, 200, true).await {
            Ok(content) => parse_meta_json(&content),
            Err(e) => Err(e),
        };
        match res {
            Ok(meta) => meta,
            Err(e) => {
                counter!("ai_failures_total", "op" => "classify").increment(1);
                warn!(target: "ai", error = ?e, "classify failed; severity unknown");
                EnrichmentMeta::failed(&e)
            }
        }
    }

    async fn narrate_impl(
        &self,
        origin: &str,
        destination: &str,
        flagged: &[BriefingItem],
        top_k: usize,
    ) -> String {
        let prompt = briefing_prompt(origin, destination, flagged, top_k);
        match self.chat(&prompt, 0.2, 500, false).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => BRIEFING_UNAVAILABLE.to_string(),
            Err(e) => {
                counter!("ai_failures_total", "op" => "narrate").increment(1);
                warn!(target: "ai", error = ?e, "briefing failed; using fallback");
                BRIEFING_UNAVAILABLE.to_string()
            }
        }
    }
}

impl EnrichmentClient for OpenAiEnricher {
    fn classify<'a>(&'a self, title: &'a str, description: &'a str) -> BoxFut<'a, EnrichmentMeta> {
        Box::pin(self.classify_impl(title, description))
    }

    fn narrate<'a>(
        &'a self,
        origin: &'a str,
        destination: &'a str,
        flagged: &'a [BriefingItem],
        top_k: usize,
    ) -> BoxFut<'a, String> {
        Box::pin(self.narrate_impl(origin, destination, flagged, top_k))
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}

/// Used when AI is disabled: no enrichment, fixed "not configured" briefing.
pub struct DisabledClient;

impl EnrichmentClient for DisabledClient {
    fn classify<'a>(&'a self, _title: &'a str, _description: &'a str) -> BoxFut<'a, EnrichmentMeta> {
        Box::pin(async { EnrichmentMeta::unknown() })
    }

    fn narrate<'a>(
        &'a self,
        _origin: &'a str,
        _destination: &'a str,
        _flagged: &'a [BriefingItem],
        _top_k: usize,
    ) -> BoxFut<'a, String> {
        Box::pin(async { BRIEFING_NO_CLIENT.to_string() })
    }

    fn provider_name(&self) -> &'static str {
        "disabled"
    }

    fn enabled(&self) -> bool {
        false
    }
}

/// Deterministic client for tests/local runs (`AI_TEST_MODE=mock`).
#[derive(Clone)]
pub struct MockEnricher {
    pub fixed: EnrichmentMeta,
}

impl Default for MockEnricher {
    fn default() -> Self {
        Self {
            fixed: EnrichmentMeta {
                categories: BTreeSet::from(["logistics".to_string()]),
                summary: "Mock summary".to_string(),
                severity: Severity::Medium,
                error: None,
            },
        }
    }
}

impl EnrichmentClient for MockEnricher {
    fn classify<'a>(&'a self, _title: &'a str, _description: &'a str) -> BoxFut<'a, EnrichmentMeta> {
        let out = self.fixed.clone();
        Box::pin(async move { out })
    }

    fn narrate<'a>(
        &'a self,
        origin: &'a str,
        destination: &'a str,
        flagged: &'a [BriefingItem],
        top_k: usize,
    ) -> BoxFut<'a, String> {
        let n = flagged.len().min(top_k);
        Box::pin(async move { format!("Mock briefing {origin} -> {destination}: {n} flagged items.") })
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_parse_is_lenient() {
        assert_eq!(Severity::parse("HIGH"), Severity::High);
        assert_eq!(Severity::parse(" Medium "), Severity::Medium);
        assert_eq!(Severity::parse("low"), Severity::Low);
        assert_eq!(Severity::parse("catastrophic"), Severity::Unknown);
        assert_eq!(Severity::parse(""), Severity::Unknown);
    }

    #[test]
    fn meta_json_parses_and_normalizes() {
        let m = parse_meta_json(
            r#"{"categories":["Labor"," logistics ",""],"summary":" Strike at port. ","severity":"High"}"#,
        )
        .unwrap();
        assert_eq!(
            m.categories,
            BTreeSet::from(["labor".to_string(), "logistics".to_string()])
        );
        assert_eq!(m.summary, "Strike at port.");
        assert_eq!(m.severity, Severity::High);
    }

    #[test]
    fn meta_json_missing_fields_default() {
        let m = parse_meta_json("{}").unwrap();
        assert_eq!(m, EnrichmentMeta::unknown());
        assert!(parse_meta_json("not json").is_err());
    }

    #[test]
    fn meta_serde_roundtrip_uses_lowercase_severity() {
        let v = serde_json::to_value(EnrichmentMeta {
            severity: Severity::High,
            ..EnrichmentMeta::unknown()
        })
        .unwrap();
        assert_eq!(v["severity"], "high");
        assert!(v.get("error").is_none());
        let back: EnrichmentMeta = serde_json::from_str(r#"{"severity":"MEDIUM"}"#).unwrap();
        assert_eq!(back.severity, Severity::Medium);
    }

    #[test]
    fn prompts_list_categories_and_headlines() {
        let cats = vec!["logistics".to_string(), "labor".to_string()];
        let p = classify_prompt("Port strike", "Dockworkers out", &cats);
        assert!(p.contains(r#"["logistics","labor","security","other"]"#));
        assert!(p.contains("Port strike"));

        let items = vec![
            BriefingItem {
                title: "A".into(),
                source: "S1".into(),
                url: "u1".into(),
            },
            BriefingItem {
                title: "B".into(),
                source: "S2".into(),
                url: "u2".into(),
            },
        ];
        let b = briefing_prompt("Shanghai", "Los Angeles", &items, 1);
        assert!(b.contains("- A (S1)\n  u1"));
        assert!(!b.contains("- B (S2)"));
        assert!(b.contains("between Shanghai and Los Angeles"));
    }

    #[tokio::test]
    async fn disabled_client_degrades() {
        let c = DisabledClient;
        assert!(!c.enabled());
        assert_eq!(c.classify("t", "d").await, EnrichmentMeta::unknown());
        assert_eq!(c.narrate("a", "b", &[], 3).await, BRIEFING_NO_CLIENT);
    }

    #[tokio::test]
    async fn unreachable_endpoint_yields_unknown_and_fallback() {
        let cfg = AiConfig {
            enabled: true,
            provider: "openai".into(),
            api_key: "sk-test".into(),
            model: "gpt-4o-mini".into(),
            endpoint: "http://127.0.0.1:9/v1/chat/completions".into(),
        };
        let c = OpenAiEnricher::new(&cfg, &["labor".to_string()]).unwrap();
        let m = c.classify("Port strike", "").await;
        assert_eq!(m.severity, Severity::Unknown);
        assert!(m.categories.is_empty());
        assert!(m.summary.is_empty());
        assert!(m.error.is_some());
        assert_eq!(c.narrate("a", "b", &[], 3).await, BRIEFING_UNAVAILABLE);
    }
}
