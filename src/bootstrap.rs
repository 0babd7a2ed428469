//! Wiring shared by the server and the CLI: tracing, taxonomy, article
//! source and enrichment client, all resolved from `.env`/environment and
//! the optional files under `config/`.

use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::analyze::ai_adapter::{build_client_from_config, DynEnrichmentClient};
use crate::config::ai::AiConfig;
use crate::ingest::providers::newsapi::{NewsApiProvider, UnconfiguredSource};
use crate::ingest::types::ArticleSource;
use crate::pipeline::Pipeline;
use crate::sentiment::LexiconSentiment;
use crate::taxonomy::{load_taxonomy_default, RiskTaxonomy};

/// Crate modules plus the custom `pipeline`, `ingest` and `ai` targets.
pub const DEFAULT_LOG_FILTER: &str = "corridor_risk=info,pipeline=info,ingest=info,ai=info,warn";

/// Compact fmt layer filtered by `RUST_LOG` (default `DEFAULT_LOG_FILTER`).
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

/// NewsAPI when `NEWSAPI_KEY` is set; otherwise a source that fails every
/// fetch with a missing-configuration error, so the process still boots.
pub fn source_from_env() -> Arc<dyn ArticleSource> {
    match NewsApiProvider::from_env() {
        Ok(p) => Arc::new(p),
        Err(e) => {
            warn!(target: "ingest", error = %e, "news source not configured");
            Arc::new(UnconfiguredSource)
        }
    }
}

pub fn enricher_from_config(cfg: &AiConfig, taxonomy: &RiskTaxonomy) -> DynEnrichmentClient {
    // only provider, flag and key length; never the key
    info!(
        target: "ai",
        provider = %cfg.provider,
        enabled = cfg.enabled,
        key_len = cfg.api_key.len(),
        model = %cfg.model,
        "ai config loaded"
    );
    let client = build_client_from_config(cfg, &taxonomy.names());
    if !client.enabled() {
        info!(target: "ai", "enrichment disabled; briefing falls back to fixed text");
    }
    client
}

/// Full pipeline from environment and `config/` files.
pub fn pipeline_from_env() -> Pipeline {
    let taxonomy = Arc::new(load_taxonomy_default());
    info!(categories = ?taxonomy.names(), "risk taxonomy loaded");
    let enricher = enricher_from_config(&AiConfig::load_default(), &taxonomy);
    Pipeline::new(
        source_from_env(),
        enricher,
        Arc::new(LexiconSentiment::new()),
        taxonomy,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn default_filter_keeps_custom_target_info() {
        let out = Captured::default();
        let writer = out.clone();
        let subscriber = tracing_subscriber::registry()
            .with(EnvFilter::new(DEFAULT_LOG_FILTER))
            .with(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(move || writer.clone()),
            );

        tracing::subscriber::with_default(subscriber, || {
            info!(target: "pipeline", "analyzed articles");
            info!(target: "ingest", "fetching articles");
            info!(target: "ai", "ai config loaded");
            info!("risk taxonomy loaded");
            tracing::debug!(target: "pipeline", "enriched flagged article");
            info!(target: "hyper", "connection opened");
        });

        let text = String::from_utf8(out.0.lock().unwrap().clone()).unwrap();
        for msg in [
            "analyzed articles",
            "fetching articles",
            "ai config loaded",
            "risk taxonomy loaded",
        ] {
            assert!(text.contains(msg), "missing {msg:?} in {text}");
        }
        assert!(!text.contains("enriched flagged article"));
        assert!(!text.contains("connection opened"));
    }
}
