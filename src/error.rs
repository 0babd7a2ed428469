//! Run-level failures. Everything per-article degrades locally (see
//! `analyze::ai_adapter`, `datetime`) and never shows up here.

use crate::table::Scope;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Article source failed for one scope; the whole run is aborted.
    #[error("fetching {scope} articles failed: {source:#}")]
    Fetch {
        scope: Scope,
        #[source]
        source: anyhow::Error,
    },
    /// A required key/setting is absent (e.g. `NEWSAPI_KEY`).
    #[error("missing configuration: {0}")]
    MissingConfiguration(&'static str),
    #[error("invalid run configuration: {0}")]
    InvalidConfig(String),
}

impl PipelineError {
    /// Walks the `Fetch` source chain looking for a `MissingConfiguration`
    /// raised inside a provider, so a missing key is not reported as an
    /// upstream outage.
    pub fn is_missing_configuration(&self) -> bool {
        match self {
            PipelineError::MissingConfiguration(_) => true,
            PipelineError::Fetch { source, .. } => source.chain().any(|e| {
                matches!(
                    e.downcast_ref::<PipelineError>(),
                    Some(PipelineError::MissingConfiguration(_))
                )
            }),
            PipelineError::InvalidConfig(_) => false,
        }
    }
}
