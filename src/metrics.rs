use axum::{routing::get, Router};
use metrics::gauge;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::taxonomy::RiskTaxonomy;

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder and describe the crate's metrics so
    /// they show up with help text before the first run.
    pub fn init(taxonomy: &RiskTaxonomy) -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new().install_recorder()?;

        crate::ingest::ensure_metrics_described();
        crate::pipeline::ensure_metrics_described();
        gauge!("risk_taxonomy_categories").set(taxonomy.len() as f64);

        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
