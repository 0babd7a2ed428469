//! Corridor Risk Service: binary entrypoint.
//! Boots the Axum HTTP server: pipeline collaborators from the environment,
//! the analysis routes, and the Prometheus `/metrics` route.

use shuttle_axum::ShuttleAxum;
use tracing::warn;

use corridor_risk::api::{create_router, AppState};
use corridor_risk::bootstrap;
use corridor_risk::metrics::Metrics;

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    bootstrap::init_tracing();

    let pipeline = bootstrap::pipeline_from_env();
    let metrics = Metrics::init(&pipeline.taxonomy);

    let mut router = create_router(AppState::new(pipeline));
    match metrics {
        Ok(m) => router = router.merge(m.router()),
        Err(e) => warn!(error = %e, "prometheus recorder not installed; /metrics disabled"),
    }

    Ok(router.into())
}
