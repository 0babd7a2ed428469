use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use shuttle_axum::axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;
use tracing::warn;

use crate::config::run::RunConfig;
use crate::error::PipelineError;
use crate::export::{articles_csv, daily_csv};
use crate::pipeline::{Pipeline, RunReport};
use crate::table::Scope;
use crate::taxonomy::RiskTaxonomy;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Pipeline,
}

impl AppState {
    pub fn new(pipeline: Pipeline) -> Self {
        Self { pipeline }
    }

    pub fn taxonomy(&self) -> &Arc<RiskTaxonomy> {
        &self.pipeline.taxonomy
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/taxonomy", get(taxonomy))
        .route("/analyze", post(analyze))
        .route("/export/articles.csv", post(export_articles))
        .route("/export/daily.csv", post(export_daily))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// HTTP face of a failed request.
pub enum ApiError {
    Run(PipelineError),
    Export(anyhow::Error),
}

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        Self::Run(e)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        Self::Export(e)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Run(e) if e.is_missing_configuration() => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Run(PipelineError::InvalidConfig(_)) => StatusCode::BAD_REQUEST,
            ApiError::Run(PipelineError::MissingConfiguration(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Run(PipelineError::Fetch { .. }) => StatusCode::BAD_GATEWAY,
            ApiError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Run(e) => e.to_string(),
            ApiError::Export(e) => format!("{e:#}"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();
        warn!(target: "pipeline", status = status.as_u16(), error = %message, "request failed");
        (status, Json(json!({ "error": message }))).into_response()
    }
}

async fn taxonomy(State(state): State<AppState>) -> Json<RiskTaxonomy> {
    Json(state.taxonomy().as_ref().clone())
}

async fn analyze(
    State(state): State<AppState>,
    Json(cfg): Json<RunConfig>,
) -> Result<Json<RunReport>, ApiError> {
    let report = state.pipeline.run(cfg).await?;
    Ok(Json(report))
}

fn csv_response(body: String) -> Response {
    ([(header::CONTENT_TYPE, "text/csv; charset=utf-8")], body).into_response()
}

async fn export_articles(
    State(state): State<AppState>,
    Json(cfg): Json<RunConfig>,
) -> Result<Response, ApiError> {
    let report = state.pipeline.run(cfg).await?;
    Ok(csv_response(articles_csv(&report.articles)?))
}

#[derive(Debug, Deserialize)]
struct DailyParams {
    #[serde(default)]
    scope: Option<Scope>,
}

async fn export_daily(
    State(state): State<AppState>,
    Query(params): Query<DailyParams>,
    Json(cfg): Json<RunConfig>,
) -> Result<Response, ApiError> {
    let scope = params.scope.unwrap_or(Scope::Corridor);
    let report = state.pipeline.run(cfg).await?;
    Ok(csv_response(daily_csv(report.daily.get(scope), &report.categories)?))
}
