// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod aggregate;
pub mod analyze;
pub mod api;
pub mod bootstrap;
pub mod config;
pub mod datetime;
pub mod error;
pub mod export;
pub mod flagging;
pub mod ingest;
pub mod metrics;
pub mod pipeline;
pub mod sentiment;
pub mod table;
pub mod taxonomy;

// ---- Re-exports for stable public API ----
pub use analyze::ai_adapter;
pub use crate::api::create_router;
pub use crate::config::run::RunConfig;
pub use crate::error::PipelineError;
pub use crate::pipeline::{Pipeline, RunReport};
