//! Provenant Server
//!
//! HTTP front end for the detection engine: request validation, upload
//! gatekeeping, CORS, timing and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use config::{Cli, ServerConfig};
pub use error::AppError;
pub use routes::{create_router, AnalysisResponse};
pub use state::AppState;
