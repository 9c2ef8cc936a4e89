//! HTTP front door: request orchestration, progress streaming, routes.
pub mod error;
pub mod orchestrator;
pub mod routes;
pub mod state;

pub use error::ServiceError;
pub use orchestrator::{ExtractRequest, Orchestrator, OrchestratorSettings};
pub use routes::router;
pub use state::{AppState, build_from_config};
