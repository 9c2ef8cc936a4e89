//! Page acquisition with tiered escalation.
//!
//! - [`blocking`]: classifies an HTTP exchange as blocked / not blocked
//! - [`static_tier`]: plain GET with browser-like headers
//! - [`rendered`]: one isolated WebDriver session per request
//! - [`archive`]: closest Wayback snapshot, fetched in raw form
//! - [`pipeline`]: runs the tiers cheapest first and reports provenance

pub mod archive;
pub mod blocking;
pub mod error;
pub mod headers;
pub mod pipeline;
pub mod rendered;
pub mod static_tier;

pub use blocking::{BlockDetector, BlockReason, is_blocked};
pub use error::{AcquireError, TierFailure};
pub use pipeline::{AcquisitionPipeline, Acquirer, TierBudgets};
