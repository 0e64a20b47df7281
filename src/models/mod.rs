//! Queue-position, slippage and latency models.
//!
//! Estimators are pure functions of the current book, the model
//! configuration and the session PRNG. They never mutate the book, and
//! every random draw goes through the seeded [`crate::sim::SessionRng`],
//! so two sessions with the same seed produce identical estimates.

mod config;
mod latency;
mod queue;
mod slippage;

pub use config::ModelConfig;
pub use latency::{LatencyModel, VenueLatency};
pub use queue::{fill_probability, time_to_fill};
pub use slippage::{SlippageEstimate, estimate_slippage};
