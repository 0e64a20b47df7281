//! Per-venue log-normal latency model.

use crate::sim::SessionRng;
use serde::{Deserialize, Serialize};

/// Latency parameters for one venue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VenueLatency {
    /// Venue name, for reporting.
    pub name: String,
    /// Median one-way latency in microseconds.
    pub median_us: f64,
    /// Log-space standard deviation.
    pub sigma: f64,
}

/// A table of venues sampled with log-normal draws:
/// `exp(µ + σ·z)` with `µ = ln(median_us)` and `z` from Box-Muller over
/// two uniform draws of the session PRNG.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LatencyModel {
    venues: Vec<VenueLatency>,
}

impl LatencyModel {
    /// Build a model over a venue table.
    #[must_use]
    pub fn new(venues: Vec<VenueLatency>) -> Self {
        Self { venues }
    }

    /// Number of configured venues.
    #[must_use]
    pub fn venue_count(&self) -> usize {
        self.venues.len()
    }

    /// Parameters of one venue.
    #[must_use]
    pub fn venue(&self, index: usize) -> Option<&VenueLatency> {
        self.venues.get(index)
    }

    /// Draw one latency sample, in microseconds, for the venue at
    /// `index`. Consumes exactly two uniform draws from `rng`.
    /// `None` for unknown venues.
    #[must_use]
    pub fn sample_us(&self, index: usize, rng: &mut SessionRng) -> Option<f64> {
        let venue = self.venues.get(index)?;
        let mu = venue.median_us.ln();
        let z = rng.next_normal();
        Some((mu + venue.sigma * z).exp())
    }
}
