//! Square-root impact slippage model.

use super::config::ModelConfig;
use crate::types::Qty;
use tracing::trace;

/// A slippage estimate together with the coefficients that produced it,
/// so downstream audit records can report the configuration in force.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlippageEstimate {
    /// Hypothetical order size, in share units.
    pub quantity: f64,
    /// Participation `Q / ADV`.
    pub participation: f64,
    /// Temporary impact term, as a fraction of price.
    pub temporary: f64,
    /// Permanent impact term, as a fraction of price.
    pub permanent: f64,
    /// Half-spread crossing cost, as a fraction of price.
    pub spread_cost: f64,
    /// Total expected slippage, as a fraction of price.
    pub total: f64,
    /// The temporary impact coefficient used.
    pub temporary_impact: f64,
    /// The permanent impact coefficient used.
    pub permanent_impact: f64,
    /// The spread (bps) used.
    pub spread_bps: f64,
}

/// Estimate slippage for a hypothetical order of `quantity` shares.
///
/// `slip = c_temp · √(Q/ADV) + c_perm · √(Q/ADV) + spread_bps / 20000`,
/// evaluated in that fixed term order so the result is identical across
/// runs and platforms.
#[must_use]
pub fn estimate_slippage(config: &ModelConfig, quantity: Qty) -> SlippageEstimate {
    let quantity = f64::from(quantity);
    let participation = if config.adv > 0.0 {
        quantity / config.adv
    } else {
        0.0
    };
    let root = participation.sqrt();
    let temporary = config.temporary_impact * root;
    let permanent = config.permanent_impact * root;
    let spread_cost = config.spread_bps / 20_000.0;
    let total = temporary + permanent + spread_cost;

    trace!(
        quantity,
        participation,
        temporary_impact = config.temporary_impact,
        permanent_impact = config.permanent_impact,
        spread_bps = config.spread_bps,
        total,
        "slippage estimated"
    );

    SlippageEstimate {
        quantity,
        participation,
        temporary,
        permanent,
        spread_cost,
        total,
        temporary_impact: config.temporary_impact,
        permanent_impact: config.permanent_impact,
        spread_bps: config.spread_bps,
    }
}
