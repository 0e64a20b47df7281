//! Model configuration.

use serde::{Deserialize, Serialize};

/// Coefficients for the queue and slippage estimators.
///
/// The defaults describe a moderately liquid instrument and exist mainly
/// for tests; real sessions load calibrated values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Average size of one trade, in share units.
    pub avg_trade_size: f64,
    /// Trade arrival rate, trades per second.
    pub trade_rate: f64,
    /// Average daily volume, in share units.
    pub adv: f64,
    /// Temporary (liquidity-taking) impact coefficient.
    pub temporary_impact: f64,
    /// Permanent (information) impact coefficient.
    pub permanent_impact: f64,
    /// Quoted spread in basis points.
    pub spread_bps: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            avg_trade_size: 100.0,
            trade_rate: 2.0,
            adv: 5_000_000.0,
            temporary_impact: 0.1,
            permanent_impact: 0.05,
            spread_bps: 2.0,
        }
    }
}
