//! Queue-position estimators.
//!
//! Both estimators key off the quantity resting ahead of an order in its
//! level queue, which the book computes by walking the L3 queue.

use super::config::ModelConfig;
use crate::book::OrderBook;
use crate::types::OrderId;

/// Expected seconds until the order reaches the front of its queue,
/// assuming trades of `avg_trade_size` arrive at `trade_rate` per second.
/// Zero when the order is already at the front. `None` for unknown ids.
#[must_use]
pub fn time_to_fill(book: &OrderBook, config: &ModelConfig, order_id: OrderId) -> Option<f64> {
    let ahead = book.quantity_ahead(order_id)?;
    if ahead == 0 {
        return Some(0.0);
    }
    let trades_needed = ahead as f64 / config.avg_trade_size;
    Some(trades_needed / config.trade_rate)
}

/// Probability that the order fills within a window of `window_secs`.
///
/// `1 − exp(−2 · min(1, trade_rate · avg_trade_size · w / qty_ahead))`;
/// an order at the front takes the saturated exponent.
/// `None` for unknown ids.
#[must_use]
pub fn fill_probability(
    book: &OrderBook,
    config: &ModelConfig,
    order_id: OrderId,
    window_secs: f64,
) -> Option<f64> {
    let ahead = book.quantity_ahead(order_id)?;
    let inner = if ahead == 0 {
        1.0
    } else {
        let traded = config.trade_rate * config.avg_trade_size * window_secs;
        (traded / ahead as f64).min(1.0)
    };
    Some(1.0 - (-2.0 * inner).exp())
}
