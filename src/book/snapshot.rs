//! Immutable snapshots of book state.
//!
//! Snapshots serialize to JSON for persistence and diffing, and carry a
//! SHA-256 integrity digest computed over the canonical JSON bytes.

use super::book::OrderBook;
use super::error::OrderBookError;
use super::level::OrderBookEntry;
use crate::types::{InstrumentId, Price, SeqNum, Side, TimestampUs};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::trace;

/// L2 state of the whole book at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBookSnapshot {
    /// The instrument this snapshot describes.
    pub instrument_id: InstrumentId,
    /// Book timestamp when the snapshot was taken.
    pub timestamp: TimestampUs,
    /// Book sequence when the snapshot was taken.
    pub sequence: SeqNum,
    /// Bid levels, best (highest) first.
    pub bids: Vec<OrderBookEntry>,
    /// Ask levels, best (lowest) first.
    pub asks: Vec<OrderBookEntry>,
    /// Number of orders resting in the book, hidden included.
    pub open_orders: u64,
}

impl OrderBookSnapshot {
    /// Best bid price and visible quantity.
    #[must_use]
    pub fn best_bid(&self) -> Option<(Price, u64)> {
        self.bids
            .first()
            .map(|entry| (entry.price, entry.visible_quantity))
    }

    /// Best ask price and visible quantity.
    #[must_use]
    pub fn best_ask(&self) -> Option<(Price, u64)> {
        self.asks
            .first()
            .map(|entry| (entry.price, entry.visible_quantity))
    }

    /// Midpoint of the best bid and ask.
    #[must_use]
    pub fn mid_price(&self) -> Option<f64> {
        match (self.best_bid(), self.best_ask()) {
            (Some((bid, _)), Some((ask, _))) => Some((bid as f64 + ask as f64) / 2.0),
            _ => None,
        }
    }

    /// Spread in ticks.
    #[must_use]
    pub fn spread(&self) -> Option<Price> {
        match (self.best_bid(), self.best_ask()) {
            (Some((bid, _)), Some((ask, _))) => Some(ask - bid),
            _ => None,
        }
    }

    /// Total resting quantity on the bid side, hidden included.
    #[must_use]
    pub fn total_bid_quantity(&self) -> u64 {
        self.bids.iter().map(|entry| entry.total_quantity).sum()
    }

    /// Total resting quantity on the ask side, hidden included.
    #[must_use]
    pub fn total_ask_quantity(&self) -> u64 {
        self.asks.iter().map(|entry| entry.total_quantity).sum()
    }

    /// Serialize to canonical JSON.
    ///
    /// # Errors
    ///
    /// [`OrderBookError::SerializationError`] on serializer failure.
    pub fn to_json(&self) -> Result<String, OrderBookError> {
        serde_json::to_string(self).map_err(|e| OrderBookError::SerializationError {
            message: e.to_string(),
        })
    }

    /// Deserialize from JSON produced by [`OrderBookSnapshot::to_json`].
    ///
    /// # Errors
    ///
    /// [`OrderBookError::DeserializationError`] on malformed input.
    pub fn from_json(json: &str) -> Result<Self, OrderBookError> {
        serde_json::from_str(json).map_err(|e| OrderBookError::DeserializationError {
            message: e.to_string(),
        })
    }

    /// SHA-256 digest over the canonical JSON bytes, hex-encoded.
    ///
    /// # Errors
    ///
    /// [`OrderBookError::SerializationError`] on serializer failure.
    pub fn digest(&self) -> Result<String, OrderBookError> {
        let json = self.to_json()?;
        let mut hasher = Sha256::new();
        hasher.update(json.as_bytes());
        let digest = hasher.finalize();
        let mut hex = String::with_capacity(digest.len() * 2);
        for byte in digest {
            hex.push_str(&format!("{byte:02x}"));
        }
        Ok(hex)
    }

    /// Recompute the digest and compare it with `expected`.
    ///
    /// # Errors
    ///
    /// [`OrderBookError::ChecksumMismatch`] when the digests differ.
    pub fn verify_digest(&self, expected: &str) -> Result<(), OrderBookError> {
        let actual = self.digest()?;
        if actual != expected {
            return Err(OrderBookError::ChecksumMismatch {
                expected: expected.to_string(),
                actual,
            });
        }
        Ok(())
    }
}

impl OrderBook {
    /// Take a full-depth snapshot of the current state.
    #[must_use]
    pub fn snapshot(&self) -> OrderBookSnapshot {
        let sequence = self.current_sequence();
        let collect = |side: Side| -> Vec<OrderBookEntry> {
            let ladder = self.ladder(side);
            ladder
                .iter_indices()
                .map(|idx| ladder.get(idx).entry(sequence))
                .collect()
        };
        let snapshot = OrderBookSnapshot {
            instrument_id: self.instrument_id(),
            timestamp: self.last_timestamp,
            sequence,
            bids: collect(Side::Buy),
            asks: collect(Side::Sell),
            open_orders: self.open_order_count() as u64,
        };
        trace!(
            sequence,
            bids = snapshot.bids.len(),
            asks = snapshot.asks.len(),
            "snapshot taken"
        );
        snapshot
    }
}
