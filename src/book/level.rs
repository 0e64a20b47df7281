//! A single price level: a FIFO queue of order nodes plus its aggregates.

use super::pool::NodePool;
use crate::types::{Price, Qty, SeqNum};
use serde::{Deserialize, Serialize};

/// L2 view of one price level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBookEntry {
    /// The level's price in ticks.
    pub price: Price,
    /// Sum of `leaves_quantity` over every queued order.
    pub total_quantity: u64,
    /// Sum of `leaves_quantity` over non-hidden orders.
    pub visible_quantity: u64,
    /// Number of non-hidden orders in the queue.
    pub visible_order_count: u32,
    /// Number of hidden orders in the queue.
    pub hidden_order_count: u32,
    /// Book sequence at which this view was taken.
    pub sequence: SeqNum,
}

/// One price level in a ladder.
///
/// Orders queue head-to-tail in price-time priority; nodes live in the
/// book's pool and are linked by index. Aggregates are maintained on
/// every mutation and `version` is bumped so observers can detect change
/// without diffing the queue.
#[derive(Debug, Clone)]
pub(crate) struct PriceLevel {
    price: Price,
    total_quantity: u64,
    visible_quantity: u64,
    visible_order_count: u32,
    hidden_order_count: u32,
    head: Option<usize>,
    tail: Option<usize>,
    len: u32,
    version: u64,
    /// Neighbor toward the better price (ladder slot index).
    pub(crate) prev_level: Option<usize>,
    /// Neighbor toward the worse price (ladder slot index).
    pub(crate) next_level: Option<usize>,
}

impl PriceLevel {
    pub fn new(price: Price) -> Self {
        Self {
            price,
            total_quantity: 0,
            visible_quantity: 0,
            visible_order_count: 0,
            hidden_order_count: 0,
            head: None,
            tail: None,
            len: 0,
            version: 0,
            prev_level: None,
            next_level: None,
        }
    }

    #[inline]
    pub fn price(&self) -> Price {
        self.price
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn len(&self) -> u32 {
        self.len
    }

    #[inline]
    pub fn total_quantity(&self) -> u64 {
        self.total_quantity
    }

    #[inline]
    pub fn visible_quantity(&self) -> u64 {
        self.visible_quantity
    }

    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Index of the front (oldest, highest-priority) node.
    #[inline]
    pub fn peek_front(&self) -> Option<usize> {
        self.head
    }

    /// Append `node_idx` to the queue.
    ///
    /// Insertion is a tail append with one refinement: when the tail holds
    /// nodes with the same arrival timestamp but a greater order id, the
    /// new node is placed before them, keeping `(arrival_timestamp,
    /// order_id)` non-decreasing head to tail. Timestamps are monotone in
    /// a session, so the walk is a no-op except on timestamp collisions.
    ///
    /// `queue_position` is assigned as queue length + 1 at insert and is
    /// never renumbered afterwards.
    pub fn insert(&mut self, node_idx: usize, pool: &mut NodePool) {
        let incoming = pool.get(node_idx).order;

        // Find the node after which the incoming one belongs.
        let mut after = self.tail;
        while let Some(idx) = after {
            let resting = &pool.get(idx).order;
            if (resting.arrival_timestamp, resting.order_id)
                <= (incoming.arrival_timestamp, incoming.order_id)
            {
                break;
            }
            after = pool.get(idx).prev;
        }

        match after {
            Some(prev_idx) => {
                let next = pool.get(prev_idx).next;
                {
                    let node = pool.get_mut(node_idx);
                    node.prev = Some(prev_idx);
                    node.next = next;
                }
                pool.get_mut(prev_idx).next = Some(node_idx);
                match next {
                    Some(next_idx) => pool.get_mut(next_idx).prev = Some(node_idx),
                    None => self.tail = Some(node_idx),
                }
            }
            None => {
                // New head.
                let old_head = self.head;
                {
                    let node = pool.get_mut(node_idx);
                    node.prev = None;
                    node.next = old_head;
                }
                if let Some(head_idx) = old_head {
                    pool.get_mut(head_idx).prev = Some(node_idx);
                } else {
                    self.tail = Some(node_idx);
                }
                self.head = Some(node_idx);
            }
        }

        let leaves = u64::from(incoming.leaves_quantity);
        self.total_quantity += leaves;
        if incoming.is_hidden() {
            self.hidden_order_count += 1;
        } else {
            self.visible_quantity += leaves;
            self.visible_order_count += 1;
        }
        self.len += 1;
        pool.get_mut(node_idx).order.queue_position = self.len;
        self.version += 1;
    }

    /// Unlink `node_idx` from the queue, removing its remaining quantity
    /// from the aggregates. The caller releases the node to the pool.
    pub fn remove(&mut self, node_idx: usize, pool: &mut NodePool) {
        let (prev, next, leaves, hidden) = {
            let node = pool.get(node_idx);
            (
                node.prev,
                node.next,
                u64::from(node.order.leaves_quantity),
                node.order.is_hidden(),
            )
        };

        match prev {
            Some(prev_idx) => pool.get_mut(prev_idx).next = next,
            None => self.head = next,
        }
        match next {
            Some(next_idx) => pool.get_mut(next_idx).prev = prev,
            None => self.tail = prev,
        }
        {
            let node = pool.get_mut(node_idx);
            node.prev = None;
            node.next = None;
        }

        self.total_quantity -= leaves;
        if hidden {
            self.hidden_order_count -= 1;
        } else {
            self.visible_quantity -= leaves;
            self.visible_order_count -= 1;
        }
        self.len -= 1;
        self.version += 1;
    }

    /// Reduce the node's leaves to `new_leaves` in place (fills and
    /// size-down amends). Queue position is untouched.
    pub fn reduce_quantity(&mut self, node_idx: usize, pool: &mut NodePool, new_leaves: Qty) {
        let node = pool.get_mut(node_idx);
        let old_leaves = node.order.leaves_quantity;
        debug_assert!(new_leaves <= old_leaves);
        node.order.leaves_quantity = new_leaves;
        let hidden = node.order.is_hidden();

        let delta = u64::from(old_leaves - new_leaves);
        self.total_quantity -= delta;
        if !hidden {
            self.visible_quantity -= delta;
        }
        self.version += 1;
    }

    /// L2 snapshot row for this level.
    pub fn entry(&self, sequence: SeqNum) -> OrderBookEntry {
        OrderBookEntry {
            price: self.price,
            total_quantity: self.total_quantity,
            visible_quantity: self.visible_quantity,
            visible_order_count: self.visible_order_count,
            hidden_order_count: self.hidden_order_count,
            sequence,
        }
    }
}
