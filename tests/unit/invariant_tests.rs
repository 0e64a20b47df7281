//! Property-based invariants over random operation sequences.

use matchbook::prelude::*;
use proptest::prelude::*;
use std::collections::HashMap;

#[derive(Debug, Clone)]
enum Op {
    Limit {
        side: Side,
        price: Price,
        quantity: Qty,
        hidden: bool,
        post_only: bool,
    },
    Market {
        side: Side,
        quantity: Qty,
    },
    Cancel {
        target: usize,
    },
    Amend {
        target: usize,
        quantity: Qty,
    },
}

fn side_strategy() -> impl Strategy<Value = Side> {
    prop_oneof![Just(Side::Buy), Just(Side::Sell)]
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (side_strategy(), 95i64..=105, 1u32..=50, any::<bool>(), any::<bool>()).prop_map(
            |(side, price, quantity, hidden, post_only)| Op::Limit {
                side,
                price,
                quantity,
                hidden,
                post_only,
            }
        ),
        1 => (side_strategy(), 1u32..=80).prop_map(|(side, quantity)| Op::Market {
            side,
            quantity,
        }),
        2 => (0usize..64).prop_map(|target| Op::Cancel { target }),
        2 => (0usize..64, 0u32..=60).prop_map(|(target, quantity)| Op::Amend {
            target,
            quantity,
        }),
    ]
}

struct Harness {
    book: OrderBook,
    submitted: Vec<OrderId>,
    next_id: OrderId,
    timestamp: u64,
    add_sequence: HashMap<OrderId, u64>,
    last_mutating_sequence: u64,
}

impl Harness {
    fn new() -> Self {
        Self {
            book: OrderBook::new(1),
            submitted: Vec::new(),
            next_id: 1,
            timestamp: 0,
            add_sequence: HashMap::new(),
            last_mutating_sequence: 0,
        }
    }

    fn apply(&mut self, op: &Op) {
        self.timestamp += 1;
        match *op {
            Op::Limit {
                side,
                price,
                quantity,
                hidden,
                post_only,
            } => {
                let id = self.next_id;
                self.next_id += 1;
                let mut flags = OrderFlags::empty();
                if hidden {
                    flags |= OrderFlags::HIDDEN;
                }
                if post_only {
                    flags |= OrderFlags::POST_ONLY;
                }
                let order = Order::limit(id, 1, side, price, quantity).with_flags(flags);
                let fills = self.book.submit(order, self.timestamp).unwrap();
                // I9: a post-only aggressor never produces a fill.
                if post_only {
                    assert!(fills.is_empty(), "post-only order {id} filled");
                }
                self.check_fill_sequences(&fills);
                self.submitted.push(id);
            }
            Op::Market { side, quantity } => {
                let id = self.next_id;
                self.next_id += 1;
                let fills = self.book.submit_market(id, side, quantity, self.timestamp).unwrap();
                self.check_fill_sequences(&fills);
                self.submitted.push(id);
            }
            Op::Cancel { target } => {
                if let Some(&id) = self.submitted.get(target % self.submitted.len().max(1)) {
                    let _ = self.book.cancel(id, self.timestamp);
                }
            }
            Op::Amend { target, quantity } => {
                if let Some(&id) = self.submitted.get(target % self.submitted.len().max(1)) {
                    let _ = self.book.amend(id, quantity, self.timestamp).unwrap();
                }
            }
        }

        self.check_events();
        self.check_uncrossed();
    }

    /// I5 (second half): fills carry a sequence strictly greater than the
    /// event that created their passive order.
    fn check_fill_sequences(&self, fills: &[Fill]) {
        for fill in fills {
            if let Some(&add_seq) = self.add_sequence.get(&fill.passive_order_id) {
                assert!(
                    fill.sequence_number > add_seq,
                    "fill sequence {} not after passive add sequence {add_seq}",
                    fill.sequence_number
                );
            }
        }
    }

    /// I5 (first half): sequence numbers of book-mutating events strictly
    /// increase. Rejects are stamped without consuming a sequence.
    fn check_events(&mut self) {
        for (sequence, event) in self.book.drain_events() {
            match event {
                AuditEvent::Reject { .. } => {
                    assert!(sequence >= self.last_mutating_sequence);
                }
                AuditEvent::Add { order_id, .. } | AuditEvent::Amend { order_id, .. } => {
                    assert!(sequence > self.last_mutating_sequence);
                    self.last_mutating_sequence = sequence;
                    self.add_sequence.insert(order_id, sequence);
                }
                _ => {
                    assert!(sequence > self.last_mutating_sequence);
                    self.last_mutating_sequence = sequence;
                }
            }
        }
    }

    /// I4: the book never ends an operation crossed.
    fn check_uncrossed(&self) {
        let bbo = self.book.bbo();
        if let (Some(bid), Some(ask)) = (bbo.bid, bbo.ask) {
            assert!(
                bid.price < ask.price,
                "crossed book: bid {} >= ask {}",
                bid.price,
                ask.price
            );
        }
    }

    /// I1 + I2 + I3 over the final state.
    fn check_final_state(&self) {
        let mut total_orders = 0usize;
        for side in [Side::Buy, Side::Sell] {
            for entry in self.book.depth(side, usize::MAX) {
                let orders = self.book.level_orders(side, entry.price);
                assert!(!orders.is_empty(), "empty level {} left in ladder", entry.price);
                total_orders += orders.len();

                // I1: aggregates equal the queue sums.
                let total: u64 = orders.iter().map(|o| u64::from(o.leaves_quantity)).sum();
                let visible: u64 = orders
                    .iter()
                    .filter(|o| !o.flags.contains(OrderFlags::HIDDEN))
                    .map(|o| u64::from(o.leaves_quantity))
                    .sum();
                assert_eq!(entry.total_quantity, total);
                assert_eq!(entry.visible_quantity, visible);
                let hidden_count = orders
                    .iter()
                    .filter(|o| o.flags.contains(OrderFlags::HIDDEN))
                    .count() as u32;
                assert_eq!(entry.hidden_order_count, hidden_count);
                assert_eq!(entry.visible_order_count, orders.len() as u32 - hidden_count);

                // I3: price-time order within the level.
                for pair in orders.windows(2) {
                    let a = (pair[0].arrival_timestamp, pair[0].order_id);
                    let b = (pair[1].arrival_timestamp, pair[1].order_id);
                    assert!(a <= b, "level {} out of time order", entry.price);
                }

                // Every queued order has positive leaves.
                for order in &orders {
                    assert!(order.leaves_quantity > 0);
                    assert!(order.leaves_quantity <= order.original_quantity);
                }
            }
        }
        // I2: the index matches the sum of queue lengths.
        assert_eq!(self.book.open_order_count(), total_orders);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_book_invariants(ops in prop::collection::vec(op_strategy(), 1..150)) {
        let mut harness = Harness::new();
        for op in &ops {
            harness.apply(op);
        }
        harness.check_final_state();
    }

    /// I8: identical inputs and seed give byte-identical journals.
    #[test]
    fn prop_seeded_journals_are_byte_identical(
        ops in prop::collection::vec(op_strategy(), 1..40),
        seed in any::<u64>(),
    ) {
        let dir = tempfile::tempdir().unwrap();
        let mut journals = Vec::new();
        for run in 0..2 {
            let path = dir.path().join(format!("run{run}.mbj"));
            let config = SessionConfig {
                instrument_id: 1,
                session_seed: seed,
                ..SessionConfig::default()
            };
            let mut session = Session::create(config, &path).unwrap();
            let mut submitted: Vec<OrderId> = Vec::new();
            let mut next_id = 1u64;
            for (step, op) in ops.iter().enumerate() {
                let ts = step as u64 + 1;
                match *op {
                    Op::Limit { side, price, quantity, hidden, post_only } => {
                        let mut flags = OrderFlags::empty();
                        if hidden { flags |= OrderFlags::HIDDEN; }
                        if post_only { flags |= OrderFlags::POST_ONLY; }
                        let order = Order::limit(next_id, 1, side, price, quantity)
                            .with_flags(flags);
                        session.submit(order, ts).unwrap();
                        submitted.push(next_id);
                        next_id += 1;
                    }
                    Op::Market { side, quantity } => {
                        session.submit_market(next_id, side, quantity, ts).unwrap();
                        submitted.push(next_id);
                        next_id += 1;
                    }
                    Op::Cancel { target } => {
                        if let Some(&id) = submitted.get(target % submitted.len().max(1)) {
                            session.cancel(id, ts).unwrap();
                        }
                    }
                    Op::Amend { target, quantity } => {
                        if let Some(&id) = submitted.get(target % submitted.len().max(1)) {
                            session.amend(id, quantity, ts).unwrap();
                        }
                    }
                }
            }
            session.close().unwrap();
            journals.push(std::fs::read(&path).unwrap());
        }
        prop_assert_eq!(&journals[0], &journals[1]);
    }
}
