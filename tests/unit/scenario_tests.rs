//! The seed matching scenarios, end to end.

use matchbook::prelude::*;

#[test]
fn test_single_match() {
    let mut book = OrderBook::new(1);
    book.submit_limit(1, Side::Sell, 100, 10, 0).unwrap();
    let fills = book.submit_market(2, Side::Buy, 4, 1).unwrap();

    assert_eq!(fills.len(), 1);
    let fill = fills[0];
    assert_eq!(fill.passive_order_id, 1);
    assert_eq!(fill.aggressor_order_id, 2);
    assert_eq!(fill.price, 100);
    assert_eq!(fill.quantity, 4);

    // One ask remains at 100, size 6.
    let asks = book.depth(Side::Sell, 10);
    assert_eq!(asks.len(), 1);
    assert_eq!(asks[0].price, 100);
    assert_eq!(asks[0].total_quantity, 6);
}

#[test]
fn test_partial_and_full_traversal() {
    let mut book = OrderBook::new(1);
    book.submit_limit(1, Side::Sell, 100, 3, 0).unwrap();
    book.submit_limit(2, Side::Sell, 101, 5, 1).unwrap();

    let fills = book.submit_market(3, Side::Buy, 6, 2).unwrap();
    assert_eq!(fills.len(), 2);
    assert_eq!(
        (fills[0].passive_order_id, fills[0].aggressor_order_id, fills[0].price, fills[0].quantity),
        (1, 3, 100, 3)
    );
    assert_eq!(
        (fills[1].passive_order_id, fills[1].aggressor_order_id, fills[1].price, fills[1].quantity),
        (2, 3, 101, 3)
    );

    let asks = book.depth(Side::Sell, 10);
    assert_eq!(asks.len(), 1);
    assert_eq!(asks[0].price, 101);
    assert_eq!(asks[0].total_quantity, 2);
}

#[test]
fn test_price_time_priority() {
    let mut book = OrderBook::new(1);
    book.submit_limit(1, Side::Buy, 99, 4, 10).unwrap();
    book.submit_limit(2, Side::Buy, 99, 4, 11).unwrap();

    let fills = book.submit_limit(3, Side::Sell, 99, 5, 12).unwrap();
    assert_eq!(fills.len(), 2);
    assert_eq!(
        (fills[0].passive_order_id, fills[0].price, fills[0].quantity),
        (1, 99, 4)
    );
    assert_eq!(
        (fills[1].passive_order_id, fills[1].price, fills[1].quantity),
        (2, 99, 1)
    );

    // Order 2 rests with 3 left; the aggressor is gone.
    let resting = book.order(2).unwrap();
    assert_eq!(resting.leaves_quantity, 3);
    assert!(book.order(1).is_none());
    assert!(book.order(3).is_none());
}

#[test]
fn test_post_only_reject() {
    struct RejectProbe(std::rc::Rc<std::cell::RefCell<Vec<RejectReason>>>);
    impl BookListener for RejectProbe {
        fn on_order_rejected(&mut self, _order: &Order, reason: RejectReason) {
            self.0.borrow_mut().push(reason);
        }
    }

    let reasons = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
    let mut book = OrderBook::new(1).with_listener(Box::new(RejectProbe(reasons.clone())));
    book.submit_limit(1, Side::Sell, 100, 10, 0).unwrap();

    let post_only = Order::limit(42, 1, Side::Buy, 100, 5).with_flags(OrderFlags::POST_ONLY);
    let fills = book.submit(post_only, 1).unwrap();

    assert!(fills.is_empty());
    assert!(book.order(42).is_none());
    assert_eq!(reasons.borrow().clone(), vec![RejectReason::PostOnlyWouldTake]);
}

#[test]
fn test_cancel_preserves_others() {
    let mut book = OrderBook::new(1);
    book.submit_limit(1, Side::Buy, 99, 5, 0).unwrap();
    book.submit_limit(2, Side::Buy, 99, 5, 1).unwrap();
    book.submit_limit(3, Side::Buy, 99, 5, 2).unwrap();

    book.cancel(2, 3).unwrap();

    let ids: Vec<u64> = book
        .level_orders(Side::Buy, 99)
        .iter()
        .map(|order| order.order_id)
        .collect();
    assert_eq!(ids, vec![1, 3]);
    assert_eq!(book.quantity_ahead(3), Some(5));
}

fn drive_session(session: &mut Session) -> Vec<Fill> {
    let mut fills = Vec::new();
    session.submit_limit(1, Side::Buy, 99, 5, 10).unwrap();
    session.submit_limit(2, Side::Buy, 99, 5, 11).unwrap();
    session.submit_limit(3, Side::Buy, 99, 5, 12).unwrap();
    session.submit_limit(4, Side::Sell, 101, 6, 13).unwrap();
    session.cancel(2, 14).unwrap();
    fills.extend(session.submit_market(5, Side::Buy, 4, 15).unwrap());
    fills
}

#[test]
fn test_replay_determinism() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scenario6.mbj");
    let config = SessionConfig {
        instrument_id: 1,
        session_seed: 12345,
        ..SessionConfig::default()
    };

    let mut session = Session::create(config.clone(), &path).unwrap();
    let live_fills = drive_session(&mut session);
    let live_snapshot = session.snapshot();
    let live_top = session.best_bid_ask();
    session.close().unwrap();

    // Replay regenerates the same fills and the same final book.
    let mut replay = ReplaySession::open(&path).unwrap();
    assert!(!replay.integrity_degraded());
    assert_eq!(replay.session_seed(), 12345);
    replay.replay_all().unwrap();

    let replay_fills: Vec<(i64, u32, u64, u64, u64)> = replay
        .fills()
        .iter()
        .map(|f| (f.price, f.quantity, f.aggressor_order_id, f.passive_order_id, f.sequence_number))
        .collect();
    let live: Vec<(i64, u32, u64, u64, u64)> = live_fills
        .iter()
        .map(|f| (f.price, f.quantity, f.aggressor_order_id, f.passive_order_id, f.sequence_number))
        .collect();
    assert_eq!(replay_fills, live);

    let replayed_snapshot = replay.snapshot();
    assert_eq!(replayed_snapshot.best_bid(), live_snapshot.best_bid());
    assert_eq!(replayed_snapshot.best_ask(), live_snapshot.best_ask());
    assert_eq!(replayed_snapshot.open_orders, live_snapshot.open_orders);
    assert_eq!(
        replayed_snapshot.total_bid_quantity(),
        live_snapshot.total_bid_quantity()
    );
    assert_eq!(
        replayed_snapshot.total_ask_quantity(),
        live_snapshot.total_ask_quantity()
    );
    assert_eq!(replayed_snapshot, live_snapshot);
    assert_eq!(replay.book().best_bid_ask(), live_top);

    // Same seed, same inputs: byte-identical journals.
    let path_a = dir.path().join("run_a.mbj");
    let path_b = dir.path().join("run_b.mbj");
    for path in [&path_a, &path_b] {
        let mut session = Session::create(config.clone(), path).unwrap();
        drive_session(&mut session);
        session.close().unwrap();
    }
    let bytes_a = std::fs::read(&path_a).unwrap();
    let bytes_b = std::fs::read(&path_b).unwrap();
    assert_eq!(bytes_a, bytes_b);
}
