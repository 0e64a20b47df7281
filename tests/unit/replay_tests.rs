//! Replay session behavior: stepping, time-bounded replay, cancellation.

use matchbook::prelude::*;

fn write_journal(path: &std::path::Path) -> (Vec<Fill>, OrderBookSnapshot) {
    let config = SessionConfig {
        instrument_id: 4,
        session_seed: 9,
        ..SessionConfig::default()
    };
    let mut session = Session::create(config, path).unwrap();
    let mut fills = Vec::new();
    session.submit_limit(1, Side::Sell, 100, 10, 100).unwrap();
    session.submit_limit(2, Side::Sell, 101, 8, 200).unwrap();
    session.submit_limit(3, Side::Buy, 99, 6, 300).unwrap();
    fills.extend(session.submit_market(4, Side::Buy, 12, 400).unwrap());
    session.amend(3, 4, 500).unwrap();
    session.cancel(2, 600).unwrap();
    let snapshot = session.snapshot();
    session.close().unwrap();
    (fills, snapshot)
}

#[test]
fn test_step_consumes_one_event_at_a_time() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("step.mbj");
    write_journal(&path);

    let mut replay = ReplaySession::open(&path).unwrap();
    let mut steps = 0u64;
    while replay.step().unwrap() {
        steps += 1;
        assert_eq!(replay.events_processed(), steps);
    }
    assert!(steps > 0);
    // Stepping past the end keeps returning false.
    assert!(!replay.step().unwrap());
    assert_eq!(replay.events_processed(), steps);
}

#[test]
fn test_replay_matches_live_session() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("full.mbj");
    let (live_fills, live_snapshot) = write_journal(&path);

    let mut replay = ReplaySession::open(&path).unwrap();
    replay.replay_all().unwrap();

    assert_eq!(replay.fills(), live_fills.as_slice());
    assert_eq!(replay.snapshot(), live_snapshot);
}

#[test]
fn test_replay_until_stops_at_timestamp_boundary() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("until.mbj");
    write_journal(&path);

    let mut replay = ReplaySession::open(&path).unwrap();
    replay.replay_until(300).unwrap();

    // Only the three resting limit orders have been applied.
    assert_eq!(replay.book().open_order_count(), 3);
    assert!(replay.fills().is_empty());

    // Resuming processes the rest and converges to the full state.
    replay.replay_until(u64::MAX).unwrap();
    assert_eq!(replay.fills().len(), 2);
    assert_eq!(replay.book().open_order_count(), 1);
}

#[test]
fn test_replay_cancellation_stops_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cancelled.mbj");
    write_journal(&path);

    let token = CancelToken::new();
    token.cancel();
    let mut replay = ReplaySession::open(&path)
        .unwrap()
        .with_cancel_token(token);
    let processed = replay.replay_all().unwrap();
    assert_eq!(processed, 0);
}

#[test]
fn test_replay_listener_observes_stream() {
    struct CountingListener {
        trades: std::rc::Rc<std::cell::Cell<u32>>,
    }
    impl BookListener for CountingListener {
        fn on_trade(&mut self, _fill: &Fill) {
            self.trades.set(self.trades.get() + 1);
        }
    }

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("listener.mbj");
    let (live_fills, _) = write_journal(&path);

    let trades = std::rc::Rc::new(std::cell::Cell::new(0));
    let mut replay = ReplaySession::open(&path)
        .unwrap()
        .with_listener(Box::new(CountingListener {
            trades: trades.clone(),
        }));
    replay.replay_all().unwrap();
    assert_eq!(trades.get() as usize, live_fills.len());
}

#[test]
fn test_replay_applies_recorded_amend_policy() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("policy.mbj");
    let config = SessionConfig {
        amend_policy: AmendPolicy::RejectSizeUp,
        ..SessionConfig::default()
    };
    let mut session = Session::create(config, &path).unwrap();
    session.submit_limit(1, Side::Buy, 99, 5, 1).unwrap();
    // Refused: no Amend event reaches the journal.
    let outcome = session.amend(1, 50, 2).unwrap();
    assert!(matches!(outcome, AmendOutcome::Rejected(_)));
    let live_snapshot = session.snapshot();
    session.close().unwrap();

    let mut replay = ReplaySession::open(&path).unwrap();
    replay.replay_all().unwrap();
    assert_eq!(replay.book().amend_policy(), AmendPolicy::RejectSizeUp);
    assert_eq!(replay.snapshot(), live_snapshot);
}

#[test]
fn test_replay_of_unfinalized_journal_is_degraded_but_complete() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("unfinalized.mbj");
    {
        // Session dropped without close(): events flushed, no footer.
        let mut session = Session::create(SessionConfig::default(), &path).unwrap();
        session.submit_limit(1, Side::Sell, 100, 10, 1).unwrap();
        session.submit_market(2, Side::Buy, 4, 2).unwrap();
    }

    let mut replay = ReplaySession::open(&path).unwrap();
    assert!(replay.integrity_degraded());
    replay.replay_all().unwrap();
    assert_eq!(replay.fills().len(), 1);
    assert_eq!(replay.book().order(1).unwrap().leaves_quantity, 6);
}

#[test]
fn test_replay_of_truncated_journal_stops_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("truncated.mbj");
    {
        let mut session = Session::create(SessionConfig::default(), &path).unwrap();
        session.submit_limit(1, Side::Sell, 100, 10, 1).unwrap();
        session.submit_limit(2, Side::Buy, 99, 5, 2).unwrap();
    }

    // Chop the file mid-record.
    let bytes = std::fs::read(&path).unwrap();
    std::fs::write(&path, &bytes[..bytes.len() - 7]).unwrap();

    let mut replay = ReplaySession::open(&path).unwrap();
    assert!(replay.integrity_degraded());
    let processed = replay.replay_all().unwrap();
    // Everything up to the torn record was applied.
    assert!(processed >= 2);
    assert_eq!(replay.book().order(1).unwrap().leaves_quantity, 10);
}

#[test]
fn test_replay_never_writes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("readonly.mbj");
    write_journal(&path);
    let before = std::fs::read(&path).unwrap();

    let mut replay = ReplaySession::open(&path).unwrap();
    replay.replay_all().unwrap();
    drop(replay);

    let after = std::fs::read(&path).unwrap();
    assert_eq!(before, after);
}
