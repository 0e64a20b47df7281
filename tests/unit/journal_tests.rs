//! Journal writer/reader integration and codec round-trip properties.

use matchbook::journal::{
    self, EventType, FOOTER_SIZE, HEADER_SIZE, JournalCallbacks, MAX_EVENT_SIZE,
};
use matchbook::prelude::*;
use proptest::prelude::*;

fn reason_strategy() -> impl Strategy<Value = RejectReason> {
    prop_oneof![
        Just(RejectReason::BadOrderId),
        Just(RejectReason::BadPrice),
        Just(RejectReason::BadQuantity),
        Just(RejectReason::DuplicateOrderId),
        Just(RejectReason::PostOnlyWouldTake),
        Just(RejectReason::FokUnfillable),
        Just(RejectReason::AmendSizeUp),
    ]
}

fn event_strategy() -> impl Strategy<Value = AuditEvent> {
    prop_oneof![
        (any::<u64>(), any::<u64>(), any::<i64>(), any::<u32>(), any::<u16>()).prop_map(
            |(timestamp, order_id, price, quantity, packed_attributes)| AuditEvent::Add {
                timestamp,
                order_id,
                price,
                quantity,
                packed_attributes,
            }
        ),
        (any::<u64>(), any::<u64>(), any::<u32>(), any::<u32>()).prop_map(
            |(timestamp, order_id, leaves_quantity, original_quantity)| AuditEvent::Cancel {
                timestamp,
                order_id,
                leaves_quantity,
                original_quantity,
            }
        ),
        (any::<u64>(), any::<u64>(), any::<u32>(), any::<u32>(), any::<i64>(), any::<i64>())
            .prop_map(
                |(timestamp, order_id, new_quantity, old_quantity, new_price, old_price)| {
                    AuditEvent::Amend {
                        timestamp,
                        order_id,
                        new_quantity,
                        old_quantity,
                        new_price,
                        old_price,
                    }
                }
            ),
        (any::<u64>(), any::<i64>(), any::<u32>(), any::<u64>(), any::<u64>()).prop_map(
            |(timestamp, price, quantity, buy_order_id, sell_order_id)| AuditEvent::Fill {
                timestamp,
                price,
                quantity,
                buy_order_id,
                sell_order_id,
            }
        ),
        (any::<u64>(), any::<i64>(), any::<u32>(), any::<u64>(), any::<u64>()).prop_map(
            |(timestamp, price, quantity, buy_order_id, sell_order_id)| AuditEvent::Trade {
                timestamp,
                price,
                quantity,
                buy_order_id,
                sell_order_id,
            }
        ),
        (any::<u64>(), any::<u64>(), reason_strategy(), any::<u32>(), any::<i64>()).prop_map(
            |(timestamp, order_id, reason, quantity, price)| AuditEvent::Reject {
                timestamp,
                order_id,
                reason,
                quantity,
                price,
            }
        ),
        (any::<u64>(), any::<i64>(), any::<u32>(), any::<i64>(), any::<u32>()).prop_map(
            |(timestamp, bid_price, bid_quantity, ask_price, ask_quantity)| {
                AuditEvent::BboChange {
                    timestamp,
                    bid_price,
                    bid_quantity,
                    ask_price,
                    ask_quantity,
                }
            }
        ),
    ]
}

proptest! {
    /// Round-trip equality for every event kind.
    #[test]
    fn prop_codec_roundtrip(event in event_strategy()) {
        let mut buf = [0u8; MAX_EVENT_SIZE];
        let written = journal::serialize_event(&mut buf, &event).unwrap();
        prop_assert_eq!(written, journal::event_size(event.event_type()));
        let (decoded, read) = journal::deserialize_event(&buf).unwrap();
        prop_assert_eq!(read, written);
        prop_assert_eq!(decoded, event);
    }

    /// A written journal reads back the exact event sequence.
    #[test]
    fn prop_writer_reader_roundtrip(events in prop::collection::vec(event_strategy(), 0..64)) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roundtrip.mbj");
        let mut writer = JournalWriter::create(&path, 3, 17).unwrap();
        for (i, event) in events.iter().enumerate() {
            writer.write_event(event, i as u64 + 1).unwrap();
        }
        writer.close().unwrap();

        let mut reader = JournalReader::open(&path).unwrap();
        prop_assert_eq!(reader.header().event_count, events.len() as u64);
        let mut read_back = Vec::new();
        reader.read_all(|event| read_back.push(*event)).unwrap();
        prop_assert_eq!(read_back, events);
        reader.verify_footer().unwrap();
    }
}

#[test]
fn test_session_journal_layout() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("layout.mbj");
    let config = SessionConfig {
        instrument_id: 21,
        session_seed: 777,
        ..SessionConfig::default()
    };
    let mut session = Session::create(config, &path).unwrap();
    session.submit_limit(1, Side::Sell, 100, 10, 5).unwrap();
    session.submit_market(2, Side::Buy, 10, 6).unwrap();
    session.close().unwrap();

    let bytes = std::fs::read(&path).unwrap();
    let reader = JournalReader::open(&path).unwrap();
    let header = reader.header();
    assert_eq!(header.instrument_id, 21);
    assert_eq!(header.session_seed, 777);
    assert_eq!(header.start_timestamp, 5);
    assert_eq!(header.end_timestamp, 6);
    assert_eq!(header.file_size, bytes.len() as u64);

    // Events: Add, BboChange, Add, Fill, BboChange (ask emptied).
    assert_eq!(header.event_count, 5);
    let expected_payload =
        2 * journal::event_size(EventType::Add)
        + journal::event_size(EventType::Fill)
        + 2 * journal::event_size(EventType::BboChange);
    assert_eq!(bytes.len(), HEADER_SIZE + expected_payload + FOOTER_SIZE);
}

#[test]
fn test_index_and_seek_through_session_journal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("index.mbj");
    let mut session = Session::create(SessionConfig::default(), &path).unwrap();
    for i in 0..10u64 {
        session
            .submit_limit(i + 1, Side::Buy, 90 - i as i64, 5, i + 1)
            .unwrap();
    }
    session.close().unwrap();

    let mut reader = JournalReader::open(&path).unwrap();
    let index = reader.build_index().unwrap();
    assert_eq!(index.len() as u64, reader.header().event_count);

    // Every descriptor seeks to a decodable record of the declared type.
    for descriptor in &index {
        reader.seek(descriptor.position).unwrap();
        let event = reader.try_read_event().unwrap().unwrap();
        assert_eq!(event.event_type(), descriptor.event_type);
        assert_eq!(event.timestamp(), descriptor.timestamp);
    }
}

#[test]
fn test_read_with_callbacks_over_session_journal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("callbacks.mbj");
    let mut session = Session::create(SessionConfig::default(), &path).unwrap();
    session.submit_limit(1, Side::Sell, 100, 5, 1).unwrap();
    session.submit_limit(2, Side::Buy, 100, 5, 2).unwrap();
    session.cancel(99, 3).unwrap();
    session.close().unwrap();

    let mut adds = Vec::new();
    let mut trades = Vec::new();
    let mut total = 0u32;
    let mut callbacks = JournalCallbacks {
        on_add: Some(Box::new(|event: &AuditEvent| {
            if let AuditEvent::Add { order_id, .. } = event {
                adds.push(*order_id);
            }
        })),
        on_trade: Some(Box::new(|event: &AuditEvent| {
            if let AuditEvent::Fill { quantity, .. } = event {
                trades.push(*quantity);
            }
        })),
        on_any: Some(Box::new(|_| total += 1)),
        ..JournalCallbacks::default()
    };

    let mut reader = JournalReader::open(&path).unwrap();
    let count = reader.read_with_callbacks(&mut callbacks).unwrap();
    drop(callbacks);

    assert_eq!(adds, vec![1, 2]);
    assert_eq!(trades, vec![5]);
    assert_eq!(count, total as u64);
}

#[test]
fn test_corrupted_footer_reported_but_replayable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corrupt.mbj");
    let mut session = Session::create(SessionConfig::default(), &path).unwrap();
    session.submit_limit(1, Side::Sell, 100, 10, 1).unwrap();
    session.submit_market(2, Side::Buy, 4, 2).unwrap();
    let live_snapshot = session.snapshot();
    session.close().unwrap();

    // Corrupt the footer's first-sequence field.
    let mut bytes = std::fs::read(&path).unwrap();
    let offset = bytes.len() - FOOTER_SIZE + 8;
    bytes[offset] ^= 0xFF;
    std::fs::write(&path, &bytes).unwrap();

    let reader = JournalReader::open(&path).unwrap();
    assert!(matches!(
        reader.verify_footer(),
        Err(JournalError::Integrity { .. })
    ));

    // Replay reports the failure and continues in degraded mode.
    let mut replay = ReplaySession::open(&path).unwrap();
    assert!(replay.integrity_degraded());
    replay.replay_all().unwrap();
    assert_eq!(replay.fills().len(), 1);
    assert_eq!(replay.snapshot().best_ask(), live_snapshot.best_ask());
}
