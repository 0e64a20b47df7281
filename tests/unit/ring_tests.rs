//! SPSC ring behavior under cross-thread order handoff.

use matchbook::prelude::*;

#[test]
fn test_order_handoff_preserves_fifo() {
    let (tx, rx) = SpscRing::with_capacity(128);

    let producer = std::thread::spawn(move || {
        for id in 1..=1000u64 {
            let mut order = Order::limit(id, 1, Side::Buy, 99, 1);
            loop {
                match tx.try_write(order) {
                    Ok(()) => break,
                    Err(back) => order = back,
                }
            }
        }
    });

    let mut book = OrderBook::new(1);
    let mut received = 0u64;
    let mut ts = 0u64;
    while received < 1000 {
        if let Some(order) = rx.try_read() {
            received += 1;
            ts += 1;
            assert_eq!(order.order_id, received);
            book.submit(order, ts).unwrap();
        }
    }
    producer.join().unwrap();

    assert_eq!(book.open_order_count(), 1000);
    assert_eq!(book.depth(Side::Buy, 1)[0].total_quantity, 1000);
}

#[test]
fn test_try_read_on_empty_ring() {
    let (_tx, rx) = SpscRing::<Order>::with_capacity(8);
    assert!(rx.try_read().is_none());
    assert!(rx.is_empty());
}

#[test]
fn test_backpressure_returns_order() {
    let (tx, rx) = SpscRing::with_capacity(2);
    assert!(tx.try_write(Order::limit(1, 1, Side::Buy, 99, 1)).is_ok());
    assert!(tx.try_write(Order::limit(2, 1, Side::Buy, 99, 1)).is_ok());
    let rejected = tx.try_write(Order::limit(3, 1, Side::Buy, 99, 1));
    let Err(order) = rejected else {
        panic!("expected backpressure");
    };
    assert_eq!(order.order_id, 3);
    assert_eq!(rx.len(), 2);
}
