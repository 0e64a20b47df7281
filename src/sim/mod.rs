//! Deterministic session infrastructure: the seeded PRNG, the virtual
//! clock, the SPSC ring used between producers and the matching actor,
//! and the cooperative cancellation token.

mod cancel;
mod clock;
mod ring;
mod rng;

pub use cancel::CancelToken;
pub use clock::VirtualClock;
pub use ring::{RingConsumer, RingProducer, SpscRing};
pub use rng::SessionRng;
