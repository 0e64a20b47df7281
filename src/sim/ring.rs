//! Single-producer / single-consumer ring buffer.
//!
//! Strategies and feeds hand orders to the matching actor through one of
//! these rings. Head and tail live on distinct cache lines so the producer
//! and consumer never false-share, and both operations are wait-free:
//! `try_write` and `try_read` return immediately whether or not they made
//! progress.

use crossbeam::utils::CachePadded;
use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Shared ring storage. Construct via [`SpscRing::with_capacity`], which
/// returns the producer and consumer handles; the storage itself is not
/// used directly.
pub struct SpscRing<T> {
    slots: Box<[UnsafeCell<MaybeUninit<T>>]>,
    mask: usize,
    /// Next slot to read. Owned by the consumer.
    head: CachePadded<AtomicUsize>,
    /// Next slot to write. Owned by the producer.
    tail: CachePadded<AtomicUsize>,
}

// The ring hands each value from exactly one producer thread to exactly
// one consumer thread; slots are never aliased across the head/tail split.
unsafe impl<T: Send> Sync for SpscRing<T> {}
unsafe impl<T: Send> Send for SpscRing<T> {}

impl<T> SpscRing<T> {
    /// Create a ring holding at least `capacity` elements (rounded up to a
    /// power of two) and return its two endpoint handles.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> (RingProducer<T>, RingConsumer<T>) {
        let cap = capacity.max(2).next_power_of_two();
        let slots = (0..cap)
            .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        let ring = Arc::new(Self {
            slots,
            mask: cap - 1,
            head: CachePadded::new(AtomicUsize::new(0)),
            tail: CachePadded::new(AtomicUsize::new(0)),
        });
        (
            RingProducer {
                ring: Arc::clone(&ring),
            },
            RingConsumer { ring },
        )
    }

    #[inline]
    fn capacity(&self) -> usize {
        self.mask + 1
    }
}

impl<T> Drop for SpscRing<T> {
    fn drop(&mut self) {
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Relaxed);
        for pos in head..tail {
            let slot = &self.slots[pos & self.mask];
            unsafe { (*slot.get()).assume_init_drop() };
        }
    }
}

/// Writing endpoint of an [`SpscRing`]. Exactly one per ring.
pub struct RingProducer<T> {
    ring: Arc<SpscRing<T>>,
}

impl<T> RingProducer<T> {
    /// Attempt to enqueue `value` without blocking.
    ///
    /// Returns the value back when the ring is full so the caller can
    /// retry or shed load.
    pub fn try_write(&self, value: T) -> Result<(), T> {
        let ring = &self.ring;
        let tail = ring.tail.load(Ordering::Relaxed);
        let head = ring.head.load(Ordering::Acquire);
        if tail.wrapping_sub(head) == ring.capacity() {
            return Err(value);
        }
        let slot = &ring.slots[tail & ring.mask];
        unsafe { (*slot.get()).write(value) };
        ring.tail.store(tail.wrapping_add(1), Ordering::Release);
        Ok(())
    }

    /// Number of elements currently queued.
    #[must_use]
    pub fn len(&self) -> usize {
        let tail = self.ring.tail.load(Ordering::Relaxed);
        let head = self.ring.head.load(Ordering::Acquire);
        tail.wrapping_sub(head)
    }

    /// Whether the ring holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Reading endpoint of an [`SpscRing`]. Exactly one per ring.
pub struct RingConsumer<T> {
    ring: Arc<SpscRing<T>>,
}

impl<T> RingConsumer<T> {
    /// Attempt to dequeue one value without blocking.
    pub fn try_read(&self) -> Option<T> {
        let ring = &self.ring;
        let head = ring.head.load(Ordering::Relaxed);
        let tail = ring.tail.load(Ordering::Acquire);
        if head == tail {
            return None;
        }
        let slot = &ring.slots[head & ring.mask];
        let value = unsafe { (*slot.get()).assume_init_read() };
        ring.head.store(head.wrapping_add(1), Ordering::Release);
        Some(value)
    }

    /// Number of elements currently queued.
    #[must_use]
    pub fn len(&self) -> usize {
        let tail = self.ring.tail.load(Ordering::Acquire);
        let head = self.ring.head.load(Ordering::Relaxed);
        tail.wrapping_sub(head)
    }

    /// Whether the ring holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
