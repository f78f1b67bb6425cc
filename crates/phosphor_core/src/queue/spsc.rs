//! # SPSC Concurrent Queue
//!
//! Lock-free handoff queue for exactly one producer thread and one consumer
//! thread.
//!
//! ## Safety Note
//!
//! This is the only module in the workspace that requires unsafe code. All
//! unsafe blocks are reviewed and documented; nothing unsafe escapes the
//! [`Producer`]/[`Consumer`] API.
//!
//! ## Algorithm
//!
//! A singly linked list with a permanent sentinel node:
//!
//! ```text
//!   head (consumer-owned)                 tail (producer-owned)
//!        │                                      │
//!        ▼                                      ▼
//!   [sentinel] ──next──> [value] ──next──> [value] ──next──> null
//! ```
//!
//! `push` allocates a fully initialized node, then release-stores it into the
//! current tail's `next` link. That single store is the publication point:
//! the consumer acquire-loads `next` and can therefore never observe a
//! half-built node. `pop` advances `head`, takes the value out of the new
//! head, and frees the *old* head, which makes the advanced-to node the new
//! sentinel. A node is thus written by the producer, read by the consumer,
//! and freed by the consumer - ownership crosses the thread boundary exactly
//! once, with no shared mutation window.
//!
//! ## Role Enforcement
//!
//! The C-style version of this structure latches the first caller's thread id
//! in debug builds and asserts on every later call. Here the two roles are
//! separate non-`Clone` handle types instead, so handing the producer end to
//! two threads is a compile error rather than a debug assertion.

#![allow(unsafe_code)]

use std::cell::UnsafeCell;
use std::marker::PhantomData;
use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};
use std::sync::Arc;

/// One queue node. `next` is the only field both threads touch, and only
/// through the acquire/release pair described in the module docs.
struct Node<T> {
    /// `None` only in the sentinel position.
    value: Option<T>,
    next: AtomicPtr<Node<T>>,
}

impl<T> Node<T> {
    fn boxed(value: Option<T>) -> *mut Self {
        Box::into_raw(Box::new(Self {
            value,
            next: AtomicPtr::new(ptr::null_mut()),
        }))
    }
}

/// State shared by the two handles. The head/tail cursors live in
/// `UnsafeCell`s because each is mutated by exactly one side: `head` only by
/// the consumer, `tail` only by the producer.
struct Shared<T> {
    head: UnsafeCell<*mut Node<T>>,
    tail: UnsafeCell<*mut Node<T>>,
}

// SAFETY: `Shared` is only reachable through `Producer` and `Consumer`, which
// partition its fields: the producer touches `tail` and node `next` links,
// the consumer touches `head`, node values, and node deallocation. The
// acquire/release ordering on `next` is the happens-before edge for the node
// contents. `T: Send` because values move between the two threads.
unsafe impl<T: Send> Send for Shared<T> {}
// SAFETY: see above; there is no `&Shared`-based access that races, because
// each field has a single writer and the only cross-thread reads go through
// the atomics.
unsafe impl<T: Send> Sync for Shared<T> {}

impl<T> Drop for Shared<T> {
    fn drop(&mut self) {
        // Runs only after both handles are gone, so this thread has exclusive
        // access. Free the whole chain, sentinel included; dropping each
        // node's `value` runs the element destructors exactly once.
        let mut cursor = *self.head.get_mut();
        while !cursor.is_null() {
            // SAFETY: every pointer in the chain came from `Box::into_raw`
            // and is freed exactly here, exactly once.
            let node = unsafe { Box::from_raw(cursor) };
            cursor = node.next.load(Ordering::Relaxed);
        }
    }
}

/// The producer half. Not `Clone`: there is exactly one producer.
pub struct Producer<T> {
    shared: Arc<Shared<T>>,
    /// Producer handles may move between threads but must never be shared.
    _not_sync: PhantomData<*mut ()>,
}

// SAFETY: the producer only mutates `tail` and publishes nodes through the
// release store on `next`; it may live on any one thread at a time.
unsafe impl<T: Send> Send for Producer<T> {}

/// The consumer half. Not `Clone`: there is exactly one consumer.
pub struct Consumer<T> {
    shared: Arc<Shared<T>>,
    /// Consumer handles may move between threads but must never be shared.
    _not_sync: PhantomData<*mut ()>,
}

// SAFETY: the consumer only mutates `head` and frees nodes it has already
// acquire-observed; it may live on any one thread at a time.
unsafe impl<T: Send> Send for Consumer<T> {}

/// Creates an empty queue and returns its two ends.
///
/// # Example
///
/// ```
/// let (mut tx, mut rx) = phosphor_core::spsc::channel();
/// tx.push(41);
/// tx.push(42);
/// assert_eq!(rx.pop(), Some(41));
/// assert_eq!(rx.pop(), Some(42));
/// assert_eq!(rx.pop(), None);
/// ```
#[must_use]
pub fn channel<T: Send>() -> (Producer<T>, Consumer<T>) {
    let sentinel = Node::boxed(None);
    let shared = Arc::new(Shared {
        head: UnsafeCell::new(sentinel),
        tail: UnsafeCell::new(sentinel),
    });
    (
        Producer {
            shared: Arc::clone(&shared),
            _not_sync: PhantomData,
        },
        Consumer {
            shared,
            _not_sync: PhantomData,
        },
    )
}

impl<T: Send> Producer<T> {
    /// Appends `value` at the back of the queue.
    ///
    /// Never blocks and never fails; the consumer observes values in push
    /// order. If the consumer has already gone away the value is parked in
    /// the queue and dropped when this handle drops.
    pub fn push(&mut self, value: T) {
        let node = Node::boxed(Some(value));

        // SAFETY: `tail` is only ever read or written by the producer, and
        // there is exactly one producer (`self`, borrowed mutably).
        let tail = unsafe { &mut *self.shared.tail.get() };

        // Publication point: the release store pairs with the consumer's
        // acquire load, making the node's value visible before the link.
        // SAFETY: `*tail` is a live node; the producer is the only writer of
        // any node's `next` link, and the consumer never frees the tail node
        // before observing a non-null `next` (at which point the producer has
        // already moved on).
        unsafe { (**tail).next.store(node, Ordering::Release) };
        *tail = node;
    }
}

impl<T: Send> Consumer<T> {
    /// Removes and returns the value at the front of the queue, or `None`
    /// when the queue is currently empty. Never blocks.
    pub fn pop(&mut self) -> Option<T> {
        // SAFETY: `head` is only ever read or written by the consumer, and
        // there is exactly one consumer (`self`, borrowed mutably).
        let head = unsafe { &mut *self.shared.head.get() };

        // SAFETY: `*head` is the live sentinel, freed only by this function
        // after it has been replaced.
        let next = unsafe { (**head).next.load(Ordering::Acquire) };
        if next.is_null() {
            return None;
        }

        // SAFETY: the acquire load above synchronized with the producer's
        // release store, so `next` points at a fully initialized node the
        // producer will never touch again (it only appends past the tail).
        let value = unsafe { (*next).value.take() };
        debug_assert!(value.is_some(), "non-sentinel node without a value");

        let old_head = *head;
        *head = next;
        // SAFETY: `old_head` was the sentinel; nothing else references it.
        // The advanced-to node becomes the new sentinel (its value is now
        // `None`), never the node we just linked past.
        drop(unsafe { Box::from_raw(old_head) });

        value
    }
}

impl<T> std::fmt::Debug for Producer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("spsc::Producer").finish_non_exhaustive()
    }
}

impl<T> std::fmt::Debug for Consumer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("spsc::Consumer").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::thread;

    #[test]
    fn test_fifo_order_single_thread() {
        let (mut tx, mut rx) = channel();
        for i in 0..64 {
            tx.push(i);
        }
        for i in 0..64 {
            assert_eq!(rx.pop(), Some(i));
        }
        assert_eq!(rx.pop(), None);
    }

    #[test]
    fn test_pop_on_empty_is_none_and_recovers() {
        let (mut tx, mut rx) = channel();
        assert_eq!(rx.pop(), None);
        tx.push("x");
        assert_eq!(rx.pop(), Some("x"));
        assert_eq!(rx.pop(), None);
    }

    #[test]
    fn test_fifo_order_across_threads() {
        const COUNT: u64 = 100_000;
        let (mut tx, mut rx) = channel();

        let producer = thread::spawn(move || {
            for i in 0..COUNT {
                tx.push(i);
            }
        });

        let mut expected = 0;
        while expected < COUNT {
            if let Some(value) = rx.pop() {
                assert_eq!(value, expected);
                expected += 1;
            } else {
                thread::yield_now();
            }
        }
        assert_eq!(rx.pop(), None);
        producer.join().expect("producer thread panicked");
    }

    #[test]
    fn test_drop_with_unconsumed_elements_frees_each_exactly_once() {
        static DROPS: AtomicUsize = AtomicUsize::new(0);

        struct Counted;
        impl Drop for Counted {
            fn drop(&mut self) {
                DROPS.fetch_add(1, Ordering::Relaxed);
            }
        }

        {
            let (mut tx, mut rx) = channel();
            for _ in 0..10 {
                tx.push(Counted);
            }
            drop(rx.pop()); // consume one normally
        }
        assert_eq!(DROPS.load(Ordering::Relaxed), 10);
    }

    #[test]
    fn test_producer_outliving_consumer_leaks_nothing() {
        static DROPS: AtomicUsize = AtomicUsize::new(0);

        struct Counted;
        impl Drop for Counted {
            fn drop(&mut self) {
                DROPS.fetch_add(1, Ordering::Relaxed);
            }
        }

        let (mut tx, rx) = channel();
        tx.push(Counted);
        drop(rx);
        // The consumer is gone; pushes still park in the queue.
        tx.push(Counted);
        drop(tx);
        assert_eq!(DROPS.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_values_are_fully_visible_after_pop() {
        // Each value carries a payload whose content must be visible on the
        // consumer thread. A missing happens-before edge shows up here under
        // a race detector (and on weakly ordered hardware).
        const COUNT: usize = 10_000;
        let (mut tx, mut rx) = channel();

        let producer = thread::spawn(move || {
            for i in 0..COUNT {
                tx.push(vec![i; 8]);
            }
        });

        let mut seen = 0;
        while seen < COUNT {
            if let Some(payload) = rx.pop() {
                assert_eq!(payload, vec![seen; 8]);
                seen += 1;
            } else {
                thread::yield_now();
            }
        }
        producer.join().expect("producer thread panicked");
    }
}
