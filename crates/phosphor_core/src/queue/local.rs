//! # Local Queue
//!
//! Single-thread FIFO with a recycled-node cache.
//!
//! Dequeuing does not free the node that held the value; the slot goes onto
//! an internal free list and is reused by the next enqueue. In steady state a
//! frame's command list therefore allocates nothing at all: the slots reach
//! the high-water mark of commands-per-frame and stay there.
//!
//! # Thread Safety
//!
//! This queue is NOT thread-safe. It is exclusively owned by whichever
//! thread currently owns the enclosing frame. For the cross-thread queue,
//! see [`crate::queue::spsc`].

/// One slot of backing storage.
///
/// `next` chains slots into either the live FIFO or the free list.
struct Slot<T> {
    value: Option<T>,
    next: Option<usize>,
}

/// A single-thread FIFO that recycles its nodes.
///
/// # Example
///
/// ```
/// use phosphor_core::LocalQueue;
///
/// let mut q = LocalQueue::new();
/// q.enqueue("a");
/// q.enqueue("b");
/// assert_eq!(q.dequeue(), Some("a"));
/// assert_eq!(q.dequeue(), Some("b"));
/// assert_eq!(q.dequeue(), None);
/// // The two slots are now cached; the next two enqueues allocate nothing.
/// assert_eq!(q.cached(), 2);
/// ```
pub struct LocalQueue<T> {
    /// Slot storage. Grows only when the free list is empty.
    slots: Vec<Slot<T>>,
    /// Index of the oldest live slot.
    head: Option<usize>,
    /// Index of the newest live slot.
    tail: Option<usize>,
    /// Head of the free list of recycled slots.
    free: Option<usize>,
    /// Number of live values.
    len: usize,
}

impl<T> LocalQueue<T> {
    /// Creates an empty queue with no backing storage.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            head: None,
            tail: None,
            free: None,
            len: 0,
        }
    }

    /// Creates an empty queue with `capacity` slots pre-allocated and cached.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let mut queue = Self::new();
        queue.slots.reserve_exact(capacity);
        for _ in 0..capacity {
            let index = queue.slots.len();
            queue.slots.push(Slot {
                value: None,
                next: queue.free,
            });
            queue.free = Some(index);
        }
        queue
    }

    /// Returns the number of values currently queued.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no values are queued.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of recycled slots waiting for reuse.
    #[must_use]
    pub fn cached(&self) -> usize {
        let mut count = 0;
        let mut cursor = self.free;
        while let Some(index) = cursor {
            count += 1;
            cursor = self.slots[index].next;
        }
        count
    }

    /// Appends `value` at the back of the queue.
    ///
    /// Reuses a cached slot when one is available; otherwise grows the
    /// backing storage by one slot.
    pub fn enqueue(&mut self, value: T) {
        let index = match self.free {
            Some(index) => {
                self.free = self.slots[index].next;
                self.slots[index].value = Some(value);
                self.slots[index].next = None;
                index
            }
            None => {
                let index = self.slots.len();
                self.slots.push(Slot {
                    value: Some(value),
                    next: None,
                });
                index
            }
        };

        match self.tail {
            Some(tail) => self.slots[tail].next = Some(index),
            None => self.head = Some(index),
        }
        self.tail = Some(index);
        self.len += 1;
    }

    /// Removes and returns the value at the front of the queue, or `None`
    /// when the queue is empty. The vacated slot is cached, not freed.
    pub fn dequeue(&mut self) -> Option<T> {
        let index = self.head?;
        let value = self.slots[index]
            .value
            .take()
            .unwrap_or_else(|| unreachable!("live slot without a value"));

        self.head = self.slots[index].next;
        if self.head.is_none() {
            self.tail = None;
        }

        self.slots[index].next = self.free;
        self.free = Some(index);
        self.len -= 1;

        Some(value)
    }
}

impl<T> Default for LocalQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for LocalQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalQueue")
            .field("len", &self.len)
            .field("slots", &self.slots.len())
            .finish()
    }
}
