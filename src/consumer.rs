//! Read-side handle.
//!
//! The consumer owns the occupied region `[head, tail)` (modular). It is
//! the only writer of `head` and keeps a cached copy of the producer's
//! `tail`, refreshed only when the ring appears empty. Slice and region
//! operations refresh the cache unconditionally to drain as much as
//! possible; `pop_each` refreshes like `pop`, only on apparent-empty.
//!
//! Emptiness is absence, not an error: [`pop`](Consumer::pop) yields
//! `None` and every bulk operation reports a count, with zero a valid
//! result. Nothing here blocks.

use std::cell::Cell;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::producer::Producer;
use crate::ring::{Ordering, Shared};
use crate::transfer::move_items;

/// Read-side handle of a split [`RingBuffer`](crate::RingBuffer).
///
/// `Send` but not `Sync`: the handle may move between threads but a
/// `&Consumer` never crosses one. [`access`](Consumer::access) and
/// [`for_each`](Consumer::for_each) hand out `&T` into the buffer from a
/// shared reference, which is only sound while the handle stays on a
/// single thread. All mutating operations take `&mut self`, which
/// enforces the single-reader contract at compile time.
pub struct Consumer<T> {
    pub(crate) shared: Arc<Shared<T>>,
    /// Cached snapshot of the producer's `tail`. Only refreshed when the
    /// ring appears empty, to avoid loading the producer's cache line on
    /// every pop.
    pub(crate) cached_tail: usize,
    /// Suppresses the `Sync` auto impl without affecting `Send`.
    pub(crate) _not_sync: PhantomData<Cell<()>>,
}

impl<T> Consumer<T> {
    /// Returns the maximum number of elements the buffer can hold.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.shared.capacity()
    }

    /// Returns the number of elements currently in the buffer.
    ///
    /// From the consumer's side this is a lower bound the moment it
    /// returns: the producer may add elements concurrently, never remove.
    #[inline]
    pub fn len(&self) -> usize {
        let head = self.shared.head(Ordering::Relaxed);
        let tail = self.shared.tail(Ordering::Acquire);
        self.shared.distance(head, tail)
    }

    /// Returns the number of free slots; an upper bound from this side.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.capacity() - self.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len() == self.capacity()
    }

    /// Removes and returns the oldest element, or `None` when empty.
    ///
    /// # Ordering
    ///
    /// 1. Read own `head` (Relaxed — we are the only writer).
    /// 2. If the ring appears empty against the cached `tail`, reload
    ///    `tail` with Acquire to observe producer progress.
    /// 3. Move the value out of the slot at `head`.
    /// 4. Release-store the advanced `head` to free the slot.
    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        let head = self.shared.head(Ordering::Relaxed);

        if head == self.cached_tail {
            self.cached_tail = self.shared.tail(Ordering::Acquire);
            if head == self.cached_tail {
                return None;
            }
        }

        // SAFETY: The slot at `head` is initialized (occupancy > 0 was just
        // confirmed) and the producer will not reuse it until the Release
        // store below.
        let value = unsafe { self.shared.read_slot(head) };

        self.shared
            .set_head(self.shared.advance(head, 1), Ordering::Release);
        Some(value)
    }

    /// Grants `f` direct access to the occupied region as an ordered pair
    /// of slices in FIFO order (the second is empty unless the region
    /// wraps). `f` returns how many leading elements of the concatenated
    /// pair it consumed; `head` advances by that count.
    ///
    /// Returns the count reported by `f`.
    ///
    /// # Safety
    ///
    /// The first `n` elements of the concatenated pair, where `n` is `f`'s
    /// return value, are treated as moved out: the ring never drops them,
    /// so `f` must take ownership of each (for example via `ptr::read` or a
    /// plain copy for `T: Copy`). `f` must not retain the slices past the
    /// call.
    ///
    /// # Panics
    ///
    /// Panics if `f` reports more elements than it was given.
    pub unsafe fn pop_access<F>(&mut self, f: F) -> usize
    where
        F: FnOnce(&mut [T], &mut [T]) -> usize,
    {
        let head = self.shared.head(Ordering::Relaxed);
        self.cached_tail = self.shared.tail(Ordering::Acquire);
        let len = self.shared.distance(head, self.cached_tail);

        // SAFETY: `len` was computed from an Acquire load of `tail`; the
        // producer will not touch these slots until `head` is published.
        let (a, b) = self.shared.occupied_slices(head, len);
        let total = a.len() + b.len();

        let n = f(a, b);
        assert!(n <= total, "pop_access callback consumed past the occupied region");

        self.shared
            .set_head(self.shared.advance(head, n), Ordering::Release);
        n
    }

    /// Grants `f` a read-only view of the occupied region as an ordered
    /// slice pair, without consuming anything.
    ///
    /// The view is a consistent snapshot: elements the producer publishes
    /// after the internal `tail` load are not included.
    pub fn access<F>(&self, f: F)
    where
        F: FnOnce(&[T], &[T]),
    {
        let head = self.shared.head(Ordering::Relaxed);
        let tail = self.shared.tail(Ordering::Acquire);
        let len = self.shared.distance(head, tail);

        // SAFETY: The occupied region is stable while `&self` is held: only
        // this consumer advances `head`, and advancing requires `&mut self`,
        // so no mutable view can coexist with these shared slices.
        let (a, b) = unsafe { self.shared.occupied_slices_ref(head, len) };
        f(a, b)
    }

    /// Copies up to `dest.len()` elements into `dest` in FIFO order and
    /// removes them. Returns the count copied; zero when empty.
    pub fn pop_slice(&mut self, dest: &mut [T]) -> usize
    where
        T: Copy,
    {
        // SAFETY: T: Copy, so a plain copy takes ownership of the consumed
        // prefix; nothing needs dropping.
        unsafe {
            self.pop_access(|a, b| {
                let n = dest.len().min(a.len() + b.len());
                let first = n.min(a.len());
                dest[..first].copy_from_slice(&a[..first]);
                dest[first..n].copy_from_slice(&b[..n - first]);
                n
            })
        }
    }

    /// Applies `f` to successive elements, removing each as it is handed
    /// over, until `f` returns `false`, the buffer empties, or `max_count`
    /// elements were removed. Returns the count removed.
    ///
    /// An element passed to `f` counts as removed even when `f` stops the
    /// loop: ownership already transferred.
    pub fn pop_each<F>(&mut self, max_count: usize, mut f: F) -> usize
    where
        F: FnMut(T) -> bool,
    {
        let mut popped = 0;
        while popped < max_count {
            match self.pop() {
                Some(value) => {
                    popped += 1;
                    if !f(value) {
                        break;
                    }
                }
                None => break,
            }
        }
        popped
    }

    /// Applies `f` to every occupied element in FIFO order without
    /// removing any.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&T),
    {
        self.access(|a, b| {
            for value in a.iter().chain(b.iter()) {
                f(value);
            }
        });
    }

    /// Applies `f` to every occupied element in FIFO order, allowing
    /// in-place mutation. Occupancy does not change.
    pub fn for_each_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut T),
    {
        let head = self.shared.head(Ordering::Relaxed);
        self.cached_tail = self.shared.tail(Ordering::Acquire);
        let len = self.shared.distance(head, self.cached_tail);

        // SAFETY: Exclusive borrow of the consumer plus the Acquire load
        // above give exclusive access to the occupied region.
        let (a, b) = unsafe { self.shared.occupied_slices(head, len) };
        for value in a.iter_mut().chain(b.iter_mut()) {
            f(value);
        }
    }

    /// Moves up to `count` elements out of this buffer directly into `dst`
    /// without an intermediate copy. Returns the count moved.
    ///
    /// See [`move_items`] for the exact bound.
    pub fn move_to(&mut self, dst: &mut Producer<T>, count: usize) -> usize {
        move_items(self, dst, count)
    }
}

impl Consumer<u8> {
    /// Byte-typed alias of [`pop_slice`](Consumer::pop_slice).
    #[inline]
    pub fn pop_copy(&mut self, dest: &mut [u8]) -> usize {
        self.pop_slice(dest)
    }
}

impl<T> fmt::Debug for Consumer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consumer")
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use crate::RingBuffer;

    #[test]
    fn pop_empty_is_absence() {
        let (_tx, mut rx) = RingBuffer::<u64>::new(4).split();
        assert_eq!(rx.pop(), None);
        assert!(rx.is_empty());
    }

    #[test]
    fn pop_slice_takes_prefix() {
        // State from the fill/reject/refill scenario: buffer holds 2,3,4,5.
        let (mut tx, mut rx) = RingBuffer::new(4).split();
        for v in 1..=4 {
            assert_eq!(tx.push(v), Ok(()));
        }
        assert_eq!(tx.push(5), Err(5));
        assert_eq!(rx.pop(), Some(1));
        assert_eq!(tx.push(5), Ok(()));

        let mut dest = [0i32; 2];
        assert_eq!(rx.pop_slice(&mut dest), 2);
        assert_eq!(dest, [2, 3]);

        let mut rest = Vec::new();
        rx.for_each(|v| rest.push(*v));
        assert_eq!(rest, vec![4, 5]);
    }

    #[test]
    fn pop_slice_reports_partial_when_short() {
        let (mut tx, mut rx) = RingBuffer::new(8).split();
        assert_eq!(tx.push_slice(&[1u8, 2, 3]), 3);

        let mut dest = [0u8; 8];
        assert_eq!(rx.pop_slice(&mut dest), 3);
        assert_eq!(&dest[..3], &[1, 2, 3]);
        assert_eq!(rx.pop_slice(&mut dest), 0);
    }

    #[test]
    fn pop_copy_bytes() {
        let (mut tx, mut rx) = RingBuffer::new(4).split();
        assert_eq!(tx.push_slice(b"abcd"), 4);

        let mut out = [0u8; 2];
        assert_eq!(rx.pop_copy(&mut out), 2);
        assert_eq!(&out, b"ab");
    }

    #[test]
    fn pop_access_consumes_across_wrap() {
        let (mut tx, mut rx) = RingBuffer::new(4).split();
        // Rotate so the occupied region wraps: 5 physical slots, head at 3.
        assert_eq!(tx.push_slice(&[0u8, 0, 0]), 3);
        let mut sink = [0u8; 3];
        assert_eq!(rx.pop_slice(&mut sink), 3);
        assert_eq!(tx.push_slice(&[1u8, 2, 3, 4]), 4);

        let mut seen = Vec::new();
        // SAFETY: u8 is Copy; copying out takes ownership of the consumed
        // prefix.
        let n = unsafe {
            rx.pop_access(|a, b| {
                assert!(!b.is_empty(), "expected a wrapped occupied region");
                seen.extend_from_slice(a);
                seen.extend_from_slice(b);
                a.len() + b.len()
            })
        };
        assert_eq!(n, 4);
        assert_eq!(seen, vec![1, 2, 3, 4]);
        assert!(rx.is_empty());
    }

    #[test]
    fn access_does_not_consume() {
        let (mut tx, rx) = RingBuffer::new(4).split();
        assert_eq!(tx.push_slice(&[7u8, 8]), 2);

        let mut seen = Vec::new();
        rx.access(|a, b| {
            seen.extend_from_slice(a);
            seen.extend_from_slice(b);
        });
        assert_eq!(seen, vec![7, 8]);
        assert_eq!(rx.len(), 2);
    }

    #[test]
    fn pop_each_early_stop_counts_handed_element() {
        let (mut tx, mut rx) = RingBuffer::new(8).split();
        assert_eq!(tx.push_slice(&[1u8, 2, 3, 4, 5]), 5);

        let mut seen = Vec::new();
        let removed = rx.pop_each(10, |v| {
            seen.push(v);
            v != 3
        });
        assert_eq!(removed, 3);
        assert_eq!(seen, vec![1, 2, 3]);
        assert_eq!(rx.len(), 2);
    }

    #[test]
    fn pop_each_respects_max_count() {
        let (mut tx, mut rx) = RingBuffer::new(8).split();
        assert_eq!(tx.push_slice(&[1u8, 2, 3, 4, 5]), 5);
        assert_eq!(rx.pop_each(2, |_| true), 2);
        assert_eq!(rx.len(), 3);
    }

    #[test]
    fn for_each_mut_keeps_occupancy() {
        let (mut tx, mut rx) = RingBuffer::new(4).split();
        assert_eq!(tx.push_slice(&[1u32, 2, 3]), 3);

        rx.for_each_mut(|v| *v *= 10);
        assert_eq!(rx.len(), 3);

        let mut out = [0u32; 3];
        assert_eq!(rx.pop_slice(&mut out), 3);
        assert_eq!(out, [10, 20, 30]);
    }

    #[test]
    fn fifo_across_many_wraparounds() {
        let (mut tx, mut rx) = RingBuffer::new(3).split();
        for round in 0..50u32 {
            let base = round * 3;
            for i in 0..3 {
                assert_eq!(tx.push(base + i), Ok(()));
            }
            for i in 0..3 {
                assert_eq!(rx.pop(), Some(base + i));
            }
            assert_eq!(rx.pop(), None);
        }
    }
}
