//! Write-side handle.
//!
//! The producer owns the vacant region `[tail, head)` (modular). It is the
//! only writer of `tail` and keeps a cached copy of the consumer's `head`,
//! refreshed only when the ring appears full, so the single-element hot path
//! usually touches just its own cache line. Slice and region operations
//! refresh the cache unconditionally to expose as much free space as
//! possible; `push_each` and `push_iter` refresh like `push`, only on
//! apparent-full.
//!
//! Fullness is not a fatal condition: [`push`](Producer::push) hands the
//! rejected value back, and every bulk operation reports how many elements
//! were actually written. Nothing here blocks.

use std::cell::Cell;
use std::fmt;
use std::marker::PhantomData;
use std::mem::MaybeUninit;
use std::sync::Arc;

use crate::consumer::Consumer;
use crate::ring::{copy_to_uninit, Ordering, Shared};
use crate::transfer::move_items;

/// Write-side handle of a split [`RingBuffer`](crate::RingBuffer).
///
/// `Send` but not `Sync`: the handle may move between threads but a
/// `&Producer` never crosses one. All mutating operations take
/// `&mut self`, which enforces the single-writer contract at compile
/// time.
pub struct Producer<T> {
    pub(crate) shared: Arc<Shared<T>>,
    /// Cached snapshot of the consumer's `head`. Only refreshed when the
    /// ring appears full, to avoid loading the consumer's cache line on
    /// every push.
    pub(crate) cached_head: usize,
    /// Suppresses the `Sync` auto impl without affecting `Send`.
    pub(crate) _not_sync: PhantomData<Cell<()>>,
}

impl<T> Producer<T> {
    /// Returns the maximum number of elements the buffer can hold.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.shared.capacity()
    }

    /// Returns the number of elements currently in the buffer.
    ///
    /// From the producer's side this is an upper bound the moment it
    /// returns: the consumer may remove elements concurrently, never add.
    #[inline]
    pub fn len(&self) -> usize {
        let head = self.shared.head(Ordering::Acquire);
        let tail = self.shared.tail(Ordering::Relaxed);
        self.shared.distance(head, tail)
    }

    /// Returns the number of free slots; a lower bound from this side.
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
        self.remaining() == 0
    }

    /// Appends `value`, or returns it back if the buffer is full.
    ///
    /// The rejected value is returned unchanged so nothing is dropped
    /// implicitly.
    ///
    /// # Ordering
    ///
    /// 1. Read own `tail` (Relaxed — we are the only writer).
    /// 2. If the ring appears full against the cached `head`, reload `head`
    ///    with Acquire to observe consumer progress.
    /// 3. Write the value into the slot at `tail`.
    /// 4. Release-store the advanced `tail` to publish the slot.
    #[inline]
    pub fn push(&mut self, value: T) -> Result<(), T> {
        let tail = self.shared.tail(Ordering::Relaxed);

        if self.shared.distance(self.cached_head, tail) == self.capacity() {
            self.cached_head = self.shared.head(Ordering::Acquire);
            if self.shared.distance(self.cached_head, tail) == self.capacity() {
                return Err(value);
            }
        }

        // SAFETY: The slot at `tail` is vacant (occupancy < capacity was
        // just confirmed) and the consumer will not read it until the
        // Release store below.
        unsafe { self.shared.write_slot(tail, value) };

        self.shared
            .set_tail(self.shared.advance(tail, 1), Ordering::Release);
        Ok(())
    }

    /// Grants `f` direct write access to the vacant region as an ordered
    /// pair of uninitialized slices (the second is empty unless the region
    /// wraps). `f` returns how many leading slots of the concatenated pair
    /// it initialized; `tail` advances by that count.
    ///
    /// Returns the count reported by `f`.
    ///
    /// # Safety
    ///
    /// `f` must initialize the first `n` slots of the concatenated pair,
    /// where `n` is its return value, and must not read the slices or
    /// retain them past the call.
    ///
    /// # Panics
    ///
    /// Panics if `f` reports more slots than it was given.
    pub unsafe fn push_access<F>(&mut self, f: F) -> usize
    where
        F: FnOnce(&mut [MaybeUninit<T>], &mut [MaybeUninit<T>]) -> usize,
    {
        self.cached_head = self.shared.head(Ordering::Acquire);
        let tail = self.shared.tail(Ordering::Relaxed);
        let vacant = self.capacity() - self.shared.distance(self.cached_head, tail);

        // SAFETY: `vacant` was computed from an Acquire load of `head`; the
        // consumer will not touch these slots until `tail` is published.
        let (a, b) = self.shared.vacant_slices(tail, vacant);
        let total = a.len() + b.len();

        let n = f(a, b);
        assert!(n <= total, "push_access callback wrote past the vacant region");

        self.shared
            .set_tail(self.shared.advance(tail, n), Ordering::Release);
        n
    }

    /// Copies as many leading elements of `elems` as fit, returning the
    /// count. Zero is a valid result when the buffer is full.
    pub fn push_slice(&mut self, elems: &[T]) -> usize
    where
        T: Copy,
    {
        // SAFETY: The callback initializes exactly the first `n` slots of
        // the pair and reads neither slice.
        unsafe {
            self.push_access(|a, b| {
                let n = elems.len().min(a.len() + b.len());
                let first = n.min(a.len());
                copy_to_uninit(&elems[..first], &mut a[..first]);
                copy_to_uninit(&elems[first..n], &mut b[..n - first]);
                n
            })
        }
    }

    /// Pulls values from `f` one at a time until `f` returns `None`, the
    /// buffer fills up, or `max_count` values were written. Returns the
    /// count written.
    ///
    /// `f` is only invoked when a slot is available, so a value is never
    /// pulled and then lost. Each value is published as it is written.
    pub fn push_each<F>(&mut self, max_count: usize, mut f: F) -> usize
    where
        F: FnMut() -> Option<T>,
    {
        let mut pushed = 0;
        while pushed < max_count {
            let tail = self.shared.tail(Ordering::Relaxed);

            if self.shared.distance(self.cached_head, tail) == self.capacity() {
                self.cached_head = self.shared.head(Ordering::Acquire);
                if self.shared.distance(self.cached_head, tail) == self.capacity() {
                    break;
                }
            }

            let value = match f() {
                Some(value) => value,
                None => break,
            };

            // SAFETY: Free space was confirmed above; the consumer cannot
            // read the slot before the Release store.
            unsafe { self.shared.write_slot(tail, value) };
            self.shared
                .set_tail(self.shared.advance(tail, 1), Ordering::Release);
            pushed += 1;
        }
        pushed
    }

    /// Appends values from `iter` until it is exhausted or the buffer
    /// fills up. Returns the count appended.
    ///
    /// Space is checked before each `next()` call, so the iterator is never
    /// advanced past what fit: a partially-consumed iterator stays resumable
    /// by the caller. Safe with infinite iterators.
    pub fn push_iter<I>(&mut self, iter: &mut I) -> usize
    where
        I: Iterator<Item = T>,
    {
        self.push_each(usize::MAX, || iter.next())
    }

    /// Moves up to `count` elements out of `src` directly into this buffer
    /// without an intermediate copy. Returns the count moved.
    ///
    /// See [`move_items`] for the exact bound.
    pub fn move_from(&mut self, src: &mut Consumer<T>, count: usize) -> usize {
        move_items(src, self, count)
    }
}

impl<T> fmt::Debug for Producer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Producer")
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
