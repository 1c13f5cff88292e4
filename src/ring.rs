//! Shared storage and split protocol for the SPSC ring.
//!
//! # Design
//!
//! One fixed backing array of `capacity + 1` slots is shared between exactly
//! one [`Producer`](crate::Producer) and one [`Consumer`](crate::Consumer).
//! The extra slot is a sentinel that is never filled: with it, the two
//! indices alone distinguish full from empty, so no shared length field is
//! needed. The indices are kept reduced modulo the slot count; the modular
//! distance from `head` to `tail` is the number of live elements and is
//! always in `[0, capacity]`.
//!
//! - **Wait-free**: every operation is a bounded sequence of memory
//!   operations plus at most one atomic load and one atomic store. No CAS.
//! - **Cache-line padded**: `head` and `tail` live on separate cache lines
//!   to prevent false sharing between the two threads.
//! - **Two-region access**: any contiguous view of the occupied or vacant
//!   region is expressed as an ordered pair of slices; the second slice is
//!   empty unless the region wraps past the physical end of the array.
//!
//! # Ordering rationale
//!
//! ```text
//! Producer writes slot, then Release-stores tail  →  consumer Acquire-loads tail, then reads slot
//! Consumer reads slot, then Release-stores head   →  producer Acquire-loads head, then writes slot
//! ```
//!
//! This establishes happens-before between slot write and slot read in both
//! directions. Each handle loads its own index Relaxed (it is the only
//! writer of that index).
//!
//! # Invariants
//!
//! - `head < slots.len()` and `tail < slots.len()` at all times.
//! - Slots in the logical range `[head, tail)` (modular) are initialized;
//!   all other slots are uninitialized.
//! - Only the consumer writes `head`; only the producer writes `tail`.
//!
//! # Safety
//!
//! Uses `unsafe` for `MaybeUninit` slot access and raw slice construction.
//! Invariants are documented per operation. Run under Miri and loom to
//! validate.

#[cfg(not(loom))]
pub(crate) use std::sync::atomic::{AtomicUsize, Ordering};

#[cfg(loom)]
pub(crate) use loom::sync::atomic::{AtomicUsize, Ordering};

use std::cell::UnsafeCell;
use std::fmt;
use std::marker::PhantomData;
use std::mem::MaybeUninit;
use std::ops::Range;
use std::ptr;
use std::slice;
use std::sync::Arc;

use crossbeam_utils::CachePadded;

use crate::consumer::Consumer;
use crate::producer::Producer;

/// Splits a logical region of `len` slots starting at physical index
/// `start` into up to two contiguous index ranges.
///
/// The first range runs from `start` to at most the physical end of the
/// array; the second (empty unless the region wraps) starts at index 0.
/// Concatenated in order, the ranges cover the region in logical order.
pub(crate) fn wrap_ranges(start: usize, len: usize, modulus: usize) -> [Range<usize>; 2] {
    debug_assert!(start < modulus, "start index out of bounds");
    debug_assert!(len < modulus, "region longer than the ring");

    let first = len.min(modulus - start);
    [start..start + first, 0..len - first]
}

/// Copies `src` into an uninitialized destination of the same length.
pub(crate) fn copy_to_uninit<T: Copy>(src: &[T], dst: &mut [MaybeUninit<T>]) {
    debug_assert_eq!(src.len(), dst.len());
    // SAFETY: Lengths are equal and the regions cannot overlap (`dst` is
    // exclusively borrowed ring storage, `src` is caller memory).
    unsafe { ptr::copy_nonoverlapping(src.as_ptr(), dst.as_mut_ptr() as *mut T, src.len()) };
}

// ============================================================================
// Shared Ring Storage
// ============================================================================

/// Storage shared by one producer and one consumer.
///
/// # Invariants
///
/// - `slots.len() == capacity + 1`; the slot just before `head` (modular) is
///   the sentinel and is never written while the ring is full.
/// - `head` and `tail` are always `< slots.len()`.
/// - Slots in the modular range `[head, tail)` are initialized.
pub(crate) struct Shared<T> {
    /// Slot storage. Each slot sits in its own `UnsafeCell` because the
    /// producer writes and the consumer reads different slots concurrently;
    /// the index protocol keeps the accessed slots disjoint.
    slots: Box<[UnsafeCell<MaybeUninit<T>>]>,

    /// Consumer's read index. Only the consumer advances this (Release
    /// store); the producer reads it (Acquire load) to bound free space.
    head: CachePadded<AtomicUsize>,

    /// Producer's write index. Only the producer advances this (Release
    /// store); the consumer reads it (Acquire load) to bound available data.
    tail: CachePadded<AtomicUsize>,
}

// SAFETY: The SPSC protocol ensures producer and consumer access disjoint
// slots; the atomic indices enforce the access discipline.
unsafe impl<T: Send> Sync for Shared<T> {}
unsafe impl<T: Send> Send for Shared<T> {}

impl<T> Shared<T> {
    pub(crate) fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring capacity must be > 0");

        let slots = (0..capacity + 1)
            .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
            .collect();

        Self {
            slots,
            head: CachePadded::new(AtomicUsize::new(0)),
            tail: CachePadded::new(AtomicUsize::new(0)),
        }
    }

    /// Physical slot count (`capacity + 1`).
    #[inline]
    pub(crate) fn modulus(&self) -> usize {
        self.slots.len()
    }

    /// Usable slot count, excluding the sentinel.
    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len() - 1
    }

    #[inline]
    pub(crate) fn head(&self, order: Ordering) -> usize {
        self.head.load(order)
    }

    #[inline]
    pub(crate) fn tail(&self, order: Ordering) -> usize {
        self.tail.load(order)
    }

    #[inline]
    pub(crate) fn set_head(&self, value: usize, order: Ordering) {
        debug_assert!(value < self.modulus());
        self.head.store(value, order);
    }

    #[inline]
    pub(crate) fn set_tail(&self, value: usize, order: Ordering) {
        debug_assert!(value < self.modulus());
        self.tail.store(value, order);
    }

    /// Modular distance from `from` to `to`: the number of slots a cursor at
    /// `from` must advance to reach `to`. Exact across any number of
    /// wraparounds because both indices stay reduced.
    #[inline]
    pub(crate) fn distance(&self, from: usize, to: usize) -> usize {
        debug_assert!(from < self.modulus() && to < self.modulus());
        (to + self.modulus() - from) % self.modulus()
    }

    /// Advances an index by `n` slots, wrapping at the physical end.
    #[inline]
    pub(crate) fn advance(&self, index: usize, n: usize) -> usize {
        debug_assert!(index < self.modulus() && n < self.modulus());
        (index + n) % self.modulus()
    }

    #[inline]
    fn base(&self) -> *mut MaybeUninit<T> {
        // UnsafeCell<MaybeUninit<T>> is repr(transparent) over MaybeUninit<T>.
        self.slots.as_ptr() as *mut MaybeUninit<T>
    }

    /// Writes `value` into the slot at `index`.
    ///
    /// # Safety
    ///
    /// The slot must be outside the occupied region and not concurrently
    /// accessed: the caller is the producer and has verified free space.
    #[inline]
    pub(crate) unsafe fn write_slot(&self, index: usize, value: T) {
        (*self.slots[index].get()).write(value);
    }

    /// Moves the value out of the slot at `index`.
    ///
    /// # Safety
    ///
    /// The slot must be inside the occupied region: the caller is the
    /// consumer and has verified the slot is initialized. The slot is
    /// logically uninitialized afterwards.
    #[inline]
    pub(crate) unsafe fn read_slot(&self, index: usize) -> T {
        (*self.slots[index].get()).assume_init_read()
    }

    /// Returns the occupied region `[head, head + len)` as an ordered slice
    /// pair.
    ///
    /// # Safety
    ///
    /// Caller must be the consumer side, `len` must not exceed the current
    /// occupancy observed via an Acquire load of `tail`, and the slices must
    /// not outlive that exclusive access.
    #[inline]
    pub(crate) unsafe fn occupied_slices(&self, head: usize, len: usize) -> (&mut [T], &mut [T]) {
        let [a, b] = wrap_ranges(head, len, self.modulus());
        let base = self.base() as *mut T;
        // SAFETY (caller + above): both ranges lie in `[head, tail)`, whose
        // slots are initialized, and the producer does not touch them.
        (
            slice::from_raw_parts_mut(base.add(a.start), a.len()),
            slice::from_raw_parts_mut(base, b.len()),
        )
    }

    /// Shared-reference variant of [`occupied_slices`](Shared::occupied_slices)
    /// for read-only views.
    ///
    /// # Safety
    ///
    /// Same bounds as `occupied_slices`; additionally no `&mut` view of the
    /// region may exist while the returned slices live.
    #[inline]
    pub(crate) unsafe fn occupied_slices_ref(&self, head: usize, len: usize) -> (&[T], &[T]) {
        let [a, b] = wrap_ranges(head, len, self.modulus());
        let base = self.base() as *const T;
        // SAFETY (caller + above): both ranges lie in `[head, tail)`, whose
        // slots are initialized, and the producer does not touch them.
        (
            slice::from_raw_parts(base.add(a.start), a.len()),
            slice::from_raw_parts(base, b.len()),
        )
    }

    /// Returns the vacant region `[tail, tail + len)` as an ordered pair of
    /// uninitialized slice views. The sentinel slot is never included
    /// because `len` is bounded by `capacity - occupancy`.
    ///
    /// # Safety
    ///
    /// Caller must be the producer side, `len` must not exceed the free
    /// space observed via an Acquire load of `head`, and the slices must not
    /// outlive that exclusive access.
    #[inline]
    pub(crate) unsafe fn vacant_slices(
        &self,
        tail: usize,
        len: usize,
    ) -> (&mut [MaybeUninit<T>], &mut [MaybeUninit<T>]) {
        let [a, b] = wrap_ranges(tail, len, self.modulus());
        let base = self.base();
        // SAFETY (caller + above): both ranges lie outside `[head, tail)`
        // and the consumer does not touch them.
        (
            slice::from_raw_parts_mut(base.add(a.start), a.len()),
            slice::from_raw_parts_mut(base, b.len()),
        )
    }
}

impl<T> Drop for Shared<T> {
    fn drop(&mut self) {
        // Drop any elements still in the ring. Runs once both handles are
        // gone, so plain loads are sufficient.
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Relaxed);
        let len = self.distance(head, tail);

        let [a, b] = wrap_ranges(head, len, self.modulus());
        for index in a.chain(b) {
            // SAFETY: Slots in the modular range [head, tail) are initialized.
            unsafe { self.slots[index].get_mut().assume_init_drop() };
        }
    }
}

// ============================================================================
// RingBuffer (un-split buffer)
// ============================================================================

/// A fixed-capacity SPSC ring buffer, not yet split into its two handles.
///
/// [`split`](RingBuffer::split) consumes the buffer and yields exactly one
/// [`Producer`] and one [`Consumer`]; constructing a second handle of either
/// kind for the same storage is impossible by ownership, not by runtime
/// checks.
///
/// # Example
///
/// ```
/// use spsc_ring::RingBuffer;
///
/// let (mut tx, mut rx) = RingBuffer::<u32>::new(4).split();
/// tx.push(7).unwrap();
/// assert_eq!(rx.pop(), Some(7));
/// assert_eq!(rx.pop(), None);
/// ```
pub struct RingBuffer<T> {
    shared: Shared<T>,
}

impl<T> RingBuffer<T> {
    /// Creates a buffer that can hold up to `capacity` elements.
    ///
    /// Allocates `capacity + 1` slots up front; no further allocation
    /// happens on any operation.
    ///
    /// # Panics
    ///
    /// Panics if `capacity == 0`.
    pub fn new(capacity: usize) -> Self {
        Self {
            shared: Shared::new(capacity),
        }
    }

    /// Returns the maximum number of elements the buffer can hold.
    pub fn capacity(&self) -> usize {
        self.shared.capacity()
    }

    /// Splits the buffer into its write-side and read-side handles.
    ///
    /// The handles may be moved to different threads; the storage is freed
    /// when the last of the two is dropped, after dropping any elements
    /// still inside.
    pub fn split(self) -> (Producer<T>, Consumer<T>) {
        let shared = Arc::new(self.shared);
        (
            Producer {
                shared: Arc::clone(&shared),
                cached_head: 0,
                _not_sync: PhantomData,
            },
            Consumer {
                shared,
                cached_tail: 0,
                _not_sync: PhantomData,
            },
        )
    }
}

impl<T> fmt::Debug for RingBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let head = self.shared.head(Ordering::Relaxed);
        let tail = self.shared.tail(Ordering::Relaxed);
        f.debug_struct("RingBuffer")
            .field("capacity", &self.capacity())
            .field("len", &self.shared.distance(head, tail))
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================


// ============================================================================
// Loom Tests
// ============================================================================
