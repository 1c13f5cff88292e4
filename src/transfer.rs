//! Zero-copy transfer between two buffers.
//!
//! Moving elements from one ring's consumer side into another ring's
//! producer side through `pop_slice` + `push_slice` would materialize every
//! element in caller memory. [`move_items`] instead copies directly from
//! the source storage into the destination storage, honoring both sides'
//! two-region wraparound structure: the source occupied pair and the
//! destination vacant pair are walked pairwise, which takes at most three
//! contiguous raw copies.

use std::ptr;

use crate::consumer::Consumer;
use crate::producer::Producer;
use crate::ring::Ordering;

/// Moves up to `count` elements from `src` into `dst` without an
/// intermediate copy. Returns the number moved, which is exactly
/// `min(count, src.len(), dst.remaining())` at the time of the call.
///
/// The moved prefix is the same prefix repeated [`pop`](Consumer::pop)
/// calls would have yielded. The two handles may belong to different
/// buffers or to the same one; element ownership transfers from the source
/// ring to the destination ring, so nothing is dropped or duplicated.
pub fn move_items<T>(src: &mut Consumer<T>, dst: &mut Producer<T>, count: usize) -> usize {
    let src_head = src.shared.head(Ordering::Relaxed);
    src.cached_tail = src.shared.tail(Ordering::Acquire);
    let available = src.shared.distance(src_head, src.cached_tail);

    let dst_tail = dst.shared.tail(Ordering::Relaxed);
    dst.cached_head = dst.shared.head(Ordering::Acquire);
    let vacant = dst.shared.capacity() - dst.shared.distance(dst.cached_head, dst_tail);

    let n = count.min(available).min(vacant);
    if n == 0 {
        return 0;
    }

    // SAFETY: `available` and `vacant` come from Acquire loads of the
    // remote indices, so the source slots are initialized and the
    // destination slots are free. The regions cannot overlap even within a
    // single buffer: occupied and vacant are disjoint by the index
    // invariant. Elements are moved, not copied: the source never drops
    // them and the destination takes ownership.
    unsafe {
        let (s0, s1) = src.shared.occupied_slices(src_head, available);
        let (d0, d1) = dst.shared.vacant_slices(dst_tail, vacant);

        let mut srcs = [(s0.as_ptr(), s0.len()), (s1.as_ptr(), s1.len())];
        let mut dsts = [
            (d0.as_mut_ptr() as *mut T, d0.len()),
            (d1.as_mut_ptr() as *mut T, d1.len()),
        ];

        let mut left = n;
        let mut si = 0;
        let mut di = 0;
        while left > 0 {
            if srcs[si].1 == 0 {
                si += 1;
                continue;
            }
            if dsts[di].1 == 0 {
                di += 1;
                continue;
            }
            let step = left.min(srcs[si].1).min(dsts[di].1);
            ptr::copy_nonoverlapping(srcs[si].0, dsts[di].0, step);
            srcs[si] = (srcs[si].0.add(step), srcs[si].1 - step);
            dsts[di] = (dsts[di].0.add(step), dsts[di].1 - step);
            left -= step;
        }
    }

    src.shared
        .set_head(src.shared.advance(src_head, n), Ordering::Release);
    dst.shared
        .set_tail(dst.shared.advance(dst_tail, n), Ordering::Release);
    n
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RingBuffer;

    fn drain<T>(rx: &mut Consumer<T>) -> Vec<T> {
        let mut out = Vec::new();
        while let Some(v) = rx.pop() {
            out.push(v);
        }
        out
    }

    #[test]
    fn moves_everything_when_count_exceeds_available() {
        let (mut src_tx, mut src_rx) = RingBuffer::new(4).split();
        let (mut dst_tx, mut dst_rx) = RingBuffer::new(4).split();
        assert_eq!(src_tx.push_slice(&[1u8, 2, 3]), 3);

        assert_eq!(move_items(&mut src_rx, &mut dst_tx, 10), 3);
        assert!(src_rx.is_empty());
        assert_eq!(drain(&mut dst_rx), vec![1, 2, 3]);
    }

    #[test]
    fn bounded_by_count() {
        let (mut src_tx, mut src_rx) = RingBuffer::new(8).split();
        let (mut dst_tx, mut dst_rx) = RingBuffer::new(8).split();
        assert_eq!(src_tx.push_slice(&[1u8, 2, 3, 4, 5]), 5);

        assert_eq!(move_items(&mut src_rx, &mut dst_tx, 2), 2);
        assert_eq!(src_rx.len(), 3);
        assert_eq!(drain(&mut dst_rx), vec![1, 2]);
    }

    #[test]
    fn bounded_by_destination_space() {
        let (mut src_tx, mut src_rx) = RingBuffer::new(8).split();
        let (mut dst_tx, mut dst_rx) = RingBuffer::new(4).split();
        assert_eq!(src_tx.push_slice(&[1u8, 2, 3, 4, 5, 6]), 6);
        assert_eq!(dst_tx.push_slice(&[9u8]), 1);

        assert_eq!(move_items(&mut src_rx, &mut dst_tx, usize::MAX), 3);
        assert_eq!(src_rx.len(), 3);
        assert_eq!(drain(&mut dst_rx), vec![9, 1, 2, 3]);
    }

    #[test]
    fn empty_source_moves_nothing() {
        let (_src_tx, mut src_rx) = RingBuffer::<u8>::new(4).split();
        let (mut dst_tx, _dst_rx) = RingBuffer::<u8>::new(4).split();
        assert_eq!(move_items(&mut src_rx, &mut dst_tx, 10), 0);
    }

    #[test]
    fn handles_wrap_on_both_sides() {
        // Rotate both rings so source occupied and destination vacant both
        // straddle their physical ends; the copy then needs three legs.
        let (mut src_tx, mut src_rx) = RingBuffer::new(4).split();
        let (mut dst_tx, mut dst_rx) = RingBuffer::new(4).split();

        let mut sink = [0u8; 3];
        assert_eq!(src_tx.push_slice(&[0, 0, 0]), 3);
        assert_eq!(src_rx.pop_slice(&mut sink), 3);
        assert_eq!(dst_tx.push_slice(&[0, 0]), 2);
        assert_eq!(dst_rx.pop_slice(&mut sink[..2]), 2);

        assert_eq!(src_tx.push_slice(&[1, 2, 3, 4]), 4);
        assert_eq!(move_items(&mut src_rx, &mut dst_tx, usize::MAX), 4);
        assert_eq!(drain(&mut dst_rx), vec![1, 2, 3, 4]);
    }

    #[test]
    fn moves_within_a_single_buffer() {
        let (mut tx, mut rx) = RingBuffer::new(6).split();
        assert_eq!(tx.push_slice(&[1u8, 2, 3]), 3);

        // Front of the queue re-appended at the back.
        assert_eq!(move_items(&mut rx, &mut tx, 2), 2);
        assert_eq!(drain(&mut rx), vec![3, 1, 2]);
    }

    #[test]
    fn non_copy_elements_transfer_ownership_once() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let drop_count = Arc::new(AtomicUsize::new(0));

        struct DropTracker(u32, Arc<AtomicUsize>);
        impl Drop for DropTracker {
            fn drop(&mut self) {
                self.1.fetch_add(1, Ordering::Relaxed);
            }
        }

        {
            let (mut src_tx, mut src_rx) = RingBuffer::new(4).split();
            let (mut dst_tx, mut dst_rx) = RingBuffer::new(4).split();
            for i in 0..3 {
                assert!(src_tx.push(DropTracker(i, drop_count.clone())).is_ok());
            }

            assert_eq!(move_items(&mut src_rx, &mut dst_tx, usize::MAX), 3);
            assert_eq!(drop_count.load(Ordering::Relaxed), 0);

            let moved = drain(&mut dst_rx);
            let ids: Vec<u32> = moved.iter().map(|t| t.0).collect();
            assert_eq!(ids, vec![0, 1, 2]);
        }

        assert_eq!(drop_count.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn method_forms_delegate() {
        let (mut src_tx, mut src_rx) = RingBuffer::new(4).split();
        let (mut dst_tx, mut dst_rx) = RingBuffer::new(4).split();

        assert_eq!(src_tx.push_slice(&[1u8, 2]), 2);
        assert_eq!(src_rx.move_to(&mut dst_tx, 1), 1);
        assert_eq!(dst_tx.move_from(&mut src_rx, 1), 1);
        assert_eq!(drain(&mut dst_rx), vec![1, 2]);
    }
}

// ============================================================================
// Property Tests
// ============================================================================
