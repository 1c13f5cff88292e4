//! Byte-stream bridge for `u8` rings.
//!
//! [`ByteSource`] and [`ByteSink`] are deliberately narrow capabilities —
//! one method each, "transfer up to N bytes, report count or error" — so
//! the ring does not depend on any particular streaming ecosystem. Blanket
//! impls cover `std::io::Read` / `std::io::Write` for convenience.
//!
//! [`Producer::read_from`] and [`Consumer::write_into`] sit on top of the
//! two-region access machinery: they drive the collaborator once per
//! contiguous region, publish progress after every successful chunk, and
//! stop on a short transfer. A collaborator error is propagated unchanged;
//! bytes moved before the error stay moved.

use std::io;
use std::slice;

use crate::consumer::Consumer;
use crate::producer::Producer;
use crate::ring::Ordering;

/// Something bytes can be pulled from.
pub trait ByteSource {
    type Error;

    /// Reads up to `buf.len()` bytes into `buf`, returning how many were
    /// read. `Ok(0)` means the source has nothing more to offer right now.
    ///
    /// `buf` may hold arbitrary garbage on entry; implementations must only
    /// write to it.
    fn read_up_to(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;
}

/// Something bytes can be pushed into.
pub trait ByteSink {
    type Error;

    /// Writes up to `buf.len()` bytes from `buf`, returning how many were
    /// accepted. `Ok(0)` means the sink can accept no more right now.
    fn write_up_to(&mut self, buf: &[u8]) -> Result<usize, Self::Error>;
}

impl<R: io::Read> ByteSource for R {
    type Error = io::Error;

    #[inline]
    fn read_up_to(&mut self, buf: &mut [u8]) -> Result<usize, io::Error> {
        self.read(buf)
    }
}

impl<W: io::Write> ByteSink for W {
    type Error = io::Error;

    #[inline]
    fn write_up_to(&mut self, buf: &[u8]) -> Result<usize, io::Error> {
        self.write(buf)
    }
}

impl Producer<u8> {
    /// Pulls up to `count` bytes from `source` into free space, returning
    /// the number transferred.
    ///
    /// Stops early when the buffer fills, when `source` reports `Ok(0)`, or
    /// after a short read. On `Err`, bytes already transferred remain in
    /// the buffer and the error is returned unchanged.
    ///
    /// # Panics
    ///
    /// Panics if `source` claims to have read more bytes than the buffer it
    /// was given holds.
    pub fn read_from<S: ByteSource>(
        &mut self,
        source: &mut S,
        count: usize,
    ) -> Result<usize, S::Error> {
        self.cached_head = self.shared.head(Ordering::Acquire);
        let mut tail = self.shared.tail(Ordering::Relaxed);
        let vacant = self.capacity() - self.shared.distance(self.cached_head, tail);
        let want = count.min(vacant);

        // SAFETY: `vacant` comes from the Acquire load above; the consumer
        // will not touch these slots until `tail` is published.
        let (a, b) = unsafe { self.shared.vacant_slices(tail, vacant) };

        let mut total = 0;
        for chunk in [a, b] {
            let take = chunk.len().min(want - total);
            if take == 0 {
                continue;
            }

            // SAFETY: Every bit pattern is a valid u8 and the source only
            // writes to the slice; the bytes it does not overwrite are
            // never published (tail only advances by `read`).
            let buf = unsafe { slice::from_raw_parts_mut(chunk.as_mut_ptr() as *mut u8, take) };

            let read = source.read_up_to(buf)?;
            // Hard check: a count beyond the offered slice would publish
            // uninitialized slots.
            assert!(read <= take, "source reported more bytes than offered");
            if read == 0 {
                break;
            }

            tail = self.shared.advance(tail, read);
            self.shared.set_tail(tail, Ordering::Release);
            total += read;

            if read < take {
                break;
            }
        }
        Ok(total)
    }
}

impl Consumer<u8> {
    /// Pushes up to `count` bytes of buffered data into `sink`, returning
    /// the number transferred.
    ///
    /// Stops early when the buffer empties, when `sink` reports `Ok(0)`, or
    /// after a short write. On `Err`, bytes already accepted by the sink
    /// are gone from the buffer and the error is returned unchanged.
    ///
    /// # Panics
    ///
    /// Panics if `sink` claims to have written more bytes than the slice it
    /// was given holds.
    pub fn write_into<S: ByteSink>(
        &mut self,
        sink: &mut S,
        count: usize,
    ) -> Result<usize, S::Error> {
        let mut head = self.shared.head(Ordering::Relaxed);
        self.cached_tail = self.shared.tail(Ordering::Acquire);
        let len = self.shared.distance(head, self.cached_tail);
        let want = count.min(len);

        // SAFETY: `len` comes from the Acquire load above; the producer
        // will not touch these slots until `head` is published.
        let (a, b) = unsafe { self.shared.occupied_slices_ref(head, len) };
        let legs = [a, b];

        let mut total = 0;
        for leg in legs {
            let give = leg.len().min(want - total);
            if give == 0 {
                continue;
            }

            let written = sink.write_up_to(&leg[..give])?;
            // Hard check: a count beyond the offered slice would retire
            // slots the sink never saw.
            assert!(written <= give, "sink reported more bytes than offered");
            if written == 0 {
                break;
            }

            head = self.shared.advance(head, written);
            self.shared.set_head(head, Ordering::Release);
            total += written;

            if written < give {
                break;
            }
        }
        Ok(total)
    }
}

// ============================================================================
// Tests
// ============================================================================
