//! Wait-free single-producer/single-consumer ring buffer.
//!
//! # Design
//!
//! A [`RingBuffer`] is created with a fixed capacity and
//! [`split`](RingBuffer::split) once into a write-side [`Producer`] and a
//! read-side [`Consumer`]. The two handles share one backing array and
//! coordinate purely through two atomic indices; there are no locks, no
//! allocation on the hot path, and no blocking — every operation returns
//! immediately with however much progress was possible.
//!
//! # Key properties
//!
//! - **Wait-free**: both sides complete every operation in bounded steps,
//!   using only Acquire/Release loads and stores (no CAS).
//! - **Cached remote index**: each handle caches the other side's index and
//!   reloads it only on apparent-full / apparent-empty, reducing
//!   cache-coherence traffic on the hot path.
//! - **Two-region access**: bulk operations expose the occupied or vacant
//!   region as an ordered pair of contiguous slices, so callers can operate
//!   in place even when the region wraps the physical end of the array.
//! - **Zero-copy transfer**: [`move_items`] moves elements from one
//!   buffer's consumer side into another buffer's producer side without
//!   materializing them in caller memory.
//! - **Byte-stream bridge**: `u8` rings plug into any [`ByteSource`] /
//!   [`ByteSink`] (blanket-implemented for `std::io::Read` / `Write`).
//!
//! # Error model
//!
//! Empty on read is absence (`None`), not an error. Full on
//! [`push`](Producer::push) hands the rejected value back. Bulk operations
//! report how much was actually processed; zero is a valid result. No
//! operation silently drops caller data.
//!
//! # Threading contract
//!
//! Exactly one thread drives the producer and exactly one drives the
//! consumer. Handles are `Send` but not `Sync`; all mutating operations
//! take `&mut self`, so the one-writer/one-reader discipline is enforced
//! by ownership, not at runtime.
//!
//! # Example
//!
//! ```
//! use spsc_ring::RingBuffer;
//!
//! let (mut tx, mut rx) = RingBuffer::<u64>::new(8).split();
//!
//! let worker = std::thread::spawn(move || {
//!     let mut got = Vec::new();
//!     while got.len() < 4 {
//!         match rx.pop() {
//!             Some(v) => got.push(v),
//!             None => std::hint::spin_loop(),
//!         }
//!     }
//!     got
//! });
//!
//! for i in 0..4 {
//!     while tx.push(i).is_err() {
//!         std::hint::spin_loop();
//!     }
//! }
//!
//! assert_eq!(worker.join().unwrap(), vec![0, 1, 2, 3]);
//! ```

mod consumer;
mod producer;
mod ring;
mod stream;
mod transfer;

pub use consumer::Consumer;
pub use producer::Producer;
pub use ring::RingBuffer;
pub use stream::{ByteSink, ByteSource};
pub use transfer::move_items;
