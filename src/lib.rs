//! Sans-io link layer streaming 32-bit words between two paired nodes.
//!
//! The crate implements the link layer of a point-to-point data-acquisition
//! bus. Each endpoint owns a [`Stream`]: a windowed transfer engine that
//! drains an application input FIFO into a bounded staging buffer, and a
//! receive staging buffer into an application output FIFO. Flow control is a
//! stop-and-wait discipline over four size counters, so neither node can
//! overrun the other's fixed-size hardware buffer.
//!
//! The crate performs no I/O itself. The caller polls [`Stream::advance`]
//! once per cycle and mirrors the staged words and counters to the peer,
//! either through a mutually-visible memory region (see [`exchange`] and
//! [`Transfer`]) or over a raw serial word channel, in which case the
//! [`framer`] module supplies the escaping transform pair that makes the
//! word stream self-delimiting.
//!
//! No blocking, no interrupts, and no allocation after construction: every
//! operation completes synchronously and defers unfinished work to the next
//! poll cycle.
//!
//! # Example
//!
//! ```
//! use wordlink_proto::{exchange, Stream, WordFifo, WordQueue};
//!
//! # fn main() -> Result<(), wordlink_proto::Error> {
//! let mut a = Stream::new(WordQueue::with_capacity(8), WordQueue::with_capacity(8), 4)?;
//! let mut b = Stream::new(WordQueue::with_capacity(8), WordQueue::with_capacity(8), 4)?;
//!
//! a.input_mut().push_back(0xBEEF_CAFE);
//! a.advance(); // stage the word for transmission
//! exchange(&mut a, &mut b); // mirror staging buffers and counters
//! b.advance(); // deliver into b's output FIFO
//!
//! assert_eq!(b.output_mut().pop_front(), Some(0xBEEF_CAFE));
//! # Ok(()) }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

use snafu::Snafu;

pub mod fifo;
pub mod framer;
pub mod stream;

pub use crate::fifo::{WordFifo, WordQueue};
pub use crate::framer::ErrorFlags;
pub use crate::stream::{exchange, Stream, Transfer};

/// Error type for this crate.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    /// The staging buffers must hold at least one word.
    #[snafu(display("Staging capacity must be at least one word"))]
    ZeroCapacity,
}
