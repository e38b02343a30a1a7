//! Escaping framer for raw serial word channels.
//!
//! A width-limited serial transport offers no out-of-band signaling, so idle
//! padding, escaping and fault indication must share the 32-bit word space
//! with payload data. [`escape_into`] turns an arbitrary word stream into a
//! fixed-size, self-delimiting frame; [`unescape_into`] reverses the
//! transform and reports transport-level faults. Payload words that collide
//! with a reserved control value are sent as an ([`ESCAPE`], literal) pair,
//! so every 32-bit value survives the round trip, at the cost of up to 2x
//! expansion for a stream of all-reserved-looking words.
//!
//! Both transforms are stateless and restartable: a partial fill resumes
//! correctly on the next call using the current FIFO contents.

use arrayvec::ArrayVec;
use bitflags::bitflags;
use log::debug;

use crate::fifo::WordFifo;

/// Padding word filling unused frame slots. Discarded on receive.
pub const IDLE: u32 = 0xBBBB_BBBB;
/// Marks the following word as literal payload.
pub const ESCAPE: u32 = 0xBEEF_CAFE;
/// The sender's device buffer underran.
pub const UNDERRUN: u32 = 0xBEEF_FACE;
/// The sender's device buffer overran.
pub const OVERRUN: u32 = 0xDEAD_BEEF;
/// The sender's receive FIFO overflowed and it dropped inbound words.
pub const RX_OVERFLOW: u32 = 0xDEAD_FACE;

/// Returns `true` if `word` collides with a reserved control value and must
/// be escaped on the wire.
pub const fn is_control(word: u32) -> bool {
    matches!(word, IDLE | ESCAPE | UNDERRUN | OVERRUN | RX_OVERFLOW)
}

bitflags! {
    /// Fault indications accumulated while decoding a frame.
    ///
    /// The six `LOCAL_*`/`REMOTE_*` bits are independent and combinable.
    /// `LOCAL_UNDERRUN` and `LOCAL_OVERRUN` are never raised by this crate;
    /// they belong to the device driver, which maps them onto the wire with
    /// [`ErrorFlags::control_words`]. The decoder raises the `REMOTE_*` bits
    /// when the peer signals a fault in-band, and `LOCAL_RX_OVERFLOW` when
    /// the destination FIFO cannot hold a decoded word.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ErrorFlags: u32 {
        /// This node's device buffer underran.
        const LOCAL_UNDERRUN = 1 << 0;
        /// This node's device buffer overran.
        const LOCAL_OVERRUN = 1 << 1;
        /// The destination FIFO overflowed; the rest of the frame was lost.
        const LOCAL_RX_OVERFLOW = 1 << 2;
        /// The peer reported a device buffer underrun.
        const REMOTE_UNDERRUN = 1 << 3;
        /// The peer reported a device buffer overrun.
        const REMOTE_OVERRUN = 1 << 4;
        /// The peer reported a receive FIFO overflow.
        const REMOTE_RX_OVERFLOW = 1 << 5;
        /// The frame ended with a bare [`ESCAPE`] marker; the marker was
        /// discarded. Not a wire value: a well-formed encoder never splits
        /// an escape pair across a frame boundary.
        const TRUNCATED_FRAME = 1 << 6;
    }
}

impl ErrorFlags {
    /// Map the local fault bits onto their wire words, in bit order.
    ///
    /// A caller that detects a device-level fault places these at the front
    /// of its next outgoing frame; the peer's decoder reports them back as
    /// the matching `REMOTE_*` bits.
    pub fn control_words(self) -> ArrayVec<u32, 3> {
        let mut words = ArrayVec::new();
        if self.contains(Self::LOCAL_UNDERRUN) {
            words.push(UNDERRUN);
        }
        if self.contains(Self::LOCAL_OVERRUN) {
            words.push(OVERRUN);
        }
        if self.contains(Self::LOCAL_RX_OVERFLOW) {
            words.push(RX_OVERFLOW);
        }
        words
    }
}

/// Fill `dest` with an escaped frame drawn from the front of `src`.
///
/// Every slot of `dest` is written: payload words are copied through,
/// reserved-looking payload becomes an ([`ESCAPE`], literal) pair, and
/// remaining slots are padded with [`IDLE`]. A word requiring escape is
/// never started unless both slots fit; otherwise it stays queued in `src`
/// and the slot is idle-padded, so the next call resumes without loss.
///
/// Returns the number of words consumed from `src`, which may be less than
/// the number of slots used.
pub fn escape_into<F: WordFifo>(dest: &mut [u32], src: &mut F) -> usize {
    let mut consumed = 0;
    let mut slot = 0;
    while slot < dest.len() {
        match src.peek_at(0) {
            None => {
                dest[slot] = IDLE;
                slot += 1;
            }
            Some(word) if is_control(word) => {
                if slot + 1 == dest.len() {
                    // The pair won't fit; back off and pad the last slot.
                    dest[slot] = IDLE;
                    slot += 1;
                } else {
                    dest[slot] = ESCAPE;
                    dest[slot + 1] = word;
                    slot += 2;
                    src.pop_front();
                    consumed += 1;
                }
            }
            Some(word) => {
                dest[slot] = word;
                slot += 1;
                src.pop_front();
                consumed += 1;
            }
        }
    }
    consumed
}

/// Decode the frame in `src`, delivering payload words to the back of `dest`.
///
/// [`IDLE`] words are discarded, escape pairs deliver their literal word,
/// and in-band fault words raise the matching `REMOTE_*` flag instead of
/// being delivered. If `dest` cannot accept a word about to be delivered,
/// decoding stops immediately with [`ErrorFlags::LOCAL_RX_OVERFLOW`] set and
/// the remaining words of this call are lost: a local-resource fault the
/// caller must resolve rather than retry. Returns all-zero flags on clean
/// success.
pub fn unescape_into<F: WordFifo>(dest: &mut F, src: &[u32]) -> ErrorFlags {
    let mut flags = ErrorFlags::empty();
    let mut i = 0;
    while i < src.len() {
        let (value, width) = match src[i] {
            IDLE => {
                i += 1;
                continue;
            }
            UNDERRUN => {
                flags |= ErrorFlags::REMOTE_UNDERRUN;
                i += 1;
                continue;
            }
            OVERRUN => {
                flags |= ErrorFlags::REMOTE_OVERRUN;
                i += 1;
                continue;
            }
            RX_OVERFLOW => {
                flags |= ErrorFlags::REMOTE_RX_OVERFLOW;
                i += 1;
                continue;
            }
            ESCAPE => match src.get(i + 1) {
                Some(&literal) => (literal, 2),
                None => {
                    // Dangling marker at the end of the frame.
                    flags |= ErrorFlags::TRUNCATED_FRAME;
                    break;
                }
            },
            word => (word, 1),
        };
        if !dest.push_back(value) {
            flags |= ErrorFlags::LOCAL_RX_OVERFLOW;
            break;
        }
        i += width;
    }
    if !flags.is_empty() {
        debug!("frame decode raised {:?}", flags);
    }
    flags
}
