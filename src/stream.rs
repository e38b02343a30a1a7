//! Windowed transfer engine: one [`Stream`] per link endpoint.
//!
//! A stream drains its input FIFO into a bounded send staging buffer and its
//! receive staging buffer into its output FIFO. Four size counters carry the
//! entire synchronization state between the two endpoints: the transport's
//! only job is to mirror each node's staged words and counters to its peer
//! between poll cycles (see [`Transfer`] and [`exchange`]).
//!
//! Flow control is stop-and-wait over whole batches: at most one
//! unacknowledged batch is in flight per direction, and the send buffer is
//! freed only once the peer reports having consumed all of it. Throughput is
//! bounded by `capacity` words per round trip in exchange for making loss
//! and duplication impossible under any polling schedule.

use alloc::boxed::Box;
use alloc::vec;
use log::{trace, warn};
use snafu::ensure;

use crate::fifo::WordFifo;
use crate::{Error, ZeroCapacitySnafu};

/// One endpoint of the link.
///
/// Owns the staging buffers, the four window counters, and the node's input
/// and output FIFOs. Drive it with [`advance`](Self::advance) once per poll
/// cycle; it never blocks and makes maximal safe progress each call.
#[derive(Debug)]
pub struct Stream<F> {
    input: F,
    output: F,
    capacity: usize,
    send_data: Box<[u32]>,
    recv_data: Box<[u32]>,
    local_send_size: usize,
    local_recv_size: usize,
    remote_send_size: usize,
    remote_recv_size: usize,
}

impl<F: WordFifo> Stream<F> {
    /// Create an endpoint staging at most `capacity` words per direction.
    ///
    /// `input` feeds the send side, `output` collects delivered words; both
    /// remain accessible through [`input_mut`](Self::input_mut) and
    /// [`output_mut`](Self::output_mut) and are handed back by
    /// [`into_fifos`](Self::into_fifos). The staging arenas are allocated
    /// here, once; `advance` never allocates.
    ///
    /// # Errors
    /// Returns [`Error::ZeroCapacity`] if `capacity` is zero. A capacity of
    /// one is valid and models a single-word handshake.
    pub fn new(input: F, output: F, capacity: usize) -> Result<Stream<F>, Error> {
        ensure!(capacity > 0, ZeroCapacitySnafu);
        Ok(Stream {
            input,
            output,
            capacity,
            send_data: vec![0; capacity].into_boxed_slice(),
            recv_data: vec![0; capacity].into_boxed_slice(),
            local_send_size: 0,
            local_recv_size: 0,
            remote_send_size: 0,
            remote_recv_size: 0,
        })
    }

    /// Run one poll cycle: deliver, reclaim, then stage.
    ///
    /// Each phase's effect is observable only through the counters and the
    /// FIFOs. Backpressure (a full output FIFO, an empty input FIFO, an
    /// unacknowledged batch) leaves the counters unchanged and is retried on
    /// the next cycle; there is no error return. Repeated calls with no new
    /// input and no intervening transport exchange are no-ops.
    pub fn advance(&mut self) {
        // Deliver: move received words into the output queue, stopping
        // without loss if the queue fills up.
        let mut delivered = 0;
        while self.local_recv_size < self.remote_send_size {
            let word = self.recv_data[self.local_recv_size];
            if !self.output.push_back(word) {
                break;
            }
            self.local_recv_size += 1;
            delivered += 1;
        }
        if delivered > 0 {
            trace!("delivered {} words to the output queue", delivered);
        }

        // Reclaim: the batch is freed only as a whole, once the peer has
        // consumed every word of it.
        if self.local_send_size > 0 && self.remote_recv_size >= self.local_send_size {
            trace!("send batch of {} words acknowledged", self.local_send_size);
            self.local_send_size = 0;
        }

        // Stage: fill the send buffer from the input queue. A fresh batch
        // must wait until the peer has reported the reclaimed send state
        // back (`remote_recv_size == 0`); consecutive batches of equal size
        // are otherwise indistinguishable on the wire. Appending to the
        // current unacknowledged batch needs no such wait.
        if self.local_send_size > 0 || self.remote_recv_size == 0 {
            let mut staged = 0;
            while self.local_send_size < self.capacity {
                match self.input.pop_front() {
                    Some(word) => {
                        self.send_data[self.local_send_size] = word;
                        self.local_send_size += 1;
                        staged += 1;
                    }
                    None => break,
                }
            }
            if staged > 0 {
                trace!("staged {} words for transmission", staged);
            }
        }
    }

    /// The bus image this node currently exposes to its peer.
    ///
    /// A transport implementation copies this to the peer and feeds the
    /// peer's image back through [`transfer_in`](Self::transfer_in); both
    /// directions of one exchange must be taken from the same pre-exchange
    /// snapshot.
    pub fn transfer_out(&self) -> Transfer<'_> {
        Transfer {
            words: &self.send_data[..self.local_send_size],
            consumed: self.local_recv_size,
        }
    }

    /// Apply the peer's bus image to this node.
    ///
    /// Copies the peer's staged words into the receive buffer and updates
    /// `remote_send_size` and `remote_recv_size`. An empty peer send state
    /// resets `local_recv_size`: the previous batch no longer exists, so
    /// neither does a consumption count for it.
    pub fn transfer_in(&mut self, transfer: Transfer<'_>) {
        self.ingest(transfer.words);
        self.remote_recv_size = transfer.consumed;
    }

    fn ingest(&mut self, words: &[u32]) {
        let count = if words.len() > self.capacity {
            warn!(
                "peer staged {} words but local capacity is {}; truncating",
                words.len(),
                self.capacity
            );
            self.capacity
        } else {
            words.len()
        };
        self.recv_data[..count].copy_from_slice(&words[..count]);
        self.remote_send_size = count;
        if count == 0 {
            self.local_recv_size = 0;
        }
    }

    /// Words staged and not yet acknowledged by the peer.
    pub fn local_send_size(&self) -> usize {
        self.local_send_size
    }

    /// Words already consumed out of the receive buffer.
    pub fn local_recv_size(&self) -> usize {
        self.local_recv_size
    }

    /// Last reported size of the peer's staged batch.
    pub fn remote_send_size(&self) -> usize {
        self.remote_send_size
    }

    /// Last reported count of words the peer consumed from our batch.
    pub fn remote_recv_size(&self) -> usize {
        self.remote_recv_size
    }

    /// Maximum words staged per direction.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The node's input FIFO (source of outbound data).
    pub fn input(&self) -> &F {
        &self.input
    }

    /// Mutable access to the input FIFO, for the application to fill.
    pub fn input_mut(&mut self) -> &mut F {
        &mut self.input
    }

    /// The node's output FIFO (sink of delivered data).
    pub fn output(&self) -> &F {
        &self.output
    }

    /// Mutable access to the output FIFO, for the application to drain.
    pub fn output_mut(&mut self) -> &mut F {
        &mut self.output
    }

    /// Tear the endpoint down, dropping the staging buffers and handing the
    /// FIFO pair back to the caller. Staged words still in flight are not
    /// drained; flush before calling this if they matter.
    pub fn into_fifos(self) -> (F, F) {
        (self.input, self.output)
    }
}

/// One direction of a transport exchange: the staged words a node exposes
/// plus its consumed-count report for the opposite direction.
#[derive(Debug, Clone, Copy)]
pub struct Transfer<'a> {
    words: &'a [u32],
    consumed: usize,
}

impl<'a> Transfer<'a> {
    /// Assemble a transfer from raw parts, for transports that read the peer
    /// image out of hardware registers rather than a local [`Stream`].
    pub fn new(words: &'a [u32], consumed: usize) -> Transfer<'a> {
        Transfer { words, consumed }
    }

    /// The staged words.
    pub fn words(&self) -> &'a [u32] {
        self.words
    }

    /// How many words of the opposite direction's batch the sender has
    /// consumed.
    pub fn consumed(&self) -> usize {
        self.consumed
    }
}

/// Perform one symmetric transport exchange between two endpoints.
///
/// Models the bus copy step as explicit message passing: both directions are
/// served from the same pre-exchange snapshot, exactly as a hardware block
/// transfer executing between poll cycles would. Must not be interleaved
/// with an in-progress [`Stream::advance`] on either node, which the borrow
/// checker enforces.
pub fn exchange<F: WordFifo, G: WordFifo>(a: &mut Stream<F>, b: &mut Stream<G>) {
    let a_consumed = a.local_recv_size;
    let b_consumed = b.local_recv_size;

    b.ingest(&a.send_data[..a.local_send_size]);
    a.ingest(&b.send_data[..b.local_send_size]);

    a.remote_recv_size = b_consumed;
    b.remote_recv_size = a_consumed;
}
