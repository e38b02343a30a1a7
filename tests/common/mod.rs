#![allow(dead_code)]

//! In-process transport simulators shared by the integration tests.

use wordlink_proto::framer::{escape_into, unescape_into, ErrorFlags};
use wordlink_proto::{exchange, Stream, WordFifo, WordQueue};

/// Build an endpoint with generous application queues.
pub fn endpoint(capacity: usize) -> Stream<WordQueue> {
    Stream::new(
        WordQueue::with_capacity(1024),
        WordQueue::with_capacity(1024),
        capacity,
    )
    .unwrap()
}

/// One full poll round on the shared-RAM topology: both nodes advance, then
/// the bus mirrors their staged words and counters.
pub fn poll_round(a: &mut Stream<WordQueue>, b: &mut Stream<WordQueue>) {
    a.advance();
    b.advance();
    exchange(a, b);
}

/// Drain every queued word out of a FIFO.
pub fn drain<F: WordFifo>(fifo: &mut F) -> Vec<u32> {
    let mut words = Vec::new();
    while let Some(w) = fifo.pop_front() {
        words.push(w);
    }
    words
}

/// Simulated raw serial word channel carrying fixed-size frames of `N`
/// words. Each pump encodes one frame from the tx queue and decodes it into
/// the rx queue, like a DMA engine clocking the wire once per poll cycle.
pub struct SerialLink<const N: usize> {
    wire: [u32; N],
}

impl<const N: usize> SerialLink<N> {
    pub fn new() -> SerialLink<N> {
        SerialLink { wire: [0; N] }
    }

    pub fn pump<F: WordFifo, G: WordFifo>(&mut self, tx: &mut F, rx: &mut G) -> ErrorFlags {
        escape_into(&mut self.wire, tx);
        unescape_into(rx, &self.wire)
    }
}
