mod common;

use common::{drain, SerialLink};
use wordlink_proto::framer::{
    escape_into, unescape_into, ErrorFlags, ESCAPE, IDLE, OVERRUN, RX_OVERFLOW, UNDERRUN,
};
use wordlink_proto::{WordFifo, WordQueue};

fn queue_of(words: &[u32]) -> WordQueue {
    let mut q = WordQueue::with_capacity(words.len().max(1));
    for &w in words {
        assert!(q.push_back(w));
    }
    q
}

#[test]
fn round_trip_across_frames() {
    // A stream sprinkled with every reserved value, pushed through a short
    // serial link one 8-word frame at a time.
    let sent: Vec<u32> = (0..40)
        .map(|i| match i % 6 {
            0 => IDLE,
            1 => ESCAPE,
            2 => UNDERRUN,
            3 => OVERRUN,
            4 => RX_OVERFLOW,
            _ => 0x4000_0000 + i,
        })
        .collect();

    let mut tx = WordQueue::with_capacity(64);
    for &w in &sent {
        assert!(tx.push_back(w));
    }
    let mut rx = WordQueue::with_capacity(64);
    let mut link = SerialLink::<8>::new();

    let mut received = Vec::new();
    for _ in 0..100 {
        let flags = link.pump(&mut tx, &mut rx);
        assert_eq!(flags, ErrorFlags::empty());
        received.extend(drain(&mut rx));
        if received.len() == sent.len() {
            break;
        }
    }
    assert_eq!(received, sent);
}

#[test]
fn reserved_values_survive_one_hop() {
    let mut tx = queue_of(&[IDLE, ESCAPE, UNDERRUN, OVERRUN, RX_OVERFLOW]);
    let mut rx = WordQueue::with_capacity(8);
    let mut link = SerialLink::<16>::new();

    let flags = link.pump(&mut tx, &mut rx);
    assert_eq!(flags, ErrorFlags::empty());
    assert_eq!(
        drain(&mut rx),
        vec![IDLE, ESCAPE, UNDERRUN, OVERRUN, RX_OVERFLOW]
    );
}

#[test]
fn worst_case_expansion_halves_frame_payload() {
    // Every source word needs an escape pair, so an 8-slot frame moves
    // exactly four words.
    let mut tx = queue_of(&[ESCAPE; 10]);
    let mut frame = [0u32; 8];
    assert_eq!(escape_into(&mut frame, &mut tx), 4);
    assert_eq!(tx.len(), 6);
}

#[test]
fn consumed_count_is_source_words_not_slots() {
    let mut tx = queue_of(&[1, IDLE, 2]);
    let mut frame = [0u32; 8];
    // Three source words fill four slots plus padding.
    assert_eq!(escape_into(&mut frame, &mut tx), 3);
    assert_eq!(frame, [1, ESCAPE, IDLE, 2, IDLE, IDLE, IDLE, IDLE]);
}

#[test]
fn empty_link_cycles_are_clean() {
    let mut tx = WordQueue::with_capacity(4);
    let mut rx = WordQueue::with_capacity(4);
    let mut link = SerialLink::<8>::new();
    for _ in 0..3 {
        assert_eq!(link.pump(&mut tx, &mut rx), ErrorFlags::empty());
    }
    assert!(rx.is_empty());
}

#[test]
fn in_band_fault_report_round_trip() {
    // A node that overran its device buffer and dropped received words
    // reports both faults at the front of its next frame.
    let local = ErrorFlags::LOCAL_OVERRUN | ErrorFlags::LOCAL_RX_OVERFLOW;
    let mut frame = [0u32; 8];
    let mut payload = queue_of(&[0xFEED_F00D]);

    let report = local.control_words();
    frame[..report.len()].copy_from_slice(&report);
    let used = report.len();
    escape_into(&mut frame[used..], &mut payload);

    let mut rx = WordQueue::with_capacity(8);
    let flags = unescape_into(&mut rx, &frame);
    assert_eq!(
        flags,
        ErrorFlags::REMOTE_OVERRUN | ErrorFlags::REMOTE_RX_OVERFLOW
    );
    assert_eq!(drain(&mut rx), vec![0xFEED_F00D]);
}

#[test]
fn receiver_overflow_is_a_hard_fault() {
    let mut tx = queue_of(&[1, 2, 3, 4]);
    let mut rx = WordQueue::with_capacity(2);
    let mut link = SerialLink::<8>::new();

    let flags = link.pump(&mut tx, &mut rx);
    assert_eq!(flags, ErrorFlags::LOCAL_RX_OVERFLOW);
    // The frame's overflowed tail is gone; the transport does not retry it.
    assert_eq!(drain(&mut rx), vec![1, 2]);
    assert!(tx.is_empty());
}
