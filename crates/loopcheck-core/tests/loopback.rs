//! End-to-end runs of the loopback engine over in-memory links.

use loopcheck_core::{ByteChannel, ChannelError, LoopbackTest, MemoryLink, TracedChannel};
use loopcheck_core::trace;
use std::time::Duration;

const SHORT: Duration = Duration::from_millis(20);

#[test]
fn full_ramp_over_identity_loopback_passes() {
    let test = LoopbackTest::ramp();
    let mut link = MemoryLink::loopback(SHORT);
    let run = test.run(&mut link).unwrap();

    assert_eq!(run.len(), 256);
    for (i, record) in run.records().iter().enumerate() {
        assert_eq!(record.index, i);
        assert_eq!(record.sent, i as u8);
        assert_eq!(record.received, i as u8);
    }

    let report = run.validate();
    assert!(report.passed());
    assert_eq!(report.total, 256);
    assert!(report.mismatches.is_empty());
}

/// Corrupts bit 0 of every odd-indexed received byte, leaving even
/// exchanges untouched.
struct OddBitFlip {
    inner: MemoryLink,
    received: usize,
}

impl OddBitFlip {
    fn new(inner: MemoryLink) -> Self {
        Self { inner, received: 0 }
    }
}

impl ByteChannel for OddBitFlip {
    fn send(&mut self, byte: u8) -> Result<(), ChannelError> {
        self.inner.send(byte)
    }

    fn receive(&mut self) -> Result<u8, ChannelError> {
        let byte = self.inner.receive()?;
        let index = self.received;
        self.received += 1;
        if index % 2 == 1 {
            Ok(byte ^ 0x01)
        } else {
            Ok(byte)
        }
    }
}

#[test]
fn injected_odd_index_corruption_is_reported_exactly() {
    let test = LoopbackTest::ramp();
    let mut channel = OddBitFlip::new(MemoryLink::loopback(SHORT));
    let report = test.run(&mut channel).unwrap().validate();

    assert!(!report.passed());
    assert_eq!(report.mismatches.len(), 128);
    for mismatch in &report.mismatches {
        assert_eq!(mismatch.index % 2, 1);
        assert_eq!(mismatch.sent, mismatch.index as u8);
        assert_eq!(mismatch.received, mismatch.sent ^ 0x01);
    }
}

#[test]
fn run_length_equals_pattern_length() {
    // The original firmware walked one slot past its 255-byte buffer; a
    // run over a pattern of length C must yield exactly C records.
    for len in [1usize, 5, 255, 256] {
        let pattern: Vec<u8> = (0..len).map(|i| i as u8).collect();
        let test = LoopbackTest::with_pattern(pattern);
        let mut link = MemoryLink::loopback(SHORT);
        let run = test.run(&mut link).unwrap();
        assert_eq!(run.len(), len);
    }
}

#[test]
fn unanswered_send_surfaces_a_timeout() {
    // The peer endpoint swallows everything and never echoes.
    let (mut near, _far) = MemoryLink::pair(SHORT);
    let err = LoopbackTest::ramp().run(&mut near).unwrap_err();
    assert!(matches!(err, ChannelError::Timeout { .. }));
}

#[test]
fn traced_run_keeps_the_full_exchange() {
    let test = LoopbackTest::with_pattern(vec![0xAA, 0xF0]);
    let trace = trace::shared(16);
    let mut channel = TracedChannel::new(MemoryLink::loopback(SHORT), trace.clone());
    let report = test.run(&mut channel).unwrap().validate();
    assert!(report.passed());

    let trace = trace.lock();
    // One TX and one RX entry per pattern byte, interleaved.
    assert_eq!(trace.entries().len(), 4);
    let text = trace.to_text(false);
    assert_eq!(text, "TX: 0xAA\nRX: 0xAA\nTX: 0xF0\nRX: 0xF0\n");
}
