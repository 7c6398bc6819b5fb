use crate::channel::{ByteChannel, ChannelError};
use serde::Serialize;

/// One exchange: what went out and what came back. Immutable once recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SampleRecord {
    pub index: usize,
    pub sent: u8,
    pub received: u8,
}

/// The recorded exchanges of one complete run, in transmission order.
#[derive(Debug, Clone, Serialize)]
pub struct TestRun {
    records: Vec<SampleRecord>,
}

impl TestRun {
    pub fn records(&self) -> &[SampleRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Compares sent vs received for every record. Mismatches are recorded,
    /// never corrected; validation always walks the full run.
    pub fn validate(&self) -> ValidationReport {
        let mismatches: Vec<Mismatch> = self
            .records
            .iter()
            .filter(|r| r.sent != r.received)
            .map(|r| Mismatch {
                index: r.index,
                sent: r.sent,
                received: r.received,
            })
            .collect();
        if mismatches.is_empty() {
            log::info!("validation passed over {} records", self.records.len());
        } else {
            log::warn!(
                "validation found {} mismatches over {} records",
                mismatches.len(),
                self.records.len()
            );
        }
        ValidationReport {
            total: self.records.len(),
            mismatches,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Mismatch {
    pub index: usize,
    pub sent: u8,
    pub received: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub total: usize,
    pub mismatches: Vec<Mismatch>,
}

impl ValidationReport {
    pub fn passed(&self) -> bool {
        self.mismatches.is_empty()
    }
}

/// Drives a channel through a fixed byte pattern and records every
/// exchange. Send and receive are interleaved per element, so at most one
/// byte is ever unacknowledged on the line.
pub struct LoopbackTest {
    pattern: Vec<u8>,
}

impl LoopbackTest {
    /// The ramp test: every byte value 0 through 255, inclusive.
    pub fn ramp() -> Self {
        Self {
            pattern: (0u8..=255).collect(),
        }
    }

    pub fn with_pattern(pattern: Vec<u8>) -> Self {
        Self { pattern }
    }

    pub fn pattern(&self) -> &[u8] {
        &self.pattern
    }

    /// Runs the full pattern. Any channel failure, a receive timeout
    /// included, aborts the run and surfaces to the caller.
    pub fn run<C: ByteChannel + ?Sized>(&self, channel: &mut C) -> Result<TestRun, ChannelError> {
        let mut records = Vec::with_capacity(self.pattern.len());
        for (index, &sent) in self.pattern.iter().enumerate() {
            channel.send(sent)?;
            let received = channel.receive()?;
            log::debug!("exchange {index}: sent 0x{sent:02X}, received 0x{received:02X}");
            records.push(SampleRecord { index, sent, received });
        }
        log::info!("loopback run complete: {} exchanges", records.len());
        Ok(TestRun { records })
    }
}
