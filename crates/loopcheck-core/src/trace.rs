use crate::channel::{ByteChannel, ChannelError};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Tx,
    Rx,
}

#[derive(Debug, Clone, Copy)]
pub struct TraceEntry {
    pub timestamp_ms: u64,
    pub direction: Direction,
    pub byte: u8,
}

/// Bounded record of every byte moved through a channel, oldest evicted
/// first.
pub struct ExchangeTrace {
    entries: Vec<TraceEntry>,
    max_entries: usize,
}

impl ExchangeTrace {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Vec::new(),
            max_entries,
        }
    }

    pub fn push(&mut self, direction: Direction, byte: u8) {
        let timestamp_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_millis() as u64;

        self.entries.push(TraceEntry {
            timestamp_ms,
            direction,
            byte,
        });

        if self.entries.len() > self.max_entries {
            self.entries.remove(0);
        }
    }

    pub fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn to_text(&self, show_timestamp: bool) -> String {
        let mut result = String::new();
        for entry in &self.entries {
            if show_timestamp {
                let millis = entry.timestamp_ms % 1000;
                let secs = entry.timestamp_ms / 1000;
                let hours = (secs / 3600) % 24;
                let minutes = (secs / 60) % 60;
                let seconds = secs % 60;
                result.push_str(&format!("[{hours:02}:{minutes:02}:{seconds:02}.{millis:03}] "));
            }
            let prefix = match entry.direction {
                Direction::Tx => "TX: ",
                Direction::Rx => "RX: ",
            };
            result.push_str(prefix);
            result.push_str(&format!("0x{:02X}\n", entry.byte));
        }
        result
    }
}

pub type SharedTrace = Arc<Mutex<ExchangeTrace>>;

pub fn shared(max_entries: usize) -> SharedTrace {
    Arc::new(Mutex::new(ExchangeTrace::new(max_entries)))
}

/// Channel wrapper that records every exchange into a shared trace.
pub struct TracedChannel<C> {
    inner: C,
    trace: SharedTrace,
}

impl<C: ByteChannel> TracedChannel<C> {
    pub fn new(inner: C, trace: SharedTrace) -> Self {
        Self { inner, trace }
    }

    pub fn into_inner(self) -> C {
        self.inner
    }
}

impl<C: ByteChannel> ByteChannel for TracedChannel<C> {
    fn send(&mut self, byte: u8) -> Result<(), ChannelError> {
        self.inner.send(byte)?;
        self.trace.lock().push(Direction::Tx, byte);
        Ok(())
    }

    fn receive(&mut self) -> Result<u8, ChannelError> {
        let byte = self.inner.receive()?;
        self.trace.lock().push(Direction::Rx, byte);
        Ok(byte)
    }
}
