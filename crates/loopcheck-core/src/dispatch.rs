use crate::channel::{ByteChannel, ChannelError};
use crate::selector::{InputSelector, SelectorState};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DispatchError {
    #[error("no dispatch entry for selector state {0:?}")]
    Unmapped(SelectorState),
}

/// Fixed four-entry mapping from selector state to an output action. A
/// lookup against a state with no entry fails loudly; there is no default.
#[derive(Debug, Clone)]
pub struct DispatchTable<T> {
    entries: [Option<T>; 4],
}

impl<T: Clone> DispatchTable<T> {
    pub fn new() -> Self {
        Self {
            entries: [None, None, None, None],
        }
    }

    /// A total table, one value per selector state.
    pub fn complete(both: T, only_first: T, only_second: T, neither: T) -> Self {
        Self::new()
            .entry(SelectorState::BothPressed, both)
            .entry(SelectorState::OnlyFirstPressed, only_first)
            .entry(SelectorState::OnlySecondPressed, only_second)
            .entry(SelectorState::NeitherPressed, neither)
    }

    pub fn entry(mut self, state: SelectorState, value: T) -> Self {
        self.entries[Self::slot(state)] = Some(value);
        self
    }

    pub fn lookup(&self, state: SelectorState) -> Result<T, DispatchError> {
        self.entries[Self::slot(state)]
            .clone()
            .ok_or(DispatchError::Unmapped(state))
    }

    fn slot(state: SelectorState) -> usize {
        match state {
            SelectorState::BothPressed => 0,
            SelectorState::OnlyFirstPressed => 1,
            SelectorState::OnlySecondPressed => 2,
            SelectorState::NeitherPressed => 3,
        }
    }
}

impl<T: Clone> Default for DispatchTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// The byte transmitted per button state in the UART demo.
pub fn demo_byte_table() -> DispatchTable<u8> {
    DispatchTable::complete(0x00, 0xAA, 0x46, 0xF0)
}

/// The loop delay per button state in the counter demo.
pub fn demo_delay_table() -> DispatchTable<Duration> {
    DispatchTable::complete(
        Duration::from_millis(1000),
        Duration::from_millis(200),
        Duration::from_millis(3000),
        Duration::from_millis(1000),
    )
}

#[derive(Debug, Error)]
pub enum DemoError {
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error(transparent)]
    Channel(#[from] ChannelError),
}

/// One demo invocation: sample the buttons, look up the byte for that
/// state, put it on the wire. Returns the transmitted byte.
pub fn transmit_for(
    selector: &dyn InputSelector,
    table: &DispatchTable<u8>,
    channel: &mut dyn ByteChannel,
) -> Result<u8, DemoError> {
    let state = selector.read();
    let byte = table.lookup(state)?;
    channel.send(byte)?;
    log::debug!("state 0x{:02X} dispatched 0x{byte:02X}", state.code());
    Ok(byte)
}
