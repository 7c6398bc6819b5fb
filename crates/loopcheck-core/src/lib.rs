//! Core functionalities: byte channels, loopback test engine, selector dispatch, tracing.

pub mod channel;
pub mod dispatch;
pub mod engine;
pub mod selector;
pub mod trace;

pub use channel::{ByteChannel, ChannelConfig, ChannelError, MemoryLink, PortInfo, SerialChannel};
pub use dispatch::{demo_byte_table, demo_delay_table, transmit_for, DemoError, DispatchError, DispatchTable};
pub use engine::{LoopbackTest, Mismatch, SampleRecord, TestRun, ValidationReport};
pub use selector::{FixedSelector, InputSelector, SelectorState};
pub use trace::{Direction, ExchangeTrace, SharedTrace, TracedChannel};
