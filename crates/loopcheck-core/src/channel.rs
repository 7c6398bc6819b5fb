use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use serialport::SerialPortInfo;
use std::io::{Read, Write};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("no byte arrived within {waited:?}")]
    Timeout { waited: Duration },
    #[error("framing error on the line")]
    Framing,
    #[error("receive overrun, data lost")]
    Overrun,
    #[error("peer endpoint dropped")]
    Disconnected,
    #[error("serial port: {0}")]
    Port(#[from] serialport::Error),
    #[error("serial I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// One full-duplex byte-at-a-time transport. `send` blocks until the
/// transport accepts the byte; at most one byte is ever in flight.
/// `receive` blocks until a byte arrives or the channel's timeout elapses.
pub trait ByteChannel {
    fn send(&mut self, byte: u8) -> Result<(), ChannelError>;
    fn receive(&mut self) -> Result<u8, ChannelError>;
}

impl<C: ByteChannel + ?Sized> ByteChannel for Box<C> {
    fn send(&mut self, byte: u8) -> Result<(), ChannelError> {
        (**self).send(byte)
    }

    fn receive(&mut self) -> Result<u8, ChannelError> {
        (**self).receive()
    }
}

#[derive(Debug, Clone)]
pub struct PortInfo {
    pub port_name: String,
    pub port_type: String,
    pub vid: Option<u16>,
    pub pid: Option<u16>,
    pub serial_number: Option<String>,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
}

impl From<SerialPortInfo> for PortInfo {
    fn from(info: SerialPortInfo) -> Self {
        let (port_type, vid, pid, serial_number, manufacturer, product) = match &info.port_type {
            serialport::SerialPortType::UsbPort(usb) => (
                "USB".to_string(),
                Some(usb.vid),
                Some(usb.pid),
                usb.serial_number.clone(),
                usb.manufacturer.clone(),
                usb.product.clone(),
            ),
            serialport::SerialPortType::PciPort => ("PCI".to_string(), None, None, None, None, None),
            serialport::SerialPortType::BluetoothPort => ("Bluetooth".to_string(), None, None, None, None, None),
            serialport::SerialPortType::Unknown => ("Unknown".to_string(), None, None, None, None, None),
        };
        Self {
            port_name: info.port_name,
            port_type,
            vid,
            pid,
            serial_number,
            manufacturer,
            product,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChannelConfig {
    pub port_name: String,
    pub baud_rate: u32,
    pub data_bits: serialport::DataBits,
    pub parity: serialport::Parity,
    pub stop_bits: serialport::StopBits,
    pub timeout: Duration,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            port_name: String::new(),
            baud_rate: 115_200,
            data_bits: serialport::DataBits::Eight,
            parity: serialport::Parity::None,
            stop_bits: serialport::StopBits::One,
            timeout: Duration::from_millis(500),
        }
    }
}

/// Handle to one physical serial port, bound at open and held for the
/// life of the process. Owns no buffers of its own.
pub struct SerialChannel {
    cfg: ChannelConfig,
    port: Box<dyn serialport::SerialPort>,
}

impl SerialChannel {
    pub fn list_ports() -> Vec<PortInfo> {
        serialport::available_ports()
            .unwrap_or_default()
            .into_iter()
            .map(PortInfo::from)
            .collect()
    }

    pub fn open(cfg: ChannelConfig) -> Result<Self, ChannelError> {
        let port = serialport::new(&cfg.port_name, cfg.baud_rate)
            .data_bits(cfg.data_bits)
            .parity(cfg.parity)
            .stop_bits(cfg.stop_bits)
            .flow_control(serialport::FlowControl::None)
            .timeout(cfg.timeout)
            .open()?;
        log::info!("opened {} at {} baud", cfg.port_name, cfg.baud_rate);
        Ok(Self { cfg, port })
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.cfg
    }
}

impl ByteChannel for SerialChannel {
    fn send(&mut self, byte: u8) -> Result<(), ChannelError> {
        self.port.write_all(&[byte])?;
        Ok(())
    }

    fn receive(&mut self) -> Result<u8, ChannelError> {
        let mut buf = [0u8; 1];
        match self.port.read_exact(&mut buf) {
            Ok(()) => Ok(buf[0]),
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Err(ChannelError::Timeout {
                waited: self.cfg.timeout,
            }),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory stand-in for a wired serial link. Everything sent on one
/// endpoint is immediately receivable on the other; a starved `receive`
/// fails with `Timeout` instead of blocking forever.
pub struct MemoryLink {
    tx: Sender<u8>,
    rx: Receiver<u8>,
    timeout: Duration,
}

impl MemoryLink {
    /// Two endpoints cross-wired to each other, like two UART peripherals
    /// with TX and RX swapped between them.
    pub fn pair(timeout: Duration) -> (Self, Self) {
        let (a_tx, b_rx) = unbounded();
        let (b_tx, a_rx) = unbounded();
        (
            Self { tx: a_tx, rx: a_rx, timeout },
            Self { tx: b_tx, rx: b_rx, timeout },
        )
    }

    /// One endpoint whose transmit line feeds its own receive line, like
    /// an external loopback jumper across a single UART.
    pub fn loopback(timeout: Duration) -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx, timeout }
    }
}

impl ByteChannel for MemoryLink {
    fn send(&mut self, byte: u8) -> Result<(), ChannelError> {
        self.tx.send(byte).map_err(|_| ChannelError::Disconnected)
    }

    fn receive(&mut self) -> Result<u8, ChannelError> {
        match self.rx.recv_timeout(self.timeout) {
            Ok(byte) => Ok(byte),
            Err(RecvTimeoutError::Timeout) => Err(ChannelError::Timeout {
                waited: self.timeout,
            }),
            Err(RecvTimeoutError::Disconnected) => Err(ChannelError::Disconnected),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHORT: Duration = Duration::from_millis(10);

    #[test]
    fn loopback_returns_what_was_sent() {
        let mut link = MemoryLink::loopback(SHORT);
        link.send(0xA5).unwrap();
        assert_eq!(link.receive().unwrap(), 0xA5);
    }

    #[test]
    fn pair_crosses_the_wires() {
        let (mut a, mut b) = MemoryLink::pair(SHORT);
        a.send(0x46).unwrap();
        b.send(0xF0).unwrap();
        assert_eq!(b.receive().unwrap(), 0x46);
        assert_eq!(a.receive().unwrap(), 0xF0);
    }

    #[test]
    fn starved_receive_times_out() {
        let mut link = MemoryLink::loopback(SHORT);
        match link.receive() {
            Err(ChannelError::Timeout { waited }) => assert_eq!(waited, SHORT),
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[test]
    fn dropped_peer_is_reported() {
        let (mut a, b) = MemoryLink::pair(SHORT);
        drop(b);
        assert!(matches!(a.send(0x00), Err(ChannelError::Disconnected)));
    }
}
