// Serial transport for the bluetooth link (RFCOMM device node).

use std::collections::VecDeque;
use std::io::{Read, Write};
use std::time::Duration;

use serialport::SerialPort;
use tracing::debug;

use super::frame;
use super::{Link, LinkError, RawSample};

/// Default serial configuration for the HC-05 link
pub const DEFAULT_BAUDRATE: u32 = 115_200;
pub const DEFAULT_TIMEOUT_MS: u64 = 100;

/// Serial-port implementation of the bot link.
pub struct SerialLink {
    port: Box<dyn SerialPort>,
    pending: VecDeque<u8>,
}

impl SerialLink {
    /// Open the link on the given device node.
    pub fn open(port_name: &str) -> Result<Self, LinkError> {
        Self::open_with_baudrate(port_name, DEFAULT_BAUDRATE)
    }

    /// Open with custom baudrate
    pub fn open_with_baudrate(port_name: &str, baudrate: u32) -> Result<Self, LinkError> {
        let port = serialport::new(port_name, baudrate)
            .timeout(Duration::from_millis(DEFAULT_TIMEOUT_MS))
            .open()?;

        Ok(Self {
            port,
            pending: VecDeque::new(),
        })
    }
}

impl Link for SerialLink {
    fn read_last(&mut self) -> Result<Option<RawSample>, LinkError> {
        // Drain whatever has arrived without blocking the tick.
        let available = self.port.bytes_to_read()? as usize;
        if available > 0 {
            let mut buf = vec![0u8; available];
            self.port.read_exact(&mut buf)?;
            self.pending.extend(buf);
        }

        // Several frames may have queued up between ticks; only the newest
        // matters.
        let mut last = None;
        while let Some(sample) = frame::take_sample(&mut self.pending) {
            last = Some(sample);
        }
        if let Some(sample) = last {
            debug!("orientation sample: {:?}", sample);
        }
        Ok(last)
    }

    fn write(&mut self, word: u8) -> Result<(), LinkError> {
        self.port.write_all(&[word])?;
        self.port.flush()?;
        Ok(())
    }
}
