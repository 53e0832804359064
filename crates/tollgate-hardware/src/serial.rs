//! Host link over a real serial port.
//!
//! Opens the port at the configured baud rate (8N1, 9600 by default) and
//! reads only what the driver has already buffered, so a call never waits for
//! the host to finish a line.

use std::io::{Read, Write};
use std::sync::Mutex;
use std::time::Duration;

use bytes::BytesMut;
use serialport::SerialPort;
use tracing::{debug, info};

use crate::{HardwareError, Result, traits::HostLink};

/// Read/write timeout applied to the port; reads are sized to buffered bytes.
const PORT_TIMEOUT: Duration = Duration::from_millis(50);

/// Serial host link.
pub struct SerialHostLink {
    path: String,
    // `dyn SerialPort` is Send but not Sync.
    port: Mutex<Box<dyn SerialPort>>,
}

impl SerialHostLink {
    /// Open `path` at `baud_rate`.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::InitializationFailed` if the port cannot be opened.
    pub fn open(path: &str, baud_rate: u32) -> Result<Self> {
        let port = serialport::new(path, baud_rate)
            .timeout(PORT_TIMEOUT)
            .open()
            .map_err(|e| HardwareError::initialization_failed(format!("{path}: {e}")))?;

        info!(port = %path, baud_rate, "Serial host link opened");

        Ok(Self {
            path: path.to_string(),
            port: Mutex::new(port),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn port(&mut self) -> Result<&mut dyn SerialPort> {
        self.port
            .get_mut()
            .map(|port| port.as_mut())
            .map_err(|_| HardwareError::communication("serial port lock poisoned"))
    }
}

impl std::fmt::Debug for SerialHostLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialHostLink")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl HostLink for SerialHostLink {
    async fn read_available(&mut self, buf: &mut BytesMut) -> Result<usize> {
        let port = self.port()?;
        let available = port.bytes_to_read()? as usize;
        if available == 0 {
            return Ok(0);
        }

        let mut chunk = vec![0u8; available];
        let n = port.read(&mut chunk)?;
        buf.extend_from_slice(&chunk[..n]);
        debug!(bytes = n, "Read from serial host link");
        Ok(n)
    }

    async fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        let port = self.port()?;
        port.write_all(bytes)?;
        port.flush()?;
        Ok(())
    }
}
