//! In-memory host link.
//!
//! [`MockHostLink`] stands in for the serial port; [`MockHostLinkHandle`] plays
//! the host. Bytes injected by the handle become visible to the link in the
//! order they were sent, at most `rx_capacity` bytes per read, like a UART
//! receive buffer drained once per loop iteration.
//!
//! # Examples
//!
//! ```
//! use bytes::BytesMut;
//! use tollgate_hardware::mock::MockHostLink;
//! use tollgate_hardware::traits::HostLink;
//!
//! # #[tokio::main]
//! # async fn main() -> tollgate_hardware::Result<()> {
//! let (mut link, mut host) = MockHostLink::new();
//!
//! host.send_line("ACCESS_GRANTED")?;
//! let mut buf = BytesMut::new();
//! link.read_available(&mut buf).await?;
//! assert_eq!(&buf[..], b"ACCESS_GRANTED\n");
//!
//! link.write_all(b"UID:01 02\n").await?;
//! assert_eq!(host.take_lines(), vec!["UID:01 02".to_string()]);
//! # Ok(())
//! # }
//! ```

use bytes::{Bytes, BytesMut};
use tokio::sync::mpsc;
use tollgate_core::constants::LINE_TERMINATOR;
use tollgate_protocol::LineFramer;

use crate::{HardwareError, Result, traits::HostLink};

/// Receive buffer depth of the reference microcontroller UART.
pub const DEFAULT_RX_CAPACITY: usize = 64;

/// Link side of the in-memory host connection.
#[derive(Debug)]
pub struct MockHostLink {
    inbound_rx: mpsc::UnboundedReceiver<Bytes>,
    outbound_tx: mpsc::UnboundedSender<Bytes>,

    /// Received bytes not yet handed out by `read_available`.
    pending: BytesMut,
    rx_capacity: usize,
}

impl MockHostLink {
    pub fn new() -> (Self, MockHostLinkHandle) {
        Self::with_rx_capacity(DEFAULT_RX_CAPACITY)
    }

    /// Create a link that hands out at most `rx_capacity` bytes per read.
    pub fn with_rx_capacity(rx_capacity: usize) -> (Self, MockHostLinkHandle) {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

        let link = Self {
            inbound_rx,
            outbound_tx,
            pending: BytesMut::new(),
            rx_capacity: rx_capacity.max(1),
        };
        let handle = MockHostLinkHandle {
            injector: HostInjector { inbound_tx },
            outbound_rx,
            framer: LineFramer::new(),
        };

        (link, handle)
    }
}

impl HostLink for MockHostLink {
    async fn read_available(&mut self, buf: &mut BytesMut) -> Result<usize> {
        while self.pending.len() < self.rx_capacity {
            match self.inbound_rx.try_recv() {
                Ok(bytes) => self.pending.extend_from_slice(&bytes),
                // An idle or closed host both look like silence on the wire.
                Err(_) => break,
            }
        }

        let n = self.pending.len().min(self.rx_capacity);
        buf.extend_from_slice(&self.pending.split_to(n));
        Ok(n)
    }

    async fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        self.outbound_tx
            .send(Bytes::copy_from_slice(bytes))
            .map_err(|_| HardwareError::disconnected("mock host"))
    }
}

/// Cloneable sender of host-to-controller bytes.
#[derive(Debug, Clone)]
pub struct HostInjector {
    inbound_tx: mpsc::UnboundedSender<Bytes>,
}

impl HostInjector {
    /// Send raw bytes to the controller.
    pub fn send_bytes(&self, bytes: &[u8]) -> Result<()> {
        self.inbound_tx
            .send(Bytes::copy_from_slice(bytes))
            .map_err(|_| HardwareError::disconnected("mock host link"))
    }

    /// Send one line, appending the terminator.
    pub fn send_line(&self, line: &str) -> Result<()> {
        let mut bytes = Vec::with_capacity(line.len() + 1);
        bytes.extend_from_slice(line.as_bytes());
        bytes.push(LINE_TERMINATOR);
        self.send_bytes(&bytes)
    }
}

/// Host side of the in-memory connection.
#[derive(Debug)]
pub struct MockHostLinkHandle {
    injector: HostInjector,
    outbound_rx: mpsc::UnboundedReceiver<Bytes>,
    framer: LineFramer,
}

impl MockHostLinkHandle {
    /// A sender that can be moved to another task.
    pub fn injector(&self) -> HostInjector {
        self.injector.clone()
    }

    pub fn send_bytes(&self, bytes: &[u8]) -> Result<()> {
        self.injector.send_bytes(bytes)
    }

    pub fn send_line(&self, line: &str) -> Result<()> {
        self.injector.send_line(line)
    }

    /// Drain every complete line written by the controller so far.
    pub fn take_lines(&mut self) -> Vec<String> {
        while let Ok(bytes) = self.outbound_rx.try_recv() {
            self.framer.feed_slice(&bytes);
        }
        std::iter::from_fn(|| self.framer.next_line())
            .map(|line| line.into_string())
            .collect()
    }

    /// Wait for the next complete line written by the controller.
    ///
    /// Returns `None` once the link is dropped and no line is left.
    pub async fn recv_line(&mut self) -> Option<String> {
        loop {
            if let Some(line) = self.framer.next_line() {
                return Some(line.into_string());
            }
            let bytes = self.outbound_rx.recv().await?;
            self.framer.feed_slice(&bytes);
        }
    }
}
