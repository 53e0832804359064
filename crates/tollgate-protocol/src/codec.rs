//! Tokio codec for the host line protocol.
//!
//! `HostCodec` is the controller side of the link: it decodes host lines into
//! [`Inbound`] values and encodes [`ControllerMessage`]s with their line
//! terminator. Byte accumulation is delegated to [`LineFramer`], so a command
//! split across any number of reads decodes the same as one delivered whole.
//!
//! # Usage with Tokio Framed
//!
//! ```rust,no_run
//! use futures::{SinkExt, StreamExt};
//! use tokio::net::TcpStream;
//! use tokio_util::codec::Framed;
//! use tollgate_protocol::{ControllerMessage, HostCodec, Inbound};
//!
//! # async fn example() -> tollgate_core::Result<()> {
//! let stream = TcpStream::connect("127.0.0.1:7000").await?;
//! let mut framed = Framed::new(stream, HostCodec::new());
//!
//! framed.send(ControllerMessage::Ready).await?;
//! while let Some(inbound) = framed.next().await {
//!     if let Inbound::Command(command) = inbound? {
//!         println!("host decided: {command}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::{ControllerMessage, Inbound, LineFramer};
use tollgate_core::{Error, Result, constants::LINE_TERMINATOR};

/// Controller-side codec for the host link.
#[derive(Debug, Default)]
pub struct HostCodec {
    framer: LineFramer,
}

impl HostCodec {
    pub fn new() -> Self {
        Self {
            framer: LineFramer::new(),
        }
    }

    /// Bytes of a partial line held between calls to `decode`.
    pub fn pending_len(&self) -> usize {
        self.framer.pending_len()
    }
}

impl Decoder for HostCodec {
    type Item = Inbound;
    type Error = Error;

    /// Consume bytes until one line completes.
    ///
    /// Bytes after the first terminator are left in `src` for the next call.
    ///
    /// ```
    /// use bytes::BytesMut;
    /// use tokio_util::codec::Decoder;
    /// use tollgate_protocol::{HostCodec, HostCommand, Inbound};
    ///
    /// let mut codec = HostCodec::new();
    /// let mut buffer = BytesMut::from(&b"ACCESS_DEN"[..]);
    /// assert_eq!(codec.decode(&mut buffer).unwrap(), None);
    ///
    /// buffer.extend_from_slice(b"IED\n");
    /// assert_eq!(
    ///     codec.decode(&mut buffer).unwrap(),
    ///     Some(Inbound::Command(HostCommand::AccessDenied))
    /// );
    /// ```
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        while src.has_remaining() {
            if let Some(line) = self.framer.feed(src.get_u8()) {
                return Ok(Some(Inbound::from(line)));
            }
        }
        Ok(None)
    }
}

impl Encoder<ControllerMessage> for HostCodec {
    type Error = Error;

    fn encode(&mut self, item: ControllerMessage, dst: &mut BytesMut) -> Result<()> {
        let line = item.to_line();
        dst.reserve(line.len() + 1);
        dst.extend_from_slice(line.as_bytes());
        dst.extend_from_slice(&[LINE_TERMINATOR]);
        Ok(())
    }
}
