//! Host line protocol: byte framing, message types and the tokio codec.

pub mod codec;
pub mod framer;
pub mod message;

pub use codec::HostCodec;
pub use framer::{Line, LineFramer};
pub use message::{ControllerMessage, HostCommand, Inbound};
