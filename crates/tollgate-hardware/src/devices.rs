//! Enum wrapper for host link dispatch.
//!
//! Native `async fn` in traits is not object-safe, so `Box<dyn HostLink>` is
//! not an option. [`AnyHostLink`] selects the implementation at runtime while
//! keeping static dispatch inside each arm; the serial variant only exists
//! with the `hardware-serial` feature.
//!
//! # Examples
//!
//! ```
//! use tollgate_hardware::devices::AnyHostLink;
//! use tollgate_hardware::mock::MockHostLink;
//!
//! let (link, _host) = MockHostLink::new();
//! let link = AnyHostLink::Mock(link);
//! assert_eq!(link.kind(), "mock");
//! ```

use bytes::BytesMut;

use crate::Result;
use crate::mock::MockHostLink;
use crate::traits::HostLink;

#[cfg(feature = "hardware-serial")]
use crate::serial::SerialHostLink;

/// Host link selected at runtime.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyHostLink {
    Mock(MockHostLink),
    #[cfg(feature = "hardware-serial")]
    Serial(SerialHostLink),
}

impl AnyHostLink {
    /// Short name of the active implementation, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Mock(_) => "mock",
            #[cfg(feature = "hardware-serial")]
            Self::Serial(_) => "serial",
        }
    }
}

impl HostLink for AnyHostLink {
    async fn read_available(&mut self, buf: &mut BytesMut) -> Result<usize> {
        match self {
            Self::Mock(link) => link.read_available(buf).await,
            #[cfg(feature = "hardware-serial")]
            Self::Serial(link) => link.read_available(buf).await,
        }
    }

    async fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        match self {
            Self::Mock(link) => link.write_all(bytes).await,
            #[cfg(feature = "hardware-serial")]
            Self::Serial(link) => link.write_all(bytes).await,
        }
    }
}

impl From<MockHostLink> for AnyHostLink {
    fn from(link: MockHostLink) -> Self {
        Self::Mock(link)
    }
}

#[cfg(feature = "hardware-serial")]
impl From<SerialHostLink> for AnyHostLink {
    fn from(link: SerialHostLink) -> Self {
        Self::Serial(link)
    }
}
