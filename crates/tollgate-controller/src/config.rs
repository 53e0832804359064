//! Controller configuration.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//! use tollgate_controller::{AuthMode, ControllerConfig};
//!
//! let config = ControllerConfig::builder()
//!     .local_reference("c0 5f 6e 1d")
//!     .poll_interval(Duration::from_millis(10))
//!     .build()
//!     .unwrap();
//!
//! assert!(matches!(config.mode(), AuthMode::Local { .. }));
//! assert_eq!(config.timings().gate_dwell, Duration::from_secs(5));
//! ```

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tollgate_core::{
    CanonicalUid, Error, Result,
    constants::{
        DEFAULT_POLL_INTERVAL_MS, DENY_HOLD_MS, DENY_TONE_HZ, DENY_TONE_MS, GATE_DWELL_MS,
        GRANT_TONE_HZ, GRANT_TONE_MS, MSG_INSUFFICIENT_BALANCE, MSG_UNKNOWN_CARD,
    },
};

/// How long the reader stays paused after a UID is sent to the host.
pub const DEFAULT_HOST_RESPONSE_WINDOW_MS: u64 = 1000;

/// Where authorization decisions come from.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum AuthMode {
    /// Compare every card against one reference UID.
    Local { reference: CanonicalUid },

    /// Send every card to the host and wait for its decision line.
    #[default]
    Remote,
}

impl AuthMode {
    /// Second line of the denied screen for this mode.
    pub fn denial_reason(&self) -> &'static str {
        match self {
            AuthMode::Local { .. } => MSG_UNKNOWN_CARD,
            AuthMode::Remote => MSG_INSUFFICIENT_BALANCE,
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, AuthMode::Remote)
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMode::Local { .. } => write!(f, "local"),
            AuthMode::Remote => write!(f, "remote"),
        }
    }
}

/// Tones and durations of the actuation sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceTimings {
    pub grant_tone_hz: u16,
    pub grant_tone: Duration,
    /// Time the gate stays open.
    pub gate_dwell: Duration,
    pub deny_tone_hz: u16,
    pub deny_tone: Duration,
    /// Time the denial message stays up after the tone.
    pub deny_hold: Duration,
    /// Remote mode: time spent in `Processing` after sending a UID, during
    /// which a decision is applied directly.
    pub host_response_window: Duration,
}

impl Default for SequenceTimings {
    fn default() -> Self {
        Self {
            grant_tone_hz: GRANT_TONE_HZ,
            grant_tone: Duration::from_millis(GRANT_TONE_MS),
            gate_dwell: Duration::from_millis(GATE_DWELL_MS),
            deny_tone_hz: DENY_TONE_HZ,
            deny_tone: Duration::from_millis(DENY_TONE_MS),
            deny_hold: Duration::from_millis(DENY_HOLD_MS),
            host_response_window: Duration::from_millis(DEFAULT_HOST_RESPONSE_WINDOW_MS),
        }
    }
}

/// Complete controller configuration. Fixed for the lifetime of a controller.
///
/// Deserialization runs the same checks as [`ControllerConfigBuilder::build`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawControllerConfig")]
pub struct ControllerConfig {
    mode: AuthMode,
    timings: SequenceTimings,
    poll_interval: Duration,
}

/// Unvalidated wire form of [`ControllerConfig`].
#[derive(Deserialize)]
struct RawControllerConfig {
    mode: AuthMode,
    #[serde(default)]
    timings: SequenceTimings,
    poll_interval: Duration,
}

impl TryFrom<RawControllerConfig> for ControllerConfig {
    type Error = Error;

    fn try_from(raw: RawControllerConfig) -> Result<Self> {
        let builder = match raw.mode {
            AuthMode::Local { reference } => {
                ControllerConfigBuilder::default().local_reference(reference.as_str())
            }
            AuthMode::Remote => ControllerConfigBuilder::default().remote(),
        };
        builder
            .timings(raw.timings)
            .poll_interval(raw.poll_interval)
            .build()
    }
}

impl ControllerConfig {
    pub fn builder() -> ControllerConfigBuilder {
        ControllerConfigBuilder::default()
    }

    /// Local mode with `reference` and default timings.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidUidFormat` if `reference` is not a canonical UID.
    pub fn local(reference: &str) -> Result<Self> {
        Self::builder().local_reference(reference).build()
    }

    /// Remote mode with default timings.
    pub fn remote() -> Self {
        Self {
            mode: AuthMode::Remote,
            timings: SequenceTimings::default(),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }

    pub fn mode(&self) -> &AuthMode {
        &self.mode
    }

    pub fn timings(&self) -> &SequenceTimings {
        &self.timings
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::remote()
    }
}

/// Builder for [`ControllerConfig`].
#[derive(Debug, Default)]
pub struct ControllerConfigBuilder {
    reference: Option<String>,
    timings: Option<SequenceTimings>,
    poll_interval: Option<Duration>,
}

impl ControllerConfigBuilder {
    /// Select Local mode with this reference UID (`"C0 5F 6E 1D"`, any case).
    pub fn local_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// Select Remote mode. This is the default.
    pub fn remote(mut self) -> Self {
        self.reference = None;
        self
    }

    pub fn timings(mut self, timings: SequenceTimings) -> Self {
        self.timings = Some(timings);
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    /// Validate and build.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidUidFormat` for a malformed reference UID and
    /// `Error::Config` for a zero poll interval.
    pub fn build(self) -> Result<ControllerConfig> {
        let mode = match self.reference {
            Some(reference) => AuthMode::Local {
                reference: CanonicalUid::parse(&reference)?,
            },
            None => AuthMode::Remote,
        };

        let poll_interval = self
            .poll_interval
            .unwrap_or(Duration::from_millis(DEFAULT_POLL_INTERVAL_MS));
        if poll_interval.is_zero() {
            return Err(Error::Config("poll interval must be non-zero".into()));
        }

        Ok(ControllerConfig {
            mode,
            timings: self.timings.unwrap_or_default(),
            poll_interval,
        })
    }
}
