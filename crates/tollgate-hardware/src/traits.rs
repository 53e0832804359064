//! Peripheral trait definitions.
//!
//! These traits are the contract between the gate controller and its
//! peripherals: the RFID card reader, the status LCD, the buzzer, the gate
//! servo and the serial link to the host. Mock implementations live in
//! [`mock`](crate::mock); real drivers plug in behind the same traits.
//!
//! All traits use native `async fn` methods (Rust 1.90 + Edition 2024 RPITIT).
//! They are therefore not object-safe; use generics, or the enum wrappers in
//! [`devices`](crate::devices) for dynamic selection.
//!
//! Every method returns promptly. None of them may wait for a card, a tone to
//! finish or the gate to move: the control loop owns all timing.

#![allow(async_fn_in_trait)]

use std::time::Duration;

use bytes::BytesMut;
use tollgate_core::{GatePosition, Uid};

use crate::error::Result;

/// RFID card reader.
///
/// # Examples
///
/// ```no_run
/// use tollgate_hardware::traits::CardReader;
/// use tollgate_hardware::Result;
/// use tollgate_core::Uid;
///
/// async fn poll<R: CardReader>(reader: &mut R) -> Result<Option<Uid>> {
///     if !reader.is_new_card_present().await? {
///         return Ok(None);
///     }
///     reader.read_uid().await.map(Some)
/// }
/// ```
pub trait CardReader: Send + Sync {
    /// Returns `true` when a card has entered the field since the last read.
    async fn is_new_card_present(&mut self) -> Result<bool>;

    /// Read the UID of the card reported by [`is_new_card_present`].
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::CardReadError` when the card left the field or
    /// the read otherwise failed.
    ///
    /// [`is_new_card_present`]: CardReader::is_new_card_present
    async fn read_uid(&mut self) -> Result<Uid>;
}

/// Two-line character display.
pub trait StatusDisplay: Send + Sync {
    /// Replace the whole screen with two lines of text.
    ///
    /// Lines longer than the display width are truncated by the device.
    async fn show_lines(&mut self, line0: &str, line1: &str) -> Result<()>;
}

/// Buzzer.
pub trait ToneEmitter: Send + Sync {
    /// Start a tone. The device may stop on its own after `duration`; the
    /// controller still calls [`stop`](ToneEmitter::stop) when the tone's
    /// deadline passes.
    async fn play_tone(&mut self, freq_hz: u16, duration: Duration) -> Result<()>;

    /// Silence the buzzer. Idempotent.
    async fn stop(&mut self) -> Result<()>;
}

/// Gate servo.
pub trait GateActuator: Send + Sync {
    /// Drive the servo to the angle of `position`. Idempotent.
    async fn set_angle(&mut self, position: GatePosition) -> Result<()>;
}

/// Byte link to the host authorization service.
pub trait HostLink: Send + Sync {
    /// Append every byte currently buffered by the link to `buf` without
    /// waiting for more, returning how many were read.
    async fn read_available(&mut self, buf: &mut BytesMut) -> Result<usize>;

    /// Write all of `bytes` to the link.
    async fn write_all(&mut self, bytes: &[u8]) -> Result<()>;
}
