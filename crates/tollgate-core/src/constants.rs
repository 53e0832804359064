//! Core constants for the tollgate controller.
//!
//! This module defines the wire-protocol literals, UID limits, actuation timings
//! and display texts shared by every crate in the workspace.
//!
//! # Host Protocol
//!
//! The host link carries newline-terminated ASCII lines, with no checksum and no
//! framing other than the terminator:
//!
//! ```text
//! controller -> host   UID:C0 5F 6E 1D\n
//! host -> controller   ACCESS_GRANTED\n | ACCESS_DENIED\n
//! ```
//!
//! # Usage
//!
//! ```
//! use tollgate_core::constants::*;
//! use std::time::Duration;
//!
//! assert_eq!(LINE_TERMINATOR, b'\n');
//! let dwell = Duration::from_millis(GATE_DWELL_MS);
//! assert_eq!(dwell.as_secs(), 5);
//! ```

// ============================================================================
// Host Protocol
// ============================================================================

/// Line terminator for every message on the host link.
pub const LINE_TERMINATOR: u8 = b'\n';

/// Optional carriage return preceding [`LINE_TERMINATOR`].
///
/// Hosts that write `\r\n` line endings are tolerated; the carriage return is
/// stripped before a line is interpreted.
pub const CARRIAGE_RETURN: u8 = b'\r';

/// Prefix of the UID announcement sent to the host in Remote mode.
///
/// # Examples
///
/// ```
/// use tollgate_core::constants::UID_PREFIX;
///
/// let line = format!("{UID_PREFIX}C0 5F 6E 1D");
/// assert_eq!(line, "UID:C0 5F 6E 1D");
/// ```
pub const UID_PREFIX: &str = "UID:";

/// Host decision granting passage.
pub const CMD_ACCESS_GRANTED: &str = "ACCESS_GRANTED";

/// Host decision refusing passage.
pub const CMD_ACCESS_DENIED: &str = "ACCESS_DENIED";

/// Human-readable line emitted once at startup. Not parsed by the host.
pub const READY_ANNOUNCEMENT: &str = "System Ready. Waiting for card...";

/// Default baud rate of the serial host link.
pub const DEFAULT_BAUD_RATE: u32 = 9600;

// ============================================================================
// UID Constraints
// ============================================================================

/// Minimum UID length in bytes.
///
/// ISO 14443 tags report 4, 7 or 10 byte UIDs, but the controller forwards
/// whatever the reader returns as long as it is not empty.
pub const MIN_UID_LENGTH: usize = 1;

/// Maximum UID length in bytes (ISO 14443 triple-size UID).
pub const MAX_UID_LENGTH: usize = 10;

// ============================================================================
// Gate
// ============================================================================

/// Servo angle for a closed gate (degrees).
pub const GATE_CLOSED_ANGLE: u8 = 0;

/// Servo angle for an open gate (degrees).
pub const GATE_OPEN_ANGLE: u8 = 90;

// ============================================================================
// Actuation Timings
// ============================================================================

/// Frequency of the success tone (Hz).
pub const GRANT_TONE_HZ: u16 = 500;

/// Duration of the success tone (milliseconds).
pub const GRANT_TONE_MS: u64 = 300;

/// Time the gate stays open after a granted outcome (milliseconds).
///
/// # Value: 5000ms
///
/// Long enough for a vehicle or person to pass before the gate closes again.
pub const GATE_DWELL_MS: u64 = 5000;

/// Frequency of the rejection tone (Hz).
pub const DENY_TONE_HZ: u16 = 300;

/// Duration of the rejection tone (milliseconds).
pub const DENY_TONE_MS: u64 = 1000;

/// Time the denial message stays on screen after the tone stops (milliseconds).
pub const DENY_HOLD_MS: u64 = 3000;

/// Default interval between two iterations of the control loop (milliseconds).
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 20;

// ============================================================================
// Display
// ============================================================================

/// Number of text rows on the status LCD.
pub const LCD_ROWS: usize = 2;

/// Number of characters per LCD row.
pub const LCD_COLUMNS: usize = 16;

/// First line of the ready banner.
pub const MSG_BANNER_TITLE: &str = "  Toll System   ";

/// Second line of the ready banner.
pub const MSG_BANNER_READY: &str = "Ready for cards ";

/// Shown while a freshly detected card is being resolved.
pub const MSG_CARD_DETECTED: &str = "Card Detected";

/// Second line shown while a card is being resolved.
pub const MSG_PROCESSING: &str = "Processing...";

/// First line of the granted screen.
pub const MSG_ACCESS_GRANTED: &str = "Access Granted";

/// Second line of the granted screen.
pub const MSG_GATE_OPENING: &str = "Gate Opening...";

/// First line of the denied screen.
pub const MSG_ACCESS_DENIED: &str = "Access Denied";

/// Denial reason when the host refused the card (Remote mode).
pub const MSG_INSUFFICIENT_BALANCE: &str = "Insuff. Balance";

/// Denial reason when the card does not match the reference UID (Local mode).
pub const MSG_UNKNOWN_CARD: &str = "Unknown Card";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_texts_fit_lcd() {
        for text in [
            MSG_BANNER_TITLE,
            MSG_BANNER_READY,
            MSG_CARD_DETECTED,
            MSG_PROCESSING,
            MSG_ACCESS_GRANTED,
            MSG_GATE_OPENING,
            MSG_ACCESS_DENIED,
            MSG_INSUFFICIENT_BALANCE,
            MSG_UNKNOWN_CARD,
        ] {
            assert!(text.len() <= LCD_COLUMNS, "'{text}' does not fit");
            assert!(text.is_ascii());
        }
    }

    #[test]
    fn test_uid_length_bounds() {
        assert!(MIN_UID_LENGTH < MAX_UID_LENGTH);
        assert_eq!(MAX_UID_LENGTH, 10);
    }

    #[test]
    fn test_granted_sequence_is_the_longest() {
        let granted = GRANT_TONE_MS + GATE_DWELL_MS;
        let denied = DENY_TONE_MS + DENY_HOLD_MS;
        assert!(granted > denied);
        assert_eq!(granted, 5300);
    }
}
