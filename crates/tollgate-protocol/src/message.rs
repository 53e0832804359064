//! Messages exchanged with the host authorization service.
//!
//! Inbound lines are interpreted exactly: `ACCESS_GRANTED` and `ACCESS_DENIED`
//! are the only commands, matched case-sensitively. Anything else is kept as
//! [`Inbound::Unrecognized`] so the caller can log it and move on.

use std::fmt;
use tollgate_core::{
    CanonicalUid, Outcome,
    constants::{CMD_ACCESS_DENIED, CMD_ACCESS_GRANTED, READY_ANNOUNCEMENT, UID_PREFIX},
};

use crate::framer::Line;

/// Decision command sent by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostCommand {
    AccessGranted,
    AccessDenied,
}

impl HostCommand {
    /// Parse a complete line. Matching is exact and case-sensitive.
    ///
    /// ```
    /// use tollgate_protocol::HostCommand;
    ///
    /// assert_eq!(HostCommand::parse("ACCESS_GRANTED"), Some(HostCommand::AccessGranted));
    /// assert_eq!(HostCommand::parse("access_granted"), None);
    /// ```
    pub fn parse(line: &str) -> Option<Self> {
        match line {
            CMD_ACCESS_GRANTED => Some(HostCommand::AccessGranted),
            CMD_ACCESS_DENIED => Some(HostCommand::AccessDenied),
            _ => None,
        }
    }

    /// Wire text of the command, without terminator.
    pub fn as_str(self) -> &'static str {
        match self {
            HostCommand::AccessGranted => CMD_ACCESS_GRANTED,
            HostCommand::AccessDenied => CMD_ACCESS_DENIED,
        }
    }

    /// Authorization outcome carried by this command.
    pub fn outcome(self) -> Outcome {
        match self {
            HostCommand::AccessGranted => Outcome::Granted,
            HostCommand::AccessDenied => Outcome::Denied,
        }
    }
}

impl From<Outcome> for HostCommand {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Granted => HostCommand::AccessGranted,
            Outcome::Denied => HostCommand::AccessDenied,
        }
    }
}

impl fmt::Display for HostCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A complete inbound line, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// A recognized host decision.
    Command(HostCommand),

    /// Any other line; ignored by the controller.
    Unrecognized(Line),
}

impl From<Line> for Inbound {
    fn from(line: Line) -> Self {
        match HostCommand::parse(line.as_str()) {
            Some(command) => Inbound::Command(command),
            None => Inbound::Unrecognized(line),
        }
    }
}

/// Message sent by the controller to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerMessage {
    /// Startup readiness line; human-readable only.
    Ready,

    /// Announcement of a freshly scanned card: `UID:C0 5F 6E 1D`.
    Uid(CanonicalUid),
}

impl ControllerMessage {
    /// Wire text of the message, without terminator.
    ///
    /// ```
    /// use tollgate_core::Uid;
    /// use tollgate_protocol::ControllerMessage;
    ///
    /// let uid = Uid::new(vec![0x01, 0x02]).unwrap();
    /// let msg = ControllerMessage::Uid(uid.canonical());
    /// assert_eq!(msg.to_line(), "UID:01 02");
    /// ```
    pub fn to_line(&self) -> String {
        match self {
            ControllerMessage::Ready => READY_ANNOUNCEMENT.to_string(),
            ControllerMessage::Uid(uid) => format!("{UID_PREFIX}{uid}"),
        }
    }

    /// Parse a line written by the controller, as the host side would.
    ///
    /// `UID:` lines whose payload is not exactly canonical are rejected:
    /// no surrounding spaces, uppercase hex only.
    pub fn parse(line: &str) -> Option<Self> {
        if line == READY_ANNOUNCEMENT {
            return Some(ControllerMessage::Ready);
        }
        let payload = line.strip_prefix(UID_PREFIX)?;
        CanonicalUid::parse(payload)
            .ok()
            .filter(|uid| uid.as_str() == payload)
            .map(ControllerMessage::Uid)
    }
}

impl fmt::Display for ControllerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_line())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tollgate_core::Uid;

    #[rstest]
    #[case("ACCESS_GRANTED", Some(HostCommand::AccessGranted))]
    #[case("ACCESS_DENIED", Some(HostCommand::AccessDenied))]
    #[case("access_granted", None)]
    #[case("ACCESS_GRANTED ", None)]
    #[case(" ACCESS_DENIED", None)]
    #[case("", None)]
    #[case("UID:01 02", None)]
    fn test_host_command_parse(#[case] line: &str, #[case] expected: Option<HostCommand>) {
        assert_eq!(HostCommand::parse(line), expected);
    }

    #[test]
    fn test_host_command_outcome() {
        assert_eq!(HostCommand::AccessGranted.outcome(), Outcome::Granted);
        assert_eq!(HostCommand::AccessDenied.outcome(), Outcome::Denied);
        assert_eq!(HostCommand::from(Outcome::Denied), HostCommand::AccessDenied);
    }

    #[test]
    fn test_inbound_classification() {
        assert_eq!(
            Inbound::from(Line::from("ACCESS_DENIED")),
            Inbound::Command(HostCommand::AccessDenied)
        );
        assert_eq!(
            Inbound::from(Line::from("access_granted")),
            Inbound::Unrecognized(Line::from("access_granted"))
        );
    }

    #[test]
    fn test_controller_message_lines() {
        let uid = Uid::new(vec![0xC0, 0x5F, 0x6E, 0x1D]).unwrap();
        assert_eq!(
            ControllerMessage::Uid(uid.canonical()).to_line(),
            "UID:C0 5F 6E 1D"
        );
        assert_eq!(
            ControllerMessage::Ready.to_line(),
            "System Ready. Waiting for card..."
        );
    }

    #[rstest]
    #[case("UID:01 02", true)]
    #[case("UID: 01 02", false)]
    #[case("UID:01 02 ", false)]
    #[case("UID:c0 5f 6e 1d", false)]
    #[case("UID:", false)]
    #[case("ACCESS_GRANTED", false)]
    fn test_controller_message_parse(#[case] line: &str, #[case] is_uid: bool) {
        let parsed = ControllerMessage::parse(line);
        assert_eq!(matches!(parsed, Some(ControllerMessage::Uid(_))), is_uid);
    }
}
