use crate::constants::{GATE_CLOSED_ANGLE, GATE_OPEN_ANGLE};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of resolving a card's authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Granted,
    Denied,
}

impl Outcome {
    /// Map an equality check onto an outcome.
    #[inline]
    #[must_use]
    pub fn from_match(matched: bool) -> Self {
        if matched {
            Outcome::Granted
        } else {
            Outcome::Denied
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Outcome::Granted => write!(f, "Granted"),
            Outcome::Denied => write!(f, "Denied"),
        }
    }
}

/// Physical position of the gate arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum GatePosition {
    /// Arm down, servo at 0 degrees.
    #[default]
    Closed = GATE_CLOSED_ANGLE,
    /// Arm up, servo at 90 degrees.
    Open = GATE_OPEN_ANGLE,
}

impl GatePosition {
    /// Servo angle in degrees for this position.
    #[inline]
    #[must_use]
    pub fn angle(self) -> u8 {
        self as u8
    }

}

impl fmt::Display for GatePosition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GatePosition::Closed => write!(f, "Closed({}°)", self.angle()),
            GatePosition::Open => write!(f, "Open({}°)", self.angle()),
        }
    }
}
