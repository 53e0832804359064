//! Gate state machine.
//!
//! Tracks which of the four controller states is active, validates every
//! transition and keeps a bounded history for diagnostics.
//!
//! # State Flow
//!
//! ```text
//! Idle        ──card detected──────> Processing
//! Processing  ──outcome────────────> Granted | Denied
//! Processing  ──host hand-off──────> Idle
//! Idle        ──host decision──────> Granted | Denied
//! Granted     ──sequence complete──> Idle
//! Denied      ──sequence complete──> Idle
//! ```
//!
//! `Idle → Granted | Denied` is only taken by a host decision that arrives
//! after the hand-off; a card never skips `Processing`.
//!
//! # Examples
//!
//! ```
//! use tollgate_controller::{GateState, StateMachine};
//!
//! let mut machine = StateMachine::new();
//! machine.transition_to(GateState::Processing).unwrap();
//! machine.transition_to(GateState::Granted).unwrap();
//! machine.transition_to(GateState::Idle).unwrap();
//!
//! assert_eq!(machine.history().len(), 3);
//! assert!(machine.transition_to(GateState::Denied).is_ok());
//! assert!(machine.transition_to(GateState::Granted).is_err());
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tollgate_core::{Error, Outcome, Result};

/// Maximum number of transitions kept in history.
const MAX_HISTORY_SIZE: usize = 100;

/// Controller state. Exactly one is active at any instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateState {
    /// Ready banner shown, card reader polled.
    #[default]
    Idle,

    /// A card was detected and its authorization is being resolved.
    Processing,

    /// Granted sequence running: tone, gate open, dwell, gate closed.
    Granted,

    /// Denied sequence running: tone, message hold.
    Denied,
}

impl fmt::Display for GateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state_str = match self {
            GateState::Idle => "Idle",
            GateState::Processing => "Processing",
            GateState::Granted => "Granted",
            GateState::Denied => "Denied",
        };
        write!(f, "{}", state_str)
    }
}

impl From<Outcome> for GateState {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Granted => GateState::Granted,
            Outcome::Denied => GateState::Denied,
        }
    }
}

impl GateState {
    /// Check whether a transition to `target` is valid.
    pub fn can_transition_to(&self, target: &GateState) -> bool {
        matches!(
            (self, target),
            // From Idle
            (GateState::Idle, GateState::Processing)
            | (GateState::Idle, GateState::Granted | GateState::Denied)
            // From Processing
            | (GateState::Processing, GateState::Granted | GateState::Denied)
            | (GateState::Processing, GateState::Idle)
            // Sequences always end in Idle
            | (GateState::Granted | GateState::Denied, GateState::Idle)
        )
    }
}

/// Record of one state change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransition {
    pub from: GateState,

    pub to: GateState,

    #[serde(skip, default = "Instant::now")]
    pub timestamp: Instant,
}

impl StateTransition {
    pub fn new(from: GateState, to: GateState) -> Self {
        Self {
            from,
            to,
            timestamp: Instant::now(),
        }
    }
}

/// Validating state holder with transition history.
#[derive(Debug)]
pub struct StateMachine {
    current_state: GateState,

    state_entered_at: Instant,

    history: VecDeque<StateTransition>,
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            current_state: GateState::Idle,
            state_entered_at: Instant::now(),
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
        }
    }

    pub fn current_state(&self) -> GateState {
        self.current_state
    }

    pub fn time_in_current_state(&self) -> Duration {
        self.state_entered_at.elapsed()
    }

    pub fn history(&self) -> &VecDeque<StateTransition> {
        &self.history
    }

    /// The most recent `count` transitions, oldest first.
    pub fn last_transitions(&self, count: usize) -> Vec<StateTransition> {
        self.history
            .iter()
            .rev()
            .take(count)
            .rev()
            .cloned()
            .collect()
    }

    /// Move to `new_state`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidStateTransition` without changing state if the
    /// transition is not allowed.
    pub fn transition_to(&mut self, new_state: GateState) -> Result<StateTransition> {
        if !self.current_state.can_transition_to(&new_state) {
            return Err(Error::InvalidStateTransition {
                from: self.current_state.to_string(),
                to: new_state.to_string(),
            });
        }

        let transition = StateTransition::new(self.current_state, new_state);
        self.current_state = new_state;
        self.state_entered_at = transition.timestamp;
        self.add_to_history(transition.clone());

        Ok(transition)
    }

    fn add_to_history(&mut self, transition: StateTransition) {
        self.history.push_back(transition);
        while self.history.len() > MAX_HISTORY_SIZE {
            self.history.pop_front();
        }
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}
