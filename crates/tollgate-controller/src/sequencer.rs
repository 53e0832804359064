//! Actuation sequencer.
//!
//! Turns card detections and authorization outcomes into timed display, tone
//! and gate actions. Nothing here blocks: each step stores the instant it
//! ends, and [`Sequencer::advance`] emits the actions of every step whose
//! deadline has passed. The caller applies the returned [`Action`]s to the
//! peripherals.
//!
//! # Sequences
//!
//! ```text
//! Granted  t=0      show "Access Granted / Gate Opening...", tone 500 Hz
//!          t=300ms  stop tone, gate Open
//!          t=5.3s   gate Closed, ready banner, Idle
//!
//! Denied   t=0      show "Access Denied / <reason>", tone 300 Hz
//!          t=1s     stop tone
//!          t=4s     ready banner, Idle
//! ```
//!
//! Each deadline is measured from the previous one, so a late loop iteration
//! does not stretch the total.

use std::time::Duration;

use tokio::time::Instant;
use tollgate_core::{
    GatePosition, Outcome, Result,
    constants::{
        MSG_ACCESS_DENIED, MSG_ACCESS_GRANTED, MSG_BANNER_READY, MSG_BANNER_TITLE,
        MSG_CARD_DETECTED, MSG_GATE_OPENING, MSG_PROCESSING,
    },
};
use tracing::{debug, info};

use crate::config::SequenceTimings;
use crate::state_machine::{GateState, StateMachine, StateTransition};

/// A side effect on a feedback surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Show(&'static str, &'static str),
    PlayTone { freq_hz: u16, duration: Duration },
    StopTone,
    SetGate(GatePosition),
}

impl Action {
    /// The ready banner.
    pub const BANNER: Action = Action::Show(MSG_BANNER_TITLE, MSG_BANNER_READY);
}

/// Step currently waiting on a deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing scheduled.
    Idle,
    /// Card detected, resolution in progress.
    Processing,
    /// UID sent to the host; a decision is applied directly until the deadline.
    AwaitingHost { until: Instant },
    GrantTone { until: Instant },
    GateOpen { until: Instant },
    DenyTone { until: Instant },
    DenyHold { until: Instant },
}

impl Phase {
    fn deadline(&self) -> Option<Instant> {
        match *self {
            Phase::Idle | Phase::Processing => None,
            Phase::AwaitingHost { until }
            | Phase::GrantTone { until }
            | Phase::GateOpen { until }
            | Phase::DenyTone { until }
            | Phase::DenyHold { until } => Some(until),
        }
    }
}

/// Deadline-driven actuation sequencer.
#[derive(Debug)]
pub struct Sequencer {
    timings: SequenceTimings,
    machine: StateMachine,
    phase: Phase,
    gate: GatePosition,
}

impl Sequencer {
    pub fn new(timings: SequenceTimings) -> Self {
        Self {
            timings,
            machine: StateMachine::new(),
            phase: Phase::Idle,
            gate: GatePosition::Closed,
        }
    }

    pub fn state(&self) -> GateState {
        self.machine.current_state()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Gate position as last commanded.
    pub fn gate(&self) -> GatePosition {
        self.gate
    }

    pub fn machine(&self) -> &StateMachine {
        &self.machine
    }

    /// Returns `true` when the card reader may be polled.
    pub fn is_idle(&self) -> bool {
        self.state() == GateState::Idle
    }

    /// Returns `true` while a host decision can start a sequence.
    pub fn accepts_decision(&self) -> bool {
        matches!(self.phase, Phase::Idle | Phase::AwaitingHost { .. })
    }

    /// Power-on actions: gate closed, buzzer silent, ready banner.
    pub fn startup(&mut self) -> Vec<Action> {
        self.gate = GatePosition::Closed;
        vec![
            Action::SetGate(GatePosition::Closed),
            Action::StopTone,
            Action::BANNER,
        ]
    }

    /// `Idle → Processing` on a new card.
    pub fn begin_processing(&mut self) -> Result<Vec<Action>> {
        self.transition(GateState::Processing)?;
        self.phase = Phase::Processing;
        Ok(vec![Action::Show(MSG_CARD_DETECTED, MSG_PROCESSING)])
    }

    /// Keep `Processing` open for the host response window after a UID was sent.
    pub fn await_host(&mut self, now: Instant) {
        if self.phase == Phase::Processing {
            self.phase = Phase::AwaitingHost {
                until: now + self.timings.host_response_window,
            };
        }
    }

    /// `Processing → Idle` without an outcome, showing the ready banner.
    pub fn hand_off(&mut self) -> Result<Vec<Action>> {
        self.transition(GateState::Idle)?;
        self.phase = Phase::Idle;
        Ok(vec![Action::BANNER])
    }

    /// Start the sequence for `outcome`, from `Processing` or (for a late
    /// host decision) from `Idle`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidStateTransition` if a sequence is already
    /// running; the running sequence is not disturbed.
    pub fn start(
        &mut self,
        outcome: Outcome,
        denial_reason: &'static str,
        now: Instant,
    ) -> Result<Vec<Action>> {
        self.transition(GateState::from(outcome))?;

        let actions = match outcome {
            Outcome::Granted => {
                self.phase = Phase::GrantTone {
                    until: now + self.timings.grant_tone,
                };
                vec![
                    Action::Show(MSG_ACCESS_GRANTED, MSG_GATE_OPENING),
                    Action::PlayTone {
                        freq_hz: self.timings.grant_tone_hz,
                        duration: self.timings.grant_tone,
                    },
                ]
            }
            Outcome::Denied => {
                self.phase = Phase::DenyTone {
                    until: now + self.timings.deny_tone,
                };
                vec![
                    Action::Show(MSG_ACCESS_DENIED, denial_reason),
                    Action::PlayTone {
                        freq_hz: self.timings.deny_tone_hz,
                        duration: self.timings.deny_tone,
                    },
                ]
            }
        };

        info!(outcome = %outcome, "Actuation sequence started");
        Ok(actions)
    }

    /// Emit the actions of every step whose deadline is at or before `now`.
    pub fn advance(&mut self, now: Instant) -> Result<Vec<Action>> {
        let mut actions = Vec::new();

        while let Some(until) = self.phase.deadline() {
            if now < until {
                break;
            }

            match self.phase {
                Phase::AwaitingHost { .. } => {
                    debug!("Host response window elapsed");
                    actions.extend(self.hand_off()?);
                }
                Phase::GrantTone { .. } => {
                    actions.push(Action::StopTone);
                    actions.push(Action::SetGate(GatePosition::Open));
                    self.gate = GatePosition::Open;
                    self.phase = Phase::GateOpen {
                        until: until + self.timings.gate_dwell,
                    };
                }
                Phase::GateOpen { .. } => {
                    actions.push(Action::SetGate(GatePosition::Closed));
                    self.gate = GatePosition::Closed;
                    actions.push(Action::BANNER);
                    self.finish()?;
                }
                Phase::DenyTone { .. } => {
                    actions.push(Action::StopTone);
                    self.phase = Phase::DenyHold {
                        until: until + self.timings.deny_hold,
                    };
                }
                Phase::DenyHold { .. } => {
                    actions.push(Action::BANNER);
                    self.finish()?;
                }
                Phase::Idle | Phase::Processing => break,
            }
        }

        Ok(actions)
    }

    fn finish(&mut self) -> Result<()> {
        let elapsed = self.machine.time_in_current_state();
        let transition = self.transition(GateState::Idle)?;
        self.phase = Phase::Idle;
        info!(
            outcome = %transition.from,
            elapsed_ms = elapsed.as_millis() as u64,
            "Actuation sequence complete"
        );
        Ok(())
    }

    fn transition(&mut self, to: GateState) -> Result<StateTransition> {
        let transition = self.machine.transition_to(to)?;
        debug!(from = %transition.from, to = %transition.to, "State transition");
        Ok(transition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tollgate_core::constants::MSG_UNKNOWN_CARD;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    fn sequencer() -> (Sequencer, Instant) {
        (Sequencer::new(SequenceTimings::default()), Instant::now())
    }

    #[test]
    fn test_startup_actions() {
        let (mut seq, _) = sequencer();
        assert_eq!(
            seq.startup(),
            vec![
                Action::SetGate(GatePosition::Closed),
                Action::StopTone,
                Action::BANNER
            ]
        );
        assert!(seq.is_idle());
    }

    #[test]
    fn test_granted_sequence() {
        let (mut seq, t0) = sequencer();
        seq.begin_processing().unwrap();
        let actions = seq.start(Outcome::Granted, MSG_UNKNOWN_CARD, t0).unwrap();
        assert_eq!(
            actions,
            vec![
                Action::Show("Access Granted", "Gate Opening..."),
                Action::PlayTone {
                    freq_hz: 500,
                    duration: ms(300)
                },
            ]
        );
        assert_eq!(seq.state(), GateState::Granted);

        assert!(seq.advance(t0 + ms(299)).unwrap().is_empty());
        assert_eq!(
            seq.advance(t0 + ms(300)).unwrap(),
            vec![Action::StopTone, Action::SetGate(GatePosition::Open)]
        );
        assert_eq!(seq.gate(), GatePosition::Open);

        assert!(seq.advance(t0 + ms(5299)).unwrap().is_empty());
        assert_eq!(
            seq.advance(t0 + ms(5300)).unwrap(),
            vec![Action::SetGate(GatePosition::Closed), Action::BANNER]
        );
        assert_eq!(seq.gate(), GatePosition::Closed);
        assert!(seq.is_idle());
        assert_eq!(seq.phase(), Phase::Idle);
    }

    #[test]
    fn test_denied_sequence_never_moves_gate() {
        let (mut seq, t0) = sequencer();
        seq.begin_processing().unwrap();
        let actions = seq.start(Outcome::Denied, MSG_UNKNOWN_CARD, t0).unwrap();
        assert_eq!(actions[0], Action::Show("Access Denied", "Unknown Card"));
        assert_eq!(
            actions[1],
            Action::PlayTone {
                freq_hz: 300,
                duration: ms(1000)
            }
        );

        assert_eq!(seq.advance(t0 + ms(1000)).unwrap(), vec![Action::StopTone]);
        assert!(seq.advance(t0 + ms(3999)).unwrap().is_empty());
        assert_eq!(seq.advance(t0 + ms(4000)).unwrap(), vec![Action::BANNER]);
        assert!(seq.is_idle());
        assert_eq!(seq.gate(), GatePosition::Closed);
    }

    #[test]
    fn test_late_advance_catches_up() {
        let (mut seq, t0) = sequencer();
        seq.begin_processing().unwrap();
        seq.start(Outcome::Granted, MSG_UNKNOWN_CARD, t0).unwrap();

        let actions = seq.advance(t0 + ms(10_000)).unwrap();
        assert_eq!(
            actions,
            vec![
                Action::StopTone,
                Action::SetGate(GatePosition::Open),
                Action::SetGate(GatePosition::Closed),
                Action::BANNER,
            ]
        );
        assert!(seq.is_idle());
    }

    #[test]
    fn test_running_sequence_cannot_be_restarted() {
        let (mut seq, t0) = sequencer();
        seq.begin_processing().unwrap();
        seq.start(Outcome::Granted, MSG_UNKNOWN_CARD, t0).unwrap();

        assert!(!seq.accepts_decision());
        assert!(seq.start(Outcome::Denied, MSG_UNKNOWN_CARD, t0).is_err());
        assert!(seq.begin_processing().is_err());
        assert_eq!(seq.state(), GateState::Granted);
        assert!(matches!(seq.phase(), Phase::GrantTone { .. }));
    }

    #[test]
    fn test_host_window_hand_off() {
        let (mut seq, t0) = sequencer();
        seq.begin_processing().unwrap();
        seq.await_host(t0);
        assert!(seq.accepts_decision());
        assert_eq!(seq.state(), GateState::Processing);

        assert!(seq.advance(t0 + ms(999)).unwrap().is_empty());
        assert_eq!(seq.advance(t0 + ms(1000)).unwrap(), vec![Action::BANNER]);
        assert!(seq.is_idle());
    }

    #[test]
    fn test_decision_inside_host_window() {
        let (mut seq, t0) = sequencer();
        seq.begin_processing().unwrap();
        seq.await_host(t0);

        seq.start(Outcome::Granted, MSG_UNKNOWN_CARD, t0 + ms(200))
            .unwrap();
        let history = seq.machine().history();
        assert_eq!(history.back().unwrap().from, GateState::Processing);
        assert_eq!(history.back().unwrap().to, GateState::Granted);
        // The window deadline is gone; only the tone deadline remains.
        assert_eq!(
            seq.phase(),
            Phase::GrantTone {
                until: t0 + ms(500)
            }
        );
    }

    #[test]
    fn test_decision_from_idle() {
        let (mut seq, t0) = sequencer();
        seq.start(Outcome::Denied, MSG_UNKNOWN_CARD, t0).unwrap();
        assert_eq!(seq.state(), GateState::Denied);
    }

    #[test]
    fn test_repeated_sequences_return_gate_closed() {
        let (mut seq, mut now) = sequencer();
        for outcome in [Outcome::Granted, Outcome::Denied, Outcome::Granted] {
            seq.begin_processing().unwrap();
            seq.start(outcome, MSG_UNKNOWN_CARD, now).unwrap();
            now += ms(6000);
            seq.advance(now).unwrap();
            assert!(seq.is_idle());
            assert_eq!(seq.gate(), GatePosition::Closed);
        }
        assert_eq!(seq.machine().history().len(), 9);
    }
}
