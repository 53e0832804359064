//! Gate controller for the tollgate access-control system.
//!
//! Ties a card reader, a status display, a buzzer, a gate servo and an
//! optional host link into one cooperative control loop. Authorization is
//! either local (one reference UID) or delegated to a host over a line
//! protocol; both modes share the same deadline-driven actuation sequences.
//!
//! # Example
//!
//! ```
//! use tollgate_controller::{Controller, ControllerConfig, GateState, Peripherals};
//! use tollgate_core::Uid;
//! use tollgate_hardware::mock::{MockBuzzer, MockCardReader, MockHostLink, MockServo, VirtualLcd};
//!
//! # #[tokio::main(flavor = "current_thread", start_paused = true)]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let (reader, cards) = MockCardReader::new();
//! let (display, lcd) = VirtualLcd::new();
//! let (tone, _buzzer) = MockBuzzer::new();
//! let (gate, _servo) = MockServo::new();
//! let (link, _host) = MockHostLink::new();
//!
//! let config = ControllerConfig::local("C0 5F 6E 1D")?;
//! let mut controller = Controller::new(
//!     config,
//!     Peripherals { reader, display, tone, gate, link },
//! );
//! controller.start().await?;
//!
//! cards.present_card(Uid::new(vec![0xC0, 0x5F, 0x6E, 0x1D])?).await?;
//! controller.poll_once().await?;
//!
//! assert_eq!(controller.state(), GateState::Granted);
//! assert!(lcd.current().shows("Access Granted", "Gate Opening..."));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod resolver;
pub mod sequencer;
pub mod state_machine;

pub use config::{AuthMode, ControllerConfig, ControllerConfigBuilder, SequenceTimings};
pub use controller::{Controller, Peripherals};
pub use error::{ControllerError, Result};
pub use resolver::{PendingRequest, Resolution, Resolver};
pub use sequencer::{Action, Phase, Sequencer};
pub use state_machine::{GateState, StateMachine, StateTransition};
