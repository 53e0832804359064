//! Peripheral abstraction layer for the tollgate controller.
//!
//! This crate defines the traits the control loop drives (card reader, status
//! display, buzzer, gate servo and host link), the errors they raise, mock
//! implementations for running without hardware, and a serial-port host link
//! behind the `hardware-serial` feature.
//!
//! # Design
//!
//! - **Async-first**: every operation is a native `async fn` in a trait.
//! - **Non-blocking**: no operation waits on the physical world; timing
//!   belongs to the controller.
//! - **Thread-safe**: all traits require `Send + Sync` for use with Tokio.
//!
//! # Example
//!
//! ```no_run
//! use tollgate_core::GatePosition;
//! use tollgate_hardware::traits::{GateActuator, StatusDisplay};
//! use tollgate_hardware::Result;
//!
//! async fn open_gate<D: StatusDisplay, G: GateActuator>(lcd: &mut D, gate: &mut G) -> Result<()> {
//!     lcd.show_lines("Access Granted", "Gate Opening...").await?;
//!     gate.set_angle(GatePosition::Open).await
//! }
//! ```

pub mod devices;
pub mod error;
pub mod mock;
#[cfg(feature = "hardware-serial")]
pub mod serial;
pub mod traits;

pub use devices::AnyHostLink;
pub use error::{HardwareError, Result};
pub use traits::{CardReader, GateActuator, HostLink, StatusDisplay, ToneEmitter};

#[cfg(feature = "hardware-serial")]
pub use serial::SerialHostLink;
