//! Mock peripherals for development and testing without hardware.
//!
//! Each mock comes with a handle: the device half is handed to the controller,
//! the handle half drives inputs or observes outputs.

pub mod buzzer;
pub mod host;
pub mod lcd;
pub mod reader;
pub mod servo;

pub use buzzer::{MockBuzzer, MockBuzzerHandle, ToneCommand};
pub use host::{HostInjector, MockHostLink, MockHostLinkHandle};
pub use lcd::{LcdFrame, VirtualLcd, VirtualLcdHandle};
pub use reader::{MockCardReader, MockCardReaderHandle};
pub use servo::{MockServo, MockServoHandle};
