pub mod constants;
pub mod error;
pub mod types;
pub mod uid;

pub use error::{Error, Result};
pub use types::*;
pub use uid::{CanonicalUid, Uid, format_uid, format_uid_raw};
