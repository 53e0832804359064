//! Card UIDs and their canonical string form.
//!
//! A UID is the identifier read from an ISO 14443 tag (up to 10 bytes). Both the
//! display and the host protocol use the same textual rendering: uppercase hex
//! byte pairs separated by single spaces, with no leading or trailing
//! separator.
//!
//! ```
//! use tollgate_core::uid::{Uid, format_uid, format_uid_raw};
//!
//! let bytes = [0xC0, 0x5F, 0x6E, 0x1D];
//! assert_eq!(format_uid_raw(&bytes), " C0 5F 6E 1D");
//! assert_eq!(format_uid(&bytes), "C0 5F 6E 1D");
//!
//! let uid = Uid::new(bytes.to_vec()).unwrap();
//! assert_eq!(uid.canonical().as_str(), "C0 5F 6E 1D");
//! ```

use std::fmt::{self, Write};

use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::{
    Result,
    constants::{MAX_UID_LENGTH, MIN_UID_LENGTH},
    error::Error,
};

/// Render UID bytes with one leading space before every byte pair.
///
/// The output is `3 * bytes.len()` characters long. Use [`format_uid`] for the
/// canonical form used in comparisons and on the wire.
pub fn format_uid_raw(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for byte in bytes {
        // Writing into a String cannot fail.
        let _ = write!(out, " {byte:02X}");
    }
    out
}

/// Render UID bytes in canonical form: `"C0 5F 6E 1D"`.
///
/// The output is `3 * bytes.len() - 1` characters long, or empty for empty
/// input.
pub fn format_uid(bytes: &[u8]) -> String {
    let mut raw = format_uid_raw(bytes);
    if !raw.is_empty() {
        raw.remove(0);
    }
    raw
}

/// Raw UID bytes read from a tag.
///
/// Immutable once read; lives for a single scan cycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Uid(Vec<u8>);

impl Uid {
    /// Create a UID, validating its length.
    ///
    /// # Errors
    /// Returns `Error::InvalidUidLength` if the UID is empty or longer than
    /// 10 bytes.
    pub fn new(bytes: Vec<u8>) -> Result<Self> {
        let len = bytes.len();
        if !(MIN_UID_LENGTH..=MAX_UID_LENGTH).contains(&len) {
            return Err(Error::InvalidUidLength {
                min: MIN_UID_LENGTH,
                max: MAX_UID_LENGTH,
                actual: len,
            });
        }
        Ok(Uid(bytes))
    }

    /// Parse a UID typed as hex, with or without separating spaces.
    ///
    /// Accepts `"C0 5F 6E 1D"`, `"c05f6e1d"` and `"C0:5F:6E:1D"`.
    ///
    /// # Errors
    /// Returns `Error::InvalidUidFormat` for non-hex input or an odd digit
    /// count, and `Error::InvalidUidLength` for a wrong byte count.
    pub fn from_hex(text: &str) -> Result<Self> {
        let digits: Vec<u8> = text
            .bytes()
            .filter(|b| !matches!(b, b' ' | b':' | b'-'))
            .collect();

        if digits.len() % 2 != 0 {
            return Err(Error::InvalidUidFormat(format!(
                "odd number of hex digits in '{text}'"
            )));
        }

        let bytes = digits
            .chunks(2)
            .map(|pair| {
                let hi = hex_value(pair[0]);
                let lo = hex_value(pair[1]);
                match (hi, lo) {
                    (Some(hi), Some(lo)) => Ok((hi << 4) | lo),
                    _ => Err(Error::InvalidUidFormat(format!(
                        "'{text}' is not a hex UID"
                    ))),
                }
            })
            .collect::<Result<Vec<u8>>>()?;

        Uid::new(bytes)
    }

    /// Get the raw bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Number of bytes in the UID.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false` for a validated UID; present for API symmetry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Canonical string form of this UID.
    #[must_use]
    pub fn canonical(&self) -> CanonicalUid {
        CanonicalUid(format_uid(&self.0))
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&format_uid(&self.0))
    }
}

impl std::str::FromStr for Uid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Uid::from_hex(s)
    }
}

fn hex_value(digit: u8) -> Option<u8> {
    match digit {
        b'0'..=b'9' => Some(digit - b'0'),
        b'a'..=b'f' => Some(digit - b'a' + 10),
        b'A'..=b'F' => Some(digit - b'A' + 10),
        _ => None,
    }
}

/// Canonical UID string: `"C0 5F 6E 1D"`.
///
/// # Security
/// Equality is constant-time so comparing a presented card against the
/// reference UID does not leak how many leading characters matched.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CanonicalUid(String);

impl CanonicalUid {
    /// Parse a reference UID string.
    ///
    /// The input is trimmed and uppercased, then must be in canonical form:
    /// 1-10 two-digit hex pairs separated by single spaces.
    ///
    /// # Errors
    /// Returns `Error::InvalidUidFormat` if the text is not canonical.
    pub fn parse(text: &str) -> Result<Self> {
        let normalized = text.trim().to_uppercase();

        let pairs: Vec<&str> = normalized.split(' ').collect();
        if !(MIN_UID_LENGTH..=MAX_UID_LENGTH).contains(&pairs.len()) {
            return Err(Error::InvalidUidFormat(format!(
                "'{normalized}' must have {MIN_UID_LENGTH}-{MAX_UID_LENGTH} byte pairs"
            )));
        }

        let well_formed = pairs
            .iter()
            .all(|pair| pair.len() == 2 && pair.bytes().all(|b| b.is_ascii_hexdigit()));
        if !well_formed {
            return Err(Error::InvalidUidFormat(format!(
                "'{normalized}' is not in 'XX XX XX XX' form"
            )));
        }

        Ok(CanonicalUid(normalized))
    }

    /// Get the canonical string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for CanonicalUid {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_bytes().ct_eq(other.0.as_bytes()).into()
    }
}

impl std::hash::Hash for CanonicalUid {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl fmt::Display for CanonicalUid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CanonicalUid {
    type Error = Error;

    fn try_from(text: String) -> Result<Self> {
        CanonicalUid::parse(&text)
    }
}

impl From<CanonicalUid> for String {
    fn from(uid: CanonicalUid) -> Self {
        uid.0
    }
}

impl std::str::FromStr for CanonicalUid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        CanonicalUid::parse(s)
    }
}
