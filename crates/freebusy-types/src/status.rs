use std::fmt;

use serde::de::Error as _;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{CodecError, CodecResult};

const WORDS: [&str; 3] = ["free", "busy", "occupied"];

/// Occupancy level of a resource on a scale from 0 to 2.
///
/// 0 ([`Status::FREE`]) is a completely unutilized resource, 2
/// ([`Status::OCCUPIED`]) one utilized to capacity, and 1 ([`Status::BUSY`])
/// anything in between. The raw byte is kept so that out-of-range values
/// arriving over the wire stay representable; the strict codecs reject them,
/// the lenient [`Status::display_word`] collapses them to "free".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Status(u8);

impl Status {
    /// A completely unutilized resource.
    pub const FREE: Status = Status(0);
    /// A resource that is being utilized, but not to capacity.
    pub const BUSY: Status = Status(1);
    /// A resource that is being utilized to capacity.
    pub const OCCUPIED: Status = Status(2);

    /// Wrap a raw byte without range checking.
    pub const fn from_raw(value: u8) -> Self {
        Status(value)
    }

    /// The raw enumeration value.
    pub const fn as_raw(&self) -> u8 {
        self.0
    }

    /// Returns `true` if the value is one of the three defined statuses.
    pub const fn in_range(&self) -> bool {
        self.0 <= 2
    }

    /// Encode to a single raw byte. Total: out-of-range values encode too.
    pub const fn to_byte(&self) -> u8 {
        self.0
    }

    /// Decode from exactly one byte, rejecting values above 2.
    pub fn from_byte(bytes: &[u8]) -> CodecResult<Self> {
        if bytes.len() != 1 {
            return Err(CodecError::Length {
                expected: 1,
                actual: bytes.len(),
            });
        }
        if bytes[0] > 2 {
            return Err(CodecError::Range(bytes[0]));
        }
        Ok(Status(bytes[0]))
    }

    /// The lowercase word for a defined status; `Range` error otherwise.
    pub fn to_text(&self) -> CodecResult<&'static str> {
        WORDS
            .get(self.0 as usize)
            .copied()
            .ok_or(CodecError::Range(self.0))
    }

    /// Decode from a case-insensitive word or a single ASCII digit 0/1/2.
    pub fn from_text(text: &str) -> CodecResult<Self> {
        if text.is_empty() {
            return Err(CodecError::Format("status text must be non-empty".into()));
        }
        let bytes = text.as_bytes();
        if bytes.len() == 1 && (b'0'..=b'2').contains(&bytes[0]) {
            return Ok(Status(bytes[0] - b'0'));
        }
        for (i, word) in WORDS.iter().enumerate() {
            if text.eq_ignore_ascii_case(word) {
                return Ok(Status(i as u8));
            }
        }
        Err(CodecError::Format(format!("not a valid status: {text:?}")))
    }

    /// Best-effort word for logs and UI. Out-of-range values render as
    /// "free" rather than failing.
    pub fn display_word(&self) -> &'static str {
        self.to_text().unwrap_or(WORDS[0])
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_word())
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let word = self.to_text().map_err(S::Error::custom)?;
        serializer.serialize_str(word)
    }
}

impl<'de> Deserialize<'de> for Status {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Status::from_text(&text).map_err(D::Error::custom)
    }
}
