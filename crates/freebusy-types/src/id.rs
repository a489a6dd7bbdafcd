use std::fmt;

use rand::rngs::OsRng;
use rand::RngCore;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{CodecError, CodecResult};

/// Hex digit counts of the five groups in the canonical text form.
const GROUPS: [usize; 5] = [8, 4, 4, 4, 12];

/// 128-bit identifier naming a resource.
///
/// Freshly generated identifiers follow the UUID version-4 layout (version
/// nibble fixed to 4, variant bits fixed to `10`). Values decoded from
/// storage or the wire are accepted as-is: any 16 bytes form a valid
/// `ResourceId`. The all-zero value is a reserved sentinel meaning
/// "no identifier" and is never persisted.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId([u8; 16]);

impl ResourceId {
    /// Generate a new random identifier from the OS entropy source.
    ///
    /// Fails only if the entropy source fails, which should not happen in
    /// practice.
    pub fn generate() -> CodecResult<Self> {
        let mut bytes = [0u8; 16];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| CodecError::Entropy(e.to_string()))?;
        bytes[6] = (bytes[6] & 0x0f) | 0x40;
        bytes[8] = (bytes[8] & 0x3f) | 0x80;
        Ok(Self(bytes))
    }

    /// The all-zero sentinel identifier.
    pub const fn zero() -> Self {
        Self([0u8; 16])
    }

    /// Returns `true` if this is the sentinel identifier.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 16]
    }

    /// The raw 16-byte value.
    pub fn to_bytes(&self) -> [u8; 16] {
        self.0
    }

    /// The raw bytes as a slice.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Decode from exactly 16 raw bytes. The v4 layout is not re-checked.
    pub fn from_bytes(bytes: &[u8]) -> CodecResult<Self> {
        if bytes.len() != 16 {
            return Err(CodecError::Length {
                expected: 16,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; 16];
        arr.copy_from_slice(bytes);
        Ok(Self(arr))
    }

    /// Canonical lowercase text form: `xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx`.
    pub fn to_text(&self) -> String {
        let h = hex::encode(self.0);
        format!(
            "{}-{}-{}-{}-{}",
            &h[0..8],
            &h[8..12],
            &h[12..16],
            &h[16..20],
            &h[20..32]
        )
    }

    /// Decode the text form.
    ///
    /// Expects five groups of 8/4/4/4/12 hex digits. A single hyphen is
    /// accepted immediately before each group boundary, so the canonical
    /// form and the bare 32-digit form both parse. Doubled or misplaced
    /// hyphens, non-hex digits, short input, and trailing data all fail.
    pub fn from_text(text: &str) -> CodecResult<Self> {
        let mut rest = text.as_bytes();
        let mut buf = [0u8; 16];
        let mut offset = 0;
        for (i, digits) in GROUPS.into_iter().enumerate() {
            if i > 0 && rest.first() == Some(&b'-') {
                rest = &rest[1..];
            }
            if rest.len() < digits {
                return Err(CodecError::Format(format!(
                    "identifier text too short: expected {digits} more hex digits"
                )));
            }
            let decoded = hex::decode(&rest[..digits])
                .map_err(|e| CodecError::Format(format!("invalid hex in identifier: {e}")))?;
            buf[offset..offset + digits / 2].copy_from_slice(&decoded);
            rest = &rest[digits..];
            offset += digits / 2;
        }
        if !rest.is_empty() {
            return Err(CodecError::Format(format!(
                "trailing data after identifier: {:?}",
                String::from_utf8_lossy(rest)
            )));
        }
        Ok(Self(buf))
    }
}

impl fmt::Debug for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourceId({})", self.to_text())
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl From<[u8; 16]> for ResourceId {
    fn from(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }
}

impl From<ResourceId> for [u8; 16] {
    fn from(id: ResourceId) -> Self {
        id.0
    }
}

impl Serialize for ResourceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_text())
    }
}

impl<'de> Deserialize<'de> for ResourceId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        ResourceId::from_text(&text).map_err(D::Error::custom)
    }
}
