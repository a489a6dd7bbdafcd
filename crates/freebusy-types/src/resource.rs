use std::fmt;

use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CodecError, CodecResult};
use crate::id::ResourceId;
use crate::status::Status;

/// Format sentinel at the head of every binary record.
pub const BINARY_MAGIC: [u8; 2] = *b"fb";

/// Highest binary format version this implementation understands.
pub const BINARY_VERSION: u8 = 1;

/// Total length of the binary form:
/// magic (2) + version (1) + reserved (1) + id (16) + status (1)
/// + seconds i64 (8) + nanos u32 (4) + utc offset i32 (4).
pub const BINARY_LEN: usize = 37;

/// The zero timestamp: Unix epoch at offset +00:00.
pub fn zero_since() -> DateTime<FixedOffset> {
    DateTime::<Utc>::UNIX_EPOCH.fixed_offset()
}

/// Any resource (a person, a room, a server) that needs to communicate how
/// busy it is.
///
/// A `Resource` is a snapshot: a new occupancy state is a new value, never a
/// mutation of an old one. It round-trips through three independent wire
/// forms: a single line of text, a JSON object, and a fixed-length versioned
/// binary record.
///
/// Equality compares `since` as an absolute instant — chrono's `DateTime`
/// equality ignores the offset annotation — so a timestamp and its
/// UTC-normalized equivalent are equal. The friendly name always
/// participates in equality: two resources with different labels are
/// different resources.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resource {
    /// Unique identifier; the all-zero sentinel means "no identifier".
    pub id: ResourceId,
    /// Current occupancy level.
    pub status: Status,
    /// When the current status began.
    pub since: DateTime<FixedOffset>,
    /// Free-text label, may be empty. Never escaped or quoted.
    pub friendly_name: String,
}

/// JSON shape of a [`Resource`]. Missing fields decode as zero values.
#[derive(Serialize, Deserialize)]
struct ResourceRepr {
    #[serde(default = "ResourceId::zero")]
    id: ResourceId,
    #[serde(default)]
    status: Status,
    #[serde(default = "zero_since")]
    since: DateTime<FixedOffset>,
    #[serde(rename = "friendlyName", default)]
    friendly_name: String,
}

impl Resource {
    /// A fresh resource: new random identifier, [`Status::FREE`], zero
    /// timestamp, empty name. Fails only if the entropy source does.
    pub fn new() -> CodecResult<Self> {
        Ok(Self {
            id: ResourceId::generate()?,
            status: Status::FREE,
            since: zero_since(),
            friendly_name: String::new(),
        })
    }

    /// The zero-value resource: sentinel id, FREE, zero timestamp.
    pub fn zero() -> Self {
        Self {
            id: ResourceId::zero(),
            status: Status::FREE,
            since: zero_since(),
            friendly_name: String::new(),
        }
    }

    /// Returns `true` if `since` is the zero timestamp.
    pub fn is_zero_since(&self) -> bool {
        self.since == zero_since()
    }

    /// Valid for persistence: non-sentinel id and non-zero timestamp.
    pub fn is_storable(&self) -> bool {
        !self.id.is_zero() && !self.is_zero_since()
    }

    // ------------------------------------------------------------------
    // Text form
    // ------------------------------------------------------------------

    /// Encode as a single line, fields space-separated:
    /// `{id} {status} {since} {friendly_name}`.
    ///
    /// The name and its separating space are omitted when the name is
    /// empty. An out-of-range status fails with a field-wrapped range
    /// error.
    pub fn to_text(&self) -> CodecResult<String> {
        let status = self.status.to_text().map_err(|e| e.in_field("status"))?;
        let mut line = format!(
            "{} {} {}",
            self.id.to_text(),
            status,
            self.since.to_rfc3339_opts(SecondsFormat::AutoSi, true)
        );
        if !self.friendly_name.is_empty() {
            line.push(' ');
            line.push_str(&self.friendly_name);
        }
        Ok(line)
    }

    /// Decode the single-line text form.
    ///
    /// The first three space-separated tokens must decode as id, status,
    /// and an RFC 3339 timestamp; everything after the third space is the
    /// friendly name (it may itself contain spaces).
    pub fn from_text(text: &str) -> CodecResult<Self> {
        let tokens: Vec<&str> = text.split(' ').collect();
        if tokens.len() < 3 {
            return Err(CodecError::Format(format!(
                "resource text needs at least 3 fields, got {}",
                tokens.len()
            )));
        }
        let id = ResourceId::from_text(tokens[0]).map_err(|e| e.in_field("id"))?;
        let status = Status::from_text(tokens[1]).map_err(|e| e.in_field("status"))?;
        let since = DateTime::parse_from_rfc3339(tokens[2])
            .map_err(|e| CodecError::Format(e.to_string()).in_field("since"))?;
        Ok(Self {
            id,
            status,
            since,
            friendly_name: tokens[3..].join(" "),
        })
    }

    // ------------------------------------------------------------------
    // JSON form
    // ------------------------------------------------------------------

    /// Encode as a JSON object `{id, status, since, friendlyName}`.
    ///
    /// Status is written as its word; an out-of-range status fails with a
    /// field-wrapped range error before any serialization happens.
    pub fn to_json(&self) -> CodecResult<String> {
        self.status.to_text().map_err(|e| e.in_field("status"))?;
        serde_json::to_string(self).map_err(|e| CodecError::Format(e.to_string()))
    }

    /// Decode the JSON form. Missing fields become zero values; status is
    /// accepted as a word or as numeric text ("0"/"1"/"2").
    pub fn from_json(raw: &str) -> CodecResult<Self> {
        serde_json::from_str(raw).map_err(|e| CodecError::Format(e.to_string()))
    }

    // ------------------------------------------------------------------
    // Binary form
    // ------------------------------------------------------------------

    /// Encode as the fixed [`BINARY_LEN`]-byte record, big-endian.
    ///
    /// The friendly name is not part of the binary form; it travels only in
    /// the text and JSON forms. Encoding is total — even an out-of-range
    /// status encodes its raw byte.
    pub fn to_binary(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(BINARY_LEN);
        buf.extend_from_slice(&BINARY_MAGIC);
        buf.push(BINARY_VERSION);
        buf.push(0); // reserved
        buf.extend_from_slice(&self.id.to_bytes());
        buf.push(self.status.to_byte());
        buf.extend_from_slice(&self.since.timestamp().to_be_bytes());
        buf.extend_from_slice(&self.since.timestamp_subsec_nanos().to_be_bytes());
        buf.extend_from_slice(&self.since.offset().local_minus_utc().to_be_bytes());
        buf
    }

    /// Decode the binary record.
    ///
    /// Rejects a wrong total length, unknown magic bytes, and any version
    /// above [`BINARY_VERSION`]. Sub-codec failures carry the field name.
    pub fn from_binary(bytes: &[u8]) -> CodecResult<Self> {
        if bytes.len() != BINARY_LEN {
            return Err(CodecError::Length {
                expected: BINARY_LEN,
                actual: bytes.len(),
            });
        }
        if bytes[0..2] != BINARY_MAGIC {
            return Err(CodecError::Format(format!(
                "bad magic bytes: {:02x}{:02x}",
                bytes[0], bytes[1]
            )));
        }
        if bytes[2] > BINARY_VERSION {
            return Err(CodecError::Format(format!(
                "unsupported binary version {}",
                bytes[2]
            )));
        }
        let id = ResourceId::from_bytes(&bytes[4..20]).map_err(|e| e.in_field("id"))?;
        let status = Status::from_byte(&bytes[20..21]).map_err(|e| e.in_field("status"))?;

        let secs = i64::from_be_bytes(bytes[21..29].try_into().expect("8-byte slice"));
        let nanos = u32::from_be_bytes(bytes[29..33].try_into().expect("4-byte slice"));
        let offset_secs = i32::from_be_bytes(bytes[33..37].try_into().expect("4-byte slice"));
        let offset = FixedOffset::east_opt(offset_secs).ok_or_else(|| {
            CodecError::Format(format!("utc offset out of range: {offset_secs}s"))
                .in_field("since")
        })?;
        let since = DateTime::<Utc>::from_timestamp(secs, nanos)
            .ok_or_else(|| {
                CodecError::Format(format!("timestamp out of range: {secs}s {nanos}ns"))
                    .in_field("since")
            })?
            .with_timezone(&offset);

        Ok(Self {
            id,
            status,
            since,
            friendly_name: String::new(),
        })
    }
}

impl Default for Resource {
    fn default() -> Self {
        Self::zero()
    }
}

/// Renders the text form, or an empty string if the status is out of range.
impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text().unwrap_or_default())
    }
}

impl Serialize for Resource {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ResourceRepr {
            id: self.id,
            status: self.status,
            since: self.since,
            friendly_name: self.friendly_name.clone(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Resource {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = ResourceRepr::deserialize(deserializer)?;
        Ok(Self {
            id: repr.id,
            status: repr.status,
            since: repr.since,
            friendly_name: repr.friendly_name,
        })
    }
}
