use thiserror::Error;

/// Errors produced by the identifier, status, and resource codecs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// Input had the wrong byte count for a fixed-width decode.
    #[error("invalid byte length: expected {expected}, got {actual}")]
    Length { expected: usize, actual: usize },

    /// Malformed text or structured input.
    #[error("malformed input: {0}")]
    Format(String),

    /// A status value outside the defined enumeration.
    #[error("status value {0} out of range")]
    Range(u8),

    /// The OS entropy source failed while generating an identifier.
    #[error("reading entropy source: {0}")]
    Entropy(String),

    /// A sub-value failed to decode; names the field so callers can tell
    /// which part of a composite value was at fault.
    #[error("{field}: {source}")]
    Field {
        field: &'static str,
        #[source]
        source: Box<CodecError>,
    },
}

impl CodecError {
    /// Wrap an error with the name of the field it occurred in.
    pub fn in_field(self, field: &'static str) -> Self {
        CodecError::Field {
            field,
            source: Box::new(self),
        }
    }

    /// The underlying error, looking through any field-context wrapping.
    pub fn root(&self) -> &CodecError {
        match self {
            CodecError::Field { source, .. } => source.root(),
            other => other,
        }
    }

    /// True for a wrong-byte-count error, through field wrapping.
    pub fn is_length(&self) -> bool {
        matches!(self.root(), CodecError::Length { .. })
    }

    /// True for a malformed-input error, through field wrapping.
    pub fn is_format(&self) -> bool {
        matches!(self.root(), CodecError::Format(_))
    }

    /// True for an out-of-range status error, through field wrapping.
    pub fn is_range(&self) -> bool {
        matches!(self.root(), CodecError::Range(_))
    }
}

/// Result alias for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;
