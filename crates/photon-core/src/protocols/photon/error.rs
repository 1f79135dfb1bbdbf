use thiserror::Error;

use super::reader::ShortRead;
use super::value::ParameterTable;

/// Errors returned while framing a captured Photon datagram.
///
/// # Examples
/// ```
/// use photon_core::FrameError;
///
/// let err = FrameError::MalformedFrame { index: 0, length: 3084, available: 0 };
/// assert!(err.to_string().contains("command 0"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("payload too short: need {needed} bytes, got {actual}")]
    TooShort { needed: usize, actual: usize },
    #[error("truncated header for command {index}: need {needed} bytes, got {actual}")]
    TruncatedCommandHeader {
        index: usize,
        needed: usize,
        actual: usize,
    },
    #[error(
        "malformed frame: command {index} declares length {length} with {available} bytes available"
    )]
    MalformedFrame {
        index: usize,
        length: i32,
        available: usize,
    },
}

impl From<ShortRead> for FrameError {
    fn from(value: ShortRead) -> Self {
        FrameError::TooShort {
            needed: value.needed,
            actual: value.actual,
        }
    }
}

/// Errors returned when a command body is decoded as a message or fragment.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    #[error("payload too short: need {needed} bytes, got {actual}")]
    TooShort { needed: usize, actual: usize },
    #[error("wrong command kind: expected type {expected}, got {actual}")]
    WrongCommandKind { expected: u8, actual: u8 },
    #[error("unknown message kind: {value}")]
    UnknownMessageKind { value: u8 },
    #[error("invalid debug payload: {0}")]
    DebugPayload(#[from] ValueError),
}

impl From<ShortRead> for CommandError {
    fn from(value: ShortRead) -> Self {
        CommandError::TooShort {
            needed: value.needed,
            actual: value.actual,
        }
    }
}

/// Errors returned by the typed-value grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("payload too short: need {needed} bytes, got {actual}")]
    TooShort { needed: usize, actual: usize },
    #[error("unknown type tag: {tag}")]
    UnknownTypeTag { tag: u8 },
    #[error("unknown array element tag: {tag}")]
    UnknownSliceTag { tag: u8 },
    #[error("invalid boolean value: {value}")]
    InvalidBoolean { value: u8 },
    #[error("arrays nested deeper than {limit} levels")]
    NestingTooDeep { limit: usize },
}

impl From<ShortRead> for ValueError {
    fn from(value: ShortRead) -> Self {
        ValueError::TooShort {
            needed: value.needed,
            actual: value.actual,
        }
    }
}

/// A parameter table failed to decode.
///
/// No table is returned on failure; `decoded` keeps what was read before the
/// failing parameter so callers can log it.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("parameter decode failed after {} parameters: {source}", decoded.len())]
pub struct ParameterError {
    /// Id of the failing parameter, when its header could be read.
    pub parameter_id: Option<u8>,
    #[source]
    pub source: ValueError,
    pub decoded: ParameterTable,
}
