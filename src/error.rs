//! Crate-level error types.

use std::fmt;

/// What went wrong while running the opcode stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamErrorKind {
    /// Opcode byte outside the supported subset.
    UnknownOpcode,
    /// The stream ended before the termination opcode.
    UnexpectedEof,
    /// An opcode needed more operands than the stack holds above the
    /// innermost mark.
    StackUnderflow,
    /// A mark-delimited opcode ran with no open mark.
    MarkUnderflow,
    /// An opcode found the wrong kind of value on the stack.
    TypeMismatch(&'static str),
    /// Length-prefixed text was not valid UTF-8.
    InvalidText,
    /// A negative length prefix.
    InvalidLength,
    /// The termination opcode found something other than one mapping.
    BadTermination,
}

impl fmt::Display for StreamErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownOpcode => write!(f, "unknown opcode"),
            Self::UnexpectedEof => write!(f, "unexpected end of stream"),
            Self::StackUnderflow => write!(f, "operand stack underflow"),
            Self::MarkUnderflow => write!(f, "mark stack underflow"),
            Self::TypeMismatch(expected) => {
                write!(f, "type mismatch, expected {expected}")
            }
            Self::InvalidText => write!(f, "invalid UTF-8 text"),
            Self::InvalidLength => write!(f, "negative length prefix"),
            Self::BadTermination => {
                write!(f, "stream did not terminate with a single mapping")
            }
        }
    }
}

/// Fatal failure of the protocol deserializer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamFormatError {
    /// Byte offset of the opcode that failed.
    pub offset: usize,
    /// The opcode being executed, if one had been read.
    pub opcode: Option<u8>,
    /// Failure category.
    pub kind: StreamErrorKind,
}

impl fmt::Display for StreamFormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.opcode {
            Some(op) => write!(
                f,
                "{} at byte {} (opcode 0x{op:02x})",
                self.kind, self.offset
            ),
            None => write!(f, "{} at byte {}", self.kind, self.offset),
        }
    }
}

impl std::error::Error for StreamFormatError {}

/// A single session branch could not be decoded. The walker logs it and
/// carries on with the remaining branches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchDecodeError {
    /// Branch name.
    pub branch: String,
    /// What was malformed.
    pub reason: String,
}

impl BranchDecodeError {
    pub(crate) fn new(branch: &str, reason: impl Into<String>) -> Self {
        Self {
            branch: branch.to_owned(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for BranchDecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "branch '{}': {}", self.branch, self.reason)
    }
}

impl std::error::Error for BranchDecodeError {}

/// The saved view could not be turned into camera parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum GeometryReconstructionError {
    /// The view vector was shorter than 18 values.
    TooShort(usize),
    /// A component was NaN or infinite.
    NonFinite,
    /// Camera-to-center distance was zero or negative.
    NonPositiveDistance(f32),
    /// The rotation rows were zero or parallel.
    DegenerateRotation,
}

impl fmt::Display for GeometryReconstructionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooShort(n) => {
                write!(f, "view vector has {n} values, need 18")
            }
            Self::NonFinite => write!(f, "view vector is not finite"),
            Self::NonPositiveDistance(d) => {
                write!(f, "camera distance {d} is not positive")
            }
            Self::DegenerateRotation => write!(f, "degenerate view rotation"),
        }
    }
}

impl std::error::Error for GeometryReconstructionError {}

/// Errors produced by the viso-pse crate.
#[derive(Debug)]
pub enum PseError {
    /// The byte stream is not a valid session pickle.
    Stream(StreamFormatError),
    /// The session's global header is missing or malformed.
    Header(String),
    /// Generic I/O failure.
    Io(std::io::Error),
    /// TOML options parsing/serialization failure.
    OptionsParse(String),
}

impl fmt::Display for PseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stream(e) => write!(f, "stream format error: {e}"),
            Self::Header(msg) => write!(f, "session header error: {msg}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::OptionsParse(msg) => {
                write!(f, "options parse error: {msg}")
            }
        }
    }
}

impl std::error::Error for PseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Stream(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StreamFormatError> for PseError {
    fn from(e: StreamFormatError) -> Self {
        Self::Stream(e)
    }
}

impl From<std::io::Error> for PseError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_error_names_offset_and_opcode() {
        let e = StreamFormatError {
            offset: 12,
            opcode: Some(0xff),
            kind: StreamErrorKind::UnknownOpcode,
        };
        assert_eq!(e.to_string(), "unknown opcode at byte 12 (opcode 0xff)");
    }

    #[test]
    fn pse_error_exposes_source() {
        use std::error::Error;
        let e = PseError::from(StreamFormatError {
            offset: 0,
            opcode: None,
            kind: StreamErrorKind::UnexpectedEof,
        });
        assert!(e.source().is_some());
        assert!(PseError::Header("x".to_owned()).source().is_none());
    }
}
