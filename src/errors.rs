//! Error types

use crate::types::EncapType;

/// Failures that abort decoding of a packet.
///
/// Unknown codes and truncated embedded packets are not errors; they surface as raw bytes or
/// absent fields in the decoded records.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The input buffer was empty.
    #[error("empty packet")]
    Empty,

    /// A mandatory read ran past the end of the buffer.
    #[error("too short at offset {offset}: required {required} bytes, available {available}")]
    TooShort {
        offset: usize,
        required: usize,
        available: usize,
        data: String,
    },

    #[error("unsupported encapsulation type: {0}")]
    UnsupportedEncap(EncapType),

    #[error("unsupported IP version: {0}")]
    UnsupportedIPVersion(u8),

    #[error("parse error: {0}")]
    ParseError(String),
}
