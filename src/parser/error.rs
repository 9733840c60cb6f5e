//! Decode-side errors.
//!
//! "Index out of range" and "invalid type" are deliberately separate variants:
//! the first means a wire index had no entity behind it, the second means the
//! entity exists but is the wrong shape for where it was referenced.

use thiserror::Error;

use super::types::{EntityKind, SectionId};

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("unexpected end of input at offset {offset} (needed {needed} more bytes)")]
    UnexpectedEof { offset: usize, needed: usize },

    #[error("integer representation too long or too large at offset {offset} ({width}-bit)")]
    VarintOverflow { offset: usize, width: u32 },

    #[error("malformed UTF-8 encoding at offset {offset}")]
    InvalidUtf8 { offset: usize },

    #[error("magic header not detected: {0:#010x}")]
    BadMagic(u32),

    #[error("unknown binary version: {0}")]
    UnsupportedVersion(u32),

    #[error("malformed section id: {0}")]
    UnknownSection(u8),

    #[error("duplicate {0} section")]
    DuplicateSection(SectionId),

    #[error("{0} section out of order")]
    SectionOutOfOrder(SectionId),

    #[error("{section} section size mismatch: declared {expected} bytes, consumed {actual}")]
    SectionSizeMismatch { section: SectionId, expected: usize, actual: usize },

    #[error("invalid value type: {0:#04x}")]
    InvalidValueType(u8),

    #[error("invalid reference type: {0:#04x}")]
    InvalidRefType(u8),

    #[error("invalid block type: {0}")]
    InvalidBlockType(i64),

    #[error("invalid limits flags: {0:#04x}")]
    InvalidLimits(u8),

    #[error("invalid external kind: {0:#04x}")]
    InvalidExternalKind(u8),

    #[error("invalid mutability flag: {0:#04x}")]
    InvalidMutability(u8),

    #[error("invalid {kind} flags: {flags}")]
    InvalidSegmentFlags { kind: EntityKind, flags: u32 },

    #[error("expected marker byte {expected:#04x}, found {actual:#04x} at offset {offset}")]
    InvalidMarker { offset: usize, expected: u8, actual: u8 },

    #[error("unknown opcode {opcode:#04x} at offset {offset}")]
    UnknownOpcode { offset: usize, opcode: u8 },

    #[error("unknown instruction {prefix:#04x} {sub:#x} at offset {offset}")]
    UnknownInstruction { offset: usize, prefix: u8, sub: u32 },

    #[error("malformed instruction at offset {offset}: {reason}")]
    MalformedInstruction { offset: usize, reason: String },

    #[error("{kind} index {index} out of range (have {len})")]
    IndexOutOfRange { kind: EntityKind, index: u32, len: usize },

    #[error("invalid {kind} {index}: {reason}")]
    InvalidType { kind: EntityKind, index: u32, reason: String },

    #[error("{what} count {count} exceeds implementation limit {limit}")]
    LimitExceeded { what: &'static str, count: u32, limit: u32 },

    #[error("function and code section have inconsistent lengths ({functions} declared, {bodies} bodies)")]
    FunctionCountMismatch { functions: usize, bodies: usize },

    #[error("data count and data section have inconsistent lengths ({declared} declared, {actual} segments)")]
    DataCountMismatch { declared: u32, actual: usize },

    #[error("custom section {name:?}: {reason}")]
    CustomSection { name: String, reason: String },
}

impl ParseError {
    pub(crate) fn malformed(offset: usize, reason: impl Into<String>) -> ParseError {
        ParseError::MalformedInstruction { offset, reason: reason.into() }
    }
}
