//! Binary encoding primitives for WebAssembly values.
//!
//! Provides LEB128 integer encoding (minimal and padded), IEEE 754 float bit
//! patterns, and byte vector encoding as specified by the WebAssembly binary
//! format.
//!
//! Everything is written through a [`ByteSink`]. There are two sinks: a
//! [`Writer`] over a buffer sized up front, and a [`LengthCounter`] that only
//! measures. The module encoder runs the same routine against both, so the
//! length pass and the write pass cannot disagree.

use byteorder::{ByteOrder, LittleEndian};

use crate::encoder::EncodeError;

// ---------------------------------------------------------------------------
// WebAssembly binary format constants (spec section 5)
// ---------------------------------------------------------------------------

/// `\0asm`
pub const MAGIC: [u8; 4] = [0x00, 0x61, 0x73, 0x6D];
pub const VERSION: u32 = 1;

// Type constructors (§5.3.6)
pub const TYPE_FUNC: u8 = 0x60;

// Import/export descriptor kinds (§5.5.5, §5.5.10)
pub const DESC_FUNC: u8 = 0x00;
pub const DESC_TABLE: u8 = 0x01;
pub const DESC_MEMORY: u8 = 0x02;
pub const DESC_GLOBAL: u8 = 0x03;
pub const DESC_TAG: u8 = 0x04;

// Limits flags (§5.3.7), bit 1 is the threads proposal's shared flag
pub const LIMITS_HAS_MAX: u8 = 0x01;
pub const LIMITS_SHARED: u8 = 0x02;

// Element segment elemkind (§5.5.12)
pub const ELEMKIND_FUNCREF: u8 = 0x00;

// Element segment flags (§5.5.12)
// 3-bit encoding: bit 0 = non-active mode, bit 1 = explicit table, bit 2 = expressions
pub const ELEM_NON_ACTIVE: u32 = 0b001;
pub const ELEM_EXPLICIT_TABLE: u32 = 0b010; // for passive segments this bit means declarative
pub const ELEM_EXPRESSIONS: u32 = 0b100;

// Data segment flags (§5.5.14)
pub const DATA_ACTIVE: u32 = 0;
pub const DATA_PASSIVE: u32 = 1;
pub const DATA_ACTIVE_EXPLICIT: u32 = 2;

// Expression terminator (§5.4.9)
pub const OP_END: u8 = 0x0B;

// Block type: empty (§5.4.1)
pub const BLOCK_TYPE_EMPTY: u8 = 0x40;

// Multi-byte opcode prefixes
pub const PREFIX_MISC: u8 = 0xFC;
pub const PREFIX_SIMD: u8 = 0xFD;
pub const PREFIX_ATOMIC: u8 = 0xFE;

/// Width used for relocatable (patchable) indices: the maximum size of a u32
/// LEB128 encoding.
pub const RELOC_WIDTH: usize = 5;

// ---------------------------------------------------------------------------
// Encoded lengths
// ---------------------------------------------------------------------------

/// Longest LEB128 encoding of a 64-bit value.
pub const MAX_VARINT_LEN: usize = 10;

/// Number of bytes in the minimal unsigned LEB128 encoding of `value`.
pub fn unsigned_varint_len(mut value: u64) -> usize {
    let mut len = 1;
    while value >= 0x80 {
        value >>= 7;
        len += 1;
    }
    len
}

/// Number of bytes in the minimal signed LEB128 encoding of `value`.
pub fn signed_varint_len(mut value: i64) -> usize {
    let mut len = 1;
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if (value == 0 && (byte & 0x40) == 0) || (value == -1 && (byte & 0x40) != 0) {
            return len;
        }
        len += 1;
    }
}

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

/// Destination for encoded bytes.
///
/// Implementors supply the three raw operations; all value encodings are
/// provided on top of them so every sink produces identical byte counts.
pub trait ByteSink {
    fn write_byte(&mut self, byte: u8) -> Result<(), EncodeError>;

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), EncodeError>;

    /// Bytes written so far.
    fn position(&self) -> usize;

    /// Writes the UTF-8 bytes of `s` without a length prefix.
    fn write_utf8(&mut self, s: &str) -> Result<(), EncodeError> {
        self.write_bytes(s.as_bytes())
    }

    // Unsigned LEB128 ---------------------------------------------------------

    fn write_vu64(&mut self, mut value: u64) -> Result<(), EncodeError> {
        loop {
            let mut byte = (value & 0x7f) as u8;
            value >>= 7;
            if value == 0 {
                return self.write_byte(byte);
            }
            byte |= 0x80;
            self.write_byte(byte)?;
        }
    }

    fn write_vu32(&mut self, value: u32) -> Result<(), EncodeError> {
        self.write_vu64(value as u64)
    }

    /// Single-bit boolean as a one-byte LEB128 value (0x00 or 0x01).
    fn write_vu1(&mut self, value: bool) -> Result<(), EncodeError> {
        self.write_byte(if value { 1 } else { 0 })
    }

    /// Writes `value` as exactly `width` LEB128 bytes: continuation bits on
    /// every byte but the last, zero payload groups as padding.
    fn write_padded_vu64(&mut self, value: u64, width: usize) -> Result<(), EncodeError> {
        if width == 0 || width > MAX_VARINT_LEN || unsigned_varint_len(value) > width {
            return Err(EncodeError::PaddingOverflow { value: value.into(), width });
        }
        let mut rest = value;
        for i in 0..width {
            let mut byte = (rest & 0x7f) as u8;
            rest >>= 7;
            if i + 1 < width {
                byte |= 0x80;
            }
            self.write_byte(byte)?;
        }
        Ok(())
    }

    fn write_padded_vu32(&mut self, value: u32, width: usize) -> Result<(), EncodeError> {
        self.write_padded_vu64(value.into(), width)
    }

    /// Minimal encoding, or the fixed relocatable width when `padded` is set.
    fn write_index(&mut self, value: u32, padded: bool) -> Result<(), EncodeError> {
        if padded {
            self.write_padded_vu32(value, RELOC_WIDTH)
        } else {
            self.write_vu32(value)
        }
    }

    // Signed LEB128 -----------------------------------------------------------

    fn write_vs64(&mut self, mut value: i64) -> Result<(), EncodeError> {
        loop {
            let mut byte = (value & 0x7f) as u8;
            value >>= 7;
            if (value == 0 && (byte & 0x40) == 0) || (value == -1 && (byte & 0x40) != 0) {
                return self.write_byte(byte);
            }
            byte |= 0x80;
            self.write_byte(byte)?;
        }
    }

    fn write_vs32(&mut self, value: i32) -> Result<(), EncodeError> {
        self.write_vs64(value as i64)
    }

    /// Signed counterpart of [`ByteSink::write_padded_vu64`]. Padding groups
    /// repeat the sign bit (`0xff` for negative values, `0x80` otherwise).
    fn write_padded_vs64(&mut self, value: i64, width: usize) -> Result<(), EncodeError> {
        if width == 0 || width > MAX_VARINT_LEN || signed_varint_len(value) > width {
            return Err(EncodeError::PaddingOverflow { value: value.into(), width });
        }
        let mut rest = value;
        for i in 0..width {
            let mut byte = (rest & 0x7f) as u8;
            rest >>= 7;
            if i + 1 < width {
                byte |= 0x80;
            }
            self.write_byte(byte)?;
        }
        Ok(())
    }

    fn write_padded_vs32(&mut self, value: i32, width: usize) -> Result<(), EncodeError> {
        self.write_padded_vs64(value.into(), width)
    }

    // Fixed width (little-endian) ---------------------------------------------

    fn write_u32(&mut self, value: u32) -> Result<(), EncodeError> {
        let mut bytes = [0u8; 4];
        LittleEndian::write_u32(&mut bytes, value);
        self.write_bytes(&bytes)
    }

    fn write_u64(&mut self, value: u64) -> Result<(), EncodeError> {
        let mut bytes = [0u8; 8];
        LittleEndian::write_u64(&mut bytes, value);
        self.write_bytes(&bytes)
    }

    /// IEEE 754 single, given as its raw bit pattern so NaN payloads survive.
    fn write_f32_bits(&mut self, bits: u32) -> Result<(), EncodeError> {
        self.write_u32(bits)
    }

    fn write_f64_bits(&mut self, bits: u64) -> Result<(), EncodeError> {
        self.write_u64(bits)
    }

    // Vectors -----------------------------------------------------------------

    /// Length-prefixed byte vector (vu32 length + raw bytes).
    fn write_u8vec(&mut self, bytes: &[u8]) -> Result<(), EncodeError> {
        self.write_vu32(bytes.len() as u32)?;
        self.write_bytes(bytes)
    }

    /// Length-prefixed UTF-8 name.
    fn write_name(&mut self, name: &str) -> Result<(), EncodeError> {
        self.write_vu32(name.len() as u32)?;
        self.write_utf8(name)
    }
}

/// A sink over a buffer whose size was fixed at construction.
///
/// The buffer never grows. Writing past the end is a [`EncodeError::BufferOverflow`],
/// except for UTF-8 text, which is cut at the buffer's end without an error.
#[derive(Debug)]
pub struct Writer {
    buf: Vec<u8>,
    pos: usize,
}

impl Writer {
    pub fn with_len(len: usize) -> Writer {
        Writer { buf: vec![0; len], pos: 0 }
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Consumes the writer, returning the full buffer (including any unwritten tail).
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

impl ByteSink for Writer {
    fn write_byte(&mut self, byte: u8) -> Result<(), EncodeError> {
        if self.pos >= self.buf.len() {
            return Err(EncodeError::BufferOverflow { position: self.pos, needed: 1, capacity: self.buf.len() });
        }
        self.buf[self.pos] = byte;
        self.pos += 1;
        Ok(())
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), EncodeError> {
        if bytes.len() > self.remaining() {
            return Err(EncodeError::BufferOverflow {
                position: self.pos,
                needed: bytes.len(),
                capacity: self.buf.len(),
            });
        }
        self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
        Ok(())
    }

    fn position(&self) -> usize {
        self.pos
    }

    fn write_utf8(&mut self, s: &str) -> Result<(), EncodeError> {
        let bytes = s.as_bytes();
        let take = bytes.len().min(self.remaining());
        self.buf[self.pos..self.pos + take].copy_from_slice(&bytes[..take]);
        self.pos += take;
        Ok(())
    }
}

/// A sink that records how many bytes would have been written.
#[derive(Debug, Default)]
pub struct LengthCounter {
    len: usize,
}

impl LengthCounter {
    pub fn new() -> LengthCounter {
        LengthCounter { len: 0 }
    }
}

impl ByteSink for LengthCounter {
    fn write_byte(&mut self, _byte: u8) -> Result<(), EncodeError> {
        self.len += 1;
        Ok(())
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), EncodeError> {
        self.len += bytes.len();
        Ok(())
    }

    fn position(&self) -> usize {
        self.len
    }
}

/// Runs `emit` against a [`LengthCounter`] and returns the byte count.
pub fn measure<F>(emit: F) -> Result<usize, EncodeError>
where
    F: FnOnce(&mut LengthCounter) -> Result<(), EncodeError>,
{
    let mut counter = LengthCounter::new();
    emit(&mut counter)?;
    Ok(counter.position())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
