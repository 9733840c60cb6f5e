use byteorder::{ByteOrder, LittleEndian};

use super::error::ParseError;

/// Cursor over a borrowed byte slice.
///
/// `base` is the absolute offset of `bytes[0]` in the enclosing module so that
/// sub-readers over section payloads still report module-relative offsets.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
    base: usize,
}

impl<'a> Reader<'a> {
    pub fn new(bytes: &'a [u8]) -> Reader<'a> {
        Reader { bytes, pos: 0, base: 0 }
    }

    fn with_base(bytes: &'a [u8], base: usize) -> Reader<'a> {
        Reader { bytes, pos: 0, base }
    }
}

impl<'a> Reader<'a> {
    // Basic operations --------------------------------------------------------

    /// Absolute offset of the next byte.
    pub fn pos(&self) -> usize {
        self.base + self.pos
    }

    /// Offset of the next byte relative to this reader's start.
    pub fn local_pos(&self) -> usize {
        self.pos
    }

    pub fn has_at_least(&self, count: usize) -> bool {
        self.remaining() >= count
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn skip_to(&mut self, pos: usize) -> Result<(), ParseError> {
        if pos > self.bytes.len() {
            return Err(self.eof(pos - self.pos));
        }
        self.pos = pos;
        Ok(())
    }

    fn eof(&self, needed: usize) -> ParseError {
        ParseError::UnexpectedEof { offset: self.pos(), needed }
    }

    pub fn peek_byte(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    pub fn read_byte(&mut self) -> Result<u8, ParseError> {
        match self.bytes.get(self.pos) {
            Some(byte) => {
                self.pos += 1;
                Ok(*byte)
            }
            None => Err(self.eof(1)),
        }
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], ParseError> {
        if !self.has_at_least(len) {
            return Err(self.eof(len - self.remaining()));
        }
        let bytes = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    /// Splits off the next `len` bytes as an independent reader.
    pub fn sub_reader(&mut self, len: usize) -> Result<Reader<'a>, ParseError> {
        let base = self.pos();
        let bytes = self.read_bytes(len)?;
        Ok(Reader::with_base(bytes, base))
    }

    /// Reads a single byte and fails unless it equals `expected`.
    pub fn expect_byte(&mut self, expected: u8) -> Result<(), ParseError> {
        let offset = self.pos();
        let actual = self.read_byte()?;
        if actual != expected {
            return Err(ParseError::InvalidMarker { offset, expected, actual });
        }
        Ok(())
    }

    // Read and interpret types ------------------------------------------------

    // le
    pub fn read_u32(&mut self) -> Result<u32, ParseError> {
        Ok(LittleEndian::read_u32(self.read_bytes(4)?))
    }

    pub fn read_u64(&mut self) -> Result<u64, ParseError> {
        Ok(LittleEndian::read_u64(self.read_bytes(8)?))
    }

    /// Raw IEEE 754 single bits; kept as an integer so NaN payloads survive.
    pub fn read_f32_bits(&mut self) -> Result<u32, ParseError> {
        self.read_u32()
    }

    pub fn read_f64_bits(&mut self) -> Result<u64, ParseError> {
        self.read_u64()
    }

    pub fn read_v128(&mut self) -> Result<[u8; 16], ParseError> {
        let mut v = [0u8; 16];
        v.copy_from_slice(self.read_bytes(16)?);
        Ok(v)
    }

    pub fn read_vu32(&mut self) -> Result<u32, ParseError> {
        Ok(self.read_unsigned_varint(32)? as u32)
    }

    pub fn read_vu64(&mut self) -> Result<u64, ParseError> {
        self.read_unsigned_varint(64)
    }

    pub fn read_vs32(&mut self) -> Result<i32, ParseError> {
        Ok(self.read_signed_varint(32)? as i32)
    }

    /// Signed 33-bit integer, the encoding of block types.
    pub fn read_vs33(&mut self) -> Result<i64, ParseError> {
        self.read_signed_varint(33)
    }

    pub fn read_vs64(&mut self) -> Result<i64, ParseError> {
        self.read_signed_varint(64)
    }

    /// Unsigned LEB128 holding at most `width` significant bits.
    ///
    /// The encoding may be padded with `0x80` groups up to `ceil(width / 7)`
    /// bytes; the final permitted byte must not continue and must not carry
    /// bits beyond `width`.
    pub fn read_unsigned_varint(&mut self, width: u32) -> Result<u64, ParseError> {
        let offset = self.pos();
        let mut result: u64 = 0;
        let mut shift: u32 = 0;
        loop {
            let byte = self.read_byte()?;
            if width - shift <= 7 {
                let significant = width - shift;
                let unused = if significant >= 7 { 0 } else { (byte & 0x7f) >> significant };
                if byte & 0x80 != 0 || unused != 0 {
                    return Err(ParseError::VarintOverflow { offset, width });
                }
            }
            result |= ((byte & 0x7f) as u64) << shift;
            if byte & 0x80 == 0 {
                return Ok(result);
            }
            shift += 7;
        }
    }

    /// Signed LEB128 holding at most `width` significant bits, sign-extended
    /// to 64. Unused bits of the final permitted byte must all equal the sign
    /// bit.
    pub fn read_signed_varint(&mut self, width: u32) -> Result<i64, ParseError> {
        let offset = self.pos();
        let mut result: i64 = 0;
        let mut shift: u32 = 0;
        loop {
            let byte = self.read_byte()?;
            if width - shift <= 7 {
                let significant = width - shift;
                // Sign bit and everything above it within the 7 payload bits.
                let mask = (0x7fu8 << (significant - 1)) & 0x7f;
                let upper = byte & mask;
                if byte & 0x80 != 0 || (upper != 0 && upper != mask) {
                    return Err(ParseError::VarintOverflow { offset, width });
                }
            }
            result |= ((byte & 0x7f) as i64) << shift;
            shift += 7;
            if byte & 0x80 == 0 {
                if shift < 64 && (byte & 0x40) != 0 {
                    result |= -1i64 << shift;
                }
                return Ok(result);
            }
        }
    }

    // Vectors -----------------------------------------------------------------

    /// Reads a vector length, rejecting counts above `limit` before anything
    /// is allocated for them.
    pub fn read_count(&mut self, what: &'static str, limit: u32) -> Result<u32, ParseError> {
        let count = self.read_vu32()?;
        if count > limit {
            return Err(ParseError::LimitExceeded { what, count, limit });
        }
        Ok(count)
    }

    pub fn read_utf8(&mut self, len: usize) -> Result<String, ParseError> {
        let offset = self.pos();
        let bytes = self.read_bytes(len)?;
        match std::str::from_utf8(bytes) {
            Ok(s) => Ok(s.to_owned()),
            Err(_) => Err(ParseError::InvalidUtf8 { offset }),
        }
    }

    /// Length-prefixed UTF-8 name.
    pub fn read_name(&mut self) -> Result<String, ParseError> {
        let len = self.read_vu32()? as usize;
        self.read_utf8(len)
    }

    pub fn read_u8vec(&mut self) -> Result<&'a [u8], ParseError> {
        let len = self.read_vu32()? as usize;
        self.read_bytes(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::encoding::{measure, ByteSink, Writer};
    use rand::Rng;

    fn vu32(bytes: &[u8]) -> Result<u32, ParseError> {
        Reader::new(bytes).read_vu32()
    }

    fn vs32(bytes: &[u8]) -> Result<i32, ParseError> {
        Reader::new(bytes).read_vs32()
    }

    #[test]
    fn test_read_vu32() {
        assert_eq!(vu32(&[0x08]).unwrap(), 8);
        assert_eq!(vu32(&[0x80, 0x7f]).unwrap(), 16256);
        assert_eq!(vu32(&[0xac, 0x02]).unwrap(), 300);
        assert_eq!(vu32(&[0xff, 0xff, 0xff, 0xff, 0x0f]).unwrap(), u32::MAX);
        // padded zero
        assert_eq!(vu32(&[0x80, 0x80, 0x80, 0x80, 0x00]).unwrap(), 0);
    }

    #[test]
    fn test_read_vu32_rejects_overlong() {
        assert!(matches!(
            vu32(&[0xff, 0xff, 0xff, 0xff, 0x1f]),
            Err(ParseError::VarintOverflow { offset: 0, width: 32 })
        ));
        assert!(matches!(
            vu32(&[0x80, 0x80, 0x80, 0x80, 0x80, 0x00]),
            Err(ParseError::VarintOverflow { .. })
        ));
    }

    #[test]
    fn test_read_vu32_truncated() {
        assert!(matches!(vu32(&[0x80, 0x80]), Err(ParseError::UnexpectedEof { offset: 2, needed: 1 })));
    }

    #[test]
    fn test_read_vs32() {
        assert_eq!(vs32(&[0x7f]).unwrap(), -1);
        assert_eq!(vs32(&[0x80, 0x7f]).unwrap(), -128);
        assert_eq!(vs32(&[0xc0, 0xbb, 0x78]).unwrap(), -123456);
        assert_eq!(vs32(&[0x80, 0x80, 0x80, 0x80, 0x78]).unwrap(), i32::MIN);
        assert_eq!(vs32(&[0xff, 0xff, 0xff, 0xff, 0x07]).unwrap(), i32::MAX);
    }

    #[test]
    fn test_read_vs32_rejects_inconsistent_sign() {
        assert!(matches!(
            vs32(&[0xff, 0xff, 0xff, 0xff, 0x4f]),
            Err(ParseError::VarintOverflow { .. })
        ));
        assert!(matches!(
            vs32(&[0x80, 0x80, 0x80, 0x80, 0x70]),
            Err(ParseError::VarintOverflow { .. })
        ));
    }

    #[test]
    fn test_read_vs64_extremes() {
        let min = [0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x7f];
        assert_eq!(Reader::new(&min).read_vs64().unwrap(), i64::MIN);
        let max = [0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x00];
        assert_eq!(Reader::new(&max).read_vs64().unwrap(), i64::MAX);
    }

    #[test]
    fn test_varint_roundtrip_random() {
        let mut rng = rand::thread_rng();
        for _ in 0..1000 {
            let u: u32 = rng.gen();
            let s: i64 = rng.gen();
            let emit = |w: &mut dyn ByteSink| -> Result<(), crate::encoder::EncodeError> {
                w.write_vu32(u)?;
                w.write_vs64(s)
            };
            let len = measure(|c| emit(c)).unwrap();
            let mut writer = Writer::with_len(len);
            emit(&mut writer).unwrap();
            let bytes = writer.into_bytes();
            let mut reader = Reader::new(&bytes);
            assert_eq!(reader.read_vu32().unwrap(), u);
            assert_eq!(reader.read_vs64().unwrap(), s);
            assert!(reader.is_empty());
        }
    }

    #[test]
    fn test_sub_reader_reports_absolute_offsets() {
        let bytes = [0x01, 0x02, 0x03, 0x80];
        let mut reader = Reader::new(&bytes);
        reader.read_byte().unwrap();
        let mut sub = reader.sub_reader(3).unwrap();
        assert_eq!(sub.pos(), 1);
        sub.read_bytes(2).unwrap();
        assert!(matches!(sub.read_vu32(), Err(ParseError::UnexpectedEof { offset: 4, .. })));
        assert!(reader.is_empty());
    }

    #[test]
    fn test_read_name_rejects_bad_utf8() {
        let bytes = [0x02, 0xc3, 0x28];
        assert!(matches!(Reader::new(&bytes).read_name(), Err(ParseError::InvalidUtf8 { offset: 1 })));
        let bytes = [0x03, b'a', b'b', b'c'];
        assert_eq!(Reader::new(&bytes).read_name().unwrap(), "abc");
    }
}
