//! Bounded-buffer CBOR writer.

use crate::error::{CodecError, CodecResult};

/// A CBOR writer over a caller-provided fixed-size buffer.
///
/// The writer never allocates; once the buffer is exhausted every further
/// write fails with [`CodecError::BufferTooSmall`]. Integer arguments use
/// the shortest encoding.
pub struct Writer<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> Writer<'a> {
    /// Create a new writer over the given buffer.
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Number of bytes written so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Write a signed integer (major type 0 or 1).
    #[allow(clippy::cast_sign_loss)]
    pub fn integer(&mut self, n: i64) -> CodecResult<()> {
        if n >= 0 {
            self.type_and_argument(0, n as u64)
        } else {
            // CBOR negative integers encode -(n+1)
            self.type_and_argument(1, (-(n + 1)) as u64)
        }
    }

    /// Write an unsigned integer (major type 0).
    pub fn unsigned(&mut self, n: u64) -> CodecResult<()> {
        self.type_and_argument(0, n)
    }

    /// Write a text string.
    pub fn text(&mut self, s: &str) -> CodecResult<()> {
        self.type_and_argument(3, s.len() as u64)?;
        self.push_slice(s.as_bytes())
    }

    /// Write a boolean simple value.
    pub fn boolean(&mut self, b: bool) -> CodecResult<()> {
        self.push(if b { 0xf5 } else { 0xf4 })
    }

    /// Write a single-precision float.
    pub fn float32(&mut self, v: f32) -> CodecResult<()> {
        self.push(0xfa)?;
        self.push_slice(&v.to_be_bytes())
    }

    /// Write a double-precision float.
    pub fn float64(&mut self, v: f64) -> CodecResult<()> {
        self.push(0xfb)?;
        self.push_slice(&v.to_be_bytes())
    }

    /// Write a definite-length map header.
    pub fn map_header(&mut self, pairs: u64) -> CodecResult<()> {
        self.type_and_argument(5, pairs)
    }

    /// Write a definite-length array header.
    pub fn array_header(&mut self, items: u64) -> CodecResult<()> {
        self.type_and_argument(4, items)
    }

    /// Open an indefinite-length array.
    pub fn begin_indefinite_array(&mut self) -> CodecResult<()> {
        self.push(0x9f)
    }

    /// Write the break marker terminating an indefinite-length container.
    pub fn break_marker(&mut self) -> CodecResult<()> {
        self.push(0xff)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn type_and_argument(&mut self, major: u8, value: u64) -> CodecResult<()> {
        let mt = major << 5;

        if value < 24 {
            self.push(mt | (value as u8))
        } else if u8::try_from(value).is_ok() {
            self.push(mt | 24)?;
            self.push(value as u8)
        } else if u16::try_from(value).is_ok() {
            self.push(mt | 25)?;
            self.push_slice(&(value as u16).to_be_bytes())
        } else if u32::try_from(value).is_ok() {
            self.push(mt | 26)?;
            self.push_slice(&(value as u32).to_be_bytes())
        } else {
            self.push(mt | 27)?;
            self.push_slice(&value.to_be_bytes())
        }
    }

    #[inline]
    fn push(&mut self, byte: u8) -> CodecResult<()> {
        if self.pos >= self.buf.len() {
            return Err(CodecError::BufferTooSmall);
        }
        self.buf[self.pos] = byte;
        self.pos += 1;
        Ok(())
    }

    #[inline]
    fn push_slice(&mut self, bytes: &[u8]) -> CodecResult<()> {
        if self.pos + bytes.len() > self.buf.len() {
            return Err(CodecError::BufferTooSmall);
        }
        self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
        Ok(())
    }
}
