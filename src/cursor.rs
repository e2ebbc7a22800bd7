//! Sequential big-endian reader with authoritative position tracking.
//!
//! [`PsdCursor`] owns the byte source for the whole decode; every read and
//! seek goes through it, so `position()` never diverges from the source's
//! real position.  All multi-byte integers in the format are big-endian.
//!
//! The format-specific scalar readers (strings, fixed point, sections)
//! live in `primitive.rs` as a second method set on this same type.

use byteorder::{BigEndian, ReadBytesExt};
use std::io::{self, Read, Seek, SeekFrom};

use crate::error::{dump_bytes, DecodeError};

pub struct PsdCursor<R> {
    inner: R,
    pos: u64,
}

impl<R: Read + Seek> PsdCursor<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, pos: 0 }
    }

    /// Current byte offset from the start of the stream.
    pub fn position(&self) -> u64 {
        self.pos
    }

    fn stream_error(&self, err: io::Error, needed: usize) -> DecodeError {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            DecodeError::EndOfStream {
                offset: self.pos,
                needed,
            }
        } else {
            DecodeError::Io(err)
        }
    }

    /// Read the next `n` bytes.
    pub fn read_raw(&mut self, n: usize) -> Result<Vec<u8>, DecodeError> {
        let mut buf = vec![0u8; n];
        self.inner
            .read_exact(&mut buf)
            .map_err(|e| self.stream_error(e, n))?;
        self.pos += n as u64;
        Ok(buf)
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        let v = self.inner.read_u8().map_err(|e| self.stream_error(e, 1))?;
        self.pos += 1;
        Ok(v)
    }

    pub fn read_i8(&mut self) -> Result<i8, DecodeError> {
        let v = self.inner.read_i8().map_err(|e| self.stream_error(e, 1))?;
        self.pos += 1;
        Ok(v)
    }

    pub fn read_u16(&mut self) -> Result<u16, DecodeError> {
        let v = self
            .inner
            .read_u16::<BigEndian>()
            .map_err(|e| self.stream_error(e, 2))?;
        self.pos += 2;
        Ok(v)
    }

    pub fn read_i16(&mut self) -> Result<i16, DecodeError> {
        let v = self
            .inner
            .read_i16::<BigEndian>()
            .map_err(|e| self.stream_error(e, 2))?;
        self.pos += 2;
        Ok(v)
    }

    pub fn read_u32(&mut self) -> Result<u32, DecodeError> {
        let v = self
            .inner
            .read_u32::<BigEndian>()
            .map_err(|e| self.stream_error(e, 4))?;
        self.pos += 4;
        Ok(v)
    }

    pub fn read_i32(&mut self) -> Result<i32, DecodeError> {
        let v = self
            .inner
            .read_i32::<BigEndian>()
            .map_err(|e| self.stream_error(e, 4))?;
        self.pos += 4;
        Ok(v)
    }

    pub fn read_u64(&mut self) -> Result<u64, DecodeError> {
        let v = self
            .inner
            .read_u64::<BigEndian>()
            .map_err(|e| self.stream_error(e, 8))?;
        self.pos += 8;
        Ok(v)
    }

    pub fn read_i64(&mut self) -> Result<i64, DecodeError> {
        let v = self
            .inner
            .read_i64::<BigEndian>()
            .map_err(|e| self.stream_error(e, 8))?;
        self.pos += 8;
        Ok(v)
    }

    /// Read a big-endian 8-byte IEEE-754 value.
    pub fn read_f64(&mut self) -> Result<f64, DecodeError> {
        let v = self
            .inner
            .read_f64::<BigEndian>()
            .map_err(|e| self.stream_error(e, 8))?;
        self.pos += 8;
        Ok(v)
    }

    /// Move the logical position by `delta` bytes, forward or backward,
    /// repositioning the underlying source through the cursor.
    pub fn skip(&mut self, delta: i64) -> Result<(), DecodeError> {
        self.inner.seek(SeekFrom::Current(delta))?;
        self.pos = (self.pos as i64 + delta) as u64;
        Ok(())
    }

    /// Skip to an absolute position.
    pub fn skip_to(&mut self, pos: u64) -> Result<(), DecodeError> {
        self.skip(pos as i64 - self.pos as i64)
    }

    /// Skip the padding bytes at the end of a structure `size` bytes long
    /// that is padded to the next multiple of `alignment`.  No-op when the
    /// size is already aligned.
    pub fn skip_padding(&mut self, size: u64, alignment: u64) -> Result<(), DecodeError> {
        if size % alignment == 0 {
            return Ok(());
        }
        self.skip((alignment - size % alignment) as i64)
    }

    // ── Structural expectations ──────────────────────────────────────────

    /// Read `expected.len()` bytes and require them to equal `expected`.
    pub fn expect_raw(&mut self, expected: &[u8], what: &'static str) -> Result<(), DecodeError> {
        let offset = self.pos;
        let found = self.read_raw(expected.len())?;
        if found != expected {
            return Err(DecodeError::Structural {
                what,
                offset,
                found: dump_bytes(&found),
            });
        }
        Ok(())
    }

    /// Read a signed 16-bit value and require it to equal `expected`.
    pub fn expect_i16(&mut self, expected: i16, what: &'static str) -> Result<(), DecodeError> {
        let offset = self.pos;
        let found = self.read_i16()?;
        if found != expected {
            return Err(DecodeError::Structural {
                what,
                offset,
                found: dump_bytes(&found.to_be_bytes()),
            });
        }
        Ok(())
    }

    /// Read a signed 32-bit value and require it to equal `expected`.
    pub fn expect_i32(&mut self, expected: i32, what: &'static str) -> Result<(), DecodeError> {
        let offset = self.pos;
        let found = self.read_i32()?;
        if found != expected {
            return Err(DecodeError::Structural {
                what,
                offset,
                found: dump_bytes(&found.to_be_bytes()),
            });
        }
        Ok(())
    }
}
