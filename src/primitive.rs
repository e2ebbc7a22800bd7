//! PSD-specific scalar readers layered onto [`PsdCursor`].
//!
//! The length-delimited "section" helpers here are the bounded-sub-decode
//! mechanism used throughout: read `section_end()`, decode the contents,
//! then `skip_to` the returned position.

use serde::Serialize;
use std::io::{Read, Seek};

use crate::cursor::PsdCursor;
use crate::error::DecodeError;

/// A 2D point.  Vector-mask knot points arrive normalized to 0..1 relative
/// to the document bounds; gradient geometry uses absolute coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl<R: Read + Seek> PsdCursor<R> {
    /// Read a PSD unicode string: a 4-byte code-unit count followed by that
    /// many big-endian UTF-16 code units.  Code units are not validated;
    /// an unpaired surrogate never fails the decode (assembly is lossy).
    /// When `alignment` is set, pads counting `2 * count` consumed bytes.
    pub fn read_unicode(&mut self, alignment: Option<u64>) -> Result<String, DecodeError> {
        let count = self.read_u32()? as usize;
        let mut units = Vec::with_capacity(count);
        for _ in 0..count {
            units.push(self.read_u16()?);
        }
        if let Some(alignment) = alignment {
            self.skip_padding(2 * count as u64, alignment)?;
        }
        Ok(String::from_utf16_lossy(&units))
    }

    /// Read a PSD 8-bit string (a "Pascal string" in the documentation):
    /// a 1-byte length followed by that many raw bytes.  When `alignment`
    /// is set, pads counting `1 + length` consumed bytes.
    pub fn read_pascal_string(&mut self, alignment: Option<u64>) -> Result<String, DecodeError> {
        let length = self.read_u8()? as usize;
        let raw = self.read_raw(length)?;
        if let Some(alignment) = alignment {
            self.skip_padding(1 + length as u64, alignment)?;
        }
        Ok(String::from_utf8_lossy(&raw).into_owned())
    }

    /// Read a 32-bit fixed-point number with 24 fractional bits.
    pub fn read_fixed(&mut self) -> Result<f64, DecodeError> {
        Ok(self.read_i32()? as f64 / (1u32 << 24) as f64)
    }

    /// Read a 2D point in fixed-point format.  Wire order is y then x.
    pub fn read_point(&mut self) -> Result<Point, DecodeError> {
        let y = self.read_fixed()?;
        let x = self.read_fixed()?;
        Ok(Point { x, y })
    }

    /// Skip an entire section: read the 4-byte section length and skip that
    /// many bytes, then optionally pad the length to `alignment`.
    pub fn skip_section(&mut self, alignment: Option<u64>) -> Result<(), DecodeError> {
        let length = self.read_u32()? as u64;
        self.skip(length as i64)?;
        if let Some(alignment) = alignment {
            self.skip_padding(length, alignment)?;
        }
        Ok(())
    }

    /// Read a 4-byte section length and return the absolute position of the
    /// end of the section.
    pub fn section_end(&mut self) -> Result<u64, DecodeError> {
        let length = self.read_u32()? as u64;
        Ok(self.position() + length)
    }
}
