//! Top-level document driver.
//!
//! One forward pass over the stream: 26-byte header, color-mode-data and
//! image-resources sections (skipped), then the layer-and-mask-info section
//! holding the layer list, the global layer mask info (skipped), and the
//! document-level additional-info blocks.  Channel image data byte ranges
//! are recorded on each layer but the data itself is skipped in bulk and
//! never decoded here.

use serde::Serialize;
use std::io::{Read, Seek};

use crate::cursor::PsdCursor;
use crate::descriptor::Tag;
use crate::error::DecodeError;
use crate::layer_info::ExtraMap;

pub const SIGNATURE: &[u8; 4] = b"8BPS";
pub const VERSION: i16 = 1;

/// A bounding rectangle in document pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Rect {
    pub top: i32,
    pub left: i32,
    pub bottom: i32,
    pub right: i32,
}

impl Rect {
    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }
}

/// One channel's pixel-data byte range.  The range is located during the
/// layer pass but the bytes are never decoded by this crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Channel {
    pub id: i16,
    pub length: u32,
}

#[derive(Clone, Debug, Serialize)]
pub struct Layer {
    pub bounds: Rect,
    pub channels: Vec<Channel>,
    /// 4-byte blend mode tag, e.g. `norm` or `mul `.
    pub blend_mode: Tag,
    /// 0 = transparent, 255 = opaque.
    pub opacity: u8,
    /// Whether the layer clips to the layer below.
    pub clipping: bool,
    pub flags: u8,
    pub name: String,
    pub extra: ExtraMap,
}

/// An immutable decoded document.  Layers are in document order, back to
/// front.  `extra` holds document-level additional-info blocks.
#[derive(Clone, Debug, Serialize)]
pub struct Document {
    pub bounds: Rect,
    pub width: u32,
    pub height: u32,
    pub channel_count: u16,
    pub depth: u16,
    pub color_mode: u16,
    pub layers: Vec<Layer>,
    pub extra: ExtraMap,
}

struct Header {
    channel_count: u16,
    height: i32,
    width: i32,
    depth: u16,
    color_mode: u16,
}

impl Document {
    /// Decode one PSD document from a seekable byte source.
    pub fn read<R: Read + Seek>(source: R) -> Result<Self, DecodeError> {
        let mut cursor = PsdCursor::new(source);

        let header = read_header(&mut cursor)?;
        cursor.skip_section(None)?; // color mode data
        cursor.skip_section(None)?; // image resources
        let (layers, extra) = read_layer_and_mask_info(&mut cursor)?;

        Ok(Document {
            bounds: Rect {
                top: 0,
                left: 0,
                bottom: header.height,
                right: header.width,
            },
            width: header.width as u32,
            height: header.height as u32,
            channel_count: header.channel_count,
            depth: header.depth,
            color_mode: header.color_mode,
            layers,
            extra,
        })
    }
}

fn read_header<R: Read + Seek>(cursor: &mut PsdCursor<R>) -> Result<Header, DecodeError> {
    cursor.expect_raw(SIGNATURE, "file signature")?;
    cursor.expect_i16(VERSION, "format version")?;
    cursor.expect_i16(0, "reserved header bytes")?;
    cursor.expect_i32(0, "reserved header bytes")?;
    let channel_count = cursor.read_u16()?;
    let height = cursor.read_i32()?;
    let width = cursor.read_i32()?;
    let depth = cursor.read_u16()?;
    let color_mode = cursor.read_u16()?;
    Ok(Header {
        channel_count,
        height,
        width,
        depth,
        color_mode,
    })
}

fn read_layer_and_mask_info<R: Read + Seek>(
    cursor: &mut PsdCursor<R>,
) -> Result<(Vec<Layer>, ExtraMap), DecodeError> {
    let end = cursor.section_end()?;

    let layers = read_layer_info(cursor)?;
    cursor.skip_section(None)?; // global layer mask info

    let mut extra = ExtraMap::default();
    while cursor.position() < end {
        cursor.read_additional_layer_info(&mut extra)?;
    }
    cursor.skip_to(end)?;

    Ok((layers, extra))
}

fn read_layer_info<R: Read + Seek>(cursor: &mut PsdCursor<R>) -> Result<Vec<Layer>, DecodeError> {
    let end = cursor.section_end()?;

    // A negative count means abs(count) layers, with the first alpha
    // channel holding merged-transparency data.
    let layer_count = cursor.read_i16()?.unsigned_abs();

    let mut layers = Vec::with_capacity(layer_count as usize);
    for _ in 0..layer_count {
        layers.push(read_layer_record(cursor)?);
    }

    // Channel image data for all layers follows; skip it in bulk.
    cursor.skip_to(end)?;
    Ok(layers)
}

fn read_layer_record<R: Read + Seek>(cursor: &mut PsdCursor<R>) -> Result<Layer, DecodeError> {
    let bounds = Rect {
        top: cursor.read_i32()?,
        left: cursor.read_i32()?,
        bottom: cursor.read_i32()?,
        right: cursor.read_i32()?,
    };

    let channel_count = cursor.read_u16()?;
    let mut channels = Vec::with_capacity(channel_count as usize);
    for _ in 0..channel_count {
        channels.push(Channel {
            id: cursor.read_i16()?,
            length: cursor.read_u32()?,
        });
    }

    cursor.expect_raw(crate::layer_info::SIG_8BIM, "blend mode signature")?;
    let blend_mode = cursor.read_tag()?;
    let opacity = cursor.read_u8()?;
    let clipping = cursor.read_u8()? != 0;
    let flags = cursor.read_u8()?;
    cursor.skip(1)?; // filler

    // Extra data section: mask data, blend ranges, name, then a list of
    // additional-info blocks running to the section end.
    let end = cursor.section_end()?;
    cursor.skip_section(None)?; // layer mask data
    cursor.skip_section(None)?; // blend ranges

    let name = cursor.read_pascal_string(Some(4))?;

    let mut extra = ExtraMap::default();
    while cursor.position() < end {
        cursor.read_additional_layer_info(&mut extra)?;
    }

    Ok(Layer {
        bounds,
        channels,
        blend_mode,
        opacity,
        clipping,
        flags,
        name,
        extra,
    })
}
