//! Decoder for "additional layer info" block lists.
//!
//! Block lists appear both per layer and at the document level.  Each block
//! is `signature + key + length-delimited payload`.  The key dispatches to
//! a structured decoder, a known-skip rule, or the unknown-key accumulator;
//! unknown keys are never fatal because their payloads carry their own
//! length and can always be skipped.
//!
//! Vector-mask path records are decoded here too: fixed 26-byte records,
//! with anything shorter than 26 bytes before the section end treated as
//! alignment padding rather than a record.

use serde::Serialize;
use std::collections::BTreeSet;
use std::io::{Read, Seek};

use crate::cursor::PsdCursor;
use crate::descriptor::{Descriptor, Tag};
use crate::error::{dump_bytes, DecodeError};
use crate::primitive::Point;

pub const SIG_8BIM: &[u8; 4] = b"8BIM";
pub const SIG_8B64: &[u8; 4] = b"8B64";

/// Keys that are recognised but carry nothing this decoder needs.  Their
/// length-prefixed payloads are skipped wholesale and nothing is stored.
const IGNORED_KEYS: [&[u8; 4]; 10] = [
    b"clbl", // blend clipping elements
    b"fxrp", // reference point
    b"infx", // blend interior elements
    b"knko", // knockout setting
    b"lclr", // sheet color setting
    b"lnsr", // layer name source setting
    b"lspf", // protected setting
    b"lyid", // layer id
    b"lyvr", // layer version
    b"shmd", // metadata setting
];

// ── Path records ─────────────────────────────────────────────────────────

/// Whether a subpath's endpoints join back to its start.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum SubpathMode {
    Open,
    Closed,
}

/// Boolean operation combining a subpath with the ones before it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum CombineMode {
    /// Wire value 0.
    ExcludeOverlap,
    /// Wire value 1.
    Union,
    /// Wire value 2.
    Subtract,
    /// Wire value -1: this subpath extends the previous one and the two
    /// render as a single item.
    Continuation,
}

impl CombineMode {
    pub fn from_raw(raw: i16) -> Option<Self> {
        match raw {
            0 => Some(CombineMode::ExcludeOverlap),
            1 => Some(CombineMode::Union),
            2 => Some(CombineMode::Subtract),
            -1 => Some(CombineMode::Continuation),
            _ => None,
        }
    }
}

/// One 26-byte entry in a vector mask's raw path stream.
#[derive(Clone, Debug, Serialize)]
pub enum PathRecord {
    SubpathStart {
        mode: SubpathMode,
        knot_count: u16,
        combine: CombineMode,
    },
    Knot {
        mode: SubpathMode,
        /// Whether the knot's handles are linked.
        linked: bool,
        back: Point,
        anchor: Point,
        front: Point,
    },
    PathFillRule,
    Clipboard {
        top: f64,
        left: f64,
        bottom: f64,
        right: f64,
        resolution: f64,
    },
    InitialFillRule {
        value: i16,
    },
}

/// A layer's raw vector mask: a flag word plus the path record stream.
#[derive(Clone, Debug, Serialize)]
pub struct VectorMask {
    pub flags: u32,
    pub records: Vec<PathRecord>,
}

impl VectorMask {
    /// Flag bit 0: the resulting fill is inverted.
    pub fn inverted(&self) -> bool {
        self.flags & 1 != 0
    }

    /// Flag bit 2: the mask is disabled and contributes no subpaths.
    pub fn disabled(&self) -> bool {
        self.flags & 4 != 0
    }
}

// ── Decoded block values ─────────────────────────────────────────────────

/// Decoded payload of one recognised additional-info block.
#[derive(Clone, Debug, Serialize)]
pub enum ExtraInfo {
    /// `luni`: the layer's unicode name.
    UnicodeName(String),
    /// `lsct` / `lsdk`: group divider type.
    SectionDivider(i32),
    /// `vmsk` / `vsms`: vector mask path data.
    VectorMask(VectorMask),
    /// `vstk`, `SoCo`, `lfx2`: a bare descriptor.
    Descriptor(Descriptor),
    /// `vscg`: a descriptor preceded by an inner content key.
    KeyedDescriptor { key: Tag, descriptor: Descriptor },
}

/// Keyed additional-info collection attached to a layer or to the document.
/// Entries keep wire order; unrecognised keys land in `unknown`.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ExtraMap {
    entries: Vec<(Tag, ExtraInfo)>,
    unknown: BTreeSet<Tag>,
}

impl ExtraMap {
    pub fn get(&self, key: &[u8; 4]) -> Option<&ExtraInfo> {
        self.entries
            .iter()
            .find(|(k, _)| k.as_bytes() == key)
            .map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &Tag> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn unknown_keys(&self) -> &BTreeSet<Tag> {
        &self.unknown
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.unknown.is_empty()
    }

    /// The layer's vector mask, under either the documented key or its
    /// undocumented alias.
    pub fn vector_mask(&self) -> Option<&VectorMask> {
        let value = self.get(b"vmsk").or_else(|| self.get(b"vsms"))?;
        match value {
            ExtraInfo::VectorMask(mask) => Some(mask),
            _ => None,
        }
    }

    fn insert(&mut self, key: Tag, value: ExtraInfo) {
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }
}

// ── Decoder ──────────────────────────────────────────────────────────────

impl<R: Read + Seek> PsdCursor<R> {
    /// Read one additional-layer-info block into `map`.
    pub fn read_additional_layer_info(&mut self, map: &mut ExtraMap) -> Result<(), DecodeError> {
        let offset = self.position();
        let sig = self.read_raw(4)?;
        if sig.as_slice() != SIG_8BIM && sig.as_slice() != SIG_8B64 {
            return Err(DecodeError::Structural {
                what: "additional layer info signature",
                offset,
                found: dump_bytes(&sig),
            });
        }
        let key = self.read_tag()?;

        match key.as_bytes() {
            b"luni" => {
                // The declared length is redundant with the string's own
                // length prefix and is not used to reposition.
                let _end = self.section_end()?;
                let name = self.read_unicode(Some(4))?;
                map.insert(key, ExtraInfo::UnicodeName(name));
            }
            // lsdk is undocumented; it decodes identically to lsct.
            b"lsct" | b"lsdk" => {
                let end = self.section_end()?;
                let divider = self.read_i32()?;
                self.skip_to(end)?;
                map.insert(key, ExtraInfo::SectionDivider(divider));
            }
            // vsms is undocumented; it decodes identically to vmsk.
            b"vmsk" | b"vsms" => {
                let end = self.section_end()?;
                self.expect_i32(3, "vector mask version")?;
                let flags = self.read_u32()?;

                let mut records = Vec::new();
                // Fewer than 26 bytes before the section end is padding,
                // not a record.
                while self.position() + 26 <= end {
                    records.push(self.read_path_record()?);
                }
                self.skip_to(end)?;
                map.insert(key, ExtraInfo::VectorMask(VectorMask { flags, records }));
            }
            b"vscg" => {
                let end = self.section_end()?;
                let inner = self.read_tag()?;
                self.expect_i32(16, "vector stroke content version")?;
                let descriptor = self.read_descriptor()?;
                self.skip_to(end)?;
                map.insert(
                    key,
                    ExtraInfo::KeyedDescriptor {
                        key: inner,
                        descriptor,
                    },
                );
            }
            // vstk is undocumented but carries the same version-prefixed
            // descriptor layout as SoCo.
            b"vstk" | b"SoCo" => {
                let end = self.section_end()?;
                self.expect_i32(16, "descriptor version")?;
                let descriptor = self.read_descriptor()?;
                // The descriptor is padded to a multiple of 4 bytes.
                self.skip_to(end)?;
                map.insert(key, ExtraInfo::Descriptor(descriptor));
            }
            b"lfx2" => {
                let end = self.section_end()?;
                self.expect_i32(0, "effects header")?;
                self.expect_i32(16, "effects descriptor version")?;
                let descriptor = self.read_descriptor()?;
                self.skip_to(end)?;
                map.insert(key, ExtraInfo::Descriptor(descriptor));
            }
            b"Txt2" => {
                // Text engine data.  Its declared length rounds up to an
                // even boundary, not the usual 4-byte one.
                self.skip_section(Some(2))?;
            }
            k if IGNORED_KEYS.contains(&k) => {
                self.skip_section(None)?;
            }
            _ => {
                map.unknown.insert(key);
                self.skip_section(None)?;
            }
        }
        Ok(())
    }

    /// Read one 26-byte path record.
    pub fn read_path_record(&mut self) -> Result<PathRecord, DecodeError> {
        let offset = self.position();
        let selector = self.read_i16()?;

        Ok(match selector {
            0 | 3 => {
                let mode = if selector < 3 {
                    SubpathMode::Closed
                } else {
                    SubpathMode::Open
                };
                let knot_count = self.read_u16()?;
                let raw = self.read_i16()?;
                let combine = CombineMode::from_raw(raw).ok_or(
                    DecodeError::UnsupportedCombineMode { value: raw, offset },
                )?;
                self.skip(20)?;
                PathRecord::SubpathStart {
                    mode,
                    knot_count,
                    combine,
                }
            }
            1 | 2 | 4 | 5 => PathRecord::Knot {
                mode: if selector < 3 {
                    SubpathMode::Closed
                } else {
                    SubpathMode::Open
                },
                linked: selector == 1 || selector == 4,
                back: self.read_point()?,
                anchor: self.read_point()?,
                front: self.read_point()?,
            },
            6 => {
                self.skip(24)?;
                PathRecord::PathFillRule
            }
            7 => {
                let top = self.read_fixed()?;
                let left = self.read_fixed()?;
                let bottom = self.read_fixed()?;
                let right = self.read_fixed()?;
                let resolution = self.read_fixed()?;
                self.skip(4)?;
                PathRecord::Clipboard {
                    top,
                    left,
                    bottom,
                    right,
                    resolution,
                }
            }
            8 => {
                let value = self.read_i16()?;
                self.skip(22)?;
                PathRecord::InitialFillRule { value }
            }
            _ => return Err(DecodeError::UnsupportedPathRecord { selector, offset }),
        })
    }
}
