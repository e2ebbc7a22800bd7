//! Recursive decoder for the typed property-list ("descriptor") format.
//!
//! Descriptors are self-describing nested objects used for effects, stroke
//! and fill parameters.  Each item is an identifier, a 4-byte type tag, and
//! a value whose shape depends on the tag.  The tag space is closed: the
//! payload length of an unknown tag cannot be known, so an unknown tag is a
//! fatal [`DecodeError::UnsupportedDescriptorType`] rather than a skip.

use serde::{Serialize, Serializer};
use std::fmt;
use std::io::{Read, Seek};

use crate::cursor::PsdCursor;
use crate::error::DecodeError;

// ── Identifiers ──────────────────────────────────────────────────────────

/// A literal 4-byte tag as it appears on the wire (type tags, block keys,
/// blend modes, unit identifiers).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tag(pub [u8; 4]);

impl Tag {
    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            if (0x20..0x7f).contains(&b) {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{b:02x}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tag({self})")
    }
}

impl Serialize for Tag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// A descriptor identifier: either a literal 4-byte tag (prefixed length of
/// zero on the wire) or a length-prefixed byte string.  Both forms are map
/// keys and compare by exact byte content.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ident(Vec<u8>);

impl Ident {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is(&self, key: &[u8]) -> bool {
        self.0 == key
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            if (0x20..0x7f).contains(&b) {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{b:02x}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ident({self})")
    }
}

impl Serialize for Ident {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

// ── Value tree ───────────────────────────────────────────────────────────

/// One decoded descriptor object: an ordered mapping of identifier to value.
/// Keys are unique within one object (a later duplicate replaces the
/// earlier entry).  The name and class id are pass-through metadata.
#[derive(Clone, Debug, Serialize)]
pub struct Descriptor {
    pub name: String,
    pub class_id: Ident,
    pub items: Vec<(Ident, DescriptorValue)>,
}

impl Descriptor {
    pub fn get(&self, key: &[u8]) -> Option<&DescriptorValue> {
        self.items
            .iter()
            .find(|(k, _)| k.as_bytes() == key)
            .map(|(_, v)| v)
    }

    fn insert(&mut self, key: Ident, value: DescriptorValue) {
        if let Some(entry) = self.items.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = value;
        } else {
            self.items.push((key, value));
        }
    }
}

/// A descriptor value, dispatched by its 4-byte type tag.  The variant set
/// is closed; see the module docs for why unknown tags are fatal.
#[derive(Clone, Debug, Serialize)]
pub enum DescriptorValue {
    /// `Objc`: a nested object.
    Object(Descriptor),
    /// `doub`: an IEEE-754 double.
    Double(f64),
    /// `UntF`: a double carrying a unit tag, e.g. `#Ang` or `#Prc`.
    Unit { units: Tag, value: f64 },
    /// `bool`: a single non-zero-is-true byte.
    Boolean(bool),
    /// `enum`: a type identifier and a value identifier.
    Enum { type_id: Ident, value: Ident },
    /// `TEXT`: a unicode string.
    Text(String),
    /// `VlLs`: an ordered list of values, each with its own type tag.
    List(Vec<DescriptorValue>),
    /// `long`: a 32-bit signed integer.
    Integer(i32),
}

impl DescriptorValue {
    pub fn object(&self) -> Option<&Descriptor> {
        match self {
            DescriptorValue::Object(d) => Some(d),
            _ => None,
        }
    }

    pub fn double(&self) -> Option<f64> {
        match self {
            DescriptorValue::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn unit(&self) -> Option<(Tag, f64)> {
        match self {
            DescriptorValue::Unit { units, value } => Some((*units, *value)),
            _ => None,
        }
    }

    pub fn boolean(&self) -> Option<bool> {
        match self {
            DescriptorValue::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn enumeration(&self) -> Option<(&Ident, &Ident)> {
        match self {
            DescriptorValue::Enum { type_id, value } => Some((type_id, value)),
            _ => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            DescriptorValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn list(&self) -> Option<&[DescriptorValue]> {
        match self {
            DescriptorValue::List(v) => Some(v),
            _ => None,
        }
    }

    pub fn integer(&self) -> Option<i32> {
        match self {
            DescriptorValue::Integer(v) => Some(*v),
            _ => None,
        }
    }
}

// ── Decoder ──────────────────────────────────────────────────────────────

impl<R: Read + Seek> PsdCursor<R> {
    pub(crate) fn read_tag(&mut self) -> Result<Tag, DecodeError> {
        let raw = self.read_raw(4)?;
        Ok(Tag([raw[0], raw[1], raw[2], raw[3]]))
    }

    /// Read one descriptor object: name, class identifier, then an item
    /// count and that many (identifier, type tag, value) triples.
    pub fn read_descriptor(&mut self) -> Result<Descriptor, DecodeError> {
        // The name's 2-byte alignment is a no-op (2 * count is even); kept
        // for wire fidelity.
        let name = self.read_unicode(Some(2))?;
        let class_id = self.read_descriptor_id()?;
        let item_count = self.read_u32()?;

        let mut result = Descriptor {
            name,
            class_id,
            items: Vec::with_capacity(item_count as usize),
        };
        for _ in 0..item_count {
            let key = self.read_descriptor_id()?;
            let type_tag = self.read_tag()?;
            let value = self.read_descriptor_value(type_tag)?;
            result.insert(key, value);
        }
        Ok(result)
    }

    /// Read an identifier: a 4-byte length prefix, then either that many
    /// raw bytes, or the next literal 4 bytes when the prefix is zero.
    fn read_descriptor_id(&mut self) -> Result<Ident, DecodeError> {
        let length = self.read_u32()?;
        let raw = if length != 0 {
            self.read_raw(length as usize)?
        } else {
            self.read_raw(4)?
        };
        Ok(Ident(raw))
    }

    fn read_descriptor_value(&mut self, type_tag: Tag) -> Result<DescriptorValue, DecodeError> {
        Ok(match type_tag.as_bytes() {
            b"Objc" => DescriptorValue::Object(self.read_descriptor()?),
            b"doub" => DescriptorValue::Double(self.read_f64()?),
            b"UntF" => {
                let units = self.read_tag()?;
                let value = self.read_f64()?;
                DescriptorValue::Unit { units, value }
            }
            b"bool" => DescriptorValue::Boolean(self.read_u8()? != 0),
            b"enum" => {
                let type_id = self.read_descriptor_id()?;
                let value = self.read_descriptor_id()?;
                DescriptorValue::Enum { type_id, value }
            }
            b"TEXT" => DescriptorValue::Text(self.read_unicode(Some(2))?),
            b"VlLs" => {
                let count = self.read_u32()?;
                let mut values = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    let tag = self.read_tag()?;
                    values.push(self.read_descriptor_value(tag)?);
                }
                DescriptorValue::List(values)
            }
            b"long" => DescriptorValue::Integer(self.read_i32()?),
            _ => {
                return Err(DecodeError::UnsupportedDescriptorType {
                    tag: type_tag.to_string(),
                    offset: self.position() - 4,
                })
            }
        })
    }
}
