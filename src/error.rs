use std::io;
use thiserror::Error;

/// Errors raised while decoding a PSD stream.
///
/// Every variant is fatal to the in-progress decode; there is no retry or
/// best-effort path.  Unrecognised additional-layer-info keys are the one
/// recoverable case, and those never surface here (they are recorded on the
/// target map and skipped).
#[derive(Error, Debug)]
pub enum DecodeError {
    /// A required constant did not match (signature, version, reserved
    /// field, type-code header).  `found` is a hex+ASCII rendering of the
    /// bytes at the failure point.
    #[error("structural mismatch at offset {offset} ({what}): found {found}")]
    Structural {
        what: &'static str,
        offset: u64,
        found: String,
    },
    /// A descriptor value carried a type tag outside the closed schema.
    /// The payload length is tag-dependent, so the value cannot be skipped.
    #[error("unsupported descriptor value type '{tag}' at offset {offset}")]
    UnsupportedDescriptorType { tag: String, offset: u64 },
    /// A path record selector outside the closed record set.
    #[error("unsupported path record selector {selector} at offset {offset}")]
    UnsupportedPathRecord { selector: i16, offset: u64 },
    /// A subpath combine mode outside {-1, 0, 1, 2}.
    #[error("unsupported subpath combine mode {value} at offset {offset}")]
    UnsupportedCombineMode { value: i16, offset: u64 },
    #[error("unexpected end of stream at offset {offset} ({needed} byte(s) required)")]
    EndOfStream { offset: u64, needed: usize },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Render `buf` as `hex |ascii|`, the form used in structural errors.
/// Non-printable bytes show as '.' on the ASCII side.
pub fn dump_bytes(buf: &[u8]) -> String {
    let ascii: String = buf
        .iter()
        .map(|&b| if (0x20..0x7f).contains(&b) { b as char } else { '.' })
        .collect();
    format!("{} |{}|", hex::encode(buf), ascii)
}
