pub mod cursor;
pub mod descriptor;
pub mod document;
pub mod error;
pub mod gradient;
pub mod layer_info;
pub mod path;
pub mod primitive;

pub use cursor::PsdCursor;
pub use descriptor::{Descriptor, DescriptorValue, Ident, Tag};
pub use document::{Channel, Document, Layer, Rect};
pub use error::DecodeError;
pub use gradient::{construct_gradient, Color, Gradient, GradientGeometry, GradientStop};
pub use layer_info::{CombineMode, ExtraInfo, ExtraMap, PathRecord, SubpathMode, VectorMask};
pub use path::{build_path, construct_path, subpaths_from_records, FillRule, IdGen, VectorFill};
pub use primitive::Point;
