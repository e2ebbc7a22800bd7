//! Gradient reconstruction from stroke/fill descriptors.
//!
//! A gradient descriptor carries separate color-stop and opacity-stop
//! lists keyed by integer location, plus angle, scale, offset and type.
//! [`construct_gradient`] merges the stop lists into normalized output
//! stops and derives linear or radial endpoint geometry relative to a
//! bounding box.  Everything here is fatal on unsupported shapes: the
//! caller gets a usable gradient or an error, never a partial one.

use serde::Serialize;
use thiserror::Error;

use crate::descriptor::{Descriptor, DescriptorValue, Ident};
use crate::document::Rect;
use crate::primitive::Point;

pub const UNIT_ANGLE: &[u8; 4] = b"#Ang";
pub const UNIT_PERCENT: &[u8; 4] = b"#Prc";

#[derive(Error, Debug)]
pub enum GradientError {
    #[error("gradient descriptor is missing item '{0}'")]
    MissingItem(String),
    #[error("gradient item '{key}' has the wrong shape")]
    WrongShape { key: String },
    #[error("gradient item '{key}' must be in unit '{expected}', found '{found}'")]
    WrongUnit {
        key: String,
        expected: String,
        found: String,
    },
    #[error("off-bounds gradient alignment is not supported")]
    AlignmentDisabled,
    #[error("a translucent gradient overlay requires a base color to blend against")]
    TranslucentWithoutBase,
    #[error("unsupported gradient blend mode '{0}'; only 'Nrml' is implemented")]
    UnsupportedBlendMode(String),
    #[error("unsupported gradient type '{0}'")]
    UnsupportedType(String),
    #[error("gradient has no stops")]
    NoStops,
    #[error("gradient stops span a single location")]
    DegenerateStops,
}

/// An RGB color with 0-255 float components.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

/// One output stop.  `position` is normalized to 0..1 across the merged
/// color+opacity location set; `opacity` is 0..1.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct GradientStop {
    pub position: f64,
    pub color: Color,
    pub opacity: f64,
}

/// Endpoint geometry in absolute coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub enum GradientGeometry {
    Linear { x1: f64, y1: f64, x2: f64, y2: f64 },
    Radial { cx: f64, cy: f64, radius: f64 },
}

#[derive(Clone, Debug, Serialize)]
pub struct Gradient {
    pub geometry: GradientGeometry,
    pub stops: Vec<GradientStop>,
}

// ── Descriptor access ────────────────────────────────────────────────────

fn key_name(key: &[u8]) -> String {
    String::from_utf8_lossy(key).into_owned()
}

fn item<'a>(desc: &'a Descriptor, key: &[u8]) -> Result<&'a DescriptorValue, GradientError> {
    desc.get(key)
        .ok_or_else(|| GradientError::MissingItem(key_name(key)))
}

fn unit_value(desc: &Descriptor, key: &[u8], expected: &[u8; 4]) -> Result<f64, GradientError> {
    match item(desc, key)? {
        DescriptorValue::Unit { units, value } if units.as_bytes() == expected => Ok(*value),
        DescriptorValue::Unit { units, .. } => Err(GradientError::WrongUnit {
            key: key_name(key),
            expected: key_name(expected),
            found: units.to_string(),
        }),
        _ => Err(GradientError::WrongShape { key: key_name(key) }),
    }
}

fn bool_value(desc: &Descriptor, key: &[u8]) -> Result<bool, GradientError> {
    item(desc, key)?
        .boolean()
        .ok_or_else(|| GradientError::WrongShape { key: key_name(key) })
}

fn double_value(desc: &Descriptor, key: &[u8]) -> Result<f64, GradientError> {
    item(desc, key)?
        .double()
        .ok_or_else(|| GradientError::WrongShape { key: key_name(key) })
}

fn int_value(desc: &Descriptor, key: &[u8]) -> Result<i32, GradientError> {
    item(desc, key)?
        .integer()
        .ok_or_else(|| GradientError::WrongShape { key: key_name(key) })
}

fn object_value<'a>(desc: &'a Descriptor, key: &[u8]) -> Result<&'a Descriptor, GradientError> {
    item(desc, key)?
        .object()
        .ok_or_else(|| GradientError::WrongShape { key: key_name(key) })
}

fn list_value<'a>(desc: &'a Descriptor, key: &[u8]) -> Result<&'a [DescriptorValue], GradientError> {
    item(desc, key)?
        .list()
        .ok_or_else(|| GradientError::WrongShape { key: key_name(key) })
}

fn enum_value<'a>(
    desc: &'a Descriptor,
    key: &[u8],
) -> Result<(&'a Ident, &'a Ident), GradientError> {
    item(desc, key)?
        .enumeration()
        .ok_or_else(|| GradientError::WrongShape { key: key_name(key) })
}

// ── Geometry ─────────────────────────────────────────────────────────────

/// Endpoints for a gradient with the given angle and scale on a layer with
/// the given bounds.  The half-length reaches whichever box edge the
/// direction vector hits first; a zero direction component means infinite
/// reach on that axis.  Endpoints sit symmetric about the box center.
pub fn compute_gradient_points(bounds: &Rect, angle_deg: f64, scale: f64) -> (Point, Point) {
    let theta = angle_deg.to_radians();
    let dx = theta.cos();
    let dy = -theta.sin();

    let fx = if dx != 0.0 {
        bounds.width() as f64 / 2.0 / dx
    } else {
        f64::INFINITY
    };
    let fy = if dy != 0.0 {
        bounds.height() as f64 / 2.0 / dy
    } else {
        f64::INFINITY
    };
    let f = fx.abs().min(fy.abs()) * scale;

    let mid_x = (bounds.right + bounds.left) as f64 / 2.0;
    let mid_y = (bounds.bottom + bounds.top) as f64 / 2.0;

    (
        Point {
            x: mid_x - dx * f,
            y: mid_y - dy * f,
        },
        Point {
            x: mid_x + dx * f,
            y: mid_y + dy * f,
        },
    )
}

/// Per-axis offset in absolute units from an `Ofst` sub-descriptor.  Both
/// axes must be percent-unit; off-percent offsets are unsupported.
pub fn compute_gradient_offset(bounds: &Rect, offset: &Descriptor) -> Result<(f64, f64), GradientError> {
    let horizontal = unit_value(offset, b"Hrzn", UNIT_PERCENT)?;
    let vertical = unit_value(offset, b"Vrtc", UNIT_PERCENT)?;
    Ok((
        bounds.width() as f64 * (horizontal / 100.0),
        bounds.height() as f64 * (vertical / 100.0),
    ))
}

// ── Stops ────────────────────────────────────────────────────────────────

struct ColorStop {
    location: i32,
    color: Color,
}

struct OpacityStop {
    location: i32,
    /// 0..1.
    opacity: f64,
}

fn parse_color_stops(items: &[DescriptorValue]) -> Result<Vec<ColorStop>, GradientError> {
    let mut stops = Vec::with_capacity(items.len());
    for value in items {
        let desc = value
            .object()
            .ok_or_else(|| GradientError::WrongShape { key: "Clrs".into() })?;
        let color_desc = object_value(desc, b"Clr ")?;
        stops.push(ColorStop {
            location: int_value(desc, b"Lctn")?,
            color: Color {
                r: double_value(color_desc, b"Rd  ")?,
                g: double_value(color_desc, b"Grn ")?,
                b: double_value(color_desc, b"Bl  ")?,
            },
        });
    }
    stops.sort_by_key(|s| s.location);
    Ok(stops)
}

fn parse_opacity_stops(items: &[DescriptorValue]) -> Result<Vec<OpacityStop>, GradientError> {
    let mut stops = Vec::with_capacity(items.len());
    for value in items {
        let desc = value
            .object()
            .ok_or_else(|| GradientError::WrongShape { key: "Trns".into() })?;
        stops.push(OpacityStop {
            location: int_value(desc, b"Lctn")?,
            opacity: unit_value(desc, b"Opct", UNIT_PERCENT)? / 100.0,
        });
    }
    stops.sort_by_key(|s| s.location);
    Ok(stops)
}

fn color_at(stops: &[ColorStop], location: i32) -> Color {
    if let Some(stop) = stops.iter().find(|s| s.location == location) {
        return stop.color;
    }
    if location < stops[0].location {
        return stops[0].color;
    }
    let last = &stops[stops.len() - 1];
    if location >= last.location {
        return last.color;
    }

    for pair in stops.windows(2) {
        if location < pair[1].location {
            let (a, b) = (&pair[0], &pair[1]);
            let length = (b.location - a.location) as f64;
            let aw = (location - a.location) as f64 / length;
            let bw = (b.location - location) as f64 / length;
            return Color {
                r: aw * a.color.r + bw * b.color.r,
                g: aw * a.color.g + bw * b.color.g,
                b: aw * a.color.b + bw * b.color.b,
            };
        }
    }
    unreachable!("location is inside the stop range");
}

fn opacity_at(stops: &[OpacityStop], location: i32) -> f64 {
    if let Some(stop) = stops.iter().find(|s| s.location == location) {
        return stop.opacity;
    }
    if location < stops[0].location {
        return stops[0].opacity;
    }
    let last = &stops[stops.len() - 1];
    if location >= last.location {
        return last.opacity;
    }

    for pair in stops.windows(2) {
        if location < pair[1].location {
            let (a, b) = (&pair[0], &pair[1]);
            let length = (b.location - a.location) as f64;
            // Each bracket endpoint weighs in as 1 - dist/length, where
            // 'dist' is the distance from the query to that endpoint.
            let aw = 1.0 - (location - a.location) as f64 / length;
            let bw = 1.0 - (b.location - location) as f64 / length;
            return aw * a.opacity + bw * b.opacity;
        }
    }
    unreachable!("location is inside the stop range");
}

fn blend_with_base(
    color: Color,
    opacity: f64,
    base_color: Option<Color>,
    global_opacity: f64,
) -> (Color, f64) {
    let Some(base) = base_color else {
        return (color, opacity);
    };

    let opacity = opacity * global_opacity / 100.0;
    let c1 = opacity;
    let c2 = 1.0 - opacity;

    // Opacity is baked into the color once blended.
    (
        Color {
            r: color.r * c1 + base.r * c2,
            g: color.g * c1 + base.g * c2,
            b: color.b * c1 + base.b * c2,
        },
        1.0,
    )
}

/// Merge the color and opacity stop lists into normalized output stops.
pub fn construct_gradient_stops(
    colors: &[DescriptorValue],
    transparency: &[DescriptorValue],
    base_color: Option<Color>,
    global_opacity: f64,
) -> Result<Vec<GradientStop>, GradientError> {
    let color_stops = parse_color_stops(colors)?;
    let opacity_stops = parse_opacity_stops(transparency)?;

    let mut locations: Vec<i32> = color_stops
        .iter()
        .map(|s| s.location)
        .chain(opacity_stops.iter().map(|s| s.location))
        .collect();
    locations.sort_unstable();
    locations.dedup();

    let (&min_location, &max_location) = match (locations.first(), locations.last()) {
        (Some(min), Some(max)) => (min, max),
        _ => return Err(GradientError::NoStops),
    };
    if min_location == max_location {
        return Err(GradientError::DegenerateStops);
    }
    if color_stops.is_empty() || opacity_stops.is_empty() {
        return Err(GradientError::NoStops);
    }

    let mut stops = Vec::with_capacity(locations.len());
    for location in locations {
        let color = color_at(&color_stops, location);
        let opacity = opacity_at(&opacity_stops, location);
        let (color, opacity) = blend_with_base(color, opacity, base_color, global_opacity);

        stops.push(GradientStop {
            position: (location - min_location) as f64 / (max_location - min_location) as f64,
            color,
            opacity,
        });
    }
    Ok(stops)
}

// ── Assembly ─────────────────────────────────────────────────────────────

/// Reconstruct a gradient from its descriptor for a layer with the given
/// bounds.  A `base_color` is mandatory whenever the gradient's global
/// opacity is below 100%.
pub fn construct_gradient(
    desc: &Descriptor,
    bounds: &Rect,
    base_color: Option<Color>,
) -> Result<Gradient, GradientError> {
    if !bool_value(desc, b"Algn")? {
        return Err(GradientError::AlignmentDisabled);
    }

    let angle = unit_value(desc, b"Angl", UNIT_ANGLE)?;

    let global_opacity = unit_value(desc, b"Opct", UNIT_PERCENT)?;
    if global_opacity != 100.0 && base_color.is_none() {
        return Err(GradientError::TranslucentWithoutBase);
    }

    let grad = object_value(desc, b"Grad")?;
    let mut stops = construct_gradient_stops(
        list_value(grad, b"Clrs")?,
        list_value(grad, b"Trns")?,
        base_color,
        global_opacity,
    )?;

    let (mode_type, mode) = enum_value(desc, b"Md  ")?;
    if !mode_type.is(b"BlnM") || !mode.is(b"Nrml") {
        return Err(GradientError::UnsupportedBlendMode(mode.to_string()));
    }

    if bool_value(desc, b"Rvrs")? {
        stops.reverse();
        for stop in &mut stops {
            stop.position = 1.0 - stop.position;
        }
    }

    let scale = unit_value(desc, b"Scl ", UNIT_PERCENT)? / 100.0;

    let (type_id, gradient_type) = enum_value(desc, b"Type")?;
    if !type_id.is(b"GrdT") {
        return Err(GradientError::WrongShape { key: "Type".into() });
    }

    let geometry = match gradient_type.as_bytes() {
        b"Lnr " => {
            let (p1, p2) = compute_gradient_points(bounds, angle, scale);
            let (offset_x, offset_y) = compute_gradient_offset(bounds, object_value(desc, b"Ofst")?)?;
            GradientGeometry::Linear {
                x1: p1.x + offset_x,
                y1: p1.y + offset_y,
                x2: p2.x + offset_x,
                y2: p2.y + offset_y,
            }
        }
        b"Rdl " => {
            let (p1, p2) = compute_gradient_points(bounds, angle, scale);
            let (offset_x, offset_y) = compute_gradient_offset(bounds, object_value(desc, b"Ofst")?)?;
            let cx = (p1.x + p2.x) / 2.0 + offset_x;
            let cy = (p1.y + p2.y) / 2.0 + offset_y;
            let (dx, dy) = (cx - p1.x, cy - p1.y);
            GradientGeometry::Radial {
                cx,
                cy,
                radius: (dx * dx + dy * dy).sqrt(),
            }
        }
        _ => return Err(GradientError::UnsupportedType(gradient_type.to_string())),
    };

    Ok(Gradient { geometry, stops })
}
