//! Vector-mask path reconstruction.
//!
//! Two stages: [`subpaths_from_records`] turns a raw path-record stream
//! into per-subpath cubic-Bezier path data, and [`build_path`] merges the
//! subpaths under their boolean combine modes into one fill path plus an
//! optional clip mask.  Knot coordinates arrive normalized 0..1 and are
//! denormalized into the document bounds on each axis independently.

use serde::Serialize;
use std::fmt::Write as _;
use thiserror::Error;

use crate::document::Rect;
use crate::layer_info::{CombineMode, PathRecord, SubpathMode, VectorMask};
use crate::primitive::Point;

#[derive(Error, Debug)]
pub enum PathError {
    #[error("subpaths with mode 'combine' or 'exclude overlap' cannot follow a 'subtract' subpath")]
    PositiveAfterSubtract,
    #[error("cannot mix subpaths with modes 'combine' and 'exclude overlap' in the same layer")]
    MixedFillRules,
    #[error("cannot extend a subpath in a layer holding a multi-part 'nonzero' group")]
    ContinuationInNonzeroGroup,
}

/// SVG-style fill rule attached to a subpath group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum FillRule {
    NonZero,
    EvenOdd,
}

impl FillRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            FillRule::NonZero => "nonzero",
            FillRule::EvenOdd => "evenodd",
        }
    }
}

/// One reconstructed subpath: its combine mode and its path data string.
#[derive(Clone, Debug, Serialize)]
pub struct Subpath {
    pub combine: CombineMode,
    pub data: String,
}

/// The clip mask generated for subtractive subpaths: a white full-bounds
/// rectangle underneath a black path using the negative path data.
#[derive(Clone, Debug, Serialize)]
pub struct ClipMask {
    pub id: String,
    pub box_data: String,
    pub path_data: String,
    pub rule: FillRule,
}

/// The fill path produced for one layer, with the clip mask it needs, if
/// any.  `rule` is present only when one was actually determined.
#[derive(Clone, Debug, Serialize)]
pub struct VectorFill {
    pub data: String,
    pub rule: Option<FillRule>,
    pub mask: Option<ClipMask>,
}

/// Fresh-identifier source for generated clip-mask names, scoped to one
/// document conversion.
#[derive(Debug, Default)]
pub struct IdGen {
    last: u64,
}

impl IdGen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> String {
        self.last += 1;
        format!("_{}", self.last)
    }
}

/// The full-bounds rectangle, used as the mask base and as the fill for
/// layers whose subpaths are all subtractive.
pub fn box_path_data(bounds: &Rect) -> String {
    format!(
        "M {l},{t} {r},{t} {r},{b} {l},{b} {l},{t} Z",
        l = bounds.left,
        t = bounds.top,
        r = bounds.right,
        b = bounds.bottom,
    )
}

fn render_point(p: Point, bounds: &Rect) -> String {
    let x = bounds.left as f64 + p.x * (bounds.right - bounds.left) as f64;
    let y = bounds.top as f64 + p.y * (bounds.bottom - bounds.top) as f64;
    format!("{x:.6},{y:.6}")
}

// In-progress subpath accumulator.
struct SubpathState {
    data: String,
    mode: SubpathMode,
    combine: CombineMode,
    /// The first knot's back handle and anchor, needed to close the loop.
    first: Option<(Point, Point)>,
    /// The previous knot's front handle.
    prev_front: Option<Point>,
}

impl SubpathState {
    fn new(mode: SubpathMode, combine: CombineMode) -> Self {
        Self {
            data: String::new(),
            mode,
            combine,
            first: None,
            prev_front: None,
        }
    }

    fn push_knot(&mut self, back: Point, anchor: Point, front: Point, bounds: &Rect) {
        match self.prev_front {
            None => {
                // First knot of the subpath.
                self.first = Some((back, anchor));
                let _ = write!(self.data, "M {} ", render_point(anchor, bounds));
            }
            Some(prev_front) => {
                let _ = write!(
                    self.data,
                    "C {} {} {} ",
                    render_point(prev_front, bounds),
                    render_point(back, bounds),
                    render_point(anchor, bounds),
                );
            }
        }
        self.prev_front = Some(front);
    }

    fn finish(mut self, bounds: &Rect, results: &mut Vec<Subpath>) {
        let (Some((first_back, first_anchor)), Some(prev_front)) = (self.first, self.prev_front)
        else {
            return; // no knots were seen
        };

        if self.mode == SubpathMode::Closed {
            // Segment from the final anchor back to the initial one.
            let _ = write!(
                self.data,
                "C {} {} {} Z",
                render_point(prev_front, bounds),
                render_point(first_back, bounds),
                render_point(first_anchor, bounds),
            );
        }

        results.push(Subpath {
            combine: self.combine,
            data: self.data,
        });
    }
}

/// Walk a path-record stream and emit one path-data entry per subpath.
/// Knots arriving before any subpath-start record are dropped.
pub fn subpaths_from_records(records: &[PathRecord], bounds: &Rect) -> Vec<Subpath> {
    let mut results = Vec::new();
    let mut current: Option<SubpathState> = None;

    for record in records {
        match record {
            PathRecord::SubpathStart { mode, combine, .. } => {
                if let Some(state) = current.take() {
                    state.finish(bounds, &mut results);
                }
                current = Some(SubpathState::new(*mode, *combine));
            }
            PathRecord::Knot {
                back,
                anchor,
                front,
                ..
            } => {
                if let Some(state) = current.as_mut() {
                    state.push_knot(*back, *anchor, *front, bounds);
                }
            }
            PathRecord::PathFillRule
            | PathRecord::Clipboard { .. }
            | PathRecord::InitialFillRule { .. } => {}
        }
    }

    if let Some(state) = current.take() {
        state.finish(bounds, &mut results);
    }
    results
}

/// Partition subpaths into positive and subtractive groups and derive the
/// fill rules.  The precedence between union, exclude-overlap and
/// continuation below is load-bearing; see the combine-mode notes in
/// DESIGN.md before changing it.
pub fn build_path(
    subpaths: &[Subpath],
    invert: bool,
    bounds: &Rect,
    ids: &mut IdGen,
) -> Result<VectorFill, PathError> {
    let mut positive: Vec<&str> = Vec::new();
    let mut negative: Vec<&str> = Vec::new();
    let mut positive_rule: Option<FillRule> = None;
    let mut negative_rule: Option<FillRule> = Some(FillRule::NonZero);

    for subpath in subpaths {
        match subpath.combine {
            CombineMode::Union => {
                if !negative.is_empty() {
                    return Err(PathError::PositiveAfterSubtract);
                }
                let rule = positive_rule.get_or_insert(FillRule::NonZero);
                if *rule != FillRule::NonZero {
                    return Err(PathError::MixedFillRules);
                }
                positive.push(&subpath.data);
            }
            CombineMode::ExcludeOverlap => {
                if !negative.is_empty() {
                    return Err(PathError::PositiveAfterSubtract);
                }
                let rule = positive_rule.get_or_insert(FillRule::EvenOdd);
                if *rule != FillRule::EvenOdd {
                    return Err(PathError::MixedFillRules);
                }
                positive.push(&subpath.data);
            }
            CombineMode::Continuation => {
                // Extends the previous subpath; the pair renders as one
                // item, filled 'evenodd' where the parts overlap.  A single
                // multipart subpath drawn 'nonzero' switches to 'evenodd'
                // on its first continuation.
                if positive_rule.is_none()
                    || (positive_rule == Some(FillRule::NonZero) && positive.len() == 1)
                {
                    positive_rule = Some(FillRule::EvenOdd);
                }
                if positive_rule != Some(FillRule::EvenOdd) {
                    return Err(PathError::ContinuationInNonzeroGroup);
                }
                if !negative.is_empty() {
                    return Err(PathError::PositiveAfterSubtract);
                }
                positive.push(&subpath.data);
            }
            CombineMode::Subtract => {
                negative.push(&subpath.data);
            }
        }
    }

    if invert {
        std::mem::swap(&mut positive, &mut negative);
        std::mem::swap(&mut positive_rule, &mut negative_rule);
    }

    let mask = if negative.is_empty() {
        None
    } else {
        Some(ClipMask {
            id: ids.next_id(),
            box_data: box_path_data(bounds),
            path_data: negative.join(" "),
            // A non-empty negative group implies a rule was derived.
            rule: negative_rule.unwrap_or(FillRule::NonZero),
        })
    };

    // A layer with only subtractive subpaths still needs a positive base
    // to subtract from.
    let data = if positive.is_empty() {
        box_path_data(bounds)
    } else {
        positive.join(" ")
    };

    Ok(VectorFill {
        data,
        rule: positive_rule,
        mask,
    })
}

/// Build the fill path (and clip mask, if needed) for one layer's vector
/// mask.  A disabled mask contributes no subpaths and falls back to the
/// full-bounds rectangle.
pub fn construct_path(
    mask: &VectorMask,
    bounds: &Rect,
    ids: &mut IdGen,
) -> Result<VectorFill, PathError> {
    let subpaths = if mask.disabled() {
        Vec::new()
    } else {
        subpaths_from_records(&mask.records, bounds)
    };
    build_path(&subpaths, mask.inverted(), bounds, ids)
}
