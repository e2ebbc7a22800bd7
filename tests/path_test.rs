use psdvec::document::Rect;
use psdvec::layer_info::{CombineMode, PathRecord, SubpathMode, VectorMask};
use psdvec::path::{
    box_path_data, build_path, construct_path, subpaths_from_records, FillRule, IdGen, Subpath,
};
use psdvec::primitive::Point;

const BOUNDS: Rect = Rect {
    top: 0,
    left: 0,
    bottom: 100,
    right: 100,
};

fn start(mode: SubpathMode, combine: CombineMode) -> PathRecord {
    PathRecord::SubpathStart {
        mode,
        knot_count: 4,
        combine,
    }
}

fn knot(mode: SubpathMode, x: f64, y: f64) -> PathRecord {
    let p = Point { x, y };
    PathRecord::Knot {
        mode,
        linked: true,
        back: p,
        anchor: p,
        front: p,
    }
}

fn square(mode: SubpathMode, combine: CombineMode) -> Vec<PathRecord> {
    vec![
        start(mode, combine),
        knot(mode, 0.0, 0.0),
        knot(mode, 1.0, 0.0),
        knot(mode, 1.0, 1.0),
        knot(mode, 0.0, 1.0),
    ]
}

fn entry(combine: CombineMode, data: &str) -> Subpath {
    Subpath {
        combine,
        data: data.to_string(),
    }
}

#[test]
fn closed_subpath_emits_move_curves_and_closing_segment() {
    let subpaths = subpaths_from_records(&square(SubpathMode::Closed, CombineMode::Union), &BOUNDS);
    assert_eq!(subpaths.len(), 1);
    let data = &subpaths[0].data;

    assert!(data.starts_with("M 0.000000,0.000000 "), "got {data}");
    assert!(data.ends_with("Z"), "got {data}");
    // Three knot-to-knot segments plus the loop-closing one.
    assert_eq!(data.matches('C').count(), 4);
    assert!(data.contains("100.000000,100.000000"), "got {data}");
    assert_eq!(subpaths[0].combine, CombineMode::Union);
}

#[test]
fn open_subpath_has_no_closing_segment() {
    let subpaths = subpaths_from_records(&square(SubpathMode::Open, CombineMode::Union), &BOUNDS);
    let data = &subpaths[0].data;
    assert!(!data.contains('Z'), "got {data}");
    assert_eq!(data.matches('C').count(), 3);
}

#[test]
fn denormalization_interpolates_each_axis_independently() {
    let bounds = Rect {
        top: 10,
        left: 20,
        bottom: 110,
        right: 220,
    };
    let records = vec![
        start(SubpathMode::Open, CombineMode::Union),
        knot(SubpathMode::Open, 0.5, 0.25),
        knot(SubpathMode::Open, 1.0, 1.0),
    ];
    let subpaths = subpaths_from_records(&records, &bounds);
    // x = 20 + 0.5 * 200, y = 10 + 0.25 * 100
    assert!(subpaths[0].data.starts_with("M 120.000000,35.000000 "));
}

#[test]
fn each_subpath_start_finalizes_the_previous_one() {
    let mut records = square(SubpathMode::Closed, CombineMode::Union);
    records.extend(square(SubpathMode::Closed, CombineMode::Subtract));
    let subpaths = subpaths_from_records(&records, &BOUNDS);
    assert_eq!(subpaths.len(), 2);
    assert_eq!(subpaths[0].combine, CombineMode::Union);
    assert_eq!(subpaths[1].combine, CombineMode::Subtract);
}

#[test]
fn marker_records_do_not_disturb_reconstruction() {
    let mut records = vec![PathRecord::PathFillRule, PathRecord::InitialFillRule { value: 0 }];
    records.extend(square(SubpathMode::Closed, CombineMode::Union));
    let subpaths = subpaths_from_records(&records, &BOUNDS);
    assert_eq!(subpaths.len(), 1);
}

#[test]
fn union_after_subtract_is_inconsistent() {
    let entries = [
        entry(CombineMode::Union, "M 0,0 Z"),
        entry(CombineMode::Subtract, "M 1,1 Z"),
        entry(CombineMode::Union, "M 2,2 Z"),
    ];
    let mut ids = IdGen::new();
    assert!(build_path(&entries, false, &BOUNDS, &mut ids).is_err());
}

#[test]
fn union_and_exclude_overlap_cannot_mix() {
    let entries = [
        entry(CombineMode::Union, "M 0,0 Z"),
        entry(CombineMode::ExcludeOverlap, "M 1,1 Z"),
    ];
    let mut ids = IdGen::new();
    assert!(build_path(&entries, false, &BOUNDS, &mut ids).is_err());
}

#[test]
fn subtractive_only_layer_gets_box_fill_and_mask() {
    let entries = [entry(CombineMode::Subtract, "M 1,1 Z")];
    let mut ids = IdGen::new();
    let fill = build_path(&entries, false, &BOUNDS, &mut ids).unwrap();

    assert_eq!(fill.data, box_path_data(&BOUNDS));
    assert_eq!(fill.rule, None);

    let mask = fill.mask.expect("subtractive entries need a mask");
    assert_eq!(mask.path_data, "M 1,1 Z");
    assert_eq!(mask.rule, FillRule::NonZero);
    assert_eq!(mask.box_data, box_path_data(&BOUNDS));
}

#[test]
fn union_entries_derive_nonzero_and_no_mask() {
    let entries = [
        entry(CombineMode::Union, "M 0,0 Z"),
        entry(CombineMode::Union, "M 1,1 Z"),
    ];
    let mut ids = IdGen::new();
    let fill = build_path(&entries, false, &BOUNDS, &mut ids).unwrap();
    assert_eq!(fill.data, "M 0,0 Z M 1,1 Z");
    assert_eq!(fill.rule, Some(FillRule::NonZero));
    assert!(fill.mask.is_none());
}

#[test]
fn continuation_flips_a_single_nonzero_entry_to_evenodd() {
    let entries = [
        entry(CombineMode::Union, "M 0,0 Z"),
        entry(CombineMode::Continuation, "M 1,1 Z"),
    ];
    let mut ids = IdGen::new();
    let fill = build_path(&entries, false, &BOUNDS, &mut ids).unwrap();
    assert_eq!(fill.rule, Some(FillRule::EvenOdd));
    assert_eq!(fill.data, "M 0,0 Z M 1,1 Z");
}

#[test]
fn continuation_in_multipart_nonzero_group_fails() {
    let entries = [
        entry(CombineMode::Union, "M 0,0 Z"),
        entry(CombineMode::Union, "M 1,1 Z"),
        entry(CombineMode::Continuation, "M 2,2 Z"),
    ];
    let mut ids = IdGen::new();
    assert!(build_path(&entries, false, &BOUNDS, &mut ids).is_err());
}

#[test]
fn leading_continuation_starts_an_evenodd_group() {
    let entries = [entry(CombineMode::Continuation, "M 0,0 Z")];
    let mut ids = IdGen::new();
    let fill = build_path(&entries, false, &BOUNDS, &mut ids).unwrap();
    assert_eq!(fill.rule, Some(FillRule::EvenOdd));
}

#[test]
fn continuation_after_exclude_overlap_group_is_legal() {
    let entries = [
        entry(CombineMode::ExcludeOverlap, "M 0,0 Z"),
        entry(CombineMode::ExcludeOverlap, "M 1,1 Z"),
        entry(CombineMode::Continuation, "M 2,2 Z"),
    ];
    let mut ids = IdGen::new();
    let fill = build_path(&entries, false, &BOUNDS, &mut ids).unwrap();
    assert_eq!(fill.rule, Some(FillRule::EvenOdd));
    assert_eq!(fill.data, "M 0,0 Z M 1,1 Z M 2,2 Z");
}

#[test]
fn invert_swaps_groups_and_rules() {
    let entries = [
        entry(CombineMode::Union, "M 0,0 Z"),
        entry(CombineMode::Subtract, "M 1,1 Z"),
    ];
    let mut ids = IdGen::new();
    let fill = build_path(&entries, true, &BOUNDS, &mut ids).unwrap();

    // The subtractive entry becomes the fill; the union entry becomes the
    // mask, keeping its nonzero rule.
    assert_eq!(fill.data, "M 1,1 Z");
    assert_eq!(fill.rule, Some(FillRule::NonZero));
    let mask = fill.mask.expect("inverted union entries become the mask");
    assert_eq!(mask.path_data, "M 0,0 Z");
    assert_eq!(mask.rule, FillRule::NonZero);
}

#[test]
fn id_generator_is_sequential_per_conversion() {
    let mut ids = IdGen::new();
    assert_eq!(ids.next_id(), "_1");
    assert_eq!(ids.next_id(), "_2");

    let entries = [entry(CombineMode::Subtract, "M 1,1 Z")];
    let fill = build_path(&entries, false, &BOUNDS, &mut ids).unwrap();
    assert_eq!(fill.mask.unwrap().id, "_3");
}

#[test]
fn disabled_vector_mask_contributes_no_subpaths() {
    let mask = VectorMask {
        flags: 4,
        records: square(SubpathMode::Closed, CombineMode::Union),
    };
    let mut ids = IdGen::new();
    let fill = construct_path(&mask, &BOUNDS, &mut ids).unwrap();
    assert_eq!(fill.data, box_path_data(&BOUNDS));
    assert!(fill.mask.is_none());
}

#[test]
fn inverted_vector_mask_moves_the_fill_into_the_mask() {
    let mask = VectorMask {
        flags: 1,
        records: square(SubpathMode::Closed, CombineMode::Union),
    };
    let mut ids = IdGen::new();
    let fill = construct_path(&mask, &BOUNDS, &mut ids).unwrap();
    assert_eq!(fill.data, box_path_data(&BOUNDS));
    let mask_out = fill.mask.expect("inverted mask needs a clip mask");
    assert!(mask_out.path_data.starts_with("M 0.000000,0.000000 "));
}
