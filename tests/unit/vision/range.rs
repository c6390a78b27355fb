use super::*;
use kurbo::{Point, Rect};

fn grid() -> GridCalibration {
    GridCalibration::new(100.0, 5.0).unwrap()
}

fn full_map() -> Region {
    Region::from_rect(Rect::new(0.0, 0.0, 1000.0, 1000.0))
}

#[test]
fn ranged_viewer_is_clipped_to_its_disc() {
    let v = Viewer::new("a", Point::new(500.0, 500.0)).with_range(10.0);
    let out = apply_range_and_torches(&[v], vec![full_map()], grid(), Role::Player, 0.25).unwrap();
    // R = 100 * (10 / 5 + 0.5) = 250
    for p in out.regions[0].vertices() {
        assert!((p - Point::new(500.0, 500.0)).hypot() <= 250.0 + 1e-6);
    }
    assert!(out.regions[0].contains_point(Point::new(740.0, 500.0)));
    assert!(!out.regions[0].contains_point(Point::new(760.0, 500.0)));
    assert!(out.rings.is_empty());
}

#[test]
fn unlimited_viewer_is_untouched() {
    let v = Viewer::new("a", Point::new(500.0, 500.0));
    let out = apply_range_and_torches(&[v], vec![full_map()], grid(), Role::Gm, 0.25).unwrap();
    assert!((out.regions[0].area() - 1_000_000.0).abs() < 1e-6);
    assert!(out.rings.is_empty());
}

#[test]
fn torch_is_confined_to_ordinary_sight() {
    let a = Viewer::new("a", Point::new(100.0, 100.0)).with_range(5.0);
    let b = Viewer::new("b", Point::new(900.0, 100.0)).with_range(5.0);
    let torch = Viewer::new("t", Point::new(500.0, 800.0)).as_torch();
    let out = apply_range_and_torches(
        &[a, b, torch],
        vec![full_map(), full_map(), full_map()],
        grid(),
        Role::Player,
        0.25,
    )
    .unwrap();
    // The unlimited torch sees exactly what a and b see together.
    assert!((out.regions[2].area() - out.full_vision.area()).abs() < 1e-3);
}

#[test]
fn torch_outside_every_circle_sees_nothing() {
    let a = Viewer::new("a", Point::new(100.0, 100.0)).with_range(5.0);
    let b = Viewer::new("b", Point::new(900.0, 100.0)).with_range(5.0);
    let torch = Viewer::new("t", Point::new(500.0, 800.0))
        .with_range(5.0)
        .as_torch();
    let out = apply_range_and_torches(
        &[a, b, torch],
        vec![full_map(), full_map(), full_map()],
        grid(),
        Role::Player,
        0.25,
    )
    .unwrap();
    assert!(out.regions[2].is_empty());
    assert!(!out.regions[0].is_empty());
}

#[test]
fn rings_only_for_gm_and_non_gm_owned_non_torch_viewers() {
    let player = Viewer::new("p", Point::new(100.0, 100.0))
        .with_range(5.0)
        .owned_by("u1", Role::Player);
    let gm_token = Viewer::new("g", Point::new(300.0, 100.0))
        .with_range(5.0)
        .owned_by("gm", Role::Gm);
    let torch = Viewer::new("t", Point::new(500.0, 100.0))
        .with_range(5.0)
        .as_torch();
    let viewers = [player, gm_token, torch];
    let regions = || vec![full_map(), full_map(), full_map()];

    let out = apply_range_and_torches(&viewers, regions(), grid(), Role::Gm, 0.25).unwrap();
    assert_eq!(out.rings.len(), 1);
    assert_eq!(out.rings[0].viewer_id, ItemId::new("p"));
    assert_eq!(out.rings[0].radius, 150.0);
    assert_eq!(out.rings[0].id, ring_id(&ItemId::new("p")));

    let out = apply_range_and_torches(&viewers, regions(), grid(), Role::Player, 0.25).unwrap();
    assert!(out.rings.is_empty());
}

#[test]
fn mismatched_inputs_are_rejected() {
    let v = Viewer::new("a", Point::ORIGIN);
    assert!(apply_range_and_torches(&[v], Vec::new(), grid(), Role::Gm, 0.25).is_err());
}
