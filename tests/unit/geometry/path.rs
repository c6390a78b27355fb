use super::*;

fn square() -> PathCommands {
    PathCommands::polygon(&[
        Point::new(0.0, 0.0),
        Point::new(10.0, 0.0),
        Point::new(10.0, 10.0),
        Point::new(0.0, 10.0),
    ])
}

#[test]
fn polygon_emits_move_lines_close() {
    let p = square();
    assert_eq!(p.len(), 5);
    assert_eq!(p.as_slice()[0], PathCmd::MoveTo(0.0, 0.0));
    assert_eq!(p.as_slice()[4], PathCmd::Close);
    assert_eq!(p.to_svg(), "M0,0 L10,0 L10,10 L0,10 Z");
}

#[test]
fn serde_shape_is_compact() {
    let p = PathCommands::from_vec(vec![
        PathCmd::MoveTo(1.0, 2.0),
        PathCmd::LineTo(3.0, 4.0),
        PathCmd::Close,
    ]);
    let json = serde_json::to_string(&p).unwrap();
    assert_eq!(json, r#"[{"M":[1.0,2.0]},{"L":[3.0,4.0]},"Z"]"#);
    let back: PathCommands = serde_json::from_str(&json).unwrap();
    assert_eq!(back, p);
}

#[test]
fn digest_is_content_addressed() {
    let a = square();
    let b = square();
    assert_eq!(a.digest(), b.digest());
    assert_eq!(a.digest().as_str().len(), 64);

    let c = PathCommands::polygon(&[
        Point::new(0.0, 0.0),
        Point::new(11.0, 0.0),
        Point::new(11.0, 10.0),
    ]);
    assert_ne!(a.digest(), c.digest());
    assert!(!a.digest().is_cumulative());
    assert!(Digest::cumulative().is_cumulative());
}

#[test]
fn svg_parsing_flattens_curves() {
    let p = PathCommands::from_svg("M0,0 Q10,10 20,0 Z", 0.1).unwrap();
    assert!(p.len() > 3);
    assert_eq!(p.as_slice()[0], PathCmd::MoveTo(0.0, 0.0));
    let moves = p
        .as_slice()
        .iter()
        .filter(|c| matches!(c, PathCmd::MoveTo(..)))
        .count();
    assert_eq!(moves, 1);
    assert!(PathCommands::from_svg("M0,0 X", 0.1).is_err());
}

#[test]
fn rings_validate_structure() {
    let bad = PathCommands::from_vec(vec![PathCmd::LineTo(1.0, 1.0)]);
    assert!(bad.rings().is_err());

    let nan = PathCommands::from_vec(vec![PathCmd::MoveTo(f64::NAN, 0.0)]);
    assert!(nan.rings().is_err());

    let rings = square().rings().unwrap();
    assert_eq!(rings.len(), 1);
    assert_eq!(rings[0].len(), 4);
}

#[test]
fn rings_drop_degenerate_and_duplicate_closing_points() {
    let p = PathCommands::from_vec(vec![
        PathCmd::MoveTo(0.0, 0.0),
        PathCmd::LineTo(5.0, 0.0),
        PathCmd::Close,
        PathCmd::MoveTo(0.0, 0.0),
        PathCmd::LineTo(5.0, 0.0),
        PathCmd::LineTo(5.0, 5.0),
        PathCmd::LineTo(0.0, 0.0),
        PathCmd::Close,
    ]);
    let rings = p.rings().unwrap();
    assert_eq!(rings.len(), 1);
    assert_eq!(rings[0].len(), 3);
}

#[test]
fn bounding_box_covers_all_points() {
    assert_eq!(PathCommands::new().bounding_box(), None);
    assert_eq!(
        square().bounding_box(),
        Some(Rect::new(0.0, 0.0, 10.0, 10.0))
    );
}
