use super::*;
use kurbo::Rect;

fn token(id: &str, x: f64, y: f64, visible: bool) -> AutohideToken {
    AutohideToken {
        id: ItemId::new(id),
        position: Point::new(x, y),
        image_width: 300.0,
        image_dpi: 300.0,
        scale: Vec2::new(1.0, 1.0),
        visible,
    }
}

fn grid() -> GridCalibration {
    GridCalibration::new(150.0, 5.0).unwrap()
}

#[test]
fn non_finite_footprint_is_empty_and_stays_hidden() {
    let mut t = token("t", 50.0, 50.0, true);
    t.image_dpi = 0.0;
    assert!(t.hexagon_radius(grid()).is_infinite());
    assert!(t.footprint(grid()).is_empty());

    let visible = Region::from_rect(Rect::new(0.0, 0.0, 100.0, 100.0));
    let changes = evaluate_autohide(&[t], &visible, grid());
    assert_eq!(changes.len(), 1);
    assert!(!changes[0].visible);
}

#[test]
fn hexagon_radius_scales_with_dpi_ratio_and_scale() {
    let mut t = token("t", 0.0, 0.0, true);
    // (150 / 300) * (300 / 2) * 1
    assert_eq!(t.hexagon_radius(grid()), 75.0);
    t.scale = Vec2::new(2.0, 2.0);
    assert_eq!(t.hexagon_radius(grid()), 150.0);
}

#[test]
fn token_outside_visible_region_is_hidden() {
    let visible = Region::from_rect(Rect::new(0.0, 0.0, 500.0, 500.0));
    let changes = evaluate_autohide(&[token("far", 900.0, 900.0, true)], &visible, grid());
    assert_eq!(
        changes,
        vec![VisibilityChange {
            id: ItemId::new("far"),
            visible: false
        }]
    );
}

#[test]
fn partially_overlapping_token_is_shown() {
    let visible = Region::from_rect(Rect::new(0.0, 0.0, 500.0, 500.0));
    // Hexagon of radius 75 centered 50px outside the right edge still overlaps.
    let changes = evaluate_autohide(&[token("edge", 550.0, 250.0, false)], &visible, grid());
    assert_eq!(changes.len(), 1);
    assert!(changes[0].visible);
}

#[test]
fn matching_visibility_produces_no_change() {
    let visible = Region::from_rect(Rect::new(0.0, 0.0, 500.0, 500.0));
    let tokens = [token("in", 100.0, 100.0, true), token("out", 900.0, 900.0, false)];
    assert!(evaluate_autohide(&tokens, &visible, grid()).is_empty());
}

#[test]
fn empty_visible_region_hides_everything() {
    let tokens = [token("a", 100.0, 100.0, true), token("b", 0.0, 0.0, true)];
    let changes = evaluate_autohide(&tokens, &Region::empty(), grid());
    assert_eq!(changes.len(), 2);
    assert!(changes.iter().all(|c| !c.visible));
}
