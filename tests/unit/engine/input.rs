use super::*;
use kurbo::Point;

fn ctx() -> ComputationContext {
    ComputationContext {
        scene_id: "s".to_string(),
        client: ClientInfo {
            id: "p1".to_string(),
            role: Role::Player,
            color: None,
        },
        grid: GridCalibration::default(),
        settings: SceneSettings {
            vision_enabled: true,
            ..SceneSettings::default()
        },
        map: Rect::new(0.0, 0.0, 100.0, 100.0),
        viewers: vec![
            Viewer::new("a", Point::new(1.0, 1.0)),
            Viewer::new("b", Point::new(2.0, 2.0)),
        ],
        lines: vec![
            ObstructionLine::wall(Point::new(10.0, 0.0), Point::new(10.0, 50.0)),
            ObstructionLine::wall(Point::new(20.0, 0.0), Point::new(20.0, 50.0)),
        ],
        autohide: Vec::new(),
    }
}

#[test]
fn listing_order_does_not_matter() {
    let a = ctx();
    let mut b = ctx();
    b.viewers.reverse();
    b.lines.reverse();
    assert_eq!(InputFingerprint::of(&a), InputFingerprint::of(&b));
}

#[test]
fn viewer_moves_change_full_but_not_geometry() {
    let a = ctx();
    let mut b = ctx();
    b.viewers[0].position.x += 0.5;
    let (fa, fb) = (InputFingerprint::of(&a), InputFingerprint::of(&b));
    assert_ne!(fa.full, fb.full);
    assert_eq!(fa.geometry, fb.geometry);
}

#[test]
fn obstruction_and_map_changes_touch_geometry() {
    let a = InputFingerprint::of(&ctx());

    let mut moved = ctx();
    moved.lines[1].end.y = 60.0;
    assert_ne!(a.geometry, InputFingerprint::of(&moved).geometry);

    let mut resized = ctx();
    resized.map = Rect::new(0.0, 0.0, 200.0, 100.0);
    let r = InputFingerprint::of(&resized);
    assert_ne!(a.geometry, r.geometry);
    assert_ne!(a.full, r.full);
}

#[test]
fn settings_flags_are_part_of_the_input() {
    let a = InputFingerprint::of(&ctx());
    let mut b = ctx();
    b.settings.player_doors = true;
    assert_ne!(a.full, InputFingerprint::of(&b).full);
    let mut c = ctx();
    c.settings.fow_color = Some("#ffffff".to_string());
    assert_ne!(a.full, InputFingerprint::of(&c).full);
}
