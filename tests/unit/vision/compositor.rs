use super::*;
use kurbo::Point;

use crate::vision::obstruction::ObstructionLine;
use crate::vision::shadow::shadows_for_viewer;

fn map() -> Rect {
    Rect::new(0.0, 0.0, 1000.0, 1000.0)
}

/// Runs chunks inline, optionally corrupting or reversing the answers.
struct InlineWorkers {
    count: usize,
    mode: Mode,
}

#[derive(Clone, Copy)]
enum Mode {
    Faithful,
    Reversed,
    DropLast,
    Garbage,
    Duplicate,
}

impl ShadowWorkers for InlineWorkers {
    fn worker_count(&self) -> usize {
        self.count
    }

    fn dispatch(&self, requests: Vec<ChunkRequest>) -> Vec<UmbraResult<ChunkResponse>> {
        let mut out = requests.iter().map(resolve_chunk).collect::<Vec<_>>();
        match self.mode {
            Mode::Faithful => {}
            Mode::Reversed => out.reverse(),
            Mode::DropLast => {
                out.pop();
            }
            Mode::Garbage => {
                if let Some(Ok(first)) = out.first_mut() {
                    first.commands = PathCommands::from_vec(vec![
                        crate::geometry::path::PathCmd::LineTo(1.0, 1.0),
                    ]);
                }
            }
            Mode::Duplicate => {
                let first = out.first().and_then(|r| r.as_ref().ok().cloned());
                if let (Some(first), Some(last)) = (first, out.last_mut()) {
                    *last = Ok(first);
                }
            }
        }
        out
    }
}

fn walls() -> Vec<ObstructionLine> {
    vec![
        ObstructionLine::wall(Point::new(400.0, 0.0), Point::new(400.0, 1000.0)),
        ObstructionLine::wall(Point::new(600.0, 450.0), Point::new(600.0, 550.0)),
        ObstructionLine::wall(Point::new(450.0, 700.0), Point::new(550.0, 700.0)),
        ObstructionLine::wall(Point::new(450.0, 200.0), Point::new(550.0, 250.0)),
    ]
}

#[test]
fn no_shadows_means_the_whole_map_is_visible() {
    let workers = InlineWorkers {
        count: 4,
        mode: Mode::Faithful,
    };
    let region = compose_visible_region(&workers, &[], map()).unwrap();
    assert!((region.area() - 1_000_000.0).abs() < 1e-6);
}

#[test]
fn wall_shadow_is_removed_from_the_visible_region() {
    let workers = InlineWorkers {
        count: 2,
        mode: Mode::Faithful,
    };
    let viewer = Point::new(500.0, 500.0);
    let shadows = shadows_for_viewer(viewer, &walls()[..1], map());
    let region = compose_visible_region(&workers, &shadows, map()).unwrap();
    assert!(region.contains_point(Point::new(700.0, 500.0)));
    assert!(!region.contains_point(Point::new(100.0, 500.0)));
    assert!((region.area() - 600_000.0).abs() < 1.0);
}

#[test]
fn result_is_independent_of_worker_count_and_order() {
    let viewer = Point::new(500.0, 500.0);
    let shadows = shadows_for_viewer(viewer, &walls(), map());
    assert_eq!(shadows.len(), 4);

    let reference = compose_visible_region(
        &InlineWorkers {
            count: 1,
            mode: Mode::Faithful,
        },
        &shadows,
        map(),
    )
    .unwrap();
    for count in [2, 3, 8] {
        for mode in [Mode::Faithful, Mode::Reversed] {
            let r =
                compose_visible_region(&InlineWorkers { count, mode }, &shadows, map()).unwrap();
            assert!((r.area() - reference.area()).abs() < 1e-3);
        }
    }
}

#[test]
fn rayon_pool_matches_inline_workers() {
    let viewer = Point::new(500.0, 500.0);
    let shadows = shadows_for_viewer(viewer, &walls(), map());
    let pool = RayonWorkers::new(Some(3)).unwrap();
    assert_eq!(pool.worker_count(), 3);
    let a = compose_visible_region(&pool, &shadows, map()).unwrap();
    let b = compose_visible_region(
        &InlineWorkers {
            count: 3,
            mode: Mode::Faithful,
        },
        &shadows,
        map(),
    )
    .unwrap();
    assert!((a.area() - b.area()).abs() < 1e-6);
}

#[test]
fn zero_threads_are_rejected() {
    assert!(matches!(
        RayonWorkers::new(Some(0)),
        Err(UmbraError::Validation(_))
    ));
}

#[test]
fn missing_response_aborts() {
    let shadows = shadows_for_viewer(Point::new(500.0, 500.0), &walls(), map());
    let workers = InlineWorkers {
        count: 2,
        mode: Mode::DropLast,
    };
    let err = compose_visible_region(&workers, &shadows, map()).unwrap_err();
    assert!(matches!(err, UmbraError::Worker(_)));
}

#[test]
fn malformed_response_aborts() {
    let shadows = shadows_for_viewer(Point::new(500.0, 500.0), &walls(), map());
    let workers = InlineWorkers {
        count: 2,
        mode: Mode::Garbage,
    };
    let err = compose_visible_region(&workers, &shadows, map()).unwrap_err();
    assert!(matches!(err, UmbraError::Worker(_)));
}

#[test]
fn duplicate_response_aborts() {
    let shadows = shadows_for_viewer(Point::new(500.0, 500.0), &walls(), map());
    let workers = InlineWorkers {
        count: 2,
        mode: Mode::Duplicate,
    };
    assert!(compose_visible_region(&workers, &shadows, map()).is_err());
}

#[test]
fn partition_uses_ceil_sized_contiguous_chunks() {
    let shadows = shadows_for_viewer(Point::new(500.0, 500.0), &walls(), map());
    let chunks = partition(&shadows, 3, map());
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].polygons.len(), 2);
    assert_eq!(chunks[1].polygons.len(), 2);
    assert_eq!(chunks[1].index, 1);
    assert_eq!(partition(&shadows, 16, map()).len(), 4);
}
