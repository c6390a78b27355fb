//! Shadow casting: the area one segment hides from one viewer.
//!
//! Rays from the viewer through both segment endpoints are extended to a projection rectangle
//! that contains the map, the viewer and the segment. The shadow is bounded by the segment,
//! the two ray exits and whichever rectangle corners lie inside the angular wedge.

use kurbo::{Point, Rect, Vec2};
use smallvec::SmallVec;

use crate::foundation::math::cross;
use crate::vision::obstruction::ObstructionLine;

/// Margin added around the projection rectangle so exits land strictly outside the map.
const PROJECTION_MARGIN: f64 = 1.0;

/// Area occluded by one segment from one viewer (at most 2 + 2 + 4 vertices).
#[derive(Clone, Debug, PartialEq)]
pub struct ShadowPolygon {
    points: SmallVec<[Point; 8]>,
}

impl ShadowPolygon {
    /// Build from explicit vertices.
    pub fn new(points: impl IntoIterator<Item = Point>) -> Self {
        Self {
            points: points.into_iter().collect(),
        }
    }

    /// Ordered vertices.
    pub fn points(&self) -> &[Point] {
        &self.points
    }
}

/// Cast the shadow of `line` away from `viewer`, clipped to a rectangle containing `map`.
///
/// Returns `None` when the segment cannot occlude anything from this viewer: it is inactive,
/// one-sided and facing away, touches the viewer, or is collinear with it.
pub fn cast_shadow(viewer: Point, line: &ObstructionLine, map: Rect) -> Option<ShadowPolygon> {
    if !line.is_active() || !line.blocks_from(viewer) {
        return None;
    }
    let (a, b) = (line.start, line.end);
    if a == viewer || b == viewer {
        return None;
    }
    let s = cross(viewer, a, b);
    if s == 0.0 {
        return None;
    }

    let bounds = map
        .abs()
        .union_pt(viewer)
        .union_pt(a)
        .union_pt(b)
        .inflate(PROJECTION_MARGIN, PROJECTION_MARGIN);

    let (a_exit, a_t) = exit_point(bounds, viewer, a - viewer);
    let (b_exit, b_t) = exit_point(bounds, viewer, b - viewer);

    let mut points: SmallVec<[Point; 8]> = SmallVec::new();
    points.push(a);
    points.push(b);
    points.push(b_exit);
    if s > 0.0 {
        // Wedge runs forward from a_exit to b_exit; walk it backwards from b_exit.
        let mut corners = corners_between(bounds, a_t, b_t);
        corners.reverse();
        points.extend(corners);
    } else {
        points.extend(corners_between(bounds, b_t, a_t));
    }
    points.push(a_exit);
    Some(ShadowPolygon { points })
}

/// Shadows cast by every active segment for one viewer; order carries no meaning.
pub fn shadows_for_viewer(
    viewer: Point,
    lines: &[ObstructionLine],
    map: Rect,
) -> Vec<ShadowPolygon> {
    lines
        .iter()
        .filter_map(|line| cast_shadow(viewer, line, map))
        .collect()
}

/// Where the ray `origin + t * dir` (t > 0) leaves `bounds`, plus its perimeter parameter.
///
/// The perimeter parameter runs 0..4 along the edges (x0,y0)->(x1,y0)->(x1,y1)->(x0,y1) and
/// back, so corner `k` sits at parameter `k`.
fn exit_point(bounds: Rect, origin: Point, dir: Vec2) -> (Point, f64) {
    let tx = if dir.x > 0.0 {
        (bounds.x1 - origin.x) / dir.x
    } else if dir.x < 0.0 {
        (bounds.x0 - origin.x) / dir.x
    } else {
        f64::INFINITY
    };
    let ty = if dir.y > 0.0 {
        (bounds.y1 - origin.y) / dir.y
    } else if dir.y < 0.0 {
        (bounds.y0 - origin.y) / dir.y
    } else {
        f64::INFINITY
    };
    let w = bounds.width();
    let h = bounds.height();

    if ty <= tx {
        let x = (origin.x + ty * dir.x).clamp(bounds.x0, bounds.x1);
        if dir.y < 0.0 {
            (Point::new(x, bounds.y0), (x - bounds.x0) / w)
        } else {
            (Point::new(x, bounds.y1), 2.0 + (bounds.x1 - x) / w)
        }
    } else {
        let y = (origin.y + tx * dir.y).clamp(bounds.y0, bounds.y1);
        if dir.x > 0.0 {
            (Point::new(bounds.x1, y), 1.0 + (y - bounds.y0) / h)
        } else {
            (Point::new(bounds.x0, y), 3.0 + (bounds.y1 - y) / h)
        }
    }
}

/// Corners strictly inside the forward perimeter arc `from -> to`.
fn corners_between(bounds: Rect, from: f64, to: f64) -> SmallVec<[Point; 4]> {
    let corners = [
        Point::new(bounds.x0, bounds.y0),
        Point::new(bounds.x1, bounds.y0),
        Point::new(bounds.x1, bounds.y1),
        Point::new(bounds.x0, bounds.y1),
    ];
    let to = if to <= from { to + 4.0 } else { to };
    (1..8)
        .map(|k| k as f64)
        .filter(|&k| from < k && k < to)
        .map(|k| corners[(k as usize) % 4])
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/vision/shadow.rs"]
mod tests;
