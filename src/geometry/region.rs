//! Owned planar regions and their boolean algebra.
//!
//! A [`Region`] owns its polygon storage, so every intermediate produced during a pass is
//! released when it goes out of scope, including on early returns and `?` propagation.

use geo::algorithm::bool_ops::FillRule;
use geo::orient::Direction;
use geo::{
    Area, BooleanOps, BoundingRect, Contains, Coord, LineString, MultiPolygon, OpType, Orient,
    Polygon, unary_union,
};
use kurbo::{Point, Rect};

use crate::foundation::error::UmbraResult;
use crate::foundation::math::{circle_segments, regular_polygon};
use crate::geometry::path::PathCommands;

/// Areas at or below this are treated as empty (touching boundaries, slivers).
const AREA_EPSILON: f64 = 1e-6;

/// A planar region made of zero or more polygons with holes.
#[derive(Clone, Debug, PartialEq)]
pub struct Region(MultiPolygon<f64>);

impl Region {
    /// The empty region.
    pub fn empty() -> Self {
        Self(MultiPolygon::new(Vec::new()))
    }

    /// Axis-aligned rectangle.
    pub fn from_rect(rect: Rect) -> Self {
        let r = rect.abs();
        Self::from_polygon(&[
            Point::new(r.x0, r.y0),
            Point::new(r.x1, r.y0),
            Point::new(r.x1, r.y1),
            Point::new(r.x0, r.y1),
        ])
    }

    /// Simple polygon through `points`; fewer than three points yields the empty region.
    pub fn from_polygon(points: &[Point]) -> Self {
        if points.len() < 3 {
            return Self::empty();
        }
        let poly = Polygon::new(ring(points), Vec::new()).orient(Direction::Default);
        Self(MultiPolygon::new(vec![poly]))
    }

    /// Inscribed polygonal disc that deviates from the true circle by at most `tolerance`.
    ///
    /// Every vertex lies on the circle, so the polygon never extends past `radius`.
    pub fn disc(center: Point, radius: f64, tolerance: f64) -> Self {
        if !(radius.is_finite() && radius > 0.0 && center.is_finite()) {
            return Self::empty();
        }
        let sides = circle_segments(radius, tolerance.max(1e-3));
        Self::from_polygon(&regular_polygon(center, radius, sides, 0.0))
    }

    /// Regular hexagon with vertices every 60 degrees starting on the +x axis.
    pub fn hexagon(center: Point, radius: f64) -> Self {
        if !(radius.is_finite() && radius > 0.0 && center.is_finite()) {
            return Self::empty();
        }
        Self::from_polygon(&regular_polygon(center, radius, 6, 0.0))
    }

    /// Parse path commands using the even-odd fill rule.
    pub fn from_commands(cmds: &PathCommands) -> UmbraResult<Self> {
        let polys = cmds
            .rings()?
            .iter()
            .map(|r| Polygon::new(ring(r), Vec::new()))
            .collect::<Vec<_>>();
        if polys.is_empty() {
            return Ok(Self::empty());
        }
        let raw = MultiPolygon::new(polys);
        let normalized = raw.boolean_op_with_fill_rule(
            &MultiPolygon::<f64>::new(Vec::new()),
            OpType::Union,
            FillRule::EvenOdd,
        );
        Ok(Self(normalized.orient(Direction::Default)))
    }

    /// Serialize every exterior and hole ring as a closed subpath.
    pub fn to_commands(&self) -> PathCommands {
        let mut out = PathCommands::new();
        for poly in self.0.iter() {
            for ls in std::iter::once(poly.exterior()).chain(poly.interiors()) {
                let mut pts = ls.coords().map(|c| Point::new(c.x, c.y)).collect::<Vec<_>>();
                if pts.len() > 1 && pts.first() == pts.last() {
                    pts.pop();
                }
                if pts.len() >= 3 {
                    out.push_ring(&pts);
                }
            }
        }
        out
    }

    /// Set union.
    pub fn union(&self, other: &Region) -> Region {
        Self::normalized(self.0.union(&other.0))
    }

    /// Set intersection.
    pub fn intersection(&self, other: &Region) -> Region {
        Self::normalized(self.0.intersection(&other.0))
    }

    /// Set difference `self - other`.
    pub fn difference(&self, other: &Region) -> Region {
        Self::normalized(self.0.difference(&other.0))
    }

    /// Union of many regions in one sweep.
    pub fn union_all<'a>(regions: impl IntoIterator<Item = &'a Region>) -> Region {
        // unary_union infers its fill rule from the first ring, so inputs must share orientation.
        let mut parts = regions
            .into_iter()
            .filter(|r| !r.0.0.is_empty())
            .map(|r| r.0.orient(Direction::Default))
            .collect::<Vec<_>>();
        match parts.len() {
            0 => Self::empty(),
            1 => Self(parts.remove(0)),
            _ => Self::normalized(unary_union(parts.iter())),
        }
    }

    /// `true` when the region has no area.
    pub fn is_empty(&self) -> bool {
        self.0.0.is_empty() || self.area() <= AREA_EPSILON
    }

    /// Enclosed area.
    pub fn area(&self) -> f64 {
        self.0.unsigned_area()
    }

    /// Number of disjoint polygons.
    pub fn polygon_count(&self) -> usize {
        self.0.0.len()
    }

    /// Point-in-region test (boundary points are outside).
    pub fn contains_point(&self, p: Point) -> bool {
        self.0.contains(&Coord { x: p.x, y: p.y })
    }

    /// Bounds of the region, `None` when empty.
    pub fn bounding_box(&self) -> Option<Rect> {
        self.0
            .bounding_rect()
            .map(|r| Rect::new(r.min().x, r.min().y, r.max().x, r.max().y))
    }

    /// Every vertex of every ring.
    pub fn vertices(&self) -> impl Iterator<Item = Point> + '_ {
        self.0.iter().flat_map(|poly| {
            std::iter::once(poly.exterior())
                .chain(poly.interiors())
                .flat_map(|ls| ls.coords().map(|c| Point::new(c.x, c.y)))
        })
    }

    pub(crate) fn is_valid(&self) -> bool {
        self.vertices().all(|p| p.x.is_finite() && p.y.is_finite())
    }

    fn normalized(mp: MultiPolygon<f64>) -> Region {
        Self(MultiPolygon::new(
            mp.0.into_iter()
                .filter(|p| p.unsigned_area() > AREA_EPSILON)
                .collect(),
        ))
    }
}

fn ring(points: &[Point]) -> LineString<f64> {
    LineString::from(
        points
            .iter()
            .map(|p| Coord { x: p.x, y: p.y })
            .collect::<Vec<_>>(),
    )
}

impl Default for Region {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/region.rs"]
mod tests;
