use kurbo::Point;

use crate::foundation::core::{ItemId, Placement};
use crate::foundation::math::{cross, is_finite_point};

/// Door state of an obstruction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoorState {
    /// Plain wall.
    #[default]
    None,
    /// Door, currently blocking sight.
    Closed,
    /// Door, currently letting sight through.
    Open,
}

/// Side of a directed segment `start -> end`, measured with the y axis pointing down.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// `cross(end - start, p - start) < 0`.
    Left,
    /// `cross(end - start, p - start) > 0`.
    Right,
}

impl Side {
    pub(crate) fn of(start: Point, end: Point, p: Point) -> Option<Side> {
        let c = cross(start, end, p);
        if c < 0.0 {
            Some(Side::Left)
        } else if c > 0.0 {
            Some(Side::Right)
        } else {
            None
        }
    }
}

/// Raw sight-blocking drawing as authored on the host.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ObstructionShape {
    /// Host item id.
    pub id: ItemId,
    /// Vertices in local space.
    pub points: Vec<Point>,
    /// Local-to-map placement.
    #[serde(default)]
    pub placement: Placement,
    /// Polygon obstruction: the last vertex connects back to the first.
    #[serde(default)]
    pub closed: bool,
    /// Disabled obstructions never block.
    #[serde(default)]
    pub disabled: bool,
    /// Door state.
    #[serde(default)]
    pub door: DoorState,
    /// Block only viewers standing on this side of each segment.
    #[serde(default)]
    pub one_sided: Option<Side>,
}

impl ObstructionShape {
    /// Map-space segments of this shape, active or not.
    pub fn segments(&self) -> Vec<ObstructionLine> {
        let t = self.placement.to_affine();
        let pts = self.points.iter().map(|p| t * *p).collect::<Vec<_>>();
        let mut out = pts
            .windows(2)
            .map(|w| self.line(w[0], w[1]))
            .collect::<Vec<_>>();
        if self.closed
            && pts.len() > 2
            && let (Some(&last), Some(&first)) = (pts.last(), pts.first())
        {
            out.push(self.line(last, first));
        }
        out
    }

    fn line(&self, start: Point, end: Point) -> ObstructionLine {
        ObstructionLine {
            start,
            end,
            disabled: self.disabled,
            door: self.door,
            one_sided: self.one_sided,
        }
    }
}

/// A sight-blocking segment in map space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ObstructionLine {
    /// Segment start.
    pub start: Point,
    /// Segment end.
    pub end: Point,
    /// Disabled segments never block.
    pub disabled: bool,
    /// Door state; open doors never block.
    pub door: DoorState,
    /// Blocking side for one-sided segments.
    pub one_sided: Option<Side>,
}

impl ObstructionLine {
    /// Plain two-sided wall.
    pub fn wall(start: Point, end: Point) -> Self {
        Self {
            start,
            end,
            disabled: false,
            door: DoorState::None,
            one_sided: None,
        }
    }

    /// Whether this segment takes part in shadow casting.
    pub fn is_active(&self) -> bool {
        !self.disabled
            && self.door != DoorState::Open
            && self.start != self.end
            && is_finite_point(self.start)
            && is_finite_point(self.end)
    }

    /// Whether the segment blocks sight for a viewer at `viewer`.
    ///
    /// A one-sided segment blocks only viewers strictly on its blocking side.
    pub fn blocks_from(&self, viewer: Point) -> bool {
        match self.one_sided {
            None => true,
            Some(side) => Side::of(self.start, self.end, viewer) == Some(side),
        }
    }
}

/// Active segments of every shape; disabled shapes and open doors are dropped for the pass.
pub fn extract_obstructions(shapes: &[ObstructionShape]) -> Vec<ObstructionLine> {
    shapes
        .iter()
        .flat_map(ObstructionShape::segments)
        .filter(ObstructionLine::is_active)
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/vision/obstruction.rs"]
mod tests;
