use kurbo::{BezPath, PathEl, Point, Rect};
use sha2::{Digest as _, Sha256};

use crate::foundation::error::{UmbraError, UmbraResult};
use crate::foundation::math::is_finite_point;

/// Digest reserved for the cumulative persistent fog item.
pub(crate) const CUMULATIVE_DIGEST: &str = "reuse";

/// One path-construction operation.
///
/// Serialized compactly: `{"M":[x,y]}`, `{"L":[x,y]}` and `"Z"`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum PathCmd {
    /// Start a new ring.
    #[serde(rename = "M")]
    MoveTo(f64, f64),
    /// Straight segment to a point.
    #[serde(rename = "L")]
    LineTo(f64, f64),
    /// Close the current ring.
    #[serde(rename = "Z")]
    Close,
}

/// Canonical serializable path: the unit exchanged with workers, hashed for dedup and persisted.
///
/// Only straight segments are represented; curved input is flattened on the way in.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct PathCommands(Vec<PathCmd>);

impl PathCommands {
    /// Empty path.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Wrap an existing command list.
    pub fn from_vec(cmds: Vec<PathCmd>) -> Self {
        Self(cmds)
    }

    /// Closed polygon through `points`.
    pub fn polygon(points: &[Point]) -> Self {
        let mut out = Self::new();
        out.push_ring(points);
        out
    }

    /// Borrow the commands.
    pub fn as_slice(&self) -> &[PathCmd] {
        &self.0
    }

    /// Number of commands.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` when the path has no commands.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn push_ring(&mut self, points: &[Point]) {
        let Some((first, rest)) = points.split_first() else {
            return;
        };
        self.0.push(PathCmd::MoveTo(first.x, first.y));
        self.0
            .extend(rest.iter().map(|p| PathCmd::LineTo(p.x, p.y)));
        self.0.push(PathCmd::Close);
    }

    /// Flatten a kurbo path (curves included) into line commands.
    pub fn from_bez_path(path: &BezPath, tolerance: f64) -> Self {
        let mut out = Vec::new();
        kurbo::flatten(path.iter(), tolerance, |el| match el {
            PathEl::MoveTo(p) => out.push(PathCmd::MoveTo(p.x, p.y)),
            PathEl::LineTo(p) => out.push(PathCmd::LineTo(p.x, p.y)),
            PathEl::ClosePath => out.push(PathCmd::Close),
            // flatten only emits the three variants above
            PathEl::QuadTo(..) | PathEl::CurveTo(..) => {}
        });
        Self(out)
    }

    /// Convert to a kurbo path.
    pub fn to_bez_path(&self) -> BezPath {
        let mut path = BezPath::new();
        for cmd in &self.0 {
            match *cmd {
                PathCmd::MoveTo(x, y) => path.move_to((x, y)),
                PathCmd::LineTo(x, y) => path.line_to((x, y)),
                PathCmd::Close => path.close_path(),
            }
        }
        path
    }

    /// SVG path data; also the canonical form hashed by [`PathCommands::digest`].
    pub fn to_svg(&self) -> String {
        self.to_bez_path().to_svg()
    }

    /// Parse SVG path data, flattening any curves.
    pub fn from_svg(data: &str, tolerance: f64) -> UmbraResult<Self> {
        let path = BezPath::from_svg(data)
            .map_err(|e| UmbraError::serde(format!("invalid svg path data: {e}")))?;
        Ok(Self::from_bez_path(&path, tolerance))
    }

    /// Content digest (SHA-256 hex of the canonical SVG form).
    pub fn digest(&self) -> Digest {
        let hash = Sha256::digest(self.to_svg().as_bytes());
        let mut hex = String::with_capacity(hash.len() * 2);
        for b in hash {
            hex.push_str(&format!("{b:02x}"));
        }
        Digest(hex)
    }

    /// Axis-aligned bounds of every point, `None` when empty.
    pub fn bounding_box(&self) -> Option<Rect> {
        let mut it = self.0.iter().filter_map(|c| match *c {
            PathCmd::MoveTo(x, y) | PathCmd::LineTo(x, y) => Some(Point::new(x, y)),
            PathCmd::Close => None,
        });
        let first = it.next()?;
        Some(it.fold(Rect::from_points(first, first), |r, p| r.union_pt(p)))
    }

    /// Split into rings, validating structure and coordinates.
    ///
    /// Rings with fewer than three distinct vertices are dropped. A ring is implicitly closed.
    pub(crate) fn rings(&self) -> UmbraResult<Vec<Vec<Point>>> {
        let mut rings = Vec::new();
        let mut current: Option<Vec<Point>> = None;
        for cmd in &self.0 {
            match *cmd {
                PathCmd::MoveTo(x, y) => {
                    let p = Point::new(x, y);
                    if !is_finite_point(p) {
                        return Err(UmbraError::geometry("non-finite path coordinate"));
                    }
                    if let Some(ring) = current.replace(vec![p]) {
                        rings.push(ring);
                    }
                }
                PathCmd::LineTo(x, y) => {
                    let p = Point::new(x, y);
                    if !is_finite_point(p) {
                        return Err(UmbraError::geometry("non-finite path coordinate"));
                    }
                    match current.as_mut() {
                        Some(ring) => {
                            if ring.last() != Some(&p) {
                                ring.push(p);
                            }
                        }
                        None => {
                            return Err(UmbraError::geometry("line command before move command"));
                        }
                    }
                }
                PathCmd::Close => {
                    if let Some(ring) = current.take() {
                        rings.push(ring);
                    }
                }
            }
        }
        if let Some(ring) = current.take() {
            rings.push(ring);
        }
        for ring in &mut rings {
            if ring.len() > 1 && ring.first() == ring.last() {
                ring.pop();
            }
        }
        rings.retain(|r| r.len() >= 3);
        Ok(rings)
    }
}

/// Content hash of a fog path, used to deduplicate fog items.
#[derive(
    Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct Digest(String);

impl Digest {
    /// Wrap a digest string as stored on a host item.
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Reserved digest of the cumulative persistent fog item.
    pub fn cumulative() -> Self {
        Self(CUMULATIVE_DIGEST.to_string())
    }

    /// `true` for the cumulative persistent fog item.
    pub fn is_cumulative(&self) -> bool {
        self.0 == CUMULATIVE_DIGEST
    }

    /// Borrow the digest text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/path.rs"]
mod tests;
