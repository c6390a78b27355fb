use crate::foundation::error::{UmbraError, UmbraResult};

pub use kurbo::{Affine, BezPath, Point, Rect, Vec2};

/// Host-assigned identifier of a scene item (token, obstruction, fog or ring item).
#[derive(
    Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl ItemId {
    /// Wrap an identifier string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Role of a connected client or of an item owner.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Game master: sees every viewer and receives indicator rings.
    Gm,
    /// Regular player.
    #[default]
    Player,
}

/// The local client a pass is computed for.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ClientInfo {
    /// Client (player) id; also the persistence key.
    pub id: String,
    /// Role of the client.
    #[serde(default)]
    pub role: Role,
    /// Display color, used for indicator rings owned by this client.
    #[serde(default)]
    pub color: Option<String>,
}

/// Grid calibration of the scene.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GridCalibration {
    /// Map pixels per grid cell.
    pub dpi: f64,
    /// Real-world units per grid cell (vision ranges are expressed in these units).
    pub scale: f64,
}

impl Default for GridCalibration {
    fn default() -> Self {
        Self {
            dpi: 150.0,
            scale: 5.0,
        }
    }
}

impl GridCalibration {
    /// Build a calibration, rejecting non-positive or non-finite values.
    pub fn new(dpi: f64, scale: f64) -> UmbraResult<Self> {
        if !(dpi.is_finite() && dpi > 0.0) {
            return Err(UmbraError::validation("grid dpi must be finite and > 0"));
        }
        if !(scale.is_finite() && scale > 0.0) {
            return Err(UmbraError::validation("grid scale must be finite and > 0"));
        }
        Ok(Self { dpi, scale })
    }

    /// Radius in map pixels of a vision range given in grid units.
    ///
    /// The extra half cell covers the distance from a token's center to its edge.
    pub fn range_radius(self, range: f64) -> f64 {
        self.dpi * (range / self.scale + 0.5)
    }
}

/// Placement of an item in map space: translate, rotate (degrees) and scale about the origin.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Placement {
    /// Item position.
    #[serde(default = "origin")]
    pub position: Point,
    /// Rotation in degrees, clockwise in screen space.
    #[serde(default)]
    pub rotation: f64,
    /// Non-uniform scale, default (1,1).
    #[serde(default = "unit_scale")]
    pub scale: Vec2,
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            position: Point::ORIGIN,
            rotation: 0.0,
            scale: Vec2::new(1.0, 1.0),
        }
    }
}

impl Placement {
    /// Local-to-map transform.
    pub fn to_affine(self) -> Affine {
        // T(position) * R(rotation) * S(scale)
        Affine::translate(self.position.to_vec2())
            * Affine::rotate(self.rotation.to_radians())
            * Affine::scale_non_uniform(self.scale.x, self.scale.y)
    }
}

fn origin() -> Point {
    Point::ORIGIN
}

pub(crate) fn unit_scale() -> Vec2 {
    Vec2::new(1.0, 1.0)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
