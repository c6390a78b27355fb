use kurbo::{Point, Vec2};

use crate::foundation::core::{GridCalibration, ItemId, unit_scale};
use crate::geometry::region::Region;

/// A token whose visibility follows whether anyone can see it.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AutohideToken {
    /// Host item id.
    pub id: ItemId,
    /// Token center.
    pub position: Point,
    /// Image width in image pixels.
    pub image_width: f64,
    /// Pixels per grid cell of the token image.
    pub image_dpi: f64,
    /// Token scale.
    #[serde(default = "unit_scale")]
    pub scale: Vec2,
    /// Currently displayed visibility.
    #[serde(default)]
    pub visible: bool,
}

impl AutohideToken {
    /// Radius of the token footprint hexagon in map pixels.
    pub fn hexagon_radius(&self, grid: GridCalibration) -> f64 {
        (grid.dpi / self.image_dpi) * (self.image_width / 2.0) * self.scale.x.abs()
    }

    /// Footprint hexagon.
    pub fn footprint(&self, grid: GridCalibration) -> Region {
        Region::hexagon(self.position, self.hexagon_radius(grid))
    }
}

/// A requested change of a token's displayed visibility.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct VisibilityChange {
    /// Token id.
    pub id: ItemId,
    /// New visibility.
    pub visible: bool,
}

/// Toggles for every token whose visibility disagrees with `visible`.
///
/// A token should be shown iff its footprint hexagon overlaps the visible region.
pub fn evaluate_autohide(
    tokens: &[AutohideToken],
    visible: &Region,
    grid: GridCalibration,
) -> Vec<VisibilityChange> {
    tokens
        .iter()
        .filter_map(|token| {
            let should_show = !token.footprint(grid).intersection(visible).is_empty();
            (should_show != token.visible).then(|| VisibilityChange {
                id: token.id.clone(),
                visible: should_show,
            })
        })
        .collect()
}

#[cfg(test)]
#[path = "../tests/unit/autohide.rs"]
mod tests;
