use std::path::Path;

use kurbo::{Point, Rect, Vec2};

use crate::autohide::{AutohideToken, VisibilityChange};
use crate::fog::color::FogColor;
use crate::foundation::core::{ClientInfo, GridCalibration, ItemId, Role, unit_scale};
use crate::foundation::error::{UmbraError, UmbraResult};
use crate::geometry::path::{Digest, PathCommands};
use crate::vision::obstruction::ObstructionShape;

/// Z order of fog items.
pub(crate) const FOG_Z_INDEX: i32 = 3;

/// An entity whose sight is computed.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Viewer {
    /// Host item id.
    pub id: ItemId,
    /// Position in map space.
    pub position: Point,
    /// Vision range in grid units; `0` means unlimited.
    #[serde(default)]
    pub vision_range: f64,
    /// Torches reveal only what some ordinary viewer also sees.
    #[serde(default)]
    pub torch: bool,
    /// Id of the client that owns the token.
    #[serde(default)]
    pub owner_id: String,
    /// Role of the owning client.
    #[serde(default)]
    pub owner_role: Role,
    /// Owner display color.
    #[serde(default)]
    pub owner_color: Option<String>,
    /// Whether the token is currently shown.
    #[serde(default = "yes")]
    pub visible: bool,
}

impl Viewer {
    /// Unlimited-range, visible, player-owned viewer.
    pub fn new(id: impl Into<String>, position: Point) -> Self {
        Self {
            id: ItemId::new(id),
            position,
            vision_range: 0.0,
            torch: false,
            owner_id: String::new(),
            owner_role: Role::Player,
            owner_color: None,
            visible: true,
        }
    }

    /// Set the vision range in grid units.
    pub fn with_range(mut self, range: f64) -> Self {
        self.vision_range = range;
        self
    }

    /// Mark as a torch.
    pub fn as_torch(mut self) -> Self {
        self.torch = true;
        self
    }

    /// Set the owning client.
    pub fn owned_by(mut self, owner_id: impl Into<String>, role: Role) -> Self {
        self.owner_id = owner_id.into();
        self.owner_role = role;
        self
    }

    /// `true` when the viewer's sight stops at a finite distance.
    pub fn is_ranged(&self) -> bool {
        self.vision_range > 0.0
    }
}

/// Viewers a client computes sight for.
///
/// Hidden torches never participate. A GM sees through every viewer; a player through their
/// own viewers and the GM's.
pub fn select_viewers(viewers: &[Viewer], client: &ClientInfo) -> Vec<Viewer> {
    viewers
        .iter()
        .filter(|v| !v.torch || v.visible)
        .filter(|v| match client.role {
            Role::Gm => true,
            Role::Player => v.owner_id == client.id || v.owner_role == Role::Gm,
        })
        .cloned()
        .collect()
}

/// Render quality; controls how finely vision discs are approximated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    /// Coarse discs.
    Low,
    /// Balanced.
    #[default]
    Medium,
    /// Fine discs.
    High,
}

impl Quality {
    /// Maximum distance in map pixels between a disc polygon and its circle.
    pub fn disc_tolerance(self) -> f64 {
        match self {
            Quality::Low => 2.0,
            Quality::Medium => 0.5,
            Quality::High => 0.1,
        }
    }
}

/// Scene-level settings flags (read-only for the engine).
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SceneSettings {
    /// Master switch; when off every fog item is cleared.
    pub vision_enabled: bool,
    /// Derive the map rectangle from the map-layer images instead of the border.
    pub autodetect_enabled: bool,
    /// Keep one cumulative revealed path per client.
    pub persistence_enabled: bool,
    /// Draw trailing fog over the non-visible part of the map.
    pub fow_enabled: bool,
    /// Trailing fog color, `#RRGGBBAA` or `#RRGGBB`.
    pub fow_color: Option<String>,
    /// Disc approximation quality.
    pub quality: Quality,
    /// Whether players see door overlays. Door rendering lives outside the engine; the flag
    /// only participates in change detection.
    pub player_doors: bool,
}

/// Rectangular border drawn around the playable map.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MapBorder {
    /// Top-left corner.
    pub position: Point,
    /// Unscaled width.
    pub width: f64,
    /// Unscaled height.
    pub height: f64,
    /// Scale applied to width/height.
    #[serde(default = "unit_scale")]
    pub scale: Vec2,
}

/// A map-layer image.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MapImage {
    /// Item position.
    pub position: Point,
    /// Item scale.
    #[serde(default = "unit_scale")]
    pub scale: Vec2,
    /// Rotation in degrees; multiples of 90 are honored.
    #[serde(default)]
    pub rotation: f64,
    /// Pixels per grid cell of the image.
    pub grid_dpi: f64,
    /// Image grid offset in image pixels.
    #[serde(default)]
    pub grid_offset: Vec2,
    /// Image width in pixels.
    pub width: f64,
    /// Image height in pixels.
    pub height: f64,
}

impl MapImage {
    /// Map-space bounds of the image at the scene grid resolution.
    pub fn bounds(&self, grid: GridCalibration) -> Rect {
        let ratio = grid.dpi / self.grid_dpi;
        let mut left = self.position.x - ratio * self.grid_offset.x * self.scale.x;
        let mut top = self.position.y - ratio * self.grid_offset.y * self.scale.y;
        let w = ratio * self.width * self.scale.x;
        let h = ratio * self.height * self.scale.y;
        match self.rotation.rem_euclid(360.0).round() as i64 {
            90 => left -= w.abs(),
            180 => {
                left -= w.abs();
                top -= h.abs();
            }
            270 => top -= h.abs(),
            _ => {}
        }
        Rect::new(left, top, left + w, top + h).abs()
    }
}

/// Map geometry of the scene.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MapLayer {
    /// Scene border.
    pub border: Option<MapBorder>,
    /// Background image.
    pub background: Option<MapImage>,
    /// Every map-layer image (autodetect input).
    pub images: Vec<MapImage>,
}

impl MapLayer {
    /// Map rectangle for this pass, `None` when the scene has no map geometry.
    pub fn resolve(&self, grid: GridCalibration, autodetect: bool) -> Option<Rect> {
        if self.background.is_none() && self.border.is_none() {
            return None;
        }
        if autodetect {
            return self
                .images
                .iter()
                .map(|img| img.bounds(grid))
                .reduce(|a, b| a.union(b));
        }
        let border = self.border.as_ref()?;
        Some(
            Rect::from_origin_size(
                border.position,
                (border.width * border.scale.x, border.height * border.scale.y),
            )
            .abs(),
        )
    }
}

/// A renderable fog path owned by the local client.
///
/// Vision fog items carry a viewer's visible region, which the renderer cuts out of the fog
/// layer; the cumulative persistent item carries [`Digest::cumulative`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FogItem {
    /// Local item id.
    pub id: ItemId,
    /// Content digest of `commands`.
    pub digest: Digest,
    /// Path.
    pub commands: PathCommands,
    /// Shown flag.
    #[serde(default = "yes")]
    pub visible: bool,
    /// Draw order.
    #[serde(default = "fog_z_index")]
    pub z_index: i32,
}

/// Overlay over previously seen but not currently visible area.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TrailingFogItem {
    /// Local item id.
    pub id: ItemId,
    /// Complement of the current visible area within the map.
    pub commands: PathCommands,
    /// Overlay color.
    pub color: FogColor,
}

/// GM-only display ring showing a viewer's vision range.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct IndicatorRing {
    /// Local item id.
    pub id: ItemId,
    /// Viewer the ring belongs to.
    pub viewer_id: ItemId,
    /// Ring center.
    pub center: Point,
    /// Ring radius in map pixels.
    pub radius: f64,
    /// Stroke color.
    #[serde(default)]
    pub color: Option<String>,
}

/// Items the engine owns in the local client's scene.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LocalItems {
    /// Vision fog items and the cumulative item.
    pub fog: Vec<FogItem>,
    /// Trailing fog overlays (normally at most one).
    pub trailing: Vec<TrailingFogItem>,
    /// Indicator rings.
    pub rings: Vec<IndicatorRing>,
}

impl LocalItems {
    /// Ids of every owned item.
    pub fn all_ids(&self) -> Vec<ItemId> {
        self.fog
            .iter()
            .map(|f| f.id.clone())
            .chain(self.trailing.iter().map(|t| t.id.clone()))
            .chain(self.rings.iter().map(|r| r.id.clone()))
            .collect()
    }

    /// The cumulative persistent fog item, if present.
    pub fn cumulative(&self) -> Option<&FogItem> {
        self.fog.iter().find(|f| f.digest.is_cumulative())
    }
}

/// One batched change set for the host, scoped to the local client.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SceneMutations {
    /// Local items to delete.
    pub delete: Vec<ItemId>,
    /// New fog items.
    pub add_fog: Vec<FogItem>,
    /// Fog items whose path is replaced in place (matched by id).
    pub update_fog: Vec<FogItem>,
    /// New trailing overlay.
    pub add_trailing: Option<TrailingFogItem>,
    /// Trailing overlay updated in place.
    pub update_trailing: Option<TrailingFogItem>,
    /// New indicator rings.
    pub add_rings: Vec<IndicatorRing>,
    /// Token visibility toggles.
    pub visibility: Vec<VisibilityChange>,
}

impl SceneMutations {
    /// `true` when the batch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.item_count() == 0
    }

    /// Number of individual item operations in the batch.
    pub fn item_count(&self) -> usize {
        self.delete.len()
            + self.add_fog.len()
            + self.update_fog.len()
            + usize::from(self.add_trailing.is_some())
            + usize::from(self.update_trailing.is_some())
            + self.add_rings.len()
            + self.visibility.len()
    }
}

/// Everything the engine reads from the host for one pass.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SceneSnapshot {
    /// Scene id; also the persistence key.
    pub scene_id: String,
    /// `false` while the host is still loading the scene.
    #[serde(default = "yes")]
    pub ready: bool,
    /// Local client.
    pub client: ClientInfo,
    /// Grid calibration.
    #[serde(default)]
    pub grid: GridCalibration,
    /// Settings flags.
    #[serde(default)]
    pub settings: SceneSettings,
    /// Every vision-enabled token.
    #[serde(default)]
    pub viewers: Vec<Viewer>,
    /// Sight-blocking shapes.
    #[serde(default)]
    pub obstructions: Vec<ObstructionShape>,
    /// Map geometry.
    #[serde(default)]
    pub map: MapLayer,
    /// Auto-hide-flagged tokens.
    #[serde(default)]
    pub autohide: Vec<AutohideToken>,
    /// Items the engine owns in the local scene.
    #[serde(default)]
    pub local: LocalItems,
}

impl SceneSnapshot {
    /// Empty, ready scene for `client`.
    pub fn new(scene_id: impl Into<String>, client: ClientInfo) -> Self {
        Self {
            scene_id: scene_id.into(),
            ready: true,
            client,
            grid: GridCalibration::default(),
            settings: SceneSettings::default(),
            viewers: Vec::new(),
            obstructions: Vec::new(),
            map: MapLayer::default(),
            autohide: Vec::new(),
            local: LocalItems::default(),
        }
    }

    /// Parse and validate a JSON snapshot.
    pub fn from_json_str(s: &str) -> UmbraResult<Self> {
        let snapshot: Self = serde_json::from_str(s)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Read, parse and validate a JSON snapshot file.
    pub fn from_path(path: &Path) -> UmbraResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            UmbraError::validation(format!("failed to read '{}': {e}", path.display()))
        })?;
        Self::from_json_str(&text)
    }

    /// Check calibration and coordinates.
    pub fn validate(&self) -> UmbraResult<()> {
        GridCalibration::new(self.grid.dpi, self.grid.scale)?;
        for v in &self.viewers {
            if !(v.position.x.is_finite() && v.position.y.is_finite()) {
                return Err(UmbraError::validation(format!(
                    "viewer '{}' has a non-finite position",
                    v.id
                )));
            }
            if !v.vision_range.is_finite() || v.vision_range < 0.0 {
                return Err(UmbraError::validation(format!(
                    "viewer '{}' vision_range must be finite and >= 0",
                    v.id
                )));
            }
        }
        for t in &self.autohide {
            let finite = t.position.x.is_finite()
                && t.position.y.is_finite()
                && t.image_width.is_finite()
                && t.scale.x.is_finite()
                && t.scale.y.is_finite();
            if !finite || !(t.image_dpi.is_finite() && t.image_dpi > 0.0) {
                return Err(UmbraError::validation(format!(
                    "autohide token '{}' needs finite geometry and image_dpi > 0",
                    t.id
                )));
            }
        }
        for img in self.map.images.iter().chain(self.map.background.iter()) {
            if !(img.grid_dpi.is_finite() && img.grid_dpi > 0.0) {
                return Err(UmbraError::validation("map image grid_dpi must be > 0"));
            }
        }
        Ok(())
    }

    /// Apply a mutation batch the way a host would.
    pub fn apply_mutations(&mut self, m: &SceneMutations) -> UmbraResult<()> {
        let local = &mut self.local;
        local.fog.retain(|f| !m.delete.contains(&f.id));
        local.trailing.retain(|t| !m.delete.contains(&t.id));
        local.rings.retain(|r| !m.delete.contains(&r.id));

        for update in &m.update_fog {
            let item = local
                .fog
                .iter_mut()
                .find(|f| f.id == update.id)
                .ok_or_else(|| UmbraError::host(format!("no fog item '{}'", update.id)))?;
            *item = update.clone();
        }
        local.fog.extend(m.add_fog.iter().cloned());

        if let Some(update) = &m.update_trailing {
            let item = local
                .trailing
                .iter_mut()
                .find(|t| t.id == update.id)
                .ok_or_else(|| UmbraError::host(format!("no trailing item '{}'", update.id)))?;
            *item = update.clone();
        }
        local.trailing.extend(m.add_trailing.iter().cloned());
        local.rings.extend(m.add_rings.iter().cloned());

        for change in &m.visibility {
            if let Some(token) = self.autohide.iter_mut().find(|t| t.id == change.id) {
                token.visible = change.visible;
            }
        }
        Ok(())
    }
}

fn yes() -> bool {
    true
}

fn fog_z_index() -> i32 {
    FOG_Z_INDEX
}

#[cfg(test)]
#[path = "../../tests/unit/scene/model.rs"]
mod tests;
