use kurbo::Rect;

use crate::autohide::AutohideToken;
use crate::foundation::core::{ClientInfo, GridCalibration};
use crate::scene::model::{SceneSettings, SceneSnapshot, Viewer, select_viewers};
use crate::vision::obstruction::{ObstructionLine, extract_obstructions};

/// Immutable inputs of one pass, derived from a [`SceneSnapshot`].
///
/// Built at the start of a pass and dropped at its end; nothing here survives across passes.
#[derive(Clone, Debug, PartialEq)]
pub struct ComputationContext {
    /// Scene id.
    pub scene_id: String,
    /// Local client.
    pub client: ClientInfo,
    /// Grid calibration.
    pub grid: GridCalibration,
    /// Settings flags.
    pub settings: SceneSettings,
    /// Resolved map rectangle.
    pub map: Rect,
    /// Viewers selected for the local client, in snapshot order.
    pub viewers: Vec<Viewer>,
    /// Active obstruction segments.
    pub lines: Vec<ObstructionLine>,
    /// Auto-hide-flagged tokens.
    pub autohide: Vec<AutohideToken>,
}

impl ComputationContext {
    /// Context for `snapshot`, or `None` when the scene has no map geometry.
    pub fn from_snapshot(snapshot: &SceneSnapshot) -> Option<Self> {
        let map = snapshot
            .map
            .resolve(snapshot.grid, snapshot.settings.autodetect_enabled)?;
        if map.is_zero_area() {
            return None;
        }
        Some(Self {
            scene_id: snapshot.scene_id.clone(),
            client: snapshot.client.clone(),
            grid: snapshot.grid,
            settings: snapshot.settings.clone(),
            map,
            viewers: select_viewers(&snapshot.viewers, &snapshot.client),
            lines: extract_obstructions(&snapshot.obstructions),
            autohide: snapshot.autohide.clone(),
        })
    }

    /// Disc tolerance from the quality setting unless `overridden`.
    pub fn disc_tolerance(&self, overridden: Option<f64>) -> f64 {
        overridden.unwrap_or_else(|| self.settings.quality.disc_tolerance())
    }

    /// `true` when at least one selected viewer is range-limited.
    pub fn any_ranged(&self) -> bool {
        self.viewers.iter().any(Viewer::is_ranged)
    }

    /// `true` when at least one selected viewer is not a torch.
    pub fn any_ordinary(&self) -> bool {
        self.viewers.iter().any(|v| !v.torch)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/engine/context.rs"]
mod tests;
