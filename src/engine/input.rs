use std::cmp::Ordering;

use kurbo::Rect;

use crate::autohide::AutohideToken;
use crate::engine::context::ComputationContext;
use crate::foundation::core::{ClientInfo, GridCalibration, Role};
use crate::foundation::math::{Fingerprint, StableHasher};
use crate::scene::model::{Quality, SceneSettings, Viewer};
use crate::vision::obstruction::{DoorState, ObstructionLine, Side};

/// Everything that can change the outcome of a pass, in canonical order.
///
/// Items are sorted (viewers and tokens by id, segments by coordinates) so the host's listing
/// order never affects the fingerprint.
#[derive(Clone, Debug)]
pub struct RecomputeInput<'a> {
    client: &'a ClientInfo,
    grid: GridCalibration,
    settings: &'a SceneSettings,
    map: Rect,
    viewers: Vec<&'a Viewer>,
    lines: Vec<&'a ObstructionLine>,
    autohide: Vec<&'a AutohideToken>,
}

/// Fingerprints of a [`RecomputeInput`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct InputFingerprint {
    /// Covers every input; equal values short-circuit a pass.
    pub full: Fingerprint,
    /// Covers the obstruction set and the map rectangle; a change invalidates the shadow cache.
    pub geometry: Fingerprint,
}

impl<'a> RecomputeInput<'a> {
    /// Canonical input view of `ctx`.
    pub fn new(ctx: &'a ComputationContext) -> Self {
        let mut viewers = ctx.viewers.iter().collect::<Vec<_>>();
        viewers.sort_by(|a, b| a.id.cmp(&b.id));
        let mut lines = ctx.lines.iter().collect::<Vec<_>>();
        lines.sort_by(|a, b| cmp_line(a, b));
        let mut autohide = ctx.autohide.iter().collect::<Vec<_>>();
        autohide.sort_by(|a, b| a.id.cmp(&b.id));
        Self {
            client: &ctx.client,
            grid: ctx.grid,
            settings: &ctx.settings,
            map: ctx.map,
            viewers,
            lines,
            autohide,
        }
    }

    /// Structural fingerprints.
    pub fn fingerprint(&self) -> InputFingerprint {
        let mut g = StableHasher::new();
        self.write_geometry(&mut g);
        let geometry = g.finish();

        let mut h = StableHasher::new();
        self.write_geometry(&mut h);
        h.write_str(&self.client.id);
        h.write_u8(match self.client.role {
            Role::Gm => 0,
            Role::Player => 1,
        });
        h.write_f64(self.grid.dpi);
        h.write_f64(self.grid.scale);
        write_settings(&mut h, self.settings);

        h.write_usize(self.viewers.len());
        for v in &self.viewers {
            h.write_str(v.id.as_str());
            h.write_point(v.position);
            h.write_f64(v.vision_range);
            h.write_bool(v.torch);
            h.write_bool(v.visible);
            h.write_str(&v.owner_id);
            h.write_u8(match v.owner_role {
                Role::Gm => 0,
                Role::Player => 1,
            });
            write_opt_str(&mut h, v.owner_color.as_deref());
        }

        h.write_usize(self.autohide.len());
        for t in &self.autohide {
            h.write_str(t.id.as_str());
            h.write_point(t.position);
            h.write_f64(t.image_width);
            h.write_f64(t.image_dpi);
            h.write_f64(t.scale.x);
            h.write_f64(t.scale.y);
            h.write_bool(t.visible);
        }

        InputFingerprint {
            full: h.finish(),
            geometry,
        }
    }

    fn write_geometry(&self, h: &mut StableHasher) {
        h.write_rect(self.map);
        h.write_usize(self.lines.len());
        for l in &self.lines {
            h.write_point(l.start);
            h.write_point(l.end);
            h.write_u8(match l.door {
                DoorState::None => 0,
                DoorState::Closed => 1,
                DoorState::Open => 2,
            });
            h.write_u8(match l.one_sided {
                None => 0,
                Some(Side::Left) => 1,
                Some(Side::Right) => 2,
            });
        }
    }
}

impl InputFingerprint {
    /// Fingerprint of `ctx`.
    pub fn of(ctx: &ComputationContext) -> Self {
        RecomputeInput::new(ctx).fingerprint()
    }
}

fn write_settings(h: &mut StableHasher, s: &SceneSettings) {
    h.write_bool(s.vision_enabled);
    h.write_bool(s.autodetect_enabled);
    h.write_bool(s.persistence_enabled);
    h.write_bool(s.fow_enabled);
    write_opt_str(h, s.fow_color.as_deref());
    h.write_u8(match s.quality {
        Quality::Low => 0,
        Quality::Medium => 1,
        Quality::High => 2,
    });
    h.write_bool(s.player_doors);
}

fn write_opt_str(h: &mut StableHasher, s: Option<&str>) {
    match s {
        Some(s) => {
            h.write_u8(1);
            h.write_str(s);
        }
        None => h.write_u8(0),
    }
}

fn cmp_line(a: &ObstructionLine, b: &ObstructionLine) -> Ordering {
    a.start
        .x
        .total_cmp(&b.start.x)
        .then(a.start.y.total_cmp(&b.start.y))
        .then(a.end.x.total_cmp(&b.end.x))
        .then(a.end.y.total_cmp(&b.end.y))
}

#[cfg(test)]
#[path = "../../tests/unit/engine/input.rs"]
mod tests;
