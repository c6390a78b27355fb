//! Turns per-viewer visible regions into fog item mutations.
//!
//! Three policies combine here:
//!
//! - **Dedup**: a region whose digest already belongs to a live fog item is not re-created.
//! - **Persistence**: one cumulative item per client replaces per-viewer items; its path only
//!   grows, and stale per-viewer items are left alone.
//! - **Trailing fog**: one overlay covering the map minus everything currently visible, updated
//!   in place.

use std::collections::HashSet;

use kurbo::Rect;

use crate::fog::color::FogColor;
use crate::foundation::core::ItemId;
use crate::foundation::error::UmbraResult;
use crate::geometry::path::{Digest, PathCommands};
use crate::geometry::region::Region;
use crate::scene::model::{
    FOG_Z_INDEX, FogItem, IndicatorRing, LocalItems, SceneMutations, SceneSettings,
    TrailingFogItem,
};

/// Result of fog synthesis for one pass.
#[derive(Clone, Debug)]
pub struct FogOutcome {
    /// Fog, trailing and ring changes.
    pub mutations: SceneMutations,
    /// New cumulative path to persist (persistence mode only).
    pub cumulative: Option<PathCommands>,
    /// Union of every current visible region.
    pub visible: Region,
}

/// Fog synthesis over the items the local client already owns.
#[derive(Clone, Copy, Debug)]
pub struct FogSynthesizer<'a> {
    client_id: &'a str,
    map: Rect,
    settings: &'a SceneSettings,
    existing: &'a LocalItems,
}

impl<'a> FogSynthesizer<'a> {
    /// Synthesizer for `client_id` given its current local items.
    pub fn new(
        client_id: &'a str,
        map: Rect,
        settings: &'a SceneSettings,
        existing: &'a LocalItems,
    ) -> Self {
        Self {
            client_id,
            map,
            settings,
            existing,
        }
    }

    /// Delete every fog, trailing and ring item the client owns.
    pub fn clear_all(&self) -> SceneMutations {
        SceneMutations {
            delete: self.existing.all_ids(),
            ..SceneMutations::default()
        }
    }

    /// Build the mutation batch for this pass.
    ///
    /// `seed` is the last persisted cumulative path; it is used only when the scene carries no
    /// cumulative item.
    pub fn synthesize(
        &self,
        regions: &[Region],
        rings: Vec<IndicatorRing>,
        seed: Option<&PathCommands>,
    ) -> UmbraResult<FogOutcome> {
        let mut m = SceneMutations::default();
        let visible = Region::union_all(regions);
        let persistence = self.settings.persistence_enabled;

        let cumulative = if persistence {
            let previous = match self.existing.cumulative() {
                Some(item) => Region::from_commands(&item.commands)?,
                None => match seed {
                    Some(cmds) => Region::from_commands(cmds)?,
                    None => Region::empty(),
                },
            };
            let grown = !visible.difference(&previous).is_empty();
            let cmds = match self.existing.cumulative() {
                Some(item) if !grown => item.commands.clone(),
                Some(item) => {
                    let cmds = visible.union(&previous).to_commands();
                    m.update_fog.push(FogItem {
                        commands: cmds.clone(),
                        ..item.clone()
                    });
                    cmds
                }
                None => {
                    let cmds = visible.union(&previous).to_commands();
                    m.add_fog.push(FogItem {
                        id: cumulative_id(self.client_id),
                        digest: Digest::cumulative(),
                        commands: cmds.clone(),
                        visible: true,
                        z_index: FOG_Z_INDEX,
                    });
                    cmds
                }
            };
            Some(cmds)
        } else {
            let mut kept: HashSet<ItemId> = HashSet::new();
            let mut live_digests: HashSet<&Digest> = HashSet::new();
            for item in &self.existing.fog {
                if !item.digest.is_cumulative() && live_digests.insert(&item.digest) {
                    // First live item per digest is the canonical one.
                    kept.insert(item.id.clone());
                }
            }
            let mut used: HashSet<Digest> = HashSet::new();
            let mut staged: HashSet<Digest> = HashSet::new();
            for region in regions {
                if region.is_empty() {
                    continue;
                }
                let cmds = region.to_commands();
                let digest = cmds.digest();
                if live_digests.contains(&digest) {
                    used.insert(digest);
                } else if staged.insert(digest.clone()) {
                    m.add_fog.push(FogItem {
                        id: fog_id(self.client_id, &digest),
                        digest,
                        commands: cmds,
                        visible: true,
                        z_index: FOG_Z_INDEX,
                    });
                }
            }
            kept.retain(|id| {
                self.existing
                    .fog
                    .iter()
                    .any(|f| &f.id == id && used.contains(&f.digest))
            });
            m.delete.extend(
                self.existing
                    .fog
                    .iter()
                    .filter(|f| !kept.contains(&f.id))
                    .map(|f| f.id.clone()),
            );
            None
        };

        self.trailing(&visible, &mut m);

        m.delete
            .extend(self.existing.rings.iter().map(|r| r.id.clone()));
        m.add_rings = rings;

        Ok(FogOutcome {
            mutations: m,
            cumulative,
            visible,
        })
    }

    fn trailing(&self, visible: &Region, m: &mut SceneMutations) {
        if !self.settings.fow_enabled {
            m.delete
                .extend(self.existing.trailing.iter().map(|t| t.id.clone()));
            return;
        }
        let commands = Region::from_rect(self.map).difference(visible).to_commands();
        let color = FogColor::from_setting(self.settings.fow_color.as_deref());
        match self.existing.trailing.split_first() {
            Some((current, extra)) => {
                m.delete.extend(extra.iter().map(|t| t.id.clone()));
                if current.commands != commands || current.color != color {
                    m.update_trailing = Some(TrailingFogItem {
                        id: current.id.clone(),
                        commands,
                        color,
                    });
                }
            }
            None => {
                m.add_trailing = Some(TrailingFogItem {
                    id: trailing_id(self.client_id),
                    commands,
                    color,
                });
            }
        }
    }
}

/// Id of the cumulative persistent fog item of a client.
pub(crate) fn cumulative_id(client_id: &str) -> ItemId {
    ItemId::new(format!("umbra/persistent/{client_id}"))
}

fn trailing_id(client_id: &str) -> ItemId {
    ItemId::new(format!("umbra/trailing/{client_id}"))
}

fn fog_id(client_id: &str, digest: &Digest) -> ItemId {
    let short = digest.as_str().get(..16).unwrap_or(digest.as_str());
    ItemId::new(format!("umbra/fog/{client_id}/{short}"))
}

#[cfg(test)]
#[path = "../../tests/unit/fog/synth.rs"]
mod tests;
