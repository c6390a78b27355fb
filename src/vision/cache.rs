use std::collections::HashMap;

use kurbo::Point;

use crate::foundation::core::ItemId;
use crate::geometry::path::PathCommands;
use crate::scene::model::Viewer;

/// Last resolved visible region of a viewer, before range clipping.
#[derive(Clone, Debug, PartialEq)]
pub struct ShadowCacheEntry {
    /// Viewer the entry belongs to.
    pub viewer_id: ItemId,
    /// Viewer position the region was computed at.
    pub position: Point,
    /// Vision range the region was computed for.
    pub vision_range: f64,
    /// Resolved visible region.
    pub commands: PathCommands,
}

impl ShadowCacheEntry {
    /// Reusable iff position and range match exactly.
    pub fn matches(&self, viewer: &Viewer) -> bool {
        self.viewer_id == viewer.id
            && self.position == viewer.position
            && self.vision_range == viewer.vision_range
    }
}

/// Per-viewer memo of resolved visible regions.
///
/// Entries survive across passes until [`ShadowCache::invalidate_all`]; the engine calls it
/// whenever the obstruction set or the map rectangle changes.
#[derive(Debug, Default)]
pub struct ShadowCache {
    entries: HashMap<ItemId, ShadowCacheEntry>,
}

impl ShadowCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw entry lookup.
    pub fn get(&self, viewer_id: &ItemId) -> Option<&ShadowCacheEntry> {
        self.entries.get(viewer_id)
    }

    /// Store (or replace) the entry of `viewer_id`.
    pub fn set(&mut self, viewer_id: ItemId, entry: ShadowCacheEntry) {
        self.entries.insert(viewer_id, entry);
    }

    /// Entry for `viewer` if it is still reusable.
    pub fn lookup(&self, viewer: &Viewer) -> Option<&ShadowCacheEntry> {
        self.get(&viewer.id).filter(|e| e.matches(viewer))
    }

    /// Drop every entry.
    pub fn invalidate_all(&mut self) {
        if !self.entries.is_empty() {
            tracing::debug!(entries = self.entries.len(), "shadow cache invalidated");
        }
        self.entries.clear();
    }

    /// Number of cached viewers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/vision/cache.rs"]
mod tests;
