//! Umbra is a line-of-sight visibility and fog-of-war engine for 2D tabletop maps.
//!
//! Given a scene snapshot (viewers, sight-blocking obstructions, a map rectangle and a few
//! settings flags) Umbra computes the region each viewer can currently see and turns it into
//! vector fog paths for a renderer to draw. Nothing is rasterized here.
//!
//! # Pass overview
//!
//! 1. **Extract**: raw obstruction shapes become active [`ObstructionLine`] segments.
//! 2. **Cast**: every segment casts a [`ShadowPolygon`] away from each viewer.
//! 3. **Composite**: a viewer's shadows are reduced to one visible [`Region`] on a worker pool
//!    ([`ShadowWorkers`]), memoized in the [`ShadowCache`].
//! 4. **Range & torches**: regions are clipped to vision discs and torches are confined to what
//!    ordinary viewers see.
//! 5. **Fog**: regions become deduplicated, optionally persistent or trailing fog items.
//! 6. **Autohide**: flagged tokens follow whether anyone can see them.
//!
//! [`Engine`] owns every piece of cross-pass state (cache, previous input fingerprint,
//! persistence store) and [`Scheduler`] drives it with a debounced single-flight policy.
//!
//! The key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **No partial commits**: a pass that fails mid-way leaves committed fog untouched.
//! - **Deterministic**: worker completion order never changes a result.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod autohide;
mod engine;
mod fog;
mod foundation;
mod geometry;
mod scene;
mod vision;

pub use autohide::{AutohideToken, VisibilityChange, evaluate_autohide};
pub use engine::context::ComputationContext;
pub use engine::input::{InputFingerprint, RecomputeInput};
pub use engine::pass::{Engine, EngineOpts, PassOutcome, PassReport};
pub use engine::scheduler::{Scheduler, SchedulerState, Trigger};
pub use engine::stats::{PassStats, Stage, StatsRecord};
pub use fog::color::FogColor;
pub use fog::store::{JsonFileStore, MemoryStore, PersistenceStore};
pub use fog::synth::{FogOutcome, FogSynthesizer};
pub use foundation::core::{
    Affine, BezPath, ClientInfo, GridCalibration, ItemId, Placement, Point, Rect, Role, Vec2,
};
pub use foundation::error::{UmbraError, UmbraResult};
pub use foundation::math::Fingerprint;
pub use geometry::path::{Digest, PathCmd, PathCommands};
pub use geometry::region::Region;
pub use scene::host::{MemoryHost, SceneHost};
pub use scene::model::{
    FogItem, IndicatorRing, LocalItems, MapBorder, MapImage, MapLayer, Quality, SceneMutations,
    SceneSettings, SceneSnapshot, TrailingFogItem, Viewer, select_viewers,
};
pub use vision::cache::{ShadowCache, ShadowCacheEntry};
pub use vision::compositor::{
    ChunkRequest, ChunkResponse, RayonWorkers, ShadowWorkers, compose_visible_region,
    resolve_chunk,
};
pub use vision::obstruction::{
    DoorState, ObstructionLine, ObstructionShape, Side, extract_obstructions,
};
pub use vision::range::{RangeOutcome, apply_range_and_torches};
pub use vision::shadow::{ShadowPolygon, cast_shadow, shadows_for_viewer};
