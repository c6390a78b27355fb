use std::time::{Duration, Instant};

use crate::autohide::evaluate_autohide;
use crate::engine::context::ComputationContext;
use crate::engine::input::InputFingerprint;
use crate::engine::stats::{PassStats, Stage};
use crate::fog::store::PersistenceStore;
use crate::fog::synth::FogSynthesizer;
use crate::foundation::core::Role;
use crate::foundation::error::{UmbraError, UmbraResult};
use crate::foundation::math::Fingerprint;
use crate::geometry::path::PathCommands;
use crate::geometry::region::Region;
use crate::scene::host::SceneHost;
use crate::scene::model::{SceneMutations, SceneSnapshot};
use crate::vision::cache::{ShadowCache, ShadowCacheEntry};
use crate::vision::compositor::{RayonWorkers, ShadowWorkers, compose_visible_region};
use crate::vision::range::apply_range_and_torches;
use crate::vision::shadow::{ShadowPolygon, shadows_for_viewer};

/// Engine construction options.
#[derive(Clone, Debug)]
pub struct EngineOpts {
    /// Shadow worker threads. `None` uses `min(available parallelism, 16)`.
    pub threads: Option<usize>,
    /// Scheduler debounce window.
    pub debounce: Duration,
    /// Override of the quality-derived disc tolerance, in map pixels.
    pub disc_tolerance: Option<f64>,
}

impl Default for EngineOpts {
    fn default() -> Self {
        Self {
            threads: None,
            debounce: Duration::from_millis(500),
            disc_tolerance: None,
        }
    }
}

/// How a pass ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PassOutcome {
    /// The host is still loading the scene; nothing was read further.
    SceneNotReady,
    /// The scene has no map geometry; the cache was dropped.
    NoMap,
    /// Inputs are identical to the last committed pass.
    Unchanged,
    /// Vision is off or no viewer is selected; owned fog was cleared.
    FogCleared,
    /// Nothing blocks or limits sight; the whole map is visible.
    Unobstructed,
    /// Fog was recomputed and committed.
    Committed,
}

/// Result of [`Engine::run_pass`].
#[derive(Clone, Debug)]
pub struct PassReport {
    /// How the pass ended.
    pub outcome: PassOutcome,
    /// Batch handed to the host (empty when nothing changed).
    pub mutations: SceneMutations,
    /// Timings and counters.
    pub stats: PassStats,
}

impl PassReport {
    fn early(outcome: PassOutcome) -> Self {
        Self {
            outcome,
            mutations: SceneMutations::default(),
            stats: PassStats::default(),
        }
    }
}

/// Owner of all cross-pass state: shadow cache, last input fingerprint, persistence store.
///
/// One engine serves one local client. Passes are synchronous; callers that receive host
/// notifications concurrently should go through [`crate::Scheduler`].
pub struct Engine {
    workers: Box<dyn ShadowWorkers>,
    store: Box<dyn PersistenceStore>,
    opts: EngineOpts,
    cache: ShadowCache,
    scene_id: Option<String>,
    cache_geometry: Option<Fingerprint>,
    previous: Option<InputFingerprint>,
    restore_pending: bool,
    persisted: Option<PathCommands>,
    force_next: bool,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("workers", &self.workers.worker_count())
            .field("opts", &self.opts)
            .field("cache", &self.cache.len())
            .field("scene_id", &self.scene_id)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Engine over explicit workers and store, with default options.
    pub fn new(
        workers: impl ShadowWorkers + 'static,
        store: impl PersistenceStore + 'static,
    ) -> Self {
        Self {
            workers: Box::new(workers),
            store: Box::new(store),
            opts: EngineOpts::default(),
            cache: ShadowCache::new(),
            scene_id: None,
            cache_geometry: None,
            previous: None,
            restore_pending: false,
            persisted: None,
            force_next: false,
        }
    }

    /// Engine with a rayon worker pool sized by `opts.threads`.
    pub fn with_opts(
        opts: EngineOpts,
        store: impl PersistenceStore + 'static,
    ) -> UmbraResult<Self> {
        if let Some(t) = opts.disc_tolerance
            && !(t.is_finite() && t > 0.0)
        {
            return Err(UmbraError::validation("disc_tolerance must be finite and > 0"));
        }
        let workers = RayonWorkers::new(opts.threads)?;
        let mut engine = Self::new(workers, store);
        engine.opts = opts;
        Ok(engine)
    }

    /// Options in effect.
    pub fn opts(&self) -> &EngineOpts {
        &self.opts
    }

    /// Shadow cache (read-only).
    pub fn cache(&self) -> &ShadowCache {
        &self.cache
    }

    /// Global invalidation: drop the cache and force the next pass.
    pub fn invalidate(&mut self) {
        self.cache.invalidate_all();
        self.cache_geometry = None;
        self.previous = None;
    }

    /// Run one recompute pass against `host`.
    ///
    /// `force` skips the unchanged-input short circuit. On error nothing has been committed.
    #[tracing::instrument(skip(self, host))]
    pub fn run_pass(&mut self, host: &mut dyn SceneHost, force: bool) -> UmbraResult<PassReport> {
        let started = Instant::now();
        let result = self.pass(host, force, started);
        if let Err(e) = &result {
            tracing::error!(error = %e, "visibility pass aborted");
        }
        result
    }

    /// Clear the stored cumulative path of the current client and scene, delete the cumulative
    /// fog item and force the next pass.
    #[tracing::instrument(skip(self, host))]
    pub fn reset_persistence(&mut self, host: &mut dyn SceneHost) -> UmbraResult<SceneMutations> {
        let snapshot = host.snapshot()?;
        self.store.clear(&snapshot.client.id, &snapshot.scene_id)?;
        self.persisted = None;
        self.restore_pending = false;
        self.force_next = true;

        let m = SceneMutations {
            delete: snapshot
                .local
                .fog
                .iter()
                .filter(|f| f.digest.is_cumulative())
                .map(|f| f.id.clone())
                .collect(),
            ..SceneMutations::default()
        };
        if !m.is_empty() {
            host.apply(&m)?;
        }
        Ok(m)
    }

    fn pass(
        &mut self,
        host: &mut dyn SceneHost,
        force: bool,
        started: Instant,
    ) -> UmbraResult<PassReport> {
        let snapshot = host.snapshot()?;
        if !snapshot.ready {
            tracing::debug!(scene = %snapshot.scene_id, "scene not ready");
            return Ok(PassReport::early(PassOutcome::SceneNotReady));
        }
        snapshot.validate()?;
        self.enter_scene(&snapshot);
        let force = force || self.force_next;

        if !snapshot.settings.vision_enabled {
            return self.clear(host, &snapshot, started);
        }

        let Some(ctx) = ComputationContext::from_snapshot(&snapshot) else {
            tracing::debug!(scene = %snapshot.scene_id, "no map geometry");
            self.invalidate();
            return Ok(PassReport::early(PassOutcome::NoMap));
        };
        if ctx.viewers.is_empty() {
            return self.clear(host, &snapshot, started);
        }

        let fp = InputFingerprint::of(&ctx);
        if !force && self.previous == Some(fp) {
            tracing::debug!("inputs unchanged");
            return Ok(PassReport::early(PassOutcome::Unchanged));
        }
        if self.cache_geometry != Some(fp.geometry) {
            self.cache.invalidate_all();
            self.cache_geometry = Some(fp.geometry);
        }

        let mut stats = PassStats::default();
        stats.viewers = ctx.viewers.len() as u64;

        let t = Instant::now();
        let shadows = ctx
            .viewers
            .iter()
            .map(|v| shadows_for_viewer(v.position, &ctx.lines, ctx.map))
            .collect::<Vec<Vec<ShadowPolygon>>>();
        stats.shadow_polygons = shadows.iter().map(|s| s.len() as u64).sum();
        stats.record(Stage::Shadows, t.elapsed());

        let unobstructed = !ctx.settings.persistence_enabled
            && !ctx.any_ranged()
            && ctx.any_ordinary()
            && shadows.iter().all(Vec::is_empty);
        let synth = FogSynthesizer::new(&ctx.client.id, ctx.map, &ctx.settings, &snapshot.local);

        let (outcome, mut m, cumulative) = if unobstructed {
            tracing::debug!("no obstruction casts a shadow; whole map visible");
            let mut m = synth.clear_all();
            let t = Instant::now();
            if ctx.client.role == Role::Gm {
                let whole = Region::from_rect(ctx.map);
                m.visibility = evaluate_autohide(&ctx.autohide, &whole, ctx.grid);
            }
            stats.record(Stage::Autohide, t.elapsed());
            (PassOutcome::Unobstructed, m, None)
        } else {
            let t = Instant::now();
            let mut visible = Vec::with_capacity(ctx.viewers.len());
            for (viewer, polygons) in ctx.viewers.iter().zip(&shadows) {
                if let Some(entry) = self.cache.lookup(viewer) {
                    stats.cache_hits += 1;
                    visible.push(Region::from_commands(&entry.commands)?);
                    continue;
                }
                stats.cache_misses += 1;
                let commands = compose_visible_region(self.workers.as_ref(), polygons, ctx.map)?
                    .to_commands();
                // Hits and misses both read back the cached form, so digests stay stable.
                visible.push(Region::from_commands(&commands)?);
                self.cache.set(
                    viewer.id.clone(),
                    ShadowCacheEntry {
                        viewer_id: viewer.id.clone(),
                        position: viewer.position,
                        vision_range: viewer.vision_range,
                        commands,
                    },
                );
            }
            stats.record(Stage::Composite, t.elapsed());

            let t = Instant::now();
            let ranged = apply_range_and_torches(
                &ctx.viewers,
                visible,
                ctx.grid,
                ctx.client.role,
                ctx.disc_tolerance(self.opts.disc_tolerance),
            )?;
            stats.record(Stage::Range, t.elapsed());

            let t = Instant::now();
            if ctx.settings.persistence_enabled {
                self.restore(&ctx);
            }
            let seed = if ctx.settings.persistence_enabled {
                self.persisted.as_ref()
            } else {
                None
            };
            let fog = synth.synthesize(&ranged.regions, ranged.rings, seed)?;
            stats.record(Stage::Fog, t.elapsed());

            let t = Instant::now();
            let mut m = fog.mutations;
            if ctx.client.role == Role::Gm {
                m.visibility = evaluate_autohide(&ctx.autohide, &fog.visible, ctx.grid);
            }
            stats.record(Stage::Autohide, t.elapsed());
            (PassOutcome::Committed, m, fog.cumulative)
        };

        let t = Instant::now();
        self.commit(host, &mut m)?;
        if let Some(cmds) = cumulative {
            if let Err(e) = self.store.write(&ctx.client.id, &ctx.scene_id, &cmds) {
                tracing::warn!(error = %e, "failed to persist cumulative fog");
            }
            self.persisted = Some(cmds);
        }
        stats.record(Stage::Commit, t.elapsed());

        self.previous = Some(fp);
        self.force_next = false;
        stats.item_counter = m.item_count() as u64;
        stats.total = started.elapsed();
        host.publish_stats(&stats.to_record());
        tracing::debug!(
            outcome = ?outcome,
            items = stats.item_counter,
            cache_hits = stats.cache_hits,
            cache_misses = stats.cache_misses,
            "visibility pass done"
        );
        Ok(PassReport {
            outcome,
            mutations: m,
            stats,
        })
    }

    /// Delete every owned item; used when vision is off or nobody is looking.
    fn clear(
        &mut self,
        host: &mut dyn SceneHost,
        snapshot: &SceneSnapshot,
        started: Instant,
    ) -> UmbraResult<PassReport> {
        let mut m = SceneMutations {
            delete: snapshot.local.all_ids(),
            ..SceneMutations::default()
        };
        let t = Instant::now();
        self.commit(host, &mut m)?;
        self.previous = None;
        self.force_next = false;

        let mut stats = PassStats::default();
        stats.record(Stage::Commit, t.elapsed());
        stats.item_counter = m.item_count() as u64;
        stats.total = started.elapsed();
        host.publish_stats(&stats.to_record());
        Ok(PassReport {
            outcome: PassOutcome::FogCleared,
            mutations: m,
            stats,
        })
    }

    fn commit(&mut self, host: &mut dyn SceneHost, m: &mut SceneMutations) -> UmbraResult<()> {
        m.delete.sort();
        m.delete.dedup();
        if m.is_empty() {
            return Ok(());
        }
        host.apply(m)
    }

    fn enter_scene(&mut self, snapshot: &SceneSnapshot) {
        if self.scene_id.as_deref() == Some(snapshot.scene_id.as_str()) {
            return;
        }
        tracing::debug!(scene = %snapshot.scene_id, "scene loaded");
        self.invalidate();
        self.scene_id = Some(snapshot.scene_id.clone());
        self.persisted = None;
        self.restore_pending = true;
    }

    /// Read the stored cumulative path once per scene.
    fn restore(&mut self, ctx: &ComputationContext) {
        if !std::mem::take(&mut self.restore_pending) {
            return;
        }
        match self.store.read(&ctx.client.id, &ctx.scene_id) {
            Ok(stored) => self.persisted = stored,
            Err(e) => tracing::warn!(error = %e, "failed to read persisted fog"),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/engine/pass.rs"]
mod tests;
