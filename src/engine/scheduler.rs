//! Debounced single-flight driver for [`Engine`] passes.
//!
//! Host notifications arrive as [`Trigger`]s. While a pass is running new triggers are dropped
//! (no backlog). While idle, triggers inside the debounce window that started with the last pass
//! are coalesced and run once the window elapses, so the last of a burst always runs.
//!
//! Time is passed in explicitly; the scheduler never reads a clock.

use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::engine::pass::{Engine, PassReport};
use crate::foundation::error::UmbraResult;
use crate::scene::host::SceneHost;

/// Why a recompute was requested.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Trigger {
    /// Tokens, obstructions or map items changed.
    Items,
    /// Scene or item metadata changed.
    Metadata,
    /// Grid calibration changed.
    Grid,
    /// Explicit reset; bypasses the unchanged-input check.
    ForcedReset,
}

/// Scheduler state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SchedulerState {
    /// No pass in flight.
    #[default]
    Idle,
    /// A pass is in flight.
    Running,
}

#[derive(Debug, Default)]
struct Inner {
    state: SchedulerState,
    last_start: Option<Instant>,
    pending: Option<Pending>,
}

#[derive(Clone, Copy, Debug)]
struct Pending {
    force: bool,
    since: Instant,
}

/// Re-entrancy guard and debounce window around [`Engine::run_pass`].
#[derive(Debug)]
pub struct Scheduler {
    window: Duration,
    inner: Mutex<Inner>,
}

impl Scheduler {
    /// Scheduler with a debounce window of `window`.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Debounce window.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Current state.
    pub fn state(&self) -> SchedulerState {
        self.inner.lock().state
    }

    /// Record a trigger. Returns `false` when it was dropped because a pass is running.
    pub fn trigger(&self, trigger: Trigger, now: Instant) -> bool {
        let mut inner = self.inner.lock();
        if inner.state == SchedulerState::Running {
            tracing::debug!(?trigger, "pass in flight, trigger dropped");
            return false;
        }
        let force = trigger == Trigger::ForcedReset;
        inner.pending = Some(match inner.pending {
            Some(p) => Pending {
                force: p.force || force,
                since: p.since,
            },
            None => Pending { force, since: now },
        });
        true
    }

    /// Earliest instant at which [`Scheduler::poll`] would start a pass, if one is pending.
    pub fn next_deadline(&self) -> Option<Instant> {
        let inner = self.inner.lock();
        let pending = inner.pending?;
        Some(match inner.last_start {
            Some(t) => pending.since.max(t + self.window),
            None => pending.since,
        })
    }

    /// Run the pending pass if its deadline has passed.
    ///
    /// Returns `Ok(None)` when nothing ran. The state is back to [`SchedulerState::Idle`] when
    /// this returns, whether the pass succeeded or failed.
    pub fn poll(
        &self,
        now: Instant,
        engine: &mut Engine,
        host: &mut dyn SceneHost,
    ) -> UmbraResult<Option<PassReport>> {
        let force = {
            let mut inner = self.inner.lock();
            if inner.state == SchedulerState::Running {
                return Ok(None);
            }
            let Some(pending) = inner.pending else {
                return Ok(None);
            };
            if let Some(t) = inner.last_start
                && now < t + self.window
            {
                return Ok(None);
            }
            inner.pending = None;
            inner.state = SchedulerState::Running;
            inner.last_start = Some(now);
            pending.force
        };

        let _running = RunningGuard(&self.inner);
        engine.run_pass(host, force).map(Some)
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(Duration::from_millis(500))
    }
}

/// Returns the scheduler to idle on every exit path.
struct RunningGuard<'a>(&'a Mutex<Inner>);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.lock().state = SchedulerState::Idle;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/engine/scheduler.rs"]
mod tests;
