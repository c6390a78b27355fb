use super::*;
use kurbo::{Point, Vec2};

use crate::engine::pass::PassOutcome;
use crate::fog::store::MemoryStore;
use crate::foundation::core::{ClientInfo, Role};
use crate::foundation::error::UmbraError;
use crate::scene::host::MemoryHost;
use crate::scene::model::{MapBorder, SceneMutations, SceneSnapshot, Viewer};
use crate::vision::compositor::RayonWorkers;

fn scene() -> SceneSnapshot {
    let mut s = SceneSnapshot::new(
        "s1",
        ClientInfo {
            id: "gm".to_string(),
            role: Role::Gm,
            color: None,
        },
    );
    s.settings.vision_enabled = true;
    s.map.border = Some(MapBorder {
        position: Point::ORIGIN,
        width: 100.0,
        height: 100.0,
        scale: Vec2::new(1.0, 1.0),
    });
    s.viewers = vec![Viewer::new("a", Point::new(50.0, 50.0))];
    s
}

fn engine() -> Engine {
    Engine::new(RayonWorkers::new(Some(1)).unwrap(), MemoryStore::new())
}

/// Host that fires a trigger at the scheduler from inside the pass.
struct ReentrantHost<'a> {
    inner: MemoryHost,
    scheduler: &'a Scheduler,
    now: Instant,
    observed: Option<(SchedulerState, bool)>,
    fail: bool,
}

impl SceneHost for ReentrantHost<'_> {
    fn snapshot(&mut self) -> UmbraResult<SceneSnapshot> {
        let state = self.scheduler.state();
        let accepted = self.scheduler.trigger(Trigger::Items, self.now);
        self.observed = Some((state, accepted));
        if self.fail {
            return Err(UmbraError::host("scene unavailable"));
        }
        self.inner.snapshot()
    }

    fn apply(&mut self, mutations: &SceneMutations) -> UmbraResult<()> {
        self.inner.apply(mutations)
    }
}

#[test]
fn first_trigger_runs_immediately() {
    let s = Scheduler::new(Duration::from_millis(500));
    let mut e = engine();
    let mut host = MemoryHost::new(scene());
    let t0 = Instant::now();

    assert_eq!(s.next_deadline(), None);
    assert!(s.poll(t0, &mut e, &mut host).unwrap().is_none());

    assert!(s.trigger(Trigger::Items, t0));
    assert_eq!(s.next_deadline(), Some(t0));
    let report = s.poll(t0, &mut e, &mut host).unwrap().unwrap();
    assert_eq!(report.outcome, PassOutcome::Unobstructed);
    assert_eq!(s.state(), SchedulerState::Idle);
    assert_eq!(s.next_deadline(), None);
}

#[test]
fn bursts_coalesce_into_one_trailing_pass() {
    let s = Scheduler::new(Duration::from_millis(500));
    let mut e = engine();
    let mut host = MemoryHost::new(scene());
    let t0 = Instant::now();

    s.trigger(Trigger::Items, t0);
    s.poll(t0, &mut e, &mut host).unwrap();

    for ms in [10, 50, 120] {
        assert!(s.trigger(Trigger::Metadata, t0 + Duration::from_millis(ms)));
    }
    assert_eq!(s.next_deadline(), Some(t0 + Duration::from_millis(500)));
    assert!(
        s.poll(t0 + Duration::from_millis(499), &mut e, &mut host)
            .unwrap()
            .is_none()
    );

    let report = s
        .poll(t0 + Duration::from_millis(500), &mut e, &mut host)
        .unwrap()
        .unwrap();
    // Inputs did not change between the two passes.
    assert_eq!(report.outcome, PassOutcome::Unchanged);
    assert!(
        s.poll(t0 + Duration::from_millis(2000), &mut e, &mut host)
            .unwrap()
            .is_none()
    );
}

#[test]
fn forced_reset_bypasses_the_equality_check() {
    let s = Scheduler::new(Duration::ZERO);
    let mut e = engine();
    let mut host = MemoryHost::new(scene());
    let t0 = Instant::now();

    s.trigger(Trigger::Items, t0);
    s.poll(t0, &mut e, &mut host).unwrap();

    s.trigger(Trigger::Items, t0);
    s.trigger(Trigger::ForcedReset, t0);
    let report = s.poll(t0, &mut e, &mut host).unwrap().unwrap();
    assert_eq!(report.outcome, PassOutcome::Unobstructed);
}

#[test]
fn triggers_during_a_pass_are_dropped() {
    let s = Scheduler::new(Duration::ZERO);
    let mut e = engine();
    let t0 = Instant::now();
    let mut host = ReentrantHost {
        inner: MemoryHost::new(scene()),
        scheduler: &s,
        now: t0,
        observed: None,
        fail: false,
    };

    s.trigger(Trigger::Items, t0);
    s.poll(t0, &mut e, &mut host).unwrap();
    assert_eq!(host.observed, Some((SchedulerState::Running, false)));
    assert_eq!(s.state(), SchedulerState::Idle);
    assert_eq!(s.next_deadline(), None);
}

#[test]
fn failed_passes_still_return_to_idle() {
    let s = Scheduler::default();
    let mut e = engine();
    let t0 = Instant::now();
    let mut host = ReentrantHost {
        inner: MemoryHost::new(scene()),
        scheduler: &s,
        now: t0,
        observed: None,
        fail: true,
    };

    s.trigger(Trigger::Grid, t0);
    assert!(s.poll(t0, &mut e, &mut host).is_err());
    assert_eq!(s.state(), SchedulerState::Idle);
    assert!(s.trigger(Trigger::Grid, t0));
}
