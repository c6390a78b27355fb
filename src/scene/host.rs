use crate::engine::stats::StatsRecord;
use crate::foundation::error::UmbraResult;
use crate::scene::model::{SceneMutations, SceneSnapshot};

/// Boundary to the host scene platform.
///
/// The engine reads one snapshot per pass and commits at most one mutation batch.
pub trait SceneHost {
    /// Current scene state.
    fn snapshot(&mut self) -> UmbraResult<SceneSnapshot>;

    /// Apply a batch of local item changes.
    fn apply(&mut self, mutations: &SceneMutations) -> UmbraResult<()>;

    /// Receive the observability record of a finished pass.
    fn publish_stats(&mut self, _record: &StatsRecord) {}
}

/// In-process host keeping the scene in memory.
#[derive(Clone, Debug)]
pub struct MemoryHost {
    /// Scene state; mutations are applied to `scene.local` and autohide tokens.
    pub scene: SceneSnapshot,
    /// Every batch applied so far.
    pub applied: Vec<SceneMutations>,
    /// Every published stats record.
    pub stats: Vec<StatsRecord>,
}

impl MemoryHost {
    /// Host over `scene`.
    pub fn new(scene: SceneSnapshot) -> Self {
        Self {
            scene,
            applied: Vec::new(),
            stats: Vec::new(),
        }
    }
}

impl SceneHost for MemoryHost {
    fn snapshot(&mut self) -> UmbraResult<SceneSnapshot> {
        Ok(self.scene.clone())
    }

    fn apply(&mut self, mutations: &SceneMutations) -> UmbraResult<()> {
        self.scene.apply_mutations(mutations)?;
        self.applied.push(mutations.clone());
        Ok(())
    }

    fn publish_stats(&mut self, record: &StatsRecord) {
        self.stats.push(record.clone());
    }
}
