use std::collections::BTreeMap;
use std::time::Duration;

/// Flat observability record published after each pass.
pub type StatsRecord = BTreeMap<String, String>;

/// Timed stages of a pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Obstruction extraction and shadow casting.
    Shadows,
    /// Shadow compositing (or cache reuse).
    Composite,
    /// Range clipping and torch containment.
    Range,
    /// Fog synthesis.
    Fog,
    /// Autohide evaluation.
    Autohide,
    /// Host commit and persistence write.
    Commit,
}

impl Stage {
    /// Every stage, in pass order.
    pub const ALL: [Stage; 6] = [
        Stage::Shadows,
        Stage::Composite,
        Stage::Range,
        Stage::Fog,
        Stage::Autohide,
        Stage::Commit,
    ];

    fn index(self) -> usize {
        match self {
            Stage::Shadows => 0,
            Stage::Composite => 1,
            Stage::Range => 2,
            Stage::Fog => 3,
            Stage::Autohide => 4,
            Stage::Commit => 5,
        }
    }

    /// Record key (`stage1`..`stage6`).
    pub fn key(self) -> String {
        format!("stage{}", self.index() + 1)
    }
}

/// Timings and counters of one pass. Informational only.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PassStats {
    /// Wall time of the whole pass.
    pub total: Duration,
    stages: [Duration; 6],
    /// Viewers served from the shadow cache.
    pub cache_hits: u64,
    /// Viewers composited from scratch.
    pub cache_misses: u64,
    /// Item operations in the committed batch.
    pub item_counter: u64,
    /// Viewers selected for the pass.
    pub viewers: u64,
    /// Shadow polygons cast.
    pub shadow_polygons: u64,
}

impl PassStats {
    /// Add `elapsed` to `stage`.
    pub fn record(&mut self, stage: Stage, elapsed: Duration) {
        self.stages[stage.index()] += elapsed;
    }

    /// Time spent in `stage`.
    pub fn stage(&self, stage: Stage) -> Duration {
        self.stages[stage.index()]
    }

    /// String-keyed record for [`crate::SceneHost::publish_stats`].
    pub fn to_record(&self) -> StatsRecord {
        let mut r = StatsRecord::new();
        r.insert("compute_time".to_string(), fmt_ms(self.total));
        for stage in Stage::ALL {
            r.insert(stage.key(), fmt_ms(self.stage(stage)));
        }
        r.insert("cache_hits".to_string(), self.cache_hits.to_string());
        r.insert("cache_misses".to_string(), self.cache_misses.to_string());
        r.insert("item_counter".to_string(), self.item_counter.to_string());
        r.insert("viewers".to_string(), self.viewers.to_string());
        r.insert(
            "shadow_polygons".to_string(),
            self.shadow_polygons.to_string(),
        );
        r
    }
}

fn fmt_ms(d: Duration) -> String {
    format!("{:.2}", d.as_secs_f64() * 1000.0)
}
