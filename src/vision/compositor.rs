//! Parallel reduction of a viewer's shadows into its visible region.
//!
//! A viewer's shadow list is split into contiguous chunks, one per worker. Each worker returns
//! the chunk's lit region (map rectangle minus the union of its shadows) as [`PathCommands`],
//! and the caller intersects every lit region into an accumulator seeded with the map
//! rectangle. Intersection is associative and commutative, so completion order is irrelevant.

use kurbo::Rect;
use rayon::prelude::*;

use crate::foundation::error::{UmbraError, UmbraResult};
use crate::geometry::path::PathCommands;
use crate::geometry::region::Region;
use crate::vision::shadow::ShadowPolygon;

/// Upper bound on pool size regardless of available cores.
pub(crate) const MAX_WORKERS: usize = 16;

/// One unit of work handed to a shadow worker.
#[derive(Clone, Debug, PartialEq)]
pub struct ChunkRequest {
    /// Position of the chunk in the dispatch; echoed back in the response.
    pub index: usize,
    /// Shadows to union.
    pub polygons: Vec<ShadowPolygon>,
    /// Map rectangle (offset and size).
    pub map: Rect,
}

/// A worker's answer to a [`ChunkRequest`].
#[derive(Clone, Debug, PartialEq)]
pub struct ChunkResponse {
    /// Index of the answered request.
    pub index: usize,
    /// Lit region of the chunk.
    pub commands: PathCommands,
}

/// Transport to a pool of stateless shadow workers.
///
/// Implementations may complete requests in any order, but must answer each request once.
pub trait ShadowWorkers: Send + Sync {
    /// Number of workers; chunks are sized so each worker receives at most one.
    fn worker_count(&self) -> usize;

    /// Run every request and return the responses in any order.
    fn dispatch(&self, requests: Vec<ChunkRequest>) -> Vec<UmbraResult<ChunkResponse>>;
}

/// Resolve one chunk: the map rectangle minus the union of the chunk's shadows.
pub fn resolve_chunk(request: &ChunkRequest) -> UmbraResult<ChunkResponse> {
    let shadows = request
        .polygons
        .iter()
        .map(|p| Region::from_polygon(p.points()))
        .collect::<Vec<_>>();
    let occluded = Region::union_all(shadows.iter());
    let lit = Region::from_rect(request.map).difference(&occluded);
    if !lit.is_valid() {
        return Err(UmbraError::geometry(format!(
            "chunk {} produced non-finite geometry",
            request.index
        )));
    }
    Ok(ChunkResponse {
        index: request.index,
        commands: lit.to_commands(),
    })
}

/// Worker pool backed by a dedicated rayon thread pool.
pub struct RayonWorkers {
    pool: rayon::ThreadPool,
}

impl RayonWorkers {
    /// Build a pool; `None` picks `min(available cores, 16)`.
    pub fn new(threads: Option<usize>) -> UmbraResult<Self> {
        if let Some(n) = threads
            && n == 0
        {
            return Err(UmbraError::validation("worker 'threads' must be >= 1 when set"));
        }
        let n = threads.unwrap_or_else(default_worker_count);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .thread_name(|i| format!("umbra-shadow-{i}"))
            .build()
            .map_err(|e| UmbraError::worker(format!("failed to build rayon thread pool: {e}")))?;
        Ok(Self { pool })
    }
}

impl std::fmt::Debug for RayonWorkers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RayonWorkers")
            .field("threads", &self.pool.current_num_threads())
            .finish()
    }
}

impl ShadowWorkers for RayonWorkers {
    fn worker_count(&self) -> usize {
        self.pool.current_num_threads()
    }

    fn dispatch(&self, requests: Vec<ChunkRequest>) -> Vec<UmbraResult<ChunkResponse>> {
        self.pool.install(|| {
            requests
                .into_par_iter()
                .map(|req| resolve_chunk(&req))
                .collect::<Vec<_>>()
        })
    }
}

pub(crate) fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .clamp(1, MAX_WORKERS)
}

/// Visible region of one viewer: `map - union(polygons)`, computed on `workers`.
///
/// Any failed, missing, duplicated or unparsable response aborts the whole composition.
#[tracing::instrument(skip(workers, polygons), fields(polygons = polygons.len()))]
pub fn compose_visible_region(
    workers: &dyn ShadowWorkers,
    polygons: &[ShadowPolygon],
    map: Rect,
) -> UmbraResult<Region> {
    let mut acc = Region::from_rect(map);
    if polygons.is_empty() {
        return Ok(acc);
    }

    let requests = partition(polygons, workers.worker_count(), map);
    let expected = requests.len();
    let responses = workers.dispatch(requests);
    if responses.len() != expected {
        return Err(UmbraError::worker(format!(
            "expected {expected} chunk responses, got {}",
            responses.len()
        )));
    }

    let mut seen = vec![false; expected];
    for response in responses {
        let response = response?;
        let slot = seen.get_mut(response.index).ok_or_else(|| {
            UmbraError::worker(format!("response for unknown chunk {}", response.index))
        })?;
        if std::mem::replace(slot, true) {
            return Err(UmbraError::worker(format!(
                "duplicate response for chunk {}",
                response.index
            )));
        }
        let lit = Region::from_commands(&response.commands).map_err(|e| {
            UmbraError::worker(format!("malformed response for chunk {}: {e}", response.index))
        })?;
        acc = acc.intersection(&lit);
    }
    Ok(acc)
}

/// Contiguous chunks of `ceil(n / workers)` polygons; empty chunks are not emitted.
fn partition(polygons: &[ShadowPolygon], workers: usize, map: Rect) -> Vec<ChunkRequest> {
    let chunk_size = polygons.len().div_ceil(workers.max(1));
    polygons
        .chunks(chunk_size.max(1))
        .enumerate()
        .map(|(index, chunk)| ChunkRequest {
            index,
            polygons: chunk.to_vec(),
            map,
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/vision/compositor.rs"]
mod tests;
