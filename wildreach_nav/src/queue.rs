// Pathfinding request queue and per-tick processor.
//
// Requests are inserted and re-sorted by priority tier on every push — a
// stable sort, so requests of equal priority keep arrival order. This is a
// re-sort-on-insert queue, not a heap: request volume per tick is small and
// the simplicity wins.
//
// `drain()` is the processor: called once per navigation tick, it consumes
// requests one at a time, running A* synchronously for each, until the queue
// empties or cumulative time exceeds the tick budget. The budget defers
// remaining work to later ticks — it never cancels it. Each request observes
// the grid as it is at dequeue time, so terrain patches applied after
// enqueue are honored.
//
// Requests are consumed exactly once and never mutated after creation.
//
// See also: `pathfinding.rs` for the search each request triggers,
// `navigator.rs` which owns the queue and turns drained results into
// `PathReady` events, `clock.rs` for the injected budget clock.

use crate::clock::Clock;
use crate::config::NavConfig;
use crate::grid::NavGrid;
use crate::pathfinding::{self, PathResult, SearchParams};
use crate::terrain::TerrainOracle;
use crate::types::{AgentId, Biome, Priority, RequestId, Vec2};
use serde::{Deserialize, Serialize};

/// A unit of pathfinding work. Immutable once enqueued.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NavRequest {
    pub id: RequestId,
    pub agent_id: AgentId,
    pub start: Vec2,
    pub goal: Vec2,
    pub agent_radius: f32,
    pub max_slope: f32,
    pub allowed_biomes: Option<Vec<Biome>>,
    pub priority: Priority,
}

/// Pending requests, ordered by priority tier then arrival.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RequestQueue {
    requests: Vec<NavRequest>,
}

impl RequestQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue and re-sort. The sort is stable, so arrival order survives
    /// within a tier.
    pub fn push(&mut self, request: NavRequest) {
        self.requests.push(request);
        self.requests.sort_by_key(|r| r.priority);
    }

    /// Take the highest-priority, earliest-arrived request.
    pub fn pop(&mut self) -> Option<NavRequest> {
        if self.requests.is_empty() {
            None
        } else {
            Some(self.requests.remove(0))
        }
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

/// Drain the queue under the per-tick budget, producing one result per
/// consumed request in processing order.
///
/// `speed_of` resolves a requester's movement speed for the time estimate
/// (tracked agents report theirs; unknown agents fall back to the config
/// default). At least one request is processed per call when the queue is
/// non-empty; the budget check applies between requests, so a single slow
/// search can overrun the budget but never starve the tick entirely.
pub fn drain(
    queue: &mut RequestQueue,
    grid: &NavGrid,
    oracle: &dyn TerrainOracle,
    config: &NavConfig,
    clock: &dyn Clock,
    mut speed_of: impl FnMut(AgentId) -> f32,
) -> Vec<(NavRequest, PathResult)> {
    let mut completed = Vec::new();
    let started = clock.now();
    let budget = config.tick_budget();

    while let Some(request) = queue.pop() {
        let outcome = run_request(&request, grid, oracle, config, clock);
        let result = PathResult::from_outcome(outcome, speed_of(request.agent_id));
        completed.push((request, result));

        if clock.now().saturating_sub(started) > budget {
            break; // defer the rest to the next tick
        }
    }

    completed
}

/// Precondition checks plus the search itself for one request.
fn run_request(
    request: &NavRequest,
    grid: &NavGrid,
    oracle: &dyn TerrainOracle,
    config: &NavConfig,
    clock: &dyn Clock,
) -> Result<pathfinding::Path, pathfinding::PathError> {
    // Terrain must resolve a height at both endpoints before grid resolution
    // is even attempted.
    if oracle.height_at(request.start.x, request.start.z).is_none()
        || oracle.height_at(request.goal.x, request.goal.z).is_none()
    {
        return Err(pathfinding::PathError::InvalidPosition);
    }

    let params = SearchParams {
        max_slope: request.max_slope,
        allowed_biomes: request.allowed_biomes.clone(),
        timeout: config.search_timeout(),
        max_visited: config.max_search_nodes,
        height_cost_multiplier: config.height_cost_multiplier,
    };
    pathfinding::find_path(grid, request.start, request.goal, &params, clock)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::pathfinding::PathError;
    use crate::terrain::fixtures::FakeTerrain;
    use crate::types::{GridBounds, GridCoord};
    use std::time::Duration;

    fn request(id: u64, priority: Priority) -> NavRequest {
        NavRequest {
            id: RequestId(id),
            agent_id: AgentId(id),
            start: Vec2::new(0.0, 0.0),
            goal: Vec2::new(8.0, 8.0),
            agent_radius: 0.5,
            max_slope: 1.0,
            allowed_biomes: None,
            priority,
        }
    }

    fn flat_setup(config: &NavConfig) -> (NavGrid, FakeTerrain) {
        let terrain = FakeTerrain::new(config.grid_resolution);
        let mut grid = NavGrid::new(config.grid_resolution);
        grid.build(
            GridBounds::new(Vec2::new(0.0, 0.0), Vec2::new(8.0, 8.0)),
            &terrain,
            config,
        );
        (grid, terrain)
    }

    #[test]
    fn priority_orders_before_arrival() {
        let mut queue = RequestQueue::new();
        queue.push(request(1, Priority::Low));
        queue.push(request(2, Priority::High));
        queue.push(request(3, Priority::Normal));
        queue.push(request(4, Priority::High));

        let order: Vec<u64> = std::iter::from_fn(|| queue.pop()).map(|r| r.id.0).collect();
        // High tier first (arrival order within it), then normal, then low.
        assert_eq!(order, vec![2, 4, 3, 1]);
    }

    #[test]
    fn drain_processes_everything_within_budget() {
        let config = NavConfig::default();
        let (grid, terrain) = flat_setup(&config);
        let clock = ManualClock::new();

        let mut queue = RequestQueue::new();
        queue.push(request(1, Priority::Normal));
        queue.push(request(2, Priority::Normal));

        let completed = drain(&mut queue, &grid, &terrain, &config, &clock, |_| 4.0);
        assert_eq!(completed.len(), 2);
        assert!(queue.is_empty());
        assert!(completed.iter().all(|(_, r)| r.success));
    }

    #[test]
    fn drain_defers_when_budget_exhausted() {
        let config = NavConfig::default();
        let (grid, terrain) = flat_setup(&config);
        // Every clock read advances 5ms; the 8ms budget is spent after the
        // first request's bookkeeping reads.
        let clock = ManualClock::with_step(Duration::from_millis(5));

        let mut queue = RequestQueue::new();
        for id in 1..=5 {
            queue.push(request(id, Priority::Normal));
        }

        let completed = drain(&mut queue, &grid, &terrain, &config, &clock, |_| 4.0);
        assert!(!completed.is_empty(), "at least one request must process");
        assert!(
            completed.len() < 5,
            "budget should defer part of the queue"
        );
        assert_eq!(queue.len(), 5 - completed.len());
    }

    #[test]
    fn drain_observes_grid_state_at_dequeue_time() {
        use crate::terrain::CellPatch;
        use std::collections::BTreeMap;

        let config = NavConfig::default();
        let (mut grid, terrain) = flat_setup(&config);
        let clock = ManualClock::new();

        let mut queue = RequestQueue::new();
        queue.push(request(1, Priority::Normal));

        // Terrain change lands after enqueue but before processing: the goal
        // cell turns unwalkable, and the request must see it.
        let mut patches = BTreeMap::new();
        patches.insert(
            GridCoord::new(4, 4),
            CellPatch {
                walkable: false,
                slope: 0.0,
                biome: crate::types::Biome::Plains,
            },
        );
        grid.apply_terrain_update(&patches, &config);

        let completed = drain(&mut queue, &grid, &terrain, &config, &clock, |_| 4.0);
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].1.error, Some(PathError::NotWalkable));
    }

    #[test]
    fn unresolvable_height_reports_invalid_position() {
        let config = NavConfig::default();
        let (grid, mut terrain) = flat_setup(&config);
        let clock = ManualClock::new();

        // Punch the hole after the build: the node exists, but terrain no
        // longer resolves a height at the goal.
        terrain.holes.insert(GridCoord::new(4, 4));

        let mut queue = RequestQueue::new();
        queue.push(request(1, Priority::Normal));

        let completed = drain(&mut queue, &grid, &terrain, &config, &clock, |_| 4.0);
        assert_eq!(completed[0].1.error, Some(PathError::InvalidPosition));
    }

    #[test]
    fn empty_grid_reports_off_grid() {
        let config = NavConfig::default();
        let terrain = FakeTerrain::new(config.grid_resolution);
        let grid = NavGrid::new(config.grid_resolution);
        let clock = ManualClock::new();

        let mut queue = RequestQueue::new();
        queue.push(request(1, Priority::High));

        let completed = drain(&mut queue, &grid, &terrain, &config, &clock, |_| 4.0);
        assert_eq!(completed[0].1.error, Some(PathError::OffGrid));
    }

    #[test]
    fn request_queue_serializes() {
        let mut queue = RequestQueue::new();
        queue.push(request(7, Priority::Low));
        let json = serde_json::to_string(&queue).unwrap();
        let mut restored: RequestQueue = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.len(), 1);
        assert_eq!(restored.pop().unwrap().id, RequestId(7));
    }
}
