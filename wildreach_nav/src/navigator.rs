// Top-level navigation subsystem facade.
//
// `Navigator` owns the one logical execution context for all navigation
// state: the grid, the request queue, the agent tracker, the config, and the
// terrain/clock capabilities resolved at startup. The host wires its event
// sources to the fixed set of typed handlers below — there is no dynamic
// subscription bag — and calls `tick()` at a fixed rate to drain queued
// pathfinding work under the per-tick budget.
//
// Everything here is single-threaded by design: no locks, because there is
// no parallel mutation. A port introducing worker threads for search must
// either shard the grid read-only across threads or serialize writes
// through a single owner.
//
// Writers of the grid: `rebuild_grid()` and `handle_terrain_validated()`
// only. The pathfinder reads the grid and owns its own per-search scratch.
//
// See also: `grid.rs`, `queue.rs`, `agent.rs` for the owned components,
// `event.rs` for the emitted `NavEvent`s, `terrain.rs` and `clock.rs` for
// the injected capabilities.

use crate::agent::{AgentNavState, AgentTracker};
use crate::clock::{Clock, WallClock};
use crate::config::NavConfig;
use crate::event::NavEvent;
use crate::grid::NavGrid;
use crate::queue::{self, NavRequest, RequestQueue};
use crate::terrain::{CellPatch, FlatTerrain, TerrainOracle};
use crate::types::{AgentId, Biome, GridBounds, GridCoord, Priority, RequestId, Vec2, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Optional per-request overrides for `request_navigation`. Unset fields
/// fall back to the requesting agent's tracked values, then to config
/// defaults.
#[derive(Clone, Debug, Default)]
pub struct RequestOptions {
    pub agent_radius: Option<f32>,
    pub max_slope: Option<f32>,
    pub allowed_biomes: Option<Vec<Biome>>,
    pub priority: Option<Priority>,
}

/// Snapshot of subsystem health for diagnostics overlays.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridStats {
    pub total_nodes: usize,
    pub walkable_nodes: usize,
    pub unwalkable_nodes: usize,
    pub active_agents: usize,
    pub queued_requests: usize,
    pub grid_resolution: f32,
}

/// The navigation subsystem. One instance per world.
pub struct Navigator {
    config: NavConfig,
    grid: NavGrid,
    queue: RequestQueue,
    tracker: AgentTracker,
    oracle: Box<dyn TerrainOracle>,
    clock: Box<dyn Clock>,
    /// Events accumulated since the last tick.
    events: Vec<NavEvent>,
    next_request_id: u64,
    /// Union of all terrain tile bounds seen so far.
    world_bounds: Option<GridBounds>,
}

impl Navigator {
    /// A navigator with the fallback flat terrain and real wall-clock time.
    pub fn new(config: NavConfig) -> Self {
        Self::with_terrain_and_clock(config, Box::new(FlatTerrain), Box::new(WallClock::new()))
    }

    /// A navigator bound to the host's terrain service.
    pub fn with_terrain(config: NavConfig, oracle: Box<dyn TerrainOracle>) -> Self {
        Self::with_terrain_and_clock(config, oracle, Box::new(WallClock::new()))
    }

    /// Full control over both capabilities — deterministic hosts supply a
    /// `ManualClock` here.
    pub fn with_terrain_and_clock(
        config: NavConfig,
        oracle: Box<dyn TerrainOracle>,
        clock: Box<dyn Clock>,
    ) -> Self {
        let grid = NavGrid::new(config.grid_resolution);
        Self {
            config,
            grid,
            queue: RequestQueue::new(),
            tracker: AgentTracker::new(),
            oracle,
            clock,
            events: Vec::new(),
            next_request_id: 0,
            world_bounds: None,
        }
    }

    // -----------------------------------------------------------------------
    // Typed event intake
    // -----------------------------------------------------------------------

    /// A terrain tile finished generating. Extends the known world bounds
    /// and rebuilds the grid over their union.
    pub fn handle_tile_generated(&mut self, bounds: GridBounds) {
        self.world_bounds = Some(match self.world_bounds {
            Some(existing) => existing.union(bounds),
            None => bounds,
        });
        self.rebuild_grid();
    }

    /// Rebuild the grid over the known terrain bounds. With no bounds the
    /// build is skipped and the subsystem keeps running on an empty grid —
    /// requests fail off-grid instead of crashing.
    pub fn rebuild_grid(&mut self) {
        let Some(bounds) = self.world_bounds else {
            self.events.push(NavEvent::GridBuildSkipped);
            return;
        };
        let started = self.clock.now();
        let node_count = self
            .grid
            .build(bounds, self.oracle.as_ref(), &self.config);
        let build_ms = self.clock.now().saturating_sub(started).as_millis() as u64;
        self.events.push(NavEvent::GridReady {
            node_count,
            build_ms,
            bounds,
        });
    }

    /// The terrain system re-validated a set of cells. Patched in place;
    /// topology is untouched.
    pub fn handle_terrain_validated(&mut self, patches: &BTreeMap<GridCoord, CellPatch>) {
        self.grid.apply_terrain_update(patches, &self.config);
    }

    /// An entity moved. Feeds stuck detection for tracked agents; unknown
    /// agents are ignored (updates may race registration).
    pub fn handle_position_changed(&mut self, agent_id: AgentId, position: Vec3) {
        let now = self.clock.now();
        if let Some(event) = self
            .tracker
            .update_position(agent_id, position, now, &self.config)
        {
            self.events.push(event);
        }
    }

    pub fn register_agent(
        &mut self,
        agent_id: AgentId,
        position: Vec3,
        speed: Option<f32>,
        radius: Option<f32>,
        max_slope: Option<f32>,
    ) {
        self.tracker
            .register(agent_id, position, speed, radius, max_slope, &self.config);
    }

    pub fn unregister_agent(&mut self, agent_id: AgentId) {
        self.tracker.unregister(agent_id);
    }

    // -----------------------------------------------------------------------
    // Public operations
    // -----------------------------------------------------------------------

    /// Enqueue a pathfinding request. The result arrives later as a
    /// `PathReady` event carrying the returned `RequestId` — a deferred
    /// completion, resolved when a tick dequeues this request.
    pub fn request_navigation(
        &mut self,
        agent_id: AgentId,
        start: Vec2,
        goal: Vec2,
        options: RequestOptions,
    ) -> RequestId {
        self.next_request_id += 1;
        let id = RequestId(self.next_request_id);

        let tracked = self.tracker.state(agent_id);
        let agent_radius = options
            .agent_radius
            .or(tracked.map(|s| s.radius))
            .unwrap_or(self.config.default_agent_radius);
        let max_slope = options
            .max_slope
            .or(tracked.map(|s| s.max_slope))
            .unwrap_or(self.config.max_walkable_slope);

        self.queue.push(NavRequest {
            id,
            agent_id,
            start,
            goal,
            agent_radius,
            max_slope,
            allowed_biomes: options.allowed_biomes,
            priority: options.priority.unwrap_or_default(),
        });
        id
    }

    /// One navigation tick: drain queued requests under the tick budget and
    /// return every event produced since the previous tick, in order.
    pub fn tick(&mut self) -> Vec<NavEvent> {
        let completed = queue::drain(
            &mut self.queue,
            &self.grid,
            self.oracle.as_ref(),
            &self.config,
            self.clock.as_ref(),
            |id| self.tracker.speed_of(id, &self.config),
        );

        for (request, result) in completed {
            if result.success {
                self.tracker
                    .assign_path(request.agent_id, result.waypoints.clone());
            }
            self.events.push(NavEvent::PathReady {
                request_id: request.id,
                agent_id: request.agent_id,
                result,
            });
        }

        std::mem::take(&mut self.events)
    }

    pub fn agent_state(&self, agent_id: AgentId) -> Option<&AgentNavState> {
        self.tracker.state(agent_id)
    }

    pub fn grid_stats(&self) -> GridStats {
        let total = self.grid.node_count();
        let walkable = self.grid.walkable_count();
        GridStats {
            total_nodes: total,
            walkable_nodes: walkable,
            unwalkable_nodes: total - walkable,
            active_agents: self.tracker.len(),
            queued_requests: self.queue.len(),
            grid_resolution: self.grid.resolution(),
        }
    }

    pub fn config(&self) -> &NavConfig {
        &self.config
    }
}
