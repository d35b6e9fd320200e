// Data-driven navigation configuration.
//
// All tunable parameters live here in `NavConfig`, loaded from JSON at
// startup. The subsystem never uses magic numbers — it reads from the config.
// This enables balance iteration without recompilation, and in multiplayer
// all clients must have identical configs (enforced via hash comparison at
// session handshake).
//
// See also: `cost.rs` for how `biome_base_costs` and
// `height_cost_multiplier` combine into node costs, `grid.rs` which reads the
// connectivity parameters at build time, `queue.rs` for the per-tick drain
// budget, `agent.rs` for the stuck thresholds.
//
// **Critical constraint: determinism.** Config values feed directly into
// pathfinding. All clients must use identical configs for identical results.

use crate::types::Biome;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Top-level navigation configuration. Loaded from JSON, never mutated at
/// runtime.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NavConfig {
    /// World units per grid cell. Start/goal positions are quantized to this.
    pub grid_resolution: f32,

    /// Slope ceiling for connecting two nodes: edges steeper than this
    /// (|Δheight| / horizontal distance) are never linked.
    pub max_walkable_slope: f32,

    /// Agent radius used when a request or registration doesn't supply one.
    pub default_agent_radius: f32,

    /// Agent movement speed (world units per second) used when a registration
    /// doesn't supply one. Also feeds path time estimates for unregistered
    /// requesters.
    pub default_agent_speed: f32,

    /// Wall-clock ceiling for a single A* search, in milliseconds.
    pub search_timeout_ms: u64,

    /// Maximum number of nodes a single search may expand.
    pub max_search_nodes: u32,

    /// Displacement (world units) below which a position update counts as
    /// "not moving" for stuck detection.
    pub stuck_distance: f32,

    /// How long an agent must remain below `stuck_distance` before it is
    /// flagged stuck, in milliseconds.
    pub stuck_duration_ms: u64,

    /// Per-biome base traversal cost multipliers. Biomes absent from the
    /// table cost 1.0.
    pub biome_base_costs: BTreeMap<Biome, f32>,

    /// Slope weighting `K` in `cost = base * (1 + slope * K)`. Also weighs
    /// the height term of the A* heuristic.
    pub height_cost_multiplier: f32,

    /// Cumulative time the request processor may spend per tick, in
    /// milliseconds. Distinct from `search_timeout_ms`, which bounds one
    /// search.
    pub tick_budget_ms: u64,

    /// How far (world units) the terrain at an edge midpoint may rise above
    /// the interpolated endpoint height before the edge is rejected as
    /// obstructed.
    pub obstruction_tolerance: f32,
}

impl NavConfig {
    /// Base traversal cost for a biome. Unlisted biomes cost 1.0.
    pub fn base_cost(&self, biome: Biome) -> f32 {
        self.biome_base_costs.get(&biome).copied().unwrap_or(1.0)
    }

    pub fn search_timeout(&self) -> Duration {
        Duration::from_millis(self.search_timeout_ms)
    }

    pub fn stuck_duration(&self) -> Duration {
        Duration::from_millis(self.stuck_duration_ms)
    }

    pub fn tick_budget(&self) -> Duration {
        Duration::from_millis(self.tick_budget_ms)
    }
}

impl Default for NavConfig {
    fn default() -> Self {
        let mut biome_base_costs = BTreeMap::new();
        biome_base_costs.insert(Biome::Plains, 1.0);
        biome_base_costs.insert(Biome::Forest, 1.2);
        biome_base_costs.insert(Biome::Mountain, 1.5);
        biome_base_costs.insert(Biome::Water, 10.0);
        biome_base_costs.insert(Biome::Swamp, 2.0);
        biome_base_costs.insert(Biome::Desert, 1.3);

        Self {
            grid_resolution: 2.0,
            max_walkable_slope: 1.0,
            default_agent_radius: 0.5,
            default_agent_speed: 4.0,
            search_timeout_ms: 50,
            max_search_nodes: 10_000,
            stuck_distance: 0.5,
            stuck_duration_ms: 3_000,
            biome_base_costs,
            height_cost_multiplier: 2.0,
            tick_budget_ms: 8,
            obstruction_tolerance: 1.0,
        }
    }
}
