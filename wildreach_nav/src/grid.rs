// Navigation grid: a fixed-resolution lattice of cost-annotated nodes.
//
// Nodes live in an arena (`Vec<NavNode>`) and are addressed by `NodeIdx`;
// a packed-key hash map resolves quantized world coordinates to arena
// indices. Neighbor "references" are arena indices in a `SmallVec` of at
// most 8 entries (cardinals + diagonals), giving contiguous, cache-friendly
// storage with no pointer-graph lifetimes.
//
// `build()` is a two-pass construction: populate one node per cell from the
// terrain oracle (cells with no resolvable height are omitted entirely — a
// sparse grid, not placeholders), then connect neighbors under the
// connectivity rule: both endpoints walkable, edge slope within the ceiling,
// and the terrain at the edge midpoint not rising above the interpolated
// endpoint height by more than the obstruction tolerance.
//
// `apply_terrain_update()` patches walkability/slope/biome/cost in place and
// deliberately does not re-link topology — the pathfinder re-checks
// walkability at relax time, so a patched-unwalkable node keeps its links
// but is never traversed.
//
// See also: `terrain.rs` for the oracle queried at build time, `cost.rs` for
// the node cost formula, `pathfinding.rs` for the search over this grid,
// `navigator.rs` which owns the grid and is the only writer besides the
// terrain-update handler.
//
// **Critical constraint: determinism.** Node indices are assigned in fixed
// row-major cell order. The hash map is used for point lookup only, never
// for order-sensitive iteration.

use crate::config::NavConfig;
use crate::cost::traversal_cost;
use crate::terrain::{CellPatch, TerrainOracle};
use crate::types::{Biome, GridBounds, GridCoord, NodeIdx, Vec2, Vec3};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeMap;

/// Neighbor cell offsets: 4 cardinals then 4 diagonals.
const NEIGHBOR_OFFSETS: [(i32, i32); 8] = [
    (0, 1),
    (1, 0),
    (0, -1),
    (-1, 0),
    (1, 1),
    (1, -1),
    (-1, -1),
    (-1, 1),
];

/// One cell of the navigation grid.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NavNode {
    /// Stable quantized cell coordinates.
    pub coord: GridCoord,
    /// World position of the cell center, including terrain height.
    pub position: Vec3,
    pub walkable: bool,
    /// Terrain slope (rise over run) at the cell center.
    pub slope: f32,
    pub biome: Biome,
    /// Derived traversal cost: `base(biome) * (1 + slope * K)`. Always at
    /// least the biome base cost.
    pub cost: f32,
    /// Arena indices of connected neighbors (up to 8).
    pub neighbors: SmallVec<[NodeIdx; 8]>,
}

/// The navigation grid container.
#[derive(Clone, Debug)]
pub struct NavGrid {
    nodes: Vec<NavNode>,
    /// Packed `GridCoord` key -> arena index. Point lookup only.
    lookup: FxHashMap<u64, NodeIdx>,
    resolution: f32,
    bounds: Option<GridBounds>,
}

impl NavGrid {
    /// An empty grid. Every lookup fails until `build()` runs.
    pub fn new(resolution: f32) -> Self {
        Self {
            nodes: Vec::new(),
            lookup: FxHashMap::default(),
            resolution,
            bounds: None,
        }
    }

    /// Populate and connect the grid over `bounds`, replacing any previous
    /// contents. Returns the number of nodes created.
    pub fn build(
        &mut self,
        bounds: GridBounds,
        oracle: &dyn TerrainOracle,
        config: &NavConfig,
    ) -> usize {
        self.nodes.clear();
        self.lookup.clear();
        self.bounds = Some(bounds);

        let min = GridCoord::from_world(bounds.min, self.resolution);
        let max = GridCoord::from_world(bounds.max, self.resolution);

        // Pass 1: one node per cell with resolvable terrain. Row-major order
        // keeps node indices deterministic.
        for cz in min.z..=max.z {
            for cx in min.x..=max.x {
                let coord = GridCoord::new(cx, cz);
                let center = coord.to_world(self.resolution);
                let Some(height) = oracle.height_at(center.x, center.z) else {
                    continue; // terrain not loaded here — omit the cell
                };
                let slope = oracle.slope_at(center.x, center.z);
                let biome = oracle
                    .biome_at(center.x, center.z)
                    .unwrap_or(Biome::Plains);
                let walkable = oracle.is_walkable(center.x, center.z, height, slope);
                let cost = traversal_cost(
                    config.base_cost(biome),
                    slope,
                    config.height_cost_multiplier,
                );

                let idx = NodeIdx(self.nodes.len() as u32);
                self.nodes.push(NavNode {
                    coord,
                    position: Vec3::new(center.x, height, center.z),
                    walkable,
                    slope,
                    biome,
                    cost,
                    neighbors: SmallVec::new(),
                });
                self.lookup.insert(coord.packed(), idx);
            }
        }

        // Pass 2: connect neighbors. Symmetric by construction — both
        // endpoints evaluate the same edge condition.
        let mut links: Vec<SmallVec<[NodeIdx; 8]>> = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let mut neighbors = SmallVec::new();
            if node.walkable {
                for &(dx, dz) in &NEIGHBOR_OFFSETS {
                    let Some(&other_idx) =
                        self.lookup.get(&node.coord.offset(dx, dz).packed())
                    else {
                        continue;
                    };
                    let other = &self.nodes[other_idx.index()];
                    if self.edge_allowed(node, other, oracle, config) {
                        neighbors.push(other_idx);
                    }
                }
            }
            links.push(neighbors);
        }
        for (node, neighbors) in self.nodes.iter_mut().zip(links) {
            node.neighbors = neighbors;
        }

        self.nodes.len()
    }

    /// Connectivity rule for one candidate edge.
    fn edge_allowed(
        &self,
        a: &NavNode,
        b: &NavNode,
        oracle: &dyn TerrainOracle,
        config: &NavConfig,
    ) -> bool {
        if !b.walkable {
            return false;
        }

        let run = a.position.horizontal_distance(b.position);
        let rise = (a.position.y - b.position.y).abs();
        if run <= f32::EPSILON || rise / run > config.max_walkable_slope {
            return false;
        }

        // Obstacle / "underground" sanity check: terrain at the midpoint must
        // not rise above the interpolated endpoint height by more than the
        // tolerance. An unresolvable midpoint height cannot be checked and
        // does not block the edge.
        let mid_x = (a.position.x + b.position.x) * 0.5;
        let mid_z = (a.position.z + b.position.z) * 0.5;
        if let Some(mid_height) = oracle.height_at(mid_x, mid_z) {
            let interpolated = (a.position.y + b.position.y) * 0.5;
            if mid_height > interpolated + config.obstruction_tolerance {
                return false;
            }
        }

        true
    }

    /// Patch existing nodes from re-validated terrain data. Only traversal
    /// cost and walkability change; neighbor topology stays as built.
    /// Unknown cells are ignored.
    pub fn apply_terrain_update(
        &mut self,
        patches: &BTreeMap<GridCoord, CellPatch>,
        config: &NavConfig,
    ) {
        for (coord, patch) in patches {
            let Some(&idx) = self.lookup.get(&coord.packed()) else {
                continue;
            };
            let node = &mut self.nodes[idx.index()];
            node.walkable = patch.walkable;
            node.slope = patch.slope;
            node.biome = patch.biome;
            node.cost = traversal_cost(
                config.base_cost(patch.biome),
                patch.slope,
                config.height_cost_multiplier,
            );
        }
    }

    /// Resolve a world position to its grid node by quantization. `None` if
    /// the cell was never built (off grid or terrain hole).
    pub fn node_at_world(&self, pos: Vec2) -> Option<NodeIdx> {
        self.lookup
            .get(&GridCoord::from_world(pos, self.resolution).packed())
            .copied()
    }

    pub fn node(&self, idx: NodeIdx) -> &NavNode {
        &self.nodes[idx.index()]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn walkable_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.walkable).count()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn resolution(&self) -> f32 {
        self.resolution
    }

    pub fn bounds(&self) -> Option<GridBounds> {
        self.bounds
    }
}
