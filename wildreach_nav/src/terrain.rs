// Terrain oracle capability boundary.
//
// Terrain generation, height maps, and biome assignment are owned by the
// world simulation, not by navigation. This module defines the read-only
// query interface the grid builder consumes, plus the explicit fallback
// implementation used when no terrain service is wired up at startup
// (always walkable, zero slope, flat at height 0).
//
// The navigation subsystem never mutates terrain. Terrain pushes changes in
// via `Navigator::handle_terrain_validated` as `CellPatch` maps; the oracle
// is only pulled from during grid builds and request preconditions.
//
// See also: `grid.rs` for the build that queries this oracle per cell,
// `navigator.rs` which owns the boxed oracle resolved at startup.

use crate::types::Biome;
use serde::{Deserialize, Serialize};

/// Read-only terrain queries answered by the world simulation.
pub trait TerrainOracle {
    /// Terrain height at a world position, or `None` where terrain is not
    /// loaded. Cells without a resolvable height are omitted from the grid.
    fn height_at(&self, x: f32, z: f32) -> Option<f32>;

    /// Terrain slope (rise over run) at a world position.
    fn slope_at(&self, x: f32, z: f32) -> f32;

    /// Whether an agent can stand at this position. `height` and `slope` are
    /// the values already resolved for the cell, so implementations don't
    /// have to re-query.
    fn is_walkable(&self, x: f32, z: f32, height: f32, slope: f32) -> bool;

    /// Biome at a world position, or `None` where biome data is not loaded.
    fn biome_at(&self, x: f32, z: f32) -> Option<Biome>;
}

/// Fallback oracle used when no terrain service is registered: an infinite
/// walkable plain at height 0.
#[derive(Clone, Copy, Debug, Default)]
pub struct FlatTerrain;

impl TerrainOracle for FlatTerrain {
    fn height_at(&self, _x: f32, _z: f32) -> Option<f32> {
        Some(0.0)
    }

    fn slope_at(&self, _x: f32, _z: f32) -> f32 {
        0.0
    }

    fn is_walkable(&self, _x: f32, _z: f32, _height: f32, _slope: f32) -> bool {
        true
    }

    fn biome_at(&self, _x: f32, _z: f32) -> Option<Biome> {
        Some(Biome::Plains)
    }
}

/// One cell's worth of re-validated terrain data, pushed by the terrain
/// system after it finishes a validation pass. Patches existing nodes in
/// place; it never adds cells or re-links topology.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CellPatch {
    pub walkable: bool,
    pub slope: f32,
    pub biome: Biome,
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Configurable oracle shared by the unit tests in `grid.rs`,
    //! `pathfinding.rs`, `queue.rs`, and `navigator.rs`.

    use super::*;
    use crate::types::GridCoord;
    use crate::types::Vec2;
    use std::collections::{BTreeMap, BTreeSet};

    /// Test terrain: flat and walkable everywhere unless a cell is given a
    /// hole (no height), a block (unwalkable), a custom height, slope, or
    /// biome. Cell keys use the same quantization as the grid.
    #[derive(Clone, Debug)]
    pub(crate) struct FakeTerrain {
        pub resolution: f32,
        pub holes: BTreeSet<GridCoord>,
        pub blocked: BTreeSet<GridCoord>,
        pub heights: BTreeMap<GridCoord, f32>,
        pub slopes: BTreeMap<GridCoord, f32>,
        pub biomes: BTreeMap<GridCoord, Biome>,
        /// Exact-point spikes for obstruction tests: `(x, z, height, radius)`.
        pub spikes: Vec<(f32, f32, f32, f32)>,
    }

    impl FakeTerrain {
        pub(crate) fn new(resolution: f32) -> Self {
            Self {
                resolution,
                holes: BTreeSet::new(),
                blocked: BTreeSet::new(),
                heights: BTreeMap::new(),
                slopes: BTreeMap::new(),
                biomes: BTreeMap::new(),
                spikes: Vec::new(),
            }
        }

        fn cell(&self, x: f32, z: f32) -> GridCoord {
            GridCoord::from_world(Vec2::new(x, z), self.resolution)
        }
    }

    impl TerrainOracle for FakeTerrain {
        fn height_at(&self, x: f32, z: f32) -> Option<f32> {
            for &(sx, sz, h, r) in &self.spikes {
                let dx = x - sx;
                let dz = z - sz;
                if (dx * dx + dz * dz).sqrt() <= r {
                    return Some(h);
                }
            }
            let cell = self.cell(x, z);
            if self.holes.contains(&cell) {
                return None;
            }
            Some(self.heights.get(&cell).copied().unwrap_or(0.0))
        }

        fn slope_at(&self, x: f32, z: f32) -> f32 {
            self.slopes.get(&self.cell(x, z)).copied().unwrap_or(0.0)
        }

        fn is_walkable(&self, x: f32, z: f32, _height: f32, _slope: f32) -> bool {
            !self.blocked.contains(&self.cell(x, z))
        }

        fn biome_at(&self, x: f32, z: f32) -> Option<Biome> {
            Some(
                self.biomes
                    .get(&self.cell(x, z))
                    .copied()
                    .unwrap_or(Biome::Plains),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_terrain_is_always_walkable() {
        let terrain = FlatTerrain;
        assert_eq!(terrain.height_at(123.0, -456.0), Some(0.0));
        assert_eq!(terrain.slope_at(0.0, 0.0), 0.0);
        assert!(terrain.is_walkable(9.0, 9.0, 0.0, 0.0));
        assert_eq!(terrain.biome_at(1.0, 1.0), Some(Biome::Plains));
    }

    #[test]
    fn cell_patch_serializes() {
        let patch = CellPatch {
            walkable: false,
            slope: 0.75,
            biome: Biome::Mountain,
        };
        let json = serde_json::to_string(&patch).unwrap();
        let restored: CellPatch = serde_json::from_str(&json).unwrap();
        assert_eq!(patch, restored);
    }
}
