// Terrain traversal cost model.
//
// A pure function from (biome base cost, slope) to a cost multiplier:
//
//   cost = base * (1 + slope * height_cost_multiplier)
//
// The biome base comes from the config table; the slope term makes climbs
// expensive in proportion to steepness. No side effects — safe to call from
// both the grid build and A* edge evaluation.
//
// See also: `config.rs` for `biome_base_costs` and
// `height_cost_multiplier`, `grid.rs` which bakes the result into each node.

/// Traversal cost multiplier for a cell. Never below `base_cost` for
/// non-negative slopes.
pub fn traversal_cost(base_cost: f32, slope: f32, height_cost_multiplier: f32) -> f32 {
    base_cost * (1.0 + slope.max(0.0) * height_cost_multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NavConfig;
    use crate::types::Biome;

    #[test]
    fn flat_ground_costs_base() {
        assert_eq!(traversal_cost(1.2, 0.0, 2.0), 1.2);
    }

    #[test]
    fn cost_never_below_base() {
        let config = NavConfig::default();
        for &biome in &[
            Biome::Plains,
            Biome::Forest,
            Biome::Mountain,
            Biome::Water,
            Biome::Swamp,
            Biome::Desert,
        ] {
            let base = config.base_cost(biome);
            for slope in [0.0, 0.1, 0.5, 1.0, 3.0] {
                assert!(
                    traversal_cost(base, slope, config.height_cost_multiplier) >= base,
                    "{biome:?} at slope {slope} fell below base"
                );
            }
        }
    }

    #[test]
    fn cost_strictly_increases_with_slope() {
        let mut prev = traversal_cost(1.5, 0.0, 2.0);
        for slope in [0.1, 0.2, 0.5, 1.0, 2.0] {
            let cost = traversal_cost(1.5, slope, 2.0);
            assert!(cost > prev);
            prev = cost;
        }
    }

    #[test]
    fn negative_slope_clamps_to_base() {
        assert_eq!(traversal_cost(2.0, -0.5, 2.0), 2.0);
    }
}
