// A* pathfinding over the navigation grid.
//
// Implements standard A* search using a `BinaryHeap` (min-heap via reversed
// ordering). Node scores and came-from data are stored in `Vec`s indexed by
// `NodeIdx` for O(1) access and deterministic behavior — these scratch
// arrays are owned by the in-progress search and carry no meaning between
// searches. Heap ties on f-score break by insertion order (a monotonic
// sequence counter), matching the first-found-wins rule of a linear
// open-set scan; the heap only changes asymptotic cost, not behavior.
//
// The heuristic is `|dx| + |dz| + |dy| * height_cost_multiplier`. It is
// admissible only in the uniform-cost case: once biome or slope multipliers
// exceed unit weight it can overestimate, producing valid but possibly
// suboptimal paths. This is a known engineering approximation favoring
// speed, preserved on purpose — not a defect to fix.
//
// Edge distance is the 2D Euclidean distance between node centers plus the
// absolute height delta, so climbing pays twice: once in raw distance and
// once through the slope term already baked into the destination node's
// cost multiplier.
//
// Two bounds make the search abort regardless of whether a path exists: a
// wall-clock deadline and a node-expansion ceiling, reported as distinct
// failure reasons. Failures are data (`PathError`), never panics — callers
// branch on the result.
//
// See also: `grid.rs` for the `NavGrid` being searched, `queue.rs` for the
// processor that invokes this once per request, `clock.rs` for the injected
// time source that keeps the deadline testable.

use crate::clock::Clock;
use crate::grid::NavGrid;
use crate::types::{Biome, NodeIdx, Vec2, Vec3};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;
use std::time::Duration;

/// Why a search produced no path. Carried in `PathResult.error` for callers
/// to branch on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathError {
    /// Start or goal has no resolvable terrain height.
    InvalidPosition,
    /// Start or goal does not map to an existing grid node.
    OffGrid,
    /// The resolved start or goal node is unwalkable.
    NotWalkable,
    /// The search exceeded its wall-clock ceiling.
    Timeout,
    /// The search expanded more nodes than the configured ceiling.
    SearchSpaceExceeded,
    /// The open set was exhausted without reaching the goal.
    NoPathFound,
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::InvalidPosition => "position has no resolvable terrain height",
            Self::OffGrid => "position is not on the navigation grid",
            Self::NotWalkable => "position is not walkable",
            Self::Timeout => "search exceeded its time limit",
            Self::SearchSpaceExceeded => "search exceeded its node limit",
            Self::NoPathFound => "no path found",
        };
        f.write_str(msg)
    }
}

/// A successfully computed route.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Path {
    /// Waypoints from start to goal, inclusive. Node centers with terrain
    /// height.
    pub waypoints: Vec<Vec3>,
    /// Total route length under the edge-distance metric.
    pub total_distance: f32,
}

/// The outcome delivered to a requester. Always present — failure is a
/// `success = false` result with an `error`, not an absent one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PathResult {
    pub success: bool,
    /// Ordered 3D waypoints; empty on failure.
    pub waypoints: Vec<Vec3>,
    pub total_distance: f32,
    /// Traversal time estimate at the requester's movement speed, seconds.
    pub estimated_seconds: f32,
    pub error: Option<PathError>,
}

impl PathResult {
    /// Fold a search outcome and the requester's speed into a result.
    pub fn from_outcome(outcome: Result<Path, PathError>, speed: f32) -> Self {
        match outcome {
            Ok(path) => Self {
                success: true,
                estimated_seconds: if speed > 0.0 {
                    path.total_distance / speed
                } else {
                    0.0
                },
                total_distance: path.total_distance,
                waypoints: path.waypoints,
                error: None,
            },
            Err(error) => Self {
                success: false,
                waypoints: Vec::new(),
                total_distance: 0.0,
                estimated_seconds: 0.0,
                error: Some(error),
            },
        }
    }
}

/// Per-search constraints and limits, assembled by the request processor
/// from the config and the individual request.
#[derive(Clone, Debug)]
pub struct SearchParams {
    /// Neighbors steeper than this are skipped for this requester.
    pub max_slope: f32,
    /// If present, only these biomes may be traversed.
    pub allowed_biomes: Option<Vec<Biome>>,
    /// Wall-clock ceiling for the search.
    pub timeout: Duration,
    /// Node-expansion ceiling.
    pub max_visited: u32,
    /// Height weighting shared with the cost model.
    pub height_cost_multiplier: f32,
}

/// Entry in the A* open set (min-heap via reversed ordering).
struct OpenEntry {
    node: NodeIdx,
    f_score: f32,
    /// Insertion order — ties on f-score resolve to the earliest insertion.
    sequence: u64,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.f_score.total_cmp(&other.f_score) == Ordering::Equal
            && self.sequence == other.sequence
    }
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for min-heap: smallest f-score is "greatest", and within a
        // tie the earliest-inserted entry is "greatest".
        other
            .f_score
            .total_cmp(&self.f_score)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// Find a least-cost walkable route from `start` to `goal` (world positions,
/// quantized to grid nodes).
pub fn find_path(
    grid: &NavGrid,
    start: Vec2,
    goal: Vec2,
    params: &SearchParams,
    clock: &dyn Clock,
) -> Result<Path, PathError> {
    // Fail fast before entering the search loop.
    let start_idx = grid.node_at_world(start).ok_or(PathError::OffGrid)?;
    let goal_idx = grid.node_at_world(goal).ok_or(PathError::OffGrid)?;
    if !grid.node(start_idx).walkable || !grid.node(goal_idx).walkable {
        return Err(PathError::NotWalkable);
    }

    if start_idx == goal_idx {
        return Ok(Path {
            waypoints: vec![grid.node(start_idx).position],
            total_distance: 0.0,
        });
    }

    let n = grid.node_count();
    let goal_pos = grid.node(goal_idx).position;

    // Search scratch, reset per search: cheapest known cost, parent links,
    // closed set.
    let mut g_score = vec![f32::INFINITY; n];
    let mut parent: Vec<Option<NodeIdx>> = vec![None; n];
    let mut closed = vec![false; n];

    g_score[start_idx.index()] = 0.0;

    let mut open = BinaryHeap::new();
    let mut sequence = 0u64;
    open.push(OpenEntry {
        node: start_idx,
        f_score: heuristic(grid.node(start_idx).position, goal_pos, params),
        sequence,
    });

    let deadline = clock.now() + params.timeout;
    let mut expanded = 0u32;

    while let Some(current) = open.pop() {
        let current_idx = current.node;
        let ci = current_idx.index();

        if current_idx == goal_idx {
            return Ok(reconstruct_path(grid, &parent, start_idx, goal_idx));
        }

        if closed[ci] {
            continue; // stale heap entry
        }
        closed[ci] = true;

        expanded += 1;
        if expanded > params.max_visited {
            return Err(PathError::SearchSpaceExceeded);
        }
        if clock.now() > deadline {
            return Err(PathError::Timeout);
        }

        let current_g = g_score[ci];
        let current_pos = grid.node(current_idx).position;

        for &neighbor_idx in &grid.node(current_idx).neighbors {
            let ni = neighbor_idx.index();
            if closed[ni] {
                continue;
            }
            let neighbor = grid.node(neighbor_idx);
            // A terrain patch can flip walkability without unlinking, so the
            // link alone doesn't prove traversability.
            if !neighbor.walkable {
                continue;
            }
            if neighbor.slope > params.max_slope {
                continue;
            }
            if let Some(allowed) = &params.allowed_biomes {
                if !allowed.contains(&neighbor.biome) {
                    continue;
                }
            }

            let tentative_g =
                current_g + edge_distance(current_pos, neighbor.position) * neighbor.cost;

            if tentative_g < g_score[ni] {
                g_score[ni] = tentative_g;
                parent[ni] = Some(current_idx);
                sequence += 1;
                open.push(OpenEntry {
                    node: neighbor_idx,
                    f_score: tentative_g + heuristic(neighbor.position, goal_pos, params),
                    sequence,
                });
            }
        }
    }

    Err(PathError::NoPathFound)
}

/// `|dx| + |dz| + |dy| * K`. See the module header for the admissibility
/// caveat.
fn heuristic(from: Vec3, to: Vec3, params: &SearchParams) -> f32 {
    (from.x - to.x).abs()
        + (from.z - to.z).abs()
        + (from.y - to.y).abs() * params.height_cost_multiplier
}

/// 2D Euclidean distance plus the absolute height delta.
fn edge_distance(from: Vec3, to: Vec3) -> f32 {
    from.horizontal_distance(to) + (from.y - to.y).abs()
}

/// Follow parent links from goal back to start and reverse.
fn reconstruct_path(
    grid: &NavGrid,
    parent: &[Option<NodeIdx>],
    start: NodeIdx,
    goal: NodeIdx,
) -> Path {
    let mut indices = vec![goal];
    let mut current = goal;
    while current != start {
        match parent[current.index()] {
            Some(prev) => {
                indices.push(prev);
                current = prev;
            }
            None => break,
        }
    }
    indices.reverse();

    let waypoints: Vec<Vec3> = indices.iter().map(|&i| grid.node(i).position).collect();
    let total_distance = waypoints
        .windows(2)
        .map(|pair| edge_distance(pair[0], pair[1]))
        .sum();

    Path {
        waypoints,
        total_distance,
    }
}
