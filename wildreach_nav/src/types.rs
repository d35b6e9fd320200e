// Core types shared across the navigation subsystem.
//
// Defines world-space vectors (`Vec2`, `Vec3`), quantized grid coordinates
// (`GridCoord`), compact arena indices (`NodeIdx`), entity identifiers, the
// `Biome` enum consumed by the cost model, request `Priority` tiers, and the
// rectangular `GridBounds` the grid is built over. All types derive
// `Serialize` and `Deserialize` for config files and multiplayer state
// transfer.
//
// **Critical constraint: determinism.** Agent and request IDs are plain
// integers assigned by the host or by a monotonic counter. No UUID libraries,
// no OS entropy.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Spatial types
// ---------------------------------------------------------------------------

/// A 2D position on the world's horizontal plane. `x` runs east, `z` south.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub z: f32,
}

impl Vec2 {
    pub const fn new(x: f32, z: f32) -> Self {
        Self { x, z }
    }

    /// Euclidean distance between two horizontal positions.
    pub fn distance(self, other: Self) -> f32 {
        let dx = self.x - other.x;
        let dz = self.z - other.z;
        (dx * dx + dz * dz).sqrt()
    }
}

impl fmt::Display for Vec2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x, self.z)
    }
}

/// A full 3D world position. `y` is height.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance between two 3D positions.
    pub fn distance(self, other: Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Horizontal distance, ignoring height.
    pub fn horizontal_distance(self, other: Self) -> f32 {
        self.xz().distance(other.xz())
    }

    /// Drop the height component.
    pub fn xz(self) -> Vec2 {
        Vec2::new(self.x, self.z)
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.2})", self.x, self.y, self.z)
    }
}

// ---------------------------------------------------------------------------
// Grid coordinates
// ---------------------------------------------------------------------------

/// Integer coordinates of one navigation grid cell, obtained by quantizing a
/// world (x, z) position at the grid resolution. Identity is stable for the
/// lifetime of the cell.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct GridCoord {
    pub x: i32,
    pub z: i32,
}

impl GridCoord {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Quantize a world position to the cell containing it.
    pub fn from_world(pos: Vec2, resolution: f32) -> Self {
        Self {
            x: (pos.x / resolution).round() as i32,
            z: (pos.z / resolution).round() as i32,
        }
    }

    /// World position of this cell's center on the horizontal plane.
    pub fn to_world(self, resolution: f32) -> Vec2 {
        Vec2::new(self.x as f32 * resolution, self.z as f32 * resolution)
    }

    /// Pack both components into a single `u64` map key.
    pub fn packed(self) -> u64 {
        ((self.x as u32 as u64) << 32) | (self.z as u32 as u64)
    }

    /// The cell offset by (dx, dz).
    pub fn offset(self, dx: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.z + dz)
    }
}

impl fmt::Display for GridCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.x, self.z)
    }
}

/// Index of a node in the `NavGrid` arena. Neighbor "references" are these
/// indices, giving contiguous storage without pointer-graph lifetimes.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct NodeIdx(pub u32);

impl NodeIdx {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

// ---------------------------------------------------------------------------
// Entity and request IDs
// ---------------------------------------------------------------------------

/// Identifier of a navigating agent. Assigned by the host simulation; the
/// navigation subsystem only keys state by it.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct AgentId(pub u64);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AgentId({})", self.0)
    }
}

/// Identifier of a pending pathfinding request. Monotonic per `Navigator`.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RequestId({})", self.0)
    }
}

// ---------------------------------------------------------------------------
// Terrain and scheduling enums
// ---------------------------------------------------------------------------

/// Terrain biome at a grid cell. Feeds the per-biome base cost table.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Biome {
    Plains,
    Forest,
    Mountain,
    Water,
    Swamp,
    Desert,
}

/// Priority tier for pathfinding requests. Ordering is the processing order:
/// `High` drains before `Normal`, `Normal` before `Low`.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Priority {
    High,
    Normal,
    Low,
}

impl Default for Priority {
    fn default() -> Self {
        Self::Normal
    }
}

// ---------------------------------------------------------------------------
// Bounds
// ---------------------------------------------------------------------------

/// Axis-aligned rectangle on the horizontal plane. The navigation grid covers
/// one of these; terrain tiles report theirs as they stream in.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridBounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl GridBounds {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Smallest rectangle containing both `self` and `other`.
    pub fn union(self, other: Self) -> Self {
        Self {
            min: Vec2::new(self.min.x.min(other.min.x), self.min.z.min(other.min.z)),
            max: Vec2::new(self.max.x.max(other.max.x), self.max.z.max(other.max.z)),
        }
    }

    pub fn contains(self, pos: Vec2) -> bool {
        pos.x >= self.min.x && pos.x <= self.max.x && pos.z >= self.min.z && pos.z <= self.max.z
    }
}
