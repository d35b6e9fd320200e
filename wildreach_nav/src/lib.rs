// wildreach_nav — server-side AI navigation for the Wildreach world.
//
// This crate is the navigation subsystem of a multiplayer 3D world with
// procedurally streamed terrain: a terrain-aware grid, A* pathfinding with
// hard time and search-space ceilings, a priority request queue drained
// under a per-tick budget, and per-agent stuck detection. It has zero engine
// dependencies and can be tested, benchmarked, and run headless.
//
// Module overview:
// - `navigator.rs`:   Top-level Navigator facade, typed event intake, tick loop.
// - `grid.rs`:        Navigation grid built from terrain queries (arena + packed-key lookup).
// - `pathfinding.rs`: A* over the grid with timeout, node ceiling, and typed failures.
// - `cost.rs`:        Traversal cost model (biome base cost × slope penalty).
// - `queue.rs`:       Priority request queue + budgeted per-tick processor.
// - `agent.rs`:       Per-agent navigation state and stuck detection/recovery.
// - `terrain.rs`:     TerrainOracle capability trait + fallback flat terrain.
// - `event.rs`:       NavEvents — all subsystem output, returned from tick().
// - `clock.rs`:       Clock capability trait (wall clock / manual test clock).
// - `config.rs`:      NavConfig — all tunable parameters, serde-loadable.
// - `types.rs`:       Vectors, grid coordinates, IDs, biomes, priorities, bounds.
//
// The host simulation owns entity movement and terrain generation; this
// crate only consumes their events and answers pathfinding requests. That
// boundary is enforced at the compiler level — nothing here depends on
// rendering, physics, or network transport.
//
// **Critical constraint: determinism.** Given the same grid, the same
// request stream, and the same clock readings, every search returns the
// same path. Time enters only through the `Clock` capability, terrain only
// through the `TerrainOracle` capability. No `HashMap` iteration affects
// results, no system time, no OS entropy.

pub mod agent;
pub mod clock;
pub mod config;
pub mod cost;
pub mod event;
pub mod grid;
pub mod navigator;
pub mod pathfinding;
pub mod queue;
pub mod terrain;
pub mod types;
